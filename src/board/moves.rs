/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, str::FromStr};

use anyhow::{bail, Result};

use super::Square;

/// Represents a half-move as a pair of origin and destination squares.
///
/// Everything else about a move (captures, castling, promotion, en passant)
/// is derived from the board it is applied to, so the
/// coordinates alone identify it. Promotion is always to a Queen and is
/// inferred from a Pawn reaching its last rank.
///
/// A distinguished *null move* (origin == destination == `a1`) represents a
/// side-to-move flip with no piece movement, used by null-move pruning.
#[derive(Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Move {
    from: Square,
    to: Square,
}

impl Move {
    /// The null move: flips the side to move without touching any piece.
    pub const NULL: Self = Self {
        from: Square::A1,
        to: Square::A1,
    };

    /// Creates a new [`Move`] from `from` to `to`.
    #[inline(always)]
    pub const fn new(from: Square, to: Square) -> Self {
        Self { from, to }
    }

    /// Creates a new [`Move`] from raw coordinates, validating each one.
    #[inline(always)]
    pub fn from_coords(ox: u8, oy: u8, dx: u8, dy: u8) -> Result<Self> {
        Ok(Self::new(
            Square::try_new(ox, oy)?,
            Square::try_new(dx, dy)?,
        ))
    }

    /// The origin square.
    #[inline(always)]
    pub const fn from(&self) -> Square {
        self.from
    }

    /// The destination square.
    #[inline(always)]
    pub const fn to(&self) -> Square {
        self.to
    }

    /// Returns `true` if this is the null move.
    ///
    /// # Example
    /// ```
    /// # use stoat::Move;
    /// assert!(Move::NULL.is_null());
    /// let mv: Move = "e2e4".parse().unwrap();
    /// assert!(!mv.is_null());
    /// ```
    #[inline(always)]
    pub const fn is_null(&self) -> bool {
        self.from.index() == self.to.index()
    }
}

impl FromStr for Move {
    type Err = anyhow::Error;

    /// Parses coordinate notation like `e2e4`.
    fn from_str(s: &str) -> Result<Self> {
        if !s.is_ascii() || s.len() != 4 {
            bail!("Move must be four characters like 'e2e4'. Got {s:?}");
        }
        Ok(Self::new(s[..2].parse()?, s[2..].parse()?))
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

/// Captures everything needed to reverse one applied move exactly.
///
/// Pushed by `Board::make_move` and consumed by `Board::unmake_move`. The
/// captured square is recorded separately from the destination because an en
/// passant victim does not sit on the destination square.
#[derive(Default, Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) struct UndoRecord {
    pub from: Square,
    pub to: Square,

    /// Whether the moving piece had already moved before this move.
    pub org_had_moved: bool,

    /// Square the captured piece stood on (equals `to` except for en passant).
    pub captured_sq: Square,

    /// Raw code of the captured piece, `0` if the move captured nothing.
    pub captured: u8,

    /// Whether the captured piece had already moved.
    pub captured_had_moved: bool,

    /// Raw code of the piece promoted into, `0` if no promotion occurred.
    pub promotion: u8,

    /// Whether this move flipped the en-passant-availability hash component.
    pub ep_flag_changed: bool,
}

impl UndoRecord {
    /// The record of a null move: only the side to move changed.
    pub const NULL: Self = Self {
        from: Square::A1,
        to: Square::A1,
        org_had_moved: false,
        captured_sq: Square::A1,
        captured: 0,
        captured_had_moved: false,
        promotion: 0,
        ep_flag_changed: false,
    };

    /// Returns `true` if this record was produced by a null move.
    #[inline(always)]
    pub const fn is_null(&self) -> bool {
        self.from.index() == self.to.index()
    }
}
