/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use anyhow::{bail, Result};

use super::{
    piece::TYPE_MASK,
    tables::{leaper_mask, sliding_attacks, slider_dirs, FORWARD_RAYS, PAWN_ATTACKS, REVERSE_RAYS},
    Bitboard, Board, Color, Move, PieceKind, Square,
};

/// Options governing a single call to [`Board::generate_moves`].
#[derive(Clone, Copy, Debug)]
pub struct MoveGenOptions {
    /// Skip the king-safety legality filter and emit pseudo-legal moves.
    pub pseudo_only: bool,

    /// Return as soon as one legal move has been found.
    ///
    /// Used for cheap mate/stalemate existence tests. Has no effect together
    /// with `pseudo_only`.
    pub exit_on_first_legal: bool,

    /// Intersect every destination set with this mask.
    ///
    /// Quiescence search restricts itself to captures by passing the enemy
    /// occupancy here.
    pub mask: Bitboard,
}

impl Default for MoveGenOptions {
    #[inline(always)]
    fn default() -> Self {
        Self {
            pseudo_only: false,
            exit_on_first_legal: false,
            mask: Bitboard::FULL,
        }
    }
}

impl MoveGenOptions {
    /// Options for a legal-move existence test restricted to `mask`.
    #[inline(always)]
    pub fn any_within(mask: Bitboard) -> Self {
        Self {
            exit_on_first_legal: true,
            mask,
            ..Self::default()
        }
    }
}

impl Board {
    /// Returns `true` if `side` has at least one legal move.
    ///
    /// `side` has no legal moves exactly when the position is checkmate (if
    /// in check) or stalemate (if not).
    #[inline(always)]
    pub fn any_moves(&mut self, side: Color) -> bool {
        let mut out = [Bitboard::EMPTY; Square::COUNT];
        self.generate_moves(side, &mut out, MoveGenOptions::any_within(Bitboard::FULL))
    }

    /// Returns `true` if `side` has at least one legal capture.
    #[inline(always)]
    pub fn any_captures(&mut self, side: Color) -> bool {
        let mut out = [Bitboard::EMPTY; Square::COUNT];
        let enemies = self.color(side.opponent());
        self.generate_moves(side, &mut out, MoveGenOptions::any_within(enemies))
    }

    /// Returns `true` if `side`'s king is attacked.
    #[inline(always)]
    pub fn in_check(&self, side: Color) -> bool {
        self.any_pseudo_captures(side.opponent(), self.kings(side))
    }

    /// Makes `mv`, asks whether `side`'s king is attacked, and unmakes.
    ///
    /// This mutates the board to answer the question, so concurrent move
    /// generation on one [`Board`] is not possible; parallel search uses
    /// per-thread clones.
    #[inline(always)]
    pub(crate) fn is_move_safe(&mut self, side: Color, mv: Move) -> bool {
        self.make_move(mv);
        let check = self.in_check(side);
        self.unmake_move();
        !check
    }

    /// Filters a destination set down to the moves that leave `side`'s own
    /// king out of check.
    fn legalize(&mut self, side: Color, from: Square, moves: Bitboard) -> Bitboard {
        let mut legal = Bitboard::EMPTY;
        for to in moves {
            if self.is_move_safe(side, Move::new(from, to)) {
                legal |= to.bitboard();
            }
        }
        legal
    }

    /// Masks, legalizes, and records one piece's destination set.
    ///
    /// Returns `true` if generation should stop because a legal move was
    /// found and the caller asked to exit on the first one.
    #[inline(always)]
    fn emit_moves(
        &mut self,
        side: Color,
        from: Square,
        dests: Bitboard,
        out: &mut [Bitboard; Square::COUNT],
        opts: &MoveGenOptions,
    ) -> bool {
        let mut dests = dests & opts.mask;
        if !opts.pseudo_only {
            dests = self.legalize(side, from, dests);
        }
        out[from.index()] = dests;
        !opts.pseudo_only && opts.exit_on_first_legal && dests.is_nonempty()
    }

    /// Generates the moves available to `side` into `out`, a destination
    /// bitboard per origin square.
    ///
    /// Returns `true` when `exit_on_first_legal` was requested and a legal
    /// move was found (generation stops there, leaving `out` partial).
    ///
    /// Promotions are not enumerated separately: a pawn move onto the last
    /// rank promotes to a Queen inside [`Board::make_move`].
    pub fn generate_moves(
        &mut self,
        side: Color,
        out: &mut [Bitboard; Square::COUNT],
        opts: MoveGenOptions,
    ) -> bool {
        let occupied = self.occupied();
        let ours = self.color(side);
        let theirs = self.color(side.opponent());
        let free = !occupied;
        let not_friendly = free | theirs;

        // Pawns.
        let ep_target = self.en_passant_target(side);
        let pawns = self.kind(PieceKind::Pawn) & ours;

        for from in pawns {
            let bb = from.bitboard();
            let capture_base = PAWN_ATTACKS[side.index()][from.index()];

            let captures = capture_base & theirs;
            let step = bb.forward(side) & free;
            let double = if self.piece_has_moved(from) {
                Bitboard::EMPTY
            } else {
                // `step` is already empty if the intermediate square is not.
                step.forward(side) & free
            };
            let en_passant = ep_target & capture_base;

            let dests = captures | step | double | en_passant;
            if self.emit_moves(side, from, dests, out, &opts) {
                return true;
            }
        }

        // Knights and the king.
        for kind in [PieceKind::Knight, PieceKind::King] {
            let set = self.kind(kind) & ours;
            for from in set {
                let mut dests = leaper_mask(kind, from, side) & not_friendly;

                if kind == PieceKind::King && !self.in_check(side) {
                    dests |= self.castling_destinations(side, from);
                }

                if self.emit_moves(side, from, dests, out, &opts) {
                    return true;
                }
            }
        }

        // Sliding pieces.
        for kind in [PieceKind::Bishop, PieceKind::Rook, PieceKind::Queen] {
            let dirs = slider_dirs(kind);
            let set = self.kind(kind) & ours;
            for from in set {
                let dests = sliding_attacks(from, occupied, dirs) & not_friendly;
                if self.emit_moves(side, from, dests, out, &opts) {
                    return true;
                }
            }
        }

        false
    }

    /// Castling destinations for `side`'s king on `king_sq`.
    ///
    /// For each wing: the corner rook and the king must both have never
    /// moved, every square strictly between them must be empty, and the
    /// square the king crosses must not be attacked. The caller has already
    /// verified the king is not currently in check; the destination square
    /// is covered by the ordinary legality filter.
    fn castling_destinations(&mut self, side: Color, king_sq: Square) -> Bitboard {
        let mut dests = Bitboard::EMPTY;

        let rank = king_sq.rank();
        let king_file = king_sq.file();

        // An unmoved king stands on its home file; anything else is a
        // handcrafted placement where castling cannot apply.
        if king_file != 4 {
            return dests;
        }

        let rooks = self.kind(PieceKind::Rook) & self.color(side);
        let occupied = self.occupied();

        for corner_file in [0u8, 7u8] {
            let rook_sq = Square::new(corner_file, rank);
            if !rooks.intersects(rook_sq.bitboard()) {
                continue;
            }
            if self.piece_has_moved(rook_sq) || self.piece_has_moved(king_sq) {
                continue;
            }

            // The king steps two squares toward the rook.
            let direction: i8 = if corner_file == 0 { -1 } else { 1 };
            let (Some(crossed), Some(target)) = (
                king_sq.offset(direction, 0),
                king_sq.offset(direction * 2, 0),
            ) else {
                continue;
            };

            let (low, high) = if corner_file < king_file {
                (corner_file, king_file)
            } else {
                (king_file, corner_file)
            };
            let mut blocked = false;
            for file in low + 1..high {
                if occupied.intersects(Square::new(file, rank).bitboard()) {
                    blocked = true;
                    break;
                }
            }
            if blocked {
                continue;
            }

            if !self.is_move_safe(side, Move::new(king_sq, crossed)) {
                continue;
            }

            dests |= target.bitboard();
        }

        dests
    }

    /// Reduced generator answering "can `side` pseudo-attack any square in
    /// `target`?", walking every piece kind but building no output.
    ///
    /// Pawn coverage counts attacked squares whether or not an enemy stands
    /// there, which is exactly what a king-safety query needs. Sliding
    /// pieces attack precisely the first blocker along each of their rays.
    pub fn any_pseudo_captures(&self, side: Color, target: Bitboard) -> bool {
        let occupied = self.occupied();
        let ours = self.color(side);

        // Pawns.
        let pawns = self.kind(PieceKind::Pawn) & ours;
        for from in pawns {
            if PAWN_ATTACKS[side.index()][from.index()].intersects(target) {
                return true;
            }
        }

        // Knights and the king.
        let leapers = (self.kind(PieceKind::Knight) | self.kind(PieceKind::King)) & ours;
        for from in leapers {
            let kind = PieceKind::from_bits_unchecked(self.raw_code(from) & TYPE_MASK);
            if leaper_mask(kind, from, side).intersects(target) {
                return true;
            }
        }

        // Sliding pieces: only the first blocker on a ray can be captured.
        for kind in [PieceKind::Bishop, PieceKind::Rook, PieceKind::Queen] {
            let (start, end) = slider_dirs(kind);
            let set = self.kind(kind) & ours;

            for from in set {
                let fw = &FORWARD_RAYS[from.index()];
                let rev = &REVERSE_RAYS[from.index()];

                for dir in start..end {
                    let forward_blockers = fw[dir].last & occupied;
                    if forward_blockers.lsb().intersects(target) {
                        return true;
                    }

                    let reverse_blockers = rev[dir].last & occupied;
                    if reverse_blockers.msb().intersects(target) {
                        return true;
                    }
                }
            }
        }

        false
    }

    /// Raw piece code on `square`; `0` for an empty square.
    #[inline(always)]
    fn raw_code(&self, square: Square) -> u8 {
        self.piece_at(square).map(|p| p.code()).unwrap_or(0)
    }

    /// Returns `true` if `mv` is a legal move for the side to move.
    #[inline(always)]
    pub fn is_legal(&mut self, mv: Move) -> bool {
        let mut out = [Bitboard::EMPTY; Square::COUNT];
        let side = self.side_to_move();
        self.generate_moves(
            side,
            &mut out,
            MoveGenOptions {
                mask: mv.to().bitboard(),
                ..MoveGenOptions::default()
            },
        );
        out[mv.from().index()].intersects(mv.to().bitboard())
    }

    /// Validates and applies each move of a game history in order.
    ///
    /// An illegal move leaves the board at the position it was legal *until*
    /// and reports which move was rejected.
    pub fn replay(&mut self, history: &[Move]) -> Result<()> {
        for (i, &mv) in history.iter().enumerate() {
            if !self.is_legal(mv) {
                bail!("Illegal move {mv} at history index {i}");
            }
            self.make_move(mv);
        }
        Ok(())
    }
}
