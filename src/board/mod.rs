/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Bitboards and the set operations move generation is built from.
mod bitboard;

/// Legal and pseudo-legal move generation.
mod movegen;

/// Moves and the undo information needed to reverse them.
mod moves;

/// Leaf-node counting for validating the board layer.
mod perft;

/// Colors, piece kinds, and their 4-bit board encoding.
mod piece;

/// The board itself: state, make/unmake, hashing, repetition counting.
mod position;

/// Compile-time pseudo-random numbers for Zobrist keys.
mod prng;

/// Squares and their coordinates.
mod square;

/// Precomputed attack masks, sliding rays, and Zobrist keys.
mod tables;

pub use bitboard::*;
pub use movegen::*;
pub use moves::Move;
pub(crate) use moves::UndoRecord;
pub use perft::*;
pub use piece::{Color, Piece, PieceKind};
pub use position::{Board, START_POSITION};
pub use prng::*;
pub use square::*;

pub(crate) use tables::*;
