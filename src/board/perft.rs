/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use super::{Bitboard, Board, Move, MoveGenOptions, Square};

/// Counts the leaf nodes of the legal move tree to the given depth.
///
/// Exercises generation, make and unmake together; the well-known node
/// counts for standard positions make this the sharpest correctness check
/// the board layer has. Note that promotion is always to a Queen here, so
/// counts diverge from full-rules perft in positions where underpromotion
/// is possible.
pub fn perft(board: &mut Board, depth: usize) -> u64 {
    if depth == 0 {
        return 1;
    }

    let mut out = [Bitboard::EMPTY; Square::COUNT];
    let side = board.side_to_move();
    board.generate_moves(side, &mut out, MoveGenOptions::default());

    let mut nodes = 0;
    for from in 0..Square::COUNT {
        for to in out[from] {
            board.make_move(Move::new(Square::from_index_unchecked(from), to));
            nodes += perft(board, depth - 1);
            board.unmake_move();
        }
    }

    nodes
}
