/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::{
    board::{sliding_attacks, BISHOP_DIRS, KNIGHT_ATTACKS},
    Bitboard, Board, Color, PieceKind, Score,
};

/// A static, deterministic evaluation of a chess position.
///
/// Implementations must be pure functions of the board: the search calls
/// them at every leaf and relies on identical positions scoring identically.
/// Returned values must stay outside the mate bands
/// (see [`Score::LOWEST_MATE`]), which the search reserves for forced mates.
pub trait Evaluate: Send + Sync {
    /// Scores the position from `side`'s perspective: positive is better
    /// for `side`, negative is better for its opponent.
    fn eval(&self, board: &Board, side: Color) -> Score;
}

/// The reference evaluator: material plus simple positional terms.
///
/// Per piece it awards material value and a per-kind positional term:
/// - Pawns: advance and centering bonuses, penalties for isolation and doubling.
/// - Knights: mobility, counted over squares not occupied by friendly pieces.
/// - Bishops: mobility along their diagonal ray scans.
/// - Rooks: a bonus on semi-open files, a larger one on fully open files.
/// - Kings: a middlegame piece-square table, mirrored by side.
/// - Queens: material only.
#[derive(Debug, Default, Clone, Copy)]
pub struct Classical;

/// Middlegame piece-square table for the king, from Black's side of the
/// board down; White indexes it with the rank mirrored.
#[rustfmt::skip]
const KING_TABLE: [i32; 64] = [
    -65,  23,  16, -15, -56, -34,   2,  13,
     29,  -1, -20,  -7,  -8,  -4, -38, -29,
     -9,  24,   2, -16, -20,   6,  22, -22,
    -17, -20, -12, -27, -30, -25, -14, -36,
    -49,  -1, -27, -39, -46, -44, -33, -51,
    -14, -14, -22, -46, -44, -30, -15, -27,
      1,   7,  -8, -64, -43, -16,   9,   8,
    -15,  36,  12, -54,   8, -28,  24,  14,
];

impl Evaluate for Classical {
    fn eval(&self, board: &Board, side: Color) -> Score {
        let white = side_score(board, Color::White);
        let black = side_score(board, Color::Black);

        let diff = white - black;
        Score::new(if side.is_white() { diff } else { -diff })
    }
}

/// Sums material and positional terms for all of `side`'s pieces.
fn side_score(board: &Board, side: Color) -> i32 {
    let occupied = board.occupied();
    let ours = board.color(side);
    let our_pawns = board.kind(PieceKind::Pawn) & ours;
    let all_pawns = board.kind(PieceKind::Pawn);

    let mut score = 0;

    for from in board.kind(PieceKind::Pawn) & ours {
        score += 80;

        let file = from.file();
        let rank = from.rank();

        // Isolated: no friendly pawn on an adjacent file.
        let neighbors = adjacent_files(file) & our_pawns;
        if neighbors.is_empty() {
            score -= 20;
        }

        // Doubled: sharing a file with another friendly pawn.
        if (Bitboard::file(file) & our_pawns).population() > 1 {
            score -= 20;
        }

        // Advancing is rewarded quadratically, straying from the center
        // penalized the same way.
        let relative_rank = match side {
            Color::White => rank as i32,
            Color::Black => 7 - rank as i32,
        };
        score += 4 * (relative_rank - 1) * (relative_rank - 1);
        score -= 4 * (file as i32 - 4) * (file as i32 - 4);
    }

    for _ in board.kind(PieceKind::Queen) & ours {
        score += 1000;
    }

    for from in board.kind(PieceKind::Bishop) & ours {
        score += 360;
        let reach = sliding_attacks(from, occupied, BISHOP_DIRS) & !ours;
        score += reach.population() as i32;
    }

    for from in board.kind(PieceKind::Knight) & ours {
        score += 320;
        let mobility = (KNIGHT_ATTACKS[from.index()] & !ours).population() as i32;
        score += -80 + 10 * mobility;
    }

    for from in board.kind(PieceKind::Rook) & ours {
        score += 470;
        let file_pawns = Bitboard::file(from.file()) & all_pawns;
        if (file_pawns & ours).is_empty() {
            score += if file_pawns.is_empty() { 30 } else { 10 };
        }
    }

    for from in board.kings(side) {
        let index = from.index() ^ if side.is_white() { 0b111000 } else { 0 };
        score += KING_TABLE[index];
    }

    score
}

/// Files adjacent to `file`, as a [`Bitboard`].
#[inline(always)]
fn adjacent_files(file: u8) -> Bitboard {
    let mut files = Bitboard::EMPTY;
    if file > 0 {
        files |= Bitboard::file(file - 1);
    }
    if file < 7 {
        files |= Bitboard::file(file + 1);
    }
    files
}

/// How far the game has progressed toward an endgame, on a scale where `0`
/// is full middlegame material and `24` is bare kings and pawns.
///
/// Knights and bishops weigh 1, rooks 2, queens 4. Null-move pruning is
/// only sound while enough material remains for a tempo to matter, so the
/// search consults this before skipping a turn.
#[inline(always)]
pub fn game_phase(board: &Board) -> i32 {
    let weight = board.kind(PieceKind::Knight).population()
        + board.kind(PieceKind::Bishop).population()
        + board.kind(PieceKind::Rook).population() * 2
        + board.kind(PieceKind::Queen).population() * 4;

    24 - (weight as i32).min(24)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Square;

    /// Flips a placement vertically and swaps the color of every piece.
    fn mirrored(placement: &str) -> String {
        let chars: Vec<char> = placement.chars().collect();
        let mut flipped = vec!['0'; Square::COUNT];

        for (i, &c) in chars.iter().enumerate() {
            let code = c.to_digit(16).unwrap();
            let mirrored_index = i ^ 0b111000;
            flipped[mirrored_index] = if code == 0 {
                '0'
            } else {
                char::from_digit(code ^ 0b1000, 16).unwrap()
            };
        }

        flipped.into_iter().collect()
    }

    #[test]
    fn test_startpos_is_balanced() {
        let board = Board::new();
        assert_eq!(Classical.eval(&board, Color::White), Score::DRAW);
        assert_eq!(Classical.eval(&board, Color::Black), Score::DRAW);
    }

    #[test]
    fn test_perspective_antisymmetry() {
        let mut board = Board::new();
        for m in ["e2e4", "d7d5", "e4d5"] {
            board.make_move(m.parse().unwrap());
        }

        let white = Classical.eval(&board, Color::White);
        let black = Classical.eval(&board, Color::Black);
        assert_eq!(white, -black);
        assert!(white > Score::DRAW, "white is a pawn up");
    }

    #[test]
    fn test_mirror_symmetry() {
        // An asymmetric position must evaluate identically after flipping
        // the board and the colors.
        let placement =
            "543213456666066600000000000060000000000000000000eeeeeeeedcba9bcd";
        let board = Board::from_placement(placement, Color::Black).unwrap();
        let mirror = Board::from_placement(&mirrored(placement), Color::White).unwrap();

        assert_eq!(
            Classical.eval(&board, Color::Black),
            Classical.eval(&mirror, Color::White)
        );
        assert_eq!(
            Classical.eval(&board, Color::White),
            Classical.eval(&mirror, Color::Black)
        );
    }

    #[test]
    fn test_rook_prefers_open_files() {
        // Identical boards except the rook stands on an open file (d1)
        // versus behind its own pawn (c1).
        let open = Board::from_placement(
            &placement(&[("e1", 0x1), ("d1", 0x5), ("c2", 0x6), ("h8", 0x9)]),
            Color::White,
        )
        .unwrap();
        let closed = Board::from_placement(
            &placement(&[("e1", 0x1), ("c1", 0x5), ("c2", 0x6), ("h8", 0x9)]),
            Color::White,
        )
        .unwrap();

        let open_score = Classical.eval(&open, Color::White);
        let closed_score = Classical.eval(&closed, Color::White);
        assert!(
            open_score.inner() >= closed_score.inner() + 30,
            "an open rook file must score higher ({open_score:?} vs {closed_score:?})"
        );
    }

    fn placement(pieces: &[(&str, u8)]) -> String {
        let mut chars = vec!['0'; Square::COUNT];
        for &(s, code) in pieces {
            let square: Square = s.parse().unwrap();
            chars[square.index()] = char::from_digit(code as u32, 16).unwrap();
        }
        chars.into_iter().collect()
    }

    #[test]
    fn test_game_phase() {
        assert_eq!(game_phase(&Board::new()), 0);

        // Kings and pawns only: the deepest endgame.
        let board = Board::from_placement(
            &placement(&[("e1", 0x1), ("e8", 0x9), ("a2", 0x6), ("a7", 0xe)]),
            Color::White,
        )
        .unwrap();
        assert_eq!(game_phase(&board), 24);
    }

    #[test]
    fn test_eval_stays_outside_mate_bands() {
        // Even a grotesquely imbalanced position (eight extra white queens)
        // must not reach the reserved mate bands.
        let placement = "00001000\
                         00000000\
                         00000000\
                         22222222\
                         00000000\
                         00000000\
                         00000000\
                         00009000";
        let board = Board::from_placement(placement, Color::White).unwrap();

        let score = Classical.eval(&board, Color::White);
        assert!(!score.is_mate());
        assert!(!(-score).is_mate());
    }
}
