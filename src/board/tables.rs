/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use super::{Bitboard, Color, PieceKind, Square, XoShiRo};

/// Zobrist hash keys, one per (square, piece-code) pair.
///
/// Two slots are repurposed as global toggles: `ZOBRIST[0][8]` flips whenever
/// the en-passant-availability flag changes, and `ZOBRIST[1][8]` flips
/// whenever the side to move changes. Code 8 never appears on the board, so
/// neither slot collides with a real piece key.
///
/// Built at compile time from a fixed-seed PRNG, so hashes are identical
/// across runs and the transposition table stays valid between searches.
pub(crate) static ZOBRIST: [[u64; 16]; 64] = {
    let mut keys = [[0; 16]; 64];
    let mut prng = XoShiRo::new();

    let mut sq = 0;
    while sq < 64 {
        let mut code = 0;
        while code < 16 {
            let key;
            (key, prng) = prng.next_const();
            keys[sq][code] = key;
            code += 1;
        }
        sq += 1;
    }

    keys
};

/// The key that toggles the en-passant-availability component of a hash.
#[inline(always)]
pub(crate) const fn zobrist_ep_key() -> u64 {
    ZOBRIST[0][8]
}

/// The key that toggles the side-to-move component of a hash.
#[inline(always)]
pub(crate) const fn zobrist_side_key() -> u64 {
    ZOBRIST[1][8]
}

/// Builds an attack table for a leaping piece from its movement deltas.
const fn leaper_attacks<const N: usize>(deltas: [(i8, i8); N]) -> [Bitboard; 64] {
    let mut attacks = [Bitboard::EMPTY; 64];

    let mut sq = 0;
    while sq < 64 {
        let from = Square::from_index_unchecked(sq);
        let mut i = 0;
        while i < N {
            let (df, dr) = deltas[i];
            if let Some(to) = from.offset(df, dr) {
                attacks[sq] = attacks[sq].or(to.bitboard());
            }
            i += 1;
        }
        sq += 1;
    }

    attacks
}

/// Destination squares of a Knight on each square.
pub(crate) static KNIGHT_ATTACKS: [Bitboard; 64] = leaper_attacks([
    (1, 2),
    (1, -2),
    (2, 1),
    (2, -1),
    (-1, 2),
    (-1, -2),
    (-2, 1),
    (-2, -1),
]);

/// Destination squares of a King on each square (castling excluded).
pub(crate) static KING_ATTACKS: [Bitboard; 64] = leaper_attacks([
    (1, 0),
    (1, 1),
    (1, -1),
    (0, 1),
    (0, -1),
    (-1, 0),
    (-1, 1),
    (-1, -1),
]);

/// Squares a pawn of each color attacks from each square, indexed `[color][square]`.
///
/// A table rather than an inline shift so that a pawn standing on its own
/// back rank (possible in handcrafted placements) cannot shift out of range.
pub(crate) static PAWN_ATTACKS: [[Bitboard; 64]; 2] = [
    leaper_attacks([(-1, 1), (1, 1)]),
    leaper_attacks([(-1, -1), (1, -1)]),
];

/// One ray of a sliding piece's movement.
///
/// `last` is the full ray from the origin square to the edge of the board.
/// `steps[b]` is the ray truncated to stop at square `b` *inclusive*, for
/// every `b` along the ray. Together these give O(1) blocked-ray lookups:
/// find the first blocker in `last & occupied` with a bit scan, then index
/// `steps` with it. An unblocked ray keeps `last`.
#[derive(Copy, Clone)]
pub(crate) struct RayMask {
    pub last: Bitboard,
    pub steps: [Bitboard; 64],
}

/// Number of ray directions per orientation (forward/reverse).
pub(crate) const RAY_DIRS: usize = 4;

/// Ray directions used by Bishops: indices `0..2` of the direction tables.
pub(crate) const BISHOP_DIRS: (usize, usize) = (0, 2);

/// Ray directions used by Rooks: indices `2..4` of the direction tables.
pub(crate) const ROOK_DIRS: (usize, usize) = (2, 4);

/// Ray directions used by Queens: all of them.
pub(crate) const QUEEN_DIRS: (usize, usize) = (0, 4);

/// Walks one ray from `from`, accumulating `last` and the truncated `steps`.
const fn ray_mask(from: usize, df: i8, dr: i8) -> RayMask {
    let mut steps = [Bitboard::EMPTY; 64];
    let mut last = 0u64;

    let mut file = (from % 8) as i8 + df;
    let mut rank = (from / 8) as i8 + dr;

    while file & 7 == file && rank & 7 == rank {
        let sq = (file + rank * 8) as usize;
        last |= 1 << sq;
        steps[sq] = Bitboard::new(last);
        file += df;
        rank += dr;
    }

    RayMask {
        last: Bitboard::new(last),
        steps,
    }
}

const fn ray_table(deltas: [(i8, i8); RAY_DIRS]) -> [[RayMask; RAY_DIRS]; 64] {
    // Temporary placeholder overwritten below; `RayMask` has no const Default.
    const EMPTY_RAY: RayMask = RayMask {
        last: Bitboard::EMPTY,
        steps: [Bitboard::EMPTY; 64],
    };
    let mut table = [[EMPTY_RAY; RAY_DIRS]; 64];

    let mut sq = 0;
    while sq < 64 {
        let mut dir = 0;
        while dir < RAY_DIRS {
            let (df, dr) = deltas[dir];
            table[sq][dir] = ray_mask(sq, df, dr);
            dir += 1;
        }
        sq += 1;
    }

    table
}

/// Rays running toward *higher* square indices, so the first blocker on one
/// is the lowest set bit of `last & occupied`.
///
/// Direction order: NE, NW (diagonals), then N, E (orthogonals).
pub(crate) static FORWARD_RAYS: [[RayMask; RAY_DIRS]; 64] =
    ray_table([(1, 1), (-1, 1), (0, 1), (1, 0)]);

/// Rays running toward *lower* square indices; the first blocker is the
/// highest set bit of `last & occupied`. Each entry is the opposite half of
/// the same direction as [`FORWARD_RAYS`].
pub(crate) static REVERSE_RAYS: [[RayMask; RAY_DIRS]; 64] =
    ray_table([(-1, -1), (1, -1), (0, -1), (-1, 0)]);

/// Direction-table range for a sliding [`PieceKind`].
#[inline(always)]
pub(crate) const fn slider_dirs(kind: PieceKind) -> (usize, usize) {
    match kind {
        PieceKind::Bishop => BISHOP_DIRS,
        PieceKind::Rook => ROOK_DIRS,
        _ => QUEEN_DIRS,
    }
}

/// Computes the attack set of a sliding piece in O(1) per ray.
///
/// For each ray half, the ray is truncated at its first blocker (inclusive),
/// found with a single bit scan against `occupied`.
#[inline(always)]
pub(crate) fn sliding_attacks(square: Square, occupied: Bitboard, dirs: (usize, usize)) -> Bitboard {
    let fw = &FORWARD_RAYS[square.index()];
    let rev = &REVERSE_RAYS[square.index()];
    let mut attacks = Bitboard::EMPTY;

    let (start, end) = dirs;
    for dir in start..end {
        let mut forward = fw[dir].last;
        let blockers = forward & occupied;
        if blockers.is_nonempty() {
            forward = fw[dir].steps[blockers.inner().trailing_zeros() as usize];
        }

        let mut reverse = rev[dir].last;
        let blockers = reverse & occupied;
        if blockers.is_nonempty() {
            reverse = rev[dir].steps[63 - blockers.inner().leading_zeros() as usize];
        }

        attacks |= forward | reverse;
    }

    attacks
}

/// Leaper attack mask for a non-sliding [`PieceKind`].
#[inline(always)]
pub(crate) fn leaper_mask(kind: PieceKind, square: Square, color: Color) -> Bitboard {
    match kind {
        PieceKind::Knight => KNIGHT_ATTACKS[square.index()],
        PieceKind::King => KING_ATTACKS[square.index()],
        PieceKind::Pawn => PAWN_ATTACKS[color.index()][square.index()],
        _ => Bitboard::EMPTY,
    }
}
