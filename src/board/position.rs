/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use anyhow::{bail, Context, Result};

use super::{
    piece::{SIDE_SHIFT, TYPE_MASK},
    tables::{zobrist_ep_key, zobrist_side_key, ZOBRIST},
    Bitboard, Color, Move, Piece, PieceKind, Square, UndoRecord,
};

/// The standard initial position in placement notation: 64 hex digits, row
/// `y = 0` (White's back rank) first.
pub const START_POSITION: &str =
    "543213456666666600000000000000000000000000000000eeeeeeeedcba9bcd";

/// Number of slots in the repetition-counting table.
const REPETITION_TABLE_SIZE: usize = 1 << 22;

/// A bounded map from position hash to occurrence count, for threefold
/// repetition detection.
///
/// Indexed by `hash % size`, so distinct positions may very rarely share a
/// slot; an occasional spurious draw score is the accepted cost of O(1)
/// bookkeeping on the search's hot path.
#[derive(Clone, PartialEq, Eq)]
pub(crate) struct RepetitionTable {
    counts: Box<[u16]>,
}

impl RepetitionTable {
    fn new() -> Self {
        Self {
            counts: vec![0; REPETITION_TABLE_SIZE].into_boxed_slice(),
        }
    }

    #[inline(always)]
    fn slot(hash: u64) -> usize {
        (hash & (REPETITION_TABLE_SIZE as u64 - 1)) as usize
    }

    #[inline(always)]
    fn increment(&mut self, hash: u64) {
        self.counts[Self::slot(hash)] += 1;
    }

    #[inline(always)]
    fn decrement(&mut self, hash: u64) {
        let count = &mut self.counts[Self::slot(hash)];
        debug_assert!(*count > 0, "repetition count underflow");
        *count = count.saturating_sub(1);
    }

    #[inline(always)]
    fn count(&self, hash: u64) -> u16 {
        self.counts[Self::slot(hash)]
    }
}

impl fmt::Debug for RepetitionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RepetitionTable({} slots)", self.counts.len())
    }
}

/// The complete state of a game of chess, with reversible move application.
///
/// The board is represented redundantly for speed: a 64-entry array of raw
/// piece codes (see [`Piece`]), one occupancy [`Bitboard`] per side, and one
/// per piece kind. A 64-bit Zobrist hash of the position, including the side
/// to move and whether an en passant capture is available, is maintained
/// incrementally by [`Board::make_move`] and [`Board::unmake_move`].
///
/// Squares are indexed `file + 8 * rank` with rank 0 being White's back rank.
///
/// Castling rights and pawn double-step rights are derived from the
/// `has_moved` bitboard rather than stored separately: a set bit means the
/// piece currently on that square has moved at least once.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Board {
    /// Raw piece code per square; `0` is an empty square.
    pieces: [u8; Square::COUNT],

    /// Occupancy per side, indexed by [`Color`].
    side_sets: [Bitboard; Color::COUNT],

    /// Occupancy per piece kind, indexed by [`PieceKind`]; slot 0 is unused.
    piece_sets: [Bitboard; PieceKind::SET_COUNT],

    /// Squares whose occupant has moved at least once.
    has_moved: Bitboard,

    /// The side whose turn it is.
    side_to_move: Color,

    /// Incremental Zobrist hash of the position.
    hash: u64,

    /// Undo information for every applied move, most recent last.
    move_stack: Vec<UndoRecord>,

    /// Occurrence counts of previously reached positions.
    repetitions: RepetitionTable,

    /// Number of moves applied since the current search began.
    ///
    /// Used to normalize mate scores to the search root and to unwind the
    /// board exactly when a search is cancelled mid-recursion.
    pub(crate) appended_moves: u32,
}

impl Board {
    /// Constructs a [`Board`] holding the standard initial position, White to move.
    ///
    /// # Example
    /// ```
    /// # use stoat::{Board, Color, PieceKind};
    /// let board = Board::new();
    /// assert_eq!(board.occupied().population(), 32);
    /// assert_eq!(board.side_to_move(), Color::White);
    /// ```
    #[inline(always)]
    pub fn new() -> Self {
        Self::from_placement(START_POSITION, Color::White)
            .expect("standard initial placement is valid")
    }

    /// Constructs a [`Board`] from 64 hex digits of placement data.
    ///
    /// Digit `i` describes square `i` (so the string reads rank by rank from
    /// White's back rank up). Each digit is a raw piece code: low three bits
    /// the kind (`1` king through `6` pawn, `0` empty), bit 3 the side.
    ///
    /// All pieces are treated as never having moved, so castling and pawn
    /// double-step rights are fresh; replaying the game's move history
    /// restores the real rights.
    ///
    /// Rejects strings of the wrong length, invalid piece codes, and
    /// placements without exactly one king per side.
    pub fn from_placement(placement: &str, side_to_move: Color) -> Result<Self> {
        let placement = placement.trim();
        if placement.chars().count() != Square::COUNT {
            bail!(
                "Placement must be exactly {} hex digits. Got {}",
                Square::COUNT,
                placement.chars().count()
            );
        }

        let mut board = Self::empty(side_to_move);

        for (i, c) in placement.chars().enumerate() {
            let code = c
                .to_digit(16)
                .with_context(|| format!("Invalid placement digit {c:?} at square index {i}"))?
                as u8;

            if code == 0 {
                continue;
            }

            let piece = Piece::from_code(code)
                .with_context(|| format!("Invalid piece at square index {i}"))?;
            board.place(Square::from_index_unchecked(i), piece);
        }

        for color in [Color::White, Color::Black] {
            let kings = board.kings(color).population();
            if kings != 1 {
                bail!("Placement must contain exactly one {color} king. Got {kings}");
            }
        }

        board.hash = board.zobrist_from_scratch();
        Ok(board)
    }

    fn empty(side_to_move: Color) -> Self {
        Self {
            pieces: [0; Square::COUNT],
            side_sets: [Bitboard::EMPTY; Color::COUNT],
            piece_sets: [Bitboard::EMPTY; PieceKind::SET_COUNT],
            has_moved: Bitboard::EMPTY,
            side_to_move,
            hash: 0,
            move_stack: Vec::with_capacity(64),
            repetitions: RepetitionTable::new(),
            appended_moves: 0,
        }
    }

    #[inline(always)]
    fn place(&mut self, square: Square, piece: Piece) {
        let bb = square.bitboard();
        self.pieces[square.index()] = piece.code();
        self.side_sets[piece.color().index()] |= bb;
        self.piece_sets[piece.kind().index()] |= bb;
    }

    /// The piece standing on `square`, if any.
    #[inline(always)]
    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        let code = self.pieces[square.index()];
        (code != 0).then(|| Piece::from_code_unchecked(code))
    }

    /// All occupied squares.
    #[inline(always)]
    pub fn occupied(&self) -> Bitboard {
        self.side_sets[0] | self.side_sets[1]
    }

    /// All squares occupied by `color`'s pieces.
    #[inline(always)]
    pub fn color(&self, color: Color) -> Bitboard {
        self.side_sets[color.index()]
    }

    /// All squares occupied by pieces of `kind`, either color.
    #[inline(always)]
    pub fn kind(&self, kind: PieceKind) -> Bitboard {
        self.piece_sets[kind.index()]
    }

    /// The square(s) holding `color`'s king as a [`Bitboard`].
    #[inline(always)]
    pub fn kings(&self, color: Color) -> Bitboard {
        self.piece_sets[PieceKind::King.index()] & self.side_sets[color.index()]
    }

    /// The side whose turn it is.
    #[inline(always)]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    /// The incremental Zobrist hash of this position.
    #[inline(always)]
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// Number of pieces on the board.
    #[inline(always)]
    pub fn count_pieces(&self) -> u32 {
        self.occupied().population()
    }

    /// Whether the piece currently on `square` has ever moved.
    #[inline(always)]
    pub fn piece_has_moved(&self, square: Square) -> bool {
        self.has_moved.intersects(square.bitboard())
    }

    /// Number of moves applied to this board that have not been unmade.
    #[inline(always)]
    pub fn applied_moves(&self) -> usize {
        self.move_stack.len()
    }

    /// How many times the position identified by `hash` has been reached.
    #[inline(always)]
    pub(crate) fn repetition_count(&self, hash: u64) -> u16 {
        self.repetitions.count(hash)
    }

    /// Whether the previous move was a pawn double-step, i.e. whether the
    /// en-passant-availability component of the hash is currently set.
    #[inline(always)]
    pub(crate) fn pawn_double_step_available(&self) -> bool {
        self.move_stack.last().is_some_and(|last| {
            self.pieces[last.to.index()] & TYPE_MASK == PieceKind::Pawn as u8
                && last.from.rank().abs_diff(last.to.rank()) == 2
        })
    }

    /// Destination square of an en passant capture available to `side`, as a
    /// (possibly empty) [`Bitboard`].
    ///
    /// Nonempty exactly when the previous move was an enemy pawn advancing
    /// two ranks; the capture lands one rank behind that pawn. Callers still
    /// intersect this with each candidate pawn's attack pattern to enforce
    /// adjacency.
    #[inline(always)]
    pub(crate) fn en_passant_target(&self, side: Color) -> Bitboard {
        let Some(last) = self.move_stack.last() else {
            return Bitboard::EMPTY;
        };

        let dest = last.to.bitboard();
        let enemy_pawn = (self.piece_sets[PieceKind::Pawn.index()]
            & self.side_sets[side.opponent().index()])
        .intersects(dest);

        if enemy_pawn && last.from.rank().abs_diff(last.to.rank()) == 2 {
            dest.forward(side)
        } else {
            Bitboard::EMPTY
        }
    }

    /// Recomputes the Zobrist hash of this position from scratch.
    ///
    /// [`Board::make_move`] maintains the hash incrementally; this exists for
    /// initialization and for validating that the two never drift apart.
    pub fn zobrist_from_scratch(&self) -> u64 {
        let mut hash = 0;

        if self.pawn_double_step_available() {
            hash ^= zobrist_ep_key();
        }
        if self.side_to_move.is_black() {
            hash ^= zobrist_side_key();
        }

        for (i, &code) in self.pieces.iter().enumerate() {
            if code != 0 {
                hash ^= ZOBRIST[i][code as usize];
            }
        }

        hash
    }

    /// Applies one half-move, pushing an [`UndoRecord`] so it can be reversed.
    ///
    /// This is the board's sole mutator. The caller guarantees the move is
    /// pseudo-legal; king safety is *not* checked here. Castling is given as
    /// the king's two-square step (the rook relocation is implied), en
    /// passant as the pawn's diagonal move onto the empty square, and a pawn
    /// reaching its last rank is automatically promoted to a Queen.
    ///
    /// Applying [`Move::NULL`] flips the side to move and nothing else.
    pub fn make_move(&mut self, mv: Move) {
        if mv.is_null() {
            self.side_to_move = self.side_to_move.opponent();
            self.hash ^= zobrist_side_key();
            self.move_stack.push(UndoRecord::NULL);
            return;
        }

        let old_ep = self.pawn_double_step_available();

        let (from, to) = (mv.from(), mv.to());
        let (from_bb, to_bb) = (from.bitboard(), to.bitboard());

        let org = self.pieces[from.index()];
        debug_assert!(org != 0, "make_move from an empty square: {mv}");
        let org_kind = PieceKind::from_bits_unchecked(org & TYPE_MASK);
        let org_side = Color::from_bits_unchecked(org >> SIDE_SHIFT);

        let org_had_moved = self.has_moved.intersects(from_bb);
        self.has_moved &= !from_bb;

        let file_change = from.file().abs_diff(to.file());
        let rank_change = from.rank().abs_diff(to.rank());

        let new_ep = org_kind == PieceKind::Pawn && rank_change == 2;
        let ep_flag_changed = new_ep != old_ep;
        if ep_flag_changed {
            self.hash ^= zobrist_ep_key();
        }

        // A two-square king step is castling; relocate the rook as well.
        if org_kind == PieceKind::King && file_change == 2 {
            self.relocate_castling_rook(from, to, org_side);
        }

        // Resolve the capture square: the destination, unless this is en
        // passant, in which case the victim sits one rank behind it.
        let mut captured_sq = to;
        let mut captured = self.pieces[to.index()];
        if captured == 0 && org_kind == PieceKind::Pawn && file_change == 1 {
            let victim_rank = match org_side {
                Color::White => to.rank() - 1,
                Color::Black => to.rank() + 1,
            };
            captured_sq = Square::new(to.file(), victim_rank);
            captured = self.pieces[captured_sq.index()];
        }

        let cap_bb = captured_sq.bitboard();
        let captured_had_moved = self.has_moved.intersects(cap_bb);
        self.has_moved &= !cap_bb;

        if captured != 0 {
            self.side_sets[(captured >> SIDE_SHIFT) as usize] &= !cap_bb;
            self.piece_sets[(captured & TYPE_MASK) as usize] &= !cap_bb;
            self.pieces[captured_sq.index()] = 0;
            self.hash ^= ZOBRIST[captured_sq.index()][captured as usize];
        }

        // Move the piece to its new location.
        self.has_moved |= to_bb;
        self.side_sets[org_side.index()] ^= from_bb | to_bb;
        self.piece_sets[org_kind.index()] ^= from_bb | to_bb;
        self.pieces[from.index()] = 0;
        self.pieces[to.index()] = org;
        self.hash ^= ZOBRIST[from.index()][org as usize] ^ ZOBRIST[to.index()][org as usize];

        // A pawn reaching its last rank becomes a Queen.
        let mut promotion = 0;
        if org_kind == PieceKind::Pawn && to.rank() == org_side.promotion_rank() {
            promotion = PieceKind::Queen as u8 | org_side.bits() << SIDE_SHIFT;
            self.piece_sets[PieceKind::Pawn.index()] &= !to_bb;
            self.piece_sets[PieceKind::Queen.index()] |= to_bb;
            self.pieces[to.index()] = promotion;
            self.hash ^= ZOBRIST[to.index()][org as usize] ^ ZOBRIST[to.index()][promotion as usize];
        }

        self.side_to_move = self.side_to_move.opponent();
        self.hash ^= zobrist_side_key();

        self.repetitions.increment(self.hash);

        self.move_stack.push(UndoRecord {
            from,
            to,
            org_had_moved,
            captured_sq,
            captured,
            captured_had_moved,
            promotion,
            ep_flag_changed,
        });
    }

    /// Reverses the most recently applied move.
    ///
    /// After a `make_move`/`unmake_move` pair, every field of the board,
    /// including the hash and repetition counts, is restored exactly.
    pub fn unmake_move(&mut self) {
        let Some(undo) = self.move_stack.pop() else {
            debug_assert!(false, "unmake_move with an empty move stack");
            return;
        };

        self.side_to_move = self.side_to_move.opponent();

        if !undo.is_null() {
            self.repetitions.decrement(self.hash);
        }

        self.hash ^= zobrist_side_key();

        if undo.is_null() {
            return;
        }

        if undo.ep_flag_changed {
            self.hash ^= zobrist_ep_key();
        }

        let (from, to) = (undo.from, undo.to);
        let (from_bb, to_bb) = (from.bitboard(), to.bitboard());

        let org = self.pieces[to.index()];
        let org_kind = PieceKind::from_bits_unchecked(org & TYPE_MASK);
        let org_side = Color::from_bits_unchecked(org >> SIDE_SHIFT);

        // The rook swap is its own inverse.
        if org_kind == PieceKind::King && from.file().abs_diff(to.file()) == 2 {
            self.relocate_castling_rook(from, to, org_side);
        }

        // Put the moving piece back, downgrading a promoted Queen to a Pawn.
        self.has_moved &= !(from_bb | to_bb);
        if undo.org_had_moved {
            self.has_moved |= from_bb;
        }

        let restored_kind = if undo.promotion != 0 {
            PieceKind::Pawn
        } else {
            org_kind
        };
        let restored = restored_kind as u8 | org_side.bits() << SIDE_SHIFT;

        self.side_sets[org_side.index()] ^= from_bb | to_bb;
        self.piece_sets[org_kind.index()] ^= to_bb;
        self.piece_sets[restored_kind.index()] ^= from_bb;
        self.pieces[to.index()] = 0;
        self.pieces[from.index()] = restored;
        self.hash ^= ZOBRIST[to.index()][org as usize] ^ ZOBRIST[from.index()][restored as usize];

        // Put the captured piece back on the square it actually stood on,
        // which differs from the destination for en passant.
        if undo.captured != 0 {
            let cap_bb = undo.captured_sq.bitboard();
            self.has_moved &= !cap_bb;
            if undo.captured_had_moved {
                self.has_moved |= cap_bb;
            }
            self.side_sets[(undo.captured >> SIDE_SHIFT) as usize] |= cap_bb;
            self.piece_sets[(undo.captured & TYPE_MASK) as usize] |= cap_bb;
            self.pieces[undo.captured_sq.index()] = undo.captured;
            self.hash ^= ZOBRIST[undo.captured_sq.index()][undo.captured as usize];
        }
    }

    /// Moves the rook across the king during castling, in either direction.
    #[inline(always)]
    fn relocate_castling_rook(&mut self, king_from: Square, king_to: Square, side: Color) {
        let corner_file = if king_to.file() < king_from.file() { 0 } else { 7 };
        let rook_from = Square::new(corner_file, king_from.rank());
        let rook_to = Square::new((king_from.file() + king_to.file()) / 2, king_from.rank());

        let rook_code = (PieceKind::Rook as u8 | side.bits() << SIDE_SHIFT) as usize;
        let rook_mask = rook_from.bitboard() | rook_to.bitboard();

        self.side_sets[side.index()] ^= rook_mask;
        self.piece_sets[PieceKind::Rook.index()] ^= rook_mask;
        self.pieces.swap(rook_from.index(), rook_to.index());
        self.hash ^= ZOBRIST[rook_from.index()][rook_code] ^ ZOBRIST[rook_to.index()][rook_code];
    }
}

impl Default for Board {
    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Board {
    /// Renders the position as an `8x8` grid of piece chars, rank 8 on top.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..8).rev() {
            write!(f, "{} ", rank + 1)?;
            for file in 0..8 {
                let c = self
                    .piece_at(Square::new(file, rank))
                    .map(|p| p.char())
                    .unwrap_or('.');
                write!(f, "{c} ")?;
            }
            writeln!(f)?;
        }
        write!(f, "  a b c d e f g h    {} to move", self.side_to_move)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mv(s: &str) -> Move {
        s.parse().unwrap()
    }

    /// Applies `moves` to a fresh board, then unwinds them all and checks
    /// that the board is bitwise identical to an untouched one.
    fn assert_roundtrip(moves: &[&str]) {
        let mut board = Board::new();

        for m in moves {
            board.make_move(mv(m));
            assert_eq!(
                board.hash(),
                board.zobrist_from_scratch(),
                "hash drift after {m}"
            );
        }

        for _ in moves {
            board.unmake_move();
        }

        assert_eq!(board, Board::new(), "round-trip failed for {moves:?}");
    }

    #[test]
    fn test_initial_position() {
        let board = Board::new();
        assert_eq!(board.count_pieces(), 32);
        assert_eq!(board.kind(PieceKind::Pawn).population(), 16);
        assert_eq!(board.kings(Color::White), Square::new(4, 0).bitboard());
        assert_eq!(board.kings(Color::Black), Square::new(4, 7).bitboard());
        assert_eq!(board.hash(), board.zobrist_from_scratch());
        assert_ne!(board.hash(), 0);
    }

    #[test]
    fn test_placement_validation() {
        // Wrong length.
        assert!(Board::from_placement("1234", Color::White).is_err());

        // Invalid piece code (type bits 7).
        let mut bad = String::from(START_POSITION);
        bad.replace_range(16..17, "7");
        assert!(Board::from_placement(&bad, Color::White).is_err());

        // Missing a king.
        let mut no_king = String::from(START_POSITION);
        no_king.replace_range(4..5, "0");
        assert!(Board::from_placement(&no_king, Color::White).is_err());

        // Two white kings.
        let mut two_kings = String::from(START_POSITION);
        two_kings.replace_range(16..17, "1");
        assert!(Board::from_placement(&two_kings, Color::White).is_err());
    }

    #[test]
    fn test_simple_roundtrip() {
        assert_roundtrip(&["e2e4"]);
        assert_roundtrip(&["e2e4", "e7e5", "g1f3", "b8c6"]);
    }

    #[test]
    fn test_capture_roundtrip() {
        assert_roundtrip(&["e2e4", "d7d5", "e4d5", "d8d5"]);
    }

    #[test]
    fn test_castling_roundtrip() {
        // Kingside castling for both sides.
        assert_roundtrip(&[
            "e2e4", "e7e5", "g1f3", "g8f6", "f1c4", "f8c5", "e1g1", "e8g8",
        ]);
    }

    #[test]
    fn test_en_passant_roundtrip() {
        assert_roundtrip(&["e2e4", "a7a6", "e4e5", "d7d5", "e5d6"]);
    }

    #[test]
    fn test_promotion_roundtrip() {
        assert_roundtrip(&[
            "g2g4", "h7h5", "g4h5", "g7g6", "h5g6", "f8h6", "g6g7", "g8f6", "g7g8",
        ]);
    }

    #[test]
    fn test_null_move_roundtrip() {
        let mut board = Board::new();
        let fresh = board.clone();

        board.make_move(Move::NULL);
        assert_eq!(board.side_to_move(), Color::Black);
        assert_ne!(board.hash(), fresh.hash());

        board.unmake_move();
        assert_eq!(board, fresh);
    }

    #[test]
    fn test_castling_moves_the_rook() {
        let mut board = Board::new();
        for m in ["e2e4", "e7e5", "g1f3", "g8f6", "f1c4", "f8c5"] {
            board.make_move(mv(m));
        }
        board.make_move(mv("e1g1"));

        let f1 = Square::new(5, 0);
        let h1 = Square::new(7, 0);
        assert_eq!(
            board.piece_at(f1),
            Some(Piece::new(PieceKind::Rook, Color::White))
        );
        assert_eq!(board.piece_at(h1), None);
        assert_eq!(board.hash(), board.zobrist_from_scratch());
    }

    #[test]
    fn test_en_passant_removes_the_pawn() {
        let mut board = Board::new();
        for m in ["e2e4", "a7a6", "e4e5", "d7d5"] {
            board.make_move(mv(m));
        }

        let d5 = Square::new(3, 4);
        let d6 = Square::new(3, 5);
        assert!(board.piece_at(d5).is_some());

        board.make_move(mv("e5d6"));
        assert_eq!(board.piece_at(d5), None, "en passant must remove d5");
        assert_eq!(
            board.piece_at(d6),
            Some(Piece::new(PieceKind::Pawn, Color::White))
        );
        assert_eq!(board.hash(), board.zobrist_from_scratch());
    }

    #[test]
    fn test_promotion_rewrites_square_and_hash() {
        // White pawn on b7, kings tucked in the corners.
        let placement =
            "0000000100000000000000000000000000000000000000000600000000000009";
        let mut board = Board::from_placement(placement, Color::White).unwrap();

        board.make_move(mv("b7b8"));

        let b8 = Square::new(1, 7);
        assert_eq!(
            board.piece_at(b8),
            Some(Piece::new(PieceKind::Queen, Color::White))
        );
        assert!(board.kind(PieceKind::Pawn).is_empty());
        assert_eq!(
            board.hash(),
            board.zobrist_from_scratch(),
            "hash must reflect the queen key, not the pawn"
        );

        board.unmake_move();
        assert_eq!(
            board.piece_at(Square::new(1, 6)),
            Some(Piece::new(PieceKind::Pawn, Color::White))
        );
        assert_eq!(board.piece_at(b8), None);
    }

    #[test]
    fn test_transposition_hash_equality() {
        // Two move orders reaching the same knights-out position.
        let mut a = Board::new();
        for m in ["g1f3", "b8c6", "b1c3"] {
            a.make_move(mv(m));
        }

        let mut b = Board::new();
        for m in ["b1c3", "b8c6", "g1f3"] {
            b.make_move(mv(m));
        }

        assert_eq!(a.hash(), b.hash());
    }

    #[test]
    fn test_double_step_flag_distinguishes_hashes() {
        // The position after 1. e4 with the double-step still capturable...
        let mut direct = Board::new();
        direct.make_move(mv("e2e4"));
        assert!(direct.pawn_double_step_available());

        // ...versus the identical placement with no history behind it.
        let placement =
            "543213456666066600000000000060000000000000000000eeeeeeeedcba9bcd";
        let cold = Board::from_placement(placement, Color::Black).unwrap();
        assert!(!cold.pawn_double_step_available());

        assert_ne!(direct.hash(), cold.hash());
        assert_eq!(
            direct.hash() ^ zobrist_ep_key(),
            cold.hash(),
            "the difference must be exactly the en passant key"
        );
    }

    #[test]
    fn test_repetition_counts() {
        let mut board = Board::new();
        let shuffle = ["g1f3", "g8f6", "f3g1", "f6g8"];

        for m in shuffle.iter().chain(shuffle.iter()) {
            board.make_move(mv(m));
        }

        // The initial position has now been reached twice more.
        assert_eq!(board.repetition_count(board.hash()), 2);

        board.unmake_move();
        board.unmake_move();
        let fresh = Board::new();
        assert_eq!(fresh.repetition_count(fresh.hash()), 0);
    }
}
