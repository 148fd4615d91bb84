/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! End-to-end scenarios driven through the [`Engine`] facade, the way a
//! front-end would use it: placement string in, rated move out.

use std::sync::Arc;

use stoat::{
    Classical, Color, Engine, Move, Piece, PieceKind, Score, SearchConfig, Square, START_POSITION,
};

fn engine() -> Engine {
    Engine::with_table_capacity(1 << 16)
}

fn config(depth: u8) -> SearchConfig {
    SearchConfig {
        max_depth: depth,
        ..SearchConfig::default()
    }
}

fn mv(s: &str) -> Move {
    s.parse().unwrap()
}

/// Builds a placement string from a short list of pieces.
fn placement(pieces: &[(&str, PieceKind, Color)]) -> String {
    let mut chars = vec!['0'; Square::COUNT];
    for &(s, kind, color) in pieces {
        let square: Square = s.parse().unwrap();
        let code = Piece::new(kind, color).code();
        chars[square.index()] = char::from_digit(code as u32, 16).unwrap();
    }
    chars.into_iter().collect()
}

#[test]
fn test_opening_search_returns_a_sane_move() {
    let res = engine()
        .search_position(START_POSITION, &[], config(4), Arc::new(Classical))
        .unwrap();

    let best = res.bestmove.expect("the opening has 20 moves to pick from");
    assert!(!best.is_null());
    assert!(res.nodes > 0);
    assert_eq!(res.depth, 4);
    assert!(!res.score.is_mate());
}

#[test]
fn test_mate_in_one_through_the_facade() {
    // Back-rank mate with the queen; the king on g8 is boxed in by its
    // own pawns.
    let placement = placement(&[
        ("e1", PieceKind::King, Color::White),
        ("d1", PieceKind::Queen, Color::White),
        ("g8", PieceKind::King, Color::Black),
        ("f7", PieceKind::Pawn, Color::Black),
        ("g7", PieceKind::Pawn, Color::Black),
        ("h7", PieceKind::Pawn, Color::Black),
    ]);

    let res = engine()
        .search_position(&placement, &[], config(3), Arc::new(Classical))
        .unwrap();

    assert_eq!(res.bestmove, Some(mv("d1d8")));
    assert_eq!(res.score.to_string(), "#1");
}

#[test]
fn test_en_passant_capture_through_history() {
    // The history walks into a position where e5xd6 en passant is best
    // checked implicitly: the replay must accept the en passant move.
    let history = [mv("e2e4"), mv("a7a6"), mv("e4e5"), mv("d7d5"), mv("e5d6")];

    let res = engine()
        .search_position(START_POSITION, &history, config(2), Arc::new(Classical))
        .unwrap();

    assert!(res.bestmove.is_some());
}

#[test]
fn test_illegal_en_passant_is_rejected() {
    // Same line, but with a quiet pair of moves in between the double
    // step and the capture: the en passant right has expired.
    let history = [
        mv("e2e4"),
        mv("a7a6"),
        mv("e4e5"),
        mv("d7d5"),
        mv("g1f3"),
        mv("g8f6"),
        mv("e5d6"),
    ];

    let err = engine()
        .search_position(START_POSITION, &history, config(2), Arc::new(Classical))
        .unwrap_err();

    assert!(err.to_string().contains("e5d6"), "got: {err}");
}

#[test]
fn test_threefold_repetition_scores_zero() {
    let shuffle = [
        mv("g1f3"),
        mv("g8f6"),
        mv("f3g1"),
        mv("f6g8"),
        mv("g1f3"),
        mv("g8f6"),
        mv("f3g1"),
        mv("f6g8"),
    ];

    let res = engine()
        .search_position(START_POSITION, &shuffle, config(4), Arc::new(Classical))
        .unwrap();

    assert_eq!(res.score, Score::DRAW);
}

#[test]
fn test_stalemate_reports_no_move() {
    let placement = placement(&[
        ("a1", PieceKind::King, Color::White),
        ("a2", PieceKind::Pawn, Color::White),
        ("c2", PieceKind::King, Color::Black),
        ("a3", PieceKind::Queen, Color::Black),
    ]);

    let res = engine()
        .search_position(&placement, &[], config(4), Arc::new(Classical))
        .unwrap();

    assert_eq!(res.bestmove, None);
    assert_eq!(res.score, Score::DRAW);
}

#[test]
fn test_promotion_race_is_won() {
    // White promotes with check-free tempo; the search must push the pawn.
    let placement = placement(&[
        ("h1", PieceKind::King, Color::White),
        ("b7", PieceKind::Pawn, Color::White),
        ("h8", PieceKind::King, Color::Black),
    ]);

    let res = engine()
        .search_position(&placement, &[], config(3), Arc::new(Classical))
        .unwrap();

    assert_eq!(res.bestmove, Some(mv("b7b8")));
    assert!(res.score.inner() > 800, "a fresh queen is worth a lot");
}

#[test]
fn test_deeper_search_still_agrees_on_forced_mate() {
    // Mate in 1 must be reported as #1 even with depth to spare.
    let placement = placement(&[
        ("g6", PieceKind::King, Color::White),
        ("a7", PieceKind::Queen, Color::White),
        ("h8", PieceKind::King, Color::Black),
        ("a2", PieceKind::Pawn, Color::Black),
    ]);

    let res = engine()
        .search_position(&placement, &[], config(6), Arc::new(Classical))
        .unwrap();

    // Several queen moves mate on the spot; any of them must be chosen
    // and scored as mate in one.
    assert!(res.bestmove.is_some());
    assert_eq!(res.score.to_string(), "#1");
}
