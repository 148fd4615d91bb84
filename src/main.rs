/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    io::{self, BufRead, Read},
    sync::{atomic::Ordering, Arc},
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use stoat::{Classical, Engine, LogInfo, Move, SearchConfig, START_POSITION};

/// Searches a chess position read from stdin and prints the best move.
///
/// Input format: one line holding either `startpos` or 64 hex digits of
/// piece placement (White to move), one line with the number of history
/// moves, then that many moves, one per line, as either coordinate
/// notation (`e2e4`) or four integers (`4 1 4 3`).
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Maximum search depth, in plies.
    #[arg(short, long, default_value_t = 8)]
    depth: u8,

    /// Wall-clock search budget, in seconds.
    #[arg(short, long, default_value_t = 10)]
    time: u64,

    /// Transposition table capacity, in entries (a power of two).
    #[arg(long, default_value_t = 1 << 22)]
    hash_entries: usize,
}

/// Parses one history move: `e2e4` or `ox oy dx dy`.
fn parse_move(line: &str) -> Result<Move> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() == 4 {
        let mut coords = [0u8; 4];
        for (slot, field) in coords.iter_mut().zip(&fields) {
            *slot = field
                .parse()
                .with_context(|| format!("Invalid coordinate {field:?}"))?;
        }
        Move::from_coords(coords[0], coords[1], coords[2], coords[3])
    } else {
        line.trim().parse()
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut next_line = || -> Result<String> {
        lines
            .next()
            .context("Unexpected end of input")?
            .context("Failed to read from stdin")
    };

    let placement_line = next_line()?;
    let placement = match placement_line.trim() {
        "startpos" => START_POSITION.to_string(),
        other => other.to_string(),
    };

    let count: usize = next_line()?
        .trim()
        .parse()
        .context("Expected the number of history moves")?;

    let mut history = Vec::with_capacity(count);
    for _ in 0..count {
        history.push(parse_move(&next_line()?)?);
    }
    // Release the stdin lock so the keypress listener can take it over.
    drop(lines);

    let engine = Engine::with_table_capacity(cli.hash_entries);

    // Any keypress cancels the search; the engine then answers with the
    // best move it has so far.
    let halt = engine.halt_flag();
    std::thread::spawn(move || {
        let mut byte = [0u8; 1];
        if matches!(io::stdin().read(&mut byte), Ok(n) if n > 0) {
            halt.store(true, Ordering::Relaxed);
        }
    });

    let config = SearchConfig {
        max_depth: cli.depth,
        max_time: Duration::from_secs(cli.time),
    };

    let mut board = stoat::Board::from_placement(&placement, stoat::Color::White)?;
    board.replay(&history)?;
    println!("{board}");

    let result = engine.search::<LogInfo>(&board, config, Arc::new(Classical));

    match result.bestmove {
        Some(mv) => println!("bestmove {mv}  score {}", result.score),
        None => println!("bestmove (none)  score {}", result.score),
    }

    Ok(())
}
