/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::{bail, Result};
use threadpool::ThreadPool;

use crate::{
    Board, Color, Evaluate, LogLevel, LogNone, Move, Search, SearchConfig, SearchResult, TTable,
    MAX_DEPTH,
};

/// The long-lived engine context: the transposition table, the halt flag,
/// and the worker pool, owned once per process and shared across searches.
///
/// The transposition table survives between searches on purpose: entries
/// carry their full hash, so stale ones are simply misses. Call
/// [`Engine::clear_hash`] between unrelated games if desired.
pub struct Engine {
    ttable: Arc<TTable>,
    halt: Arc<AtomicBool>,
    pool: ThreadPool,
}

impl Engine {
    /// Creates an [`Engine`] with the default transposition table capacity.
    ///
    /// The default table is large (on the order of gigabytes); use
    /// [`Engine::with_table_capacity`] for anything memory-constrained.
    #[inline(always)]
    pub fn new() -> Self {
        Self::with_table_capacity(TTable::DEFAULT_CAPACITY)
    }

    /// Creates an [`Engine`] whose transposition table holds `capacity`
    /// entries (must be a power of two).
    pub fn with_table_capacity(capacity: usize) -> Self {
        Self {
            ttable: Arc::new(TTable::new(capacity)),
            halt: Arc::new(AtomicBool::new(false)),
            pool: ThreadPool::with_name(
                format!("{} search thread", env!("CARGO_PKG_NAME")),
                num_cpus::get().max(1),
            ),
        }
    }

    /// A handle to the halt flag.
    ///
    /// Raising it (from a signal handler, a disconnect callback, an input
    /// thread) makes the running search return its best result so far as
    /// soon as every worker notices.
    #[inline(always)]
    pub fn halt_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.halt)
    }

    /// Raises the halt flag, cancelling any search in progress.
    #[inline(always)]
    pub fn halt(&self) {
        self.halt.store(true, Ordering::Relaxed);
    }

    /// Erases the transposition table.
    #[inline(always)]
    pub fn clear_hash(&self) {
        self.ttable.clear();
    }

    /// Searches `board` and returns the best move found.
    ///
    /// The board is not modified. `Log` selects progress output; library
    /// callers usually want [`LogNone`].
    pub fn search<Log: LogLevel>(
        &self,
        board: &Board,
        config: SearchConfig,
        evaluator: Arc<dyn Evaluate>,
    ) -> SearchResult {
        Search::<Log>::new(
            Arc::clone(&self.ttable),
            Arc::clone(&self.halt),
            self.pool.clone(),
            config,
            evaluator,
        )
        .start(board)
    }

    /// The full request-shaped entry point: builds a position from 64 hex
    /// digits of placement data (White to move), validates and replays a
    /// move history on top of it, and searches the result.
    ///
    /// Rejects malformed placements, out-of-range depths, and histories
    /// containing a move the generator would not produce; none of these
    /// ever reach the search itself.
    pub fn search_position(
        &self,
        placement: &str,
        history: &[Move],
        config: SearchConfig,
        evaluator: Arc<dyn Evaluate>,
    ) -> Result<SearchResult> {
        if config.max_depth == 0 || config.max_depth > MAX_DEPTH {
            bail!(
                "Search depth must be in [1, {MAX_DEPTH}]. Got {}",
                config.max_depth
            );
        }

        let mut board = Board::from_placement(placement, Color::White)?;
        board.replay(history)?;

        Ok(self.search::<LogNone>(&board, config, evaluator))
    }
}

impl Default for Engine {
    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}
