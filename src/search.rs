/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    marker::PhantomData,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        mpsc, Arc, Mutex, PoisonError,
    },
    time::{Duration, Instant},
};

use anyhow::{anyhow, bail, Result};
use arrayvec::ArrayVec;
use threadpool::ThreadPool;

use crate::{
    eval::game_phase, tune, Bitboard, Board, Bound, Color, Evaluate, Move, MoveGenOptions, Score,
    Square, TTable,
};

/// Maximum depth a search may be asked to run to.
pub const MAX_DEPTH: u8 = 64;

/// Ordering values per piece kind, indexed like the piece sets.
///
/// Used for MVV-LVA capture ordering: capturing a high value with a low
/// value sorts first. The King's value is zero since he cannot be captured.
const ORDER_VALUES: [i32; 7] = [0, 0, 1025, 365, 337, 477, 82];

/// How chatty a [`Search`] should be on stdout.
pub trait LogLevel: Send + Sync + 'static {
    /// Print one summary line per completed depth.
    const INFO: bool;

    /// Also print diagnostics such as the cancellation reason.
    const DEBUG: bool;
}

/// Print nothing; the embedding application reports results itself.
pub struct LogNone;
impl LogLevel for LogNone {
    const INFO: bool = false;
    const DEBUG: bool = false;
}

/// Print a progress line after each completed depth.
pub struct LogInfo;
impl LogLevel for LogInfo {
    const INFO: bool = true;
    const DEBUG: bool = false;
}

/// Print progress and diagnostics.
pub struct LogDebug;
impl LogLevel for LogDebug {
    const INFO: bool = true;
    const DEBUG: bool = true;
}

/// Configuration for one search invocation.
#[derive(Debug, Clone, Copy)]
pub struct SearchConfig {
    /// Maximum depth to iterate to.
    pub max_depth: u8,

    /// Wall-clock budget; the search aborts cleanly when it runs out.
    pub max_time: Duration,
}

impl Default for SearchConfig {
    #[inline(always)]
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
            max_time: Duration::from_secs(10),
        }
    }
}

/// The result of a search: the best move found and its score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchResult {
    /// Number of nodes visited.
    pub nodes: u64,

    /// Best move found, or [`None`] if the position has no legal moves.
    pub bestmove: Option<Move>,

    /// Score of the position after `bestmove`, from the mover's perspective.
    pub score: Score,

    /// Deepest fully completed iteration.
    pub depth: u8,
}

impl Default for SearchResult {
    /// A default result holds a *very bad* score, since there is no move yet.
    #[inline(always)]
    fn default() -> Self {
        Self {
            nodes: 0,
            bestmove: None,
            score: -Score::INF,
            depth: 1,
        }
    }
}

/// A move paired with its ordering value.
#[derive(Debug, Clone, Copy)]
struct RatedMove {
    value: i32,
    mv: Move,
}

/// At most this many moves can exist in any reachable position.
const MAX_MOVES: usize = 256;

type MoveList = ArrayVec<RatedMove, MAX_MOVES>;

/// Killer moves remembered per ply.
const KILLERS_PER_PLY: usize = tune::killers_per_ply!();

/// Quiet moves that caused beta cutoffs, remembered per ply and tried early
/// in sibling subtrees.
///
/// Shared between root workers, so the slots sit behind a mutex; a missed
/// update only costs a little move-ordering quality.
struct KillerTable {
    plies: Mutex<Vec<[Option<Move>; KILLERS_PER_PLY]>>,
}

impl KillerTable {
    fn new(max_ply: usize) -> Self {
        Self {
            plies: Mutex::new(vec![[None; KILLERS_PER_PLY]; max_ply]),
        }
    }

    /// Is `mv` one of the killers recorded at `ply`?
    fn contains(&self, ply: usize, mv: Move) -> bool {
        let plies = self.plies.lock().unwrap_or_else(PoisonError::into_inner);
        plies.get(ply).is_some_and(|slots| slots.contains(&Some(mv)))
    }

    /// Records `mv` as the most recent killer at `ply`.
    fn record(&self, ply: usize, mv: Move) {
        let mut plies = self.plies.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(slots) = plies.get_mut(ply) {
            if slots[0] != Some(mv) {
                slots[1] = slots[0];
                slots[0] = Some(mv);
            }
        }
    }
}

/// State shared by every thread participating in one search.
struct SearchShared {
    ttable: Arc<TTable>,
    killers: KillerTable,
    halt: Arc<AtomicBool>,
    nodes: AtomicU64,
    evaluator: Arc<dyn Evaluate>,
    starttime: Instant,
    budget: Duration,
}

impl SearchShared {
    /// Whether the wall-clock budget has been spent.
    #[inline(always)]
    fn out_of_time(&self) -> bool {
        self.starttime.elapsed() >= self.budget
    }
}

/// Values threaded through the recursion besides the window.
#[derive(Debug, Clone, Copy)]
struct NodeContext {
    /// Depth of the current iterative-deepening iteration, extended when
    /// entering quiescence. Gates null-move pruning near the root.
    root_depth: i32,
}

/// One thread's view of the search: a board it owns exclusively plus the
/// shared tables.
struct Searcher<'a> {
    board: &'a mut Board,
    shared: Arc<SearchShared>,

    /// Present only on the root thread; workers never fan out again.
    pool: Option<&'a ThreadPool>,
}

impl Searcher<'_> {
    /// The negamax recursion with alpha-beta pruning.
    ///
    /// Fail-hard: the return value is clamped to the `[alpha, beta]` window.
    /// `out` is given only at the root, where the best move is written back;
    /// its presence also disables transposition cutoffs and null-move
    /// pruning so the root is always fully re-searched.
    ///
    /// An expired deadline or a raised halt flag surfaces as an `Err`. The
    /// frame that notices unwinds every move this thread applied since the
    /// root, so propagating the error with `?` is always safe and leaves
    /// the board in its root state.
    #[allow(clippy::too_many_arguments)]
    fn negamax(
        &mut self,
        parallel: bool,
        depth: i32,
        mut alpha: Score,
        mut beta: Score,
        out: Option<&mut SearchResult>,
        ctx: NodeContext,
        quiescence: bool,
    ) -> Result<Score> {
        let orig_alpha = alpha;
        let side = self.board.side_to_move();
        let hash = self.board.hash();
        let is_root = out.is_some();

        self.shared.nodes.fetch_add(1, Ordering::Relaxed);

        // Reaching a position for the third time is a draw.
        if self.board.repetition_count(hash) + 1 >= 3 {
            return Ok(Score::DRAW);
        }

        // Transposition cutoffs, skipped at the root so the best move is
        // always reconstructed by a real search.
        if !is_root {
            if let Some(entry) = self.shared.ttable.load(hash) {
                if entry.depth as i32 >= depth {
                    match entry.bound {
                        Bound::Exact => return Ok(self.mate_adjusted(entry.score)),
                        Bound::Lower => alpha = alpha.max(entry.score),
                        Bound::Upper => beta = beta.min(entry.score),
                        Bound::Unused => {}
                    }

                    if alpha >= beta {
                        return Ok(entry.score);
                    }
                }
            }
        }

        // Poll the deadline and the halt flag. On expiry, unwind every move
        // this thread has applied so the board returns to its root state,
        // then propagate.
        if depth >= 2
            && (self.shared.out_of_time() || self.shared.halt.load(Ordering::Relaxed))
        {
            for _ in 0..self.board.appended_moves {
                self.board.unmake_move();
            }
            self.board.appended_moves = 0;
            bail!("out of time at depth {depth}");
        }

        let checked = self.board.in_check(side);

        // No legal moves at all: checkmate or stalemate.
        if !self.board.any_moves(side) {
            return Ok(if checked {
                -Score::MATE + self.board.appended_moves as i32
            } else {
                Score::DRAW
            });
        }

        let stand_pat = self.shared.evaluator.eval(self.board, side);

        // Stand pat: in quiescence the side to move may decline to capture.
        if quiescence && !checked {
            if stand_pat >= beta {
                return Ok(beta);
            }
            if alpha < stand_pat {
                alpha = stand_pat;
            }
        }

        // A position is quiet once there is nothing tactical left to try.
        let quiet =
            (depth > 0 && !quiescence) || (!checked && !self.board.any_captures(side));

        if depth <= 0 {
            if !quiescence && !quiet {
                // The horizon landed in the middle of a tactic; extend with
                // a bounded captures-only search.
                return self.negamax(
                    parallel,
                    tune::quiescence_depth!(),
                    alpha,
                    beta,
                    None,
                    NodeContext {
                        root_depth: ctx.root_depth + tune::quiescence_depth!(),
                    },
                    true,
                );
            }
            return Ok(stand_pat);
        }

        if quiescence && quiet {
            return Ok(stand_pat);
        }

        // Null move pruning: hand the opponent a free tempo, and if the
        // reduced search still clears beta, cut. Unsound in the endgame
        // (zugzwang) and pointless right at the root.
        if !quiescence
            && game_phase(self.board) < tune::max_nmp_phase!()
            && depth >= tune::min_nmp_depth!()
            && !checked
            && !is_root
            && self.board.appended_moves as i32 > ctx.root_depth / 4
        {
            self.board.make_move(Move::NULL);
            self.board.appended_moves += 1;

            let value = match self.negamax(
                false,
                depth - tune::nmp_reduction!(),
                -beta,
                -beta + 1,
                None,
                ctx,
                quiescence,
            ) {
                Ok(v) => -v,
                // The board was already unwound past this frame.
                Err(e) => return Err(e),
            };

            self.board.unmake_move();
            self.board.appended_moves -= 1;

            if value >= beta {
                return Ok(beta);
            }
        }

        let ply = (self.board.appended_moves + 1) as usize;

        let moves = self.rated_moves(side, quiescence, checked);
        debug_assert!(!moves.is_empty(), "legal moves vanished between queries");
        if moves.is_empty() {
            return Ok(stand_pat);
        }

        let mut best_value = -Score::INF;
        let mut best_move = moves[0].mv;
        let mut search_pv = true;

        if let Some(pool) = self.pool.filter(|_| parallel) {
            // Root parallelism: search batches of moves on cloned boards,
            // then merge in move order so alpha updates stay deterministic.
            let workers = pool.max_count().max(1);

            let mut i = 0;
            'batches: while i < moves.len() {
                let batch = &moves[i..(i + workers).min(moves.len())];
                let (sender, receiver) = mpsc::channel();

                for (j, rated) in batch.iter().enumerate() {
                    let mut board = self.board.clone();
                    let shared = Arc::clone(&self.shared);
                    let sender = sender.clone();
                    let rated = *rated;
                    let (move_index, pv) = (i + j, search_pv);

                    pool.execute(move || {
                        let mut searcher = Searcher {
                            board: &mut board,
                            shared,
                            pool: None,
                        };
                        let value = searcher.search_move(
                            &rated, pv, move_index, depth, alpha, beta, ctx, quiescence,
                        );
                        // The receiver only hangs up if the batch was abandoned.
                        let _ = sender.send((j, value));
                    });
                }
                drop(sender);

                let mut outputs: Vec<Option<Result<Score>>> = Vec::new();
                outputs.resize_with(batch.len(), || None);
                for _ in 0..batch.len() {
                    let (j, value) = receiver
                        .recv()
                        .map_err(|_| anyhow!("a search worker disappeared"))?;
                    outputs[j] = Some(value);
                }

                for (j, value) in outputs.into_iter().enumerate() {
                    let Some(value) = value else { continue };
                    let value = value?;

                    if value > best_value {
                        best_value = value;
                        best_move = batch[j].mv;
                    }
                    if best_value > alpha {
                        alpha = best_value;
                        search_pv = false;
                    }
                    if alpha >= beta {
                        if ply >= 2 {
                            self.shared.killers.record(ply, best_move);
                        }
                        break 'batches;
                    }
                }

                i += batch.len();
            }
        } else {
            for (move_index, rated) in moves.iter().enumerate() {
                let value = self.search_move(
                    rated, search_pv, move_index, depth, alpha, beta, ctx, quiescence,
                )?;

                if value > best_value {
                    best_value = value;
                    best_move = rated.mv;
                }
                if best_value > alpha {
                    alpha = best_value;
                    search_pv = false;
                }
                if alpha >= beta {
                    if ply >= 2 {
                        self.shared.killers.record(ply, best_move);
                    }
                    break;
                }
            }
        }

        // Remember what this node learned. Quiescence values are partial
        // (captures only), so they never enter the table.
        if !quiescence {
            let bound = if best_value <= orig_alpha {
                Bound::Upper
            } else if best_value >= beta {
                Bound::Lower
            } else {
                Bound::Exact
            };
            self.shared.ttable.store(hash, best_value, depth as u8, bound);
        }

        if let Some(out) = out {
            out.score = best_value;
            out.bestmove = Some(best_move);
        }

        Ok(alpha)
    }

    /// Applies one move and searches below it, with late-move reductions
    /// and principal-variation windows.
    #[allow(clippy::too_many_arguments)]
    fn search_move(
        &mut self,
        rated: &RatedMove,
        search_pv: bool,
        move_index: usize,
        depth: i32,
        alpha: Score,
        beta: Score,
        ctx: NodeContext,
        quiescence: bool,
    ) -> Result<Score> {
        let mv = rated.mv;
        let capture = self.board.piece_at(mv.to()).is_some();

        self.board.make_move(mv);
        self.board.appended_moves += 1;

        let value = match self.child_value(
            search_pv, move_index, depth, alpha, beta, ctx, quiescence, capture,
        ) {
            Ok(v) => v,
            // A timed-out frame below already unwound this move with the
            // rest of the line; unmaking here would corrupt the board.
            Err(e) => return Err(e),
        };

        self.board.unmake_move();
        self.board.appended_moves -= 1;

        Ok(value)
    }

    #[allow(clippy::too_many_arguments)]
    fn child_value(
        &mut self,
        search_pv: bool,
        move_index: usize,
        depth: i32,
        alpha: Score,
        beta: Score,
        ctx: NodeContext,
        quiescence: bool,
        capture: bool,
    ) -> Result<Score> {
        let stm = self.board.side_to_move();

        // Late move reductions: well-ordered late quiet moves rarely matter,
        // so try them shallower first and only re-search on a surprise.
        if !quiescence
            && depth >= tune::min_lmr_depth!()
            && move_index >= tune::min_lmr_moves!()
            && !capture
            && !self.board.in_check(stm.opponent())
            && !self.board.in_check(stm)
        {
            let reduction = if move_index >= tune::deep_lmr_moves!() {
                depth / 3
            } else {
                1
            };

            let mut value = -self.negamax(
                false,
                depth - reduction - 1,
                -(alpha + 1),
                -alpha,
                None,
                ctx,
                quiescence,
            )?;

            if value > alpha {
                value =
                    -self.negamax(false, depth - 1, -beta, -alpha, None, ctx, quiescence)?;
            }

            return Ok(value);
        }

        // Principal variation search: the first move gets the full window,
        // the rest a null window with a re-search when one beats alpha.
        if search_pv {
            return Ok(-self.negamax(false, depth - 1, -beta, -alpha, None, ctx, quiescence)?);
        }

        let value = -self.negamax(
            false,
            depth - 1,
            -(alpha + 1),
            -alpha,
            None,
            ctx,
            quiescence,
        )?;

        if value > alpha {
            return Ok(-self.negamax(false, depth - 1, -beta, -alpha, None, ctx, quiescence)?);
        }

        Ok(value)
    }

    /// Generates the legal moves and orders them best-first.
    ///
    /// Ordering, descending: positions the transposition table scored
    /// exactly, then captures by MVV-LVA (winning before losing), then
    /// killers at this ply, then quiets by static evaluation of the child.
    fn rated_moves(&mut self, side: Color, quiescence: bool, checked: bool) -> MoveList {
        let mask = if quiescence && !checked {
            self.board.color(side.opponent())
        } else {
            Bitboard::FULL
        };

        let mut out = [Bitboard::EMPTY; Square::COUNT];
        self.board.generate_moves(
            side,
            &mut out,
            MoveGenOptions {
                mask,
                ..MoveGenOptions::default()
            },
        );

        let ply = (self.board.appended_moves + 1) as usize;
        let mut moves = MoveList::new();

        for from_index in 0..Square::COUNT {
            let dests = out[from_index];
            if dests.is_empty() {
                continue;
            }

            let from = Square::from_index_unchecked(from_index);
            let attacker = self.piece_order_value(from);

            for to in dests {
                let mv = Move::new(from, to);
                let victim = self.piece_order_value(to);

                let pre_count = self.board.count_pieces();
                self.board.make_move(mv);
                // Comparing piece counts catches en passant, where the
                // destination square was empty.
                let capture = pre_count != self.board.count_pieces();

                let mut value = None;

                // A position the table knows exactly is worth trying first.
                if let Some(entry) = self.shared.ttable.load(self.board.hash()) {
                    if entry.bound == Bound::Exact {
                        value = Some(i32::MAX - 256 + entry.depth as i32);
                    }
                }

                let value = match value {
                    Some(v) => v,
                    None if capture => {
                        let diff = victim - attacker;
                        diff + if diff >= 0 {
                            tune::winning_capture_bonus!()
                        } else {
                            tune::losing_capture_bonus!()
                        }
                    }
                    None if ply >= 2
                        && !quiescence
                        && self.shared.killers.contains(ply, mv) =>
                    {
                        tune::killer_move_value!()
                    }
                    None => self.shared.evaluator.eval(self.board, side).inner(),
                };

                self.board.unmake_move();
                moves.push(RatedMove { value, mv });
            }
        }

        insertion_sort(&mut moves);
        moves
    }

    /// MVV-LVA value of the piece on `square`, `0` for an empty square.
    #[inline(always)]
    fn piece_order_value(&self, square: Square) -> i32 {
        self.board
            .piece_at(square)
            .map(|p| ORDER_VALUES[p.kind().index()])
            .unwrap_or(0)
    }

    /// Re-centers a stored mate score to this node's distance from the root.
    #[inline(always)]
    fn mate_adjusted(&self, score: Score) -> Score {
        let appended = self.board.appended_moves as i32;
        if score >= Score::LOWEST_MATE {
            score - appended
        } else if score <= -Score::LOWEST_MATE {
            score + appended
        } else {
            score
        }
    }
}

/// Insertion sort, descending by value.
///
/// Move lists are short and nearly sorted often enough that this beats a
/// general-purpose sort here.
fn insertion_sort(moves: &mut [RatedMove]) {
    for i in 1..moves.len() {
        let mut j = i;
        while j > 0 && moves[j - 1].value < moves[j].value {
            moves.swap(j - 1, j);
            j -= 1;
        }
    }
}

/// First legal move the generator produces, used as a fallback answer when
/// the clock runs out before any iteration completes.
fn first_legal_move(board: &mut Board) -> Option<Move> {
    let mut out = [Bitboard::EMPTY; Square::COUNT];
    let side = board.side_to_move();
    board.generate_moves(side, &mut out, MoveGenOptions::any_within(Bitboard::FULL));

    out.iter().enumerate().find_map(|(i, dests)| {
        dests.is_nonempty().then(|| {
            Move::new(
                Square::from_index_unchecked(i),
                dests.to_square_unchecked(),
            )
        })
    })
}

/// An iterative-deepening search over a position.
///
/// Owns handles to the process-lived transposition table and halt flag, and
/// a worker pool used only for root-level parallelism. The `Log` parameter
/// selects how much progress information is printed.
pub struct Search<Log> {
    ttable: Arc<TTable>,
    halt: Arc<AtomicBool>,
    pool: ThreadPool,
    config: SearchConfig,
    evaluator: Arc<dyn Evaluate>,
    _log: PhantomData<Log>,
}

impl<Log: LogLevel> Search<Log> {
    /// Constructs a new [`Search`] instance to execute.
    #[inline(always)]
    pub fn new(
        ttable: Arc<TTable>,
        halt: Arc<AtomicBool>,
        pool: ThreadPool,
        config: SearchConfig,
        evaluator: Arc<dyn Evaluate>,
    ) -> Self {
        Self {
            ttable,
            halt,
            pool,
            config,
            evaluator,
            _log: PhantomData,
        }
    }

    /// Runs the search on `board`, returning the best result found within
    /// the configured depth and time budget.
    ///
    /// The caller's board is never modified; the search works on a clone.
    /// Deepening stops early once a forced mate is proven, when time runs
    /// out, or when the halt flag is raised.
    pub fn start(self, board: &Board) -> SearchResult {
        // A fresh search; an external handler may raise the flag from here on.
        self.halt.store(false, Ordering::Relaxed);

        let shared = Arc::new(SearchShared {
            ttable: Arc::clone(&self.ttable),
            killers: KillerTable::new(
                self.config.max_depth as usize + tune::killer_table_margin!(),
            ),
            halt: Arc::clone(&self.halt),
            nodes: AtomicU64::new(0),
            evaluator: Arc::clone(&self.evaluator),
            starttime: Instant::now(),
            budget: self.config.max_time,
        });

        let mut board = board.clone();
        board.appended_moves = 0;

        let mut result = SearchResult {
            // If even depth 1 cannot finish, any legal move beats none.
            bestmove: first_legal_move(&mut board),
            ..SearchResult::default()
        };

        for depth in 1..=self.config.max_depth {
            if shared.out_of_time() {
                break;
            }

            let mut iteration = SearchResult::default();
            let mut searcher = Searcher {
                board: &mut board,
                shared: Arc::clone(&shared),
                pool: Some(&self.pool),
            };

            let outcome = searcher.negamax(
                true,
                depth as i32,
                -Score::INF,
                Score::INF,
                Some(&mut iteration),
                NodeContext {
                    root_depth: depth as i32,
                },
                false,
            );

            match outcome {
                Ok(score) => {
                    if iteration.bestmove.is_some() {
                        result.bestmove = iteration.bestmove;
                        result.score = iteration.score;
                    } else {
                        // The root exited before the move loop: a draw by
                        // repetition, or no legal moves at all.
                        result.bestmove = None;
                        result.score = score;
                    }
                    result.depth = depth;
                    result.nodes = shared.nodes.load(Ordering::Relaxed);

                    if Log::INFO {
                        println!(
                            "{depth}/{} plies, {} nodes in {:.1}s, score = {}",
                            self.config.max_depth,
                            result.nodes,
                            shared.starttime.elapsed().as_secs_f32(),
                            result.score,
                        );
                    }

                    // A forced mate is proven; deeper search cannot help.
                    if result.score.is_mate() {
                        break;
                    }
                }
                Err(reason) => {
                    if Log::DEBUG {
                        println!("search cancelled at depth {depth}: {reason}");
                    }
                    break;
                }
            }
        }

        result.nodes = shared.nodes.load(Ordering::Relaxed);
        result
    }
}
