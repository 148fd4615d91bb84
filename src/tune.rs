/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Depth granted to a quiescence extension when the horizon is reached.
macro_rules! quiescence_depth {
    () => {
        12
    };
}
pub(crate) use quiescence_depth;

/// Minimum depth at which null move pruning can be applied.
macro_rules! min_nmp_depth {
    () => {
        2
    };
}
pub(crate) use min_nmp_depth;

/// Value to subtract from `depth` when searching after a null move.
macro_rules! nmp_reduction {
    () => {
        3
    };
}
pub(crate) use nmp_reduction;

/// Game-phase value beyond which null move pruning is unsound (zugzwang).
macro_rules! max_nmp_phase {
    () => {
        14
    };
}
pub(crate) use max_nmp_phase;

/// Minimum depth at which to apply late move reductions.
macro_rules! min_lmr_depth {
    () => {
        3
    };
}
pub(crate) use min_lmr_depth;

/// Moves that must be searched at a node before late move reductions apply.
macro_rules! min_lmr_moves {
    () => {
        3
    };
}
pub(crate) use min_lmr_moves;

/// Move index from which the late-move reduction deepens to `depth / 3`.
macro_rules! deep_lmr_moves {
    () => {
        9
    };
}
pub(crate) use deep_lmr_moves;

/// Ordering bonus for captures that win or trade evenly.
macro_rules! winning_capture_bonus {
    () => {
        100_000
    };
}
pub(crate) use winning_capture_bonus;

/// Ordering bonus for captures that lose material.
macro_rules! losing_capture_bonus {
    () => {
        40_000
    };
}
pub(crate) use losing_capture_bonus;

/// Ordering value of a killer move.
macro_rules! killer_move_value {
    () => {
        50_000
    };
}
pub(crate) use killer_move_value;

/// Killer moves remembered per ply.
macro_rules! killers_per_ply {
    () => {
        2
    };
}
pub(crate) use killers_per_ply;

/// Extra killer-table plies past the nominal maximum depth, covering
/// quiescence extensions.
macro_rules! killer_table_margin {
    () => {
        256
    };
}
pub(crate) use killer_table_margin;
