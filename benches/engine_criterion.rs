/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{sync::Arc, time::Duration};

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use stoat::{perft, Board, Classical, Engine, LogNone, Move, SearchConfig};

/// Leaf counts for the positions walked by the perft benchmark.
const STARTPOS_NODES: [u64; 4] = [20, 400, 8_902, 197_281];

fn bench_perft(c: &mut Criterion) {
    let mut group = c.benchmark_group("perft");

    for depth in 1..=4usize {
        group.throughput(Throughput::Elements(STARTPOS_NODES[depth - 1]));
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, &depth| {
            let mut board = Board::new();
            b.iter(|| {
                let nodes = perft(&mut board, depth);
                assert_eq!(nodes, STARTPOS_NODES[depth - 1]);
                nodes
            });
        });
    }

    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");
    group.sample_size(10);

    // A quiet middlegame-ish position a few moves in.
    let mut board = Board::new();
    let opening: Vec<Move> = ["e2e4", "e7e5", "g1f3", "b8c6", "f1c4", "g8f6"]
        .iter()
        .map(|m| m.parse().unwrap())
        .collect();
    board.replay(&opening).unwrap();

    for depth in [3u8, 5u8] {
        group.bench_with_input(
            BenchmarkId::new("fixed_depth", depth),
            &depth,
            |b, &depth| {
                let engine = Engine::with_table_capacity(1 << 20);
                let config = SearchConfig {
                    max_depth: depth,
                    max_time: Duration::from_secs(300),
                };
                b.iter(|| engine.search::<LogNone>(&board, config, Arc::new(Classical)));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_perft, bench_search);
criterion_main!(benches);
