// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Tick Throughput Benchmarks
//!
//! Cost of one capped tick (500 integration steps) with and without a
//! subscriber, and across history capacities.

use std::sync::Arc;
use std::time::Duration;

use axolemma_engine::{EngineSettings, HistorySnapshot, SimulationEngine, StimulusChannel};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

/// Worth the full wall-delta cap
const CAPPED_FRAME: Duration = Duration::from_millis(50);

fn running_engine(history_capacity: usize) -> SimulationEngine {
    let settings = EngineSettings {
        history_capacity,
        ..Default::default()
    };
    let mut engine = SimulationEngine::with_settings(settings).expect("valid settings");
    engine.run_for(1.0e9).expect("valid duration");
    engine
}

fn bench_capped_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("capped_tick");
    group.throughput(Throughput::Elements(500));

    for capacity in [200usize, 2000, 20_000] {
        group.bench_with_input(
            BenchmarkId::new("history_capacity", capacity),
            &capacity,
            |b, &capacity| {
                let mut engine = running_engine(capacity);
                b.iter(|| black_box(engine.tick(black_box(CAPPED_FRAME))));
            },
        );
    }
    group.finish();
}

fn bench_tick_with_subscriber(c: &mut Criterion) {
    let mut engine = running_engine(2000);
    engine.subscribe(Arc::new(|s: &HistorySnapshot| -> Result<(), String> {
        black_box(s.latest_voltage());
        Ok(())
    }));
    engine
        .apply_stimulus(StimulusChannel::One, None, None)
        .expect("valid stimulus");

    c.bench_function("capped_tick_with_subscriber", |b| {
        b.iter(|| black_box(engine.tick(black_box(CAPPED_FRAME))))
    });
}

criterion_group!(benches, bench_capped_tick, bench_tick_with_subscriber);
criterion_main!(benches);
