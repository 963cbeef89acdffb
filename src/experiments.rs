// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The experiment driver: four phases sweeping the input size, worker count,
//! per-element cost and workload shape, printing one timing table each.
//!
//! All parameters are compile-time constants. The phases are independent of
//! each other and run in sequence on the calling thread.

use crate::process::{process_parallel_cyclic, process_parallel_ranges, process_sequential};
use crate::timing::{measure_ms, TimingOptions};
use crate::work::{base_op, hard_op, non_uniform_op};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha12Rng;
use std::hint::black_box;
use std::num::NonZeroUsize;

/// Seed for the input vectors, fixed for reproducibility across runs.
const SEED: u64 = 42;
/// Input size used by the demonstration, cost and imbalance phases.
const DEMO_SIZE: usize = 100_000;
/// Worker count cap for the demonstration phase.
const DEMO_THREADS: usize = 4;
/// Input sizes swept by the scaling phase.
const SWEEP_SIZES: &[usize] = &[10, 100, 1_000, 100_000];
/// Worker counts swept by the scaling phase.
const SWEEP_THREADS: &[usize] = &[2, 3, 4, 5, 10];
/// Per-element cost multipliers swept by the cost phase.
const COST_MULTIPLIERS: &[u32] = &[1, 2, 5, 10, 20];
/// Worker counts used by the cost and imbalance phases.
const COMPARISON_THREADS: &[usize] = &[2, 4, 8];

/// Generates a vector of pseudo-random values in `[0, 1)`. The sequence is
/// fixed by the seed for reproducibility, not for cryptographic strength.
pub fn seeded_vector(len: usize, seed: u64) -> Vec<f64> {
    let mut rng = ChaCha12Rng::seed_from_u64(seed);
    (0..len).map(|_| rng.random()).collect()
}

/// Runs the four experiment phases in sequence.
pub fn run_all() {
    demo_phase();
    scaling_phase();
    cost_phase();
    imbalance_phase();
}

/// Times the three strategies side by side on a uniform workload.
pub fn demo_phase() {
    let num_threads = demo_threads();
    println!("=== Demo: sequential vs. ranges vs. cyclic (N = {DEMO_SIZE}, M = {num_threads}) ===");
    let input = seeded_vector(DEMO_SIZE, SEED);
    let mut output = vec![0.0; DEMO_SIZE];

    let t_seq = measure_ms(TimingOptions::default(), || {
        output.fill(0.0);
        process_sequential(
            black_box(input.as_slice()),
            black_box(output.as_mut_slice()),
            |x, _| base_op(x),
        );
    });
    let t_ranges = measure_ms(TimingOptions::default(), || {
        output.fill(0.0);
        process_parallel_ranges(
            black_box(input.as_slice()),
            black_box(output.as_mut_slice()),
            num_threads,
            |x, _| base_op(x),
        );
    });
    let t_cyclic = measure_ms(TimingOptions::default(), || {
        output.fill(0.0);
        process_parallel_cyclic(
            black_box(input.as_slice()),
            black_box(output.as_mut_slice()),
            num_threads,
            |x, _| base_op(x),
        );
    });

    println!("sequential: {t_seq:.3} ms");
    println!("ranges:     {t_ranges:.3} ms");
    println!("cyclic:     {t_cyclic:.3} ms");
    println!();
}

/// Sweeps input sizes and worker counts on a uniform workload, reporting the
/// sequential and range-parallel timings and the resulting speedup as CSV
/// rows. The input vector is generated once per size and reused across the
/// worker counts.
pub fn scaling_phase() {
    println!("=== Scaling sweep: uniform workload, sequential vs. ranges ===");
    println!("N,M,T_seq_ms,T_par_range_ms,Speedup_range");
    for &len in SWEEP_SIZES {
        let input = seeded_vector(len, SEED);
        let mut output = vec![0.0; len];
        let t_seq = measure_ms(TimingOptions::default(), || {
            output.fill(0.0);
            process_sequential(
                black_box(input.as_slice()),
                black_box(output.as_mut_slice()),
                |x, _| base_op(x),
            );
        });
        for &num_threads in SWEEP_THREADS {
            let t_par = measure_ms(TimingOptions::default(), || {
                output.fill(0.0);
                process_parallel_ranges(
                    black_box(input.as_slice()),
                    black_box(output.as_mut_slice()),
                    sweep_threads(num_threads),
                    |x, _| base_op(x),
                );
            });
            println!("{}", scaling_row(len, num_threads, t_seq, t_par));
        }
    }
    println!();
}

/// Sweeps the per-element cost multiplier at a fixed input size, comparing
/// the sequential timing against range partitioning at several worker
/// counts.
pub fn cost_phase() {
    println!("=== Cost sweep: N = {DEMO_SIZE}, sequential vs. ranges ===");
    println!("K,T_seq_ms,T_M2_ms,T_M4_ms,T_M8_ms");
    let input = seeded_vector(DEMO_SIZE, SEED);
    let mut output = vec![0.0; DEMO_SIZE];
    for &multiplier in COST_MULTIPLIERS {
        let t_seq = measure_ms(TimingOptions::default(), || {
            output.fill(0.0);
            process_sequential(
                black_box(input.as_slice()),
                black_box(output.as_mut_slice()),
                |x, _| hard_op(x, multiplier),
            );
        });
        let mut t_par = Vec::with_capacity(COMPARISON_THREADS.len());
        for &num_threads in COMPARISON_THREADS {
            t_par.push(measure_ms(TimingOptions::default(), || {
                output.fill(0.0);
                process_parallel_ranges(
                    black_box(input.as_slice()),
                    black_box(output.as_mut_slice()),
                    sweep_threads(num_threads),
                    |x, _| hard_op(x, multiplier),
                );
            }));
        }
        println!("{}", cost_row(multiplier, t_seq, &t_par));
    }
    println!();
}

/// Compares range and cyclic partitioning on a workload whose cost grows
/// with the element index. Contiguous ranges give the last worker the most
/// expensive elements, while the cyclic strategy spreads the expensive tail
/// evenly across workers.
pub fn imbalance_phase() {
    println!("=== Imbalance: non-uniform workload, ranges vs. cyclic (N = {DEMO_SIZE}) ===");
    let input = seeded_vector(DEMO_SIZE, SEED);
    let mut output = vec![0.0; DEMO_SIZE];
    for &num_threads in COMPARISON_THREADS {
        let t_ranges = measure_ms(TimingOptions::default(), || {
            output.fill(0.0);
            process_parallel_ranges(
                black_box(input.as_slice()),
                black_box(output.as_mut_slice()),
                sweep_threads(num_threads),
                non_uniform_op,
            );
        });
        let t_cyclic = measure_ms(TimingOptions::default(), || {
            output.fill(0.0);
            process_parallel_cyclic(
                black_box(input.as_slice()),
                black_box(output.as_mut_slice()),
                sweep_threads(num_threads),
                non_uniform_op,
            );
        });
        println!("{}", imbalance_row(num_threads, t_ranges, t_cyclic));
    }
    println!();
}

/// Resolves the demonstration worker count: the available parallelism,
/// capped at [`DEMO_THREADS`].
fn demo_threads() -> NonZeroUsize {
    let available = std::thread::available_parallelism().map_or(DEMO_THREADS, NonZeroUsize::get);
    NonZeroUsize::new(DEMO_THREADS.min(available)).expect("the worker count cap is positive")
}

/// Converts a worker count from the constant parameter tables.
fn sweep_threads(num_threads: usize) -> NonZeroUsize {
    NonZeroUsize::new(num_threads).expect("worker counts in the parameter tables are positive")
}

/// Formats one CSV row of the scaling sweep.
fn scaling_row(len: usize, num_threads: usize, t_seq: f64, t_par: f64) -> String {
    let speedup = t_seq / t_par;
    format!("{len},{num_threads},{t_seq:.3},{t_par:.3},{speedup:.2}")
}

/// Formats one CSV row of the cost sweep.
fn cost_row(multiplier: u32, t_seq: f64, t_par: &[f64]) -> String {
    let mut row = format!("{multiplier},{t_seq:.2}");
    for t in t_par {
        row.push_str(&format!(",{t:.2}"));
    }
    row
}

/// Formats one report line of the imbalance comparison.
fn imbalance_row(num_threads: usize, t_ranges: f64, t_cyclic: f64) -> String {
    format!("M={num_threads}: ranges={t_ranges:.2} ms, cyclic={t_cyclic:.2} ms (lower is better)")
}
