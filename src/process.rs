// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Decomposition strategies applying a per-element transform to a slice.
//!
//! Each strategy establishes `output[i] = work(input[i], i)` for every index.
//! The parallel strategies spawn their worker threads inside the call and
//! join them before returning, so the spawning cost is part of what callers
//! measure. Workers own disjoint output slots by construction (see
//! [`crate::partition`]), so no synchronization beyond the final join is
//! needed. A panic in any worker propagates out of the call once all workers
//! have been joined.

use crate::partition::{cyclic_indices, fixed_range};
use crate::util::DisjointSlots;
use crossbeam_utils::CachePadded;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Applies the work function to every element in order on the calling
/// thread.
pub fn process_sequential<F>(input: &[f64], output: &mut [f64], work: F)
where
    F: Fn(f64, usize) -> f64,
{
    assert_eq!(
        input.len(),
        output.len(),
        "input and output lengths must match"
    );
    for (i, (x, slot)) in input.iter().zip(output.iter_mut()).enumerate() {
        *slot = work(*x, i);
    }
}

/// Applies the work function with `num_threads` workers, worker `t` owning
/// the contiguous range of slots given by [`fixed_range()`].
///
/// The output is carved into disjoint `&mut` chunks up front, one per
/// worker, so the threads share no mutable state.
pub fn process_parallel_ranges<F>(
    input: &[f64],
    output: &mut [f64],
    num_threads: NonZeroUsize,
    work: F,
) where
    F: Fn(f64, usize) -> f64 + Sync,
{
    assert_eq!(
        input.len(),
        output.len(),
        "input and output lengths must match"
    );
    let len = input.len();
    let stats = WorkerStats::new(num_threads.get());
    std::thread::scope(|scope| {
        let work = &work;
        let stats = &stats;
        let mut rest = output;
        for worker in 0..num_threads.get() {
            let bounds = fixed_range(worker, num_threads, len);
            let (chunk, tail) = std::mem::take(&mut rest).split_at_mut(bounds.len());
            rest = tail;
            let input = &input[bounds.clone()];
            scope.spawn(move || {
                pin_current_thread(worker);
                let timer = Instant::now();
                for (offset, (x, slot)) in input.iter().zip(chunk).enumerate() {
                    *slot = work(*x, bounds.start + offset);
                }
                stats.record(worker, timer.elapsed());
            });
        }
    });
    stats.log("ranges");
}

/// Applies the work function with `num_threads` workers, worker `t` owning
/// the residue class `t` modulo the worker count (see [`cyclic_indices()`]).
///
/// The strided slot sets cannot be expressed as `&mut` sub-slices, so the
/// workers write through an aliasing-erased wrapper instead; disjointness of
/// the residue classes makes this sound.
pub fn process_parallel_cyclic<F>(
    input: &[f64],
    output: &mut [f64],
    num_threads: NonZeroUsize,
    work: F,
) where
    F: Fn(f64, usize) -> f64 + Sync,
{
    assert_eq!(
        input.len(),
        output.len(),
        "input and output lengths must match"
    );
    let len = input.len();
    let stats = WorkerStats::new(num_threads.get());
    let slots = DisjointSlots::new(output);
    std::thread::scope(|scope| {
        let work = &work;
        let stats = &stats;
        let slots = &slots;
        for worker in 0..num_threads.get() {
            scope.spawn(move || {
                pin_current_thread(worker);
                let timer = Instant::now();
                for i in cyclic_indices(worker, num_threads, len) {
                    let value = work(input[i], i);
                    // SAFETY: `i` is below `len`, and each worker writes only
                    // its own residue class modulo the worker count, so no
                    // two threads touch the same slot.
                    unsafe { slots.write(i, value) };
                }
                stats.record(worker, timer.elapsed());
            });
        }
    });
    stats.log("cyclic");
}

/// Busy times of the workers of one parallel call, each in its own
/// cache-padded slot so that recording doesn't bounce cache lines between
/// workers.
struct WorkerStats {
    busy_micros: Vec<CachePadded<AtomicU64>>,
}

impl WorkerStats {
    fn new(num_workers: usize) -> Self {
        Self {
            busy_micros: (0..num_workers)
                .map(|_| CachePadded::new(AtomicU64::new(0)))
                .collect(),
        }
    }

    fn record(&self, worker: usize, busy: Duration) {
        self.busy_micros[worker].store(busy.as_micros() as u64, Ordering::Relaxed);
    }

    /// Logs the per-worker busy times, making load imbalance between the
    /// workers observable with `RUST_LOG=debug`.
    fn log(&self, strategy: &str) {
        for (worker, slot) in self.busy_micros.iter().enumerate() {
            log::debug!(
                "[{strategy}] worker {worker} busy for {}us",
                slot.load(Ordering::Relaxed)
            );
        }
    }
}

/// Pins the calling worker thread to a CPU, wrapping around when there are
/// more workers than CPUs. Pinning failures are logged and otherwise
/// ignored.
#[cfg(all(
    not(miri),
    any(
        target_os = "android",
        target_os = "dragonfly",
        target_os = "freebsd",
        target_os = "linux"
    )
))]
fn pin_current_thread(worker: usize) {
    use nix::sched::{sched_setaffinity, CpuSet};
    use nix::unistd::Pid;

    let num_cpus = std::thread::available_parallelism().map_or(1, NonZeroUsize::get);
    let cpu = worker % num_cpus;
    let mut cpu_set = CpuSet::new();
    if let Err(e) = cpu_set.set(cpu) {
        log::warn!("Failed to set CPU affinity for worker #{worker}: {e}");
    } else if let Err(e) = sched_setaffinity(Pid::from_raw(0), &cpu_set) {
        log::warn!("Failed to set CPU affinity for worker #{worker}: {e}");
    } else {
        log::debug!("Pinned worker #{worker} to CPU #{cpu}");
    }
}

/// Pinning worker threads to CPUs is not implemented on this platform.
#[cfg(any(
    miri,
    not(any(
        target_os = "android",
        target_os = "dragonfly",
        target_os = "freebsd",
        target_os = "linux"
    ))
))]
fn pin_current_thread(_worker: usize) {}

#[cfg(test)]
mod test {
    use super::*;
    use crate::work::base_op;

    fn threads(num_threads: usize) -> NonZeroUsize {
        NonZeroUsize::new(num_threads).unwrap()
    }

    #[test]
    fn sequential_applies_the_work_function() {
        let input = [1.0, 2.0, 3.0];
        let mut output = [0.0; 3];
        process_sequential(&input, &mut output, |x, _| base_op(x));
        assert_eq!(output, [base_op(1.0), base_op(2.0), base_op(3.0)]);
    }

    #[test]
    fn sequential_passes_element_indices() {
        let input = [10.0; 5];
        let mut output = [0.0; 5];
        process_sequential(&input, &mut output, |_, i| i as f64);
        assert_eq!(output, [0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    #[should_panic(expected = "input and output lengths must match")]
    fn sequential_rejects_mismatched_lengths() {
        process_sequential(&[1.0], &mut [0.0; 2], |x, _| x);
    }

    #[test]
    #[should_panic(expected = "input and output lengths must match")]
    fn ranges_rejects_mismatched_lengths() {
        process_parallel_ranges(&[1.0], &mut [0.0; 2], threads(2), |x, _| x);
    }

    #[test]
    #[should_panic(expected = "input and output lengths must match")]
    fn cyclic_rejects_mismatched_lengths() {
        process_parallel_cyclic(&[1.0], &mut [0.0; 2], threads(2), |x, _| x);
    }

    #[test]
    fn ranges_handles_an_empty_input() {
        process_parallel_ranges(&[], &mut [], threads(4), |x, _| x);
    }

    #[test]
    fn cyclic_handles_an_empty_input() {
        process_parallel_cyclic(&[], &mut [], threads(4), |x, _| x);
    }

    #[test]
    fn ranges_with_more_workers_than_items() {
        let input = [1.0, 2.0, 3.0];
        let mut output = [0.0; 3];
        process_parallel_ranges(&input, &mut output, threads(8), |x, _| base_op(x));
        assert_eq!(output, [base_op(1.0), base_op(2.0), base_op(3.0)]);
    }

    #[test]
    fn cyclic_with_more_workers_than_items() {
        let input = [1.0, 2.0, 3.0];
        let mut output = [0.0; 3];
        process_parallel_cyclic(&input, &mut output, threads(8), |x, _| base_op(x));
        assert_eq!(output, [base_op(1.0), base_op(2.0), base_op(3.0)]);
    }

    #[test]
    #[should_panic]
    fn ranges_propagates_worker_panics() {
        let input = [1.0; 16];
        let mut output = [0.0; 16];
        process_parallel_ranges(&input, &mut output, threads(4), |x, i| {
            if i == 7 {
                panic!("arithmetic panic");
            }
            x
        });
    }

    #[test]
    #[should_panic]
    fn cyclic_propagates_worker_panics() {
        let input = [1.0; 16];
        let mut output = [0.0; 16];
        process_parallel_cyclic(&input, &mut output, threads(4), |x, i| {
            if i == 7 {
                panic!("arithmetic panic");
            }
            x
        });
    }
}
