// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A wall-clock timing harness averaging repeated runs of an action.

use std::time::Instant;

/// Options for [`measure_ms()`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimingOptions {
    /// Number of times to execute the measured action.
    pub trials: usize,
    /// Whether to discard the first trial's measurement as a warm-up run.
    pub warmup: bool,
}

impl Default for TimingOptions {
    fn default() -> Self {
        Self {
            trials: 5,
            warmup: true,
        }
    }
}

/// Executes the action `options.trials` times and returns the mean wall-clock
/// duration in milliseconds, discarding the first measurement if
/// `options.warmup` is set (the warm-up run is still executed).
///
/// The action is responsible for resetting any shared state between trials.
pub fn measure_ms(options: TimingOptions, mut action: impl FnMut()) -> f64 {
    let mut samples_ms = Vec::with_capacity(options.trials);
    for _ in 0..options.trials {
        let timer = Instant::now();
        action();
        samples_ms.push(timer.elapsed().as_secs_f64() * 1_000.0);
    }
    mean_ms(&samples_ms, options.warmup)
}

/// Averages the given measurements, skipping the first one if `warmup` is
/// set. The divisor is clamped to 1, so a degenerate sample set reports the
/// raw sum (zero) instead of dividing by zero.
fn mean_ms(samples_ms: &[f64], warmup: bool) -> f64 {
    let kept = if warmup {
        samples_ms.get(1..).unwrap_or(&[])
    } else {
        samples_ms
    };
    kept.iter().sum::<f64>() / kept.len().max(1) as f64
}
