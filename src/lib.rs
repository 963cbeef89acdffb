// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

#![doc = include_str!("../README.md")]
#![forbid(missing_docs)]
#![deny(unsafe_op_in_unsafe_fn)]

mod experiments;
mod partition;
mod process;
mod timing;
mod util;
mod work;

pub use experiments::{
    cost_phase, demo_phase, imbalance_phase, run_all, scaling_phase, seeded_vector,
};
pub use partition::{cyclic_indices, fixed_range};
pub use process::{process_parallel_cyclic, process_parallel_ranges, process_sequential};
pub use timing::{measure_ms, TimingOptions};
pub use work::{base_op, hard_op, non_uniform_op, BASE_FACTOR};
