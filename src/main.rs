// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Batch driver printing the timing tables for all experiment phases.
//!
//! Takes no command-line arguments; all parameters are compile-time
//! constants. Set `RUST_LOG=debug` to additionally log per-worker busy
//! times and CPU pinning decisions.

fn main() {
    env_logger::init();
    parabench::run_all();
}
