//! Benchmark harness for comparing UI-update performance across pluggable
//! terminal rendering back-ends.
//!
//! The harness drives identical synthetic workloads against injected
//! [`Adapter`](adapter::Adapter) implementations and collects reproducible
//! timing and memory statistics:
//!
//! - [`rng`] / [`workload`]: deterministic payload generation, where the
//!   same `(scenario, seed, scale)` always produces bit-identical payloads.
//! - [`runner`]: warmup then measured iterations, with each iteration's
//!   elapsed time split into a build phase (applying the payload to the
//!   back-end's in-memory state) and a render phase (flushing to output).
//! - [`memory`]: periodic process memory snapshots reduced to
//!   delta and peak.
//! - [`stats`]: duration sequences reduced to count / average / median /
//!   p95 / min / max / population stddev.
//! - [`report`]: per-scenario result lines and an optional
//!   `{runId, config, results}` JSON document.
//! - [`harness`]: validated, strictly sequential top-level run loop.
//!
//! # Example
//!
//! ```
//! use inkbench::adapter::AdapterRegistry;
//! use inkbench::harness::{Harness, HarnessConfig};
//!
//! let config = HarnessConfig {
//!     iterations: 5,
//!     warmup_iterations: 1,
//!     scenarios: vec!["text-update".to_string()],
//!     frameworks: vec!["noop".to_string()],
//!     mem_sample_every: 0,
//!     quiet: true,
//!     ..HarnessConfig::default()
//! };
//! let mut harness = Harness::new(config, AdapterRegistry::with_builtins())?;
//! let report = harness.run()?;
//! assert_eq!(report.results.len(), 1);
//! # Ok::<(), inkbench::harness::HarnessError>(())
//! ```

pub mod adapter;
pub mod harness;
pub mod memory;
pub mod report;
pub mod rng;
pub mod runner;
pub mod stats;
pub mod workload;

pub use adapter::{Adapter, AdapterError, AdapterRegistry};
pub use harness::{Harness, HarnessConfig, HarnessError};
pub use report::{RunReport, ScenarioResult};
pub use runner::{PhaseTimer, ScenarioRunner};
pub use stats::{compute_timing_stats, TimingStats};
pub use workload::{Payload, Workload};
