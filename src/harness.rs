//! Top-level orchestration: configuration, validation, sequential run loop.
//!
//! All fatal validation happens at construction, before any scenario
//! executes: scenario names resolve against the workload registry,
//! framework names against the adapter registry, and the JSON output path
//! is checked for conflicts. The run itself is single-threaded and strictly
//! sequential: scenarios in requested order, one adapter instance per
//! scenario, the results list appended by a single writer.

use crate::adapter::AdapterRegistry;
use crate::memory::MemorySampler;
use crate::report::{self, ReportError, RunConfig, RunReport, ScenarioResult};
use crate::runner::{RunnerError, ScenarioRunner};
use crate::workload::{known_scenario_names, UnknownScenarioError, Workload};
use std::path::PathBuf;

/// Minimum viewport width.
const MIN_WIDTH: u16 = 40;
/// Minimum viewport height.
const MIN_HEIGHT: u16 = 12;
/// Minimum dataset scale.
const MIN_SCALE: f64 = 0.25;

/// Run configuration.
///
/// Raw values; [`Harness::new`] applies the documented floors before use.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Viewport width handed opaquely to adapters.
    pub width: u16,
    /// Viewport height handed opaquely to adapters.
    pub height: u16,
    /// Measured iterations per scenario.
    pub iterations: u32,
    /// Discarded warmup iterations per scenario.
    pub warmup_iterations: u32,
    /// Dataset size multiplier.
    pub scale: f64,
    /// Memory snapshot cadence; 0 disables sampling entirely.
    pub mem_sample_every: u32,
    /// Scenario filter; empty means every registered scenario.
    pub scenarios: Vec<String>,
    /// Framework filter; empty means every registered adapter.
    pub frameworks: Vec<String>,
    /// JSON output path; `None` skips the document.
    pub json_path: Option<PathBuf>,
    /// Suppress the per-scenario stdout lines.
    pub quiet: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            width: 80,
            height: 24,
            iterations: 800,
            warmup_iterations: 80,
            scale: 1.0,
            mem_sample_every: 10,
            scenarios: Vec::new(),
            frameworks: Vec::new(),
            json_path: None,
            quiet: false,
        }
    }
}

impl HarnessConfig {
    /// Apply the documented minimums.
    fn clamped(mut self) -> Self {
        self.width = self.width.max(MIN_WIDTH);
        self.height = self.height.max(MIN_HEIGHT);
        self.iterations = self.iterations.max(1);
        self.scale = self.scale.max(MIN_SCALE);
        self
    }
}

/// Fatal harness failure.
///
/// All of these abort the run with nothing written; none are retried.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// Scenario name with no registered generator.
    #[error(transparent)]
    UnknownScenario(#[from] UnknownScenarioError),
    /// Framework name with no registered adapter.
    #[error("unknown framework '{0}'")]
    UnknownFramework(String),
    /// Output path conflict or write failure.
    #[error(transparent)]
    Report(#[from] ReportError),
    /// Adapter failure or runner misuse during a scenario.
    #[error(transparent)]
    Runner(#[from] RunnerError),
}

/// A validated benchmark run, ready to execute.
pub struct Harness {
    config: HarnessConfig,
    registry: AdapterRegistry,
    frameworks: Vec<String>,
    workloads: Vec<Workload>,
}

impl std::fmt::Debug for Harness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Harness")
            .field("config", &self.config)
            .field("frameworks", &self.frameworks)
            .field("workloads", &self.workloads)
            .finish_non_exhaustive()
    }
}

impl Harness {
    /// Validate configuration and construct the run plan.
    ///
    /// Fails before any scenario executes on: an unknown scenario name, an
    /// unknown framework name, or a JSON output path that already exists.
    pub fn new(config: HarnessConfig, registry: AdapterRegistry) -> Result<Self, HarnessError> {
        let config = config.clamped();

        if let Some(path) = &config.json_path {
            report::check_output_path(path)?;
        }

        let scenario_names: Vec<String> = if config.scenarios.is_empty() {
            known_scenario_names().iter().map(|s| (*s).to_string()).collect()
        } else {
            config.scenarios.clone()
        };
        let workloads = scenario_names
            .iter()
            .map(|name| Workload::new(name, config.scale))
            .collect::<Result<Vec<_>, _>>()?;

        let frameworks: Vec<String> = if config.frameworks.is_empty() {
            registry.names().iter().map(|s| (*s).to_string()).collect()
        } else {
            for name in &config.frameworks {
                if !registry.contains(name) {
                    return Err(HarnessError::UnknownFramework(name.clone()));
                }
            }
            config.frameworks.clone()
        };

        Ok(Self {
            config,
            registry,
            frameworks,
            workloads,
        })
    }

    /// Resolved configuration after clamping.
    #[must_use]
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Execute every selected framework × scenario pair, in order.
    ///
    /// An adapter failure aborts immediately, including scenarios still
    /// queued behind the failing one, and no JSON artifact is written.
    pub fn run(&mut self) -> Result<RunReport, HarnessError> {
        let mut run_report = RunReport::new(RunConfig {
            width: self.config.width,
            height: self.config.height,
            iterations: self.config.iterations,
            warmup_iterations: self.config.warmup_iterations,
            scale: self.config.scale,
            mem_sample_every: self.config.mem_sample_every,
        });

        for framework in &self.frameworks {
            for workload in &self.workloads {
                tracing::info!(%framework, scenario = workload.name(), "scenario start");

                let Some(mut adapter) =
                    self.registry
                        .create(framework, self.config.width, self.config.height)
                else {
                    // Names were validated at construction; a registry that
                    // lost an entry since then is a caller bug.
                    return Err(HarnessError::UnknownFramework(framework.clone()));
                };

                let mut sampler = MemorySampler::new(self.config.mem_sample_every);
                let mut runner = ScenarioRunner::new(
                    workload,
                    adapter.as_mut(),
                    self.config.iterations,
                    self.config.warmup_iterations,
                );
                let timings = runner.run(&mut sampler)?;
                // The end snapshot was captured inside the runner; reduce
                // before teardown so destroy effects stay out of the stats.
                let memory_stats = sampler.finish();
                adapter.destroy();

                let result = ScenarioResult::assemble(
                    framework,
                    workload.name(),
                    self.config.iterations,
                    self.config.warmup_iterations,
                    workload.settings(),
                    &timings,
                    memory_stats,
                );
                if !self.config.quiet {
                    println!("{}", report::format_result_line(&result));
                }
                run_report.push(result);
            }
        }

        if let Some(path) = &self.config.json_path {
            report::write_json(&run_report, path)?;
        }
        Ok(run_report)
    }
}
