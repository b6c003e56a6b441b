//! Result assembly and reporting.
//!
//! One [`ScenarioResult`] per scenario, assembled once after its measured
//! loop completes and never mutated afterward; the run-level result list
//! is append-only with a single writer. Reporting has two sinks: a human
//! line per scenario on stdout, and an optional `{runId, config, results}`
//! JSON document whose target path is guarded against clobbering before
//! any scenario executes.

use crate::memory::MemoryStats;
use crate::runner::ScenarioTimings;
use crate::stats::{compute_timing_stats, TimingStats};
use crate::workload::ScenarioSettings;
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Reporting failure.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Requested JSON path already exists; refusing to clobber a prior
    /// benchmark artifact.
    #[error("output file already exists: {0}")]
    OutputConflict(PathBuf),
    /// Filesystem failure creating the parent directory or writing.
    #[error("failed to write results: {0}")]
    Io(#[from] io::Error),
    /// Serialization failure.
    #[error("failed to serialize results: {0}")]
    Json(#[from] serde_json::Error),
}

/// Timing summaries for the three phases of a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseStats {
    /// Full iteration span.
    pub total: TimingStats,
    /// Build phase.
    pub build: TimingStats,
    /// Render phase.
    pub render: TimingStats,
}

/// Phase shares derived from the averages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedShares {
    /// `avg_build / avg_total * 100`, 0 when the total average is 0.
    pub build_share_pct_avg: f64,
    /// `avg_render / avg_total * 100`, 0 when the total average is 0.
    pub render_share_pct_avg: f64,
}

/// Final record for one scenario run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioResult {
    /// Framework (adapter) name.
    pub framework: String,
    /// Scenario name.
    pub scenario: String,
    /// Measured iteration count.
    pub iterations: u32,
    /// Discarded warmup iteration count.
    pub warmup_iterations: u32,
    /// Wall-clock span of the measured loop, in milliseconds.
    pub elapsed_ms: f64,
    /// Per-phase timing summaries.
    pub phase_stats: PhaseStats,
    /// Memory statistics, absent when sampling was disabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_stats: Option<MemoryStats>,
    /// Resolved (scaled) sizes, echoed for auditability.
    pub settings: ScenarioSettings,
    /// Phase share percentages.
    pub derived: DerivedShares,
}

impl ScenarioResult {
    /// Reduce raw timings into the immutable per-scenario record.
    #[must_use]
    pub fn assemble(
        framework: &str,
        scenario: &str,
        iterations: u32,
        warmup_iterations: u32,
        settings: ScenarioSettings,
        timings: &ScenarioTimings,
        memory_stats: Option<MemoryStats>,
    ) -> Self {
        let total = compute_timing_stats(&timings.total_ms);
        let build = compute_timing_stats(&timings.build_ms);
        let render = compute_timing_stats(&timings.render_ms);

        let share = |avg_phase: f64| {
            if total.average_ms == 0.0 {
                0.0
            } else {
                avg_phase / total.average_ms * 100.0
            }
        };
        let derived = DerivedShares {
            build_share_pct_avg: share(build.average_ms),
            render_share_pct_avg: share(render.average_ms),
        };

        Self {
            framework: framework.to_string(),
            scenario: scenario.to_string(),
            iterations,
            warmup_iterations,
            elapsed_ms: timings.elapsed_ms,
            phase_stats: PhaseStats {
                total,
                build,
                render,
            },
            memory_stats,
            settings,
            derived,
        }
    }
}

/// Echo of the resolved run configuration for the JSON document.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunConfig {
    /// Viewport width passed to adapters.
    pub width: u16,
    /// Viewport height passed to adapters.
    pub height: u16,
    /// Measured iterations per scenario.
    pub iterations: u32,
    /// Warmup iterations per scenario.
    pub warmup_iterations: u32,
    /// Dataset size multiplier.
    pub scale: f64,
    /// Memory snapshot cadence (0 = disabled).
    pub mem_sample_every: u32,
}

/// Top-level run document: `{runId, config, results}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    /// ISO-8601 timestamp identifying the run.
    pub run_id: String,
    /// Resolved configuration.
    pub config: RunConfig,
    /// Scenario results in execution order. Append-only.
    pub results: Vec<ScenarioResult>,
}

impl RunReport {
    /// Start an empty report stamped with the current time.
    #[must_use]
    pub fn new(config: RunConfig) -> Self {
        Self {
            run_id: chrono::Utc::now().to_rfc3339(),
            config,
            results: Vec::new(),
        }
    }

    /// Append a completed scenario result.
    pub fn push(&mut self, result: ScenarioResult) {
        self.results.push(result);
    }
}

/// Format one scenario result as a human-readable line.
#[must_use]
pub fn format_result_line(result: &ScenarioResult) -> String {
    let stats = &result.phase_stats;
    let mut line = format!(
        "{}/{} iters={} (warmup {}) elapsed={:.1}ms | total avg={:.3}ms p95={:.3}ms | \
         build avg={:.3}ms p95={:.3}ms ({:.1}%) | render avg={:.3}ms p95={:.3}ms ({:.1}%)",
        result.framework,
        result.scenario,
        result.iterations,
        result.warmup_iterations,
        result.elapsed_ms,
        stats.total.average_ms,
        stats.total.p95_ms,
        stats.build.average_ms,
        stats.build.p95_ms,
        result.derived.build_share_pct_avg,
        stats.render.average_ms,
        stats.render.p95_ms,
        result.derived.render_share_pct_avg,
    );
    if let Some(memory) = &result.memory_stats {
        let _ = write!(
            line,
            " | mem rss {}MiB heap {}MiB peak rss {:.2}MiB",
            format_signed_mib(memory.delta.rss),
            format_signed_mib(memory.delta.heap_used),
            to_mib(memory.peak.rss),
        );
    }
    line
}

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

fn to_mib(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MIB
}

/// Signed MiB with two decimals and an explicit sign, e.g. `+1.23`.
fn format_signed_mib(bytes: i64) -> String {
    format!("{:+.2}", bytes as f64 / BYTES_PER_MIB)
}

/// Fail-fast guard for the JSON output path.
///
/// Called before any scenario executes so a run never produces a partial
/// artifact or silently clobbers a prior one.
pub fn check_output_path(path: &Path) -> Result<(), ReportError> {
    if path.exists() {
        return Err(ReportError::OutputConflict(path.to_path_buf()));
    }
    Ok(())
}

/// Write the report as pretty JSON to `path`.
///
/// Re-checks the conflict guard (the path could have appeared during the
/// run) and creates missing parent directories.
pub fn write_json(report: &RunReport, path: &Path) -> Result<(), ReportError> {
    check_output_path(path)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json)?;
    tracing::info!(path = %path.display(), "results written");
    Ok(())
}
