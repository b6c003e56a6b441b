//! inkbench CLI.
//!
//! Numeric flags follow a deliberate lenient-parsing policy: a malformed
//! value silently falls back to its documented default instead of aborting
//! the run. Path conflicts and unknown scenario/framework names are fatal
//! before any scenario executes, with exit code 1.

use clap::Parser;
use inkbench::adapter::AdapterRegistry;
use inkbench::harness::{Harness, HarnessConfig};
use inkbench::memory::TrackingAllocator;
use std::alloc::System;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

// Feeds heap_used/heap_total in memory samples.
#[global_allocator]
static ALLOC: TrackingAllocator<System> = TrackingAllocator(System);

#[derive(Debug, Parser)]
#[command(
    name = "inkbench",
    version,
    about = "Benchmark terminal UI rendering back-ends with reproducible synthetic workloads"
)]
struct Cli {
    /// Measured iterations per scenario.
    #[arg(long, default_value = "800")]
    iterations: String,

    /// Discarded warmup iterations per scenario.
    #[arg(long, default_value = "80")]
    warmup_iterations: String,

    /// Viewport width passed to adapters.
    #[arg(long, default_value = "80")]
    width: String,

    /// Viewport height passed to adapters.
    #[arg(long, default_value = "24")]
    height: String,

    /// Dataset size multiplier.
    #[arg(long, default_value = "1")]
    scale: String,

    /// Take a memory snapshot every N-th iteration (0 disables sampling).
    #[arg(long, default_value = "10")]
    mem_sample_every: String,

    /// Run only this scenario (repeatable). Empty runs all of them.
    #[arg(long = "scenario")]
    scenarios: Vec<String>,

    /// Run only this framework (repeatable). Empty runs all of them.
    #[arg(long = "framework")]
    frameworks: Vec<String>,

    /// Write a results JSON document. Refuses existing paths.
    #[arg(long, num_args = 0..=1, default_missing_value = "inkbench-results.json")]
    json: Option<PathBuf>,

    /// Suppress the per-scenario stdout lines.
    #[arg(long)]
    no_output: bool,
}

/// Lenient integer flag: malformed input falls back to the default,
/// fractional input is floored, negative input clamps to zero.
fn lenient_int(raw: &str, default: u32) -> u32 {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => v.floor().max(0.0) as u32,
        _ => default,
    }
}

/// Lenient float flag: malformed input falls back to the default.
fn lenient_float(raw: &str, default: f64) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => default,
    }
}

impl Cli {
    fn into_config(self) -> HarnessConfig {
        let defaults = HarnessConfig::default();
        HarnessConfig {
            width: lenient_int(&self.width, u32::from(defaults.width)).min(u32::from(u16::MAX))
                as u16,
            height: lenient_int(&self.height, u32::from(defaults.height)).min(u32::from(u16::MAX))
                as u16,
            iterations: lenient_int(&self.iterations, defaults.iterations),
            warmup_iterations: lenient_int(&self.warmup_iterations, defaults.warmup_iterations),
            scale: lenient_float(&self.scale, defaults.scale),
            mem_sample_every: lenient_int(&self.mem_sample_every, defaults.mem_sample_every),
            scenarios: self.scenarios,
            frameworks: self.frameworks,
            json_path: self.json,
            quiet: self.no_output,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = Cli::parse().into_config();
    let mut harness = Harness::new(config, AdapterRegistry::with_builtins())?;
    harness.run()?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_lenient_int_fallbacks() {
        assert_eq!(lenient_int("800", 10), 800);
        assert_eq!(lenient_int("12.9", 10), 12);
        assert_eq!(lenient_int("-3", 10), 0);
        assert_eq!(lenient_int("fast", 10), 10);
        assert_eq!(lenient_int("", 10), 10);
        assert_eq!(lenient_int("NaN", 10), 10);
    }

    #[test]
    fn test_lenient_float_fallbacks() {
        assert_eq!(lenient_float("0.5", 1.0), 0.5);
        assert_eq!(lenient_float("big", 1.0), 1.0);
        assert_eq!(lenient_float("inf", 1.0), 1.0);
    }

    #[test]
    fn test_cli_maps_to_config() {
        let cli = Cli::parse_from([
            "inkbench",
            "--iterations",
            "nonsense",
            "--scale",
            "0.5",
            "--scenario",
            "text-update",
            "--no-output",
        ]);
        let config = cli.into_config();
        assert_eq!(config.iterations, 800);
        assert_eq!(config.scale, 0.5);
        assert_eq!(config.scenarios, vec!["text-update".to_string()]);
        assert!(config.quiet);
        assert!(config.json_path.is_none());
    }

    #[test]
    fn test_json_flag_default_filename() {
        let cli = Cli::parse_from(["inkbench", "--json"]);
        assert_eq!(
            cli.into_config().json_path,
            Some(PathBuf::from("inkbench-results.json"))
        );
    }
}
