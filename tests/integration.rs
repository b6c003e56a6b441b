#![allow(clippy::unwrap_used)]
//! End-to-end tests for the benchmark harness.
//!
//! These drive the full pipeline (config validation, workload generation,
//! scenario execution, result assembly, JSON output) against no-op and
//! instrumented adapters.

use inkbench::adapter::{Adapter, AdapterError, AdapterRegistry};
use inkbench::harness::{Harness, HarnessConfig, HarnessError};
use inkbench::workload::Payload;
use std::cell::RefCell;
use std::fs;
use std::rc::Rc;

/// Shared call counters so tests can observe adapter activity across the
/// factory boundary.
#[derive(Default)]
struct Calls {
    builds: u32,
    renders: u32,
    destroys: u32,
}

/// Adapter that records calls into shared counters and optionally fails
/// on the n-th build.
struct InstrumentedAdapter {
    calls: Rc<RefCell<Calls>>,
    fail_on_build: Option<u32>,
}

impl Adapter for InstrumentedAdapter {
    fn build(&mut self, _payload: &Payload) -> Result<(), AdapterError> {
        let mut calls = self.calls.borrow_mut();
        if self.fail_on_build == Some(calls.builds) {
            return Err(AdapterError::Backend("injected failure".to_string()));
        }
        calls.builds += 1;
        Ok(())
    }

    fn render(&mut self) -> Result<(), AdapterError> {
        self.calls.borrow_mut().renders += 1;
        Ok(())
    }

    fn destroy(&mut self) {
        self.calls.borrow_mut().destroys += 1;
    }
}

fn instrumented_registry(fail_on_build: Option<u32>) -> (AdapterRegistry, Rc<RefCell<Calls>>) {
    let calls = Rc::new(RefCell::new(Calls::default()));
    let shared = Rc::clone(&calls);
    let mut registry = AdapterRegistry::new();
    registry.register("instrumented", move |_, _| {
        Box::new(InstrumentedAdapter {
            calls: Rc::clone(&shared),
            fail_on_build,
        })
    });
    (registry, calls)
}

fn base_config() -> HarnessConfig {
    HarnessConfig {
        iterations: 5,
        warmup_iterations: 0,
        scale: 1.0,
        mem_sample_every: 0,
        quiet: true,
        ..HarnessConfig::default()
    }
}

#[test]
fn test_text_update_end_to_end() {
    let config = HarnessConfig {
        scenarios: vec!["text-update".to_string()],
        frameworks: vec!["noop".to_string()],
        ..base_config()
    };
    let mut harness = Harness::new(config, AdapterRegistry::with_builtins()).unwrap();
    let report = harness.run().unwrap();

    assert_eq!(report.results.len(), 1);
    let result = &report.results[0];
    assert_eq!(result.framework, "noop");
    assert_eq!(result.scenario, "text-update");
    assert_eq!(result.iterations, 5);
    assert_eq!(result.phase_stats.total.count, 5);
    assert_eq!(result.phase_stats.build.count, 5);
    assert_eq!(result.phase_stats.render.count, 5);
    assert_eq!(result.settings.text_len, Some(256));
    assert!(result.memory_stats.is_none());
    assert!(result.elapsed_ms >= 0.0);
}

#[test]
fn test_adapter_lifecycle_counts() {
    let (registry, calls) = instrumented_registry(None);
    let config = HarnessConfig {
        iterations: 4,
        warmup_iterations: 3,
        scenarios: vec!["keyed-shuffle".to_string()],
        ..base_config()
    };
    let mut harness = Harness::new(config, registry).unwrap();
    harness.run().unwrap();

    let calls = calls.borrow();
    // Warmup and measured iterations both reach the adapter.
    assert_eq!(calls.builds, 7);
    assert_eq!(calls.renders, 7);
    assert_eq!(calls.destroys, 1);
}

#[test]
fn test_json_conflict_fatal_before_any_adapter_call() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.json");
    fs::write(&path, "{}").unwrap();

    let (registry, calls) = instrumented_registry(None);
    let config = HarnessConfig {
        json_path: Some(path.clone()),
        ..base_config()
    };
    let err = Harness::new(config, registry).unwrap_err();
    assert!(matches!(err, HarnessError::Report(_)));

    // Construction failed, so no build or render ever ran, and the
    // pre-existing artifact is untouched.
    assert_eq!(calls.borrow().builds, 0);
    assert_eq!(calls.borrow().renders, 0);
    assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
}

#[test]
fn test_adapter_failure_aborts_queued_scenarios() {
    // Fail during the second scenario's measured loop; the third scenario
    // must never start.
    let (registry, calls) = instrumented_registry(Some(7));
    let config = HarnessConfig {
        iterations: 5,
        scenarios: vec![
            "text-update".to_string(),
            "list-rebuild".to_string(),
            "keyed-shuffle".to_string(),
        ],
        ..base_config()
    };
    let mut harness = Harness::new(config, registry).unwrap();
    let err = harness.run().unwrap_err();
    assert!(matches!(err, HarnessError::Runner(_)));

    // 5 successful builds in scenario one, 2 in scenario two, then the
    // failure; nothing from scenario three.
    assert_eq!(calls.borrow().builds, 7);
}

#[test]
fn test_failed_run_writes_no_partial_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.json");

    let (registry, _calls) = instrumented_registry(Some(0));
    let config = HarnessConfig {
        scenarios: vec!["text-update".to_string()],
        json_path: Some(path.clone()),
        ..base_config()
    };
    let mut harness = Harness::new(config, registry).unwrap();
    assert!(harness.run().is_err());
    assert!(!path.exists());
}

#[test]
fn test_memory_stats_presence_tracks_sampling_flag() {
    let run = |mem_sample_every: u32| {
        let config = HarnessConfig {
            mem_sample_every,
            scenarios: vec!["text-update".to_string()],
            frameworks: vec!["noop".to_string()],
            ..base_config()
        };
        let mut harness = Harness::new(config, AdapterRegistry::with_builtins()).unwrap();
        harness.run().unwrap().results.remove(0)
    };

    assert!(run(0).memory_stats.is_none());

    let sampled = run(2).memory_stats.expect("sampling enabled");
    // 5 iterations at cadence 2 -> mid snapshots after 2 and 4, plus
    // start and end.
    assert_eq!(sampled.samples, 4);
}

#[test]
fn test_json_document_shape_and_settings_echo() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out/results.json");

    let config = HarnessConfig {
        iterations: 3,
        scale: 0.5,
        scenarios: vec!["partial-mutate".to_string()],
        frameworks: vec!["buffer".to_string()],
        json_path: Some(path.clone()),
        ..base_config()
    };
    let mut harness = Harness::new(config, AdapterRegistry::with_builtins()).unwrap();
    harness.run().unwrap();

    let doc: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert!(doc["runId"].is_string());
    assert_eq!(doc["config"]["iterations"], 3);
    assert_eq!(doc["config"]["scale"], 0.5);

    // Settings echo the resolved (scaled) sizes, not the raw inputs.
    let settings = &doc["results"][0]["settings"];
    assert_eq!(settings["itemsCount"], 100);
    assert_eq!(settings["textLen"], 128);
    assert_eq!(settings["mutateCount"], 10);
}

#[test]
fn test_buffer_adapter_runs_every_scenario() {
    let config = HarnessConfig {
        iterations: 2,
        warmup_iterations: 1,
        scale: 0.25,
        frameworks: vec!["buffer".to_string()],
        ..base_config()
    };
    let mut harness = Harness::new(config, AdapterRegistry::with_builtins()).unwrap();
    let report = harness.run().unwrap();
    assert_eq!(report.results.len(), 5);
    for result in &report.results {
        assert_eq!(result.phase_stats.total.count, 2);
    }
}
