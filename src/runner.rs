//! Scenario execution: warmup, measured iterations, phase timing.
//!
//! Execution is strictly sequential: warmup fully completes before
//! measurement begins, and iteration `i + 1` never starts until iteration
//! `i`'s build and render calls have returned. There is no retry, timeout
//! or cancellation anywhere; a benchmark exists to surface the true
//! behavior of the thing being measured, and masking a failure would
//! corrupt the statistics.

use crate::adapter::{Adapter, AdapterError};
use crate::memory::MemorySampler;
use crate::workload::{Payload, Workload};
use std::time::Instant;

/// Lifecycle of a [`ScenarioRunner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    /// Constructed, not yet driven.
    NotStarted,
    /// Executing discarded warmup iterations.
    Warmup,
    /// Executing measured iterations.
    Measuring,
    /// Exactly `iterations` measured iterations completed.
    Done,
}

/// Runner misuse or propagated adapter failure.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// `run` called on a runner that already ran.
    #[error("scenario runner already driven (state {0:?})")]
    AlreadyRan(RunnerState),
    /// Adapter failure during build or render; aborts the whole run.
    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

/// Timing split of one measured iteration, in milliseconds.
///
/// `total_ms` is the wall-clock span from before build to after render; it
/// is not necessarily `build_ms + render_ms`, since any scheduling gap
/// between the two phases is included.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseSplit {
    /// Duration of the adapter's build step.
    pub build_ms: f64,
    /// Duration of the adapter's render step.
    pub render_ms: f64,
    /// Wall-clock span across both steps.
    pub total_ms: f64,
}

/// Times a single iteration against an adapter, splitting build and render.
pub struct PhaseTimer;

impl PhaseTimer {
    /// Run one build + render against the adapter under a monotonic clock.
    pub fn time_iteration(
        adapter: &mut dyn Adapter,
        payload: &Payload,
    ) -> Result<PhaseSplit, AdapterError> {
        let total_start = Instant::now();

        let build_start = Instant::now();
        adapter.build(payload)?;
        let build_ms = to_ms(build_start);

        let render_start = Instant::now();
        adapter.render()?;
        let render_ms = to_ms(render_start);

        Ok(PhaseSplit {
            build_ms,
            render_ms,
            total_ms: to_ms(total_start),
        })
    }
}

fn to_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}

/// Observer fired around the measured loop.
///
/// [`iteration_done`](Self::iteration_done) is the sole mechanism by which
/// the memory sampler decides whether to snapshot; iteration indices are
/// 1-based counts of completed measured iterations.
pub trait IterationObserver {
    /// The measured loop is about to start (warmup already finished).
    fn measurement_started(&mut self) {}

    /// Measured iteration `iteration` (1-indexed) completed.
    fn iteration_done(&mut self, iteration: u32);

    /// The measured loop completed successfully.
    ///
    /// Fired before the runner returns, so observers see the process state
    /// of the loop itself, untouched by adapter teardown.
    fn measurement_finished(&mut self) {}
}

/// No-op observer for runs that track nothing.
impl IterationObserver for () {
    fn iteration_done(&mut self, _iteration: u32) {}
}

impl IterationObserver for MemorySampler {
    fn measurement_started(&mut self) {
        self.begin();
    }

    fn iteration_done(&mut self, iteration: u32) {
        self.on_iteration_done(iteration);
    }

    fn measurement_finished(&mut self) {
        self.mark_end();
    }
}

/// Raw per-phase duration sequences for one scenario, in iteration order.
///
/// Each vector holds exactly one entry per measured iteration: no drops,
/// no duplicates.
#[derive(Debug, Clone, Default)]
pub struct ScenarioTimings {
    /// Wall-clock span per iteration.
    pub total_ms: Vec<f64>,
    /// Build phase per iteration.
    pub build_ms: Vec<f64>,
    /// Render phase per iteration.
    pub render_ms: Vec<f64>,
    /// Wall-clock span of the whole measured loop.
    pub elapsed_ms: f64,
}

/// Drives warmup and measured iterations of one scenario against one
/// adapter.
///
/// Single use: `NotStarted → Warmup → Measuring → Done`, with the
/// transition to `Done` occurring only after exactly `iterations` measured
/// iterations completed.
pub struct ScenarioRunner<'a> {
    workload: &'a Workload,
    adapter: &'a mut dyn Adapter,
    iterations: u32,
    warmup_iterations: u32,
    state: RunnerState,
}

impl<'a> ScenarioRunner<'a> {
    /// Create a runner for one scenario run.
    pub fn new(
        workload: &'a Workload,
        adapter: &'a mut dyn Adapter,
        iterations: u32,
        warmup_iterations: u32,
    ) -> Self {
        Self {
            workload,
            adapter,
            iterations,
            warmup_iterations,
            state: RunnerState::NotStarted,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> RunnerState {
        self.state
    }

    /// Execute warmup then measurement, reporting completed iterations to
    /// the observer.
    ///
    /// Warmup iterations run the same generate + build + render logic as
    /// measured ones, but their durations are discarded; they exist to
    /// bring adapter-side caches to steady state. Adapter errors propagate
    /// immediately and leave the runner out of `Done`.
    pub fn run(
        &mut self,
        observer: &mut dyn IterationObserver,
    ) -> Result<ScenarioTimings, RunnerError> {
        if self.state != RunnerState::NotStarted {
            return Err(RunnerError::AlreadyRan(self.state));
        }

        self.state = RunnerState::Warmup;
        tracing::debug!(
            scenario = self.workload.name(),
            warmup = self.warmup_iterations,
            "warmup"
        );
        for i in 0..self.warmup_iterations {
            let payload = self.workload.generate(i);
            self.adapter.build(&payload)?;
            self.adapter.render()?;
        }

        self.state = RunnerState::Measuring;
        observer.measurement_started();

        let mut timings = ScenarioTimings {
            total_ms: Vec::with_capacity(self.iterations as usize),
            build_ms: Vec::with_capacity(self.iterations as usize),
            render_ms: Vec::with_capacity(self.iterations as usize),
            elapsed_ms: 0.0,
        };

        let loop_start = Instant::now();
        for i in 0..self.iterations {
            let payload = self.workload.generate(i);
            let split = PhaseTimer::time_iteration(self.adapter, &payload)?;
            timings.total_ms.push(split.total_ms);
            timings.build_ms.push(split.build_ms);
            timings.render_ms.push(split.render_ms);
            observer.iteration_done(i + 1);
        }
        timings.elapsed_ms = to_ms(loop_start);
        observer.measurement_finished();

        self.state = RunnerState::Done;
        tracing::debug!(
            scenario = self.workload.name(),
            iterations = self.iterations,
            elapsed_ms = timings.elapsed_ms,
            "scenario measured"
        );
        Ok(timings)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::adapter::NoopAdapter;
    use crate::workload::Payload;

    /// Adapter that counts calls and can fail at a chosen build index.
    #[derive(Default)]
    struct CountingAdapter {
        builds: u32,
        renders: u32,
        destroys: u32,
        fail_on_build: Option<u32>,
    }

    impl Adapter for CountingAdapter {
        fn build(&mut self, _payload: &Payload) -> Result<(), AdapterError> {
            if self.fail_on_build == Some(self.builds) {
                return Err(AdapterError::Backend("boom".to_string()));
            }
            self.builds += 1;
            Ok(())
        }

        fn render(&mut self) -> Result<(), AdapterError> {
            self.renders += 1;
            Ok(())
        }

        fn destroy(&mut self) {
            self.destroys += 1;
        }
    }

    /// Observer recording the iteration indices it saw.
    #[derive(Default)]
    struct RecordingObserver {
        started: bool,
        finished: bool,
        seen: Vec<u32>,
    }

    impl IterationObserver for RecordingObserver {
        fn measurement_started(&mut self) {
            self.started = true;
        }

        fn iteration_done(&mut self, iteration: u32) {
            self.seen.push(iteration);
        }

        fn measurement_finished(&mut self) {
            self.finished = true;
        }
    }

    fn workload() -> Workload {
        Workload::new("text-update", 0.05).unwrap()
    }

    #[test]
    fn test_records_exactly_iterations_durations() {
        let w = workload();
        let mut adapter = NoopAdapter;
        let mut runner = ScenarioRunner::new(&w, &mut adapter, 7, 3);
        let timings = runner.run(&mut ()).unwrap();
        assert_eq!(timings.total_ms.len(), 7);
        assert_eq!(timings.build_ms.len(), 7);
        assert_eq!(timings.render_ms.len(), 7);
        assert_eq!(runner.state(), RunnerState::Done);
    }

    #[test]
    fn test_warmup_runs_but_is_discarded() {
        let w = workload();
        let mut adapter = CountingAdapter::default();
        let mut runner = ScenarioRunner::new(&w, &mut adapter, 4, 6);
        let timings = runner.run(&mut ()).unwrap();
        assert_eq!(timings.total_ms.len(), 4);
        assert_eq!(adapter.builds, 10);
        assert_eq!(adapter.renders, 10);
    }

    #[test]
    fn test_observer_sees_one_indexed_measured_iterations_only() {
        let w = workload();
        let mut adapter = NoopAdapter;
        let mut runner = ScenarioRunner::new(&w, &mut adapter, 3, 5);
        let mut observer = RecordingObserver::default();
        runner.run(&mut observer).unwrap();
        assert!(observer.started);
        assert!(observer.finished);
        assert_eq!(observer.seen, vec![1, 2, 3]);
    }

    #[test]
    fn test_finished_hook_skipped_on_adapter_error() {
        let w = workload();
        let mut adapter = CountingAdapter {
            fail_on_build: Some(1),
            ..CountingAdapter::default()
        };
        let mut runner = ScenarioRunner::new(&w, &mut adapter, 5, 0);
        let mut observer = RecordingObserver::default();
        assert!(runner.run(&mut observer).is_err());
        // An aborted loop has no meaningful end state to snapshot.
        assert!(observer.started);
        assert!(!observer.finished);
    }

    #[test]
    fn test_adapter_error_propagates_and_blocks_done() {
        let w = workload();
        let mut adapter = CountingAdapter {
            fail_on_build: Some(2),
            ..CountingAdapter::default()
        };
        let mut runner = ScenarioRunner::new(&w, &mut adapter, 10, 0);
        let err = runner.run(&mut ()).unwrap_err();
        assert!(matches!(err, RunnerError::Adapter(_)));
        assert_eq!(runner.state(), RunnerState::Measuring);
    }

    #[test]
    fn test_runner_is_single_use() {
        let w = workload();
        let mut adapter = NoopAdapter;
        let mut runner = ScenarioRunner::new(&w, &mut adapter, 1, 0);
        runner.run(&mut ()).unwrap();
        let err = runner.run(&mut ()).unwrap_err();
        assert!(matches!(err, RunnerError::AlreadyRan(RunnerState::Done)));
    }

    #[test]
    fn test_total_spans_build_and_render() {
        let w = workload();
        let mut adapter = NoopAdapter;
        let mut runner = ScenarioRunner::new(&w, &mut adapter, 5, 0);
        let timings = runner.run(&mut ()).unwrap();
        for i in 0..5 {
            assert!(timings.total_ms[i] >= timings.build_ms[i]);
            assert!(timings.total_ms[i] >= timings.render_ms[i]);
        }
    }
}
