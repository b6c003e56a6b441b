//! Process memory sampling around a measured scenario loop.
//!
//! The sampler takes one snapshot immediately before the measured loop, one
//! immediately after it, and one after every N-th completed iteration, then
//! reduces them to start/end/delta/peak. When sampling is disabled
//! (`every == 0`) no snapshots are taken at all (not even start/end) and
//! the scenario result carries no memory stats. Downstream tooling depends
//! on that coupling, so it is preserved here.

use serde::{Deserialize, Serialize};
use std::alloc::{GlobalAlloc, Layout};
use std::sync::atomic::{AtomicU64, Ordering};

/// One process memory snapshot, all fields in bytes.
///
/// `rss` comes from the operating system; `heap_used`/`heap_total` come
/// from [`TrackingAllocator`] counters when the binary installs it (zero
/// otherwise). `external` and `array_buffers` cover allocations outside the
/// tracked heap (e.g. GPU or mmap-backed buffers an adapter owns); the
/// default reader cannot see those, so only a custom [`MemoryReader`]
/// fills them. Delta/peak math treats all five components uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemorySample {
    /// Resident set size.
    pub rss: u64,
    /// High-water mark of tracked heap bytes.
    pub heap_total: u64,
    /// Currently live tracked heap bytes.
    pub heap_used: u64,
    /// Bytes held outside the tracked heap.
    pub external: u64,
    /// Bytes held by externally managed flat buffers.
    pub array_buffers: u64,
}

impl MemorySample {
    /// Component-wise maximum of two samples.
    #[must_use]
    pub fn component_max(self, other: Self) -> Self {
        Self {
            rss: self.rss.max(other.rss),
            heap_total: self.heap_total.max(other.heap_total),
            heap_used: self.heap_used.max(other.heap_used),
            external: self.external.max(other.external),
            array_buffers: self.array_buffers.max(other.array_buffers),
        }
    }
}

/// Signed component-wise difference between two samples.
///
/// Components can be negative: a scenario that frees more than it
/// allocates ends below where it started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryDelta {
    /// Change in resident set size.
    pub rss: i64,
    /// Change in tracked heap high-water mark.
    pub heap_total: i64,
    /// Change in live tracked heap bytes.
    pub heap_used: i64,
    /// Change in external bytes.
    pub external: i64,
    /// Change in flat-buffer bytes.
    pub array_buffers: i64,
}

/// Reduced memory statistics for one scenario run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryStats {
    /// Total snapshots taken: mid-run samples plus start and end.
    pub samples: usize,
    /// Snapshot before the measured loop.
    pub start: MemorySample,
    /// Snapshot after the measured loop.
    pub end: MemorySample,
    /// Signed `end - start`, component-wise.
    pub delta: MemoryDelta,
    /// Component-wise maximum over `{start} ∪ mid ∪ {end}`.
    pub peak: MemorySample,
}

/// Reduce snapshots to [`MemoryStats`].
#[must_use]
pub fn compute_memory_stats(
    mid_samples: &[MemorySample],
    start: MemorySample,
    end: MemorySample,
) -> MemoryStats {
    let delta = MemoryDelta {
        rss: end.rss as i64 - start.rss as i64,
        heap_total: end.heap_total as i64 - start.heap_total as i64,
        heap_used: end.heap_used as i64 - start.heap_used as i64,
        external: end.external as i64 - start.external as i64,
        array_buffers: end.array_buffers as i64 - start.array_buffers as i64,
    };

    let peak = mid_samples
        .iter()
        .fold(start.component_max(end), |acc, s| acc.component_max(*s));

    MemoryStats {
        samples: mid_samples.len() + 2,
        start,
        end,
        delta,
        peak,
    }
}

/// Source of memory snapshots.
///
/// A trait seam so tests can inject fixed samples and exotic back-ends can
/// report allocator categories the default reader cannot see.
pub trait MemoryReader {
    /// Take one snapshot of current process memory.
    fn sample(&mut self) -> MemorySample;
}

/// Default reader: OS resident set size plus tracking-allocator counters.
#[derive(Debug, Default)]
pub struct ProcessMemoryReader;

impl MemoryReader for ProcessMemoryReader {
    fn sample(&mut self) -> MemorySample {
        let (heap_used, heap_total) = heap_counters();
        MemorySample {
            rss: read_rss_bytes(),
            heap_total,
            heap_used,
            external: 0,
            array_buffers: 0,
        }
    }
}

/// Read resident set size from `/proc/self/status` (VmRSS, reported in kB).
#[cfg(target_os = "linux")]
fn read_rss_bytes() -> u64 {
    let Ok(status) = std::fs::read_to_string("/proc/self/status") else {
        return 0;
    };
    for line in status.lines() {
        if let Some(rest) = line.strip_prefix("VmRSS:") {
            let kb = rest
                .split_whitespace()
                .next()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(0);
            return kb * 1024;
        }
    }
    0
}

#[cfg(not(target_os = "linux"))]
fn read_rss_bytes() -> u64 {
    0
}

// === Tracking allocator ===

static HEAP_LIVE: AtomicU64 = AtomicU64::new(0);
static HEAP_PEAK: AtomicU64 = AtomicU64::new(0);

/// Current (live, peak) tracked heap bytes.
///
/// Both are zero unless the process installed [`TrackingAllocator`] as its
/// global allocator.
#[must_use]
pub fn heap_counters() -> (u64, u64) {
    (
        HEAP_LIVE.load(Ordering::Relaxed),
        HEAP_PEAK.load(Ordering::Relaxed),
    )
}

fn record_alloc(bytes: usize) {
    let live = HEAP_LIVE.fetch_add(bytes as u64, Ordering::Relaxed) + bytes as u64;
    HEAP_PEAK.fetch_max(live, Ordering::Relaxed);
}

fn record_dealloc(bytes: usize) {
    HEAP_LIVE.fetch_sub(bytes as u64, Ordering::Relaxed);
}

/// Global-allocator wrapper keeping live/peak byte counters.
///
/// Install in the binary:
///
/// ```ignore
/// #[global_allocator]
/// static ALLOC: TrackingAllocator<std::alloc::System> =
///     TrackingAllocator(std::alloc::System);
/// ```
///
/// The counters feed `heap_used`/`heap_total` in [`MemorySample`]; library
/// consumers that skip installation simply get zeros there.
pub struct TrackingAllocator<A>(pub A);

// SAFETY: delegates every operation to the wrapped allocator; the counter
// updates on the side do not affect allocation correctness.
unsafe impl<A: GlobalAlloc> GlobalAlloc for TrackingAllocator<A> {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = self.0.alloc(layout);
        if !ptr.is_null() {
            record_alloc(layout.size());
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = self.0.alloc_zeroed(layout);
        if !ptr.is_null() {
            record_alloc(layout.size());
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        self.0.dealloc(ptr, layout);
        record_dealloc(layout.size());
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = self.0.realloc(ptr, layout, new_size);
        if !new_ptr.is_null() {
            record_dealloc(layout.size());
            record_alloc(new_size);
        }
        new_ptr
    }
}

// === Sampler ===

/// Snapshot scheduler for one scenario run.
///
/// Lifecycle: [`begin`](Self::begin) before the measured loop,
/// [`on_iteration_done`](Self::on_iteration_done) after each measured
/// iteration (1-indexed), [`mark_end`](Self::mark_end) the moment the loop
/// completes, [`finish`](Self::finish) once the caller wants the reduced
/// stats. The iteration hook is the only mid-run snapshot trigger, and the
/// end snapshot belongs to the loop: anything the caller does between
/// `mark_end` and `finish` (adapter teardown included) cannot leak into it.
pub struct MemorySampler {
    every: u32,
    reader: Box<dyn MemoryReader>,
    start: Option<MemorySample>,
    mid: Vec<MemorySample>,
    end: Option<MemorySample>,
}

impl MemorySampler {
    /// Create a sampler snapshotting every `every`-th iteration.
    ///
    /// `every == 0` disables the sampler entirely: no start/end snapshots
    /// either, and [`finish`](Self::finish) returns `None`.
    #[must_use]
    pub fn new(every: u32) -> Self {
        Self::with_reader(every, Box::new(ProcessMemoryReader))
    }

    /// Create a sampler with a custom snapshot source.
    #[must_use]
    pub fn with_reader(every: u32, reader: Box<dyn MemoryReader>) -> Self {
        Self {
            every,
            reader,
            start: None,
            mid: Vec::new(),
            end: None,
        }
    }

    /// Whether this sampler takes any snapshots at all.
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.every > 0
    }

    /// Snapshot the pre-loop state.
    pub fn begin(&mut self) {
        if self.enabled() {
            self.start = Some(self.reader.sample());
        }
    }

    /// Record a completed measured iteration (1-indexed).
    ///
    /// Snapshots after iterations `every, 2*every, ...`.
    pub fn on_iteration_done(&mut self, iteration: u32) {
        if self.enabled() && iteration % self.every == 0 {
            let sample = self.reader.sample();
            tracing::debug!(iteration, rss = sample.rss, "memory snapshot");
            self.mid.push(sample);
        }
    }

    /// Snapshot the post-loop state.
    ///
    /// Must be called as soon as the measured loop completes, before any
    /// teardown work runs.
    pub fn mark_end(&mut self) {
        if self.enabled() {
            self.end = Some(self.reader.sample());
        }
    }

    /// Reduce the collected snapshots to stats.
    ///
    /// Uses the [`mark_end`](Self::mark_end) snapshot as the end state,
    /// taking one now if it was never captured. Returns `None` when
    /// disabled or when [`begin`](Self::begin) was never called.
    pub fn finish(&mut self) -> Option<MemoryStats> {
        let start = self.start.take()?;
        let end = match self.end.take() {
            Some(end) => end,
            None => self.reader.sample(),
        };
        let stats = compute_memory_stats(&self.mid, start, end);
        self.mid.clear();
        Some(stats)
    }
}
