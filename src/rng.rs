//! Deterministic pseudo-random generation for reproducible workloads.
//!
//! Every payload a scenario produces must be a pure function of
//! `(scenario, seed)` so that two runs with the same seed and scale see
//! bit-identical inputs. This module provides the seeded generator and the
//! derived helpers (text synthesis, permutation, index selection) the
//! workload layer builds on. None of this is cryptographic; the only goal
//! is reproducibility.

/// Seeded 32-bit linear congruential generator.
///
/// Advances `state = state * 1664525 + 1013904223 (mod 2^32)` on every
/// draw, then yields `state / 2^32`. Two generators constructed with the
/// same seed produce identical infinite sequences.
///
/// Call sites should decorate a shared base seed with purpose-specific XOR
/// salts before constructing a generator, so unrelated generation steps
/// (text synthesis vs shuffling vs mutation-index selection) never share a
/// draw sequence.
#[derive(Debug, Clone)]
pub struct DetRng {
    state: u32,
}

impl DetRng {
    const MULTIPLIER: u32 = 1_664_525;
    const INCREMENT: u32 = 1_013_904_223;

    /// Create a generator from a seed.
    #[must_use]
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Draw the next value in `[0, 1)`.
    ///
    /// The state advances first, so the seed itself is never returned.
    #[inline]
    pub fn next_f64(&mut self) -> f64 {
        self.state = self
            .state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT);
        f64::from(self.state) / (u64::from(u32::MAX) + 1) as f64
    }

    /// Draw an index in `[0, bound)`.
    ///
    /// Returns 0 for `bound == 0` so callers never index with a garbage
    /// value on empty collections.
    #[inline]
    pub fn next_index(&mut self, bound: usize) -> usize {
        if bound == 0 {
            return 0;
        }
        (self.next_f64() * bound as f64) as usize
    }
}

/// Base-36 digit alphabet used by [`make_text`].
const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generate a deterministic string of exactly `len` base-36 digits.
///
/// Each character is an independent draw from a generator seeded with
/// `seed`; the output alphabet is `[0-9a-z]`.
#[must_use]
pub fn make_text(len: usize, seed: u32) -> String {
    let mut rng = DetRng::new(seed);
    text_from(&mut rng, len)
}

/// Draw `len` base-36 digits from an existing generator.
///
/// Used by the workload layer when several strings must come from one
/// continuous draw sequence (e.g. all item texts of a list).
pub(crate) fn text_from(rng: &mut DetRng, len: usize) -> String {
    let mut out = String::with_capacity(len);
    while out.len() < len {
        out.push(DIGITS[rng.next_index(DIGITS.len())] as char);
    }
    out.truncate(len);
    out
}

/// Seeded in-place Fisher-Yates permutation.
///
/// The result is a permutation of the input (same multiset, same length)
/// and is deterministic for a fixed seed.
pub fn shuffle<T>(items: &mut [T], seed: u32) {
    let mut rng = DetRng::new(seed);
    for i in (1..items.len()).rev() {
        let j = rng.next_index(i + 1);
        items.swap(i, j);
    }
}

/// Seeded duplicate-free draw of `count` distinct indices in `[0, bound)`.
///
/// Draws without replacement: already-picked indices are redrawn, so the
/// result always holds exactly `min(count, bound)` distinct values, in
/// draw order.
#[must_use]
pub fn pick_indices(bound: usize, count: usize, seed: u32) -> Vec<usize> {
    let want = count.min(bound);
    let mut rng = DetRng::new(seed);
    let mut taken = vec![false; bound];
    let mut picked = Vec::with_capacity(want);
    while picked.len() < want {
        let idx = rng.next_index(bound);
        if !taken[idx] {
            taken[idx] = true;
            picked.push(idx);
        }
    }
    picked
}
