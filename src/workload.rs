//! Scenario descriptors and deterministic payload generation.
//!
//! A scenario is a named workload family with its own payload shape and
//! identity policy (whether item ids survive across iterations). Scenario
//! names resolve against a closed registry once, at workload construction;
//! the per-iteration hot path never compares strings. Payloads are a pure
//! function of `(scenario, scale, iteration)`.

use crate::rng::{self, DetRng};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Seed salt for text synthesis draws.
const TEXT_SALT: u32 = 0x9E37_79B9;
/// Seed salt for permutation draws.
const SHUFFLE_SALT: u32 = 0x85EB_CA6B;
/// Seed salt for mutation-index draws.
const MUTATE_SALT: u32 = 0xC2B2_AE35;
/// Seed for the fixed base list shared by identity-preserving scenarios.
const BASE_LIST_SEED: u32 = 0x27D4_EB2F;

/// Unscaled item count for list scenarios.
const BASE_ITEMS: f64 = 200.0;
/// Unscaled text length.
const BASE_TEXT_LEN: f64 = 256.0;
/// Fraction of the list touched by the partial-mutation scenario.
const MUTATE_FRACTION: f64 = 0.1;

/// One list entry.
///
/// Ids are stable across iterations for scenarios that rely on
/// identity-preserving reconciliation, and freshly minted per iteration
/// for rebuild/replace scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    /// Reconciliation key.
    pub id: String,
    /// Display text.
    pub text: String,
}

/// The unit of work submitted to an adapter on one iteration.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Full-text replacement.
    Text {
        /// The new text content.
        value: String,
    },
    /// Full list state.
    List {
        /// Items in render order.
        items: Vec<ListItem>,
        /// Ids whose text changed this iteration, when the scenario tracks
        /// that (partial mutation only).
        mutate_ids: Option<Vec<String>>,
        /// Id-to-text lookup for adapters that reconcile by key, when the
        /// scenario provides it (partial mutation only).
        items_by_id: Option<FxHashMap<String, String>>,
    },
}

/// Id minting policy for [`make_list`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdPolicy {
    /// Ids `item-{i}`, identical on every call.
    Stable,
    /// Ids `item-{tag}-{i}`, unique per iteration tag.
    PerIteration(u32),
}

/// Build `count` items with deterministic text of length `text_len`.
///
/// All item texts come from one continuous draw sequence seeded with
/// `seed`; ids follow the [`IdPolicy`]. Ids are pairwise unique either way.
#[must_use]
pub fn make_list(count: usize, text_len: usize, seed: u32, ids: IdPolicy) -> Vec<ListItem> {
    let mut rng = DetRng::new(seed);
    (0..count)
        .map(|i| ListItem {
            id: match ids {
                IdPolicy::Stable => format!("item-{i}"),
                IdPolicy::PerIteration(tag) => format!("item-{tag}-{i}"),
            },
            text: rng::text_from(&mut rng, text_len),
        })
        .collect()
}

/// Resolved sizing for one scenario, echoed into results for auditability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioSettings {
    /// Dataset size multiplier the sizes were derived from.
    pub scale: f64,
    /// Text length for text payloads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_len: Option<usize>,
    /// Item count for list payloads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_count: Option<usize>,
    /// Items touched per iteration by partial mutation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mutate_count: Option<usize>,
}

/// A scenario name with no registered generator.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown scenario '{0}' (registered: {known})", known = known_scenario_names().join(", "))]
pub struct UnknownScenarioError(pub String);

/// Payload family backing a registered scenario name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    TextUpdate,
    ListRebuild,
    KeyedShuffle,
    PartialMutate,
}

/// Closed scenario registry. `list-rebuild` and `list-replace` are two
/// names for the same no-identity-reuse family.
const REGISTRY: &[(&str, Family)] = &[
    ("text-update", Family::TextUpdate),
    ("list-rebuild", Family::ListRebuild),
    ("list-replace", Family::ListRebuild),
    ("keyed-shuffle", Family::KeyedShuffle),
    ("partial-mutate", Family::PartialMutate),
];

/// Names of all registered scenarios, in registry order.
#[must_use]
pub fn known_scenario_names() -> Vec<&'static str> {
    REGISTRY.iter().map(|(name, _)| *name).collect()
}

/// Per-scenario payload generator.
///
/// Construction resolves the name against the registry and derives the
/// scaled sizes; [`generate`](Self::generate) is then a pure function of
/// the iteration index. Warmup and measurement share this generator.
#[derive(Debug, Clone)]
pub struct Workload {
    name: &'static str,
    family: Family,
    settings: ScenarioSettings,
    items_count: usize,
    text_len: usize,
    mutate_count: usize,
    /// Fixed base list for identity-preserving families; empty otherwise.
    base: Vec<ListItem>,
}

/// `max(1, round(base * scale))` sizing rule shared by all derived sizes.
fn scaled(base: f64, scale: f64) -> usize {
    ((base * scale).round() as usize).max(1)
}

impl Workload {
    /// Resolve a scenario name and derive its sizing from `scale`.
    ///
    /// Fails before any iteration runs when the name is not registered.
    pub fn new(scenario: &str, scale: f64) -> Result<Self, UnknownScenarioError> {
        let (name, family) = REGISTRY
            .iter()
            .find(|(name, _)| *name == scenario)
            .copied()
            .ok_or_else(|| UnknownScenarioError(scenario.to_string()))?;

        let items_count = scaled(BASE_ITEMS, scale);
        let text_len = scaled(BASE_TEXT_LEN, scale);
        let mutate_count = ((items_count as f64 * MUTATE_FRACTION).round() as usize).max(1);

        let settings = match family {
            Family::TextUpdate => ScenarioSettings {
                scale,
                text_len: Some(text_len),
                items_count: None,
                mutate_count: None,
            },
            Family::ListRebuild | Family::KeyedShuffle => ScenarioSettings {
                scale,
                text_len: Some(text_len),
                items_count: Some(items_count),
                mutate_count: None,
            },
            Family::PartialMutate => ScenarioSettings {
                scale,
                text_len: Some(text_len),
                items_count: Some(items_count),
                mutate_count: Some(mutate_count),
            },
        };

        let base = match family {
            Family::KeyedShuffle | Family::PartialMutate => {
                make_list(items_count, text_len, BASE_LIST_SEED, IdPolicy::Stable)
            }
            Family::TextUpdate | Family::ListRebuild => Vec::new(),
        };

        Ok(Self {
            name,
            family,
            settings,
            items_count,
            text_len,
            mutate_count,
            base,
        })
    }

    /// Registered scenario name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Resolved sizes for result reporting.
    #[must_use]
    pub fn settings(&self) -> ScenarioSettings {
        self.settings
    }

    /// Generate the payload for iteration `i`.
    ///
    /// Deterministic: the same `(scenario, scale, i)` always yields a
    /// bit-identical payload.
    #[must_use]
    pub fn generate(&self, iteration: u32) -> Payload {
        match self.family {
            Family::TextUpdate => Payload::Text {
                value: rng::make_text(self.text_len, iteration ^ TEXT_SALT),
            },
            Family::ListRebuild => Payload::List {
                items: make_list(
                    self.items_count,
                    self.text_len,
                    iteration ^ TEXT_SALT,
                    IdPolicy::PerIteration(iteration),
                ),
                mutate_ids: None,
                items_by_id: None,
            },
            Family::KeyedShuffle => {
                let mut items = self.base.clone();
                rng::shuffle(&mut items, iteration ^ SHUFFLE_SALT);
                Payload::List {
                    items,
                    mutate_ids: None,
                    items_by_id: None,
                }
            }
            Family::PartialMutate => {
                let mut items = self.base.clone();
                let picked = rng::pick_indices(
                    self.items_count,
                    self.mutate_count,
                    iteration ^ MUTATE_SALT,
                );
                let mut text_rng = DetRng::new(iteration ^ TEXT_SALT);
                let mut mutate_ids = Vec::with_capacity(picked.len());
                for idx in picked {
                    items[idx].text = rng::text_from(&mut text_rng, self.text_len);
                    mutate_ids.push(items[idx].id.clone());
                }
                let items_by_id = items
                    .iter()
                    .map(|item| (item.id.clone(), item.text.clone()))
                    .collect();
                Payload::List {
                    items,
                    mutate_ids: Some(mutate_ids),
                    items_by_id: Some(items_by_id),
                }
            }
        }
    }
}
