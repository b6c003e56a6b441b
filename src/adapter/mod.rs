//! Rendering back-end abstraction.
//!
//! The harness drives back-ends through the [`Adapter`] trait and knows
//! nothing about their internals: `build` applies a payload to whatever
//! in-memory representation the back-end keeps, `render` flushes that
//! representation to output. Framework selection goes through a closed
//! [`AdapterRegistry`] of named constructors rather than conditionals at
//! call sites.

mod buffer;
mod noop;

pub use buffer::BufferAdapter;
pub use noop::NoopAdapter;

use crate::workload::Payload;
use std::io;

/// Failure raised by a back-end during build or render.
///
/// The harness never retries or suppresses these; a failing adapter aborts
/// the entire run so the statistics cannot silently absorb masked errors.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// IO failure while flushing output.
    #[error("adapter IO error: {0}")]
    Io(#[from] io::Error),
    /// Back-end specific failure.
    #[error("adapter failure: {0}")]
    Backend(String),
}

/// A pluggable rendering back-end.
///
/// One instance is created per scenario run and destroyed afterwards, so
/// implementations may keep per-run caches; warmup iterations exist to
/// bring those to steady state before measurement.
pub trait Adapter {
    /// Apply a payload to the in-memory representation.
    fn build(&mut self, payload: &Payload) -> Result<(), AdapterError>;

    /// Flush the in-memory representation to output.
    fn render(&mut self) -> Result<(), AdapterError>;

    /// Release any resources held by the back-end.
    ///
    /// Called once, after the scenario's measured loop.
    fn destroy(&mut self) {}
}

/// Factory producing a fresh adapter for a `(width, height)` viewport.
pub type AdapterFactory = Box<dyn Fn(u16, u16) -> Box<dyn Adapter>>;

/// Named registry of back-end constructors.
///
/// The closed set of frameworks a run can select from; looked up once per
/// scenario, never per iteration.
#[derive(Default)]
pub struct AdapterRegistry {
    entries: Vec<(String, AdapterFactory)>,
}

impl AdapterRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the built-in back-ends.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("buffer", |width, height| {
            Box::new(BufferAdapter::new(width, height))
        });
        registry.register("noop", |_, _| Box::new(NoopAdapter));
        registry
    }

    /// Register a back-end constructor under a framework name.
    ///
    /// A repeated name replaces the earlier registration.
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(u16, u16) -> Box<dyn Adapter> + 'static,
    {
        self.entries.retain(|(n, _)| n != name);
        self.entries.push((name.to_string(), Box::new(factory)));
    }

    /// Registered framework names, in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Whether a framework name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Construct a fresh adapter for `name`, or `None` if unregistered.
    #[must_use]
    pub fn create(&self, name: &str, width: u16, height: u16) -> Option<Box<dyn Adapter>> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, factory)| factory(width, height))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry() {
        let registry = AdapterRegistry::with_builtins();
        assert_eq!(registry.names(), vec!["buffer", "noop"]);
        assert!(registry.contains("noop"));
        assert!(!registry.contains("react"));
        assert!(registry.create("buffer", 80, 24).is_some());
        assert!(registry.create("react", 80, 24).is_none());
    }

    #[test]
    fn test_reregistration_replaces() {
        let mut registry = AdapterRegistry::with_builtins();
        registry.register("noop", |_, _| Box::new(NoopAdapter));
        assert_eq!(registry.names().iter().filter(|n| **n == "noop").count(), 1);
    }
}
