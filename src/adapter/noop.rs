//! Zero-cost adapter for harness self-measurement.

use super::{Adapter, AdapterError};
use crate::workload::Payload;

/// Adapter that accepts every payload and renders nothing.
///
/// Useful as an overhead floor: a run against `noop` measures the cost of
/// the harness itself (payload generation excluded, since that happens
/// outside the timed phases).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAdapter;

impl Adapter for NoopAdapter {
    fn build(&mut self, _payload: &Payload) -> Result<(), AdapterError> {
        Ok(())
    }

    fn render(&mut self) -> Result<(), AdapterError> {
        Ok(())
    }
}
