use serde_json;

use super::formatter::Formatter;
use crate::error::Result;
use crate::flow::FlowRecord;

/// The whole batch as a single JSON array.
pub struct JSONFormatter {}

impl JSONFormatter {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for JSONFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter for JSONFormatter {
    fn format(&self, flows: &[FlowRecord]) -> Result<Vec<u8>> {
        serde_json::to_vec(flows).map_err(|e| ("JSON serialization failed", e).into())
    }
}
