use super::formatter::Formatter;
use crate::error::Result;
use crate::flow::FlowRecord;

/// One block per flow, blocks separated by an empty line.
pub struct HumanReadableFormatter {}

impl HumanReadableFormatter {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for HumanReadableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter for HumanReadableFormatter {
    fn format(&self, flows: &[FlowRecord]) -> Result<Vec<u8>> {
        Ok(flows
            .iter()
            .map(|flow| flow.to_string())
            .collect::<Vec<_>>()
            .join("\n")
            .into_bytes())
    }
}
