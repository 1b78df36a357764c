use crate::error::Result;
use crate::flow::FlowRecord;

pub trait Formatter {
    fn format(&self, flows: &[FlowRecord]) -> Result<Vec<u8>>;
}
