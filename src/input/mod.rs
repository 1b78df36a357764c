mod dump;
mod reader;

pub use dump::{DumpCommand, OVS_OFCTL};
pub use reader::LineReader;

const REPLY_HEADER: &str = "_FLOW reply";

/// Tells flow lines apart from empty lines and `OFPST_FLOW reply` headers.
pub fn is_flow_line(line: &str) -> bool {
    !line.trim().is_empty() && !line.contains(REPLY_HEADER)
}
