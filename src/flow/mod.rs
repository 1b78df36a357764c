//! Parsing of single `ovs-ofctl dump-flows` lines.

mod collection;
mod field;
mod record;

pub use collection::FieldCollection;
pub use field::{Field, FieldKind};
pub use record::{FlowRecord, Glyphs, Scalar, DEFAULT_LABEL, DEFAULT_PRIORITY};
