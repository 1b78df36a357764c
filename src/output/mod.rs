mod formatter;
mod human;
mod json;
mod writer;

pub use formatter::Formatter;
pub use human::HumanReadableFormatter;
pub use json::JSONFormatter;
pub use writer::{LineWriter, Writer};
