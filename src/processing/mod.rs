//! Text input processing

pub mod parser;

pub use parser::{ParseError, ParseMode, ParsedSection, RecordParser};
