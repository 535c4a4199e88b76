//! Reporting types and output formatters

pub mod types;
pub mod formatting;

pub use types::{LayoutReport, OutputFormat, RunStatus, StepRecord, TreeRecord};
pub use formatting::{render_report, CsvFormatter, JsonFormatter, ReportBuilder, TextFormatter};
