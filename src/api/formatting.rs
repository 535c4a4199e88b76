//! Layout output formatting and serialization
//!
//! Renders trees, measurements and run reports as human-readable text, JSON
//! or CSV.

use crate::algorithms::resolution::{ResolvedLayout, StepOutcome};
use crate::api::types::{LayoutReport, OutputFormat, RunStatus, StepRecord, TreeRecord};
use crate::core::{DistanceMeasurement, Tree};
use crate::validation::error::{ResolutionError, ResolutionResult};

/// Builds [`LayoutReport`]s from run results
pub struct ReportBuilder {
    /// Decimal places kept in coordinates
    pub precision: u8,
    /// Include the per-step history
    pub include_steps: bool,
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self {
            precision: 2,
            include_steps: true,
        }
    }
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_precision(mut self, precision: u8) -> Self {
        self.precision = precision;
        self
    }

    pub fn without_steps(mut self) -> Self {
        self.include_steps = false;
        self
    }

    /// Build a report from a run result and the engine history.
    ///
    /// Returns `None` for invalid input or configuration, where no run took place.
    pub fn build(&self, result: &ResolutionResult<ResolvedLayout>, history: &[StepOutcome]) -> Option<LayoutReport> {
        let (status, trees, unresolved) = match result {
            Ok(layout) => (RunStatus::Success, layout.trees.clone(), Vec::new()),
            Err(ResolutionError::ExhaustedCandidates { resolved, unresolved }) => {
                (RunStatus::Exhausted, resolved.clone(), unresolved.clone())
            }
            Err(ResolutionError::InvalidInput { .. }) | Err(ResolutionError::InvalidConfig { .. }) => return None,
        };

        let steps = if self.include_steps {
            history.iter().map(|outcome| self.step_record(outcome)).collect()
        } else {
            Vec::new()
        };

        Some(LayoutReport {
            status,
            trees: trees.iter().map(|tree| self.tree_record(tree)).collect(),
            unresolved: unresolved.iter().map(|id| id.to_string()).collect(),
            steps,
        })
    }

    pub fn tree_record(&self, tree: &Tree) -> TreeRecord {
        TreeRecord {
            id: tree.id.to_string(),
            x: tree.position.map(|p| self.round_to_precision(p.x)),
            y: tree.position.map(|p| self.round_to_precision(p.y)),
            name: tree.name.clone(),
            known: tree.is_known(),
        }
    }

    fn step_record(&self, outcome: &StepOutcome) -> StepRecord {
        let label = match outcome {
            StepOutcome::Committed { .. } => "committed",
            StepOutcome::Deferred { .. } => "deferred",
            StepOutcome::Finished => "success",
            StepOutcome::Exhausted { .. } => "exhausted",
        };

        StepRecord {
            tree_id: outcome.tree_id().map(|id| id.to_string()),
            outcome: label.to_string(),
            detail: outcome.to_string(),
        }
    }

    fn round_to_precision(&self, value: f64) -> f64 {
        let multiplier = 10_f64.powi(self.precision as i32);
        (value * multiplier).round() / multiplier
    }
}

/// Human-readable text formatter
pub struct TextFormatter {
    /// Include the per-step history
    pub include_steps: bool,
    /// Decimal places for coordinates
    pub precision: usize,
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self {
            include_steps: true,
            precision: 2,
        }
    }
}

impl TextFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// One `ID: .. | X: .. | Y: .. | Name: ..` line per tree
    pub fn format_trees(&self, trees: &[Tree]) -> String {
        let mut output = String::new();
        for tree in trees {
            let (x, y) = match tree.position {
                Some(p) => (
                    format!("{:.*}", self.precision, p.x),
                    format!("{:.*}", self.precision, p.y),
                ),
                None => ("?".to_string(), "?".to_string()),
            };
            output.push_str(&format!("ID: {} | X: {} | Y: {} | Name: {}\n", tree.id, x, y, tree.name));
        }
        output
    }

    /// One `Tree1: .. | Tree2: .. | Distance: ..` line per measurement
    pub fn format_distances(&self, measurements: &[DistanceMeasurement]) -> String {
        let mut output = String::new();
        for m in measurements {
            output.push_str(&format!(
                "Tree1: {} | Tree2: {} | Distance: {:.2}\n",
                m.tree1, m.tree2, m.distance
            ));
        }
        output
    }

    pub fn format_report(&self, report: &LayoutReport) -> String {
        let mut output = String::new();

        if self.include_steps && !report.steps.is_empty() {
            output.push_str("--- Steps ---\n");
            for step in &report.steps {
                output.push_str(&format!("  {}\n", step.detail));
            }
            output.push('\n');
        }

        output.push_str("--- Known trees ---\n");
        for tree in &report.trees {
            let x = tree.x.map_or("?".to_string(), |x| format!("{:.*}", self.precision, x));
            let y = tree.y.map_or("?".to_string(), |y| format!("{:.*}", self.precision, y));
            output.push_str(&format!("ID: {} | X: {} | Y: {} | Name: {}\n", tree.id, x, y, tree.name));
        }

        match report.status {
            RunStatus::Success => output.push_str("\nSuccess: all trees have been processed!\n"),
            RunStatus::Exhausted => {
                output.push_str(&format!(
                    "\nError: {} tree(s) could not be resolved: {}\n",
                    report.unresolved.len(),
                    report.unresolved.join(", ")
                ));
            }
        }

        output
    }
}

/// JSON formatter for structured output
pub struct JsonFormatter {
    /// Pretty print JSON
    pub pretty: bool,
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self { pretty: true }
    }
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compact() -> Self {
        Self { pretty: false }
    }

    pub fn format_report(&self, report: &LayoutReport) -> Result<String, serde_json::Error> {
        if self.pretty {
            serde_json::to_string_pretty(report)
        } else {
            serde_json::to_string(report)
        }
    }
}

/// CSV formatter, one row per tree
pub struct CsvFormatter {
    /// Include header row
    pub include_header: bool,
}

impl Default for CsvFormatter {
    fn default() -> Self {
        Self { include_header: true }
    }
}

impl CsvFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(&self) -> String {
        "id,x,y,name,status".to_string()
    }

    /// Resolved trees followed by unresolved ids with empty coordinates
    pub fn format_report(&self, report: &LayoutReport) -> String {
        let mut rows = Vec::new();
        if self.include_header {
            rows.push(self.header());
        }

        for tree in &report.trees {
            rows.push(format!(
                "{},{},{},{},{}",
                tree.id,
                tree.x.map_or(String::new(), |x| x.to_string()),
                tree.y.map_or(String::new(), |y| y.to_string()),
                escape_csv(&tree.name),
                if tree.known { "known" } else { "unknown" }
            ));
        }
        for id in &report.unresolved {
            rows.push(format!("{},,,,unresolved", id));
        }

        let mut output = rows.join("\n");
        output.push('\n');
        output
    }
}

fn escape_csv(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Render a report in `format`
pub fn render_report(report: &LayoutReport, format: OutputFormat, precision: usize) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Text => Ok(TextFormatter {
            precision,
            ..TextFormatter::default()
        }
        .format_report(report)),
        OutputFormat::Json => JsonFormatter::new().format_report(report),
        OutputFormat::Csv => Ok(CsvFormatter::new().format_report(report)),
    }
}
