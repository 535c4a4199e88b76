use crate::core::{DistanceMeasurement, Point, Tree, TreeId};
use std::fmt;
use tracing::warn;

/// Errors that can occur while parsing tree and distance lines
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    InvalidFormat { line: usize, details: String },
    InvalidNumber { line: usize, field: String, value: String },
    MissingField { line: usize, field: String },
}

impl ParseError {
    /// 1-based line number within its section
    pub fn line(&self) -> usize {
        match self {
            ParseError::InvalidFormat { line, .. }
            | ParseError::InvalidNumber { line, .. }
            | ParseError::MissingField { line, .. } => *line,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::InvalidFormat { line, details } => write!(f, "Line {}: invalid format: {}", line, details),
            ParseError::InvalidNumber { line, field, value } => {
                write!(f, "Line {}: invalid {} value '{}'", line, field, value)
            }
            ParseError::MissingField { line, field } => write!(f, "Line {}: missing {}", line, field),
        }
    }
}

impl std::error::Error for ParseError {}

/// How malformed lines are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// Fail on the first malformed line
    Strict,
    /// Skip malformed lines and report them alongside the records
    Lenient,
}

/// Records parsed from one section, plus the lines that were skipped
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSection<T> {
    pub records: Vec<T>,
    pub rejected: Vec<ParseError>,
}

/// Parser for the line-oriented tree and distance formats.
///
/// Tree lines: `<id> <x>,<y>\t<name>`, where the coordinate separator may be a
/// comma, spaces or a tab. `<id> ? <name>` or `<id> <name>` declares a tree
/// with no position.
///
/// Distance lines: `<id1>#<id2> <distance>`.
pub struct RecordParser {
    mode: ParseMode,
}

impl Default for RecordParser {
    fn default() -> Self {
        Self { mode: ParseMode::Strict }
    }
}

impl RecordParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lenient() -> Self {
        Self { mode: ParseMode::Lenient }
    }

    pub fn mode(&self) -> ParseMode {
        self.mode
    }

    pub fn parse_trees<'a, I>(&self, lines: I) -> Result<ParsedSection<Tree>, ParseError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.parse_section(lines, parse_tree_line)
    }

    pub fn parse_distances<'a, I>(&self, lines: I) -> Result<ParsedSection<DistanceMeasurement>, ParseError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.parse_section(lines, parse_distance_line)
    }

    fn parse_section<'a, I, T, F>(&self, lines: I, parse_line: F) -> Result<ParsedSection<T>, ParseError>
    where
        I: IntoIterator<Item = &'a str>,
        F: Fn(&str, usize) -> Result<Option<T>, ParseError>,
    {
        let mut section = ParsedSection {
            records: Vec::new(),
            rejected: Vec::new(),
        };

        for (index, line) in lines.into_iter().enumerate() {
            match parse_line(line, index + 1) {
                Ok(Some(record)) => section.records.push(record),
                Ok(None) => {}
                Err(e) => match self.mode {
                    ParseMode::Strict => return Err(e),
                    ParseMode::Lenient => {
                        warn!(error = %e, "skipping malformed line");
                        section.rejected.push(e);
                    }
                },
            }
        }

        Ok(section)
    }
}

/// Parse one tree line. Blank lines yield `Ok(None)`.
pub fn parse_tree_line(line: &str, line_no: usize) -> Result<Option<Tree>, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (raw_id, rest) = match line.split_once(char::is_whitespace) {
        Some((id, rest)) => (id, rest.trim_start()),
        None => (line, ""),
    };
    let id = TreeId::new(raw_id);

    if let Some(name) = rest.strip_prefix('?') {
        return Ok(Some(Tree::unknown(id, name.trim())));
    }

    let (x_token, after_x) = split_number_token(rest);
    let x = match x_token.parse::<f64>() {
        Ok(x) if x.is_finite() => x,
        // No leading number: the rest of the line is the name of an unpositioned tree
        _ => return Ok(Some(Tree::unknown(id, rest.trim()))),
    };

    let (y_token, after_y) = split_number_token(skip_separator(after_x));
    if y_token.is_empty() {
        return Err(ParseError::MissingField {
            line: line_no,
            field: "y coordinate".to_string(),
        });
    }
    let y = y_token.parse::<f64>().map_err(|_| ParseError::InvalidNumber {
        line: line_no,
        field: "y coordinate".to_string(),
        value: y_token.to_string(),
    })?;

    let name = after_y.trim_start_matches(',').trim();
    Ok(Some(Tree::known(id, Point::new(x, y), name)))
}

/// Parse one distance line. Blank lines yield `Ok(None)`.
pub fn parse_distance_line(line: &str, line_no: usize) -> Result<Option<DistanceMeasurement>, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (first, rest) = line.split_once('#').ok_or_else(|| ParseError::InvalidFormat {
        line: line_no,
        details: format!("expected '<id1>#<id2> <distance>', got '{}'", line),
    })?;

    let (second, distance_text) = rest.split_once(char::is_whitespace).ok_or_else(|| ParseError::MissingField {
        line: line_no,
        field: "distance".to_string(),
    })?;

    let first = first.trim();
    let second = second.trim();
    if first.is_empty() {
        return Err(ParseError::MissingField {
            line: line_no,
            field: "first tree id".to_string(),
        });
    }
    if second.is_empty() {
        return Err(ParseError::MissingField {
            line: line_no,
            field: "second tree id".to_string(),
        });
    }

    let distance_text = distance_text.trim();
    let distance = distance_text.parse::<f64>().map_err(|_| ParseError::InvalidNumber {
        line: line_no,
        field: "distance".to_string(),
        value: distance_text.to_string(),
    })?;

    Ok(Some(DistanceMeasurement::new(first, second, distance)))
}

/// Split combined input into the tree section and the distance section.
///
/// Sections are separated by the first blank line after some tree data;
/// leading blank lines are ignored.
pub fn split_sections(text: &str) -> (Vec<&str>, Vec<&str>) {
    let mut trees = Vec::new();
    let mut distances = Vec::new();
    let mut in_distances = false;

    for line in text.lines() {
        if in_distances {
            distances.push(line);
        } else if line.trim().is_empty() {
            in_distances = !trees.is_empty();
        } else {
            trees.push(line);
        }
    }

    (trees, distances)
}

fn split_number_token(s: &str) -> (&str, &str) {
    let end = s.find(|c: char| c == ',' || c.is_whitespace()).unwrap_or(s.len());
    s.split_at(end)
}

fn skip_separator(s: &str) -> &str {
    let s = s.trim_start();
    s.strip_prefix(',').unwrap_or(s).trim_start()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tree_line_with_comma_and_tab() {
        let tree = parse_tree_line("1 12.5,-3.25\tOld oak", 1).unwrap().unwrap();
        assert_eq!(tree.id.as_str(), "01");
        assert_eq!(tree.position, Some(Point::new(12.5, -3.25)));
        assert_eq!(tree.name, "Old oak");
    }

    #[test]
    fn test_parse_tree_line_with_space_separators() {
        let tree = parse_tree_line("  14 3 4 Beech  ", 1).unwrap().unwrap();
        assert_eq!(tree.id.as_str(), "14");
        assert_eq!(tree.position, Some(Point::new(3.0, 4.0)));
        assert_eq!(tree.name, "Beech");

        let tree = parse_tree_line("15\t1.0 , 2.0\tLinden", 1).unwrap().unwrap();
        assert_eq!(tree.position, Some(Point::new(1.0, 2.0)));
        assert_eq!(tree.name, "Linden");
    }

    #[test]
    fn test_parse_unpositioned_trees() {
        let tree = parse_tree_line("7 ? Birch", 1).unwrap().unwrap();
        assert_eq!(tree.id.as_str(), "07");
        assert!(!tree.is_known());
        assert_eq!(tree.name, "Birch");

        let tree = parse_tree_line("21 Walnut", 1).unwrap().unwrap();
        assert!(!tree.is_known());
        assert_eq!(tree.name, "Walnut");

        let tree = parse_tree_line("22", 1).unwrap().unwrap();
        assert!(!tree.is_known());
        assert_eq!(tree.name, "");
    }

    #[test]
    fn test_parse_tree_line_missing_y() {
        assert_eq!(
            parse_tree_line("3 4.0", 5),
            Err(ParseError::MissingField {
                line: 5,
                field: "y coordinate".to_string()
            })
        );
        assert!(matches!(
            parse_tree_line("3 4.0,north Elm", 6),
            Err(ParseError::InvalidNumber { line: 6, .. })
        ));
    }

    #[test]
    fn test_parse_distance_line() {
        let m = parse_distance_line("  3#14 7.25 ", 1).unwrap().unwrap();
        assert_eq!(m.tree1.as_str(), "03");
        assert_eq!(m.tree2.as_str(), "14");
        assert_eq!(m.distance, 7.25);

        let m = parse_distance_line("12#13\t4", 1).unwrap().unwrap();
        assert_eq!(m.distance, 4.0);
        assert_eq!(parse_distance_line("   ", 1), Ok(None));
    }

    #[test]
    fn test_parse_distance_line_errors() {
        assert!(matches!(parse_distance_line("3-14 7.25", 2), Err(ParseError::InvalidFormat { line: 2, .. })));
        assert!(matches!(parse_distance_line("3#14", 3), Err(ParseError::MissingField { line: 3, .. })));
        assert!(matches!(parse_distance_line("#14 2.0", 4), Err(ParseError::MissingField { line: 4, .. })));
        assert!(matches!(
            parse_distance_line("3#14 far", 5),
            Err(ParseError::InvalidNumber { line: 5, .. })
        ));
    }

    #[test]
    fn test_strict_and_lenient_sections() {
        let lines = vec!["1#2 3.0", "bogus", "2#3 4.0"];

        let err = RecordParser::new().parse_distances(lines.iter().copied()).unwrap_err();
        assert_eq!(err.line(), 2);

        let section = RecordParser::lenient().parse_distances(lines.iter().copied()).unwrap();
        assert_eq!(section.records.len(), 2);
        assert_eq!(section.rejected.len(), 1);
        assert_eq!(section.rejected[0].line(), 2);
    }

    #[test]
    fn test_split_sections() {
        let text = "\n1 0,0\tOak\n2 10,0\tBeech\n3 ? Birch\n\n3#1 10\n3#2 10\n";
        let (trees, distances) = split_sections(text);
        assert_eq!(trees, vec!["1 0,0\tOak", "2 10,0\tBeech", "3 ? Birch"]);
        assert_eq!(distances, vec!["3#1 10", "3#2 10"]);
    }
}
