//! Common utility types for lens modules

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unified output format for terminal rendering
///
/// `Tsv` is the same layout as the report file; the remaining formats are
/// for reading results interactively or feeding them into other tools.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Tab-separated values with header (default)
    #[default]
    Tsv,
    /// Pretty table with borders
    Table,
    /// Markdown table format
    Markdown,
    /// Compact JSON array
    Json,
    /// Pretty-printed JSON with indentation
    JsonPretty,
    /// JSON Lines format (one JSON object per line)
    JsonLine,
    /// Pipe-separated values with header
    Psv,
}

impl OutputFormat {
    /// Check if this is a JSON variant
    pub fn is_json(&self) -> bool {
        matches!(self, Self::Json | Self::JsonPretty | Self::JsonLine)
    }

    /// Check if this is a table variant
    pub fn is_table(&self) -> bool {
        matches!(self, Self::Table | Self::Markdown)
    }

    /// Get a list of all format names for help text
    pub fn all_names() -> &'static [&'static str] {
        &[
            "tsv",
            "table",
            "markdown",
            "json",
            "json-pretty",
            "json-line",
            "psv",
        ]
    }

    /// Field separator for the delimited variants
    pub fn separator(&self) -> Option<char> {
        match self {
            Self::Tsv => Some('\t'),
            Self::Psv => Some('|'),
            _ => None,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tsv => write!(f, "tsv"),
            Self::Table => write!(f, "table"),
            Self::Markdown => write!(f, "markdown"),
            Self::Json => write!(f, "json"),
            Self::JsonPretty => write!(f, "json-pretty"),
            Self::JsonLine => write!(f, "json-line"),
            Self::Psv => write!(f, "psv"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tsv" | "tab" => Ok(Self::Tsv),
            "table" | "pretty" => Ok(Self::Table),
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            "json-pretty" | "jsonpretty" => Ok(Self::JsonPretty),
            "json-line" | "jsonline" | "jsonl" | "ndjson" => Ok(Self::JsonLine),
            "psv" | "pipe" => Ok(Self::Psv),
            _ => Err(format!(
                "Unknown output format '{}'. Valid formats: {}",
                s,
                Self::all_names().join(", ")
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::from_str("tsv").unwrap(), OutputFormat::Tsv);
        assert_eq!(OutputFormat::from_str("TAB").unwrap(), OutputFormat::Tsv);
        assert_eq!(
            OutputFormat::from_str("pretty").unwrap(),
            OutputFormat::Table
        );
        assert_eq!(
            OutputFormat::from_str("md").unwrap(),
            OutputFormat::Markdown
        );
        assert_eq!(
            OutputFormat::from_str("ndjson").unwrap(),
            OutputFormat::JsonLine
        );
        assert_eq!(OutputFormat::from_str("pipe").unwrap(), OutputFormat::Psv);
        assert!(OutputFormat::from_str("csv").is_err());
    }

    #[test]
    fn test_output_format_display_round_trip() {
        for name in OutputFormat::all_names() {
            let format = OutputFormat::from_str(name).unwrap();
            assert_eq!(format.to_string(), *name);
        }
    }

    #[test]
    fn test_output_format_kinds() {
        assert!(OutputFormat::JsonLine.is_json());
        assert!(!OutputFormat::Tsv.is_json());
        assert!(OutputFormat::Markdown.is_table());
        assert!(!OutputFormat::Psv.is_table());
        assert_eq!(OutputFormat::Tsv.separator(), Some('\t'));
        assert_eq!(OutputFormat::Psv.separator(), Some('|'));
        assert_eq!(OutputFormat::Json.separator(), None);
    }
}
