// Explicit configuration for a reconciliation run. Nothing in the core
// reads environment variables or globals; callers build a `ReportConfig`
// (or load one from JSON) and pass it in.
use crate::columns::{ColumnKind, ColumnTable};
use crate::error::Result;
use crate::types::TextEncoding;
use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_BLOG_MARKERS: [&str; 2] = ["/blog", "/column"];

/// Explicit header names that bypass inference.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ColumnOverrides {
    pub url: Option<String>,
    pub traffic: Option<String>,
    pub keyword: Option<String>,
}

impl ColumnOverrides {
    pub fn get(&self, kind: ColumnKind) -> Option<&str> {
        let v = match kind {
            ColumnKind::Url => &self.url,
            ColumnKind::Traffic => &self.traffic,
            ColumnKind::Keyword => &self.keyword,
        };
        v.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub encodings: Vec<TextEncoding>,
    pub blog_markers: Vec<String>,
    pub columns: ColumnOverrides,
    pub column_table: ColumnTable,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            encodings: vec![
                TextEncoding::Utf8,
                TextEncoding::Utf16Le,
                TextEncoding::Utf16Be,
                TextEncoding::ShiftJis,
            ],
            blog_markers: DEFAULT_BLOG_MARKERS.iter().map(|s| s.to_string()).collect(),
            columns: ColumnOverrides::default(),
            column_table: ColumnTable::default(),
        }
    }
}

impl ReportConfig {
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Self::from_json_str(&s)
    }

    pub fn with_blog_markers(mut self, list: &str) -> Self {
        self.blog_markers = parse_blog_markers(list);
        self
    }
}

/// Split a comma-separated marker list (`"/blog, /column"`), trimming each
/// entry and dropping empty ones.
pub fn parse_blog_markers(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_marker_list() {
        assert_eq!(parse_blog_markers("/blog, /column,,  "), vec!["/blog", "/column"]);
        assert!(parse_blog_markers("").is_empty());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = ReportConfig::from_json_str(
            r#"{"blog_markers": ["/news"], "columns": {"traffic": "Sessions"}}"#,
        )
        .unwrap();
        assert_eq!(cfg.blog_markers, vec!["/news"]);
        assert_eq!(cfg.columns.get(ColumnKind::Traffic), Some("Sessions"));
        assert_eq!(cfg.columns.get(ColumnKind::Url), None);
        assert_eq!(cfg.encodings, ReportConfig::default().encodings);
        assert_eq!(cfg.column_table, ColumnTable::default());
    }

    #[test]
    fn encodings_deserialize_from_labels() {
        let cfg = ReportConfig::from_json_str(r#"{"encodings": ["shift_jis", "utf-8"]}"#).unwrap();
        assert_eq!(cfg.encodings, vec![TextEncoding::ShiftJis, TextEncoding::Utf8]);
    }

    #[test]
    fn blank_override_is_ignored() {
        let overrides = ColumnOverrides {
            url: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(overrides.get(ColumnKind::Url), None);
    }
}
