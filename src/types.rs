use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// One usable CSV row from a single period.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRecord {
    pub url: String,
    pub traffic: f64,
    pub top_keyword: Option<String>,
}

/// One URL reconciled across the previous and current periods.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedPage {
    pub url: String,
    pub prev_traffic: f64,
    pub current_traffic: f64,
    pub diff: f64,
    pub diff_ratio: Option<f64>,
    pub top_keyword_prev: Option<String>,
    pub top_keyword_current: Option<String>,
    pub is_blog: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStats {
    pub total_traffic_prev: f64,
    pub total_traffic_current: f64,
    pub total_diff: f64,
    pub total_diff_ratio: Option<f64>,
    pub page_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub all: SummaryStats,
    pub blog_only: SummaryStats,
}

/// Payload handed to the report generator. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportInput {
    pub target: String,
    pub month_prev: String,
    pub month_current: String,
    pub pages: Vec<MergedPage>,
    pub summary: Summary,
}

/// Candidate text encodings for uploaded CSV files, tried in configured order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextEncoding {
    #[serde(rename = "utf-8")]
    Utf8,
    #[serde(rename = "utf-16le")]
    Utf16Le,
    #[serde(rename = "utf-16be")]
    Utf16Be,
    #[serde(rename = "shift_jis")]
    ShiftJis,
}

impl TextEncoding {
    pub fn label(self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Utf16Le => "utf-16le",
            TextEncoding::Utf16Be => "utf-16be",
            TextEncoding::ShiftJis => "shift_jis",
        }
    }
}

/// Row-level outcome of scanning one CSV file. Dropped rows are counted,
/// never raised.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowStats {
    pub total_rows: usize,
    pub used_rows: usize,
    pub skipped_missing_url: usize,
    pub skipped_missing_traffic: usize,
    pub skipped_invalid_traffic: usize,
    pub malformed_rows: usize,
}

impl RowStats {
    pub fn dropped_rows(&self) -> usize {
        self.skipped_missing_url
            + self.skipped_missing_traffic
            + self.skipped_invalid_traffic
            + self.malformed_rows
    }
}

/// Per-file ingestion diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    pub encoding: TextEncoding,
    pub headers: Vec<String>,
    pub rows: RowStats,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct PageDiffRow {
    #[serde(rename = "URL")]
    #[tabled(rename = "URL")]
    pub url: String,
    #[serde(rename = "PrevTraffic")]
    #[tabled(rename = "PrevTraffic")]
    pub prev_traffic: String,
    #[serde(rename = "CurrentTraffic")]
    #[tabled(rename = "CurrentTraffic")]
    pub current_traffic: String,
    #[serde(rename = "Diff")]
    #[tabled(rename = "Diff")]
    pub diff: String,
    #[serde(rename = "DiffRatio")]
    #[tabled(rename = "DiffRatio")]
    pub diff_ratio: String,
    #[serde(rename = "TopKeywordPrev")]
    #[tabled(rename = "TopKeywordPrev")]
    pub top_keyword_prev: String,
    #[serde(rename = "TopKeywordCurrent")]
    #[tabled(rename = "TopKeywordCurrent")]
    pub top_keyword_current: String,
    #[serde(rename = "IsBlog")]
    #[tabled(rename = "IsBlog")]
    pub is_blog: bool,
}

#[derive(Debug, Tabled, Clone)]
pub struct SummaryRow {
    #[tabled(rename = "Scope")]
    pub scope: String,
    #[tabled(rename = "Pages")]
    pub page_count: String,
    #[tabled(rename = "PrevTraffic")]
    pub total_traffic_prev: String,
    #[tabled(rename = "CurrentTraffic")]
    pub total_traffic_current: String,
    #[tabled(rename = "Diff")]
    pub total_diff: String,
    #[tabled(rename = "DiffRatio")]
    pub total_diff_ratio: String,
}
