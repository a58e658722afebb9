//! Reconcile two analytics CSV exports (previous and current period) into a
//! per-URL traffic diff with blog / non-blog summary totals.
pub mod columns;
pub mod config;
pub mod error;
pub mod generator;
pub mod loader;
pub mod output;
pub mod reports;
pub mod types;
pub mod util;

pub use columns::{infer, ColumnKind, ColumnTable};
pub use config::{parse_blog_markers, ColumnOverrides, ReportConfig};
pub use error::ReportError;
pub use generator::{normalize_domain, report_filename, MarkdownDigest, ReportGenerator};
pub use loader::{decode, extract, load_pages};
pub use reports::{aggregate, build_report, reconcile, summarize, Analysis, ReportLabels};
pub use types::{
    LoadReport, MergedPage, PageRecord, ReportInput, RowStats, Summary, SummaryStats, TextEncoding,
};
