// Header-based column inference.
//
// Analytics exports rename and localize their headers between tool
// versions, so the URL / traffic / keyword columns are located with a
// two-pass matcher driven by a static table instead of a fixed schema:
// 1. case-insensitive exact match against the kind's candidate names,
// 2. case-insensitive substring match against the kind's short tokens.
use crate::config::ColumnOverrides;
use crate::error::{ReportError, Result};
use once_cell::sync::Lazy;
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Url,
    Traffic,
    Keyword,
}

impl ColumnKind {
    pub const ALL: [ColumnKind; 3] = [ColumnKind::Url, ColumnKind::Traffic, ColumnKind::Keyword];

    pub fn label(self) -> &'static str {
        match self {
            ColumnKind::Url => "URL",
            ColumnKind::Traffic => "Traffic",
            ColumnKind::Keyword => "Keyword",
        }
    }
}

/// Matching rule for one column kind.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ColumnRule {
    pub exact: Vec<String>,
    pub contains: Vec<String>,
}

impl ColumnRule {
    fn new(exact: &[&str], contains: &[&str]) -> Self {
        Self {
            exact: exact.iter().map(|s| s.to_string()).collect(),
            contains: contains.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// First exact candidate (in candidate order) present among the headers,
    /// otherwise the first header (in column order) containing a token.
    pub fn find<'h>(&self, headers: &'h [String]) -> Option<&'h str> {
        let lowered: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();

        for cand in &self.exact {
            let cand = cand.to_lowercase();
            if let Some(idx) = lowered.iter().position(|h| *h == cand) {
                return Some(headers[idx].as_str());
            }
        }

        let tokens: Vec<String> = self
            .contains
            .iter()
            .map(|t| t.to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        lowered
            .iter()
            .position(|h| tokens.iter().any(|t| h.contains(t.as_str())))
            .map(|idx| headers[idx].as_str())
    }
}

/// `{kind -> exact candidates, substring tokens}`. Extend the lists to
/// support new export formats; the matching logic stays the same.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ColumnTable {
    pub url: ColumnRule,
    pub traffic: ColumnRule,
    pub keyword: ColumnRule,
}

impl Default for ColumnTable {
    fn default() -> Self {
        Self {
            url: ColumnRule::new(
                &["url", "page url", "link url", "ページurl", "リンクurl", "リンク url"],
                &["url", "ページ", "リンク"],
            ),
            traffic: ColumnRule::new(
                &["traffic", "organic traffic", "search traffic", "トラフィック", "オーガニックトラフィック"],
                &["traffic", "トラフィック"],
            ),
            keyword: ColumnRule::new(
                &["top keyword", "top keywords", "keyword", "keywords", "キーワード", "トップキーワード"],
                &["keyword", "キーワード"],
            ),
        }
    }
}

impl ColumnTable {
    pub fn rule(&self, kind: ColumnKind) -> &ColumnRule {
        match kind {
            ColumnKind::Url => &self.url,
            ColumnKind::Traffic => &self.traffic,
            ColumnKind::Keyword => &self.keyword,
        }
    }

    pub fn infer<'h>(&self, headers: &'h [String], kind: ColumnKind) -> Option<&'h str> {
        self.rule(kind).find(headers)
    }
}

pub static DEFAULT_COLUMN_TABLE: Lazy<ColumnTable> = Lazy::new(ColumnTable::default);

/// Guess the header holding `kind` using the built-in table.
pub fn infer<'h>(headers: &'h [String], kind: ColumnKind) -> Option<&'h str> {
    DEFAULT_COLUMN_TABLE.infer(headers, kind)
}

/// Resolved column positions for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSelection {
    pub url: usize,
    pub traffic: usize,
    pub keyword: usize,
}

/// Resolve all three columns, preferring explicit overrides over inference.
///
/// Fails with `MissingColumns` listing every unresolved kind together with
/// the observed headers. An override naming a header that is not present
/// counts as unresolved.
pub fn resolve_columns(
    headers: &[String],
    overrides: &ColumnOverrides,
    table: &ColumnTable,
) -> Result<ColumnSelection> {
    let mut found = [None; 3];
    let mut missing = Vec::new();

    for (slot, kind) in ColumnKind::ALL.into_iter().enumerate() {
        let idx = match overrides.get(kind) {
            Some(name) => position_of(headers, name),
            None => table
                .infer(headers, kind)
                .and_then(|name| position_of(headers, name)),
        };
        match idx {
            Some(i) => found[slot] = Some(i),
            None => missing.push(kind.label().to_string()),
        }
    }

    match found {
        [Some(url), Some(traffic), Some(keyword)] => {
            info!(
                url = %headers[url],
                traffic = %headers[traffic],
                keyword = %headers[keyword],
                "resolved CSV columns"
            );
            Ok(ColumnSelection { url, traffic, keyword })
        }
        _ => Err(ReportError::MissingColumns {
            missing,
            headers: headers.to_vec(),
        }),
    }
}

fn position_of(headers: &[String], name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name).or_else(|| {
        let wanted = name.trim().to_lowercase();
        headers.iter().position(|h| h.trim().to_lowercase() == wanted)
    })
}
