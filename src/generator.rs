// Report generation seam.
//
// Turning a `ReportInput` into prose is delegated to an external text
// service; the core only depends on the `ReportGenerator` trait.
// `MarkdownDigest` is the built-in offline implementation, laid out
// like the sections a client report covers.
use crate::error::Result;
use crate::reports::{page_rows, summary_rows, top_movers, Direction};
use crate::types::ReportInput;
use std::fmt::Write;
use tabled::{settings::Style, Table, Tabled};
use url::Url;

pub trait ReportGenerator {
    fn generate(&self, input: &ReportInput) -> Result<String>;
}

/// Markdown summary: totals, top gaining / losing URLs, blog section.
#[derive(Debug, Clone)]
pub struct MarkdownDigest {
    pub top_n: usize,
}

impl Default for MarkdownDigest {
    fn default() -> Self {
        Self { top_n: 5 }
    }
}

fn markdown_table<T: Tabled>(rows: Vec<T>) -> String {
    if rows.is_empty() {
        return "(no rows)\n".to_string();
    }
    let table = Table::new(rows).with(Style::markdown()).to_string();
    format!("{}\n", table)
}

impl ReportGenerator for MarkdownDigest {
    fn generate(&self, input: &ReportInput) -> Result<String> {
        let mut out = String::new();
        let pages = &input.pages;
        let blog = || pages.iter().filter(|p| p.is_blog);

        // Writing into a String cannot fail.
        let _ = writeln!(
            out,
            "# Organic traffic report: {} ({} vs {})\n",
            input.target, input.month_current, input.month_prev
        );

        let _ = writeln!(out, "## Summary\n");
        out.push_str(&markdown_table(summary_rows(&input.summary)));

        let _ = writeln!(out, "\n## Top {} gaining pages\n", self.top_n);
        out.push_str(&markdown_table(page_rows(top_movers(
            pages,
            self.top_n,
            Direction::Up,
        ))));
        let _ = writeln!(out, "\n## Top {} declining pages\n", self.top_n);
        out.push_str(&markdown_table(page_rows(top_movers(
            pages,
            self.top_n,
            Direction::Down,
        ))));

        let _ = writeln!(
            out,
            "\n## Blog pages ({} of {})\n",
            input.summary.blog_only.page_count, input.summary.all.page_count
        );
        let _ = writeln!(out, "### Gaining\n");
        out.push_str(&markdown_table(page_rows(top_movers(
            blog(),
            self.top_n,
            Direction::Up,
        ))));
        let _ = writeln!(out, "\n### Declining\n");
        out.push_str(&markdown_table(page_rows(top_movers(
            blog(),
            self.top_n,
            Direction::Down,
        ))));

        Ok(out)
    }
}

/// Host part of `domain` when it parses as an absolute URL, otherwise the
/// trimmed input.
pub fn normalize_domain(domain: &str) -> String {
    let trimmed = domain.trim();
    match Url::parse(trimmed) {
        Ok(u) => match (u.host_str(), u.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            _ => trimmed.to_string(),
        },
        Err(_) => trimmed.to_string(),
    }
}

/// `report_<domain>_<month>.md` with `:` replaced so the name is portable.
pub fn report_filename(domain: &str, month_current: &str) -> String {
    let safe_domain = normalize_domain(domain).replace(':', "_");
    format!("report_{}_{}.md", safe_domain, month_current.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::{reconcile, summarize};
    use crate::types::PageRecord;

    fn rec(url: &str, traffic: f64) -> PageRecord {
        PageRecord { url: url.to_string(), traffic, top_keyword: None }
    }

    #[test]
    fn normalizes_domains() {
        assert_eq!(normalize_domain("https://example.com/path"), "example.com");
        assert_eq!(normalize_domain(" example.com "), "example.com");
        assert_eq!(normalize_domain("http://localhost:8080"), "localhost:8080");
    }

    #[test]
    fn builds_portable_filename() {
        assert_eq!(
            report_filename("http://localhost:8080", "2025-12"),
            "report_localhost_8080_2025-12.md"
        );
        assert_eq!(report_filename("https://example.com", "2025-12"), "report_example.com_2025-12.md");
    }

    #[test]
    fn digest_lists_movers_and_blog_section() {
        let prev = vec![rec("/blog/a", 100.0), rec("/about", 50.0)];
        let curr = vec![rec("/blog/a", 150.0), rec("/about", 20.0)];
        let pages = reconcile(&prev, &curr, &["/blog".to_string()]);
        let input = ReportInput {
            target: "example.com".into(),
            month_prev: "2025-11".into(),
            month_current: "2025-12".into(),
            summary: summarize(&pages),
            pages,
        };
        let text = MarkdownDigest::default().generate(&input).unwrap();
        assert!(text.starts_with("# Organic traffic report: example.com (2025-12 vs 2025-11)"));
        assert!(text.contains("## Blog pages (1 of 2)"));
        assert!(text.contains("| /blog/a"));
        assert!(text.contains("| /about"));
        assert!(text.contains("+50.00%"));
        assert!(text.contains("-60.00%"));
    }
}
