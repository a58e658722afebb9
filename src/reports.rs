use crate::config::ReportConfig;
use crate::error::{ReportError, Result};
use crate::loader::load_pages;
use crate::types::{
    LoadReport, MergedPage, PageDiffRow, PageRecord, ReportInput, Summary, SummaryRow,
    SummaryStats,
};
use crate::util::{format_int, format_number, format_ratio, percent_change};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{info, warn};

/// `true` when `url` contains any marker as a literal substring.
///
/// This is plain text containment, not a path-segment match: `/blog-old`
/// and `/blogger` both match `/blog`. Empty markers never match.
pub fn is_blog_url(url: &str, blog_markers: &[String]) -> bool {
    blog_markers
        .iter()
        .any(|m| !m.is_empty() && url.contains(m.as_str()))
}

/// Merge previous and current period rows into one `MergedPage` per URL.
///
/// URLs are compared byte for byte. Output order is first appearance:
/// previous-period URLs first, then URLs only seen in the current period.
/// When a URL repeats inside one period the last row wins.
pub fn reconcile(
    prev: &[PageRecord],
    curr: &[PageRecord],
    blog_markers: &[String],
) -> Vec<MergedPage> {
    #[derive(Default)]
    struct Acc<'a> {
        url: &'a str,
        prev_traffic: Option<f64>,
        current_traffic: Option<f64>,
        keyword_prev: Option<&'a str>,
        keyword_current: Option<&'a str>,
    }

    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut accs: Vec<Acc> = Vec::new();

    for p in prev {
        let i = *index.entry(p.url.as_str()).or_insert_with(|| {
            accs.push(Acc { url: p.url.as_str(), ..Acc::default() });
            accs.len() - 1
        });
        accs[i].prev_traffic = Some(p.traffic);
        accs[i].keyword_prev = p.top_keyword.as_deref();
    }
    for p in curr {
        let i = *index.entry(p.url.as_str()).or_insert_with(|| {
            accs.push(Acc { url: p.url.as_str(), ..Acc::default() });
            accs.len() - 1
        });
        accs[i].current_traffic = Some(p.traffic);
        accs[i].keyword_current = p.top_keyword.as_deref();
    }

    accs.into_iter()
        .map(|acc| {
            let prev_traffic = acc.prev_traffic.unwrap_or(0.0);
            let current_traffic = acc.current_traffic.unwrap_or(0.0);
            let diff = current_traffic - prev_traffic;
            MergedPage {
                url: acc.url.to_string(),
                prev_traffic,
                current_traffic,
                diff,
                diff_ratio: percent_change(diff, prev_traffic),
                top_keyword_prev: acc.keyword_prev.map(str::to_string),
                top_keyword_current: acc.keyword_current.map(str::to_string),
                is_blog: is_blog_url(acc.url, blog_markers),
            }
        })
        .collect()
}

/// Sum traffic over `pages`. The ratio is computed from the summed totals,
/// not averaged from per-page ratios. Empty input yields zero totals.
pub fn aggregate<'a, I>(pages: I) -> SummaryStats
where
    I: IntoIterator<Item = &'a MergedPage>,
{
    let mut total_prev = 0.0;
    let mut total_current = 0.0;
    let mut page_count = 0usize;
    for p in pages {
        total_prev += p.prev_traffic;
        total_current += p.current_traffic;
        page_count += 1;
    }
    let total_diff = total_current - total_prev;
    SummaryStats {
        total_traffic_prev: total_prev,
        total_traffic_current: total_current,
        total_diff,
        total_diff_ratio: percent_change(total_diff, total_prev),
        page_count,
    }
}

pub fn summarize(pages: &[MergedPage]) -> Summary {
    Summary {
        all: aggregate(pages),
        blog_only: aggregate(pages.iter().filter(|p| p.is_blog)),
    }
}

/// Pass-through labels attached to the report payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportLabels {
    pub target: String,
    pub month_prev: String,
    pub month_current: String,
}

/// Result of one ingestion-and-reconciliation run.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub input: ReportInput,
    pub prev_load: LoadReport,
    pub current_load: LoadReport,
}

/// Full pipeline: decode and extract both files, reconcile, summarize.
///
/// A single empty period is tolerated; both periods empty is an
/// `EmptyDataset` error.
pub fn build_report(
    prev_bytes: &[u8],
    current_bytes: &[u8],
    labels: &ReportLabels,
    config: &ReportConfig,
) -> Result<Analysis> {
    let (prev, prev_load) = load_pages(prev_bytes, config)?;
    let (curr, current_load) = load_pages(current_bytes, config)?;

    if prev.is_empty() && curr.is_empty() {
        return Err(ReportError::EmptyDataset);
    }
    if prev.is_empty() || curr.is_empty() {
        warn!(
            prev_rows = prev.len(),
            current_rows = curr.len(),
            "one period has no usable rows"
        );
    }

    let pages = reconcile(&prev, &curr, &config.blog_markers);
    let summary = summarize(&pages);
    info!(
        pages = summary.all.page_count,
        blog_pages = summary.blog_only.page_count,
        "reconciled periods"
    );

    Ok(Analysis {
        input: ReportInput {
            target: labels.target.trim().to_string(),
            month_prev: labels.month_prev.trim().to_string(),
            month_current: labels.month_current.trim().to_string(),
            pages,
            summary,
        },
        prev_load,
        current_load,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Up to `n` pages with the largest gains (`Up`) or losses (`Down`).
/// Pages without movement in that direction are left out; ties keep
/// reconciliation order.
pub fn top_movers<'a, I>(pages: I, n: usize, direction: Direction) -> Vec<&'a MergedPage>
where
    I: IntoIterator<Item = &'a MergedPage>,
{
    let mut picked: Vec<&MergedPage> = pages
        .into_iter()
        .filter(|p| match direction {
            Direction::Up => p.diff > 0.0,
            Direction::Down => p.diff < 0.0,
        })
        .collect();
    // `sort_by` is stable, so equal diffs keep their original order.
    picked.sort_by(|a, b| {
        let ord = a.diff.partial_cmp(&b.diff).unwrap_or(Ordering::Equal);
        match direction {
            Direction::Up => ord.reverse(),
            Direction::Down => ord,
        }
    });
    picked.truncate(n);
    picked
}

pub fn page_rows<'a, I>(pages: I) -> Vec<PageDiffRow>
where
    I: IntoIterator<Item = &'a MergedPage>,
{
    pages
        .into_iter()
        .map(|p| PageDiffRow {
            url: p.url.clone(),
            prev_traffic: format_number(p.prev_traffic, 0),
            current_traffic: format_number(p.current_traffic, 0),
            diff: format_number(p.diff, 0),
            diff_ratio: format_ratio(p.diff_ratio),
            top_keyword_prev: p.top_keyword_prev.clone().unwrap_or_default(),
            top_keyword_current: p.top_keyword_current.clone().unwrap_or_default(),
            is_blog: p.is_blog,
        })
        .collect()
}

pub fn summary_rows(summary: &Summary) -> Vec<SummaryRow> {
    [("All pages", &summary.all), ("Blog only", &summary.blog_only)]
        .into_iter()
        .map(|(scope, s)| SummaryRow {
            scope: scope.to_string(),
            page_count: format_int(s.page_count),
            total_traffic_prev: format_number(s.total_traffic_prev, 0),
            total_traffic_current: format_number(s.total_traffic_current, 0),
            total_diff: format_number(s.total_diff, 0),
            total_diff_ratio: format_ratio(s.total_diff_ratio),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(url: &str, traffic: f64, kw: Option<&str>) -> PageRecord {
        PageRecord {
            url: url.to_string(),
            traffic,
            top_keyword: kw.map(str::to_string),
        }
    }

    fn markers(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn reconciles_scenario() {
        let prev = vec![rec("/blog/a", 1000.0, Some("kw1")), rec("/about", 500.0, None)];
        let curr = vec![rec("/blog/a", 1500.0, None), rec("/contact", 10.0, None)];
        let pages = reconcile(&prev, &curr, &markers(&["/blog"]));

        assert_eq!(pages.len(), 3);
        let urls: Vec<&str> = pages.iter().map(|p| p.url.as_str()).collect();
        assert_eq!(urls, vec!["/blog/a", "/about", "/contact"]);

        let blog = &pages[0];
        assert_eq!(blog.diff, 500.0);
        assert_eq!(blog.diff_ratio, Some(50.0));
        assert!(blog.is_blog);
        assert_eq!(blog.top_keyword_prev.as_deref(), Some("kw1"));
        assert_eq!(blog.top_keyword_current, None);

        let about = &pages[1];
        assert_eq!(about.current_traffic, 0.0);
        assert_eq!(about.diff, -500.0);
        assert_eq!(about.diff_ratio, Some(-100.0));
        assert!(!about.is_blog);

        let contact = &pages[2];
        assert_eq!(contact.prev_traffic, 0.0);
        assert_eq!(contact.diff, 10.0);
        assert_eq!(contact.diff_ratio, None);

        let summary = summarize(&pages);
        assert_eq!(summary.all.total_traffic_prev, 1500.0);
        assert_eq!(summary.all.total_traffic_current, 1510.0);
        assert_eq!(summary.all.page_count, 3);
        assert_eq!(summary.blog_only.page_count, 1);
        assert_eq!(summary.blog_only.total_diff_ratio, Some(50.0));
    }

    #[test]
    fn disjoint_urls_produce_union_with_defaults() {
        let prev = vec![rec("/a", 1.0, Some("x")), rec("/b", 2.0, None)];
        let curr = vec![rec("/c", 3.0, Some("y"))];
        let pages = reconcile(&prev, &curr, &[]);
        assert_eq!(pages.len(), 3);
        for p in &pages[..2] {
            assert_eq!(p.current_traffic, 0.0);
            assert_eq!(p.top_keyword_current, None);
        }
        assert_eq!(pages[2].prev_traffic, 0.0);
        assert_eq!(pages[2].top_keyword_prev, None);
        assert_eq!(pages[2].top_keyword_current.as_deref(), Some("y"));
    }

    #[test]
    fn urls_are_not_normalized() {
        let prev = vec![rec("https://x.com/a", 1.0, None)];
        let curr = vec![rec("https://x.com/a/", 1.0, None), rec("http://x.com/a", 1.0, None)];
        assert_eq!(reconcile(&prev, &curr, &[]).len(), 3);
    }

    #[test]
    fn zero_baseline_has_no_ratio() {
        let prev = vec![rec("/z", 0.0, None), rec("/y", 0.0, None)];
        let curr = vec![rec("/z", 5.0, None)];
        let pages = reconcile(&prev, &curr, &[]);
        assert!(pages.iter().all(|p| p.diff_ratio.is_none()));
        assert_eq!(aggregate(&pages).total_diff_ratio, None);
    }

    #[test]
    fn ratio_matches_formula_for_positive_baseline() {
        let prev = vec![rec("/a", 80.0, None), rec("/b", 20.0, None)];
        let curr = vec![rec("/a", 100.0, None), rec("/b", 5.0, None)];
        let pages = reconcile(&prev, &curr, &[]);
        for p in &pages {
            let expected = (p.current_traffic - p.prev_traffic) / p.prev_traffic * 100.0;
            assert_eq!(p.diff_ratio, Some(expected));
        }
        let s = aggregate(&pages);
        assert_eq!(s.total_diff_ratio, Some((105.0 - 100.0) / 100.0 * 100.0));
    }

    #[test]
    fn aggregate_of_nothing_is_zero() {
        let s = aggregate(&Vec::<MergedPage>::new());
        assert_eq!(
            s,
            SummaryStats {
                total_traffic_prev: 0.0,
                total_traffic_current: 0.0,
                total_diff: 0.0,
                total_diff_ratio: None,
                page_count: 0,
            }
        );
    }

    #[test]
    fn blog_marker_is_plain_substring() {
        let m = markers(&["/blog", "/column"]);
        assert!(is_blog_url("https://x.com/blog-old/post", &m));
        assert!(is_blog_url("https://x.com/blogger", &m));
        assert!(is_blog_url("https://x.com/column/1", &m));
        assert!(!is_blog_url("https://x.com/news/1", &m));
        assert!(!is_blog_url("https://x.com/news/1", &markers(&[""])));
    }

    #[test]
    fn duplicate_url_in_one_period_keeps_last_row() {
        let prev = vec![rec("/a", 1.0, Some("first")), rec("/a", 4.0, Some("second"))];
        let pages = reconcile(&prev, &[], &[]);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].prev_traffic, 4.0);
        assert_eq!(pages[0].top_keyword_prev.as_deref(), Some("second"));
    }

    #[test]
    fn top_movers_orders_and_filters() {
        let prev = vec![
            rec("/a", 10.0, None),
            rec("/b", 10.0, None),
            rec("/c", 10.0, None),
            rec("/d", 10.0, None),
        ];
        let curr = vec![
            rec("/a", 15.0, None),
            rec("/b", 30.0, None),
            rec("/c", 10.0, None),
            rec("/d", 2.0, None),
        ];
        let pages = reconcile(&prev, &curr, &[]);
        let up: Vec<&str> = top_movers(&pages, 5, Direction::Up)
            .iter()
            .map(|p| p.url.as_str())
            .collect();
        assert_eq!(up, vec!["/b", "/a"]);
        let down: Vec<&str> = top_movers(&pages, 5, Direction::Down)
            .iter()
            .map(|p| p.url.as_str())
            .collect();
        assert_eq!(down, vec!["/d"]);
        assert_eq!(top_movers(&pages, 1, Direction::Up).len(), 1);
    }

    #[test]
    fn summary_rows_render_missing_ratio() {
        let pages = reconcile(&[], &[rec("/new", 3.0, None)], &[]);
        let rows = summary_rows(&summarize(&pages));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].total_diff_ratio, "n/a");
        assert_eq!(rows[1].page_count, "0");
    }
}
