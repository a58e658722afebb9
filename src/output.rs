use crate::error::Result;
use serde::Serialize;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: impl AsRef<Path>, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

pub fn write_text(path: impl AsRef<Path>, text: &str) -> Result<()> {
    std::fs::write(path, text)?;
    Ok(())
}

pub fn preview_table_rows<T>(title: &str, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("{}\n", title);
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::{page_rows, reconcile};
    use crate::types::PageRecord;

    #[test]
    fn writes_page_rows_as_csv() {
        let pages = reconcile(
            &[PageRecord { url: "/a".into(), traffic: 1200.0, top_keyword: Some("kw".into()) }],
            &[],
            &[],
        );
        let path = std::env::temp_dir().join(format!("traffic_diff_rows_{}.csv", std::process::id()));
        write_csv(&path, &page_rows(&pages)).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        let mut lines = written.lines();
        assert_eq!(
            lines.next(),
            Some("URL,PrevTraffic,CurrentTraffic,Diff,DiffRatio,TopKeywordPrev,TopKeywordCurrent,IsBlog")
        );
        assert_eq!(lines.next(), Some("/a,\"1,200\",0,\"-1,200\",-100.00%,kw,,false"));
    }
}
