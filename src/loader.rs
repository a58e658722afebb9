use crate::columns::{resolve_columns, ColumnSelection, ColumnTable};
use crate::config::{ColumnOverrides, ReportConfig};
use crate::error::{ReportError, Result};
use crate::types::{LoadReport, PageRecord, RowStats, TextEncoding};
use crate::util::{clean_traffic_text, parse_traffic};
use csv::{ReaderBuilder, StringRecord};
use encoding_rs::{SHIFT_JIS, UTF_16BE, UTF_16LE, UTF_8};
use std::borrow::Cow;
use tracing::{debug, info, warn};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const UTF16LE_BOM: &[u8] = b"\xFF\xFE";
const UTF16BE_BOM: &[u8] = b"\xFE\xFF";

#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub text: String,
    pub encoding: TextEncoding,
}

/// Decode raw CSV bytes with the first candidate encoding that accepts the
/// whole buffer without replacement characters.
///
/// UTF-8 strips an optional BOM. UTF-16 candidates only apply when the
/// matching BOM is present, so BOM-less legacy files still reach Shift-JIS.
pub fn decode(bytes: &[u8], encodings: &[TextEncoding]) -> Result<Decoded> {
    for &encoding in encodings {
        if let Some(text) = decode_as(bytes, encoding) {
            info!(encoding = encoding.label(), bytes = bytes.len(), "decoded CSV");
            return Ok(Decoded {
                text: text.into_owned(),
                encoding,
            });
        }
        debug!(encoding = encoding.label(), "encoding rejected");
    }
    Err(ReportError::Encoding {
        tried: encodings.iter().map(|e| e.label().to_string()).collect(),
    })
}

fn decode_as(bytes: &[u8], encoding: TextEncoding) -> Option<Cow<'_, str>> {
    match encoding {
        TextEncoding::Utf8 => {
            let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
            UTF_8.decode_without_bom_handling_and_without_replacement(body)
        }
        TextEncoding::Utf16Le => UTF_16LE
            .decode_without_bom_handling_and_without_replacement(bytes.strip_prefix(UTF16LE_BOM)?),
        TextEncoding::Utf16Be => UTF_16BE
            .decode_without_bom_handling_and_without_replacement(bytes.strip_prefix(UTF16BE_BOM)?),
        TextEncoding::ShiftJis => SHIFT_JIS.decode_without_bom_handling_and_without_replacement(bytes),
    }
}

/// Usable rows of one CSV file together with its header row and row counts.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub headers: Vec<String>,
    pub pages: Vec<PageRecord>,
    pub rows: RowStats,
}

fn reader(text: &str) -> csv::Reader<&[u8]> {
    ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes())
}

/// Parse the header row, resolve the URL / traffic / keyword columns and
/// collect every usable data row.
///
/// Column resolution happens before any data row is read. Cell values are
/// kept as written; a keyword is absent only when the row is too short to
/// hold it. Rows with an empty URL, an empty traffic cell, or a traffic
/// value that is not a non-negative number are skipped and counted.
pub fn extract(text: &str, overrides: &ColumnOverrides, table: &ColumnTable) -> Result<Extraction> {
    let mut rdr = reader(text);
    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    info!(?headers, "CSV headers");

    let columns = resolve_columns(&headers, overrides, table)?;
    let mut rows = RowStats::default();
    let mut pages = Vec::new();

    for (line, result) in rdr.records().enumerate() {
        rows.total_rows += 1;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                debug!(row = line + 1, error = %e, "malformed CSV record");
                rows.malformed_rows += 1;
                continue;
            }
        };
        if let Some(page) = extract_row(line + 1, &record, &columns, &mut rows) {
            pages.push(page);
        }
    }

    rows.used_rows = pages.len();
    info!(
        total = rows.total_rows,
        used = rows.used_rows,
        dropped = rows.dropped_rows(),
        "CSV rows scanned"
    );
    Ok(Extraction { headers, pages, rows })
}

fn extract_row(
    line: usize,
    record: &StringRecord,
    columns: &ColumnSelection,
    rows: &mut RowStats,
) -> Option<PageRecord> {
    let url = record.get(columns.url).unwrap_or("");
    if url.is_empty() {
        rows.skipped_missing_url += 1;
        return None;
    }

    let Some(cleaned) = record.get(columns.traffic).and_then(clean_traffic_text) else {
        rows.skipped_missing_traffic += 1;
        return None;
    };
    let Some(traffic) = parse_traffic(&cleaned) else {
        debug!(row = line, value = %cleaned, "skipping row with non-numeric traffic");
        rows.skipped_invalid_traffic += 1;
        return None;
    };

    let top_keyword = record.get(columns.keyword).map(str::to_string);

    Some(PageRecord {
        url: url.to_string(),
        traffic,
        top_keyword,
    })
}

/// Decode and extract one uploaded file using the run's configuration.
pub fn load_pages(bytes: &[u8], config: &ReportConfig) -> Result<(Vec<PageRecord>, LoadReport)> {
    let decoded = decode(bytes, &config.encodings)?;
    let extraction = extract(&decoded.text, &config.columns, &config.column_table)?;
    if extraction.pages.is_empty() {
        warn!(
            total = extraction.rows.total_rows,
            "CSV file produced no usable rows"
        );
    }
    let report = LoadReport {
        encoding: decoded.encoding,
        headers: extraction.headers,
        rows: extraction.rows,
    };
    Ok((extraction.pages, report))
}
