// Error taxonomy for CSV ingestion and reconciliation.
//
// The first three variants are caused by the uploaded files themselves and
// should be reported back to whoever supplied them. The remaining variants
// wrap infrastructure failures.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    /// None of the candidate encodings decoded the file without errors.
    #[error(
        "CSV text encoding not recognised (tried: {}); re-export the file as UTF-8 or Shift-JIS",
        .tried.join(", ")
    )]
    Encoding { tried: Vec<String> },

    /// One or more required columns could not be resolved from the header row.
    #[error(
        "could not determine required CSV columns: {} (headers: {:?}); pass explicit column names",
        .missing.join(", "),
        .headers
    )]
    MissingColumns {
        missing: Vec<String>,
        headers: Vec<String>,
    },

    /// Both periods produced zero usable rows.
    #[error("no usable rows in either CSV file; check the column names and contents")]
    EmptyDataset,

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReportError {
    /// `true` when the error was caused by the input files rather than the
    /// environment.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ReportError::Encoding { .. }
                | ReportError::MissingColumns { .. }
                | ReportError::EmptyDataset
        )
    }

    pub fn status_code(&self) -> u16 {
        if self.is_input_error() {
            400
        } else {
            500
        }
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
