use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Unknown report: {0}")]
    UnknownReport(String),

    #[error("Report already registered: {0}")]
    DuplicateReport(String),

    #[error("Report '{report}' requires a {dimension} filter")]
    MissingFilter { report: String, dimension: String },

    #[error("Data source error: {0}")]
    DataSource(String),

    #[error("Schema mismatch in '{report}': {detail}")]
    SchemaMismatch { report: String, detail: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Settings error: {0}")]
    Settings(String),
}

impl From<rusqlite::Error> for ReportError {
    fn from(e: rusqlite::Error) -> Self {
        ReportError::DataSource(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
