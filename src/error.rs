use thiserror::Error;

/// Errors surfaced by the task store, the adapters and the CLI.
///
/// Persistence write failures and AI failures never reach callers through
/// this type; they are logged and degraded at the component boundary.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{kind} task '{id}' not found")]
    TaskNotFound { kind: &'static str, id: String },

    #[error("id prefix '{prefix}' matches {count} {kind} tasks")]
    AmbiguousId {
        kind: &'static str,
        prefix: String,
        count: usize,
    },

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl Error {
    pub fn project_not_found(id: impl Into<String>) -> Self {
        Error::TaskNotFound {
            kind: "project",
            id: id.into(),
        }
    }

    pub fn daily_not_found(id: impl Into<String>) -> Self {
        Error::TaskNotFound {
            kind: "daily",
            id: id.into(),
        }
    }

    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Error::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
