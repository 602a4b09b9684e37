use thiserror::Error;

/// Rejected calculator input. `field` is whatever name the caller gave the
/// input: a CLI flag, a JSON key, or a config path.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },

    #[error("{field} must be >= 0")]
    Negative { field: &'static str },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
    },

    #[error("{field} is required when {toggle} is set")]
    MissingMortgageField {
        field: &'static str,
        toggle: &'static str,
    },

    #[error("{field} must be > -100")]
    RateBelowFloor { field: &'static str },

    #[error("Invalid request payload: {0}")]
    Payload(String),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to flush CSV buffer: {0}")]
    Flush(#[source] std::io::Error),

    #[error("CSV output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

#[derive(Debug, Error)]
pub enum CalculateError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("failed to serialize result: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to format report")]
    Report(#[from] std::fmt::Error),
}
