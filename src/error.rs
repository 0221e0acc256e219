use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Missing required column '{0}'")]
    MissingColumn(String),

    #[error("Malformed row at line {line}: column '{column}' has invalid value '{value}'")]
    MalformedRow {
        line: usize,
        column: String,
        value: String,
    },

    #[error("Reference data error: {0}")]
    ReferenceData(String),
}

impl From<figment::Error> for PipelineError {
    fn from(e: figment::Error) -> Self {
        PipelineError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
