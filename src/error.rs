use thiserror::Error;

#[derive(Error, Debug)]
pub enum PanelError {
    #[error("Schema error in source '{source_id}': missing required column '{column}'")]
    Schema { source_id: String, column: String },

    #[error("Parse error in source '{source_id}', column '{column}', row {row}: cannot interpret {value:?} ({reason})")]
    Parse {
        source_id: String,
        column: String,
        row: usize,
        value: String,
        reason: String,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV read failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("Unknown source: {0}")]
    UnknownSource(String),

    #[error("API error: {message}")]
    Api { message: String },
}

impl PanelError {
    pub fn schema(source_id: &str, column: &str) -> Self {
        PanelError::Schema {
            source_id: source_id.to_string(),
            column: column.to_string(),
        }
    }

    pub fn parse(
        source_id: &str,
        column: &str,
        row: usize,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        PanelError::Parse {
            source_id: source_id.to_string(),
            column: column.to_string(),
            row,
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn is_schema(&self) -> bool {
        matches!(self, PanelError::Schema { .. })
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, PanelError::Parse { .. })
    }
}

pub type Result<T> = std::result::Result<T, PanelError>;
