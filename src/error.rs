use thiserror::Error;

#[derive(Error, Debug)]
pub enum FdError {
    #[error("source read error: {0}")]
    SourceRead(String),

    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("conversion error: column '{column}': cannot represent {value:?} as {target}")]
    Conversion {
        column: String,
        value: String,
        target: String,
    },

    #[error("unknown dataset: {0}")]
    UnknownDataset(String),

    #[error("directory error: {0}")]
    Directory(String),

    #[error("driver state error: {0}")]
    State(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FdError>;
