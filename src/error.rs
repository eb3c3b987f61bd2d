use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Malformed {kind} '{source_name}': {message}")]
    MalformedDocument {
        kind: &'static str,
        source_name: String,
        message: String,
    },

    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    #[error("Unsupported knowledge base snapshot version: {0}")]
    UnsupportedSnapshot(u32),

    #[error("Queue error: {message}")]
    Queue { message: String },

    #[error("Notification error: {message}")]
    Notify { message: String },
}

impl CatalogError {
    pub fn malformed(kind: &'static str, source_name: impl Into<String>, message: impl Into<String>) -> Self {
        CatalogError::MalformedDocument {
            kind,
            source_name: source_name.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
