use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during a cookbook import
#[derive(Error, Debug)]
pub enum ImportError {
    /// Failed to read a manifest, recipe document or tag table
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An amount token that no rule knows how to turn into a number
    #[error("Invalid amount '{raw}' (fix the document or extend the rule set)")]
    InvalidAmount { raw: String },

    /// Recipe document has no title command
    #[error("Recipe document {0} has no title")]
    MissingTitle(String),

    /// Two documents in one run share a title
    #[error("Duplicate recipe title: {0}")]
    DuplicateTitle(String),

    /// Failed to read the tag table
    #[error("Tag table error: {0}")]
    TagError(#[from] csv::Error),

    /// Tag table lacks the column holding recipe titles
    #[error("Tag table has no '{0}' column")]
    MissingTagColumn(String),

    /// Store operation failed
    #[error("Store error: {0}")]
    StoreError(#[from] rusqlite::Error),

    /// Target table is already present in the store
    #[error("Table '{0}' already exists, refusing to overwrite")]
    TableExists(String),

    /// Builder configuration error
    #[error("Builder error: {0}")]
    BuilderError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),
}

impl ImportError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ImportError::Io {
            path: path.into(),
            source,
        }
    }
}
