use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Recipient @{0} is not in the directory")]
    RecipientUnknown(String),
    #[error("Directory entry @{0} not found")]
    EntryNotFound(String),
    #[error("Record store error: {0}")]
    ExternalStore(String),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
