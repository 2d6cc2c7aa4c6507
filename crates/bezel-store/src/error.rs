use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed result artifact: {0}")]
    Json(#[from] serde_json::Error),

    #[error("bulk replace requires a JSON array")]
    NotAnArray,
}
