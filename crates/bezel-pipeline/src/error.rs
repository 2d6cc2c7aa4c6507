use thiserror::Error;

pub type Result<T> = std::result::Result<T, HarvestError>;

#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("invalid harvest request: {0}")]
    InvalidRequest(String),

    #[error("browser error: {0}")]
    Browser(#[from] bezel_browser::BrowserError),

    #[error("store error: {0}")]
    Store(#[from] bezel_store::StoreError),
}
