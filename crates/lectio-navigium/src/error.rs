use thiserror::Error;

#[derive(Debug, Error)]
pub enum NavigiumError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("invalid dictionary URL: {0}")]
    InvalidUrl(String),
}

pub type Result<T> = std::result::Result<T, NavigiumError>;
