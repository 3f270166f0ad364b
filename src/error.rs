use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum HarvestError {
    #[error("unable to resolve home directory")]
    HomeDir,

    #[error("index fetch failed: {0}")]
    IndexFetch(String),

    #[error("failed to parse index document: {0}")]
    IndexParse(String),

    #[error("invalid source url: {0}")]
    InvalidUrl(String),

    #[error("http request failed: {0}")]
    Http(String),

    #[error("server returned status {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("archive error: {0}")]
    Archive(String),
}
