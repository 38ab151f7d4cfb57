use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("could not decode API response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("request timeout for {0}")]
    Timeout(String),

    #[error("not authorized to perform {0}")]
    Unauthorized(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("no match for {0}")]
    NotFound(String),

    #[error("more than one match for {0}")]
    AmbiguousMatch(String),

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
