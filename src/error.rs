use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to scrape {url}: {reason}")]
    Scrape { url: String, reason: String },

    #[error("{0} not found")]
    NotFound(String),

    #[error("invalid timestamp {value:?}: {source}")]
    InvalidTimestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
