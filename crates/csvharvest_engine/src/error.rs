use thiserror::Error;

use crate::PersistError;

/// A failed call against the catalog API.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("query {uri} returned HTTP status code: {status}")]
    Status { uri: String, status: u16 },
    #[error("query {uri} failed: {message}")]
    Transport { uri: String, message: String },
    #[error("query {uri} has no response to parse")]
    NoResponse { uri: String },
    #[error("query {uri} returned malformed JSON: {message}")]
    Json { uri: String, message: String },
}

impl QueryError {
    pub fn uri(&self) -> &str {
        match self {
            QueryError::Status { uri, .. }
            | QueryError::Transport { uri, .. }
            | QueryError::NoResponse { uri }
            | QueryError::Json { uri, .. } => uri,
        }
    }
}

/// Navigation is impossible from the current query. Not a network failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NavigationError {
    #[error("query {uri} has no parsed data to navigate from")]
    NotParsed { uri: String },
    #[error("query {uri} provides an unusable next_page link {link:?}: {message}")]
    InvalidLink {
        uri: String,
        link: String,
        message: String,
    },
}

/// Why a resource could not be sniffed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SniffError {
    /// The resource URL could not be reached or answered with a bad status.
    #[error("resource {url} unreachable: {message}")]
    Resource { url: String, message: String },
    /// The content is not decodable as delimited text.
    #[error("resource {url} is not readable as CSV: {message}")]
    Format { url: String, message: String },
}

impl SniffError {
    pub(crate) fn resource(url: &str, message: impl Into<String>) -> Self {
        SniffError::Resource {
            url: url.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn format(url: &str, message: impl Into<String>) -> Self {
        SniffError::Format {
            url: url.to_string(),
            message: message.into(),
        }
    }
}

/// Failures that stop a whole run; per-job errors never end up here.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to build http client: {0}")]
    Client(String),
    #[error("invalid api base url {url:?}: {message}")]
    ApiBase { url: String, message: String },
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error(transparent)]
    Persist(#[from] PersistError),
    #[error("failed to read input {path}: {message}")]
    Input { path: String, message: String },
}
