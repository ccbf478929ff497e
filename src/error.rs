use thiserror::Error;

/// Errors surfaced by the parser and its retrieval collaborators.
#[derive(Error, Debug)]
pub enum RobotsError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("failed to retrieve {url}: {cause}")]
    RetrievalFailure { url: String, cause: RetrievalCause },

    #[error("invalid sitemap XML: {0}")]
    Sitemap(#[from] quick_xml::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Why a retrieval failed.
#[derive(Error, Debug)]
pub enum RetrievalCause {
    #[error("server responded with status {0}")]
    Status(u16),

    #[error("{0}")]
    Transport(#[from] reqwest::Error),
}

impl RobotsError {
    pub(crate) fn retrieval(url: &str, cause: impl Into<RetrievalCause>) -> Self {
        RobotsError::RetrievalFailure {
            url: url.to_string(),
            cause: cause.into(),
        }
    }

    /// HTTP status of a failed retrieval, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            RobotsError::RetrievalFailure {
                cause: RetrievalCause::Status(code),
                ..
            } => Some(*code),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, RobotsError>;
