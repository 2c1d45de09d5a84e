use thiserror::Error;

/// Failure of a single upstream request; terminal for the invocation that
/// issued it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The upstream answered with a non-2xx status.
    #[error("Server returned error code {status}")]
    UpstreamStatus { status: u16 },
    /// The request never completed, or the body was not the expected JSON.
    #[error("Network or server error: {0}")]
    Transport(String),
    /// A built URL reached the length limit and was not sent.
    #[error("Too many genes requested ({length} of {limit} URL characters). Please try again with fewer genes")]
    RequestTooLarge { length: usize, limit: usize },
}

impl From<reqwest::Error> for QueryError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::UpstreamStatus {
                status: status.as_u16(),
            };
        }
        Self::Transport(err.to_string())
    }
}

pub type QueryResult<T> = Result<T, QueryError>;
