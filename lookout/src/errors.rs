use thiserror::Error;

#[derive(Error, Debug)]
pub enum WebDriverError {
    /// Network, connection or protocol-framing failure. Recoverable: the
    /// classifier folds this into "not observed" and the poll loop retries.
    #[error("Transport failure: {0}")]
    Transport(String),

    /// Well-formed protocol response saying the element or attribute does
    /// not exist. Retried like a transport failure.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Programmer error in an attached condition (e.g. an unparsable regex).
    /// Never retried; surfaces before any polling starts.
    #[error("Malformed condition: {0}")]
    MalformedCondition(String),

    /// The owning session is gone. Fatal for any in-flight assertion or
    /// action; bypasses the poll scheduler entirely.
    #[error("Session terminated: {0}")]
    SessionTerminated(String),

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl WebDriverError {
    /// Fatal errors propagate immediately instead of being absorbed into a
    /// poll loop.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            WebDriverError::MalformedCondition(_) | WebDriverError::SessionTerminated(_)
        )
    }
}
