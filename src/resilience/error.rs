//! Errors returned by [`CircuitBreaker::execute`](crate::CircuitBreaker::execute).

use thiserror::Error;

/// Either the breaker rejected the call or the call itself failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BreakerError<E> {
    /// The circuit is open (or half-open with its probe budget spent).
    /// The wrapped call was not invoked.
    #[error("circuit breaker is open")]
    Open,

    /// The wrapped call's own error, passed through unchanged.
    #[error("{0}")]
    Call(E),
}

impl<E> BreakerError<E> {
    /// True if this is the fast-fail rejection.
    pub fn is_open(&self) -> bool {
        matches!(self, BreakerError::Open)
    }

    /// The wrapped call's error, if the call ran.
    pub fn into_call_error(self) -> Option<E> {
        match self {
            BreakerError::Open => None,
            BreakerError::Call(e) => Some(e),
        }
    }
}

/// Result type for calls made through a breaker.
pub type BreakerResult<T, E> = Result<T, BreakerError<E>>;
