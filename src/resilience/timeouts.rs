//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap socket calls with a deadline
//! - Enforce connect timeout, read timeout, write timeout
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from other errors
//! - Timed-out upstream exchanges answer 504 Gateway Timeout

use std::future::Future;
use std::time::Duration;

use crate::error::{ProxyError, Result};

/// Run `future`, failing with [`ProxyError::Timeout`] once `after` elapses.
pub async fn with_deadline<F, T>(operation: &'static str, after: Duration, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(after, future).await {
        Ok(result) => result,
        Err(_) => Err(ProxyError::Timeout { operation, after }),
    }
}
