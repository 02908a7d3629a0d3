//! Network utilities for crab-party
//!
//! This module provides retry mechanisms for actions sent to devices on
//! the local network.

use crate::config::MAX_NETWORK_RETRIES;
use log::{debug, warn};
use std::time::Duration;
use tokio::time::sleep;

/// Retries an async operation with exponential backoff
///
/// # Arguments
/// * `operation` - The async operation to retry
/// * `operation_name` - Name of the operation for logging
///
/// # Returns
/// Returns the result of the operation or the last error if all retries fail
pub async fn retry_with_backoff<F, Fut, T, E>(
    mut operation: F,
    operation_name: &str,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    debug!("{operation_name} succeeded on attempt {attempt}");
                }
                return Ok(result);
            }
            Err(error) if attempt < MAX_NETWORK_RETRIES => {
                let delay = Duration::from_millis(100 * (1 << (attempt - 1)));
                warn!("{operation_name} failed on attempt {attempt} ({error}), retrying in {delay:?}");
                sleep(delay).await;
                attempt += 1;
            }
            Err(error) => {
                warn!("{operation_name} failed on final attempt {attempt} ({error})");
                return Err(error);
            }
        }
    }
}
