//! Best-effort bulk execution of independent single-item operations.
//!
//! Both entry points share the same outcome model: every input item ends
//! up in exactly one of `successful` or `failed`, and an error raised by
//! one item never aborts its siblings. The only errors that propagate out
//! of a bulk call are structural problems with the call itself (an
//! invalid concurrency cap) or cancellation of the surrounding future.

use std::future::Future;
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::Value;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use super::error::{BloomyError, Result};

/// One failed work item: the original position, the original input
/// (kept verbatim so the caller can retry it) and a human-readable error.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkFailure {
    pub index: usize,
    pub input_data: Value,
    pub error: String,
}

/// Aggregate outcome of one bulk call.
///
/// Successful entries intentionally carry no input index; callers that
/// need input-order correlation for successes must rely on a natural key
/// in the created record. Failures always carry their index.
#[derive(Debug)]
pub struct BulkResult<T> {
    pub successful: Vec<T>,
    pub failed: Vec<BulkFailure>,
}

impl<T> Default for BulkResult<T> {
    fn default() -> Self {
        Self {
            successful: Vec::new(),
            failed: Vec::new(),
        }
    }
}

impl<T> BulkResult<T> {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn success_count(&self) -> usize {
        self.successful.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failed.len()
    }
}

/// Structural pre-check applied before an item may consume a request.
///
/// Every required field must be present, non-null, and non-empty when it
/// is a string. The message names the first missing field.
pub fn validate_item(
    item: &Value,
    required_fields: &[&str],
) -> std::result::Result<(), String> {
    for field in required_fields {
        let missing = match item.get(field) {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.is_empty(),
            Some(_) => false,
        };
        if missing {
            return Err(format!("{field} is required"));
        }
    }
    Ok(())
}

/// Execute `op` for each item one at a time, in input order.
///
/// Per-item errors (validation or operation) become `failed` entries and
/// are never re-raised. Result ordering follows input order in this mode.
pub async fn execute_sequential<T, F, Fut>(
    items: Vec<Value>,
    required_fields: &[&str],
    op: F,
) -> BulkResult<T>
where
    F: Fn(Value) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let total = items.len();
    debug!("Sequential bulk execution started ({} items)", total);

    let mut result = BulkResult::default();

    for (index, item) in items.into_iter().enumerate() {
        if let Err(message) = validate_item(&item, required_fields) {
            warn!("Item {} rejected before dispatch: {}", index, message);
            result.failed.push(BulkFailure {
                index,
                input_data: item,
                error: message,
            });
            continue;
        }

        match op(item.clone()).await {
            Ok(created) => result.successful.push(created),
            Err(e) => {
                warn!("Item {} failed: {}", index, e);
                result.failed.push(BulkFailure {
                    index,
                    input_data: item,
                    error: e.to_string(),
                });
            }
        }
    }

    info!(
        "Sequential bulk complete: {}/{} succeeded, {} failed",
        result.success_count(),
        total,
        result.failure_count()
    );

    result
}

/// Execute `op` for all items with at most `max_concurrent` in flight.
///
/// All units are scheduled up front; a semaphore is the only throttle, so
/// a queued item starts as soon as any in-flight one finishes rather than
/// waiting for a fixed-size wave. Entries in `successful` and `failed`
/// are in completion order, not input order; use `BulkFailure::index` to
/// correlate failures back to inputs.
///
/// Fails fast with a configuration error when `max_concurrent` is zero,
/// before any item is dispatched. Dropping the returned future cancels
/// in-flight units at their next await point; no partial result is
/// produced in that case.
pub async fn execute_concurrent<T, F, Fut>(
    items: Vec<Value>,
    required_fields: &[&str],
    op: F,
    max_concurrent: usize,
) -> Result<BulkResult<T>>
where
    F: Fn(Value) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    if max_concurrent == 0 {
        return Err(BloomyError::Configuration(
            "max_concurrent must be at least 1".to_string(),
        ));
    }

    let total = items.len();
    debug!(
        "Concurrent bulk execution started ({} items, max_concurrent={})",
        total, max_concurrent
    );

    let semaphore = Arc::new(Semaphore::new(max_concurrent));
    let op = &op;

    let mut units: FuturesUnordered<_> = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let semaphore = Arc::clone(&semaphore);
            async move {
                // The permit is held for the whole unit; RAII release
                // covers every exit path.
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("bulk semaphore is never closed");

                if let Err(message) = validate_item(&item, required_fields) {
                    return Err(BulkFailure {
                        index,
                        input_data: item,
                        error: message,
                    });
                }

                match op(item.clone()).await {
                    Ok(created) => Ok(created),
                    Err(e) => Err(BulkFailure {
                        index,
                        input_data: item,
                        error: e.to_string(),
                    }),
                }
            }
        })
        .collect();

    let mut result = BulkResult::default();
    while let Some(outcome) = units.next().await {
        match outcome {
            Ok(created) => result.successful.push(created),
            Err(failure) => {
                warn!("Item {} failed: {}", failure.index, failure.error);
                result.failed.push(failure);
            }
        }
    }

    info!(
        "Concurrent bulk complete: {}/{} succeeded, {} failed",
        result.success_count(),
        total,
        result.failure_count()
    );

    Ok(result)
}
