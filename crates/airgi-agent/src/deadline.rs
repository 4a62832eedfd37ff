// SPDX-FileCopyrightText: 2026 AIRGI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deadline and cancellation bounds for suspension points.

use std::future::Future;
use std::time::Duration;

use airgi_core::AirgiError;
use tokio_util::sync::CancellationToken;

/// Runs `fut` until it completes, `limit` elapses, or `cancel` fires.
///
/// Cancellation wins when both are ready at the same poll.
pub async fn bounded<T, F>(
    fut: F,
    limit: Duration,
    cancel: &CancellationToken,
) -> Result<T, AirgiError>
where
    F: Future<Output = Result<T, AirgiError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AirgiError::Cancelled),
        result = tokio::time::timeout(limit, fut) => match result {
            Ok(inner) => inner,
            Err(_elapsed) => Err(AirgiError::Timeout { duration: limit }),
        },
    }
}
