// SPDX-FileCopyrightText: 2026 AIRGI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the AIRGI incident intake.

use thiserror::Error;

use crate::types::AttachmentRejection;

/// The primary error type used across all AIRGI adapter traits and core operations.
#[derive(Debug, Error)]
pub enum AirgiError {
    /// Configuration errors (invalid TOML, missing credentials, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Raw storage backend errors (connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// No usable assistant session could be opened (missing credentials,
    /// service disabled). Not retried without reconfiguration.
    #[error("assistant unavailable: {0}")]
    AssistantUnavailable(String),

    /// Sending a turn or consuming its fragment sequence failed.
    #[error("assistant error: {message}")]
    Assistant {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// One or more offered attachments failed the type or size check.
    #[error("{}", format_rejections(.0))]
    Validation(Vec<AttachmentRejection>),

    /// A persistence write or its mandatory re-read failed.
    #[error("persistence error: {message}")]
    Persistence {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The controller was asked to do something its current state does not allow.
    #[error("cannot {operation} while {state}")]
    InvalidState {
        state: String,
        operation: &'static str,
    },

    /// A send carried neither text nor attachments.
    #[error("nothing to send: the turn has no text and no attachments")]
    EmptyTurn,

    /// A stored timestamp had a shape the timestamp adapter does not recognize.
    #[error("unrecognized timestamp: {0}")]
    Timestamp(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Operation was cancelled through its cancellation token.
    #[error("operation cancelled")]
    Cancelled,

    /// A keyed record does not exist.
    #[error("{collection} record `{id}` not found")]
    NotFound {
        collection: &'static str,
        id: String,
    },

    /// The signed-in identity may not perform the operation.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AirgiError {
    /// Wraps any error as a [`AirgiError::Persistence`] with context.
    pub fn persistence(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        AirgiError::Persistence {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Wraps any error as an [`AirgiError::Assistant`] communication failure.
    pub fn assistant(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        AirgiError::Assistant {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

/// Renders all rejections as one combined, line-separated message.
fn format_rejections(rejections: &[AttachmentRejection]) -> String {
    rejections
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RejectionReason;

    #[test]
    fn validation_error_combines_every_rejection() {
        let err = AirgiError::Validation(vec![
            AttachmentRejection {
                name: "malware.exe".into(),
                reason: RejectionReason::DisallowedType("application/x-msdownload".into()),
            },
            AttachmentRejection {
                name: "huge.png".into(),
                reason: RejectionReason::TooLarge {
                    size: 6 * 1024 * 1024,
                    max: 5 * 1024 * 1024,
                },
            },
        ]);
        let msg = err.to_string();
        assert_eq!(msg.lines().count(), 2);
        assert!(msg.contains("malware.exe"));
        assert!(msg.contains("huge.png"));
    }

    #[test]
    fn persistence_helper_keeps_source() {
        let err = AirgiError::persistence("re-read failed", std::io::Error::other("disk"));
        match err {
            AirgiError::Persistence { message, source } => {
                assert_eq!(message, "re-read failed");
                assert_eq!(source.map(|s| s.to_string()).as_deref(), Some("disk"));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }
}
