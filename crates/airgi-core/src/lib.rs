// SPDX-FileCopyrightText: 2026 AIRGI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the AIRGI incident intake.
//!
//! This crate provides the error type, the domain types shared by every
//! stage of the intake pipeline (turns, attachments, structured records,
//! persisted incidents), the storage timestamp adapter, and the adapter
//! traits implemented by the assistant, store, and identity backends.

pub mod error;
pub mod time;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::AirgiError;
pub use time::{normalize_timestamp, RawTimestamp};
pub use types::{
    AdapterType, Attachment, AttachmentId, AttachmentRejection, ChatTurn, HealthStatus, Identity,
    IncidentChange, IncidentId, IncidentStatus, IncidentWrite, PersistedIncident, RejectionReason,
    Role, Sender, StoredTurn, StructuredRecord, UserId,
};

// Re-export all adapter traits at crate root.
pub use traits::{
    AssistantAdapter, ContextRole, ContextTurn, DialogueSession, FragmentStream, IdentityProvider,
    IncidentStore, OutgoingTurn, PluginAdapter,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn airgi_error_has_all_variants() {
        let _config = AirgiError::Config("test".into());
        let _storage = AirgiError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _unavailable = AirgiError::AssistantUnavailable("no key".into());
        let _assistant = AirgiError::Assistant {
            message: "test".into(),
            source: None,
        };
        let _validation = AirgiError::Validation(Vec::new());
        let _persistence = AirgiError::Persistence {
            message: "test".into(),
            source: None,
        };
        let _state = AirgiError::InvalidState {
            state: "saving".into(),
            operation: "send",
        };
        let _empty = AirgiError::EmptyTurn;
        let _ts = AirgiError::Timestamp("bogus".into());
        let _timeout = AirgiError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        let _cancelled = AirgiError::Cancelled;
        let _not_found = AirgiError::NotFound {
            collection: "incidents",
            id: "x".into(),
        };
        let _unauthorized = AirgiError::Unauthorized("nope".into());
        let _internal = AirgiError::Internal("test".into());
    }

    #[test]
    fn all_trait_modules_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_assistant_adapter<T: AssistantAdapter>() {}
        fn _assert_incident_store<T: IncidentStore>() {}
        fn _assert_identity_provider<T: IdentityProvider>() {}
    }
}
