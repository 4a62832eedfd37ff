// SPDX-FileCopyrightText: 2026 AIRGI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the external collaborators of the intake.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod assistant;
pub mod identity;
pub mod store;

pub use adapter::PluginAdapter;
pub use assistant::{
    AssistantAdapter, ContextRole, ContextTurn, DialogueSession, FragmentStream, OutgoingTurn,
};
pub use identity::IdentityProvider;
pub use store::IncidentStore;
