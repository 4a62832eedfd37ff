// SPDX-FileCopyrightText: 2026 AIRGI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Intake pipeline for the AIRGI incident assistant.
//!
//! The [`ConversationController`] is the central coordinator that:
//! - Opens one assistant session per report and serializes its turns
//! - Collects typed or dictated text and attachments for each turn
//! - Parses the presented summary into a structured record
//! - Saves the confirmed draft through the [`Reconciler`]
//!
//! The [`IncidentDesk`] covers what happens to incidents afterwards.

pub mod attachments;
pub mod controller;
pub mod deadline;
pub mod desk;
pub mod draft;
pub mod extraction;
pub mod prompts;
pub mod reconcile;
pub mod speech;

pub use attachments::{AttachmentManager, AttachmentPolicy, OfferedFile};
pub use controller::{
    ConversationController, IntakeContext, IntakeSettings, IntakeState, TurnOutcome,
};
pub use desk::{IncidentDesk, IncidentFilter, Listing};
pub use draft::ConversationDraft;
pub use extraction::{ParseContext, parse_summary};
pub use reconcile::{Reconciler, Submission};
pub use speech::{Composer, SpeechCapability, SpeechEvent, SpeechInput};
