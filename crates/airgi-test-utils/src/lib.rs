// SPDX-FileCopyrightText: 2026 AIRGI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for AIRGI integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockAssistant`] - Mock assistant with scripted fragment sequences
//! - [`MemoryIncidentStore`] - In-memory store with a simulated server clock

pub mod harness;
pub mod memory_store;
pub mod mock_assistant;

pub use harness::{TestHarness, default_reporter, full_summary_reply};
pub use memory_store::MemoryIncidentStore;
pub use mock_assistant::{MockAssistant, RecordedTurn, ScriptedReply};
