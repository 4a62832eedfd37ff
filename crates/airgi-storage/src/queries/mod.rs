// SPDX-FileCopyrightText: 2026 AIRGI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules, one per collection.

pub mod incidents;
pub mod users;
