// SPDX-FileCopyrightText: 2026 AIRGI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authentication and profile provider.

use async_trait::async_trait;

use crate::error::AirgiError;
use crate::traits::adapter::PluginAdapter;
use crate::types::Identity;

/// Yields the signed-in identity that owns an intake session.
#[async_trait]
pub trait IdentityProvider: PluginAdapter {
    /// Returns the current identity, or [`AirgiError::Unauthorized`] when
    /// nobody is signed in.
    async fn current_identity(&self) -> Result<Identity, AirgiError>;
}
