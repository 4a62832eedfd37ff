// SPDX-FileCopyrightText: 2026 AIRGI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity taken from the `[identity]` config section.

use async_trait::async_trait;

use airgi_config::model::IdentityConfig;
use airgi_core::{
    AdapterType, AirgiError, HealthStatus, Identity, IdentityProvider, PluginAdapter, UserId,
};

/// Signs in as the user named in config. Missing `user_id` means signed out.
pub struct ConfigIdentityProvider {
    config: IdentityConfig,
}

impl ConfigIdentityProvider {
    pub fn new(config: IdentityConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl PluginAdapter for ConfigIdentityProvider {
    fn name(&self) -> &str {
        "config-identity"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Identity
    }

    async fn health_check(&self) -> Result<HealthStatus, AirgiError> {
        Ok(match self.config.user_id {
            Some(_) => HealthStatus::Healthy,
            None => HealthStatus::Degraded("no identity.user_id configured".into()),
        })
    }

    async fn shutdown(&self) -> Result<(), AirgiError> {
        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for ConfigIdentityProvider {
    async fn current_identity(&self) -> Result<Identity, AirgiError> {
        let id = self
            .config
            .user_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                AirgiError::Unauthorized(
                    "not signed in: set identity.user_id in airgi.toml or AIRGI_IDENTITY_USER_ID"
                        .into(),
                )
            })?;
        let email = self.config.email.clone().unwrap_or_default();
        let name = self
            .config
            .name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .or_else(|| email.split('@').next().filter(|p| !p.is_empty()).map(String::from))
            .unwrap_or_else(|| id.to_string());
        Ok(Identity {
            id: UserId(id.to_string()),
            name,
            email,
            role: self.config.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use airgi_core::Role;

    #[tokio::test]
    async fn missing_user_id_is_unauthorized() {
        let provider = ConfigIdentityProvider::new(IdentityConfig::default());
        assert!(matches!(
            provider.current_identity().await,
            Err(AirgiError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn name_falls_back_to_email_then_id() {
        let provider = ConfigIdentityProvider::new(IdentityConfig {
            user_id: Some("u-7".into()),
            name: None,
            email: Some("luis@example.com".into()),
            role: Role::Admin,
        });
        let identity = provider.current_identity().await.unwrap();
        assert_eq!(identity.name, "luis");
        assert!(identity.is_admin());

        let bare = ConfigIdentityProvider::new(IdentityConfig {
            user_id: Some("u-8".into()),
            ..IdentityConfig::default()
        });
        assert_eq!(bare.current_identity().await.unwrap().name, "u-8");
    }
}
