//! Authentication resolver: lookup, credential validation, and the
//! identity-provider contract consumed by a session/guard layer.
//!
//! Each login attempt flows `lookup -> classify -> validate`; rejection at
//! any step yields "no login" with no distinguishing detail, so a caller
//! cannot tell a missing account from a bad password or a view-group
//! exclusion. No state is kept between attempts beyond the long-lived
//! directory session.

use crate::classify::classify;
use crate::client::{escape_filter, DirectoryClient};
use crate::config::DirectoryConfig;
use crate::principal::Principal;
use async_trait::async_trait;
use dirauth_core::{LoginCredentials, Result};
use std::sync::Arc;
use tracing::debug;

/// The pluggable identity-provider contract.
///
/// A session or guard layer talks to authentication exclusively through
/// these operations; [`AuthenticationResolver`] is the directory-backed
/// implementation.
#[async_trait]
pub trait IdentityProvider: Send {
    /// Retrieve a principal by its unique identifier (the DN).
    async fn find_by_id(&mut self, identifier: &str) -> Result<Option<Principal>>;

    /// Retrieve a principal by identifier and remember-token. Token storage
    /// lives outside this layer; the lookup is by identifier alone.
    async fn find_by_token(&mut self, identifier: &str, token: &str) -> Result<Option<Principal>>;

    /// Retrieve a principal matching the given credentials' username.
    async fn find_by_credentials(
        &mut self,
        credentials: &LoginCredentials,
    ) -> Result<Option<Principal>>;

    /// Validate credentials against a previously-retrieved principal.
    ///
    /// Failed validation is an expected outcome, never an error.
    async fn validate_credentials(
        &mut self,
        principal: Option<&Principal>,
        credentials: &LoginCredentials,
    ) -> bool;

    /// Returns true iff a principal is present and holds the elevated tier.
    fn is_admin(&self, principal: Option<&Principal>) -> bool;
}

/// Directory-backed authentication resolver.
pub struct AuthenticationResolver {
    config: Arc<DirectoryConfig>,
    client: DirectoryClient,
}

impl AuthenticationResolver {
    /// Connects to the configured directory server and binds the service
    /// account.
    ///
    /// # Errors
    ///
    /// Construction failures are fatal: [`dirauth_core::Error::ConnectionFailed`]
    /// or [`dirauth_core::Error::BindRejected`], with no retry at this layer.
    pub async fn connect(config: DirectoryConfig) -> Result<Self> {
        let config = Arc::new(config);
        let client = DirectoryClient::connect(config.clone()).await?;
        Ok(Self { config, client })
    }

    #[cfg(test)]
    pub(crate) fn with_client(config: DirectoryConfig, client: DirectoryClient) -> Self {
        Self {
            config: Arc::new(config),
            client,
        }
    }

    /// Resolves an upstream-asserted `DOMAIN\username` value into trusted
    /// credentials for a transparent login attempt.
    ///
    /// An absent or malformed value means no transparent login is available,
    /// not an error.
    #[must_use]
    pub fn transparent_login(remote_user: Option<&str>) -> Option<LoginCredentials> {
        remote_user.and_then(LoginCredentials::from_remote_user)
    }

    /// Releases the directory session. Idempotent.
    pub async fn close(&mut self) {
        self.client.close().await;
    }
}

#[async_trait]
impl IdentityProvider for AuthenticationResolver {
    async fn find_by_id(&mut self, identifier: &str) -> Result<Option<Principal>> {
        let Some(record) = self
            .client
            .read_by_dn(identifier, &self.config.attributes)
            .await?
        else {
            return Ok(None);
        };
        classify(&mut self.client, &self.config, &record).await
    }

    async fn find_by_token(&mut self, identifier: &str, _token: &str) -> Result<Option<Principal>> {
        self.find_by_id(identifier).await
    }

    async fn find_by_credentials(
        &mut self,
        credentials: &LoginCredentials,
    ) -> Result<Option<Principal>> {
        let filter = format!("(samaccountname={})", escape_filter(credentials.username()));
        let Some(record) = self
            .client
            .search_by_filter(
                self.config.base_dn.as_str(),
                &filter,
                &self.config.attributes,
            )
            .await?
        else {
            debug!(username = credentials.username(), "no matching principal");
            return Ok(None);
        };
        classify(&mut self.client, &self.config, &record).await
    }

    async fn validate_credentials(
        &mut self,
        principal: Option<&Principal>,
        credentials: &LoginCredentials,
    ) -> bool {
        let Some(principal) = principal else {
            return false;
        };
        if credentials.is_trusted() {
            return true;
        }
        let Some(password) = credentials.password() else {
            return false;
        };
        if password.is_empty() {
            return false;
        }
        self.client.bind_as(&principal.id, password).await
    }

    fn is_admin(&self, principal: Option<&Principal>) -> bool {
        principal.is_some_and(Principal::is_admin)
    }
}
