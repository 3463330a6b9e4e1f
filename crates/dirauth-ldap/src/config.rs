//! Configuration for the directory authentication engine.
//!
//! This mirrors the configuration a deployment supplies: where the domain
//! controller lives, which service account opens the session, and which
//! groups and accounts gate baseline and elevated access.

use crate::dn::{DistinguishedName, Rdn};
use dirauth_core::{BindCredentials, Error, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;
use validator::Validate;

/// Default connection timeout (seconds).
pub const DEFAULT_CONNECTION_TIMEOUT_SECS: u64 = 10;
/// Default operation timeout (seconds).
pub const DEFAULT_OPERATION_TIMEOUT_SECS: u64 = 10;
/// Default cap on group-nesting depth during membership walks.
pub const DEFAULT_MAX_GROUP_DEPTH: usize = 25;

/// Configuration for connecting to and authorizing against a directory
/// server.
///
/// Immutable once handed to a client: builder-style `with_*` overrides are
/// applied before use and the client takes ownership.
#[derive(Debug, Deserialize, Validate)]
pub struct DirectoryConfig {
    /// Directory endpoint, `ldap://host[:port]` or `ldaps://host[:port]`.
    #[validate(url)]
    pub url: String,

    /// Service account used for the initial bind.
    pub credentials: BindCredentials,

    /// Domain suffix appended to the service account for the bind
    /// (`account@domain`).
    pub domain: String,

    /// Base distinguished name for subtree searches.
    pub base_dn: DistinguishedName,

    /// Base distinguished name under which group entries live. Falls back
    /// to `base_dn` when absent.
    #[serde(default)]
    pub group_base_dn: Option<DistinguishedName>,

    /// Attributes fetched for each principal record.
    #[serde(default = "default_attributes")]
    pub attributes: Vec<String>,

    /// Group names whose membership grants baseline (view) access. When
    /// non-empty, membership in at least one becomes a requirement.
    #[serde(default)]
    pub view_groups: Vec<String>,

    /// Group names whose membership grants elevated access.
    #[serde(default)]
    pub admin_groups: Vec<String>,

    /// Account names granted elevated access individually, independent of
    /// group structure.
    #[serde(default)]
    pub owners: Vec<String>,

    /// Whether to verify TLS certificates.
    #[serde(default = "default_tls_verify")]
    pub tls_verify: bool,

    /// Optional path to a custom CA certificate.
    #[serde(default)]
    pub tls_ca_cert: Option<PathBuf>,

    /// Connection timeout in seconds.
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_connection_timeout_secs")]
    pub connection_timeout_secs: u64,

    /// Per-operation timeout in seconds.
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_operation_timeout_secs")]
    pub operation_timeout_secs: u64,

    /// Cap on group-nesting depth during membership walks.
    #[validate(range(min = 1, max = 100))]
    #[serde(default = "default_max_group_depth")]
    pub max_group_depth: usize,
}

fn default_attributes() -> Vec<String> {
    ["samaccountname", "displayname", "mail", "memberof"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

const fn default_tls_verify() -> bool {
    true
}

const fn default_connection_timeout_secs() -> u64 {
    DEFAULT_CONNECTION_TIMEOUT_SECS
}

const fn default_operation_timeout_secs() -> u64 {
    DEFAULT_OPERATION_TIMEOUT_SECS
}

const fn default_max_group_depth() -> usize {
    DEFAULT_MAX_GROUP_DEPTH
}

impl DirectoryConfig {
    /// Creates a new configuration with required parameters and defaults
    /// everywhere else.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the URL is invalid or validation
    /// fails.
    pub fn new(
        url: impl Into<String>,
        credentials: BindCredentials,
        domain: impl Into<String>,
        base_dn: DistinguishedName,
    ) -> Result<Self> {
        let url_string = url.into();
        Url::parse(&url_string)?;

        let config = Self {
            url: url_string,
            credentials,
            domain: domain.into(),
            base_dn,
            group_base_dn: None,
            attributes: default_attributes(),
            view_groups: Vec::new(),
            admin_groups: Vec::new(),
            owners: Vec::new(),
            tls_verify: default_tls_verify(),
            tls_ca_cert: None,
            connection_timeout_secs: default_connection_timeout_secs(),
            operation_timeout_secs: default_operation_timeout_secs(),
            max_group_depth: default_max_group_depth(),
        };

        config
            .validate()
            .map_err(|e| Error::ConfigError(format!("invalid configuration: {e}")))?;

        Ok(config)
    }

    /// Returns the group search base, falling back to the base DN.
    #[must_use]
    pub fn group_base_dn(&self) -> &DistinguishedName {
        self.group_base_dn.as_ref().unwrap_or(&self.base_dn)
    }

    /// Builds the distinguished name for a configured group name:
    /// `CN=<name>,<group base>`.
    #[must_use]
    pub fn group_dn(&self, name: &str) -> DistinguishedName {
        self.group_base_dn().clone().with_prefix(Rdn::new("CN", name))
    }

    /// Returns the connection timeout duration.
    #[must_use]
    pub const fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }

    /// Returns the per-operation timeout duration.
    #[must_use]
    pub const fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }

    /// Overrides the group search base.
    #[must_use]
    pub fn with_group_base_dn(mut self, dn: DistinguishedName) -> Self {
        self.group_base_dn = Some(dn);
        self
    }

    /// Overrides the fetched attribute list.
    #[must_use]
    pub fn with_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = attributes.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the view-group names.
    #[must_use]
    pub fn with_view_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.view_groups = groups.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the admin-group names.
    #[must_use]
    pub fn with_admin_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.admin_groups = groups.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the individually-elevated owner account names.
    #[must_use]
    pub fn with_owners<I, S>(mut self, owners: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.owners = owners.into_iter().map(Into::into).collect();
        self
    }

    /// Enables or disables TLS certificate verification.
    #[must_use]
    pub const fn with_tls_verification(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Sets a custom CA certificate path.
    #[must_use]
    pub fn with_tls_ca_cert(mut self, path: PathBuf) -> Self {
        self.tls_ca_cert = Some(path);
        self
    }

    /// Overrides the connection timeout in seconds.
    #[must_use]
    pub const fn with_connection_timeout_secs(mut self, seconds: u64) -> Self {
        self.connection_timeout_secs = seconds;
        self
    }

    /// Overrides the per-operation timeout in seconds.
    #[must_use]
    pub const fn with_operation_timeout_secs(mut self, seconds: u64) -> Self {
        self.operation_timeout_secs = seconds;
        self
    }

    /// Overrides the group-nesting depth cap.
    #[must_use]
    pub const fn with_max_group_depth(mut self, depth: usize) -> Self {
        self.max_group_depth = depth;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> DirectoryConfig {
        DirectoryConfig::new(
            "ldap://dc01.corp.example.com",
            BindCredentials::new("svc-auth", "secret"),
            "corp.example.com",
            DistinguishedName::parse("DC=corp,DC=example,DC=com").unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn group_base_falls_back_to_base_dn() {
        let config = sample_config();
        assert_eq!(config.group_base_dn().as_str(), "DC=corp,DC=example,DC=com");
    }

    #[test]
    fn group_dn_is_built_from_group_base() {
        let config = sample_config().with_group_base_dn(
            DistinguishedName::parse("OU=Groups,DC=corp,DC=example,DC=com").unwrap(),
        );
        assert_eq!(
            config.group_dn("Staff").as_str(),
            "CN=Staff,OU=Groups,DC=corp,DC=example,DC=com"
        );
    }

    #[test]
    fn builder_overrides() {
        let config = sample_config()
            .with_view_groups(["Staff"])
            .with_admin_groups(["IT"])
            .with_owners(["jsmith"])
            .with_attributes(["samaccountname", "memberof"])
            .with_connection_timeout_secs(20)
            .with_operation_timeout_secs(30)
            .with_max_group_depth(5)
            .with_tls_verification(false);

        assert_eq!(config.view_groups, vec!["Staff"]);
        assert_eq!(config.admin_groups, vec!["IT"]);
        assert_eq!(config.owners, vec!["jsmith"]);
        assert_eq!(config.attributes.len(), 2);
        assert_eq!(config.connection_timeout(), Duration::from_secs(20));
        assert_eq!(config.operation_timeout(), Duration::from_secs(30));
        assert_eq!(config.max_group_depth, 5);
        assert!(!config.tls_verify);
    }

    #[test]
    fn invalid_url_is_rejected() {
        let result = DirectoryConfig::new(
            "not a url",
            BindCredentials::new("svc-auth", "secret"),
            "corp.example.com",
            DistinguishedName::parse("DC=corp").unwrap(),
        );
        assert!(matches!(result, Err(Error::ConfigError(_))));
    }
}
