//! Service-account and login credential types.
//!
//! [`BindCredentials`] identifies the service account used to open the
//! directory session. [`LoginCredentials`] carries one login attempt, either
//! password-based or asserted by a trusted upstream transport (NTLM/SSO).

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

/// Separator between domain and username in upstream-asserted logins
/// (`DOMAIN\username`).
const DOMAIN_SEPARATOR: char = '\\';

/// Credentials for the directory service account.
///
/// The secret is never logged (`Debug` prints a redacted placeholder) and is
/// zeroized on drop.
#[derive(Debug, Deserialize)]
pub struct BindCredentials {
    /// Service account name (the `sAMAccountName`, without domain suffix).
    account: String,
    /// Service account secret.
    password: SecretString,
}

impl BindCredentials {
    /// Create new service-account credentials.
    #[must_use]
    pub fn new(account: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            password: SecretString::from(password.into()),
        }
    }

    /// The service account name.
    #[must_use]
    pub fn account(&self) -> &str {
        &self.account
    }

    /// The service account secret.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }

    /// The user principal name used for the service bind
    /// (`account@domain`, the form Active Directory accepts for binds).
    #[must_use]
    pub fn principal_name(&self, domain: &str) -> String {
        format!("{}@{domain}", self.account)
    }
}

/// One login attempt.
#[derive(Debug)]
pub struct LoginCredentials {
    username: String,
    password: Option<SecretString>,
    trusted: bool,
}

impl LoginCredentials {
    /// Password-based credentials.
    #[must_use]
    pub fn with_password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: Some(SecretString::from(password.into())),
            trusted: false,
        }
    }

    /// Credentials asserted by a trusted upstream transport; no secret is
    /// carried and none will be checked.
    #[must_use]
    pub fn pre_authenticated(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: None,
            trusted: true,
        }
    }

    /// Parses an upstream-supplied `DOMAIN\username` value into trusted
    /// credentials.
    ///
    /// Requires exactly two non-empty segments; the username is lower-cased.
    /// Returns `None` for anything else — a malformed value means "no
    /// transparent login available", not an error.
    #[must_use]
    pub fn from_remote_user(value: &str) -> Option<Self> {
        let mut segments = value.split(DOMAIN_SEPARATOR);
        let domain = segments.next()?;
        let username = segments.next()?;
        if segments.next().is_some() || domain.is_empty() || username.is_empty() {
            return None;
        }
        Some(Self::pre_authenticated(username.to_lowercase()))
    }

    /// The login name.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The supplied secret, if any.
    #[must_use]
    pub fn password(&self) -> Option<&str> {
        self.password.as_ref().map(|secret| secret.expose_secret())
    }

    /// True when the identity was asserted by a trusted upstream transport.
    #[must_use]
    pub const fn is_trusted(&self) -> bool {
        self.trusted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_principal_name() {
        let creds = BindCredentials::new("svc-auth", "hunter2");
        assert_eq!(creds.account(), "svc-auth");
        assert_eq!(creds.password(), "hunter2");
        assert_eq!(creds.principal_name("corp.example.com"), "svc-auth@corp.example.com");
    }

    #[test]
    fn bind_debug_redacts_password() {
        let creds = BindCredentials::new("svc-auth", "hunter2");
        let debug = format!("{creds:?}");
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn remote_user_parses_domain_and_username() {
        let creds = LoginCredentials::from_remote_user("CORP\\JSmith").unwrap();
        assert_eq!(creds.username(), "jsmith");
        assert!(creds.is_trusted());
        assert!(creds.password().is_none());
    }

    #[test]
    fn remote_user_without_separator_is_rejected() {
        assert!(LoginCredentials::from_remote_user("jsmith").is_none());
    }

    #[test]
    fn remote_user_with_extra_segments_is_rejected() {
        assert!(LoginCredentials::from_remote_user("A\\B\\C").is_none());
    }

    #[test]
    fn remote_user_with_empty_segments_is_rejected() {
        assert!(LoginCredentials::from_remote_user("CORP\\").is_none());
        assert!(LoginCredentials::from_remote_user("\\jsmith").is_none());
    }

    #[test]
    fn password_credentials_are_not_trusted() {
        let creds = LoginCredentials::with_password("jsmith", "secret");
        assert!(!creds.is_trusted());
        assert_eq!(creds.password(), Some("secret"));
    }
}
