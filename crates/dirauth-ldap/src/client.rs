//! Directory client: one live LDAP session with lookup and bind primitives.
//!
//! The client owns a single protocol session for its whole lifetime, bound
//! as the service account at construction. All operations are blocking
//! network round trips from the caller's point of view and carry the
//! configured per-operation timeout; no retries happen at this layer.

use crate::config::DirectoryConfig;
use dirauth_core::{Error, Result};
use async_trait::async_trait;
use ldap3::{LdapConnAsync, LdapConnSettings, Scope, SearchEntry};
use native_tls::{Certificate, TlsConnector};
use std::collections::HashMap;
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Point lookups by DN match any object class.
const OBJECT_CLASS_ANY: &str = "(objectclass=*)";

/// Represents the search scope for LDAP queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    /// Base object only.
    Base,
    /// One level below the base.
    OneLevel,
    /// Entire subtree.
    Subtree,
}

impl From<SearchScope> for Scope {
    fn from(scope: SearchScope) -> Self {
        match scope {
            SearchScope::Base => Scope::Base,
            SearchScope::OneLevel => Scope::OneLevel,
            SearchScope::Subtree => Scope::Subtree,
        }
    }
}

/// Raw directory record: a distinguished name plus the fetched attributes.
///
/// Transient — produced by one lookup, consumed by one classification pass.
#[derive(Debug, Clone)]
pub struct RawRecord {
    /// Distinguished name of the entry.
    pub dn: String,
    /// Attribute map, names lower-cased (value order preserved from the
    /// server).
    pub attributes: HashMap<String, Vec<String>>,
}

impl RawRecord {
    /// Builds a record, folding attribute names to lower case.
    ///
    /// Attribute descriptions are case-insensitive on the wire, and servers
    /// answer with the schema casing (`memberOf`, `sAMAccountName`) rather
    /// than whatever casing the request used. Lookups by [`first`](Self::first)
    /// and [`values`](Self::values) expect lower-case names.
    #[must_use]
    pub fn new(dn: String, attributes: HashMap<String, Vec<String>>) -> Self {
        let attributes = attributes
            .into_iter()
            .map(|(name, values)| (name.to_ascii_lowercase(), values))
            .collect();
        Self { dn, attributes }
    }

    /// Returns the first value of the attribute if present.
    #[must_use]
    pub fn first(&self, attribute: &str) -> Option<&str> {
        self.attributes
            .get(attribute)
            .and_then(|values| values.first().map(String::as_str))
    }

    /// Returns all values for the attribute.
    #[must_use]
    pub fn values(&self, attribute: &str) -> Option<&[String]> {
        self.attributes
            .get(attribute)
            .map(|values| values.as_slice())
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub(crate) trait LdapSession: Send {
    async fn simple_bind(&mut self, dn: &str, password: &str) -> Result<()>;
    async fn search(
        &mut self,
        base_dn: &str,
        scope: SearchScope,
        filter: &str,
        attributes: &[String],
    ) -> Result<Vec<RawRecord>>;
    async fn unbind(&mut self) -> Result<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub(crate) trait LdapConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn LdapSession>>;
}

/// Directory client owning one live session.
///
/// Every operation takes `&mut self`: the underlying protocol session is
/// stateful (a bind changes its authenticated identity), so concurrent use
/// requires one client per flow or external serialization.
pub struct DirectoryClient {
    session: Option<Box<dyn LdapSession>>,
}

impl DirectoryClient {
    /// Opens a connection to the configured directory server and binds the
    /// service account.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionFailed`] when the server is unreachable and
    /// [`Error::BindRejected`] when the service-account bind is refused; both
    /// carry the server diagnostic. The half-open session is released on the
    /// failure path.
    pub async fn connect(config: Arc<DirectoryConfig>) -> Result<Self> {
        let connector = RealLdapConnector::new(config.clone());
        Self::establish(config, Box::new(connector)).await
    }

    pub(crate) async fn establish(
        config: Arc<DirectoryConfig>,
        connector: Box<dyn LdapConnector>,
    ) -> Result<Self> {
        let mut session = connector.connect().await?;

        let principal = config.credentials.principal_name(&config.domain);
        if let Err(err) = session
            .simple_bind(&principal, config.credentials.password())
            .await
        {
            if let Err(unbind_err) = session.unbind().await {
                warn!(error = %unbind_err, "failed to release session after rejected service bind");
            }
            return Err(match err {
                Error::BindRejected(_) | Error::Timeout(_) => err,
                other => Error::ConnectionFailed(other.to_string()),
            });
        }

        Ok(Self {
            session: Some(session),
        })
    }

    /// Point lookup by distinguished name (base scope, `(objectclass=*)`).
    ///
    /// Returns `Ok(None)` when the entry is missing, when the read fails at
    /// the protocol level, or when more than one entry comes back — all are
    /// "not found" to the caller. Timeouts surface as [`Error::Timeout`].
    pub async fn read_by_dn(&mut self, dn: &str, attributes: &[String]) -> Result<Option<RawRecord>> {
        let session = self.session_mut()?;
        let result = session
            .search(dn, SearchScope::Base, OBJECT_CLASS_ANY, attributes)
            .await;
        Self::single_entry(result, dn)
    }

    /// Subtree search under `base_dn` with the given filter; same
    /// exactly-one-or-`None` contract as [`read_by_dn`](Self::read_by_dn).
    pub async fn search_by_filter(
        &mut self,
        base_dn: &str,
        filter: &str,
        attributes: &[String],
    ) -> Result<Option<RawRecord>> {
        let session = self.session_mut()?;
        let result = session
            .search(base_dn, SearchScope::Subtree, filter, attributes)
            .await;
        Self::single_entry(result, base_dn)
    }

    /// Attempts an authenticating bind with the given DN and secret on this
    /// session. A failed bind is an expected outcome, so this returns `false`
    /// for every failure mode rather than an error.
    ///
    /// On success the session stays bound as that principal; perform any
    /// privileged lookups before validating credentials.
    pub async fn bind_as(&mut self, dn: &str, password: &str) -> bool {
        let Ok(session) = self.session_mut() else {
            return false;
        };
        match session.simple_bind(dn, password).await {
            Ok(()) => true,
            Err(err) => {
                debug!(dn, error = %err, "authenticating bind rejected");
                false
            }
        }
    }

    /// Releases the session. Idempotent: safe to call repeatedly and after a
    /// failed construction.
    pub async fn close(&mut self) {
        if let Some(mut session) = self.session.take() {
            if let Err(err) = session.unbind().await {
                warn!(error = %err, "failed to unbind directory session");
            }
        }
    }

    fn session_mut(&mut self) -> Result<&mut (dyn LdapSession + 'static)> {
        self.session
            .as_deref_mut()
            .ok_or_else(|| Error::ConnectionFailed("directory session is closed".to_string()))
    }

    fn single_entry(result: Result<Vec<RawRecord>>, base: &str) -> Result<Option<RawRecord>> {
        match result {
            Ok(mut entries) => {
                if entries.len() == 1 {
                    Ok(Some(entries.remove(0)))
                } else {
                    if entries.len() > 1 {
                        debug!(base, count = entries.len(), "ambiguous lookup treated as not found");
                    }
                    Ok(None)
                }
            }
            Err(Error::Timeout(msg)) => Err(Error::Timeout(msg)),
            Err(err) => {
                debug!(base, error = %err, "directory read failed, treated as not found");
                Ok(None)
            }
        }
    }
}

/// Escapes a value for interpolation into a search filter (RFC 4515).
///
/// Every value that originates outside the configuration must pass through
/// here before it reaches a filter string.
#[must_use]
pub fn escape_filter(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '*' => escaped.push_str("\\2a"),
            '(' => escaped.push_str("\\28"),
            ')' => escaped.push_str("\\29"),
            '\\' => escaped.push_str("\\5c"),
            '\0' => escaped.push_str("\\00"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Real LDAP connector backed by `ldap3`.
struct RealLdapConnector {
    config: Arc<DirectoryConfig>,
}

impl RealLdapConnector {
    fn new(config: Arc<DirectoryConfig>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl LdapConnector for RealLdapConnector {
    async fn connect(&self) -> Result<Box<dyn LdapSession>> {
        // ldap3 speaks protocol v3 and does not chase referrals, both of
        // which Active Directory requires.
        let settings = build_ldap_settings(&self.config)?;
        let (conn, ldap) = LdapConnAsync::with_settings(settings, &self.config.url)
            .await
            .map_err(|err| Error::ConnectionFailed(err.to_string()))?;
        ldap3::drive!(conn);
        Ok(Box::new(RealLdapSession {
            inner: ldap,
            operation_timeout: self.config.operation_timeout(),
        }))
    }
}

struct RealLdapSession {
    inner: ldap3::Ldap,
    operation_timeout: Duration,
}

#[async_trait]
impl LdapSession for RealLdapSession {
    async fn simple_bind(&mut self, dn: &str, password: &str) -> Result<()> {
        let result = timeout(self.operation_timeout, self.inner.simple_bind(dn, password))
            .await
            .map_err(|_| Error::Timeout("directory bind timed out".to_string()))?
            .map_err(map_ldap_error)?;
        if result.rc == 0 {
            Ok(())
        } else {
            Err(Error::BindRejected(format!("{} (rc={})", result.text, result.rc)))
        }
    }

    async fn search(
        &mut self,
        base_dn: &str,
        scope: SearchScope,
        filter: &str,
        attributes: &[String],
    ) -> Result<Vec<RawRecord>> {
        let result = timeout(
            self.operation_timeout,
            self.inner
                .search(base_dn, scope.into(), filter, attributes.to_vec()),
        )
        .await
        .map_err(|_| Error::Timeout("directory search timed out".to_string()))?
        .map_err(map_ldap_error)?;
        let (entries, _) = result.success().map_err(map_ldap_error)?;
        Ok(entries
            .into_iter()
            .map(SearchEntry::construct)
            .map(|entry| RawRecord::new(entry.dn, entry.attrs))
            .collect())
    }

    async fn unbind(&mut self) -> Result<()> {
        timeout(self.operation_timeout, self.inner.unbind())
            .await
            .map_err(|_| Error::Timeout("directory unbind timed out".to_string()))?
            .map_err(map_ldap_error)?;
        Ok(())
    }
}

fn map_ldap_error(err: ldap3::LdapError) -> Error {
    Error::Directory(err.to_string())
}

fn build_ldap_settings(config: &DirectoryConfig) -> Result<LdapConnSettings> {
    let mut settings = LdapConnSettings::new().set_conn_timeout(config.connection_timeout());

    if !config.tls_verify {
        let connector = TlsConnector::builder()
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|err| Error::ConfigError(format!("failed to construct TLS connector: {err}")))?;
        settings = settings.set_connector(connector).set_no_tls_verify(true);
    } else if let Some(cert_path) = &config.tls_ca_cert {
        let pem = fs::read(cert_path).map_err(|err| {
            Error::ConfigError(format!(
                "failed to read CA certificate {}: {err}",
                cert_path.display()
            ))
        })?;
        let certificate = Certificate::from_pem(&pem)
            .map_err(|err| Error::ConfigError(format!("invalid CA certificate: {err}")))?;
        let connector = TlsConnector::builder()
            .add_root_certificate(certificate)
            .build()
            .map_err(|err| Error::ConfigError(format!("failed to load CA certificate: {err}")))?;
        settings = settings.set_connector(connector);
    }

    Ok(settings)
}
