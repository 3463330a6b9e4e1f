//! Directory-backed authentication and authorization engine.
//!
//! This crate authenticates principals against an LDAP/Active Directory
//! server and classifies them into access tiers from transitive group
//! membership. It supports password logins (validated by re-binding as the
//! principal) and transparent logins asserted by a trusted upstream
//! transport (NTLM/SSO), and exposes the result through the
//! [`IdentityProvider`] contract a session or guard layer consumes.

#![deny(missing_docs)]

mod classify;
mod client;
mod config;
mod dn;
mod membership;
mod principal;
mod resolver;

pub use classify::classify;
pub use client::{escape_filter, DirectoryClient, RawRecord, SearchScope};
pub use config::{
    DirectoryConfig, DEFAULT_CONNECTION_TIMEOUT_SECS, DEFAULT_MAX_GROUP_DEPTH,
    DEFAULT_OPERATION_TIMEOUT_SECS,
};
pub use dn::{DistinguishedName, DnError, Rdn};
pub use membership::is_member;
pub use principal::{AccessTier, Principal};
pub use resolver::{AuthenticationResolver, IdentityProvider};

/// Convenient result alias that reuses the core error type.
pub type Result<T> = dirauth_core::Result<T>;
