//! # dirauth-core
//!
//! Foundational types for directory-backed authentication.
//!
//! This crate provides the error taxonomy and credential types shared by the
//! directory client and resolver crates.
//!
//! ## Modules
//!
//! - [`error`] - Error types and stable error codes
//! - [`credentials`] - Service-account and login credential types

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod credentials;
pub mod error;

// Re-export commonly used types
pub use credentials::{BindCredentials, LoginCredentials};
pub use error::{Error, Result};
