//! Authentication module for sessions and credentials.
//!
//! This module provides:
//! - `Session`: cookie session persisted in the cache directory and reused for 30 minutes
//! - `CredentialStore`: OS-level password storage via keyring

pub mod credentials;
pub mod session;

pub use credentials::CredentialStore;
pub use session::{Session, SessionData};
