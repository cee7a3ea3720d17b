//! Authentication module for managing dashboard sessions and credentials.
//!
//! This module provides:
//! - `Session`: logged-in staff user persisted to disk, expiring after a
//!   school day
//! - `CredentialStore`: OS-level credential storage via keyring

pub mod credentials;
pub mod session;

pub use credentials::CredentialStore;
pub use session::{Session, SessionData};
