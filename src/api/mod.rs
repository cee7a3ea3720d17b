//! Client module for the remote attendance service.
//!
//! The backend is a single spreadsheet-backed script endpoint; every
//! operation is an `action` routed through one URL and wrapped in a
//! common success/error envelope. `ApiClient` owns the transport details
//! so the rest of the client only sees typed results.

pub mod client;
pub mod error;

pub use client::{ApiClient, ScanAck};
pub use error::ApiError;
