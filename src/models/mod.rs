//! Data models for the attendance backend.
//!
//! This module contains the data structures shared across the client:
//!
//! - `Student`: roster entries whose id is the QR code payload
//! - `StaffUser`: dashboard accounts with a role string
//! - `AttendanceRecord`: one arrival/departure row from the raw batch
//! - `ScanDirection`: which half of the attendance pair a scan records

pub mod attendance;
pub mod student;
pub mod user;

pub use attendance::{AttendanceRecord, ScanDirection};
pub use student::Student;
pub use user::StaffUser;
