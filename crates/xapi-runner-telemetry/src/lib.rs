#![forbid(unsafe_code)]
#![deny(unused_must_use, missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

//! Logging setup shared by the xapi-runner binaries.
//!
//! Events go to stderr so that stdout carries only rendered reports.

pub mod error;
pub mod init;

pub use error::{Result, TelemetryError};
pub use init::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, init_logging};
