#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

//! Batch execution of a single xAPI command across tagged Webex devices.
//!
//! Layout:
//! - `command.rs`: command-string parser
//! - `model/`: devices, command requests, outcomes
//! - `service/`: traits for the device directory and command endpoint
//! - `resolver.rs` / `executor.rs`: tag resolution and per-device dispatch
//! - `report.rs`: outcome aggregation
//! - `runner.rs`: the resolve → execute → aggregate pipeline
//! - `config.rs` / `error.rs`: run settings and error taxonomy

pub mod command;
pub mod config;
pub mod error;
pub mod executor;
pub mod model;
pub mod report;
pub mod resolver;
pub mod runner;
pub mod service;

pub use command::parse_command;
pub use config::{ConfigError, EmptyMatchPolicy, RunnerConfig, RunnerSettings};
pub use error::{ExecutionError, XapiError, XapiResult};
pub use executor::CommandExecutor;
pub use model::{CommandRequest, Device, ExecutionOutcome, OutcomeStatus};
pub use report::ExecutionReport;
pub use resolver::DeviceResolver;
pub use runner::BatchRunner;
pub use service::{CommandTransport, DeviceDirectory};
