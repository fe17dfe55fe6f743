#![forbid(unsafe_code)]
#![deny(unused_must_use, unreachable_pub, rustdoc::broken_intra_doc_links, missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::redundant_pub_crate)]

//! Command-line runner that sends one xAPI command to every Webex device
//! carrying a tag.
//!
//! Layout:
//! - `cli.rs`: argument parsing and run orchestration
//! - `commands/`: command handlers
//! - `client.rs`: shared HTTP client, credentials, and CLI errors
//! - `webex.rs`: Webex REST directory and command transport
//! - `output.rs`: report renderers
//! - `main.rs`: thin entrypoint delegating to `run()`

pub(crate) mod cli;
pub(crate) mod client;
pub(crate) mod commands;
pub(crate) mod output;
pub(crate) mod webex;

pub use cli::run;
