#![forbid(unsafe_code)]
#![deny(unused_must_use, missing_docs)]

//! Shared test helpers used across integration suites.
//! Layout: fixtures.rs (sample devices), mocks.rs (scripted directory and transport).

pub mod fixtures;
pub mod mocks;
