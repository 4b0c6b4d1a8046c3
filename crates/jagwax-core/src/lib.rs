//! Core domain + application logic for the Jagwax assistant.
//!
//! This crate is intentionally transport-agnostic. The actual messenger client
//! lives behind a port (trait) implemented in adapter crates; everything here
//! is testable against an in-memory transport.

pub mod archive;
pub mod config;
pub mod content;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod messaging;
pub mod pairing;
pub mod session;

pub use errors::{Error, Result};
