//! Transport-facing abstractions (events in, sends out).

pub mod port;
pub mod types;
