//! Command dispatcher for the Jagwax assistant.
//!
//! Consumes `TransportEvent`s, routes commands from message bodies, and writes
//! replies back through the transport port. All state mutation (archive,
//! pairing) happens from here.

pub mod dispatcher;
pub mod handlers;

pub use dispatcher::Dispatcher;

#[cfg(test)]
pub(crate) mod testing;
