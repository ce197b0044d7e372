//! Transport plumbing: an event-driven socket and the sequential
//! [`Connection`] built on top of it.

pub mod connection;
pub mod socket;

pub use connection::{Connection, ConnectionReader, ConnectionWriter};
