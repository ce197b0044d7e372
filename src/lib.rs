//! rawhttp - HTTP/1.1 over raw byte streams
//!
//! Core library: byte buffering, the pause/resume socket adapter, the
//! HTTP/1.1 message layer and the per-connection driver.

pub mod buffer;
pub mod config;
pub mod error;
pub mod handlers;
pub mod http;
pub mod net;
pub mod server;
