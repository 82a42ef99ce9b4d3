//! Synchronous driver over a caller-supplied duplex stream.

pub mod conn;

pub use conn::{Conn, QueryOutcome};
