//! A minimal client for the PostgreSQL simple-query wire protocol.
//!
//! # Features
//!
//! - **Streaming frame decoder**: messages are reassembled from an
//!   arbitrarily-chunked inbound byte stream, partial tails carried over
//! - **Sans-I/O session**: handshake and query pipeline are separated from
//!   I/O; the caller supplies the duplex byte stream
//! - **Schema-aware rows**: result rows decode against the server-supplied
//!   row description, text columns as UTF-8 and everything else as raw bytes
//!
//! # Example
//!
//! ```no_run
//! use std::net::TcpStream;
//! use micropg::sync::Conn;
//! use micropg::Opts;
//!
//! fn main() -> micropg::Result<()> {
//!     let opts = Opts {
//!         user: "postgres".into(),
//!         database: Some("mydb".into()),
//!         ..Default::default()
//!     };
//!
//!     let stream = TcpStream::connect("localhost:5432")?;
//!     let mut conn = Conn::connect(stream, opts)?;
//!
//!     let id = conn.query("SELECT 1")?;
//!     let outcome = conn.wait(id)?;
//!     for row in &outcome.rows {
//!         println!("{:?}", row.get("?column?"));
//!     }
//!
//!     conn.end()?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod opts;
pub mod protocol;
pub mod row;
pub mod session;
pub mod sync;

pub use error::{Error, Result};
pub use opts::Opts;
pub use protocol::FormatCode;
pub use protocol::frame::{Frame, FrameDecoder};
pub use row::{ColumnDescriptor, Row, Value};
pub use session::{Event, QueryFailure, QueryId, Session, Status};
