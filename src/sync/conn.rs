//! Synchronous connection pumping a [`Session`] over a `Read + Write` stream.

use std::io::{Read, Write};

use crate::error::{Error, Result};
use crate::opts::Opts;
use crate::session::{Event, QueryFailure, QueryId, Session, Status};
use crate::row::Row;

/// Collected outcome of one query driven by [`Conn::wait`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOutcome {
    /// Decoded rows, in arrival order
    pub rows: Vec<Row>,
    /// Completion texts, one per completed statement
    pub completions: Vec<String>,
    /// The failure, if the query errored
    pub error: Option<QueryFailure>,
}

/// Synchronous connection over a caller-supplied duplex byte stream.
///
/// The crate never opens or closes sockets; the stream comes from the
/// caller and is dropped on [`Conn::end`].
pub struct Conn<S> {
    stream: S,
    session: Session,
}

impl<S: Read + Write> Conn<S> {
    /// Drive the handshake to the ready state over an established stream.
    pub fn connect(stream: S, opts: Opts) -> Result<Self> {
        let mut session = Session::new(opts);
        session.start();
        session.stream_connected();

        let mut conn = Self { stream, session };
        conn.flush_outbound()?;

        while conn.session.status() != Status::ReadyForQuery {
            if conn.session.status() == Status::Disconnected {
                return Err(Error::Disconnected);
            }
            conn.pump()?;
        }

        Ok(conn)
    }

    /// The underlying session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Submit a query and flush it to the stream.
    pub fn query(&mut self, sql: &str) -> Result<QueryId> {
        let id = self.session.query(sql)?;
        self.flush_outbound()?;
        Ok(id)
    }

    /// Next notification, reading from the stream as needed.
    pub fn next_event(&mut self) -> Result<Event> {
        loop {
            if let Some(event) = self.session.next_event() {
                return Ok(event);
            }
            if self.session.status() == Status::Disconnected {
                return Err(Error::Disconnected);
            }
            self.pump()?;
        }
    }

    /// Collect one query's events until its done marker.
    ///
    /// Status changes and notifications for other queries are drained and
    /// discarded; use [`Conn::next_event`] to observe everything.
    pub fn wait(&mut self, query: QueryId) -> Result<QueryOutcome> {
        let mut outcome = QueryOutcome::default();
        loop {
            match self.next_event()? {
                Event::Row { query: q, row } if q == query => outcome.rows.push(row),
                Event::Complete { query: q, tag } if q == query => outcome.completions.push(tag),
                Event::QueryError { query: q, error } if q == query => {
                    outcome.error = Some(error);
                }
                Event::Done { query: q } if q == query => return Ok(outcome),
                Event::ConnectionError { message } => {
                    return Err(Error::Protocol(message));
                }
                _ => {}
            }
        }
    }

    /// Close the session and drop the stream.
    pub fn end(mut self) -> Result<()> {
        self.session.end();
        self.flush_outbound()?;
        Ok(())
    }

    fn flush_outbound(&mut self) -> Result<()> {
        let out = self.session.take_outbound();
        if out.is_empty() {
            return Ok(());
        }
        if let Err(err) = self.stream.write_all(&out).and_then(|()| self.stream.flush()) {
            self.session.stream_error(&err.to_string());
            return Err(err.into());
        }
        Ok(())
    }

    /// Read one chunk, feed the session, flush any responses it produced.
    fn pump(&mut self) -> Result<()> {
        let mut chunk = [0u8; 8192];
        let n = match self.stream.read(&mut chunk) {
            Ok(n) => n,
            Err(err) => {
                self.session.stream_error(&err.to_string());
                return Err(err.into());
            }
        };

        if n == 0 {
            self.session.stream_closed();
            return Ok(());
        }

        // Framing corruption is unrecoverable: the session must not stay
        // live over a desynchronized stream.
        if let Err(err) = self.session.receive(&chunk[..n]) {
            self.session.stream_error(&err.to_string());
            return Err(err);
        }
        self.flush_outbound()
    }
}
