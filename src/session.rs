//! Sans-I/O client session.
//!
//! The session owns the receive buffer, the active result schema, and the
//! pending-query queue. The caller feeds arbitrarily-chunked inbound bytes
//! with [`Session::receive`], writes whatever [`Session::take_outbound`]
//! yields, and drains notifications from [`Session::next_event`]. All
//! decoding is synchronous with data arrival; every complete message in a
//! chunk is processed, in arrival order, before `receive` returns.

use std::collections::VecDeque;

use crate::error::{Error, Result};
use crate::opts::Opts;
use crate::protocol::backend::BackendMessage;
use crate::protocol::frame::{Frame, FrameDecoder};
use crate::protocol::frontend;
use crate::row::{self, ColumnDescriptor, Row};

/// Identifier of a submitted query; events carry it back to the caller.
pub type QueryId = u64;

/// Session status.
///
/// Linear startup with one named excursion: `ReadyForQuery` and `Querying`
/// alternate while queries run, and `Disconnected` is reachable from every
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Initialized,
    Connecting,
    Connected,
    Authenticating,
    ReadyForQuery,
    Querying,
    Disconnected,
}

/// Why a query failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryFailure {
    /// The server sent an error response; the raw payload is preserved
    Server { payload: Vec<u8> },
    /// A result message could not be decoded against the active schema
    Decode { message: String },
}

/// Notification emitted by the session, in strict arrival order.
///
/// Per query, `Row`, `Complete`, and `QueryError` events precede `Done`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The state machine transitioned
    StatusChange { from: Status, to: Status },
    /// One decoded result row
    Row { query: QueryId, row: Row },
    /// Command completion text, one per completed statement
    Complete { query: QueryId, tag: String },
    /// The query failed; processing continues to the ready marker
    QueryError { query: QueryId, error: QueryFailure },
    /// The query's result phase ended
    Done { query: QueryId },
    /// The transport failed; the session is disconnected
    ConnectionError { message: String },
}

struct RunningQuery {
    id: QueryId,
    columns: Vec<ColumnDescriptor>,
    errored: bool,
}

/// Stateful client-side connection coordinating handshake and queries.
pub struct Session {
    status: Status,
    opts: Opts,
    server_config: Vec<(String, String)>,
    process_id: Option<i32>,
    secret_key: Option<i32>,
    authenticated: bool,
    decoder: FrameDecoder,
    pending: VecDeque<(QueryId, String)>,
    running: Option<RunningQuery>,
    outbound: Vec<u8>,
    events: VecDeque<Event>,
    next_query_id: QueryId,
}

impl Session {
    /// Create a session in the `Initialized` state.
    pub fn new(opts: Opts) -> Self {
        Self {
            status: Status::Initialized,
            opts,
            server_config: Vec::new(),
            process_id: None,
            secret_key: None,
            authenticated: false,
            decoder: FrameDecoder::new(),
            pending: VecDeque::new(),
            running: None,
            outbound: Vec::new(),
            events: VecDeque::new(),
            next_query_id: 0,
        }
    }

    /// Current status.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Server configuration merged from parameter-status messages.
    pub fn server_config(&self) -> &[(String, String)] {
        &self.server_config
    }

    /// Backend process id from the key-data message, once received.
    pub fn process_id(&self) -> Option<i32> {
        self.process_id
    }

    /// Backend secret key from the key-data message, once received.
    pub fn secret_key(&self) -> Option<i32> {
        self.secret_key
    }

    /// Whether the authentication result reported success.
    pub fn authenticated(&self) -> bool {
        self.authenticated
    }

    /// The caller is dialing the transport.
    pub fn start(&mut self) {
        self.set_status(Status::Connecting);
    }

    /// The transport is established: queue the startup sequence for writing.
    pub fn stream_connected(&mut self) {
        self.set_status(Status::Connected);
        let params = self.opts.startup_params();
        frontend::write_startup(&mut self.outbound, &params);
        self.set_status(Status::Authenticating);
    }

    /// The transport closed; abandon all queued and running queries.
    pub fn stream_closed(&mut self) {
        self.abandon();
        self.set_status(Status::Disconnected);
    }

    /// The transport failed; surfaces a `ConnectionError` event and disconnects.
    pub fn stream_error(&mut self, message: &str) {
        self.events.push_back(Event::ConnectionError {
            message: message.to_string(),
        });
        self.abandon();
        self.set_status(Status::Disconnected);
    }

    /// Close gracefully. The driver is expected to close the stream;
    /// queued and running queries are abandoned without retry.
    pub fn end(&mut self) {
        self.abandon();
        self.set_status(Status::Disconnected);
    }

    /// Submit a query. It runs immediately if the session is idle, and is
    /// queued in FIFO order otherwise.
    pub fn query(&mut self, sql: &str) -> Result<QueryId> {
        if self.status == Status::Disconnected {
            return Err(Error::Disconnected);
        }

        let id = self.next_query_id;
        self.next_query_id += 1;
        self.pending.push_back((id, sql.to_string()));

        if self.status == Status::ReadyForQuery {
            self.pump_queue();
        }

        Ok(id)
    }

    /// Feed one inbound chunk. Drains every complete message it makes
    /// available, in arrival order, before returning.
    pub fn receive(&mut self, chunk: &[u8]) -> Result<()> {
        if self.status == Status::Disconnected {
            tracing::debug!("Dropping {} bytes received after disconnect", chunk.len());
            return Ok(());
        }

        self.decoder.extend(chunk);
        while let Some(frame) = self.decoder.next_frame()? {
            self.dispatch(frame)?;
        }
        Ok(())
    }

    /// Take the bytes queued for the transport.
    pub fn take_outbound(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.outbound)
    }

    /// Pop the next notification, if any.
    pub fn next_event(&mut self) -> Option<Event> {
        self.events.pop_front()
    }

    fn set_status(&mut self, to: Status) {
        if self.status == to {
            return;
        }
        let from = self.status;
        self.status = to;
        self.events.push_back(Event::StatusChange { from, to });
    }

    fn abandon(&mut self) {
        self.pending.clear();
        self.running = None;
    }

    /// Dequeue and dispatch exactly one query when idle.
    fn pump_queue(&mut self) {
        if self.status != Status::ReadyForQuery {
            return;
        }
        let Some((id, sql)) = self.pending.pop_front() else {
            return;
        };

        self.set_status(Status::Querying);
        frontend::write_query(&mut self.outbound, &sql);
        self.running = Some(RunningQuery {
            id,
            columns: Vec::new(),
            errored: false,
        });
    }

    fn dispatch(&mut self, frame: Frame) -> Result<()> {
        let msg = match BackendMessage::decode(&frame) {
            Ok(msg) => msg,
            // Payload-level decode errors are scoped to the running query;
            // the frame boundary is intact, so parsing resumes at the next
            // message. Outside a query they are fatal.
            Err(err) => {
                if self.running.is_some() {
                    self.fail_running(QueryFailure::Decode {
                        message: err.to_string(),
                    });
                    return Ok(());
                }
                return Err(err);
            }
        };

        match self.status {
            Status::Connecting | Status::Connected | Status::Authenticating => {
                self.handle_handshake(msg);
            }
            Status::ReadyForQuery | Status::Querying => {
                self.handle_query_phase(msg);
            }
            Status::Initialized | Status::Disconnected => {
                tracing::debug!("Dropping message '{}' in {:?}", frame.tag as char, self.status);
            }
        }
        Ok(())
    }

    fn handle_handshake(&mut self, msg: BackendMessage) {
        match msg {
            BackendMessage::Authentication { outcome } => {
                self.authenticated = outcome == 0;
                if !self.authenticated {
                    tracing::warn!("Authentication failed with result {}", outcome);
                }
            }
            BackendMessage::BackendKeyData {
                process_id,
                secret_key,
            } => {
                self.process_id = Some(process_id);
                self.secret_key = Some(secret_key);
            }
            BackendMessage::ParameterStatus { pairs } => {
                self.merge_server_config(pairs);
            }
            BackendMessage::Notice => {}
            BackendMessage::ReadyForQuery => {
                self.set_status(Status::ReadyForQuery);
                self.pump_queue();
            }
            BackendMessage::ErrorResponse(payload) => {
                tracing::warn!(
                    "Error response during handshake: {}",
                    String::from_utf8_lossy(&payload)
                );
            }
            BackendMessage::RowDescription(_)
            | BackendMessage::DataRow(_)
            | BackendMessage::CommandComplete(_)
            | BackendMessage::EmptyQueryResponse => {
                tracing::debug!("Ignoring result-phase message during handshake");
            }
            BackendMessage::Unknown { tag } => {
                tracing::debug!("Ignoring unknown message '{}' during handshake", tag as char);
            }
        }
    }

    fn handle_query_phase(&mut self, msg: BackendMessage) {
        let Some(running) = self.running.as_mut() else {
            // Idle between queries: only configuration updates matter.
            match msg {
                BackendMessage::ParameterStatus { pairs } => self.merge_server_config(pairs),
                other => tracing::debug!("Dropping {:?} with no query in flight", other),
            }
            return;
        };

        match msg {
            BackendMessage::RowDescription(descriptors) => {
                running.columns = descriptors;
            }
            BackendMessage::DataRow(columns) => {
                let id = running.id;
                match row::build_row(&running.columns, columns) {
                    Ok(row) => self.events.push_back(Event::Row { query: id, row }),
                    Err(err) => self.fail_running(QueryFailure::Decode {
                        message: err.to_string(),
                    }),
                }
            }
            BackendMessage::CommandComplete(tag) => {
                running.columns.clear();
                let id = running.id;
                self.events.push_back(Event::Complete { query: id, tag });
            }
            BackendMessage::EmptyQueryResponse => {
                running.columns.clear();
                let id = running.id;
                self.events.push_back(Event::Complete {
                    query: id,
                    tag: String::new(),
                });
            }
            BackendMessage::ErrorResponse(payload) => {
                self.fail_running(QueryFailure::Server { payload });
            }
            BackendMessage::ReadyForQuery => {
                let id = running.id;
                self.running = None;
                self.events.push_back(Event::Done { query: id });
                self.set_status(Status::ReadyForQuery);
                self.pump_queue();
            }
            BackendMessage::ParameterStatus { pairs } => {
                self.merge_server_config(pairs);
            }
            BackendMessage::Authentication { .. }
            | BackendMessage::BackendKeyData { .. }
            | BackendMessage::Notice => {
                tracing::debug!("Ignoring handshake-phase message during query");
            }
            BackendMessage::Unknown { tag } => {
                tracing::debug!("Ignoring unknown message '{}' during query", tag as char);
            }
        }
    }

    fn fail_running(&mut self, error: QueryFailure) {
        let Some(running) = self.running.as_mut() else {
            return;
        };
        running.errored = true;
        running.columns.clear();
        let id = running.id;
        self.events.push_back(Event::QueryError { query: id, error });
    }

    /// Merge configuration pairs; later values for a key overwrite earlier ones.
    fn merge_server_config(&mut self, pairs: Vec<(String, String)>) {
        for (name, value) in pairs {
            if let Some(entry) = self.server_config.iter_mut().find(|(n, _)| *n == name) {
                entry.1 = value;
            } else {
                self.server_config.push((name, value));
            }
        }
    }
}
