//! Backend (server -> client) message parsing.

use crate::error::{Error, Result};
use crate::protocol::codec::read_i32;
use crate::protocol::frame::Frame;
use crate::protocol::tag;
use crate::row::{self, ColumnDescriptor};

/// One parsed backend message.
///
/// The tag set is closed: routing matches exhaustively on this enum, so an
/// unhandled message kind is visible at build time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendMessage {
    /// Authentication result; `outcome` 0 means success, anything else failure
    Authentication { outcome: i32 },
    /// Process id and secret key for cancellation requests
    BackendKeyData { process_id: i32, secret_key: i32 },
    /// Server configuration pairs to merge into the session config
    ParameterStatus { pairs: Vec<(String, String)> },
    /// The connection is idle and can accept the next query
    ReadyForQuery,
    /// Legacy acknowledgement; carries nothing
    Notice,
    /// Result schema for the rows that follow
    RowDescription(Vec<ColumnDescriptor>),
    /// One result row, raw columns not yet matched to a schema
    DataRow(Vec<Option<Vec<u8>>>),
    /// Command completion text, trailing NUL preserved
    CommandComplete(String),
    /// Response to an empty query string
    EmptyQueryResponse,
    /// Server error, surfaced raw to the in-flight query
    ErrorResponse(Vec<u8>),
    /// Tag outside the known vocabulary; logged and ignored
    Unknown { tag: u8 },
}

impl BackendMessage {
    /// Parse a frame's payload according to its tag.
    pub fn decode(frame: &Frame) -> Result<Self> {
        let payload = frame.payload.as_slice();
        match frame.tag {
            tag::AUTHENTICATION => {
                let (outcome, _) = read_i32(payload)?;
                Ok(BackendMessage::Authentication { outcome })
            }
            tag::BACKEND_KEY_DATA => {
                let (process_id, rest) = read_i32(payload)?;
                let (secret_key, _) = read_i32(rest)?;
                Ok(BackendMessage::BackendKeyData {
                    process_id,
                    secret_key,
                })
            }
            tag::PARAMETER_STATUS => Ok(BackendMessage::ParameterStatus {
                pairs: parse_parameter_pairs(payload)?,
            }),
            tag::READY_FOR_QUERY => Ok(BackendMessage::ReadyForQuery),
            tag::NOTICE => Ok(BackendMessage::Notice),
            tag::ROW_DESCRIPTION => Ok(BackendMessage::RowDescription(
                row::parse_row_description(payload)?,
            )),
            tag::DATA_ROW => Ok(BackendMessage::DataRow(row::parse_data_row(payload)?)),
            tag::COMMAND_COMPLETE => Ok(BackendMessage::CommandComplete(completion_text(
                payload,
            )?)),
            tag::EMPTY_QUERY_RESPONSE => Ok(BackendMessage::EmptyQueryResponse),
            tag::ERROR_RESPONSE => Ok(BackendMessage::ErrorResponse(payload.to_vec())),
            other => Ok(BackendMessage::Unknown { tag: other }),
        }
    }
}

/// Decode a completion payload as UTF-8, keeping the trailing NUL.
fn completion_text(payload: &[u8]) -> Result<String> {
    let text = simdutf8::compat::from_utf8(payload)
        .map_err(|e| Error::Protocol(format!("CommandComplete: invalid UTF-8: {e}")))?;
    Ok(text.to_string())
}

/// Split a ParameterStatus payload into key/value pairs.
///
/// The payload is a sequence of null-separated tokens; every even-indexed
/// token is a key and the following odd-indexed token its value. A trailing
/// unpaired token (the empty token after the final separator) is dropped.
fn parse_parameter_pairs(payload: &[u8]) -> Result<Vec<(String, String)>> {
    let tokens: Vec<&[u8]> = payload.split(|b| *b == 0).collect();

    let mut pairs = Vec::new();
    for pair in tokens.chunks_exact(2) {
        let key = simdutf8::compat::from_utf8(pair[0])
            .map_err(|e| Error::Protocol(format!("ParameterStatus: invalid UTF-8 key: {e}")))?;
        let value = simdutf8::compat::from_utf8(pair[1])
            .map_err(|e| Error::Protocol(format!("ParameterStatus: invalid UTF-8 value: {e}")))?;
        pairs.push((key.to_string(), value.to_string()));
    }

    Ok(pairs)
}
