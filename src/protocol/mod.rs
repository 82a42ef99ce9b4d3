//! PostgreSQL wire protocol: framing, message parsing, and encoding.

pub mod backend;
pub mod codec;
pub mod frame;
pub mod frontend;

/// Message tag bytes consumed and produced by the client.
pub mod tag {
    /// Authentication result (server)
    pub const AUTHENTICATION: u8 = b'R';
    /// BackendKeyData (server)
    pub const BACKEND_KEY_DATA: u8 = b'K';
    /// ParameterStatus (server)
    pub const PARAMETER_STATUS: u8 = b'S';
    /// ReadyForQuery (server)
    pub const READY_FOR_QUERY: u8 = b'Z';
    /// Notice/acknowledgement, legacy single-byte form with no length field (server)
    pub const NOTICE: u8 = b'N';
    /// RowDescription (server)
    pub const ROW_DESCRIPTION: u8 = b'T';
    /// DataRow (server)
    pub const DATA_ROW: u8 = b'D';
    /// CommandComplete (server)
    pub const COMMAND_COMPLETE: u8 = b'C';
    /// EmptyQueryResponse (server)
    pub const EMPTY_QUERY_RESPONSE: u8 = b'I';
    /// ErrorResponse (server)
    pub const ERROR_RESPONSE: u8 = b'E';
    /// Query, simple query protocol (client)
    pub const QUERY: u8 = b'Q';
}

/// Data format code for a result column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatCode {
    /// Text format; values decode as UTF-8 strings
    #[default]
    Text,
    /// Any non-text format; values pass through as raw bytes
    Binary,
}

impl FormatCode {
    /// Create a FormatCode from the raw wire value.
    pub fn from_i16(value: i16) -> Self {
        match value {
            0 => FormatCode::Text,
            _ => FormatCode::Binary,
        }
    }
}

impl From<i16> for FormatCode {
    fn from(value: i16) -> Self {
        Self::from_i16(value)
    }
}
