//! Result schema and row decoding.

use crate::error::{Error, Result};
use crate::protocol::FormatCode;
use crate::protocol::codec::{read_bytes, read_cstr, read_i16, read_i32};

/// Per-column schema metadata from a RowDescription message.
///
/// Descriptors become active when a RowDescription arrives and stay active
/// until the next RowDescription or the command-completion message of the
/// same query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    /// Field name
    pub field_name: String,
    /// Table OID (0 if not a table column)
    pub table_id: i32,
    /// Column attribute number (0 if not a table column)
    pub attribute_number: i16,
    /// Data type OID
    pub type_oid: i32,
    /// Type size (-1 for variable-width types)
    pub type_size: i16,
    /// Type modifier (type-specific)
    pub type_modifier: i32,
    /// Format code for the column's values
    pub format: FormatCode,
}

/// One decoded column value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Text-format value decoded as UTF-8
    Text(String),
    /// Non-text value passed through unmodified
    Bytes(Vec<u8>),
    /// SQL NULL, distinct from an empty string
    Null,
}

impl Value {
    /// Text content, if this is a text value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns true for SQL NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// One decoded result record: `(name, value)` pairs in descriptor order.
///
/// Duplicate column names are preserved positionally; [`Row::get`] resolves
/// a name to the last matching column, mirroring the name-keyed mapping
/// this row shape replaces.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    /// Get a value by column name. With duplicate names the last column wins.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Get a value by position.
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.columns.get(index).map(|(_, v)| v)
    }

    /// Columns in descriptor order.
    pub fn columns(&self) -> &[(String, Value)] {
        &self.columns
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Check if the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Iterate over `(name, value)` pairs in descriptor order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(n, v)| (n.as_str(), v))
    }
}

/// Parse a RowDescription payload into descriptors.
///
/// Layout: 2-byte column count, then per column a null-terminated name,
/// 4-byte table id, 2-byte attribute number, 4-byte type OID, 2-byte type
/// size, 4-byte type modifier, 2-byte format code.
pub fn parse_row_description(payload: &[u8]) -> Result<Vec<ColumnDescriptor>> {
    let (count, mut data) = read_i16(payload)?;
    if count < 0 {
        return Err(Error::Protocol(format!(
            "RowDescription: negative column count {count}"
        )));
    }

    let mut descriptors = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let (field_name, rest) = read_cstr(data)?;
        let (table_id, rest) = read_i32(rest)?;
        let (attribute_number, rest) = read_i16(rest)?;
        let (type_oid, rest) = read_i32(rest)?;
        let (type_size, rest) = read_i16(rest)?;
        let (type_modifier, rest) = read_i32(rest)?;
        let (format_code, rest) = read_i16(rest)?;

        descriptors.push(ColumnDescriptor {
            field_name: field_name.to_string(),
            table_id,
            attribute_number,
            type_oid,
            type_size,
            type_modifier,
            format: FormatCode::from(format_code),
        });

        data = rest;
    }

    if !data.is_empty() {
        return Err(Error::Protocol(format!(
            "RowDescription: {} trailing bytes after {} columns",
            data.len(),
            count
        )));
    }

    Ok(descriptors)
}

/// Parse a DataRow payload into raw column values.
///
/// Layout: 2-byte column count, then per column a 4-byte signed length;
/// `-1` is the SQL-NULL sentinel and consumes no value bytes, a
/// non-negative length `L` is followed by exactly `L` value bytes.
pub fn parse_data_row(payload: &[u8]) -> Result<Vec<Option<Vec<u8>>>> {
    let (count, mut data) = read_i16(payload)?;
    if count < 0 {
        return Err(Error::Protocol(format!(
            "DataRow: negative column count {count}"
        )));
    }

    let mut columns = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let (len, rest) = read_i32(data)?;
        if len == -1 {
            columns.push(None);
            data = rest;
        } else if len < 0 {
            return Err(Error::Protocol(format!("DataRow: invalid column length {len}")));
        } else {
            let (value, rest) = read_bytes(rest, len as usize)?;
            columns.push(Some(value.to_vec()));
            data = rest;
        }
    }

    if !data.is_empty() {
        return Err(Error::Protocol(format!(
            "DataRow: {} trailing bytes after {} columns",
            data.len(),
            count
        )));
    }

    Ok(columns)
}

/// Materialize a row from raw columns against the active descriptors.
///
/// The wire column count must equal the descriptor count. Text-format
/// columns decode as UTF-8; any other format passes the bytes through.
pub fn build_row(descriptors: &[ColumnDescriptor], columns: Vec<Option<Vec<u8>>>) -> Result<Row> {
    if columns.len() != descriptors.len() {
        return Err(Error::Protocol(format!(
            "DataRow has {} columns but the active schema describes {}",
            columns.len(),
            descriptors.len()
        )));
    }

    let mut out = Vec::with_capacity(columns.len());
    for (descriptor, raw) in descriptors.iter().zip(columns) {
        let value = match raw {
            None => Value::Null,
            Some(bytes) => match descriptor.format {
                FormatCode::Text => {
                    let text = simdutf8::compat::from_utf8(&bytes).map_err(|e| {
                        Error::Protocol(format!(
                            "Column '{}': invalid UTF-8: {e}",
                            descriptor.field_name
                        ))
                    })?;
                    Value::Text(text.to_string())
                }
                FormatCode::Binary => Value::Bytes(bytes),
            },
        };
        out.push((descriptor.field_name.clone(), value));
    }

    Ok(Row { columns: out })
}
