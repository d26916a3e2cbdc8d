//! Column schema derivation for tabular rendering.
//!
//! A schema is derived once, from the **first** record of the input, and
//! is not reconciled against keys that later records introduce — sparse
//! data beyond the first record renders blank cells. That staleness is a
//! documented property of the table contract, not an oversight.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Why a schema could not be derived. These surface to the caller — an
/// empty or non-tabular input has no sensible default rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The input held no records at all.
    #[error("cannot derive a column schema from empty data")]
    Empty,
    /// The input was not an array of records.
    #[error("data is not tabular: expected an array of array or object records")]
    NotTabular,
}

/// The rendered type of a column, sniffed from the first record's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// String values.
    Text,
    /// Numeric values.
    Number,
    /// Boolean values.
    Bool,
    /// Anything else, rendered via string coercion.
    Other,
}

impl From<&Value> for ColumnType {
    fn from(value: &Value) -> Self {
        match value {
            Value::String(_) => Self::Text,
            Value::Number(_) => Self::Number,
            Value::Bool(_) => Self::Bool,
            _ => Self::Other,
        }
    }
}

/// One table column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Stable column identifier: the record key, or synthetic `C{n}`.
    pub id: String,
    /// Header text.
    pub display_name: String,
    /// Sniffed value type.
    #[serde(rename = "type")]
    pub ty: ColumnType,
}

/// The ordered column set for one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    columns: Vec<Column>,
}

impl ColumnSchema {
    /// Builds a schema from explicit columns, for callers that override
    /// derivation.
    #[must_use]
    pub fn from_columns(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Derives a schema from the first record of `data`.
    ///
    /// An array first record yields synthetic `C1..Cn` columns; an object
    /// record yields one column per own key, in key order.
    pub fn derive(data: &Value) -> Result<Self, SchemaError> {
        let rows = data.as_array().ok_or(SchemaError::NotTabular)?;
        let first = rows.first().ok_or(SchemaError::Empty)?;
        let columns = match first {
            Value::Array(cells) => cells
                .iter()
                .enumerate()
                .map(|(index, value)| {
                    let id = format!("C{}", index + 1);
                    Column {
                        display_name: id.clone(),
                        id,
                        ty: ColumnType::from(value),
                    }
                })
                .collect(),
            Value::Object(record) => record
                .iter()
                .map(|(key, value)| Column {
                    id: key.clone(),
                    display_name: key.clone(),
                    ty: ColumnType::from(value),
                })
                .collect(),
            _ => return Err(SchemaError::NotTabular),
        };
        Ok(Self { columns })
    }

    /// The columns, in display order.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the schema has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Extracts the cell value for `column` from a record, in a way that
    /// matches how the schema was derived.
    #[must_use]
    pub fn cell<'v>(&self, record: &'v Value, column_index: usize) -> Option<&'v Value> {
        match record {
            Value::Array(cells) => cells.get(column_index),
            Value::Object(map) => self
                .columns
                .get(column_index)
                .and_then(|column| map.get(&column.id)),
            _ => None,
        }
    }
}
