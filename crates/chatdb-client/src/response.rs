//! Response envelopes returned by the ChatDB backend.
//!
//! Every endpoint answers with a tagged union keyed on the presence of an
//! `error` field: either `{ "error": "..." }` or an operation-specific
//! success body. [`decode_envelope`] implements that rule once for all of
//! them.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

/// A single result row: column name to scalar (or null), in backend order.
pub type Row = Map<String, Value>;

/// Decodes a response body into the success type `T`.
///
/// - A JSON object carrying a non-null `error` key is a backend failure,
///   whatever the HTTP status. Its message is returned as-is.
/// - Otherwise a 2xx body must decode into `T`.
/// - Non-JSON bodies, non-2xx statuses without `error`, and bodies that do
///   not match `T` are transport-level failures.
///
/// # Errors
///
/// See above. Backend failures carry [`ErrorKind::Backend`].
///
/// [`ErrorKind::Backend`]: crate::ErrorKind::Backend
pub fn decode_envelope<T: DeserializeOwned>(status: u16, body: &str) -> Result<T> {
    let value: Value = serde_json::from_str(body).map_err(|err| {
        Error::serialization()
            .with_message("Response body is not valid JSON")
            .with_context(format!("HTTP {status}"))
            .with_source(err)
    })?;

    if let Some(message) = backend_error(&value) {
        return Err(Error::backend()
            .with_message(message)
            .with_context(format!("HTTP {status}")));
    }

    if !(200..300).contains(&status) {
        return Err(Error::unexpected_status(status));
    }

    serde_json::from_value(value).map_err(|err| {
        Error::serialization()
            .with_message("Response body has an unexpected shape")
            .with_context(format!("HTTP {status}"))
            .with_source(err)
    })
}

/// Extracts the backend's `error` message, if present.
fn backend_error(value: &Value) -> Option<String> {
    match value.as_object()?.get("error")? {
        Value::Null => None,
        Value::String(message) => Some(message.clone()),
        other => Some(other.to_string()),
    }
}

/// Success body of `POST /connect`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectResponse {
    /// Human-readable confirmation.
    pub message: String,
}

/// Success body of `GET /api/tables`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableListing {
    /// Tables (or collections) visible on the current connection.
    #[serde(alias = "collections")]
    pub tables: Vec<TableSchema>,
}

/// One table and its column names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TableEntry")]
pub struct TableSchema {
    /// Table name.
    pub name: String,
    /// Column names, possibly empty when the backend only lists names.
    pub columns: Vec<String>,
}

/// Wire forms a listing entry can take.
#[derive(Deserialize)]
#[serde(untagged)]
enum TableEntry {
    Named(String),
    Schema {
        name: String,
        #[serde(default)]
        columns: Vec<String>,
    },
}

impl From<TableEntry> for TableSchema {
    fn from(entry: TableEntry) -> Self {
        match entry {
            TableEntry::Named(name) => Self {
                name,
                columns: Vec::new(),
            },
            TableEntry::Schema { name, columns } => Self { name, columns },
        }
    }
}

/// Success body of `POST /manage`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryResponse {
    /// A row-returning statement.
    Rows(QueryRows),
    /// The legacy listing shape: `{tables}` or `{collections}`.
    Listing(QueryListing),
    /// A statement without a result set.
    Message(QueryMessage),
    /// A body with none of the expected fields.
    Empty(Map<String, Value>),
}

/// Result set of a row-returning statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRows {
    /// Raw `data` value; normally an array of row objects.
    pub data: Value,
    /// Number of rows reported by the backend.
    #[serde(default, alias = "count", skip_serializing_if = "Option::is_none")]
    pub row_count: Option<usize>,
    /// Number of columns reported by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_count: Option<usize>,
    /// Column names, when the backend sends them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,
}

impl QueryRows {
    /// Returns the rows when `data` is an array of objects.
    ///
    /// Returns `None` for any other shape, including arrays that contain
    /// non-object elements.
    pub fn rows(&self) -> Option<Vec<&Row>> {
        self.data
            .as_array()?
            .iter()
            .map(Value::as_object)
            .collect()
    }

    /// Row count as reported, falling back to the length of `data`.
    pub fn row_count(&self) -> usize {
        self.row_count
            .or_else(|| self.data.as_array().map(Vec::len))
            .unwrap_or_default()
    }
}

/// Legacy `/manage` listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryListing {
    /// Table or collection names.
    #[serde(alias = "collections")]
    pub tables: Vec<Value>,
}

/// Confirmation of a statement without a result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryMessage {
    /// Human-readable confirmation.
    pub message: String,
}

/// Success body of `POST /visualize`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualizeResponse {
    /// URL of the rendered chart image.
    pub plot_url: String,
    /// Number of data points plotted.
    #[serde(default)]
    pub data_points: Option<u64>,
}

/// Success body of `POST /report`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportResponse {
    /// Download URL of the generated report.
    pub report_url: String,
    /// Number of rows written.
    #[serde(default, alias = "rows")]
    pub row_count: Option<usize>,
    /// Number of columns written.
    #[serde(default)]
    pub column_count: Option<usize>,
    /// Column names written.
    #[serde(default)]
    pub columns: Option<Vec<String>>,
}

impl ReportResponse {
    /// Column count as reported, falling back to the length of `columns`.
    pub fn column_count(&self) -> Option<usize> {
        self.column_count
            .or_else(|| self.columns.as_ref().map(Vec::len))
    }
}

/// Success body of `POST /upload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Name of the table the file was loaded into.
    pub table_name: String,
    /// Number of rows loaded.
    #[serde(alias = "rows")]
    pub row_count: usize,
    /// Columns of the new table.
    #[serde(default)]
    pub columns: Option<Vec<String>>,
}

/// Success body of `GET /history`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryResponse {
    /// Most recent queries first.
    pub history: Vec<HistoryEntry>,
}

/// One executed query as recorded by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Backend identifier.
    pub id: i64,
    /// Query text.
    pub query: String,
    /// Execution time, formatted by the backend.
    pub timestamp: String,
    /// Number of rows returned.
    #[serde(default)]
    pub result_count: Option<i64>,
    /// `success` or `error`.
    #[serde(default)]
    pub status: Option<String>,
}

/// Success body of `GET /table/<name>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableInfo {
    /// Table name.
    pub table_name: String,
    /// Column names and declared types.
    pub columns: Vec<ColumnInfo>,
    /// First rows of the table.
    #[serde(default)]
    pub sample_data: Vec<Row>,
}

/// Column description from `GET /table/<name>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,
    /// Declared SQL type.
    #[serde(rename = "type", default)]
    pub data_type: Option<String>,
}

/// Success body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Backend-reported status, e.g. `healthy`.
    pub status: String,
    /// Backend clock at the time of the check.
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Backend version.
    #[serde(default)]
    pub version: Option<String>,
}
