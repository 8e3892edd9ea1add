//! Request envelopes sent to the ChatDB backend.
//!
//! Every request type trims its text inputs on construction and exposes a
//! `validate` method. Validation never touches the network; a failed check
//! yields an [`ErrorKind::InvalidInput`] error whose message names the
//! offending field.
//!
//! [`ErrorKind::InvalidInput`]: crate::ErrorKind::InvalidInput

use std::path::Path;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::{Error, Result};

/// Message used when the report payload is not valid JSON.
pub const INVALID_JSON_MESSAGE: &str = "Invalid JSON data provided for the report.";

/// Checks that a trimmed field is non-empty and returns the trimmed value.
///
/// # Errors
///
/// Returns an invalid input error naming `field` when the value is blank.
pub fn require_field(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::invalid_input()
            .with_message(format!("{field} is required"))
            .with_context(field.to_owned()));
    }
    Ok(trimmed.to_owned())
}

/// Database families understood by the legacy request schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DatabaseKind {
    /// Relational database reached through a SQLAlchemy-style URI.
    Sql,
    /// MongoDB.
    Nosql,
}

/// Body of `POST /connect`.
///
/// The SQL form serializes to `{"db_uri": ...}`. The MongoDB form keeps the
/// older `{"db_type": "nosql", "mongo_uri": ..., "db_name": ...}` shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ConnectRequest {
    /// Connect to a relational database.
    Sql {
        /// Database URI, e.g. `sqlite:///data/example.db`.
        db_uri: String,
    },
    /// Connect to a MongoDB database.
    Mongo {
        /// Always [`DatabaseKind::Nosql`].
        db_type: DatabaseKind,
        /// MongoDB connection string.
        mongo_uri: String,
        /// Database name on the MongoDB server.
        db_name: String,
    },
}

impl ConnectRequest {
    /// Creates a SQL connection request.
    pub fn sql(db_uri: impl AsRef<str>) -> Self {
        Self::Sql {
            db_uri: db_uri.as_ref().trim().to_owned(),
        }
    }

    /// Creates a MongoDB connection request.
    pub fn mongo(mongo_uri: impl AsRef<str>, db_name: impl AsRef<str>) -> Self {
        Self::Mongo {
            db_type: DatabaseKind::Nosql,
            mongo_uri: mongo_uri.as_ref().trim().to_owned(),
            db_name: db_name.as_ref().trim().to_owned(),
        }
    }

    /// Validates that the URI (and database name, for MongoDB) are present.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Sql { db_uri } => require_field("Database URI", db_uri).map(drop),
            Self::Mongo {
                mongo_uri, db_name, ..
            } => {
                require_field("MongoDB URI", mongo_uri)?;
                require_field("Database name", db_name).map(drop)
            }
        }
    }
}

/// Body of `POST /manage`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Query text. SQL, or a JSON filter document for MongoDB.
    pub query: String,
    /// Legacy database selector; omitted for the SQL-only schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_type: Option<DatabaseKind>,
    /// Legacy MongoDB collection name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_name: Option<String>,
}

impl QueryRequest {
    /// Creates a query request for the SQL-only schema.
    pub fn new(query: impl AsRef<str>) -> Self {
        Self {
            query: query.as_ref().trim().to_owned(),
            db_type: None,
            collection_name: None,
        }
    }

    /// Creates a legacy MongoDB query against `collection_name`.
    pub fn mongo(query: impl AsRef<str>, collection_name: impl AsRef<str>) -> Self {
        let collection_name = collection_name.as_ref().trim();
        Self {
            query: query.as_ref().trim().to_owned(),
            db_type: Some(DatabaseKind::Nosql),
            collection_name: (!collection_name.is_empty()).then(|| collection_name.to_owned()),
        }
    }

    /// Validates that the query is non-empty.
    pub fn validate(&self) -> Result<()> {
        require_field("Query", &self.query)?;
        if self.db_type == Some(DatabaseKind::Nosql) && self.collection_name.is_none() {
            return Err(Error::invalid_input()
                .with_message("Collection name is required")
                .with_context("collection_name"));
        }
        Ok(())
    }
}

/// Chart kinds the visualization endpoint can draw.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChartType {
    /// Bar chart.
    #[default]
    Bar,
    /// Line chart.
    Line,
    /// Scatter plot.
    Scatter,
    /// Pie chart.
    Pie,
}

/// Body of `POST /visualize`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualizeRequest {
    /// Query whose result feeds the chart.
    pub query: String,
    /// Column plotted on the x axis.
    pub x_axis: String,
    /// Column plotted on the y axis.
    pub y_axis: String,
    /// Chart kind.
    #[serde(default)]
    pub chart_type: ChartType,
}

impl VisualizeRequest {
    /// Creates a visualization request.
    pub fn new(
        query: impl AsRef<str>,
        x_axis: impl AsRef<str>,
        y_axis: impl AsRef<str>,
        chart_type: ChartType,
    ) -> Self {
        Self {
            query: query.as_ref().trim().to_owned(),
            x_axis: x_axis.as_ref().trim().to_owned(),
            y_axis: y_axis.as_ref().trim().to_owned(),
            chart_type,
        }
    }

    /// Validates that query and both axes are present.
    pub fn validate(&self) -> Result<()> {
        require_field("Query", &self.query)?;
        require_field("X-axis", &self.x_axis)?;
        require_field("Y-axis", &self.y_axis)?;
        Ok(())
    }
}

/// Body of `POST /report`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRequest {
    /// Arbitrary JSON, usually an array of row objects.
    pub data: serde_json::Value,
}

impl ReportRequest {
    /// Creates a report request from an already parsed value.
    pub fn new(data: serde_json::Value) -> Self {
        Self { data }
    }

    /// Parses user-supplied text into a report request.
    ///
    /// # Errors
    ///
    /// Returns an invalid input error with [`INVALID_JSON_MESSAGE`] when the
    /// text is not valid JSON. The parser diagnostic goes into the context.
    pub fn from_text(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map(Self::new)
            .map_err(|err| {
                Error::invalid_input()
                    .with_message(INVALID_JSON_MESSAGE)
                    .with_context(err.to_string())
            })
    }
}

/// File formats accepted by `POST /upload`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FileType {
    /// Comma-separated values.
    Csv,
    /// JSON document or array.
    Json,
    /// Excel workbook.
    Excel,
}

impl FileType {
    /// Infers the file type from a file name's extension.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let extension = Path::new(file_name)
            .extension()?
            .to_str()?
            .to_ascii_lowercase();

        match extension.as_str() {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            "xls" | "xlsx" => Some(Self::Excel),
            _ => None,
        }
    }
}

/// Multipart body of `POST /upload`.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadRequest {
    /// Name of the selected file, sent as the part's file name.
    pub file_name: String,
    /// Raw file contents.
    pub contents: Vec<u8>,
    /// Declared file format.
    pub file_type: FileType,
}

impl std::fmt::Debug for UploadRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadRequest")
            .field("file_name", &self.file_name)
            .field("size", &self.contents.len())
            .field("file_type", &self.file_type)
            .finish()
    }
}

impl UploadRequest {
    /// Creates an upload request with an explicit file type.
    pub fn new(file_name: impl Into<String>, contents: Vec<u8>, file_type: FileType) -> Self {
        Self {
            file_name: file_name.into(),
            contents,
            file_type,
        }
    }

    /// Creates an upload request, inferring the type from the file name.
    ///
    /// # Errors
    ///
    /// Returns an invalid input error when no file is named or the extension
    /// is not one of the accepted formats.
    pub fn infer(file_name: impl Into<String>, contents: Vec<u8>) -> Result<Self> {
        let file_name = require_field("File", &file_name.into())?;
        let file_type = FileType::from_file_name(&file_name).ok_or_else(|| {
            Error::invalid_input()
                .with_message("File type not allowed. Please upload CSV, JSON, or Excel files.")
                .with_context(file_name.clone())
        })?;
        Ok(Self::new(file_name, contents, file_type))
    }

    /// Validates that a file has been selected.
    pub fn validate(&self) -> Result<()> {
        require_field("File", &self.file_name).map(drop)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_connect_sql_serializes_uri_only() {
        let request = ConnectRequest::sql("  sqlite:///data/example.db ");
        assert!(request.validate().is_ok());
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({ "db_uri": "sqlite:///data/example.db" })
        );
    }

    #[test]
    fn test_connect_mongo_keeps_legacy_shape() {
        let request = ConnectRequest::mongo("mongodb://localhost:27017", "chatdb");
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "db_type": "nosql",
                "mongo_uri": "mongodb://localhost:27017",
                "db_name": "chatdb",
            })
        );
    }

    #[test]
    fn test_blank_uri_is_rejected() {
        let err = ConnectRequest::sql("   ").validate().unwrap_err();
        assert!(err.kind.is_validation());
        assert_eq!(err.message(), "Database URI is required");

        let err = ConnectRequest::mongo("mongodb://h", " ")
            .validate()
            .unwrap_err();
        assert_eq!(err.message(), "Database name is required");
    }

    #[test]
    fn test_query_omits_legacy_fields() {
        let request = QueryRequest::new("SELECT 1");
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({ "query": "SELECT 1" })
        );

        let request = QueryRequest::mongo("{}", "users");
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({ "query": "{}", "db_type": "nosql", "collection_name": "users" })
        );
    }

    #[test]
    fn test_query_validation() {
        assert!(QueryRequest::new(" \n\t").validate().is_err());
        assert!(QueryRequest::mongo("{}", "").validate().is_err());
        assert!(QueryRequest::new("SELECT * FROM users").validate().is_ok());
    }

    #[test]
    fn test_visualize_requires_axes() {
        let request = VisualizeRequest::new("SELECT a, b FROM t", "a", "", ChartType::Line);
        assert_eq!(request.validate().unwrap_err().message(), "Y-axis is required");

        let request = VisualizeRequest::new("SELECT a, b FROM t", " ", "b", ChartType::Line);
        assert_eq!(request.validate().unwrap_err().message(), "X-axis is required");

        let request = VisualizeRequest::new("SELECT a, b FROM t", "a", "b", ChartType::Scatter);
        assert!(request.validate().is_ok());
        assert_eq!(serde_json::to_value(&request).unwrap()["chart_type"], "scatter");
    }

    #[test]
    fn test_report_rejects_malformed_json() {
        let err = ReportRequest::from_text("{bad json").unwrap_err();
        assert!(err.kind.is_validation());
        assert_eq!(err.message(), INVALID_JSON_MESSAGE);
        assert!(err.context.is_some());

        let ok = ReportRequest::from_text(r#"[{"a": 1}]"#).unwrap();
        assert_eq!(ok.data, json!([{ "a": 1 }]));
    }

    #[test]
    fn test_file_type_inference() {
        assert_eq!(FileType::from_file_name("sales.CSV"), Some(FileType::Csv));
        assert_eq!(FileType::from_file_name("dump.json"), Some(FileType::Json));
        assert_eq!(FileType::from_file_name("book.xlsx"), Some(FileType::Excel));
        assert_eq!(FileType::from_file_name("notes.txt"), None);
        assert_eq!(FileType::from_file_name("README"), None);

        assert!(UploadRequest::infer("notes.txt", Vec::new()).is_err());
        assert!(UploadRequest::infer("", Vec::new()).is_err());
        let upload = UploadRequest::infer("sales.csv", b"a,b\n1,2\n".to_vec()).unwrap();
        assert_eq!(upload.file_type, FileType::Csv);
    }
}
