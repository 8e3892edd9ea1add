//! Backend endpoint catalogue.

use strum::{AsRefStr, Display, EnumIter, IntoStaticStr};

/// HTTP method used by an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// `GET`.
    Get,
    /// `POST`.
    Post,
}

/// Operations exposed by the ChatDB backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Endpoint {
    /// `POST /connect`
    Connect,
    /// `GET /api/tables`
    ListTables,
    /// `POST /manage`
    ExecuteQuery,
    /// `POST /visualize`
    Visualize,
    /// `POST /report`
    GenerateReport,
    /// `POST /upload` (multipart)
    UploadFile,
    /// `GET /history`
    QueryHistory,
    /// `GET /table/<name>`
    TableInfo,
    /// `GET /health`
    Health,
}

impl Endpoint {
    /// Path relative to the backend base URL, without a leading slash.
    ///
    /// [`Endpoint::TableInfo`] returns its collection prefix; the table name
    /// is appended as a separate, percent-encoded segment.
    pub const fn path(&self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::ListTables => "api/tables",
            Self::ExecuteQuery => "manage",
            Self::Visualize => "visualize",
            Self::GenerateReport => "report",
            Self::UploadFile => "upload",
            Self::QueryHistory => "history",
            Self::TableInfo => "table",
            Self::Health => "health",
        }
    }

    /// HTTP method of the endpoint.
    pub const fn method(&self) -> Method {
        match self {
            Self::ListTables | Self::QueryHistory | Self::TableInfo | Self::Health => Method::Get,
            Self::Connect
            | Self::ExecuteQuery
            | Self::Visualize
            | Self::GenerateReport
            | Self::UploadFile => Method::Post,
        }
    }
}
