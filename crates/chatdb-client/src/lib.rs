#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod endpoint;
mod error;
mod offline;
mod service;

pub mod request;
pub mod reqwest;
pub mod response;

pub use endpoint::{Endpoint, Method};
pub use error::{BoxedError, Error, ErrorKind, OFFLINE_PLACEHOLDER, Result};
pub use offline::OfflineFallback;
pub use request::{
    ChartType, ConnectRequest, DatabaseKind, FileType, QueryRequest, ReportRequest, UploadRequest,
    VisualizeRequest,
};
pub use response::{
    ConnectResponse, HealthResponse, HistoryResponse, QueryResponse, ReportResponse, TableInfo,
    TableListing, UploadResponse, VisualizeResponse,
};
pub use service::ChatDbService;

/// Tracing target for client operations.
pub const TRACING_TARGET: &str = "chatdb_client";

/// Core trait for talking to a ChatDB backend.
///
/// Each method performs exactly one backend call. Implementations must not
/// retry; every failure is terminal for that call.
#[async_trait::async_trait]
pub trait ChatDbProvider: Send + Sync {
    /// `POST /connect`.
    async fn connect(&self, request: &ConnectRequest) -> Result<ConnectResponse>;

    /// `GET /api/tables`.
    async fn list_tables(&self) -> Result<TableListing>;

    /// `POST /manage`.
    async fn execute_query(&self, request: &QueryRequest) -> Result<QueryResponse>;

    /// `POST /visualize`.
    async fn visualize(&self, request: &VisualizeRequest) -> Result<VisualizeResponse>;

    /// `POST /report`.
    async fn generate_report(&self, request: &ReportRequest) -> Result<ReportResponse>;

    /// `POST /upload` as multipart form data.
    async fn upload_file(&self, request: &UploadRequest) -> Result<UploadResponse>;

    /// `GET /history`.
    async fn query_history(&self) -> Result<HistoryResponse>;

    /// `GET /table/<name>`.
    async fn table_info(&self, table_name: &str) -> Result<TableInfo>;

    /// `GET /health`.
    async fn health_check(&self) -> Result<HealthResponse>;
}
