//! Type-erased provider wrapper with call logging.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tracing::Level;

use crate::{
    ChatDbProvider, ConnectRequest, ConnectResponse, Endpoint, ErrorKind, HealthResponse,
    HistoryResponse,
    QueryRequest, QueryResponse, ReportRequest, ReportResponse, Result, TRACING_TARGET, TableInfo,
    TableListing, UploadRequest, UploadResponse, VisualizeRequest, VisualizeResponse,
};

/// Cheaply clonable handle to any [`ChatDbProvider`].
///
/// Every call is logged with its endpoint and latency. Backend-reported
/// failures log at `warn`, transport failures at `error`.
#[derive(Clone)]
pub struct ChatDbService {
    inner: Arc<dyn ChatDbProvider>,
}

impl fmt::Debug for ChatDbService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatDbService").finish_non_exhaustive()
    }
}

impl ChatDbService {
    /// Creates a new service wrapper.
    pub fn new<P>(provider: P) -> Self
    where
        P: ChatDbProvider + 'static,
    {
        Self {
            inner: Arc::new(provider),
        }
    }

    async fn observe<T, F>(&self, endpoint: Endpoint, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let started_at = Instant::now();
        tracing::debug!(
            target: TRACING_TARGET,
            endpoint = %endpoint,
            path = endpoint.path(),
            "Calling backend"
        );

        let result = call.await;
        let elapsed = started_at.elapsed();

        match &result {
            Ok(_) => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    endpoint = %endpoint,
                    elapsed_ms = elapsed.as_millis(),
                    "Backend call succeeded"
                );
            }
            Err(error) if failure_level(error.kind) == Level::ERROR => {
                tracing::error!(
                    target: TRACING_TARGET,
                    endpoint = %endpoint,
                    error = %error,
                    elapsed_ms = elapsed.as_millis(),
                    "Backend call failed"
                );
            }
            Err(error) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    endpoint = %endpoint,
                    error = %error,
                    elapsed_ms = elapsed.as_millis(),
                    "Backend reported an error"
                );
            }
        }

        result
    }

    /// Connects the backend to a database.
    pub async fn connect(&self, request: &ConnectRequest) -> Result<ConnectResponse> {
        self.observe(Endpoint::Connect, self.inner.connect(request))
            .await
    }

    /// Lists tables with their columns.
    pub async fn list_tables(&self) -> Result<TableListing> {
        self.observe(Endpoint::ListTables, self.inner.list_tables())
            .await
    }

    /// Executes a query.
    pub async fn execute_query(&self, request: &QueryRequest) -> Result<QueryResponse> {
        self.observe(Endpoint::ExecuteQuery, self.inner.execute_query(request))
            .await
    }

    /// Renders a chart for a query result.
    pub async fn visualize(&self, request: &VisualizeRequest) -> Result<VisualizeResponse> {
        self.observe(Endpoint::Visualize, self.inner.visualize(request))
            .await
    }

    /// Generates a downloadable report.
    pub async fn generate_report(&self, request: &ReportRequest) -> Result<ReportResponse> {
        self.observe(Endpoint::GenerateReport, self.inner.generate_report(request))
            .await
    }

    /// Uploads a data file into a new table.
    pub async fn upload_file(&self, request: &UploadRequest) -> Result<UploadResponse> {
        self.observe(Endpoint::UploadFile, self.inner.upload_file(request))
            .await
    }

    /// Fetches recent query history.
    pub async fn query_history(&self) -> Result<HistoryResponse> {
        self.observe(Endpoint::QueryHistory, self.inner.query_history())
            .await
    }

    /// Fetches structure and sample rows of one table.
    pub async fn table_info(&self, table_name: &str) -> Result<TableInfo> {
        self.observe(Endpoint::TableInfo, self.inner.table_info(table_name))
            .await
    }

    /// Checks backend health.
    pub async fn health_check(&self) -> Result<HealthResponse> {
        self.observe(Endpoint::Health, self.inner.health_check())
            .await
    }
}

/// Level a failed call is logged at.
fn failure_level(kind: ErrorKind) -> Level {
    if kind.is_transport() {
        Level::ERROR
    } else {
        Level::WARN
    }
}
