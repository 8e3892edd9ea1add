//! Scripted provider for orchestrator tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chatdb_client::{
    ChatDbProvider, ConnectRequest, ConnectResponse, Endpoint, Error, ErrorKind, HealthResponse,
    HistoryResponse, QueryRequest, QueryResponse, ReportRequest, ReportResponse, Result,
    TableInfo, TableListing, UploadRequest, UploadResponse, VisualizeRequest, VisualizeResponse,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

struct Reply {
    delay: Duration,
    body: std::result::Result<Value, (ErrorKind, String)>,
}

#[derive(Default)]
struct MockState {
    calls: Mutex<Vec<Endpoint>>,
    replies: Mutex<HashMap<Endpoint, VecDeque<Reply>>>,
}

/// Provider answering from a per-endpoint script and recording every call.
///
/// An endpoint without a scripted reply fails with a network error.
#[derive(Clone, Default)]
pub(crate) struct MockProvider {
    state: Arc<MockState>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, endpoint: Endpoint, reply: Reply) {
        let mut replies = self.state.replies.lock().unwrap();
        replies.entry(endpoint).or_default().push_back(reply);
    }

    /// Queues a successful JSON body.
    pub fn reply(self, endpoint: Endpoint, body: Value) -> Self {
        self.delayed(endpoint, Duration::ZERO, body)
    }

    /// Queues a successful JSON body delivered after `delay`.
    pub fn delayed(self, endpoint: Endpoint, delay: Duration, body: Value) -> Self {
        self.push(endpoint, Reply { delay, body: Ok(body) });
        self
    }

    /// Queues a failure.
    pub fn fail(self, endpoint: Endpoint, kind: ErrorKind, message: &str) -> Self {
        self.push(
            endpoint,
            Reply {
                delay: Duration::ZERO,
                body: Err((kind, message.to_owned())),
            },
        );
        self
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<Endpoint> {
        self.state.calls.lock().unwrap().clone()
    }

    async fn answer<T: DeserializeOwned>(&self, endpoint: Endpoint) -> Result<T> {
        self.state.calls.lock().unwrap().push(endpoint);
        let reply = self
            .state
            .replies
            .lock()
            .unwrap()
            .get_mut(&endpoint)
            .and_then(VecDeque::pop_front);

        let Some(reply) = reply else {
            return Err(Error::network_error().with_message("no scripted reply"));
        };

        if !reply.delay.is_zero() {
            tokio::time::sleep(reply.delay).await;
        }

        match reply.body {
            Ok(body) => Ok(serde_json::from_value(body)?),
            Err((kind, message)) => Err(Error::new(kind).with_message(message)),
        }
    }
}

#[async_trait::async_trait]
impl ChatDbProvider for MockProvider {
    async fn connect(&self, _: &ConnectRequest) -> Result<ConnectResponse> {
        self.answer(Endpoint::Connect).await
    }

    async fn list_tables(&self) -> Result<TableListing> {
        self.answer(Endpoint::ListTables).await
    }

    async fn execute_query(&self, _: &QueryRequest) -> Result<QueryResponse> {
        self.answer(Endpoint::ExecuteQuery).await
    }

    async fn visualize(&self, _: &VisualizeRequest) -> Result<VisualizeResponse> {
        self.answer(Endpoint::Visualize).await
    }

    async fn generate_report(&self, _: &ReportRequest) -> Result<ReportResponse> {
        self.answer(Endpoint::GenerateReport).await
    }

    async fn upload_file(&self, _: &UploadRequest) -> Result<UploadResponse> {
        self.answer(Endpoint::UploadFile).await
    }

    async fn query_history(&self) -> Result<HistoryResponse> {
        self.answer(Endpoint::QueryHistory).await
    }

    async fn table_info(&self, _: &str) -> Result<TableInfo> {
        self.answer(Endpoint::TableInfo).await
    }

    async fn health_check(&self) -> Result<HealthResponse> {
        self.answer(Endpoint::Health).await
    }
}
