//! Reqwest-based HTTP client for the ChatDB backend.

use std::sync::Arc;

use ::reqwest::multipart::{Form, Part};
use ::reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use url::Url;

use super::error::classify;
use super::{ReqwestConfig, TRACING_TARGET};
use crate::response::decode_envelope;
use crate::{
    ChatDbProvider, ChatDbService, ConnectRequest, ConnectResponse, Endpoint, HealthResponse,
    HistoryResponse, OfflineFallback, QueryRequest, QueryResponse, ReportRequest, ReportResponse,
    Result, TableInfo, TableListing, UploadRequest, UploadResponse, VisualizeRequest,
    VisualizeResponse,
};

/// Inner client that holds the HTTP client and configuration.
struct ReqwestClientInner {
    http: Client,
    config: ReqwestConfig,
}

/// Reqwest-based HTTP client for the ChatDB backend.
///
/// Each provider call issues exactly one HTTP request. There is no retry
/// and no backoff.
///
/// # Examples
///
/// ```rust,ignore
/// use chatdb_client::reqwest::{ReqwestClient, ReqwestConfig};
/// use chatdb_client::{ChatDbProvider, QueryRequest};
///
/// let client = ReqwestClient::new(ReqwestConfig::default())?;
/// let response = client.execute_query(&QueryRequest::new("SELECT 1")).await?;
/// ```
#[derive(Clone)]
pub struct ReqwestClient {
    inner: Arc<ReqwestClientInner>,
}

impl std::fmt::Debug for ReqwestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestClient")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl ReqwestClient {
    /// Creates a new reqwest client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be created.
    pub fn new(config: ReqwestConfig) -> Result<Self> {
        config.validate()?;

        let timeout = config.effective_timeout();
        let user_agent = config.effective_user_agent();

        tracing::debug!(
            target: TRACING_TARGET,
            base_url = %config.base_url,
            timeout_ms = timeout.as_millis(),
            "Creating reqwest client"
        );

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(&user_agent)
            .build()
            .map_err(|err| crate::Error::configuration().with_source(err))?;

        let inner = ReqwestClientInner { http, config };
        let client = Self {
            inner: Arc::new(inner),
        };

        tracing::info!(
            target: TRACING_TARGET,
            "Reqwest client created successfully"
        );

        Ok(client)
    }

    /// Gets the client configuration.
    pub fn config(&self) -> &ReqwestConfig {
        &self.inner.config
    }

    /// Converts this client into a [`ChatDbService`], wrapping it in the
    /// offline fallback when the configuration asks for it.
    pub fn into_service(self) -> ChatDbService {
        if self.config().offline_fallback {
            ChatDbService::new(OfflineFallback::new(self))
        } else {
            ChatDbService::new(self)
        }
    }

    fn request(&self, endpoint: Endpoint, url: Url) -> RequestBuilder {
        match endpoint.method() {
            crate::Method::Get => self.inner.http.get(url),
            crate::Method::Post => self.inner.http.post(url),
        }
    }

    fn builder(&self, endpoint: Endpoint) -> Result<RequestBuilder> {
        let url = self.config().endpoint_url(endpoint.path())?;
        Ok(self.request(endpoint, url))
    }

    /// Sends the request and decodes the response envelope.
    async fn send<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        request: RequestBuilder,
    ) -> Result<T> {
        let response = request.send().await.map_err(classify)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(classify)?;

        tracing::debug!(
            target: TRACING_TARGET,
            endpoint = %endpoint,
            status,
            body_len = body.len(),
            "Received backend response"
        );

        decode_envelope(status, &body)
    }
}

#[async_trait::async_trait]
impl ChatDbProvider for ReqwestClient {
    async fn connect(&self, request: &ConnectRequest) -> Result<ConnectResponse> {
        let builder = self.builder(Endpoint::Connect)?.json(request);
        self.send(Endpoint::Connect, builder).await
    }

    async fn list_tables(&self) -> Result<TableListing> {
        let builder = self.builder(Endpoint::ListTables)?;
        self.send(Endpoint::ListTables, builder).await
    }

    async fn execute_query(&self, request: &QueryRequest) -> Result<QueryResponse> {
        let builder = self.builder(Endpoint::ExecuteQuery)?.json(request);
        self.send(Endpoint::ExecuteQuery, builder).await
    }

    async fn visualize(&self, request: &VisualizeRequest) -> Result<VisualizeResponse> {
        let builder = self.builder(Endpoint::Visualize)?.json(request);
        self.send(Endpoint::Visualize, builder).await
    }

    async fn generate_report(&self, request: &ReportRequest) -> Result<ReportResponse> {
        let builder = self.builder(Endpoint::GenerateReport)?.json(request);
        self.send(Endpoint::GenerateReport, builder).await
    }

    async fn upload_file(&self, request: &UploadRequest) -> Result<UploadResponse> {
        let file = Part::bytes(request.contents.clone()).file_name(request.file_name.clone());
        let form = Form::new()
            .part("file", file)
            .text("file_type", request.file_type.to_string());

        let builder = self.builder(Endpoint::UploadFile)?.multipart(form);
        self.send(Endpoint::UploadFile, builder).await
    }

    async fn query_history(&self) -> Result<HistoryResponse> {
        let builder = self.builder(Endpoint::QueryHistory)?;
        self.send(Endpoint::QueryHistory, builder).await
    }

    async fn table_info(&self, table_name: &str) -> Result<TableInfo> {
        let mut url = self.config().endpoint_url(Endpoint::TableInfo.path())?;
        url.path_segments_mut()
            .map_err(|()| {
                crate::Error::configuration().with_message("Base URL cannot carry path segments")
            })?
            .pop_if_empty()
            .push(table_name);

        let builder = self.request(Endpoint::TableInfo, url);
        self.send(Endpoint::TableInfo, builder).await
    }

    async fn health_check(&self) -> Result<HealthResponse> {
        let builder = self.builder(Endpoint::Health)?;
        self.send(Endpoint::Health, builder).await
    }
}
