//! Offline fallback decorator.
//!
//! Wraps any [`ChatDbProvider`] and intercepts every call. When the network
//! is unreachable the call resolves to [`Error::offline`], which carries
//! [`OFFLINE_PLACEHOLDER`] as its message. Every other outcome passes
//! through untouched.
//!
//! [`OFFLINE_PLACEHOLDER`]: crate::OFFLINE_PLACEHOLDER

use crate::{
    ChatDbProvider, ConnectRequest, ConnectResponse, Error, ErrorKind, HealthResponse,
    HistoryResponse, QueryRequest, QueryResponse, ReportRequest, ReportResponse, Result,
    TRACING_TARGET, TableInfo, TableListing, UploadRequest, UploadResponse, VisualizeRequest,
    VisualizeResponse,
};

/// Provider decorator that answers with an offline placeholder when the
/// backend cannot be reached.
#[derive(Debug, Clone)]
pub struct OfflineFallback<P> {
    inner: P,
}

impl<P> OfflineFallback<P> {
    /// Wraps `inner`.
    pub fn new(inner: P) -> Self {
        Self { inner }
    }

    /// Returns the wrapped provider.
    pub fn into_inner(self) -> P {
        self.inner
    }

    fn intercept<T>(result: Result<T>) -> Result<T> {
        match result {
            Err(error) if error.kind == ErrorKind::NetworkError => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    error = %error,
                    "Network unreachable, serving offline placeholder"
                );
                Err(Error::offline().with_source(error))
            }
            other => other,
        }
    }
}

#[async_trait::async_trait]
impl<P: ChatDbProvider> ChatDbProvider for OfflineFallback<P> {
    async fn connect(&self, request: &ConnectRequest) -> Result<ConnectResponse> {
        Self::intercept(self.inner.connect(request).await)
    }

    async fn list_tables(&self) -> Result<TableListing> {
        Self::intercept(self.inner.list_tables().await)
    }

    async fn execute_query(&self, request: &QueryRequest) -> Result<QueryResponse> {
        Self::intercept(self.inner.execute_query(request).await)
    }

    async fn visualize(&self, request: &VisualizeRequest) -> Result<VisualizeResponse> {
        Self::intercept(self.inner.visualize(request).await)
    }

    async fn generate_report(&self, request: &ReportRequest) -> Result<ReportResponse> {
        Self::intercept(self.inner.generate_report(request).await)
    }

    async fn upload_file(&self, request: &UploadRequest) -> Result<UploadResponse> {
        Self::intercept(self.inner.upload_file(request).await)
    }

    async fn query_history(&self) -> Result<HistoryResponse> {
        Self::intercept(self.inner.query_history().await)
    }

    async fn table_info(&self, table_name: &str) -> Result<TableInfo> {
        Self::intercept(self.inner.table_info(table_name).await)
    }

    async fn health_check(&self) -> Result<HealthResponse> {
        Self::intercept(self.inner.health_check().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OFFLINE_PLACEHOLDER;

    /// Provider whose every call fails with a fixed error kind.
    struct Failing(ErrorKind);

    #[async_trait::async_trait]
    impl ChatDbProvider for Failing {
        async fn connect(&self, _: &ConnectRequest) -> Result<ConnectResponse> {
            Err(Error::new(self.0).with_message("failed"))
        }

        async fn list_tables(&self) -> Result<TableListing> {
            Ok(TableListing::default())
        }

        async fn execute_query(&self, _: &QueryRequest) -> Result<QueryResponse> {
            Err(Error::new(self.0))
        }

        async fn visualize(&self, _: &VisualizeRequest) -> Result<VisualizeResponse> {
            Err(Error::new(self.0))
        }

        async fn generate_report(&self, _: &ReportRequest) -> Result<ReportResponse> {
            Err(Error::new(self.0))
        }

        async fn upload_file(&self, _: &UploadRequest) -> Result<UploadResponse> {
            Err(Error::new(self.0))
        }

        async fn query_history(&self) -> Result<HistoryResponse> {
            Err(Error::new(self.0))
        }

        async fn table_info(&self, _: &str) -> Result<TableInfo> {
            Err(Error::new(self.0))
        }

        async fn health_check(&self) -> Result<HealthResponse> {
            Err(Error::new(self.0))
        }
    }

    #[tokio::test]
    async fn network_errors_become_offline() {
        let provider = OfflineFallback::new(Failing(ErrorKind::NetworkError));
        let err = provider
            .connect(&ConnectRequest::sql("sqlite://"))
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Offline);
        assert_eq!(err.message(), OFFLINE_PLACEHOLDER);
        assert!(err.source.is_some());
    }

    #[tokio::test]
    async fn other_outcomes_pass_through() {
        let provider = OfflineFallback::new(Failing(ErrorKind::Backend));
        let err = provider
            .connect(&ConnectRequest::sql("sqlite://"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Backend);
        assert_eq!(err.message(), "failed");

        let listing = provider.list_tables().await.unwrap();
        assert!(listing.tables.is_empty());

        let provider = OfflineFallback::new(Failing(ErrorKind::Timeout));
        let err = provider.health_check().await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Timeout);
    }
}
