//! Form orchestration.
//!
//! Every operation follows the same path: take a request token for its
//! output region, mark the page busy, validate, make exactly one backend
//! call, then render the outcome into the region and push one notification.
//! Validation failures never reach the backend.

use std::sync::Arc;

use chatdb_client::request::require_field;
use chatdb_client::response::TableSchema;
use chatdb_client::{
    ChatDbService, ConnectRequest, Endpoint, Error, ErrorKind, QueryRequest, QueryResponse,
    ReportRequest, Result, UploadRequest, VisualizeRequest,
};
use jiff::Timestamp;
use serde::Serialize;

use crate::draft::DraftDebouncer;
use crate::page::{DataView, Level, Page, Region, RegionState, View};
use crate::table::{DataTable, cell_text};
use crate::token::{RequestToken, RequestTokens};
use crate::ui::{self, BusyGuard};

/// Tracing target for orchestrated operations.
pub const TRACING_TARGET: &str = "chatdb_form::orchestrator";

/// Shown in place of a table when a query returns no rows.
pub const NO_DATA_NOTICE: &str = "No data available or an error occurred.";

/// How a submission ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The response rendered; carries the success notification text.
    Rendered(String),
    /// The call failed; carries the error shown to the user.
    Failed(String),
    /// Input was invalid and no call was made.
    Rejected(String),
    /// A newer submission for the same region superseded this one.
    Discarded,
}

impl Outcome {
    /// Text shown to the user, if the outcome rendered anything.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Rendered(message) | Self::Failed(message) | Self::Rejected(message) => {
                Some(message)
            }
            Self::Discarded => None,
        }
    }

    /// Returns `true` for [`Outcome::Rendered`].
    pub fn is_rendered(&self) -> bool {
        matches!(self, Self::Rendered(_))
    }
}

/// Region each operation renders into.
pub fn region_of(endpoint: Endpoint) -> Region {
    match endpoint {
        Endpoint::Connect => Region::Connection,
        Endpoint::ListTables | Endpoint::TableInfo => Region::Tables,
        Endpoint::ExecuteQuery => Region::DataOutput,
        Endpoint::Visualize => Region::Chart,
        Endpoint::GenerateReport => Region::Report,
        Endpoint::UploadFile => Region::Upload,
        Endpoint::QueryHistory => Region::History,
        Endpoint::Health => Region::Health,
    }
}

/// Generic message shown when an operation fails below the backend.
pub fn failure_message(endpoint: Endpoint) -> &'static str {
    match endpoint {
        Endpoint::Connect => "An error occurred while connecting to the database.",
        Endpoint::ListTables => "An error occurred while listing tables.",
        Endpoint::ExecuteQuery => "An error occurred while executing the query.",
        Endpoint::Visualize => "An error occurred while generating the visualization.",
        Endpoint::GenerateReport => "An error occurred while generating the report.",
        Endpoint::UploadFile => "An error occurred while uploading the file.",
        Endpoint::QueryHistory => "An error occurred while loading query history.",
        Endpoint::TableInfo => "An error occurred while loading table details.",
        Endpoint::Health => "An error occurred while checking backend health.",
    }
}

/// Text shown to the user for a failed call.
///
/// Validation and backend messages pass through verbatim, as does the
/// offline placeholder. Everything else collapses to the operation's
/// generic message.
fn user_message(endpoint: Endpoint, error: &Error) -> String {
    match error.kind {
        ErrorKind::InvalidInput | ErrorKind::Backend | ErrorKind::Offline => {
            error.message().to_owned()
        }
        _ => failure_message(endpoint).to_owned(),
    }
}

fn pretty<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

/// One in-flight submission. Dropping it clears its share of the busy
/// indicator.
struct Submission {
    endpoint: Endpoint,
    token: RequestToken,
    _busy: BusyGuard,
}

/// Drives the ChatDB forms against a backend and renders into a [`Page`].
#[derive(Debug, Clone)]
pub struct FormOrchestrator {
    service: ChatDbService,
    page: Page,
    tokens: Arc<RequestTokens>,
    drafts: Option<Arc<DraftDebouncer>>,
}

impl FormOrchestrator {
    /// Creates an orchestrator rendering into a fresh page.
    pub fn new(service: ChatDbService) -> Self {
        Self {
            service,
            page: Page::new(),
            tokens: Arc::new(RequestTokens::new()),
            drafts: None,
        }
    }

    /// Enables draft persistence through `drafts`.
    #[must_use]
    pub fn with_drafts(mut self, drafts: Arc<DraftDebouncer>) -> Self {
        self.drafts = Some(drafts);
        self
    }

    /// The page this orchestrator renders into.
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Records an edit of `field`; persisted after the debounce window.
    pub async fn edit_draft(&self, field: &str, value: &str) {
        if let Some(drafts) = &self.drafts {
            drafts.edit(field, value).await;
        }
    }

    /// Returns the saved draft of `field`, exactly as it was typed.
    pub async fn restore_draft(&self, field: &str) -> Option<String> {
        let drafts = self.drafts.as_ref()?;
        let restored = drafts.store().load(field).await;
        if restored.is_some() {
            tracing::debug!(target: TRACING_TARGET, field, "Restored draft");
        }
        restored
    }

    /// Writes pending draft edits immediately.
    pub async fn flush_drafts(&self) -> Result<()> {
        match &self.drafts {
            Some(drafts) => drafts.flush().await,
            None => Ok(()),
        }
    }

    fn begin(&self, endpoint: Endpoint) -> Submission {
        let token = self.tokens.issue(region_of(endpoint));
        tracing::debug!(
            target: TRACING_TARGET,
            operation = %endpoint,
            sequence = token.sequence(),
            "Submission started"
        );
        Submission {
            endpoint,
            token,
            _busy: ui::busy(&self.page),
        }
    }

    async fn reject(&self, submission: Submission, error: Error) -> Outcome {
        let message = error.message().to_owned();
        tracing::info!(
            target: TRACING_TARGET,
            operation = %submission.endpoint,
            message = %message,
            "Submission rejected"
        );

        let shown = self
            .page
            .commit(&self.tokens, submission.token, |state| state.fail(&message))
            .await;
        if shown.is_none() {
            return Outcome::Discarded;
        }

        ui::toast(&self.page, Level::Error, message.clone()).await;
        Outcome::Rejected(message)
    }

    async fn settle<T>(
        &self,
        submission: Submission,
        result: Result<T>,
        render: impl FnOnce(&mut RegionState, T) -> String,
    ) -> Outcome {
        let Submission {
            endpoint, token, ..
        } = submission;

        match result {
            Ok(response) => {
                let rendered = self
                    .page
                    .commit(&self.tokens, token, |state| render(state, response))
                    .await;
                let Some(message) = rendered else {
                    return Outcome::Discarded;
                };

                tracing::info!(
                    target: TRACING_TARGET,
                    operation = %endpoint,
                    message = %message,
                    "Submission rendered"
                );
                ui::toast(&self.page, Level::Success, message.clone()).await;
                Outcome::Rendered(message)
            }
            Err(error) => {
                let message = user_message(endpoint, &error);
                if error.kind.is_transport() {
                    tracing::error!(
                        target: TRACING_TARGET,
                        operation = %endpoint,
                        error = %error,
                        "Submission failed"
                    );
                }

                let shown = self
                    .page
                    .commit(&self.tokens, token, |state| state.fail(&message))
                    .await;
                if shown.is_none() {
                    return Outcome::Discarded;
                }

                ui::toast(&self.page, Level::Error, message.clone()).await;
                Outcome::Failed(message)
            }
        }
    }

    /// Connects the backend to a database.
    pub async fn connect(&self, request: ConnectRequest) -> Outcome {
        let submission = self.begin(Endpoint::Connect);
        if let Err(error) = request.validate() {
            return self.reject(submission, error).await;
        }

        let result = self.service.connect(&request).await;
        self.settle(submission, result, |state, response| {
            state.succeed(Some(response.message.clone()), None);
            response.message
        })
        .await
    }

    /// Lists the tables of the current connection.
    pub async fn list_tables(&self) -> Outcome {
        let submission = self.begin(Endpoint::ListTables);
        let result = self.service.list_tables().await;
        self.settle(submission, result, |state, listing| {
            let message = format!("Found {} tables", listing.tables.len());
            state.succeed(None, Some(View::Listing(listing.tables)));
            message
        })
        .await
    }

    /// Executes a query and renders its result.
    pub async fn execute_query(&self, request: QueryRequest) -> Outcome {
        let submission = self.begin(Endpoint::ExecuteQuery);
        if let Err(error) = request.validate() {
            return self.reject(submission, error).await;
        }

        let result = self.service.execute_query(&request).await;
        self.settle(submission, result, render_query).await
    }

    /// Renders a chart for a query.
    pub async fn visualize(&self, request: VisualizeRequest) -> Outcome {
        let submission = self.begin(Endpoint::Visualize);
        if let Err(error) = request.validate() {
            return self.reject(submission, error).await;
        }

        let result = self.service.visualize(&request).await;
        self.settle(submission, result, |state, response| {
            let src = ui::cache_bust(&response.plot_url, Timestamp::now());
            state.succeed(None, Some(View::Chart { src }));
            match response.data_points {
                Some(points) => format!("Visualization generated with {points} data points"),
                None => "Visualization generated".to_owned(),
            }
        })
        .await
    }

    /// Generates a downloadable report from JSON text.
    pub async fn generate_report(&self, data: &str) -> Outcome {
        let submission = self.begin(Endpoint::GenerateReport);
        let request = match ReportRequest::from_text(data) {
            Ok(request) => request,
            Err(error) => return self.reject(submission, error).await,
        };

        let result = self.service.generate_report(&request).await;
        self.settle(submission, result, |state, response| {
            let message = match (response.row_count, response.column_count()) {
                (Some(rows), Some(columns)) => {
                    format!("Report generated with {rows} rows and {columns} columns")
                }
                _ => "Report generated successfully".to_owned(),
            };
            state.succeed(
                None,
                Some(View::Download {
                    href: response.report_url,
                }),
            );
            message
        })
        .await
    }

    /// Uploads a data file into a new table.
    ///
    /// An empty `file_name` means no file was selected.
    pub async fn upload_file(&self, file_name: &str, contents: Vec<u8>) -> Outcome {
        let submission = self.begin(Endpoint::UploadFile);
        let request = match UploadRequest::infer(file_name, contents) {
            Ok(request) => request,
            Err(error) => return self.reject(submission, error).await,
        };

        let result = self.service.upload_file(&request).await;
        self.settle(submission, result, |state, response| {
            let message = format!(
                "File uploaded as table '{}' with {} rows",
                response.table_name, response.row_count
            );
            state.succeed(Some(message.clone()), None);
            message
        })
        .await
    }

    /// Loads recent query history.
    pub async fn query_history(&self) -> Outcome {
        let submission = self.begin(Endpoint::QueryHistory);
        let result = self.service.query_history().await;
        self.settle(submission, result, |state, response| {
            let message = format!("Loaded {} history entries", response.history.len());
            state.succeed(None, Some(View::History(response.history)));
            message
        })
        .await
    }

    /// Loads the structure and sample rows of one table.
    pub async fn table_info(&self, table_name: &str) -> Outcome {
        let submission = self.begin(Endpoint::TableInfo);
        let table_name = match require_field("Table name", table_name) {
            Ok(name) => name,
            Err(error) => return self.reject(submission, error).await,
        };

        let result = self.service.table_info(&table_name).await;
        self.settle(submission, result, |state, info| {
            let message = format!(
                "Table '{}' has {} columns",
                info.table_name,
                info.columns.len()
            );
            let sample = (!info.sample_data.is_empty())
                .then(|| DataTable::from_rows(&info.sample_data));
            state.succeed(None, Some(View::TableDetail { info, sample }));
            message
        })
        .await
    }

    /// Checks backend health.
    pub async fn health_check(&self) -> Outcome {
        let submission = self.begin(Endpoint::Health);
        let result = self.service.health_check().await;
        self.settle(submission, result, |state, response| {
            let message = match response.version {
                Some(version) => format!("Backend is {} (version {version})", response.status),
                None => format!("Backend is {}", response.status),
            };
            state.succeed(Some(message.clone()), None);
            message
        })
        .await
    }
}

fn render_query(state: &mut RegionState, response: QueryResponse) -> String {
    match response {
        QueryResponse::Rows(result) => {
            let count = result.row_count();
            let table = result
                .rows()
                .filter(|rows| !rows.is_empty())
                .map(DataTable::from_rows);
            let notice = table.is_none().then(|| NO_DATA_NOTICE.to_owned());
            state.succeed(
                None,
                Some(View::Data(DataView {
                    json: pretty(&result.data),
                    table,
                    notice,
                })),
            );
            format!("Query returned {count} rows")
        }
        QueryResponse::Listing(listing) => {
            let tables: Vec<TableSchema> = listing
                .tables
                .iter()
                .map(|name| TableSchema {
                    name: cell_text(name),
                    columns: Vec::new(),
                })
                .collect();
            let message = format!("Found {} tables", tables.len());
            state.succeed(None, Some(View::Listing(tables)));
            message
        }
        QueryResponse::Message(confirmation) => {
            state.succeed(Some(confirmation.message.clone()), None);
            confirmation.message
        }
        QueryResponse::Empty(body) => {
            state.succeed(
                None,
                Some(View::Data(DataView {
                    json: pretty(&body),
                    table: None,
                    notice: Some(NO_DATA_NOTICE.to_owned()),
                })),
            );
            "Query executed".to_owned()
        }
    }
}
