//! Runs a single command through the orchestrator and prints the result.

use std::path::Path;

use anyhow::{Context, bail};
use chatdb_client::{ConnectRequest, Endpoint, QueryRequest, VisualizeRequest};
use chatdb_form::{FormOrchestrator, Outcome, region_of};

use crate::TRACING_TARGET_COMMAND;
use crate::config::Command;
use crate::render::Renderer;

/// Backend operation behind a command, if any.
pub fn endpoint_of(command: &Command) -> Option<Endpoint> {
    let endpoint = match command {
        Command::Connect { .. } => Endpoint::Connect,
        Command::Tables => Endpoint::ListTables,
        Command::Query { .. } => Endpoint::ExecuteQuery,
        Command::Visualize { .. } => Endpoint::Visualize,
        Command::Report { .. } => Endpoint::GenerateReport,
        Command::Upload { .. } => Endpoint::UploadFile,
        Command::History => Endpoint::QueryHistory,
        Command::Table { .. } => Endpoint::TableInfo,
        Command::Health => Endpoint::Health,
        Command::Shell => return None,
    };
    Some(endpoint)
}

/// Submits `command` and waits for its outcome.
///
/// Local I/O failures, such as an unreadable report or upload file, are
/// returned as errors; everything else is an [`Outcome`]. An upload without
/// a file name is not read and goes straight to validation.
pub async fn submit(form: &FormOrchestrator, command: &Command) -> anyhow::Result<Outcome> {
    tracing::debug!(target: TRACING_TARGET_COMMAND, command = command.name(), "Submitting");

    let outcome = match command {
        Command::Connect { db_uri } => form.connect(ConnectRequest::sql(db_uri)).await,
        Command::Tables => form.list_tables().await,
        Command::Query { query } => form.execute_query(QueryRequest::new(query)).await,
        Command::Visualize {
            query,
            x_axis,
            y_axis,
            chart,
        } => {
            form.visualize(VisualizeRequest::new(query, x_axis, y_axis, *chart))
                .await
        }
        Command::Report { data, file } => {
            let text = match (data, file) {
                (Some(data), _) => data.clone(),
                (None, Some(file)) => tokio::fs::read_to_string(file)
                    .await
                    .with_context(|| format!("failed to read {}", file.display()))?,
                (None, None) => String::new(),
            };
            form.generate_report(&text).await
        }
        Command::Upload { path } => {
            let name = file_name(path);
            let contents = if name.is_empty() {
                Vec::new()
            } else {
                tokio::fs::read(path)
                    .await
                    .with_context(|| format!("failed to read {}", path.display()))?
            };
            form.upload_file(&name, contents).await
        }
        Command::History => form.query_history().await,
        Command::Table { name } => form.table_info(name).await,
        Command::Health => form.health_check().await,
        Command::Shell => bail!("the shell cannot be submitted as a command"),
    };

    Ok(outcome)
}

/// Prints the command's region to stdout and pending notifications to stderr.
pub async fn print_result(form: &FormOrchestrator, renderer: &Renderer, endpoint: Endpoint) {
    let state = form.page().region(region_of(endpoint)).await;
    print!("{}", renderer.region(&state));

    for notification in form.page().drain_notifications().await {
        eprintln!("{}", renderer.notification(&notification));
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
