//! Subcommands.

use std::path::PathBuf;

use chatdb_client::ChartType;
use clap::Subcommand;
use serde::{Deserialize, Serialize};

/// Operation to run against the backend.
#[derive(Debug, Clone, PartialEq, Subcommand, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    /// Connect the backend to a database.
    Connect {
        /// Database URI, e.g. `sqlite:///data/example.db`.
        db_uri: String,
    },

    /// List tables and their columns.
    Tables,

    /// Execute a query and print its result.
    Query {
        /// Query text.
        query: String,
    },

    /// Render a chart for a query.
    Visualize {
        /// Query producing the plotted rows.
        query: String,
        /// Column for the X axis.
        #[arg(long = "x")]
        x_axis: String,
        /// Column for the Y axis.
        #[arg(long = "y")]
        y_axis: String,
        /// Chart kind: bar, line, scatter or pie.
        #[arg(long, default_value = "bar")]
        chart: ChartType,
    },

    /// Generate a downloadable report from JSON data.
    #[command(group = clap::ArgGroup::new("source").required(true))]
    Report {
        /// JSON text, usually an array of row objects.
        #[arg(group = "source")]
        data: Option<String>,
        /// Read the JSON from a file instead.
        #[arg(long, group = "source")]
        file: Option<PathBuf>,
    },

    /// Upload a CSV, JSON or Excel file into a new table.
    Upload {
        /// File to upload.
        path: PathBuf,
    },

    /// Show recent query history.
    History,

    /// Show columns and sample rows of one table.
    Table {
        /// Table name.
        name: String,
    },

    /// Check backend health.
    Health,

    /// Start an interactive shell with draft restore.
    Shell,
}

impl Command {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Connect { .. } => "connect",
            Self::Tables => "tables",
            Self::Query { .. } => "query",
            Self::Visualize { .. } => "visualize",
            Self::Report { .. } => "report",
            Self::Upload { .. } => "upload",
            Self::History => "history",
            Self::Table { .. } => "table",
            Self::Health => "health",
            Self::Shell => "shell",
        }
    }
}
