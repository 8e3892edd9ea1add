//! Prints page regions and notifications.

use std::fmt::Write as _;

use chatdb_client::reqwest::ReqwestConfig;
use chatdb_client::response::{HistoryEntry, Row, TableSchema};
use chatdb_form::table::escape_html;
use chatdb_form::{Banner, DataTable, Level, Notification, RegionState, View};
use crate::config::OutputFormat;

/// Renders region state for the terminal.
#[derive(Debug, Clone)]
pub struct Renderer {
    format: OutputFormat,
    client: ReqwestConfig,
}

impl Renderer {
    /// Creates a renderer resolving relative links the way the client
    /// resolves its endpoints.
    pub fn new(format: OutputFormat, client: ReqwestConfig) -> Self {
        Self { format, client }
    }

    /// Renders one region. Returns an empty string for an empty region.
    pub fn region(&self, state: &RegionState) -> String {
        let mut out = String::new();
        if let Some(banner) = &state.banner {
            out.push_str(&self.banner(banner));
            out.push('\n');
        }
        if let Some(view) = &state.view {
            out.push_str(&self.view(view));
        }
        out
    }

    /// One-line rendering of a notification.
    pub fn notification(&self, notification: &Notification) -> String {
        format!("[{}] {}", notification.level, notification.message)
    }

    fn banner(&self, banner: &Banner) -> String {
        match self.format {
            OutputFormat::Text => match banner.level {
                Level::Success => format!("Success: {}", banner.message),
                Level::Error => format!("Error: {}", banner.message),
                Level::Warning => format!("Warning: {}", banner.message),
                Level::Info => banner.message.clone(),
            },
            OutputFormat::Html => format!(
                "<div class=\"alert alert-{}\">{}</div>",
                banner.level,
                escape_html(&banner.message)
            ),
        }
    }

    fn view(&self, view: &View) -> String {
        match view {
            View::Data(data) => {
                let mut out = String::new();
                match self.format {
                    OutputFormat::Text => match &data.table {
                        Some(table) => out.push_str(&table.to_text()),
                        None => {
                            if let Some(notice) = &data.notice {
                                let _ = writeln!(out, "{notice}");
                            }
                            let _ = writeln!(out, "{}", data.json);
                        }
                    },
                    OutputFormat::Html => {
                        let _ = writeln!(out, "<pre>{}</pre>", escape_html(&data.json));
                        match (&data.table, &data.notice) {
                            (Some(table), _) => out.push_str(&table.to_html()),
                            (None, Some(notice)) => {
                                let _ = write!(out, "<p>{}</p>", escape_html(notice));
                            }
                            (None, None) => {}
                        }
                        out.push('\n');
                    }
                }
                out
            }
            View::Listing(tables) => self.listing(tables),
            View::Chart { src } => {
                let src = self.resolve(src);
                match self.format {
                    OutputFormat::Text => format!("Chart: {src}\n"),
                    OutputFormat::Html => {
                        format!("<img src=\"{}\" alt=\"Chart\">\n", escape_html(&src))
                    }
                }
            }
            View::Download { href } => {
                let href = self.resolve(href);
                match self.format {
                    OutputFormat::Text => format!("Report: {href}\n"),
                    OutputFormat::Html => format!(
                        "<a href=\"{}\" download>Download report</a>\n",
                        escape_html(&href)
                    ),
                }
            }
            View::History(entries) => self.table(&history_table(entries)),
            View::TableDetail { info, sample } => {
                let mut out = String::new();
                let columns: Vec<Row> = info
                    .columns
                    .iter()
                    .map(|column| {
                        let mut row = Row::new();
                        row.insert("column".into(), column.name.clone().into());
                        row.insert(
                            "type".into(),
                            column.data_type.clone().unwrap_or_default().into(),
                        );
                        row
                    })
                    .collect();

                match self.format {
                    OutputFormat::Text => {
                        let _ = writeln!(out, "Table: {}", info.table_name);
                    }
                    OutputFormat::Html => {
                        let _ = writeln!(out, "<h3>{}</h3>", escape_html(&info.table_name));
                    }
                }
                out.push_str(&self.table(&DataTable::from_rows(&columns)));
                if let Some(sample) = sample {
                    out.push('\n');
                    out.push_str(&self.table(sample));
                }
                out
            }
        }
    }

    fn listing(&self, tables: &[TableSchema]) -> String {
        let mut out = String::new();
        match self.format {
            OutputFormat::Text => {
                for table in tables {
                    if table.columns.is_empty() {
                        let _ = writeln!(out, "{}", table.name);
                    } else {
                        let _ = writeln!(out, "{} ({})", table.name, table.columns.join(", "));
                    }
                }
            }
            OutputFormat::Html => {
                out.push_str("<ul>\n");
                for table in tables {
                    let _ = write!(out, "<li><strong>{}</strong>", escape_html(&table.name));
                    if !table.columns.is_empty() {
                        let _ = write!(out, ": {}", escape_html(&table.columns.join(", ")));
                    }
                    out.push_str("</li>\n");
                }
                out.push_str("</ul>\n");
            }
        }
        out
    }

    fn table(&self, table: &DataTable) -> String {
        match self.format {
            OutputFormat::Text => table.to_text(),
            OutputFormat::Html => format!("{}\n", table.to_html()),
        }
    }

    fn resolve(&self, href: &str) -> String {
        self.client
            .endpoint_url(href)
            .map(String::from)
            .unwrap_or_else(|_| href.to_owned())
    }
}

fn history_table(entries: &[HistoryEntry]) -> DataTable {
    let rows: Vec<Row> = entries
        .iter()
        .map(|entry| {
            let mut row = Row::new();
            row.insert("id".into(), entry.id.into());
            row.insert("timestamp".into(), entry.timestamp.clone().into());
            row.insert("status".into(), entry.status.clone().into());
            row.insert("rows".into(), entry.result_count.into());
            row.insert("query".into(), entry.query.clone().into());
            row
        })
        .collect();
    DataTable::from_rows(&rows)
}

#[cfg(test)]
mod tests {
    use chatdb_form::DataView;
    use serde_json::json;
    use url::Url;

    use super::*;

    fn renderer(format: OutputFormat) -> Renderer {
        Renderer::new(format, ReqwestConfig::default())
    }

    #[test]
    fn error_banner_prints_message() {
        let mut state = RegionState::default();
        state.fail("table not found");
        assert_eq!(
            renderer(OutputFormat::Text).region(&state),
            "Error: table not found\n"
        );
    }

    #[test]
    fn chart_source_resolves_against_backend() {
        let state = RegionState {
            banner: None,
            view: Some(View::Chart {
                src: "/charts/1.png?t=5".into(),
            }),
        };
        assert_eq!(
            renderer(OutputFormat::Text).region(&state),
            "Chart: http://127.0.0.1:5000/charts/1.png?t=5\n"
        );
        assert!(
            renderer(OutputFormat::Html)
                .region(&state)
                .contains("<img src=\"http://127.0.0.1:5000/charts/1.png?t=5\"")
        );
    }

    #[test]
    fn links_stay_under_base_url_prefix() {
        let base_url = Url::parse("https://example.com/chatdb").unwrap();
        let renderer = Renderer::new(OutputFormat::Text, ReqwestConfig::new(base_url));

        let download = RegionState {
            banner: None,
            view: Some(View::Download {
                href: "static/report.csv".into(),
            }),
        };
        assert_eq!(
            renderer.region(&download),
            "Report: https://example.com/chatdb/static/report.csv\n"
        );

        let chart = RegionState {
            banner: None,
            view: Some(View::Chart {
                src: "/charts/1.png?t=5".into(),
            }),
        };
        assert_eq!(
            renderer.region(&chart),
            "Chart: https://example.com/chatdb/charts/1.png?t=5\n"
        );
    }

    #[test]
    fn empty_data_prints_notice_and_json() {
        let state = RegionState {
            banner: None,
            view: Some(View::Data(DataView {
                json: "[]".into(),
                table: None,
                notice: Some("No data available or an error occurred.".into()),
            })),
        };
        let text = renderer(OutputFormat::Text).region(&state);
        assert_eq!(text, "No data available or an error occurred.\n[]\n");
    }

    #[test]
    fn history_renders_as_table() {
        let entries: Vec<HistoryEntry> = serde_json::from_value(json!([
            {"id": 7, "query": "SELECT 1", "timestamp": "2024-01-01T00:00:00", "result_count": 1, "status": "success"}
        ]))
        .unwrap();
        let table = history_table(&entries);
        assert_eq!(table.headers(), ["id", "timestamp", "status", "rows", "query"]);
        assert_eq!(table.rows()[0], ["7", "2024-01-01T00:00:00", "success", "1", "SELECT 1"]);
    }
}
