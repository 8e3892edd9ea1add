//! Tabular rendering of JSON rows.
//!
//! Headers are the keys of the first row, in insertion order. Every row
//! contributes one body row with one cell per header key; keys missing from
//! a later row, and explicit nulls, render as empty cells. Keys that only
//! appear in later rows are ignored.

use std::fmt::Write as _;

use chatdb_client::response::Row;
use comfy_table::Table;
use comfy_table::presets::ASCII_MARKDOWN;
use serde_json::Value;

/// A rendered table: header labels plus cell text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl DataTable {
    /// Builds a table from rows, taking headers from the first row.
    ///
    /// An empty slice produces a table with no headers and no rows.
    pub fn from_rows<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = &'a Row>,
    {
        let mut rows = rows.into_iter().peekable();
        let headers: Vec<String> = match rows.peek() {
            Some(first) => first.keys().cloned().collect(),
            None => return Self::default(),
        };

        let rows = rows
            .map(|row| {
                headers
                    .iter()
                    .map(|key| row.get(key).map(cell_text).unwrap_or_default())
                    .collect()
            })
            .collect();

        Self { headers, rows }
    }

    /// Header labels, in first-row key order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Body rows, each holding one cell per header.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Returns `true` when the table has no body rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Renders the table as HTML with escaped cell text.
    pub fn to_html(&self) -> String {
        let mut html = String::from("<table>\n<thead>\n<tr>");
        for header in &self.headers {
            let _ = write!(html, "<th>{}</th>", escape_html(header));
        }
        html.push_str("</tr>\n</thead>\n<tbody>\n");
        for row in &self.rows {
            html.push_str("<tr>");
            for cell in row {
                let _ = write!(html, "<td>{}</td>", escape_html(cell));
            }
            html.push_str("</tr>\n");
        }
        html.push_str("</tbody>\n</table>");
        html
    }

    /// Renders the table as a Markdown-style grid for a terminal.
    ///
    /// A table without headers renders as an empty string.
    pub fn to_text(&self) -> String {
        if self.headers.is_empty() {
            return String::new();
        }

        let mut table = Table::new();
        table
            .load_preset(ASCII_MARKDOWN)
            .set_header(&self.headers);
        for row in &self.rows {
            table.add_row(row);
        }
        format!("{table}\n")
    }
}

/// Display text of a single cell.
///
/// Strings render without quotes, other scalars with their JSON text and
/// nested values as compact JSON. Null renders as an empty cell.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Escapes text for inclusion in HTML element content or attributes.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn rows(value: Value) -> Vec<Row> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn headers_follow_first_row_order() {
        let data = rows(json!([
            {"zeta": 1, "alpha": "a", "mid": true},
            {"alpha": "b", "zeta": 2, "mid": false},
        ]));
        let table = DataTable::from_rows(&data);

        assert_eq!(table.headers(), ["zeta", "alpha", "mid"]);
        assert_eq!(table.rows()[1], ["2", "b", "false"]);
    }

    #[test]
    fn one_body_row_per_element_and_one_cell_per_key() {
        let data = rows(json!([
            {"id": 1, "name": "Ada"},
            {"id": 2},
            {"id": 3, "name": null, "extra": "ignored"},
        ]));
        let table = DataTable::from_rows(&data);

        assert_eq!(table.rows().len(), 3);
        assert!(table.rows().iter().all(|row| row.len() == 2));
        assert_eq!(table.rows()[1], ["2", ""]);
        assert_eq!(table.rows()[2], ["3", ""]);

        let html = table.to_html();
        assert_eq!(html.matches("<th>").count(), 2);
        assert_eq!(html.matches("<tr>").count(), 4);
        assert_eq!(html.matches("<td>").count(), 6);
    }

    #[test]
    fn nested_values_render_as_compact_json() {
        let data = rows(json!([{"tags": ["a", "b"], "meta": {"k": 1}, "n": 1.5}]));
        let table = DataTable::from_rows(&data);
        assert_eq!(table.rows()[0], [r#"["a","b"]"#, r#"{"k":1}"#, "1.5"]);
    }

    #[test]
    fn empty_input_renders_empty_table() {
        let table = DataTable::from_rows(&Vec::<Row>::new());
        assert!(table.is_empty());
        assert!(table.headers().is_empty());
    }

    #[test]
    fn html_escapes_cell_text() {
        let data = rows(json!([{"<b>": "Tom & \"Jerry\""}]));
        let html = DataTable::from_rows(&data).to_html();
        assert!(html.contains("<th>&lt;b&gt;</th>"));
        assert!(html.contains("<td>Tom &amp; &quot;Jerry&quot;</td>"));
    }

    #[test]
    fn text_columns_are_aligned() {
        let data = rows(json!([
            {"id": 1, "name": "Ada"},
            {"id": 200, "name": "Grace"},
        ]));
        let text = DataTable::from_rows(&data).to_text();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "| id  | name  |");
        assert!(lines[1].starts_with("|-"));
        assert_eq!(lines[2], "| 1   | Ada   |");
        assert_eq!(lines[3], "| 200 | Grace |");
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn empty_table_renders_no_text() {
        assert_eq!(DataTable::default().to_text(), "");
    }
}
