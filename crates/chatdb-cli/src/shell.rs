//! Interactive shell.
//!
//! Plain lines build up a query buffer; a line ending in `;` submits it.
//! Lines starting with `:` are shell commands. The query buffer is saved as
//! a draft after every edit and restored on the next start.

use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;

use anyhow::{Context, anyhow, bail};
use chatdb_client::ChartType;
use chatdb_form::{FormOrchestrator, QUERY_FIELD};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::oneshot;

use crate::TRACING_TARGET_SHELL;
use crate::config::Command;
use crate::dispatch::{endpoint_of, print_result, submit};
use crate::render::Renderer;

const HELP: &str = "\
Type SQL and end it with ';' to run it.

  :connect <uri>          connect to a database
  :tables                 list tables
  :table <name>           show columns and sample rows
  :viz <x> <y> [chart]    chart the current query (bar, line, scatter, pie)
  :report <json>          generate a report from JSON data
  :upload <path>          upload a CSV, JSON or Excel file
  :history                show recent queries
  :health                 check the backend
  :show                   print the query buffer
  :clear                  empty the query buffer
  :help                   show this help
  :quit                   leave the shell";

/// One line of shell input, parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum ShellInput {
    /// Run a command against the backend.
    Run(Command),
    /// Chart the query buffer.
    Visualize {
        x_axis: String,
        y_axis: String,
        chart: ChartType,
    },
    /// Append a line to the query buffer; `submit` when it ends in `;`.
    Text { line: String, submit: bool },
    Show,
    Clear,
    Help,
    Quit,
    Blank,
    /// Unknown or malformed shell command.
    Invalid(String),
}

/// Parses one input line.
pub fn parse_line(line: &str) -> ShellInput {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return ShellInput::Blank;
    }

    let Some(meta) = trimmed.strip_prefix(':') else {
        return ShellInput::Text {
            line: line.trim_end_matches(['\r', '\n']).to_owned(),
            submit: trimmed.ends_with(';'),
        };
    };

    let (name, rest) = match meta.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (meta, ""),
    };

    match (name, rest) {
        ("q" | "quit" | "exit", _) => ShellInput::Quit,
        ("help" | "h" | "?", _) => ShellInput::Help,
        ("show", _) => ShellInput::Show,
        ("clear", _) => ShellInput::Clear,
        ("tables", _) => ShellInput::Run(Command::Tables),
        ("history", _) => ShellInput::Run(Command::History),
        ("health", _) => ShellInput::Run(Command::Health),
        ("connect", uri) => ShellInput::Run(Command::Connect {
            db_uri: uri.to_owned(),
        }),
        ("table", name) => ShellInput::Run(Command::Table {
            name: name.to_owned(),
        }),
        ("report", data) => ShellInput::Run(Command::Report {
            data: Some(data.to_owned()),
            file: None,
        }),
        ("upload", path) => ShellInput::Run(Command::Upload {
            path: PathBuf::from(path),
        }),
        ("viz" | "visualize", args) => parse_visualize(args),
        (other, _) => ShellInput::Invalid(format!("Unknown command ':{other}', try :help")),
    }
}

fn parse_visualize(args: &str) -> ShellInput {
    let mut parts = args.split_whitespace();
    let x_axis = parts.next().unwrap_or_default().to_owned();
    let y_axis = parts.next().unwrap_or_default().to_owned();
    let chart = match parts.next().map(str::parse::<ChartType>) {
        None => ChartType::default(),
        Some(Ok(chart)) => chart,
        Some(Err(_)) => {
            return ShellInput::Invalid("Chart must be one of bar, line, scatter, pie".to_owned());
        }
    };
    ShellInput::Visualize {
        x_axis,
        y_axis,
        chart,
    }
}

/// Runs the shell until `:quit`, end of input or Ctrl-C.
///
/// Pending drafts are flushed on every exit path.
pub async fn run(form: &FormOrchestrator, renderer: &Renderer) -> anyhow::Result<()> {
    let reader = LineReader::spawn().await?;
    let session = session(form, renderer, &reader).await;

    form.flush_drafts().await?;
    tracing::debug!(target: TRACING_TARGET_SHELL, "Shell closed");
    session
}

async fn session(
    form: &FormOrchestrator,
    renderer: &Renderer,
    reader: &LineReader,
) -> anyhow::Result<()> {
    let mut buffer = form.restore_draft(QUERY_FIELD).await.unwrap_or_default();
    if !buffer.is_empty() {
        println!("Restored draft:\n{buffer}");
    }
    println!("Type :help for commands.");

    while let Some(line) = reader.read(prompt(&buffer)).await? {
        match parse_line(&line) {
            ShellInput::Blank => {}
            ShellInput::Quit => break,
            ShellInput::Help => println!("{HELP}"),
            ShellInput::Show => println!("{buffer}"),
            ShellInput::Invalid(message) => println!("Error: {message}"),
            ShellInput::Clear => {
                buffer.clear();
                form.edit_draft(QUERY_FIELD, &buffer).await;
            }
            ShellInput::Text { line, submit } => {
                if !buffer.is_empty() {
                    buffer.push('\n');
                }
                buffer.push_str(&line);
                form.edit_draft(QUERY_FIELD, &buffer).await;

                if submit {
                    let query = std::mem::take(&mut buffer);
                    execute(form, renderer, Command::Query { query }).await;
                }
            }
            ShellInput::Visualize {
                x_axis,
                y_axis,
                chart,
            } => {
                let command = Command::Visualize {
                    query: buffer.trim().trim_end_matches(';').to_owned(),
                    x_axis,
                    y_axis,
                    chart,
                };
                execute(form, renderer, command).await;
            }
            ShellInput::Run(command) => execute(form, renderer, command).await,
        }
    }

    Ok(())
}

fn prompt(buffer: &str) -> &'static str {
    if buffer.is_empty() { "chatdb> " } else { "   ...> " }
}

/// Outcome of reading one line.
enum ReadLine {
    Line(String),
    /// Ctrl-C or Ctrl-D.
    Closed,
    Failed(String),
}

type LineRequest = (String, oneshot::Sender<ReadLine>);

/// Line editor with history.
///
/// rustyline blocks, so the editor lives on its own thread and serves one
/// prompt at a time. The thread exits when the reader is dropped.
struct LineReader {
    requests: mpsc::Sender<LineRequest>,
}

impl LineReader {
    async fn spawn() -> anyhow::Result<Self> {
        let (requests, incoming) = mpsc::channel::<LineRequest>();
        let (ready, opened) = oneshot::channel::<Result<(), String>>();

        thread::Builder::new()
            .name("chatdb-readline".to_owned())
            .spawn(move || {
                let mut editor = match DefaultEditor::new() {
                    Ok(editor) => editor,
                    Err(err) => {
                        let _ = ready.send(Err(err.to_string()));
                        return;
                    }
                };
                let _ = ready.send(Ok(()));

                for (prompt, reply) in incoming {
                    if reply.send(read_line(&mut editor, &prompt)).is_err() {
                        break;
                    }
                }
            })
            .context("failed to start the line editor thread")?;

        opened
            .await
            .context("line editor thread exited")?
            .map_err(|err| anyhow!("failed to open the line editor: {err}"))?;
        Ok(Self { requests })
    }

    /// Reads one line. Returns `None` once the user leaves with Ctrl-C or
    /// Ctrl-D.
    async fn read(&self, prompt: &str) -> anyhow::Result<Option<String>> {
        let (reply, response) = oneshot::channel();
        self.requests
            .send((prompt.to_owned(), reply))
            .map_err(|_| anyhow!("line editor thread exited"))?;

        match response.await.context("line editor thread exited")? {
            ReadLine::Line(line) => Ok(Some(line)),
            ReadLine::Closed => Ok(None),
            ReadLine::Failed(err) => bail!("failed to read input: {err}"),
        }
    }
}

fn read_line(editor: &mut DefaultEditor, prompt: &str) -> ReadLine {
    match editor.readline(prompt) {
        Ok(line) => {
            if !line.trim().is_empty() {
                let _ = editor.add_history_entry(line.as_str());
            }
            ReadLine::Line(line)
        }
        Err(ReadlineError::Interrupted | ReadlineError::Eof) => ReadLine::Closed,
        Err(err) => ReadLine::Failed(err.to_string()),
    }
}

async fn execute(form: &FormOrchestrator, renderer: &Renderer, command: Command) {
    let Some(endpoint) = endpoint_of(&command) else {
        return;
    };

    match submit(form, &command).await {
        Ok(_) => print_result(form, renderer, endpoint).await,
        Err(error) => {
            tracing::warn!(
                target: TRACING_TARGET_SHELL,
                command = command.name(),
                error = %error,
                "Command failed locally"
            );
            println!("Error: {error:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_lines_build_the_query() {
        assert_eq!(
            parse_line("SELECT *"),
            ShellInput::Text {
                line: "SELECT *".into(),
                submit: false
            }
        );
        assert_eq!(
            parse_line("  FROM users;  "),
            ShellInput::Text {
                line: "  FROM users;  ".into(),
                submit: true
            }
        );
        assert_eq!(parse_line("   "), ShellInput::Blank);
    }

    #[test]
    fn meta_commands_map_to_operations() {
        assert_eq!(
            parse_line(":connect sqlite:///data/app.db"),
            ShellInput::Run(Command::Connect {
                db_uri: "sqlite:///data/app.db".into()
            })
        );
        assert_eq!(parse_line(":tables"), ShellInput::Run(Command::Tables));
        assert_eq!(
            parse_line(":table  users "),
            ShellInput::Run(Command::Table {
                name: "users".into()
            })
        );
        assert_eq!(parse_line(":q"), ShellInput::Quit);
    }

    #[test]
    fn missing_arguments_still_reach_validation() {
        assert_eq!(
            parse_line(":connect"),
            ShellInput::Run(Command::Connect { db_uri: "".into() })
        );
        assert_eq!(
            parse_line(":upload"),
            ShellInput::Run(Command::Upload {
                path: PathBuf::new()
            })
        );
    }

    #[test]
    fn visualize_parses_axes_and_chart() {
        assert_eq!(
            parse_line(":viz month total line"),
            ShellInput::Visualize {
                x_axis: "month".into(),
                y_axis: "total".into(),
                chart: ChartType::Line,
            }
        );
        assert!(matches!(
            parse_line(":viz month total donut"),
            ShellInput::Invalid(_)
        ));
    }

    #[test]
    fn prompt_marks_continuation_lines() {
        assert_eq!(prompt(""), "chatdb> ");
        assert_eq!(prompt("SELECT *"), "   ...> ");
    }

    #[test]
    fn unknown_commands_are_invalid() {
        assert!(matches!(parse_line(":drop"), ShellInput::Invalid(_)));
    }
}
