use std::io::{BufRead, Write};
use std::time::Instant;

use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::debug;

use crate::app::App;
use crate::cli::commands::TaskCommand;
use crate::cli::handlers::{CliResult, Term, flush_notices, run_task_command};
use crate::cli::output::format_task_list;
use crate::io::storage::KvStore;
use crate::model::task::Priority;
use crate::model::view::{Filter, SortOrder};

const PROMPT: &str = "td> ";

/// One line typed at the shell prompt
#[derive(Parser)]
#[command(name = "td", no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand)]
enum ShellCommand {
    #[command(flatten)]
    Task(TaskCommand),
    /// Undo the last change
    Undo,
    /// Redo the last undone change
    Redo,
    /// Set the list filter for this session
    Filter { filter: Filter },
    /// Set the sort order for this session
    Sort { sort: SortOrder },
    /// Search task text; no query clears the search
    Search {
        #[arg(num_args = 0..)]
        query: Vec<String>,
    },
    /// Priority for the next task added without -p
    Pending { priority: Priority },
    /// Leave the shell
    #[command(alias = "exit")]
    Quit,
}

/// Read commands from `input` until `quit` or end of input.
///
/// Command errors are reported and the session continues.
pub fn run_shell<S: KvStore, R: BufRead>(app: &mut App<S>, input: R, term: &mut Term) -> CliResult {
    let mut lines = input.lines();

    if app.user_name().is_empty() {
        writeln!(term.out, "Type `help` for commands, `quit` to leave.")?;
    } else {
        writeln!(
            term.out,
            "Hello, {}. Type `help` for commands, `quit` to leave.",
            app.user_name()
        )?;
    }

    loop {
        write!(term.out, "{PROMPT}")?;
        term.out.flush()?;
        let Some(line) = lines.next() else {
            writeln!(term.out)?;
            break;
        };
        let line = line?;

        let tokens = match split_line(&line) {
            Ok(tokens) => tokens,
            Err(e) => {
                writeln!(term.err, "error: {e}")?;
                continue;
            }
        };
        if tokens.is_empty() {
            continue;
        }

        let command = match ShellLine::try_parse_from(&tokens) {
            Ok(parsed) => parsed.command,
            Err(e) => {
                // help and usage errors; clap renders both
                let rendered = e.render().to_string();
                if e.use_stderr() {
                    write!(term.err, "{rendered}")?;
                } else {
                    write!(term.out, "{rendered}")?;
                }
                continue;
            }
        };
        debug!(line = %line, "shell command");

        match command {
            ShellCommand::Quit => break,
            ShellCommand::Undo => {
                app.undo();
            }
            ShellCommand::Redo => {
                app.redo();
            }
            ShellCommand::Filter { filter } => {
                app.set_filter(filter);
                print_view(app, term)?;
            }
            ShellCommand::Sort { sort } => {
                app.set_sort(sort);
                writeln!(term.out, "Sorted by {sort}")?;
                print_view(app, term)?;
            }
            ShellCommand::Search { query } => {
                app.set_search(&query.join(" "));
                print_view(app, term)?;
            }
            ShellCommand::Pending { priority } => {
                app.set_pending_priority(priority);
                writeln!(term.out, "Next task will be {priority} priority")?;
            }
            ShellCommand::Task(cmd) => {
                let mut confirm = || match lines.next() {
                    Some(Ok(answer)) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
                    _ => false,
                };
                if let Err(e) = run_task_command(app, cmd, term, Some(&mut confirm)) {
                    writeln!(term.err, "error: {e}")?;
                }
            }
        }

        app.tick(Instant::now());
        flush_notices(app, term)?;
    }

    if let Err(e) = app.shutdown() {
        writeln!(term.err, "warning: could not save: {e}")?;
    }
    Ok(())
}

fn print_view<S: KvStore>(app: &App<S>, term: &mut Term) -> CliResult {
    writeln!(term.out, "{}", format_task_list(&app.view(), Utc::now()))?;
    Ok(())
}

/// Split a shell line into words. Single and double quotes group words;
/// a backslash outside single quotes escapes the next character.
pub fn split_line(line: &str) -> Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some('\''), c) => current.push(c),
            (_, '\\') => match chars.next() {
                Some(next) => {
                    current.push(next);
                    in_word = true;
                }
                None => return Err("trailing backslash".to_string()),
            },
            (Some(_), c) => current.push(c),
            (None, '"' | '\'') => {
                quote = Some(c);
                in_word = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if let Some(q) = quote {
        return Err(format!("unterminated {q} quote"));
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}
