use std::fs;
use std::io::{self, Write};
use std::path::Path;

use chrono::Utc;
use tracing::debug;

use crate::app::{App, AppOptions, NoticeLevel, plural};
use crate::cli::commands::*;
use crate::cli::output::*;
use crate::cli::shell;
use crate::io::config_io::{self, DATA_DIR_ENV};
use crate::io::storage::{DirStore, KvStore};
use crate::model::view::ViewState;
use crate::ops::query;
use crate::ops::task_ops::InsertPosition;
use crate::ops::transfer;

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Output streams for one command
pub struct Term<'a> {
    pub out: &'a mut dyn Write,
    pub err: &'a mut dyn Write,
    pub json: bool,
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CliResult {
    let config = config_io::load_config(cli.config.as_deref())?;
    let env_dir = std::env::var(DATA_DIR_ENV).ok();
    let data_dir = config_io::resolve_data_dir(cli.data_dir.as_deref(), env_dir.as_deref(), &config);
    debug!(dir = %data_dir.display(), "using data directory");

    let mut app = App::open(DirStore::new(&data_dir), &AppOptions::from(&config));

    let stdout = io::stdout();
    let stderr = io::stderr();
    let mut out = stdout.lock();
    let mut err = stderr.lock();
    let mut term = Term {
        out: &mut out,
        err: &mut err,
        json: cli.json,
    };

    let result = match cli.command {
        None => run_task_command(&mut app, TaskCommand::List(ListArgs::default()), &mut term, None),
        Some(Commands::Task(cmd)) => run_task_command(&mut app, cmd, &mut term, None),
        Some(Commands::Shell) => {
            let stdin = io::stdin();
            shell::run_shell(&mut app, stdin.lock(), &mut term)
        }
    };

    // A failed save along the way leaves the app dirty; retry once before exit
    if app.is_dirty() {
        app.shutdown()?;
    }
    result
}

/// Run one task command against `app`. Shared by the command line and the shell.
///
/// `confirm` answers destructive prompts; without it `clear-all` needs `--yes`.
pub fn run_task_command<S: KvStore>(
    app: &mut App<S>,
    cmd: TaskCommand,
    term: &mut Term,
    confirm: Option<&mut dyn FnMut() -> bool>,
) -> CliResult {
    let result = match cmd {
        TaskCommand::Add(args) => cmd_add(app, args, term),
        TaskCommand::List(args) => cmd_list(app, args, term),
        TaskCommand::Toggle(args) => app.toggle(args.id).map(drop).map_err(Into::into),
        TaskCommand::Edit(args) => app.edit(args.id, &args.text.join(" ")).map_err(Into::into),
        TaskCommand::Rm(args) => app.remove(args.id).map(drop).map_err(Into::into),
        TaskCommand::Dup(args) => cmd_dup(app, args, term),
        TaskCommand::Priority(args) => app.cycle_priority(args.id).map(drop).map_err(Into::into),
        TaskCommand::Mv(args) => cmd_mv(app, args),
        TaskCommand::Reorder(args) => {
            app.reorder(&args.ids);
            Ok(())
        }
        TaskCommand::ClearCompleted => {
            app.clear_completed();
            Ok(())
        }
        TaskCommand::ClearAll(args) => cmd_clear_all(app, args, term, confirm),
        TaskCommand::Import(args) => cmd_import(app, args, term),
        TaskCommand::Export(args) => cmd_export(app, args, term),
        TaskCommand::Stats => cmd_stats(app, term),
        TaskCommand::Name(args) => cmd_name(app, args, term),
    };
    // Notices from a failed command still describe what happened
    flush_notices(app, term)?;
    result
}

/// Print pending notices. Warnings, and everything in JSON mode, go to stderr.
pub fn flush_notices<S: KvStore>(app: &mut App<S>, term: &mut Term) -> io::Result<()> {
    for notice in app.take_notices() {
        let line = format_notice(&notice);
        if notice.level == NoticeLevel::Warning || term.json {
            writeln!(term.err, "{line}")?;
        } else {
            writeln!(term.out, "{line}")?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Task commands
// ---------------------------------------------------------------------------

fn cmd_add<S: KvStore>(app: &mut App<S>, args: AddArgs, term: &mut Term) -> CliResult {
    let id = app.add(&args.text.join(" "), args.priority)?;
    if term.json {
        writeln!(term.out, "{}", serde_json::json!({ "id": id }))?;
    }
    Ok(())
}

fn cmd_dup<S: KvStore>(app: &mut App<S>, args: IdArgs, term: &mut Term) -> CliResult {
    let id = app.duplicate(args.id)?;
    if term.json {
        writeln!(term.out, "{}", serde_json::json!({ "id": id }))?;
    }
    Ok(())
}

fn cmd_list<S: KvStore>(app: &mut App<S>, args: ListArgs, term: &mut Term) -> CliResult {
    // Flags narrow this listing only; the session's view is left alone
    let current = app.view_state();
    let view = ViewState {
        filter: args.filter.unwrap_or(current.filter),
        sort: args.sort.unwrap_or(current.sort),
        search: args.search.unwrap_or_else(|| current.search.clone()),
        pending_priority: current.pending_priority,
    };
    let tasks = query::view_for(app.tasks(), &view);

    if term.json {
        let out = ListJson {
            filter: view.filter,
            sort: view.sort,
            search: &view.search,
            tasks,
        };
        writeln!(term.out, "{}", serde_json::to_string_pretty(&out)?)?;
    } else {
        writeln!(term.out, "{}", format_task_list(&tasks, Utc::now()))?;
    }
    Ok(())
}

fn cmd_mv<S: KvStore>(app: &mut App<S>, args: MvArgs) -> CliResult {
    let position = match (args.top, args.bottom, args.after) {
        (_, _, Some(target)) => InsertPosition::After(target),
        (true, _, None) => InsertPosition::Top,
        _ => InsertPosition::Bottom,
    };
    app.move_task(args.id, position)?;
    Ok(())
}

fn cmd_clear_all<S: KvStore>(
    app: &mut App<S>,
    args: ClearAllArgs,
    term: &mut Term,
    confirm: Option<&mut dyn FnMut() -> bool>,
) -> CliResult {
    let count = app.tasks().len();
    if !args.yes && count > 0 {
        let Some(confirm) = confirm else {
            return Err("clear-all deletes every task; pass --yes to confirm".into());
        };
        write!(term.out, "Delete all {}? This cannot be undone. [y/N] ", plural(count, "task"))?;
        term.out.flush()?;
        if !confirm() {
            writeln!(term.out, "Cancelled")?;
            return Ok(());
        }
    }
    app.clear_all();
    Ok(())
}

// ---------------------------------------------------------------------------
// Import / export
// ---------------------------------------------------------------------------

fn cmd_import<S: KvStore>(app: &mut App<S>, args: ImportArgs, term: &mut Term) -> CliResult {
    let json = fs::read_to_string(&args.file)
        .map_err(|e| format!("could not read {}: {}", args.file.display(), e))?;
    let result = app.import_json(&json)?;
    if term.json {
        let reassigned: Vec<_> = result
            .reassigned
            .iter()
            .map(|(from, to)| serde_json::json!({ "from": from, "to": to }))
            .collect();
        writeln!(
            term.out,
            "{}",
            serde_json::json!({ "imported": result.count, "reassigned": reassigned })
        )?;
    } else {
        for (from, to) in &result.reassigned {
            writeln!(term.out, "id {from} was taken, imported as {to}")?;
        }
    }
    Ok(())
}

fn cmd_export<S: KvStore>(app: &mut App<S>, args: ExportArgs, term: &mut Term) -> CliResult {
    let json = app.export_json()?;
    let target = args
        .file
        .unwrap_or_else(|| transfer::export_file_name(Utc::now()));
    if target == "-" {
        writeln!(term.out, "{json}")?;
        return Ok(());
    }
    let path = Path::new(&target);
    fs::write(path, format!("{json}\n"))
        .map_err(|e| format!("could not write {}: {}", path.display(), e))?;
    let message = format!("Exported {} to {}", plural(app.tasks().len(), "task"), path.display());
    if term.json {
        writeln!(term.err, "{message}")?;
    } else {
        writeln!(term.out, "{message}")?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Stats and name
// ---------------------------------------------------------------------------

fn cmd_stats<S: KvStore>(app: &mut App<S>, term: &mut Term) -> CliResult {
    let stats = app.stats();
    if term.json {
        writeln!(term.out, "{}", serde_json::to_string_pretty(&StatsJson::from(stats))?)?;
    } else {
        writeln!(term.out, "{}", format_stats(&stats))?;
    }
    Ok(())
}

fn cmd_name<S: KvStore>(app: &mut App<S>, args: NameArgs, term: &mut Term) -> CliResult {
    if args.name.is_empty() {
        if term.json {
            writeln!(term.out, "{}", serde_json::json!({ "name": app.user_name() }))?;
        } else if app.user_name().is_empty() {
            writeln!(term.out, "No name set")?;
        } else {
            writeln!(term.out, "{}", app.user_name())?;
        }
        return Ok(());
    }
    app.set_user_name(&args.name.join(" "))?;
    Ok(())
}
