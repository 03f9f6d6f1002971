use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::model::task::{Priority, TaskId};
use crate::model::view::{Filter, SortOrder};

#[derive(Parser)]
#[command(name = "td", about = concat!("taskdeck v", env!("CARGO_PKG_VERSION"), " - a personal task list"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Directory holding the task store
    #[arg(short = 'd', long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Config file (default: ~/.config/taskdeck/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(flatten)]
    Task(TaskCommand),
    /// Interactive session with undo/redo
    Shell,
}

/// Commands available both from the command line and inside `td shell`
#[derive(Subcommand)]
pub enum TaskCommand {
    /// Add a task to the top of the list
    Add(AddArgs),
    /// List tasks
    #[command(alias = "ls")]
    List(ListArgs),
    /// Mark a task done, or reopen it
    Toggle(IdArgs),
    /// Change a task's text
    Edit(EditArgs),
    /// Delete a task
    #[command(alias = "delete")]
    Rm(IdArgs),
    /// Copy a task to the top of the list
    Dup(IdArgs),
    /// Cycle a task's priority (low → medium → high → low)
    Priority(IdArgs),
    /// Move a task
    Mv(MvArgs),
    /// Put tasks in the given order; unlisted tasks follow
    Reorder(ReorderArgs),
    /// Delete all completed tasks
    ClearCompleted,
    /// Delete every task
    ClearAll(ClearAllArgs),
    /// Append tasks from a JSON export
    Import(ImportArgs),
    /// Write all tasks as JSON
    Export(ExportArgs),
    /// Show task counts
    Stats,
    /// Show or set your display name
    Name(NameArgs),
}

#[derive(Args)]
pub struct AddArgs {
    /// Task text
    #[arg(required = true, num_args = 1..)]
    pub text: Vec<String>,
    /// low, medium or high
    #[arg(short, long)]
    pub priority: Option<Priority>,
}

#[derive(Args, Default)]
pub struct ListArgs {
    /// all, active, completed, high, medium or low
    #[arg(short, long)]
    pub filter: Option<Filter>,
    /// date, priority or alphabetical
    #[arg(short, long)]
    pub sort: Option<SortOrder>,
    /// Only tasks containing this text (case-insensitive)
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Args)]
pub struct IdArgs {
    /// Task ID
    pub id: TaskId,
}

#[derive(Args)]
pub struct EditArgs {
    /// Task ID
    pub id: TaskId,
    /// New text
    #[arg(required = true, num_args = 1..)]
    pub text: Vec<String>,
}

#[derive(Args)]
#[command(group(clap::ArgGroup::new("position").required(true).args(["top", "bottom", "after"])))]
pub struct MvArgs {
    /// Task ID
    pub id: TaskId,
    /// Move to the top
    #[arg(long)]
    pub top: bool,
    /// Move to the bottom
    #[arg(long)]
    pub bottom: bool,
    /// Move directly below this task
    #[arg(long)]
    pub after: Option<TaskId>,
}

#[derive(Args)]
pub struct ReorderArgs {
    /// Task IDs in the wanted order
    #[arg(required = true, num_args = 1..)]
    pub ids: Vec<TaskId>,
}

#[derive(Args)]
pub struct ClearAllArgs {
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Args)]
pub struct ImportArgs {
    /// JSON file to import
    pub file: PathBuf,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Output file (default: todos-<date>.json; `-` for stdout)
    pub file: Option<String>,
}

#[derive(Args)]
pub struct NameArgs {
    /// New name (omit to show the current one)
    #[arg(num_args = 0..)]
    pub name: Vec<String>,
}
