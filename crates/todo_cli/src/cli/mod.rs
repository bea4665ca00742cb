use clap::{Parser, Subcommand};
use std::str::FromStr;
use todo_core::error::AppError;
use todo_core::model::{Priority, TaskDraft, TaskPatch};
use todo_core::view::{SortOrder, StatusFilter, parse_due_date};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new task
    ///
    /// Example: todo add "Buy milk" --priority high --due 2025-12-24
    Add {
        title: Option<String>,
        #[command(flatten)]
        fields: TaskFields,
    },
    /// List tasks
    ///
    /// Example: todo list
    /// Example: todo list --filter pending --sort dueDate
    List {
        /// all, pending or completed
        #[arg(long, value_parser = StatusFilter::from_str)]
        filter: Option<StatusFilter>,
        /// created, priority or dueDate
        #[arg(long, value_parser = SortOrder::from_str)]
        sort: Option<SortOrder>,
    },
    /// Show details of a task
    ///
    /// Example: todo show 1
    Show { id: i64 },
    /// Flip a task between pending and completed
    ///
    /// Example: todo toggle 1
    Toggle { id: i64 },
    /// Delete a task
    ///
    /// Example: todo delete 1
    Delete { id: i64 },
    /// Edit fields of a task
    ///
    /// Example: todo edit 1 --title "Buy organic milk"
    /// Example: todo edit 1 --due "" (clears the due date)
    Edit {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[command(flatten)]
        fields: TaskFields,
    },
    /// Show counts by status and priority
    ///
    /// Example: todo stats
    Stats,
}

/// Optional fields shared by `add` and `edit`.
#[derive(clap::Args, Debug, Default, Clone)]
pub struct TaskFields {
    #[arg(short, long)]
    pub description: Option<String>,
    /// low, medium or high
    #[arg(short, long, value_parser = Priority::from_str)]
    pub priority: Option<Priority>,
    /// Due date as YYYY-MM-DD
    #[arg(long = "due", value_name = "YYYY-MM-DD")]
    pub due_date: Option<String>,
}

impl TaskFields {
    fn checked_due_date(&self) -> Result<Option<String>, AppError> {
        match self.due_date.as_deref().map(str::trim) {
            None => Ok(None),
            Some("") => Ok(Some(String::new())),
            Some(raw) => parse_due_date(raw)
                .map(|_| Some(raw.to_string()))
                .ok_or_else(|| AppError::invalid_input("due date must be YYYY-MM-DD")),
        }
    }
}

/// Builds the draft for `add`. The title is the only required field.
pub fn draft_from_args(title: Option<&str>, fields: &TaskFields) -> Result<TaskDraft, AppError> {
    let title = match title.map(str::trim) {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => return Err(AppError::invalid_input("title is required")),
    };

    Ok(TaskDraft {
        title,
        description: fields.description.clone(),
        priority: fields.priority,
        due_date: fields.checked_due_date()?.filter(|due| !due.is_empty()),
    })
}

/// Builds the patch for `edit`; at least one field must be supplied.
pub fn patch_from_args(title: Option<&str>, fields: &TaskFields) -> Result<TaskPatch, AppError> {
    let title = match title.map(str::trim) {
        Some("") => return Err(AppError::invalid_input("title cannot be blank")),
        other => other.map(str::to_string),
    };

    let patch = TaskPatch {
        title,
        description: fields.description.clone(),
        priority: fields.priority,
        due_date: fields.checked_due_date()?,
        completed: None,
    };

    if patch.is_empty() {
        return Err(AppError::invalid_input("nothing to update"));
    }
    Ok(patch)
}

/// View changes typed inside the interactive session, e.g. `filter pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionDirective {
    Filter(StatusFilter),
    Sort(SortOrder),
}

pub fn parse_session_directive(line: &str) -> Option<Result<SessionDirective, AppError>> {
    let (keyword, rest) = line.trim().split_once(char::is_whitespace)?;
    match keyword {
        "filter" => Some(rest.parse().map(SessionDirective::Filter)),
        "sort" => Some(rest.parse().map(SessionDirective::Sort)),
        _ => None,
    }
}
