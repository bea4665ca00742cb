//! Pure projections of the task list: filtering, ordering and summary
//! counts. Nothing here touches storage.

use crate::error::AppError;
use crate::model::{Priority, Task};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use time::Date;
use time::macros::format_description;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Completed,
}

impl StatusFilter {
    pub const ALL: [StatusFilter; 3] = [Self::All, Self::Pending, Self::Completed];

    /// The one token used both to select and to render this filter.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }

    pub fn matches(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Pending => !task.completed,
            Self::Completed => task.completed,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Created,
    Priority,
    DueDate,
}

impl SortOrder {
    pub const ALL: [SortOrder; 3] = [Self::Created, Self::Priority, Self::DueDate];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Priority => "priority",
            Self::DueDate => "dueDate",
        }
    }

    pub fn compare(self, a: &Task, b: &Task) -> Ordering {
        match self {
            Self::Created => b.created_at.cmp(&a.created_at),
            Self::Priority => b.priority.rank().cmp(&a.priority.rank()),
            Self::DueDate => due_key(&a.due_date).cmp(&due_key(&b.due_date)),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusFilter {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        parse_token(raw, &Self::ALL, Self::as_str, "filter")
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        parse_token(raw, &Self::ALL, Self::as_str, "sort order")
    }
}

/// Looks `raw` up among the tokens `as_str` renders for `choices`.
fn parse_token<T: Copy>(
    raw: &str,
    choices: &[T],
    as_str: fn(T) -> &'static str,
    label: &str,
) -> Result<T, AppError> {
    let token = raw.trim();
    choices
        .iter()
        .copied()
        .find(|candidate| as_str(*candidate) == token)
        .ok_or_else(|| {
            let expected: Vec<&str> = choices.iter().map(|candidate| as_str(*candidate)).collect();
            AppError::invalid_input(format!(
                "unknown {label} '{token}' (expected one of: {})",
                expected.join(", ")
            ))
        })
}

/// Sort key for due dates: valid dates first in calendar order, then
/// unparseable text, then tasks without a due date.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum DueKey<'a> {
    Dated(Date),
    Unparsed(&'a str),
    Undated,
}

fn due_key(raw: &str) -> DueKey<'_> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return DueKey::Undated;
    }
    match parse_due_date(trimmed) {
        Some(date) => DueKey::Dated(date),
        None => DueKey::Unparsed(trimmed),
    }
}

pub fn parse_due_date(raw: &str) -> Option<Date> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]")).ok()
}

/// Session-local view selection. Never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewSettings {
    pub filter: StatusFilter,
    pub sort: SortOrder,
}

impl ViewSettings {
    pub fn project(&self, tasks: &[Task]) -> Vec<Task> {
        project(tasks, self.filter, self.sort)
    }
}

/// Filters, then stably sorts a copy of `tasks`.
pub fn project(tasks: &[Task], filter: StatusFilter, sort: SortOrder) -> Vec<Task> {
    let mut projected: Vec<Task> = tasks
        .iter()
        .filter(|task| filter.matches(task))
        .cloned()
        .collect();
    projected.sort_by(|a, b| sort.compare(a, b));
    projected
}

/// A pending task whose due date has passed.
pub fn is_overdue(task: &Task, today: Date) -> bool {
    !task.completed && parse_due_date(&task.due_date).is_some_and(|due| due < today)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub overdue: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub unspecified: usize,
}

impl TaskStats {
    pub fn from_tasks(tasks: &[Task], today: Date) -> Self {
        let mut stats = Self {
            total: tasks.len(),
            ..Self::default()
        };

        for task in tasks {
            if task.completed {
                stats.completed += 1;
            } else {
                stats.pending += 1;
            }
            if is_overdue(task, today) {
                stats.overdue += 1;
            }
            match task.priority {
                Priority::High => stats.high += 1,
                Priority::Medium => stats.medium += 1,
                Priority::Low => stats.low += 1,
                Priority::Unspecified => stats.unspecified += 1,
            }
        }

        stats
    }

    /// Share of completed tasks, 0 to 100.
    pub fn completion_percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        u8::try_from(self.completed * 100 / self.total).unwrap_or(100)
    }
}
