//! Plain-text and JSON views of tasks for the terminal.

use serde_json::{Value, json};
use tabled::settings::Style;
use tabled::{Table, Tabled};
use time::{Date, OffsetDateTime, UtcOffset};
use todo_core::config::Palette;
use todo_core::model::Task;
use todo_core::view::{TaskStats, ViewSettings, is_overdue};

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Done")]
    done: &'static str,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Priority")]
    priority: &'static str,
    #[tabled(rename = "Due")]
    due: String,
}

impl TaskRow {
    fn new(task: &Task, today: Date) -> Self {
        let due = match task.due_date.as_str() {
            "" => "-".to_string(),
            value if is_overdue(task, today) => format!("{value} (overdue)"),
            value => value.to_string(),
        };
        Self {
            id: task.id,
            done: if task.completed { "[x]" } else { "[ ]" },
            title: task.title.clone(),
            priority: task.priority.as_str(),
            due,
        }
    }
}

pub fn local_today() -> Date {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetDateTime::now_utc().to_offset(offset).date()
}

pub fn task_table(tasks: &[Task], today: Date) -> String {
    let rows = tasks.iter().map(|task| TaskRow::new(task, today));
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Heading plus table for one projection of the list.
pub fn projection_text(
    tasks: &[Task],
    view: ViewSettings,
    today: Date,
    palette: &Palette,
) -> String {
    let projected = view.project(tasks);
    let heading = palette.accentize(&format!("Tasks ({})", projected.len()));
    let selection = palette.mutedize(&format!("filter: {}, sort: {}", view.filter, view.sort));

    if projected.is_empty() {
        format!("{heading} {selection}\nNo tasks found")
    } else {
        format!(
            "{heading} {selection}\n{}",
            task_table(&projected, today)
        )
    }
}

pub fn task_json(task: &Task, today: Date) -> Value {
    json!({
        "id": task.id,
        "createdAt": task.created_at,
        "title": task.title,
        "description": task.description,
        "priority": task.priority,
        "dueDate": task.due_date,
        "completed": task.completed,
        "overdue": is_overdue(task, today),
    })
}

pub fn tasks_json(tasks: &[Task], today: Date) -> Value {
    Value::Array(tasks.iter().map(|task| task_json(task, today)).collect())
}

pub fn task_details(task: &Task, today: Date, palette: &Palette) -> String {
    let status = if task.completed {
        "completed"
    } else if is_overdue(task, today) {
        "pending (overdue)"
    } else {
        "pending"
    };
    let or_dash = |value: &str| {
        if value.is_empty() {
            "-".to_string()
        } else {
            value.to_string()
        }
    };

    [
        format!("{} ({})", palette.accentize(&task.title), task.id),
        format!("status:      {status}"),
        format!("priority:    {}", task.priority),
        format!("due:         {}", or_dash(&task.due_date)),
        format!("created:     {}", created_label(task.created_at)),
        format!("description: {}", or_dash(&task.description)),
    ]
    .join("\n")
}

fn created_label(millis: i64) -> String {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
        .ok()
        .and_then(|at| {
            at.format(&time::format_description::well_known::Rfc3339)
                .ok()
        })
        .unwrap_or_else(|| millis.to_string())
}

pub fn stats_text(stats: &TaskStats, palette: &Palette) -> String {
    [
        palette.accentize(&format!(
            "{} tasks, {}% done",
            stats.total,
            stats.completion_percent()
        )),
        format!(
            "completed: {}  pending: {}  overdue: {}",
            stats.completed, stats.pending, stats.overdue
        ),
        palette.mutedize(&format!(
            "high: {}  medium: {}  low: {}  unspecified: {}",
            stats.high, stats.medium, stats.low, stats.unspecified
        )),
    ]
    .join("\n")
}
