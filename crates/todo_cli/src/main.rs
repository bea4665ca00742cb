use clap::{CommandFactory, Parser};
use flexi_logger::{Logger, LoggerHandle};
use std::cell::Cell;
use std::io::{self, BufRead};
use std::rc::Rc;
use todo_cli::cli::{
    Cli, Command, SessionDirective, draft_from_args, parse_session_directive, patch_from_args,
};
use todo_cli::render;
use todo_core::config::{
    Config, ConfigOverrides, Palette, load_config_with_fallback, merge_overrides,
    palette_for_theme,
};
use todo_core::error::AppError;
use todo_core::model::Task;
use todo_core::seed::HttpSeedSource;
use todo_core::storage::JsonFileStore;
use todo_core::store::{InitError, InitOutcome, TaskStore};
use todo_core::view::{TaskStats, ViewSettings};

const LOG_ENV_VAR: &str = "TODOAPP_LOG";
const DEFAULT_LOG_LEVEL: &str = "warn";

struct Output {
    json: bool,
    palette: Palette,
}

fn init_logging() -> Option<LoggerHandle> {
    let level = std::env::var(LOG_ENV_VAR)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

    match Logger::try_with_str(&level).and_then(|logger| logger.log_to_stderr().start()) {
        Ok(handle) => Some(handle),
        Err(err) => {
            eprintln!("WARN: logging disabled: {err}");
            None
        }
    }
}

fn load_config(raw_overrides: &[String]) -> Result<Config, AppError> {
    let load = load_config_with_fallback();
    if let Some(err) = load.error {
        log::warn!("using default configuration: {err}");
    }

    let mut overrides = ConfigOverrides::default();
    for raw in raw_overrides {
        overrides.push(raw)?;
    }
    Ok(merge_overrides(&load.config, &overrides))
}

/// Opens the on-disk store and runs load-or-seed. A seeding failure is
/// reported and the session continues on the empty list.
fn open_store(config: &Config) -> Result<TaskStore<JsonFileStore>, AppError> {
    let mut store = TaskStore::new(JsonFileStore::from_env()?).seed_limit(config.seed_limit());
    let source = HttpSeedSource::new(config.seed_url());

    match store.initialize(&source) {
        Ok(InitOutcome::Loaded { count }) => log::debug!("loaded {count} tasks"),
        Ok(InitOutcome::Seeded { count }) => {
            log::info!("seeded {count} tasks from {}", source.url())
        }
        Err(InitError::Seed(err)) => eprintln!("ERROR: {err}"),
        Err(err @ InitError::Storage(_)) => return Err(err.into()),
    }

    Ok(store)
}

fn task_not_found() -> AppError {
    AppError::invalid_input("task not found")
}

fn print_task(task: &Task, verb: &str, output: &Output) {
    if output.json {
        println!("{}", render::task_json(task, render::local_today()));
    } else {
        println!(
            "{verb} task: {} ({})",
            output.palette.accentize(&task.title),
            task.id
        );
    }
}

fn run_command(
    store: &mut TaskStore<JsonFileStore>,
    command: Command,
    view: ViewSettings,
    output: &Output,
) -> Result<(), AppError> {
    match command {
        Command::Add { title, fields } => {
            let draft = draft_from_args(title.as_deref(), &fields)?;
            let task = store.add(draft);
            print_task(&task, "Added", output);
        }
        Command::List { filter, sort } => {
            let view = ViewSettings {
                filter: filter.unwrap_or(view.filter),
                sort: sort.unwrap_or(view.sort),
            };
            let today = render::local_today();
            if output.json {
                println!("{}", render::tasks_json(&view.project(store.tasks()), today));
            } else {
                println!(
                    "{}",
                    render::projection_text(store.tasks(), view, today, &output.palette)
                );
            }
        }
        Command::Show { id } => {
            let task = store.get(id).ok_or_else(task_not_found)?;
            let today = render::local_today();
            if output.json {
                println!("{}", render::task_json(task, today));
            } else {
                println!("{}", render::task_details(task, today, &output.palette));
            }
        }
        Command::Toggle { id } => {
            let task = store.toggle(id).ok_or_else(task_not_found)?;
            let verb = if task.completed { "Completed" } else { "Reopened" };
            print_task(&task, verb, output);
        }
        Command::Delete { id } => {
            let task = store.delete(id).ok_or_else(task_not_found)?;
            print_task(&task, "Deleted", output);
        }
        Command::Edit { id, title, fields } => {
            let patch = patch_from_args(title.as_deref(), &fields)?;
            let task = store.update(id, &patch).ok_or_else(task_not_found)?;
            print_task(&task, "Updated", output);
        }
        Command::Stats => {
            let stats = TaskStats::from_tasks(store.tasks(), render::local_today());
            if output.json {
                let value = serde_json::to_value(&stats)
                    .map_err(|err| AppError::invalid_data(err.to_string()))?;
                println!("{value}");
            } else {
                println!("{}", render::stats_text(&stats, &output.palette));
            }
        }
    }

    Ok(())
}

fn run_once(cli: Cli) -> Result<(), AppError> {
    let config = load_config(&cli.config_override)?;
    let output = Output {
        json: cli.json,
        palette: palette_for_theme(config.theme.as_deref()),
    };
    let mut store = open_store(&config)?;
    run_command(&mut store, cli.command, ViewSettings::default(), &output)
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut quoted = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        if in_quotes && ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '"' {
            in_quotes = !in_quotes;
            quoted = true;
            continue;
        }

        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() || quoted {
                args.push(std::mem::take(&mut current));
                quoted = false;
            }
            continue;
        }

        current.push(ch);
    }

    if in_quotes {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }

    if !current.is_empty() || quoted {
        args.push(current);
    }

    Ok(args)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
    println!("Session commands: filter <all|pending|completed>, sort <created|priority|dueDate>, exit");
}

fn run_interactive() -> Result<(), AppError> {
    let config = load_config(&[])?;
    let palette = palette_for_theme(config.theme.as_deref());
    let mut store = open_store(&config)?;

    let view = Rc::new(Cell::new(ViewSettings::default()));
    // Commands run with --json keep stdout to their own JSON line.
    let rerender = Rc::new(Cell::new(true));
    let listener_view = Rc::clone(&view);
    let listener_rerender = Rc::clone(&rerender);
    let listener_palette = palette.clone();
    store.subscribe(move |tasks| {
        if !listener_rerender.get() {
            return;
        }
        let text = render::projection_text(
            tasks,
            listener_view.get(),
            render::local_today(),
            &listener_palette,
        );
        println!("{text}");
    });

    println!(
        "{}",
        render::projection_text(store.tasks(), view.get(), render::local_today(), &palette)
    );

    let mut input = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();

    loop {
        input.clear();
        let bytes = stdin_lock.read_line(&mut input)?;

        if bytes == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        if let Some(directive) = parse_session_directive(line) {
            match directive {
                Ok(SessionDirective::Filter(filter)) => view.set(ViewSettings {
                    filter,
                    ..view.get()
                }),
                Ok(SessionDirective::Sort(sort)) => view.set(ViewSettings {
                    sort,
                    ..view.get()
                }),
                Err(err) => {
                    eprintln!("ERROR: {}", err);
                    continue;
                }
            }
            println!(
                "{}",
                render::projection_text(store.tasks(), view.get(), render::local_today(), &palette)
            );
            continue;
        }

        let args = match split_command_line(line) {
            Ok(args) => args,
            Err(err) => {
                eprintln!("ERROR: {}", err);
                continue;
            }
        };

        if args.is_empty() {
            continue;
        }

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("todo".to_string());
        argv.extend(args);

        let cli = match Cli::try_parse_from(argv) {
            Ok(cli) => cli,
            Err(err) => {
                eprintln!("ERROR: {}", normalize_parse_error(err));
                continue;
            }
        };

        if !cli.config_override.is_empty() {
            eprintln!(
                "ERROR: {}",
                AppError::invalid_input("config overrides are only accepted at startup")
            );
            continue;
        }

        let output = Output {
            json: cli.json,
            palette: palette.clone(),
        };
        rerender.set(!output.json);
        let result = run_command(&mut store, cli.command, view.get(), &output);
        rerender.set(true);
        if let Err(err) = result {
            eprintln!("ERROR: {}", err);
        }
    }

    Ok(())
}

fn main() {
    let _logger = init_logging();

    let mut args = std::env::args_os();
    args.next();
    if args.next().is_none() {
        if let Err(err) = run_interactive() {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
        return;
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => {
            let _ = err.print();
            return;
        }
        Err(err) => {
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    if let Err(err) = run_once(cli) {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}
