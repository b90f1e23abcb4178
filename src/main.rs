//! td - a single-user todo store with JSON persistence and backups.

use clap::Parser;
use colored::*;
use eyre::{Context, Result, bail};
use log::info;
use std::fs;
use std::path::PathBuf;
use todolist::{
    Body, Client, Config, Daemon, DaemonConfig, Draft, ListArgs, Priority, Request, Response, Statistics, Status,
    Todo, TodoPatch, TodoStore, UpdateArgs, daemon_pid, dispatch, is_daemon_running, serve_stdio,
};

mod cli;

use cli::{Cli, Command};

fn setup_logging() -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("todolist")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("todolist.log");

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::from_env();
    if let Some(file) = &cli.file {
        config = config.with_todo_file(file);
    }
    if let Some(dir) = &cli.backup_dir {
        config = config.with_backup_dir(dir);
    }
    config.ensure_backup_dir()?;
    info!(
        "Using todo file {} with backups in {}",
        config.todo_file.display(),
        config.backup_dir.display()
    );
    Ok(config)
}

fn format_status(status: Status) -> ColoredString {
    match status {
        Status::Pending => "pending".normal(),
        Status::InProgress => "in_progress".yellow(),
        Status::Done => "done".green(),
        Status::Cancelled => "cancelled".dimmed(),
    }
}

fn format_priority(priority: Priority) -> ColoredString {
    match priority {
        Priority::Low => "low".dimmed(),
        Priority::Medium => "medium".normal(),
        Priority::High => "high".yellow(),
        Priority::Critical => "critical".red().bold(),
    }
}

fn print_todo_line(todo: &Todo) {
    let tags = if todo.tags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", todo.tags.join(", "))
    };
    let due = todo
        .due_date
        .as_deref()
        .map(|d| format!(" due {}", d))
        .unwrap_or_default();
    println!(
        "{} {} {} {}{}{}",
        format!("#{}", todo.id).cyan(),
        format_status(todo.status),
        format_priority(todo.priority),
        todo.title,
        due.dimmed(),
        tags.dimmed()
    );
}

fn print_todo(todo: &Todo) {
    println!("{}: {}", "ID".bold(), todo.id.to_string().cyan());
    println!("{}: {}", "Title".bold(), todo.title);
    println!("{}: {}", "Status".bold(), format_status(todo.status));
    println!("{}: {}", "Priority".bold(), format_priority(todo.priority));
    if let Some(due) = &todo.due_date {
        println!("{}: {}", "Due".bold(), due);
    }
    if !todo.tags.is_empty() {
        println!("{}: {}", "Tags".bold(), todo.tags.join(", "));
    }
    if !todo.description.is_empty() {
        println!("{}: {}", "Description".bold(), todo.description);
    }
    println!("{}: {}", "Created".bold(), todo.created_at);
    println!("{}: {}", "Updated".bold(), todo.updated_at);
}

fn print_statistics(stats: &Statistics) {
    println!("{}: {}", "Total".bold(), stats.total_count);

    println!("{}", "By status".bold());
    for (status, count) in &stats.status_counts {
        println!("  {:<12} {}", format_status(*status), count);
    }

    println!("{}", "By priority".bold());
    for (priority, count) in &stats.priority_counts {
        println!("  {:<12} {}", format_priority(*priority), count);
    }

    let due = &stats.due_date_counts;
    println!("{}", "By due date".bold());
    println!("  {:<12} {}", "overdue".red(), due.overdue);
    println!("  {:<12} {}", "today", due.today);
    println!("  {:<12} {}", "upcoming", due.upcoming);
    println!("  {:<12} {}", "no_date".dimmed(), due.no_date);

    if !stats.tag_counts.is_empty() {
        println!("{}", "By tag".bold());
        for (tag, count) in &stats.tag_counts {
            println!("  {:<12} {}", tag, count);
        }
    }
}

/// Print a dispatched response. Failures print their messages and fail the command.
fn render(response: Response, as_json: bool) -> Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        if !response.success {
            std::process::exit(1);
        }
        return Ok(());
    }

    if let Some(errors) = response.errors() {
        for error in errors {
            eprintln!("{} {}", "✗".red(), error);
        }
        std::process::exit(1);
    }

    match response.body {
        Body::Todo { todo } => print_todo(&todo),
        Body::Page(page) => {
            if page.todos.is_empty() {
                println!("{}", "No todos found".dimmed());
            } else {
                for todo in &page.todos {
                    print_todo_line(todo);
                }
                if page.total_count > page.todos.len()
                    && let Some((first, last)) = page.window()
                {
                    println!("{}", format!("showing {}-{} of {}", first, last, page.total_count).dimmed());
                }
            }
        }
        Body::Statistics(stats) => print_statistics(&stats),
        Body::Deleted { message, .. } => println!("{} {}", "✓".green(), message),
        Body::Backup { backup_path } => println!("{} Backup created: {}", "✓".green(), backup_path.display()),
        Body::Tools { tools } => {
            for tool in tools {
                println!("{} {}", tool.name.cyan(), tool.description);
                for param in tool.parameters {
                    let marker = if param.required { "*" } else { " " };
                    println!("  {}{:<16} {}", marker, param.name, param.description.dimmed());
                }
            }
        }
        Body::Message { message } => println!("{}", message),
        Body::Errors { .. } => bail!("Unexpected error body in a successful response"),
    }

    Ok(())
}

fn empty_to_none(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let as_json = cli.json;

    let request = match cli.command {
        Command::Add {
            title,
            description,
            due,
            status,
            priority,
            tags,
        } => Request::AddTodo(Draft {
            title,
            description: description.unwrap_or_default(),
            due_date: due,
            status,
            priority,
            tags: tags.map(Into::into),
        }),

        Command::List {
            status,
            priority,
            search,
            tag,
            due,
            sort,
            order,
            limit,
            offset,
        } => Request::ListTodos(ListArgs {
            status: empty_to_none(status),
            priority: empty_to_none(priority),
            search: empty_to_none(search),
            tag: empty_to_none(tag),
            due_date_filter: empty_to_none(due),
            sort_by: sort,
            sort_order: order,
            limit,
            offset,
        }),

        Command::Get { id } => Request::GetTodo { todo_id: id },

        Command::Update {
            id,
            title,
            description,
            due,
            status,
            priority,
            tags,
        } => {
            let mut patch = TodoPatch {
                title,
                description,
                due_date: due,
                status,
                priority,
                ..TodoPatch::default()
            };
            if let Some(tags) = tags {
                patch = patch.tags(tags);
            }
            if patch.is_empty() {
                bail!("Nothing to update");
            }
            Request::UpdateTodo(UpdateArgs { todo_id: id, patch })
        }

        Command::Done { id } => Request::CompleteTodo { todo_id: id },

        Command::Delete { ids } => match ids.as_slice() {
            [id] => Request::DeleteTodo { todo_id: *id },
            _ => Request::BatchDeleteTodos { todo_ids: ids },
        },

        Command::Backup { list: true } => {
            let store = TodoStore::open(config);
            let backups = store.backups()?;
            if backups.is_empty() {
                println!("{}", "No backups found".dimmed());
            }
            for path in backups {
                println!("{}", path.display());
            }
            return Ok(());
        }

        Command::Backup { list: false } => Request::CreateBackup,

        Command::Stats => Request::GetStatistics,

        Command::Tools => Request::ListTools,

        Command::Serve => {
            let mut store = TodoStore::open(config);
            let rt = tokio::runtime::Runtime::new().context("Failed to create runtime")?;
            return rt.block_on(serve_stdio(&mut store)).context("Serve error");
        }

        Command::Daemon => {
            println!("{} Starting daemon for {}", "→".blue(), config.todo_file.display());

            let mut daemon = Daemon::new(TodoStore::open(config));
            let rt = tokio::runtime::Runtime::new().context("Failed to create runtime")?;
            return rt.block_on(async { daemon.run().await }).context("Daemon error");
        }

        Command::DaemonStop => {
            if !is_daemon_running(&DaemonConfig::for_store(&config)) {
                println!("{} Daemon is not running", "✗".red());
                std::process::exit(1);
            }

            let mut client = Client::connect(&config, false).context("Failed to connect to daemon")?;
            client.shutdown().context("Failed to shutdown daemon")?;
            println!("{} Daemon stopped", "✓".green());
            return Ok(());
        }

        Command::DaemonStatus => {
            let daemon = DaemonConfig::for_store(&config);
            if is_daemon_running(&daemon) {
                let pid = daemon_pid(&daemon).map(|p| format!(" (pid {})", p)).unwrap_or_default();
                println!("{} Daemon is running{}", "✓".green(), pid);

                if let Ok(mut client) = Client::connect(&config, false)
                    && client.ping().is_ok()
                {
                    println!("  {} Responding to requests", "✓".green());
                }
            } else {
                println!("{} Daemon is not running", "✗".red());
            }
            return Ok(());
        }
    };

    // A running daemon is the only writer; go through it when it is up.
    let response = if is_daemon_running(&DaemonConfig::for_store(&config)) {
        info!("Forwarding request to the running daemon");
        let mut client = Client::connect(&config, false).context("Failed to connect to daemon")?;
        client.request(&request)?
    } else {
        let mut store = TodoStore::open(config);
        dispatch(&mut store, request)
    };
    render(response, as_json)
}

fn main() -> Result<()> {
    setup_logging().context("Failed to setup logging")?;

    let cli = Cli::parse();
    info!("Command: {:?}", std::env::args().collect::<Vec<_>>());

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
