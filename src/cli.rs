//! CLI argument parsing for td.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "td",
    about = "A single-user todo store with JSON persistence and backups",
    version = env!("GIT_DESCRIBE"),
    after_help = "Logs are written to: ~/.local/share/todolist/logs/todolist.log"
)]
pub struct Cli {
    /// Backing JSON file (default: $TODO_FILE or todos.json next to the binary)
    #[arg(short = 'f', long, global = true)]
    pub file: Option<PathBuf>,

    /// Backup directory (default: $TODO_BACKUP_DIR or backups/ next to the binary)
    #[arg(short = 'b', long, global = true)]
    pub backup_dir: Option<PathBuf>,

    /// Print the raw JSON response instead of formatted output
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Add a new todo
    Add {
        /// Todo title
        title: String,

        /// Description
        #[arg(short = 'D', long)]
        description: Option<String>,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,

        /// Status (pending, in_progress, done, cancelled)
        #[arg(short, long)]
        status: Option<String>,

        /// Priority (low, medium, high, critical)
        #[arg(short, long)]
        priority: Option<String>,

        /// Tags (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        tags: Option<Vec<String>>,
    },

    /// List todos
    List {
        /// Filter by status
        #[arg(short, long)]
        status: Option<String>,

        /// Filter by priority
        #[arg(short, long)]
        priority: Option<String>,

        /// Search title and description (case-insensitive)
        #[arg(long)]
        search: Option<String>,

        /// Filter by tag
        #[arg(short, long)]
        tag: Option<String>,

        /// Filter by due date (overdue, today, upcoming, no_date)
        #[arg(long)]
        due: Option<String>,

        /// Sort field
        #[arg(long, default_value = "id")]
        sort: String,

        /// Sort order (asc, desc)
        #[arg(long, default_value = "asc")]
        order: String,

        /// Maximum number of todos to show
        #[arg(short, long, default_value = "100")]
        limit: usize,

        /// Number of todos to skip
        #[arg(short, long, default_value = "0")]
        offset: usize,
    },

    /// Show a todo
    Get {
        /// Todo ID
        id: u64,
    },

    /// Update fields of a todo
    Update {
        /// Todo ID
        id: u64,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New description
        #[arg(short = 'D', long)]
        description: Option<String>,

        /// New due date (YYYY-MM-DD, empty to clear)
        #[arg(long)]
        due: Option<String>,

        /// New status
        #[arg(short, long)]
        status: Option<String>,

        /// New priority
        #[arg(short, long)]
        priority: Option<String>,

        /// Replace tags (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        tags: Option<Vec<String>>,
    },

    /// Mark a todo as done
    Done {
        /// Todo ID
        id: u64,
    },

    /// Delete one or more todos
    Delete {
        /// Todo IDs
        #[arg(required = true)]
        ids: Vec<u64>,
    },

    /// Back up the todo file
    Backup {
        /// List existing backups instead of creating one
        #[arg(short, long)]
        list: bool,
    },

    /// Show statistics
    Stats,

    /// List the tools served by `serve` and the daemon
    Tools,

    /// Serve tool calls as JSON lines on stdin/stdout
    Serve,

    /// Run the daemon in foreground
    Daemon,

    /// Stop the running daemon
    DaemonStop,

    /// Check daemon status
    DaemonStatus,
}
