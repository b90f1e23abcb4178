//! Client for connecting to the todo daemon.

use crate::config::Config;
use crate::daemon::{DaemonConfig, is_daemon_running, start_daemon};
use crate::draft::{Draft, TodoPatch};
use crate::protocol::{Body, Request, Response, UpdateArgs};
use crate::query::{ListArgs, TodoPage};
use crate::stats::Statistics;
use crate::store::Deleted;
use crate::tools::ToolSpec;
use crate::types::Todo;
use eyre::{Context, Result, bail};
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Client for communicating with the todo daemon.
pub struct Client {
    socket_path: PathBuf,
    reader: BufReader<UnixStream>,
    writer: UnixStream,
}

impl Client {
    /// Connect to the daemon serving `config`'s store, optionally starting
    /// it if it is not running.
    pub fn connect(config: &Config, auto_start: bool) -> Result<Self> {
        let daemon = DaemonConfig::for_store(config);
        let socket_path = daemon.socket_path();

        let stream = match UnixStream::connect(&socket_path) {
            Ok(stream) => stream,
            Err(_) if auto_start => {
                if !is_daemon_running(&daemon) {
                    start_daemon(config).context("Failed to auto-start daemon")?;
                }
                connect_with_retry(&socket_path, 20)?
            }
            Err(e) => {
                bail!("Failed to connect to daemon: {}. Is it running?", e);
            }
        };

        stream
            .set_read_timeout(Some(Duration::from_secs(30)))
            .context("Failed to set read timeout")?;

        let reader = BufReader::new(stream.try_clone().context("Failed to clone socket")?);
        Ok(Self {
            socket_path,
            reader,
            writer: stream,
        })
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Send a request and receive the raw response.
    pub fn request(&mut self, request: &Request) -> Result<Response> {
        let request_json = serde_json::to_string(request)?;
        writeln!(self.writer, "{}", request_json)?;
        self.writer.flush()?;

        let mut response_line = String::new();
        let read = self
            .reader
            .read_line(&mut response_line)
            .context("Failed to read response")?;
        if read == 0 {
            bail!("Daemon closed the connection");
        }

        let response: Response = serde_json::from_str(&response_line).context("Failed to parse response")?;
        Ok(response)
    }

    /// Send a request; a `success: false` response becomes an error.
    fn call(&mut self, request: Request) -> Result<Body> {
        let response = self.request(&request)?;
        if let Some(errors) = response.errors() {
            bail!("{}", errors.join("; "));
        }
        if !response.success {
            bail!("Request failed");
        }
        Ok(response.body)
    }

    pub fn add_todo(&mut self, draft: Draft) -> Result<Todo> {
        match self.call(Request::AddTodo(draft))? {
            Body::Todo { todo } => Ok(todo),
            _ => bail!("Unexpected response"),
        }
    }

    pub fn list_todos(&mut self, args: ListArgs) -> Result<TodoPage> {
        match self.call(Request::ListTodos(args))? {
            Body::Page(page) => Ok(page),
            _ => bail!("Unexpected response"),
        }
    }

    pub fn get_todo(&mut self, todo_id: u64) -> Result<Todo> {
        match self.call(Request::GetTodo { todo_id })? {
            Body::Todo { todo } => Ok(todo),
            _ => bail!("Unexpected response"),
        }
    }

    pub fn update_todo(&mut self, todo_id: u64, patch: TodoPatch) -> Result<Todo> {
        match self.call(Request::UpdateTodo(UpdateArgs { todo_id, patch }))? {
            Body::Todo { todo } => Ok(todo),
            _ => bail!("Unexpected response"),
        }
    }

    pub fn complete_todo(&mut self, todo_id: u64) -> Result<Todo> {
        match self.call(Request::CompleteTodo { todo_id })? {
            Body::Todo { todo } => Ok(todo),
            _ => bail!("Unexpected response"),
        }
    }

    pub fn delete_todo(&mut self, todo_id: u64) -> Result<Deleted> {
        self.deleted(Request::DeleteTodo { todo_id })
    }

    pub fn batch_delete_todos(&mut self, todo_ids: Vec<u64>) -> Result<Deleted> {
        self.deleted(Request::BatchDeleteTodos { todo_ids })
    }

    fn deleted(&mut self, request: Request) -> Result<Deleted> {
        match self.call(request)? {
            Body::Deleted { message, deleted_count } => Ok(Deleted {
                count: deleted_count,
                message,
            }),
            _ => bail!("Unexpected response"),
        }
    }

    pub fn create_backup(&mut self) -> Result<PathBuf> {
        match self.call(Request::CreateBackup)? {
            Body::Backup { backup_path } => Ok(backup_path),
            _ => bail!("Unexpected response"),
        }
    }

    pub fn get_statistics(&mut self) -> Result<Statistics> {
        match self.call(Request::GetStatistics)? {
            Body::Statistics(stats) => Ok(stats),
            _ => bail!("Unexpected response"),
        }
    }

    pub fn list_tools(&mut self) -> Result<Vec<ToolSpec>> {
        match self.call(Request::ListTools)? {
            Body::Tools { tools } => Ok(tools),
            _ => bail!("Unexpected response"),
        }
    }

    /// Shutdown the daemon.
    pub fn shutdown(&mut self) -> Result<()> {
        self.call(Request::Shutdown).map(|_| ())
    }

    /// Ping the daemon.
    pub fn ping(&mut self) -> Result<()> {
        match self.call(Request::Ping)? {
            Body::Message { message } if message == "pong" => Ok(()),
            _ => bail!("Unexpected response"),
        }
    }
}

fn connect_with_retry(socket_path: &Path, attempts: usize) -> Result<UnixStream> {
    for _ in 0..attempts {
        if let Ok(stream) = UnixStream::connect(socket_path) {
            return Ok(stream);
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    UnixStream::connect(socket_path).context("Daemon failed to start in time")
}
