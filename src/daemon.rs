//! Long-running tool server.
//!
//! The daemon owns the single [`TodoStore`] and serves newline-delimited
//! JSON requests over a Unix socket. Connections are handled concurrently,
//! but every request funnels through one channel into the main loop, so
//! load-modify-save sequences never interleave.
//!
//! [`serve_lines`] speaks the same protocol over any reader/writer pair and
//! backs the `serve` command on stdin/stdout.

use crate::config::Config;
use crate::dispatch::{dispatch, dispatch_line};
use crate::protocol::{Request, Response};
use crate::store::TodoStore;
use eyre::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc;

/// Socket file name, next to the backing file.
const SOCKET_FILE: &str = "todolist.sock";

/// PID file name, next to the backing file.
const PID_FILE: &str = "todolist.pid";

/// Queue depth between connections and the main loop.
const REQUEST_QUEUE: usize = 100;

type Job = (Request, mpsc::Sender<Response>);

/// Where the daemon puts its socket and PID file.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Directory holding the socket and PID file
    pub root: PathBuf,
}

impl DaemonConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Daemon paths for a store config: alongside its backing file.
    pub fn for_store(config: &Config) -> Self {
        Self::new(config.data_dir())
    }

    pub fn socket_path(&self) -> PathBuf {
        self.root.join(SOCKET_FILE)
    }

    pub fn pid_path(&self) -> PathBuf {
        self.root.join(PID_FILE)
    }
}

/// The todo daemon.
pub struct Daemon {
    config: DaemonConfig,
    store: TodoStore,
    shutdown: Arc<AtomicBool>,
}

impl Daemon {
    /// Create a daemon serving `store`, with paths derived from its config.
    pub fn new(store: TodoStore) -> Self {
        let config = DaemonConfig::for_store(store.config());
        Self {
            config,
            store,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &DaemonConfig {
        &self.config
    }

    /// Run until a `shutdown` request or Ctrl-C.
    pub async fn run(&mut self) -> Result<()> {
        let socket_path = self.config.socket_path();
        if socket_path.exists() {
            fs::remove_file(&socket_path).ok();
        }

        let pid_path = self.config.pid_path();
        fs::write(&pid_path, std::process::id().to_string())
            .with_context(|| format!("Failed to write PID file {}", pid_path.display()))?;

        let listener = UnixListener::bind(&socket_path)
            .with_context(|| format!("Failed to bind to Unix socket {}", socket_path.display()))?;

        log::info!("Daemon listening on {:?}", socket_path);

        let (tx, mut rx) = mpsc::channel::<Job>(REQUEST_QUEUE);
        let acceptor = tokio::spawn(Self::accept_connections(listener, tx));

        while !self.shutdown.load(Ordering::Relaxed) {
            tokio::select! {
                job = rx.recv() => {
                    let Some((request, response_tx)) = job else {
                        break;
                    };
                    let is_shutdown = matches!(request, Request::Shutdown);
                    let response = dispatch(&mut self.store, request);
                    let _ = response_tx.send(response).await;
                    if is_shutdown {
                        self.shutdown.store(true, Ordering::Relaxed);
                    }
                }

                _ = tokio::signal::ctrl_c() => {
                    log::info!("Interrupted");
                    self.shutdown.store(true, Ordering::Relaxed);
                }
            }
        }

        log::info!("Daemon shutting down");
        acceptor.abort();
        fs::remove_file(&socket_path).ok();
        fs::remove_file(&pid_path).ok();

        Ok(())
    }

    async fn accept_connections(listener: UnixListener, tx: mpsc::Sender<Job>) {
        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        if let Err(e) = Self::handle_connection(stream, tx).await {
                            log::warn!("Connection error: {:#}", e);
                        }
                    });
                }
                Err(e) => {
                    log::error!("Accept error: {}", e);
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            }
        }
    }

    async fn handle_connection(stream: UnixStream, tx: mpsc::Sender<Job>) -> Result<()> {
        let (read_half, mut writer) = stream.into_split();
        let mut lines = BufReader::new(read_half).lines();

        while let Some(line) = lines.next_line().await.context("Failed to read line")? {
            if line.trim().is_empty() {
                continue;
            }

            let request = match serde_json::from_str::<Request>(&line) {
                Ok(request) => request,
                Err(e) => {
                    log::warn!("Rejected malformed request: {}", e);
                    write_response(&mut writer, &Response::error(format!("Invalid request: {}", e))).await?;
                    continue;
                }
            };
            let is_shutdown = matches!(request, Request::Shutdown);

            let (resp_tx, mut resp_rx) = mpsc::channel(1);
            tx.send((request, resp_tx))
                .await
                .context("Failed to send request to daemon")?;

            if let Some(response) = resp_rx.recv().await {
                write_response(&mut writer, &response).await?;
            }

            if is_shutdown {
                break;
            }
        }

        Ok(())
    }
}

async fn write_response<W: AsyncWrite + Unpin>(writer: &mut W, response: &Response) -> Result<()> {
    let mut json = serde_json::to_string(response)?;
    json.push('\n');
    writer.write_all(json.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// Serve requests read line by line from `reader`, writing one response line
/// per request to `writer`. Returns on end of input or after `shutdown`.
pub async fn serve_lines<R, W>(store: &mut TodoStore, reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await.context("Failed to read request")? {
        if line.trim().is_empty() {
            continue;
        }
        let (response, stop) = dispatch_line(store, &line);
        write_response(&mut writer, &response).await?;
        if stop {
            break;
        }
    }
    Ok(())
}

/// Serve requests on stdin/stdout.
pub async fn serve_stdio(store: &mut TodoStore) -> Result<()> {
    log::info!("Serving tool calls on stdio for {}", store.config().todo_file.display());
    serve_lines(store, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await
}

/// Check if a daemon is running for these paths. Stale files are removed.
pub fn is_daemon_running(config: &DaemonConfig) -> bool {
    let socket_path = config.socket_path();
    let pid_path = config.pid_path();

    if !socket_path.exists() {
        return false;
    }

    if let Ok(pid_str) = fs::read_to_string(&pid_path)
        && let Ok(pid) = pid_str.trim().parse::<i32>()
    {
        // Signal 0 checks that the process exists without signalling it.
        unsafe {
            if libc::kill(pid, 0) == 0 {
                return true;
            }
        }
    }

    fs::remove_file(&socket_path).ok();
    fs::remove_file(&pid_path).ok();
    false
}

/// Read the daemon's PID, if its PID file exists.
pub fn daemon_pid(config: &DaemonConfig) -> Option<i32> {
    fs::read_to_string(config.pid_path()).ok()?.trim().parse().ok()
}

/// Start the daemon as a background process serving `config`'s store.
pub fn start_daemon(config: &Config) -> Result<()> {
    use std::process::{Command, Stdio};

    let exe = std::env::current_exe().context("Failed to get current executable")?;

    Command::new(exe)
        .arg("--file")
        .arg(&config.todo_file)
        .arg("--backup-dir")
        .arg(&config.backup_dir)
        .arg("daemon")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .context("Failed to spawn daemon process")?;

    std::thread::sleep(Duration::from_millis(100));

    Ok(())
}
