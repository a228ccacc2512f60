// ABOUTME: Host side of the render boundary driving a Node.js guest process
// ABOUTME: JSON-lines IPC over stdin/stdout with request ids, handshake, and render watchdog

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use adapt_config::AdaptConfig;
use adapt_core::RuntimeReport;

use crate::boundary::{RenderBoundary, RenderOutput};
use crate::protocol::{GuestMessage, HostMessage, RenderPayload};
use crate::{Result, SandboxError};

const GUEST_SCRIPT_NAME: &str = "render-guest.js";

pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// How to start a fresh guest process
#[derive(Debug, Clone)]
pub struct GuestLauncher {
    node_binary: String,
    script: PathBuf,
}

impl GuestLauncher {
    pub fn new(node_binary: impl Into<String>, script: impl Into<PathBuf>) -> Self {
        Self {
            node_binary: node_binary.into(),
            script: script.into(),
        }
    }

    pub fn from_config(config: &AdaptConfig) -> Result<Self> {
        let script = match &config.guest_script {
            Some(path) if path.exists() => path.clone(),
            Some(path) => {
                return Err(SandboxError::GuestScriptNotFound(
                    path.display().to_string(),
                ))
            }
            None => Self::find_guest_script()?,
        };
        Ok(Self::new(config.node_binary.clone(), script))
    }

    pub fn script(&self) -> &Path {
        &self.script
    }

    /// Find the guest script shipped with this package
    fn find_guest_script() -> Result<PathBuf> {
        let candidates = [
            PathBuf::from("packages/sandbox/guest").join(GUEST_SCRIPT_NAME),
            PathBuf::from("../sandbox/guest").join(GUEST_SCRIPT_NAME),
            PathBuf::from("./guest").join(GUEST_SCRIPT_NAME),
            PathBuf::from(env!("CARGO_MANIFEST_DIR"))
                .join("guest")
                .join(GUEST_SCRIPT_NAME),
        ];

        for path in candidates {
            if path.exists() {
                info!("Found render guest at: {}", path.display());
                return Ok(path);
            }
        }

        Err(SandboxError::GuestScriptNotFound(
            "Could not find render guest script. Tried: packages/sandbox/guest/render-guest.js (set ADAPT_GUEST_SCRIPT to override)".to_string(),
        ))
    }

    async fn spawn(&self) -> Result<GuestConnection> {
        info!(
            "Starting render guest: {} {}",
            self.node_binary,
            self.script.display()
        );

        let mut child = Command::new(&self.node_binary)
            .arg(&self.script)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                SandboxError::GuestStartFailed(format!("{}: {}", self.node_binary, e))
            })?;

        let stdin = child.stdin.take().ok_or_else(|| {
            SandboxError::GuestStartFailed("Failed to capture stdin".to_string())
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            SandboxError::GuestStartFailed("Failed to capture stdout".to_string())
        })?;

        let mut connection = GuestConnection::from_io(stdout, stdin);
        connection.child = Some(child);
        Ok(connection)
    }
}

/// One live channel to a guest: a writer, a reader task, and the process if we own one
pub struct GuestConnection {
    writer: Box<dyn AsyncWrite + Send + Unpin>,
    responses: mpsc::UnboundedReceiver<GuestMessage>,
    reader: JoinHandle<()>,
    child: Option<Child>,
}

impl GuestConnection {
    /// Wrap an already-connected byte stream pair
    pub fn from_io<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let reader = tokio::spawn(read_messages(reader, tx));

        Self {
            writer: Box::new(writer),
            responses: rx,
            reader,
            child: None,
        }
    }

    async fn send(&mut self, message: &HostMessage) -> Result<()> {
        let mut line = serde_json::to_string(message)
            .map_err(|e| SandboxError::SerializationError(e.to_string()))?;
        line.push('\n');

        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    async fn handshake(&mut self, id: u64, timeout: Duration) -> Result<()> {
        debug!("Waiting for guest to be ready...");
        self.send(&HostMessage::Ping { id: Some(id) })
            .await
            .map_err(|e| SandboxError::GuestStartFailed(e.to_string()))?;

        let wait = async {
            while let Some(message) = self.responses.recv().await {
                match message {
                    GuestMessage::Pong { .. } if message.answers(id) => return Ok(()),
                    other => warn!("Unexpected message while waiting for ready: {:?}", other),
                }
            }
            Err(SandboxError::GuestStartFailed(
                "Guest exited before answering ping".to_string(),
            ))
        };

        match tokio::time::timeout(timeout, wait).await {
            Ok(result) => result,
            Err(_) => Err(SandboxError::HandshakeTimeout {
                millis: timeout.as_millis() as u64,
            }),
        }
    }

    /// Next render result for request `id`; `None` once the guest is gone
    async fn wait_for(&mut self, id: u64) -> Option<(RuntimeReport, Option<String>)> {
        while let Some(message) = self.responses.recv().await {
            if !message.answers(id) {
                debug!(
                    request_id = id,
                    stale_id = ?message.id(),
                    "Discarding guest response for another request"
                );
                continue;
            }
            if let Some(result) = message.into_report() {
                return Some(result);
            }
        }
        None
    }

    async fn shutdown(mut self) {
        self.reader.abort();
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill().await {
                warn!("Failed to kill guest process: {}", e);
            }
        }
    }
}

impl Drop for GuestConnection {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

/// Read guest messages line by line until EOF
async fn read_messages<R>(reader: R, tx: mpsc::UnboundedSender<GuestMessage>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line.trim().is_empty() {
                    continue;
                }

                match serde_json::from_str::<GuestMessage>(&line) {
                    Ok(message) => {
                        if tx.send(message).is_err() {
                            debug!("Guest message receiver dropped");
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Failed to parse guest message: {} - Line: {}", e, line);
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                error!("Failed to read from guest stdout: {}", e);
                break;
            }
        }
    }

    debug!("Guest stdout reader task ended");
}

/// Serialised access to a single guest.
///
/// Renders are strictly one at a time; the connection lock is held for the
/// whole round-trip. A guest that times out or dies is discarded and
/// relaunched on the next render when a launcher is configured.
pub struct SandboxHost {
    launcher: Option<GuestLauncher>,
    connection: Mutex<Option<GuestConnection>>,
    next_id: AtomicU64,
    render_timeout: Duration,
    handshake_timeout: Duration,
}

impl SandboxHost {
    pub fn new(launcher: GuestLauncher, render_timeout: Duration) -> Self {
        Self {
            launcher: Some(launcher),
            connection: Mutex::new(None),
            next_id: AtomicU64::new(1),
            render_timeout,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }

    pub fn from_config(config: &AdaptConfig) -> Result<Self> {
        Ok(Self::new(
            GuestLauncher::from_config(config)?,
            config.render_timeout,
        ))
    }

    /// Host bound to an existing connection that is never relaunched
    pub fn with_connection(connection: GuestConnection, render_timeout: Duration) -> Self {
        Self {
            launcher: None,
            connection: Mutex::new(Some(connection)),
            next_id: AtomicU64::new(1),
            render_timeout,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }

    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    pub fn render_timeout(&self) -> Duration {
        self.render_timeout
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Launch the guest eagerly instead of on first render
    pub async fn start(&self) -> Result<()> {
        let mut slot = self.connection.lock().await;
        self.ensure_connected(&mut slot).await.map(|_| ())
    }

    pub async fn is_running(&self) -> bool {
        self.connection.lock().await.is_some()
    }

    pub async fn stop(&self) {
        if let Some(connection) = self.connection.lock().await.take() {
            connection.shutdown().await;
            info!("Render guest stopped");
        }
    }

    async fn ensure_connected<'a>(
        &self,
        slot: &'a mut Option<GuestConnection>,
    ) -> Result<&'a mut GuestConnection> {
        if slot.is_none() {
            let launcher = self.launcher.as_ref().ok_or(SandboxError::GuestNotRunning)?;
            let mut connection = launcher.spawn().await?;
            if let Err(e) = connection
                .handshake(self.next_id(), self.handshake_timeout)
                .await
            {
                connection.shutdown().await;
                return Err(e);
            }
            info!("Render guest ready");
            *slot = Some(connection);
        }
        slot.as_mut().ok_or(SandboxError::GuestNotRunning)
    }

    /// Render and keep the guest's markup alongside the report
    pub async fn render_detailed(
        &self,
        code: &str,
        props: &serde_json::Value,
    ) -> Result<RenderOutput> {
        let mut slot = self.connection.lock().await;
        let connection = self.ensure_connected(&mut slot).await?;

        let id = self.next_id();
        let message = HostMessage::Render {
            id: Some(id),
            payload: RenderPayload {
                code: code.to_string(),
                props: props.clone(),
            },
        };
        debug!(request_id = id, bytes = code.len(), "Sending render request");

        let outcome = match connection.send(&message).await {
            Ok(()) => tokio::time::timeout(self.render_timeout, connection.wait_for(id)).await,
            Err(SandboxError::Io(e)) => {
                warn!(request_id = id, "Failed to write to guest: {}", e);
                Ok(None)
            }
            Err(e) => return Err(e),
        };

        match outcome {
            Ok(Some((report, markup))) => {
                debug!(request_id = id, ok = report.is_ok(), "Render finished");
                Ok(RenderOutput { report, markup })
            }
            Ok(None) => {
                warn!(request_id = id, "Guest exited during render");
                if let Some(connection) = slot.take() {
                    connection.shutdown().await;
                }
                Ok(RenderOutput::from_report(RuntimeReport::error(
                    "Render guest exited before reporting a result",
                )))
            }
            Err(_) => {
                let millis = self.render_timeout.as_millis();
                warn!(
                    request_id = id,
                    "Render timed out after {} ms, killing guest", millis
                );
                if let Some(connection) = slot.take() {
                    connection.shutdown().await;
                }
                Ok(RenderOutput::from_report(RuntimeReport::error(format!(
                    "Render timed out after {} ms",
                    millis
                ))))
            }
        }
    }
}

#[async_trait]
impl RenderBoundary for SandboxHost {
    async fn render(&self, code: &str, props: &serde_json::Value) -> Result<RenderOutput> {
        self.render_detailed(code, props).await
    }
}
