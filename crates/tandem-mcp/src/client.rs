// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rmcp::{
    model::CallToolRequestParams, service::RunningService, transport::TokioChildProcess,
    RoleClient, ServiceExt,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::DuplexStream;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use tandem_tools::{ToolExecutor, ToolSchema};

use crate::convert::{call_result_to_string, mcp_tool_to_schema};

/// Fixed executor reply once the session is gone.
const NOT_CONNECTED: &str = "Error: MCP session is not connected.";

/// How long `connect()` waits for the session handshake.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Launch parameters for a stdio MCP server, passed to the transport
/// verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StdioServerParams {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

/// Lifecycle of one MCP client.
///
/// `connect()` drives Unstarted → Starting → Running; any initialization
/// failure goes straight to Closed.  `close()` moves Running → Closed.
/// Closed is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unstarted,
    Starting,
    Running,
    Closed,
}

#[derive(Debug, Error)]
pub enum McpError {
    #[error("MCP connect failed: {0}")]
    Connect(String),

    #[error("MCP client already started")]
    AlreadyStarted,
}

/// One executor request forwarded to the worker task.
struct ToolRequest {
    name: String,
    arguments: Option<serde_json::Map<String, serde_json::Value>>,
    reply: oneshot::Sender<String>,
}

enum WorkerTransport {
    Child(TokioChildProcess),
    Stream(DuplexStream),
}

/// Client for a subprocess tool-server speaking MCP over stdio.
///
/// The MCP session is asynchronous and owned end-to-end by a dedicated
/// worker task: it starts the subprocess, performs the initialize handshake,
/// lists the tools exactly once, then serves executor requests from a
/// channel until `close()` is signalled.  Callers only ever touch channels,
/// so the session itself is single-owner.
///
/// Executor calls are bounded by a per-call timeout (default 60 s), and
/// every failure mode (timeout, bad arguments, remote error, closed
/// session) is returned as an `"Error: ..."` string, never an `Err`.
///
/// ```no_run
/// # use tandem_mcp::{McpClient, StdioServerParams};
/// # async fn demo() -> Result<(), tandem_mcp::McpError> {
/// let client = McpClient::stdio(StdioServerParams {
///     command: "npx".into(),
///     args: vec!["-y".into(), "@modelcontextprotocol/server-filesystem".into(), "/".into()],
///     env: Default::default(),
/// });
/// client.connect().await?;
/// let tools = client.get_tools();
/// client.close().await;
/// # Ok(()) }
/// ```
pub struct McpClient {
    params: Option<StdioServerParams>,
    call_timeout: Duration,
    close_timeout: Duration,
    state: Mutex<SessionState>,
    tools: Mutex<Vec<ToolSchema>>,
    request_tx: Mutex<Option<mpsc::Sender<ToolRequest>>>,
    done_tx: Mutex<Option<oneshot::Sender<()>>>,
    worker: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl McpClient {
    /// Client that spawns `params.command` as a stdio subprocess on
    /// [`connect`](Self::connect).
    pub fn stdio(params: StdioServerParams) -> Self {
        Self::build(Some(params))
    }

    /// Client for an in-process transport; connect with
    /// [`connect_stream`](Self::connect_stream).
    pub fn in_process() -> Self {
        Self::build(None)
    }

    fn build(params: Option<StdioServerParams>) -> Self {
        Self {
            params,
            call_timeout: Duration::from_secs(60),
            close_timeout: Duration::from_secs(10),
            state: Mutex::new(SessionState::Unstarted),
            tools: Mutex::new(Vec::new()),
            request_tx: Mutex::new(None),
            done_tx: Mutex::new(None),
            worker: Mutex::new(None),
        }
    }

    /// Override the per-call executor timeout (default 60 s).
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Override the worker join timeout used by `close()` (default 10 s).
    pub fn with_close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    pub fn state(&self) -> SessionState {
        *self.state.lock().unwrap()
    }

    /// Start the worker task and initialise the MCP session over the
    /// configured subprocess.  Returns once the handshake completed and the
    /// tool list was snapshotted.
    pub async fn connect(&self) -> Result<(), McpError> {
        self.begin_starting()?;

        let Some(params) = &self.params else {
            self.mark_closed();
            return Err(McpError::Connect(
                "no stdio parameters configured; use connect_stream".to_string(),
            ));
        };

        let mut cmd = tokio::process::Command::new(&params.command);
        cmd.args(&params.args)
            .envs(&params.env)
            .stderr(std::process::Stdio::inherit())
            .stdout(std::process::Stdio::piped())
            .stdin(std::process::Stdio::piped());

        let transport = match TokioChildProcess::new(cmd) {
            Ok(t) => t,
            Err(e) => {
                self.mark_closed();
                return Err(McpError::Connect(format!("spawn '{}': {e}", params.command)));
            }
        };

        self.spawn_session(WorkerTransport::Child(transport)).await
    }

    /// Like [`connect`](Self::connect), but over an in-memory duplex stream
    /// whose other end is served by an in-process MCP server.  Used by the
    /// integration tests and usable for embedding.
    pub async fn connect_stream(&self, stream: DuplexStream) -> Result<(), McpError> {
        self.begin_starting()?;
        self.spawn_session(WorkerTransport::Stream(stream)).await
    }

    /// Immutable snapshot of the server's tools, taken once at startup.
    pub fn get_tools(&self) -> Vec<ToolSchema> {
        self.tools.lock().unwrap().clone()
    }

    /// Executors for every server tool, ready for registry registration.
    ///
    /// The executors hold channel handles, not the client itself; once this
    /// client leaves Running they answer every call with a fixed
    /// `"Error: MCP session is not connected."` string.
    pub fn get_executors(&self) -> Vec<Arc<dyn ToolExecutor>> {
        let request_tx = self.request_tx.lock().unwrap().clone();
        self.tools
            .lock()
            .unwrap()
            .iter()
            .map(|schema| {
                Arc::new(McpToolExecutor {
                    schema: schema.clone(),
                    request_tx: request_tx.clone(),
                    call_timeout: self.call_timeout,
                }) as Arc<dyn ToolExecutor>
            })
            .collect()
    }

    /// Shut the session down.
    ///
    /// Signals the worker, then waits up to the close timeout for it to
    /// exit; a worker that does not exit in time is detached (best-effort
    /// close).  Idempotent, and safe on sessions that never reached Running.
    pub async fn close(&self) {
        let handle = {
            let mut state = self.state.lock().unwrap();
            if *state == SessionState::Closed {
                return;
            }
            *state = SessionState::Closed;
            self.worker.lock().unwrap().take()
        };

        if let Some(done) = self.done_tx.lock().unwrap().take() {
            let _ = done.send(());
        }
        // Drop our sender so the worker's request channel drains and closes.
        *self.request_tx.lock().unwrap() = None;

        if let Some(handle) = handle {
            if tokio::time::timeout(self.close_timeout, handle).await.is_err() {
                warn!(
                    "MCP worker did not shut down within {:?}; detaching",
                    self.close_timeout
                );
            }
        }
        debug!("MCP session closed");
    }

    fn begin_starting(&self) -> Result<(), McpError> {
        let mut state = self.state.lock().unwrap();
        match *state {
            SessionState::Unstarted => {
                *state = SessionState::Starting;
                Ok(())
            }
            _ => Err(McpError::AlreadyStarted),
        }
    }

    fn mark_closed(&self) {
        *self.state.lock().unwrap() = SessionState::Closed;
    }

    async fn spawn_session(&self, transport: WorkerTransport) -> Result<(), McpError> {
        let (started_tx, started_rx) = oneshot::channel();
        let (request_tx, request_rx) = mpsc::channel(16);
        let (done_tx, done_rx) = oneshot::channel();

        let handle = tokio::spawn(run_worker(transport, started_tx, request_rx, done_rx));
        *self.worker.lock().unwrap() = Some(handle);
        *self.done_tx.lock().unwrap() = Some(done_tx);

        match tokio::time::timeout(CONNECT_TIMEOUT, started_rx).await {
            Ok(Ok(Ok(schemas))) => {
                debug!("MCP session running with {} tool(s)", schemas.len());
                *self.tools.lock().unwrap() = schemas;
                *self.request_tx.lock().unwrap() = Some(request_tx);
                *self.state.lock().unwrap() = SessionState::Running;
                Ok(())
            }
            Ok(Ok(Err(reason))) => {
                self.mark_closed();
                Err(McpError::Connect(reason))
            }
            Ok(Err(_)) => {
                self.mark_closed();
                Err(McpError::Connect(
                    "worker exited before the session handshake completed".to_string(),
                ))
            }
            Err(_) => {
                self.mark_closed();
                if let Some(done) = self.done_tx.lock().unwrap().take() {
                    let _ = done.send(());
                }
                Err(McpError::Connect(format!(
                    "timed out after {CONNECT_TIMEOUT:?} waiting for the session handshake"
                )))
            }
        }
    }
}

/// The worker task: owns the rmcp session from handshake to shutdown.
async fn run_worker(
    transport: WorkerTransport,
    started_tx: oneshot::Sender<Result<Vec<ToolSchema>, String>>,
    mut request_rx: mpsc::Receiver<ToolRequest>,
    mut done_rx: oneshot::Receiver<()>,
) {
    let running: RunningService<RoleClient, ()> = match transport {
        WorkerTransport::Child(t) => match ().serve(t).await {
            Ok(r) => r,
            Err(e) => {
                let _ = started_tx.send(Err(format!("initialize handshake: {e}")));
                return;
            }
        },
        WorkerTransport::Stream(s) => match ().serve(s).await {
            Ok(r) => r,
            Err(e) => {
                let _ = started_tx.send(Err(format!("initialize handshake: {e}")));
                return;
            }
        },
    };

    let tools = match running.list_all_tools().await {
        Ok(tools) => tools,
        Err(e) => {
            let _ = started_tx.send(Err(format!("list_tools: {e}")));
            let _ = running.cancel().await;
            return;
        }
    };
    let schemas: Vec<ToolSchema> = tools.iter().map(mcp_tool_to_schema).collect();

    if started_tx.send(Ok(schemas)).is_err() {
        // The caller gave up (connect timeout); nothing left to serve.
        let _ = running.cancel().await;
        return;
    }

    loop {
        tokio::select! {
            _ = &mut done_rx => break,
            request = request_rx.recv() => match request {
                Some(request) => {
                    let result = call_remote(&running, &request.name, request.arguments).await;
                    let _ = request.reply.send(result);
                }
                None => break,
            },
        }
    }

    let _ = running.cancel().await;
}

async fn call_remote(
    running: &RunningService<RoleClient, ()>,
    name: &str,
    arguments: Option<serde_json::Map<String, serde_json::Value>>,
) -> String {
    // Build the params from their wire form: only `name` and `arguments` are
    // pinned, optional protocol fields keep their serde defaults.
    let params: CallToolRequestParams = match serde_json::from_value(serde_json::json!({
        "name": name,
        "arguments": arguments,
    })) {
        Ok(params) => params,
        Err(e) => return format!("Error calling tool '{name}': {e}"),
    };
    match running.call_tool(params).await {
        Ok(result) => call_result_to_string(name, &result),
        Err(e) => format!("Error calling tool '{name}': {e}"),
    }
}

/// Executor that forwards one tool's calls to the client's worker task.
struct McpToolExecutor {
    schema: ToolSchema,
    request_tx: Option<mpsc::Sender<ToolRequest>>,
    call_timeout: Duration,
}

#[async_trait]
impl ToolExecutor for McpToolExecutor {
    fn name(&self) -> &str {
        &self.schema.name
    }

    fn description(&self) -> &str {
        &self.schema.description
    }

    fn parameters_schema(&self) -> serde_json::Value {
        self.schema.parameters.clone()
    }

    async fn execute(&self, arguments: &str) -> String {
        let Some(request_tx) = &self.request_tx else {
            return NOT_CONNECTED.to_string();
        };

        let arguments = if arguments.trim().is_empty() {
            None
        } else {
            match serde_json::from_str::<serde_json::Value>(arguments) {
                Ok(serde_json::Value::Object(map)) => Some(map),
                Ok(serde_json::Value::Null) => None,
                Ok(_) => return "Error: tool arguments must be a JSON object.".to_string(),
                Err(e) => {
                    return format!("Error: could not parse tool arguments as JSON: {e}");
                }
            }
        };

        let (reply_tx, reply_rx) = oneshot::channel();
        let request = ToolRequest {
            name: self.schema.name.clone(),
            arguments,
            reply: reply_tx,
        };
        if request_tx.send(request).await.is_err() {
            return NOT_CONNECTED.to_string();
        }

        match tokio::time::timeout(self.call_timeout, reply_rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => NOT_CONNECTED.to_string(),
            Err(_) => format!(
                "Error: Tool call '{}' timed out after {} seconds.",
                self.schema.name,
                self.call_timeout.as_secs()
            ),
        }
    }
}
