//! A single long-lived LSP session: JSON-RPC 2.0 over stdio with
//! Content-Length framing, shared between requests and the async
//! notification drain.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout};
use tracing::{debug, warn};

use crate::error::ToolError;
use crate::tools::process_utils::direct_command;

use super::uri::{language_id_for, path_to_uri};

const DIAGNOSTICS_WAIT: Duration = Duration::from_secs(2);

struct SessionIo {
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

/// A single request/response/notification frame read off stdout.
async fn read_frame(stdout: &mut BufReader<ChildStdout>) -> Result<Value, ToolError> {
    let mut content_length: Option<usize> = None;
    loop {
        let mut line = String::new();
        let n = stdout
            .read_line(&mut line)
            .await
            .map_err(|e| ToolError::SubsystemUnavailable(format!("LSP stdout closed: {e}")))?;
        if n == 0 {
            return Err(ToolError::SubsystemUnavailable("LSP server closed stdout".into()));
        }
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if let Some(len) = line.strip_prefix("Content-Length: ") {
            content_length = Some(
                len.trim()
                    .parse()
                    .map_err(|e| ToolError::Fatal(format!("invalid Content-Length: {e}")))?,
            );
        }
    }
    let len = content_length.ok_or_else(|| ToolError::Fatal("missing Content-Length header".into()))?;
    let mut buf = vec![0u8; len];
    stdout
        .read_exact(&mut buf)
        .await
        .map_err(|e| ToolError::SubsystemUnavailable(format!("LSP stdout closed mid-frame: {e}")))?;
    serde_json::from_slice(&buf).map_err(|e| ToolError::Fatal(format!("invalid LSP frame: {e}")))
}

async fn write_frame(stdin: &mut ChildStdin, message: &Value) -> Result<(), ToolError> {
    let content = serde_json::to_string(message).map_err(|e| ToolError::Fatal(e.to_string()))?;
    let header = format!("Content-Length: {}\r\n\r\n", content.len());
    stdin
        .write_all(header.as_bytes())
        .await
        .map_err(|e| ToolError::SubsystemUnavailable(format!("LSP stdin closed: {e}")))?;
    stdin
        .write_all(content.as_bytes())
        .await
        .map_err(|e| ToolError::SubsystemUnavailable(format!("LSP stdin closed: {e}")))?;
    stdin.flush().await.map_err(|e| ToolError::SubsystemUnavailable(e.to_string()))?;
    Ok(())
}

/// A long-lived bridge to one external LSP server process. The single
/// `io` mutex covers writing a request and reading frames until the
/// matching response arrives, since responses and server-pushed
/// notifications interleave on the same stream.
pub struct LspSession {
    io: tokio::sync::Mutex<SessionIo>,
    child: tokio::sync::Mutex<Child>,
    workspace_root: PathBuf,
    next_request_id: AtomicI64,
    initialized: AtomicBool,
    open_documents: parking_lot::Mutex<HashMap<String, i32>>,
    diagnostics: parking_lot::Mutex<HashMap<String, Vec<Value>>>,
    diagnostics_version: AtomicI64,
    server_capabilities: parking_lot::Mutex<Option<Value>>,
    server_info: parking_lot::Mutex<Option<Value>>,
}

impl LspSession {
    pub async fn start(workspace_root: &Path, command: &str, args: &[String]) -> Result<Self, ToolError> {
        let mut child = direct_command(command)
            .args(args)
            .current_dir(workspace_root)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .spawn()
            .map_err(|e| ToolError::SubsystemUnavailable(format!("failed to spawn {command}: {e}")))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ToolError::Fatal("LSP child has no stdin".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ToolError::Fatal("LSP child has no stdout".into()))?;

        let session = Self {
            io: tokio::sync::Mutex::new(SessionIo { stdin, stdout: BufReader::new(stdout) }),
            child: tokio::sync::Mutex::new(child),
            workspace_root: workspace_root.to_path_buf(),
            next_request_id: AtomicI64::new(1),
            initialized: AtomicBool::new(false),
            open_documents: parking_lot::Mutex::new(HashMap::new()),
            diagnostics: parking_lot::Mutex::new(HashMap::new()),
            diagnostics_version: AtomicI64::new(0),
            server_capabilities: parking_lot::Mutex::new(None),
            server_info: parking_lot::Mutex::new(None),
        };

        session.initialize().await?;
        Ok(session)
    }

    async fn initialize(&self) -> Result<(), ToolError> {
        let root_uri = path_to_uri(&self.workspace_root).map_err(ToolError::Fatal)?;
        let params = json!({
            "processId": std::process::id(),
            "rootUri": root_uri,
            "capabilities": {
                "textDocument": {
                    "hover": {},
                    "definition": {},
                    "references": {},
                    "documentSymbol": {},
                    "publishDiagnostics": {},
                    "rename": {},
                    "codeAction": {},
                    "formatting": {},
                    "callHierarchy": {},
                    "typeHierarchy": {},
                    "implementation": {},
                    "signatureHelp": {},
                    "inlayHint": {},
                    "synchronization": { "didSave": true }
                },
                "workspace": { "symbol": {}, "applyEdit": true }
            }
        });

        let result = self.send_request("initialize", params).await?;
        *self.server_capabilities.lock() = result.get("capabilities").cloned();
        *self.server_info.lock() = result.get("serverInfo").cloned();

        self.send_notification("initialized", json!({})).await?;
        self.initialized.store(true, Ordering::SeqCst);
        debug!("LSP server initialized");
        Ok(())
    }

    pub async fn shutdown(&self) -> Result<(), ToolError> {
        if self.initialized.load(Ordering::SeqCst) {
            let _ = self.send_request("shutdown", Value::Null).await;
            let _ = self.send_notification("exit", Value::Null).await;
        }
        let mut child = self.child.lock().await;
        match tokio::time::timeout(Duration::from_secs(3), child.wait()).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => warn!(error = %e, "LSP process exit wait failed"),
            Err(_) => {
                warn!("LSP process did not exit in time, killing");
                let _ = child.start_kill();
            }
        }
        Ok(())
    }

    fn next_id(&self) -> i64 {
        self.next_request_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Write a request and read frames until the matching response
    /// arrives. Non-matching frames are dispatched as notifications.
    pub async fn send_request(&self, method: &str, params: Value) -> Result<Value, ToolError> {
        let id = self.next_id();
        let request = json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params });

        let mut io = self.io.lock().await;
        write_frame(&mut io.stdin, &request).await?;

        loop {
            let frame = read_frame(&mut io.stdout).await?;
            match frame.get("id").and_then(|v| v.as_i64()) {
                Some(frame_id) if frame_id == id => {
                    if let Some(error) = frame.get("error") {
                        return Err(ToolError::RemoteFailure(format!("LSP error from {method}: {error}")));
                    }
                    return Ok(frame.get("result").cloned().unwrap_or(Value::Null));
                }
                _ => self.dispatch_notification(&frame),
            }
        }
    }

    pub async fn send_notification(&self, method: &str, params: Value) -> Result<(), ToolError> {
        let notification = json!({ "jsonrpc": "2.0", "method": method, "params": params });
        let mut io = self.io.lock().await;
        write_frame(&mut io.stdin, &notification).await
    }

    fn dispatch_notification(&self, frame: &Value) {
        let Some(method) = frame.get("method").and_then(|m| m.as_str()) else {
            return;
        };
        if method == "textDocument/publishDiagnostics" {
            let params = frame.get("params").cloned().unwrap_or(Value::Null);
            if let Some(uri) = params.get("uri").and_then(|u| u.as_str()) {
                let diagnostics = params
                    .get("diagnostics")
                    .and_then(|d| d.as_array())
                    .cloned()
                    .unwrap_or_default();
                self.diagnostics.lock().insert(uri.to_string(), diagnostics);
                self.diagnostics_version.fetch_add(1, Ordering::SeqCst);
            }
        } else {
            debug!(method, "ignoring LSP server notification");
        }
    }

    /// Wait up to `DIAGNOSTICS_WAIT` for `diagnostics_version` to
    /// advance past `since`, actively draining frames off stdout.
    /// Best-effort: on timeout, returns whatever is cached.
    pub async fn wait_for_fresh_diagnostics(&self, since: i64) {
        let deadline = tokio::time::Instant::now() + DIAGNOSTICS_WAIT;
        loop {
            if self.diagnostics_version.load(Ordering::SeqCst) > since {
                return;
            }
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return;
            }
            let mut io = self.io.lock().await;
            match tokio::time::timeout(remaining, read_frame(&mut io.stdout)).await {
                Ok(Ok(frame)) => self.dispatch_notification(&frame),
                _ => return,
            }
        }
    }

    pub fn diagnostics_for(&self, uri: &str) -> Vec<Value> {
        self.diagnostics.lock().get(uri).cloned().unwrap_or_default()
    }

    pub fn diagnostics_version(&self) -> i64 {
        self.diagnostics_version.load(Ordering::SeqCst)
    }

    pub fn capabilities(&self) -> Option<Value> {
        self.server_capabilities.lock().clone()
    }

    pub fn server_info(&self) -> Option<Value> {
        self.server_info.lock().clone()
    }

    /// Ensure `path` is open in the server's document store, opening it
    /// (reading from disk) the first time it's referenced.
    pub async fn ensure_open(&self, path: &Path) -> Result<String, ToolError> {
        let uri = path_to_uri(path).map_err(ToolError::Fatal)?;
        if self.open_documents.lock().contains_key(&uri) {
            return Ok(uri);
        }
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ToolError::Io(e))?;
        let language_id = language_id_for(path);
        self.send_notification(
            "textDocument/didOpen",
            json!({ "textDocument": { "uri": uri, "languageId": language_id, "version": 1, "text": text } }),
        )
        .await?;
        self.open_documents.lock().insert(uri.clone(), 1);
        Ok(uri)
    }

    /// Notify the server of a full-document change (e.g. after this
    /// runtime rewrote the file via `format`/`rename` apply), bumping
    /// the tracked version.
    pub async fn notify_changed(&self, uri: &str, new_text: &str) -> Result<(), ToolError> {
        let version = {
            let mut open = self.open_documents.lock();
            let version = open.get(uri).copied().unwrap_or(1) + 1;
            open.insert(uri.to_string(), version);
            version
        };
        self.send_notification(
            "textDocument/didChange",
            json!({
                "textDocument": { "uri": uri, "version": version },
                "contentChanges": [{ "text": new_text }]
            }),
        )
        .await
    }
}
