//! Newline-delimited JSON-RPC transport to a wallet host.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{Mutex, mpsc, oneshot};

use crate::error::InvokeError;

pub const JSONRPC_VERSION: &str = "2.0";

pub type HostWriter = Box<dyn AsyncWrite + Send + Unpin>;
pub type HostReader = Box<dyn AsyncRead + Send + Unpin>;

type PendingRequest = oneshot::Sender<Result<Value, InvokeError>>;
/// `None` once the reader has seen the host close its output.
type PendingRequests = Option<HashMap<i64, PendingRequest>>;

/// Appends every inbound and outbound frame to a JSONL file.
#[derive(Clone)]
pub struct WireLog {
    tx: mpsc::UnboundedSender<WireLogEntry>,
}

struct WireLogEntry {
    direction: WireDirection,
    raw: String,
}

#[derive(Clone, Copy)]
enum WireDirection {
    Inbound,
    Outbound,
}

impl WireLog {
    /// Must be called from within a tokio runtime.
    pub fn open(path: PathBuf) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<WireLogEntry>();
        tokio::spawn(async move {
            if let Some(parent) = path.parent() {
                let _ = tokio::fs::create_dir_all(parent).await;
            }
            let mut file = match tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(err) => {
                    tracing::warn!(error = %err, path = %path.display(), "Failed to open wire log");
                    return;
                }
            };

            while let Some(entry) = rx.recv().await {
                let line = serde_json::json!({
                    "timestamp": chrono::Utc::now().to_rfc3339(),
                    "direction": match entry.direction {
                        WireDirection::Inbound => "in",
                        WireDirection::Outbound => "out",
                    },
                    "raw": entry.raw,
                });
                let line = serde_json::to_string(&line).unwrap_or_else(|_| "{}".to_string());
                let _ = file.write_all(line.as_bytes()).await;
                let _ = file.write_all(b"\n").await;
                let _ = file.flush().await;
            }
        });

        Self { tx }
    }

    fn log(&self, direction: WireDirection, raw: &str) {
        let _ = self.tx.send(WireLogEntry {
            direction,
            raw: raw.to_string(),
        });
    }
}

/// Correlates JSON-RPC responses with their requests by id.
///
/// A single reader task owns the inbound half. Each request parks a oneshot
/// sender in the pending map; when the connection closes every parked request
/// fails with [`InvokeError::Closed`], and so does every later request.
pub struct RpcTransport {
    writer: Arc<Mutex<HostWriter>>,
    pending: Arc<Mutex<PendingRequests>>,
    request_counter: AtomicI64,
    reader_task: Option<tokio::task::JoinHandle<()>>,
    wire_log: Option<WireLog>,
}

impl RpcTransport {
    pub fn new(writer: HostWriter, reader: HostReader, wire_log: Option<WireLog>) -> Self {
        let pending: Arc<Mutex<PendingRequests>> = Arc::new(Mutex::new(Some(HashMap::new())));
        let pending_reader = pending.clone();
        let wire_log_reader = wire_log.clone();

        let reader_task = tokio::spawn(async move {
            let mut lines = BufReader::new(reader).lines();

            while let Ok(Some(line)) = lines.next_line().await {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if let Some(log) = &wire_log_reader {
                    log.log(WireDirection::Inbound, trimmed);
                }

                let value: Value = match serde_json::from_str(trimmed) {
                    Ok(value) => value,
                    Err(err) => {
                        tracing::warn!(error = %err, line = %trimmed, "Wallet host JSON parse failed");
                        continue;
                    }
                };

                if let Some(method) = value.get("method").and_then(Value::as_str) {
                    tracing::debug!(method, "Ignoring wallet host notification");
                    continue;
                }

                let Some(id) = value.get("id").and_then(Value::as_i64) else {
                    tracing::warn!(line = %trimmed, "Wallet host response without numeric id");
                    continue;
                };

                let result = match value.get("error") {
                    Some(error) => Err(remote_error(error)),
                    None => Ok(value.get("result").cloned().unwrap_or(Value::Null)),
                };

                let mut pending = pending_reader.lock().await;
                if let Some(sender) = pending.as_mut().and_then(|pending| pending.remove(&id)) {
                    let _ = sender.send(result);
                } else {
                    tracing::warn!(id, "Wallet host response without pending request");
                }
            }

            let closed = pending_reader.lock().await.take();
            for (_, sender) in closed.into_iter().flatten() {
                let _ = sender.send(Err(InvokeError::Closed));
            }
            tracing::debug!("Wallet host closed its output");
        });

        Self {
            writer: Arc::new(Mutex::new(writer)),
            pending,
            request_counter: AtomicI64::new(1),
            reader_task: Some(reader_task),
            wire_log,
        }
    }

    pub async fn request<T, R>(&self, method: &str, params: &T) -> Result<R, InvokeError>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let id = self.request_counter.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        match self.pending.lock().await.as_mut() {
            Some(pending) => {
                pending.insert(id, tx);
            }
            None => return Err(InvokeError::Closed),
        }

        let request = serde_json::json!({
            "jsonrpc": JSONRPC_VERSION,
            "id": id,
            "method": method,
            "params": params,
        });

        if let Err(err) = self.send_json(&request).await {
            if let Some(pending) = self.pending.lock().await.as_mut() {
                pending.remove(&id);
            }
            return Err(err);
        }

        tracing::debug!(id, method, "Wallet host request sent");
        let result = rx.await.map_err(|_| InvokeError::Closed)??;
        serde_json::from_value(result).map_err(InvokeError::decode)
    }

    async fn send_json(&self, value: &Value) -> Result<(), InvokeError> {
        let payload = serde_json::to_string(value).map_err(InvokeError::transport)?;
        if let Some(log) = &self.wire_log {
            log.log(WireDirection::Outbound, &payload);
        }
        let mut writer = self.writer.lock().await;
        writer
            .write_all(payload.as_bytes())
            .await
            .map_err(InvokeError::transport)?;
        writer.write_all(b"\n").await.map_err(InvokeError::transport)?;
        writer.flush().await.map_err(InvokeError::transport)?;
        Ok(())
    }

    pub async fn shutdown(mut self) {
        if let Some(task) = self.reader_task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for RpcTransport {
    fn drop(&mut self) {
        if let Some(task) = self.reader_task.take() {
            task.abort();
        }
    }
}

fn remote_error(error: &Value) -> InvokeError {
    let code = error.get("code").and_then(Value::as_i64).unwrap_or(-1);
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("Unknown error")
        .to_string();
    let data = error.get("data").cloned();
    InvokeError::Remote {
        code,
        message,
        data,
    }
}
