//! Submits composed calls and folds their settlements into the history.
//!
//! Calls run as spawned tasks. Each task settles its own invocation and sends
//! the result over a channel; only the engine's owner applies results to the
//! history, one at a time, in the order they arrive.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::history::{History, HistoryEvent};
use crate::inputs::RawValue;
use crate::invocation::{InvocationError, InvocationResult, Outcome, PendingInvocation};
use crate::registry::OperationDescriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// The call is running; its result arrives through the settlement channel.
    Started(Uuid),
    /// Composition failed and an ERROR entry was recorded without calling out.
    Rejected(Uuid),
}

impl Submission {
    pub fn uuid(self) -> Uuid {
        match self {
            Self::Started(uuid) | Self::Rejected(uuid) => uuid,
        }
    }
}

#[derive(Debug)]
pub struct InvocationEngine {
    history: History,
    pending: Vec<PendingInvocation>,
    settled_tx: mpsc::UnboundedSender<InvocationResult>,
    settled_rx: mpsc::UnboundedReceiver<InvocationResult>,
}

impl InvocationEngine {
    pub fn new(history_capacity: usize) -> Self {
        let (settled_tx, settled_rx) = mpsc::unbounded_channel();
        Self {
            history: History::new(history_capacity),
            pending: Vec::new(),
            settled_tx,
            settled_rx,
        }
    }

    /// Composes `raw` against `operation` and starts the call. Must be called
    /// from within a Tokio runtime.
    pub fn submit(&mut self, operation: &OperationDescriptor, raw: Vec<RawValue>) -> Submission {
        let pending = PendingInvocation::new(operation.id, raw);
        let uuid = pending.uuid();

        let call = match operation.prepare(pending.inputs()) {
            Ok(call) => call,
            Err(err) => {
                tracing::debug!(operation = operation.id, %uuid, error = %err, "Composition failed");
                self.record(pending.settle(Outcome::Error(err.into())));
                return Submission::Rejected(uuid);
            }
        };

        tracing::debug!(operation = operation.id, %uuid, "Invocation submitted");
        self.pending.push(pending.clone());
        let settled_tx = self.settled_tx.clone();
        tokio::spawn(async move {
            let outcome = match AssertUnwindSafe(call).catch_unwind().await {
                Ok(result) => Outcome::from(result.map_err(InvocationError::from)),
                Err(panic) => {
                    Outcome::Error(InvocationError::Panicked(panic_message(panic.as_ref())))
                }
            };
            if settled_tx.send(pending.settle(outcome)).is_err() {
                tracing::debug!(%uuid, "Engine dropped before settlement");
            }
        });
        Submission::Started(uuid)
    }

    /// Applies every settlement that has already arrived, without waiting.
    pub fn drain_settlements(&mut self) -> Vec<InvocationResult> {
        let mut settled = Vec::new();
        while let Ok(result) = self.settled_rx.try_recv() {
            self.record(result.clone());
            settled.push(result);
        }
        settled
    }

    /// Waits for the next settlement and applies it. Returns `None` at once
    /// when nothing is in flight. Cancel safe.
    pub async fn next_settlement(&mut self) -> Option<InvocationResult> {
        if self.pending.is_empty() {
            return None;
        }
        let result = self.settled_rx.recv().await?;
        self.record(result.clone());
        Some(result)
    }

    /// Waits until every in-flight call has settled.
    pub async fn wait_idle(&mut self) -> Vec<InvocationResult> {
        let mut settled = Vec::new();
        while let Some(result) = self.next_settlement().await {
            settled.push(result);
        }
        settled
    }

    /// Empties the history. In-flight calls keep running and still get recorded.
    pub fn clear_history(&mut self) {
        self.history.apply(HistoryEvent::Cleared);
        tracing::debug!(in_flight = self.pending.len(), "History cleared");
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// In-flight invocations in submission order.
    pub fn pending(&self) -> &[PendingInvocation] {
        &self.pending
    }

    fn record(&mut self, result: InvocationResult) {
        self.pending.retain(|pending| pending.uuid() != result.uuid());
        tracing::info!(
            operation = result.operation_id(),
            uuid = %result.uuid(),
            status = result.status().label(),
            elapsed_ms = result.elapsed().num_milliseconds(),
            "Invocation settled"
        );
        if let Some(evicted) = self.history.apply(HistoryEvent::Settled(result)) {
            tracing::debug!(uuid = %evicted.uuid(), "History entry evicted");
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use wallet_api_client::{SimulatedWallet, WalletApi};

    use super::{InvocationEngine, Submission};
    use crate::invocation::{InvocationError, InvocationStatus};
    use crate::registry::{OperationDescriptor, OperationRegistry};

    fn registry() -> OperationRegistry {
        let api: Arc<dyn WalletApi> =
            Arc::new(SimulatedWallet::standard().with_latency(Duration::from_millis(5)));
        OperationRegistry::new(api)
    }

    #[tokio::test]
    async fn success_settles_into_history() -> anyhow::Result<()> {
        let registry = registry();
        let Some(op) = registry.get("listAccounts") else {
            anyhow::bail!("listAccounts is registered");
        };
        let mut engine = InvocationEngine::new(10);
        let submission = engine.submit(op, Vec::new());
        assert!(matches!(submission, Submission::Started(_)));
        assert_eq!(engine.pending().len(), 1);
        assert!(engine.history().is_empty());

        let settled = engine.wait_idle().await;
        assert_eq!(settled.len(), 1);
        assert!(engine.pending().is_empty());
        let Some(entry) = engine.history().last() else {
            anyhow::bail!("history has the settled entry");
        };
        assert_eq!(entry.uuid(), submission.uuid());
        assert_eq!(entry.status(), InvocationStatus::Success);
        Ok(())
    }

    #[tokio::test]
    async fn composition_failure_records_error_without_pending() -> anyhow::Result<()> {
        let registry = registry();
        let Some(op) = registry.get("listCurrencies") else {
            anyhow::bail!("listCurrencies is registered");
        };
        let mut engine = InvocationEngine::new(10);
        let submission = engine.submit(op, vec![Some("{\"a\":1".to_string())]);
        assert!(matches!(submission, Submission::Rejected(_)));
        assert!(engine.pending().is_empty());
        assert_eq!(engine.history().len(), 1);
        assert!(matches!(
            engine.history().last().and_then(|entry| entry.error()),
            Some(InvocationError::Compose(_))
        ));
        assert!(engine.next_settlement().await.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn panicking_call_becomes_error_entry() -> anyhow::Result<()> {
        let op = OperationDescriptor::new("boom", "Boom", "", (), |()| async {
            if true {
                panic!("host exploded");
            }
            Ok::<_, wallet_api_client::InvokeError>(())
        });
        let mut engine = InvocationEngine::new(10);
        engine.submit(&op, Vec::new());
        let Some(result) = engine.next_settlement().await else {
            anyhow::bail!("panicking call still settles");
        };
        assert_eq!(
            result.error(),
            Some(&InvocationError::Panicked("host exploded".to_string()))
        );
        Ok(())
    }
}
