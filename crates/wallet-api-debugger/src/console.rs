//! The debugger console: registry, slot editing, invocation engine and context
//! behind one owner.

use std::sync::Arc;

use chrono::Utc;
use wallet_api_client::WalletApi;

use crate::compose::{InputComposer, InputError};
use crate::config::DebuggerConfig;
use crate::context::{ContextError, ContextProvider, DebuggerContext};
use crate::engine::{InvocationEngine, Submission};
use crate::history::History;
use crate::inputs::{RawValue, SelectOption};
use crate::invocation::InvocationResult;
use crate::registry::{OperationDescriptor, OperationRegistry};
use crate::render::{ConsoleEntry, render_entry};

/// What an input widget shows for one slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotView {
    pub index: usize,
    pub name: &'static str,
    pub widget: &'static str,
    pub value: RawValue,
    /// Empty for JSON editors, and for account selectors before the context loads.
    pub options: Vec<SelectOption>,
}

pub struct Console {
    api: Arc<dyn WalletApi>,
    registry: OperationRegistry,
    composer: InputComposer,
    engine: InvocationEngine,
    context: ContextProvider,
}

impl Console {
    /// Builds the registry for `api` and selects the first operation. Nothing
    /// is sent until [`Console::mount`] or a submission.
    pub fn new(api: Arc<dyn WalletApi>, config: &DebuggerConfig) -> Self {
        let registry = OperationRegistry::new(Arc::clone(&api));
        let mut composer = InputComposer::default();
        if let Some(first) = registry.first() {
            composer.select(first);
        }
        Self {
            api,
            registry,
            composer,
            engine: InvocationEngine::new(config.history_capacity),
            context: ContextProvider::new(config.context_currency_ids.clone()),
        }
    }

    /// Loads the context. A failure is logged and leaves the console usable.
    pub async fn mount(&mut self) -> Result<(), ContextError> {
        self.refresh_context().await
    }

    pub async fn refresh_context(&mut self) -> Result<(), ContextError> {
        self.context.refresh(self.api.as_ref()).await
    }

    pub fn registry(&self) -> &OperationRegistry {
        &self.registry
    }

    pub fn select(&mut self, id: &str) -> Result<&OperationDescriptor, InputError> {
        let operation = self
            .registry
            .get(id)
            .ok_or_else(|| InputError::UnknownOperation(id.to_string()))?;
        self.composer.select(operation);
        Ok(operation)
    }

    pub fn selected(&self) -> Option<&OperationDescriptor> {
        self.composer
            .selected()
            .and_then(|id| self.registry.get(id))
    }

    pub fn slots(&self) -> Vec<SlotView> {
        let Some(operation) = self.selected() else {
            return Vec::new();
        };
        operation
            .inputs()
            .iter()
            .zip(self.composer.values())
            .enumerate()
            .map(|(index, (input, value))| SlotView {
                index,
                name: input.name,
                widget: input.widget.label(),
                value: value.clone(),
                options: input.widget.options(self.context.context()),
            })
            .collect()
    }

    /// The widget `on_change` contract: replaces one slot's raw value.
    pub fn edit(&mut self, index: usize, value: RawValue) -> Result<(), InputError> {
        self.composer.edit(index, value)
    }

    /// Sets a selector slot to the value of its `option`-th option.
    pub fn pick(&mut self, index: usize, option: usize) -> Result<(), InputError> {
        let slot = self
            .slots()
            .into_iter()
            .nth(index)
            .ok_or(InputError::SlotOutOfRange {
                index,
                arity: self.composer.values().len(),
            })?;
        let available = slot.options.len();
        let choice = slot
            .options
            .into_iter()
            .nth(option)
            .ok_or(InputError::OptionOutOfRange {
                index,
                option,
                available,
            })?;
        self.composer.edit(index, Some(choice.value))
    }

    pub fn format_slot(&mut self, index: usize) -> Result<bool, InputError> {
        self.composer.format_slot(index)
    }

    pub fn reset_inputs(&mut self) -> Result<(), InputError> {
        let id = self.composer.selected().ok_or(InputError::NoOperationSelected)?;
        self.select(id).map(|_| ())
    }

    pub fn values(&self) -> &[RawValue] {
        self.composer.values()
    }

    /// Submits the selected operation with the current slot values.
    pub fn submit(&mut self) -> Result<Submission, InputError> {
        let id = self.composer.selected().ok_or(InputError::NoOperationSelected)?;
        let raw = self.composer.values().to_vec();
        self.submit_values(id, raw)
    }

    /// Submits `id` with explicit raw values, leaving the editor untouched.
    pub fn submit_values(&mut self, id: &str, raw: Vec<RawValue>) -> Result<Submission, InputError> {
        let operation = self
            .registry
            .get(id)
            .ok_or_else(|| InputError::UnknownOperation(id.to_string()))?;
        Ok(self.engine.submit(operation, raw))
    }

    pub async fn next_settlement(&mut self) -> Option<InvocationResult> {
        self.engine.next_settlement().await
    }

    pub fn drain(&mut self) -> Vec<InvocationResult> {
        self.engine.drain_settlements()
    }

    pub async fn wait_idle(&mut self) -> Vec<InvocationResult> {
        self.engine.wait_idle().await
    }

    pub fn clear_history(&mut self) {
        self.engine.clear_history();
    }

    pub fn history(&self) -> &History {
        self.engine.history()
    }

    pub fn in_flight(&self) -> usize {
        self.engine.pending().len()
    }

    /// Settled history in completion order, then in-flight placeholders in
    /// submission order.
    pub fn entries(&self) -> Vec<ConsoleEntry<'_>> {
        self.engine
            .history()
            .entries()
            .map(ConsoleEntry::Settled)
            .chain(self.engine.pending().iter().map(ConsoleEntry::Pending))
            .collect()
    }

    pub fn render(&self) -> Vec<String> {
        let now = Utc::now();
        self.entries()
            .iter()
            .map(|entry| render_entry(entry, now))
            .collect()
    }

    pub fn context(&self) -> &DebuggerContext {
        self.context.context()
    }

    pub fn context_error(&self) -> Option<&ContextError> {
        self.context.last_error()
    }
}
