//! Interactive exploration console for a wallet host's remote API.
//!
//! The [`OperationRegistry`] describes every operation with a typed input
//! list, the [`InputComposer`] tracks the raw slot values, the
//! [`InvocationEngine`] runs calls and folds their settlements into a bounded
//! [`History`], and the [`ContextProvider`] loads the accounts and currencies
//! selector widgets offer. [`Console`] ties them together.

pub mod compose;
pub mod config;
pub mod console;
pub mod context;
pub mod defaults;
pub mod engine;
pub mod history;
pub mod inputs;
pub mod invocation;
pub mod registry;
pub mod render;

pub use compose::{InputComposer, InputError, pretty_json, pretty_value};
pub use config::{ConfigError, DebuggerConfig, TransportMode};
pub use console::{Console, SlotView};
pub use context::{ContextError, ContextProvider, DebuggerContext, load_context};
pub use engine::{InvocationEngine, Submission};
pub use history::{DEFAULT_HISTORY_CAPACITY, History, HistoryEvent};
pub use inputs::{
    ComposeError, InputDescriptor, InputList, InputSpec, InputWidget, Modifier, ModifierError,
    RawValue, SelectOption,
};
pub use invocation::{
    InvocationError, InvocationResult, InvocationStatus, Outcome, PendingInvocation,
};
pub use registry::{InvokeFuture, OperationDescriptor, OperationRegistry, RegistryError, catalog};
pub use render::{ConsoleEntry, format_distance, render_entry};
