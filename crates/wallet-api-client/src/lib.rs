//! Wallet host API: wire types, the [`WalletApi`] trait, a JSON-RPC client for
//! a live host and a simulated wallet.

mod api;
mod client;
mod error;
mod simulator;
mod transport;
mod types;

pub use api::WalletApi;
pub use client::{HostCommand, SUPPORTED_REQUEST_METHODS, WalletApiClient, methods};
pub use error::{InvokeError, TransactionError};
pub use simulator::{DEFAULT_SIMULATOR_LATENCY, SimulatedWallet, SimulatorProfile};
pub use transport::{HostReader, HostWriter, JSONRPC_VERSION, RpcTransport, WireLog};
pub use types::*;
