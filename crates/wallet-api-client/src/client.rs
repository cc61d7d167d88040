//! Wallet host JSON-RPC client.

use std::process::Stdio;

use async_trait::async_trait;
use serde_json::json;
use tokio::process::{Child, Command};

use crate::api::WalletApi;
use crate::error::InvokeError;
use crate::transport::{HostReader, HostWriter, RpcTransport, WireLog};
use crate::types::{
    Account, CompleteExchangeParams, Currency, ExchangeType, ListAccountsParams,
    ListCurrenciesParams, RawSignedTransaction, RequestAccountParams, SignTransactionParams,
    Transaction, serialize_transaction,
};

/// JSON-RPC method names understood by the wallet host.
pub mod methods {
    pub const ACCOUNT_LIST: &str = "account.list";
    pub const CURRENCY_LIST: &str = "currency.list";
    pub const ACCOUNT_REQUEST: &str = "account.request";
    pub const ACCOUNT_RECEIVE: &str = "account.receive";
    pub const TRANSACTION_SIGN: &str = "transaction.sign";
    pub const TRANSACTION_BROADCAST: &str = "transaction.broadcast";
    pub const EXCHANGE_START: &str = "exchange.start";
    pub const EXCHANGE_COMPLETE: &str = "exchange.complete";
    pub const MESSAGE_SIGN: &str = "message.sign";
}

pub const SUPPORTED_REQUEST_METHODS: &[&str] = &[
    methods::ACCOUNT_LIST,
    methods::CURRENCY_LIST,
    methods::ACCOUNT_REQUEST,
    methods::ACCOUNT_RECEIVE,
    methods::TRANSACTION_SIGN,
    methods::TRANSACTION_BROADCAST,
    methods::EXCHANGE_START,
    methods::EXCHANGE_COMPLETE,
    methods::MESSAGE_SIGN,
];

/// Program and arguments used to launch a wallet host that speaks JSON-RPC on stdio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl HostCommand {
    /// Splits a command line on whitespace. Returns `None` for a blank line.
    pub fn parse(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }
}

pub struct WalletApiClient {
    transport: RpcTransport,
    process: Option<Child>,
}

impl WalletApiClient {
    pub fn spawn(command: &HostCommand, wire_log: Option<WireLog>) -> Result<Self, InvokeError> {
        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| {
                InvokeError::Transport(format!(
                    "failed to spawn wallet host `{}`: {err}",
                    command.program
                ))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| InvokeError::Transport("wallet host stdin missing".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| InvokeError::Transport("wallet host stdout missing".to_string()))?;

        tracing::info!(program = %command.program, "Wallet host started");
        Ok(Self {
            transport: RpcTransport::new(Box::new(stdin), Box::new(stdout), wire_log),
            process: Some(child),
        })
    }

    pub fn connect_with_io(
        writer: HostWriter,
        reader: HostReader,
        wire_log: Option<WireLog>,
    ) -> Self {
        Self {
            transport: RpcTransport::new(writer, reader, wire_log),
            process: None,
        }
    }

    pub async fn shutdown(mut self) {
        if let Some(mut process) = self.process.take() {
            let _ = process.kill().await;
            let _ = process.wait().await;
        }
        self.transport.shutdown().await;
    }
}

#[async_trait]
impl WalletApi for WalletApiClient {
    async fn list_accounts(&self, params: ListAccountsParams) -> Result<Vec<Account>, InvokeError> {
        self.transport.request(methods::ACCOUNT_LIST, &params).await
    }

    async fn list_currencies(
        &self,
        params: ListCurrenciesParams,
    ) -> Result<Vec<Currency>, InvokeError> {
        self.transport.request(methods::CURRENCY_LIST, &params).await
    }

    async fn request_account(&self, params: RequestAccountParams) -> Result<Account, InvokeError> {
        self.transport.request(methods::ACCOUNT_REQUEST, &params).await
    }

    async fn receive(&self, account_id: String) -> Result<String, InvokeError> {
        self.transport
            .request(methods::ACCOUNT_RECEIVE, &json!({ "accountId": account_id }))
            .await
    }

    async fn sign_transaction(
        &self,
        account_id: String,
        transaction: Transaction,
        params: SignTransactionParams,
    ) -> Result<RawSignedTransaction, InvokeError> {
        let params = json!({
            "accountId": account_id,
            "transaction": serialize_transaction(&transaction),
            "params": params,
        });
        self.transport.request(methods::TRANSACTION_SIGN, &params).await
    }

    async fn broadcast_signed_transaction(
        &self,
        account_id: String,
        signed_transaction: RawSignedTransaction,
    ) -> Result<String, InvokeError> {
        let params = json!({
            "accountId": account_id,
            "signedTransaction": signed_transaction,
        });
        self.transport.request(methods::TRANSACTION_BROADCAST, &params).await
    }

    async fn start_exchange(&self, exchange_type: ExchangeType) -> Result<String, InvokeError> {
        self.transport
            .request(methods::EXCHANGE_START, &json!({ "exchangeType": exchange_type }))
            .await
    }

    async fn complete_exchange(
        &self,
        params: CompleteExchangeParams,
    ) -> Result<String, InvokeError> {
        self.transport.request(methods::EXCHANGE_COMPLETE, &params).await
    }

    async fn sign_message(
        &self,
        account_id: String,
        message: Vec<u8>,
    ) -> Result<String, InvokeError> {
        let params = json!({
            "accountId": account_id,
            "message": hex::encode(message),
        });
        self.transport.request(methods::MESSAGE_SIGN, &params).await
    }
}

#[cfg(test)]
mod tests {
    use super::{HostCommand, SUPPORTED_REQUEST_METHODS};

    #[test]
    fn host_command_splits_program_and_args() {
        assert_eq!(
            HostCommand::parse("  node host.js --fixtures ./fx "),
            Some(HostCommand {
                program: "node".to_string(),
                args: vec![
                    "host.js".to_string(),
                    "--fixtures".to_string(),
                    "./fx".to_string()
                ],
            })
        );
        assert_eq!(HostCommand::parse("   "), None);
    }

    #[test]
    fn supported_methods_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for method in SUPPORTED_REQUEST_METHODS {
            assert!(seen.insert(*method), "duplicate method {method}");
        }
    }
}
