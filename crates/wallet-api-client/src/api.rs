use async_trait::async_trait;

use crate::error::InvokeError;
use crate::types::{
    Account, CompleteExchangeParams, Currency, ExchangeType, ListAccountsParams,
    ListCurrenciesParams, RawSignedTransaction, RequestAccountParams, SignTransactionParams,
    Transaction,
};

/// Remote procedures a wallet host exposes to an embedded app.
///
/// Implemented by [`crate::WalletApiClient`] for a live host and by
/// [`crate::SimulatedWallet`] for offline use. Every method is a suspension
/// point; none of them block the caller's thread.
#[async_trait]
pub trait WalletApi: Send + Sync {
    async fn list_accounts(&self, params: ListAccountsParams) -> Result<Vec<Account>, InvokeError>;

    async fn list_currencies(
        &self,
        params: ListCurrenciesParams,
    ) -> Result<Vec<Currency>, InvokeError>;

    /// Shows the host's account picker and resolves with the chosen account.
    async fn request_account(&self, params: RequestAccountParams) -> Result<Account, InvokeError>;

    /// Asks the user to verify the account address on their device.
    async fn receive(&self, account_id: String) -> Result<String, InvokeError>;

    async fn sign_transaction(
        &self,
        account_id: String,
        transaction: Transaction,
        params: SignTransactionParams,
    ) -> Result<RawSignedTransaction, InvokeError>;

    /// Resolves with the broadcast transaction hash.
    async fn broadcast_signed_transaction(
        &self,
        account_id: String,
        signed_transaction: RawSignedTransaction,
    ) -> Result<String, InvokeError>;

    /// Resolves with the exchange nonce.
    async fn start_exchange(&self, exchange_type: ExchangeType) -> Result<String, InvokeError>;

    async fn complete_exchange(&self, params: CompleteExchangeParams)
    -> Result<String, InvokeError>;

    /// Resolves with the hex encoded signature.
    async fn sign_message(&self, account_id: String, message: Vec<u8>)
    -> Result<String, InvokeError>;
}
