//! In-process wallet host used when no live host is attached.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sha2::{Digest, Sha256};

use crate::api::WalletApi;
use crate::error::InvokeError;
use crate::types::{
    Account, CompleteExchangeParams, Currency, CurrencyKind, ExchangeType, ListAccountsParams,
    ListCurrenciesParams, RawSignedTransaction, RequestAccountParams, SignTransactionParams,
    Transaction, serialize_transaction,
};

pub const DEFAULT_SIMULATOR_LATENCY: Duration = Duration::from_millis(120);

const ACCOUNT_NOT_FOUND: i64 = -32_001;

#[derive(Debug, Clone)]
pub struct SimulatorProfile {
    pub accounts: Vec<Account>,
    pub currencies: Vec<Currency>,
}

impl SimulatorProfile {
    /// Two Ethereum accounts and one Bitcoin account, with matching currencies.
    pub fn standard() -> Self {
        let synced_at = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap_or_default();
        let account = |id: &str, name: &str, address: &str, currency: &str, balance: &str| Account {
            id: id.to_string(),
            name: name.to_string(),
            address: address.to_string(),
            currency: currency.to_string(),
            balance: balance.to_string(),
            spendable_balance: balance.to_string(),
            block_height: Some(18_500_000),
            last_sync_date: synced_at,
        };
        let currency = |id: &str, ticker: &str, name: &str, color: &str, decimals: u8| Currency {
            kind: CurrencyKind::CryptoCurrency,
            id: id.to_string(),
            ticker: ticker.to_string(),
            name: name.to_string(),
            family: id.to_string(),
            color: color.to_string(),
            decimals,
            parent: None,
        };

        Self {
            accounts: vec![
                account(
                    "js:2:ethereum:0x6EB963EFD0FEF7A4CFAB6CE6F1421C3279D11707:",
                    "Ethereum 1",
                    "0x6EB963EFD0FEF7A4CFAB6CE6F1421C3279D11707",
                    "ethereum",
                    "42000000000000000",
                ),
                account(
                    "js:2:ethereum:0x90F1A6B1C1A4A2A5E4E6A7D8E9C0B1A2F3D4E5F6:",
                    "Ethereum 2",
                    "0x90F1A6B1C1A4A2A5E4E6A7D8E9C0B1A2F3D4E5F6",
                    "ethereum",
                    "0",
                ),
                account(
                    "js:2:bitcoin:xpub6BosfCnifzxcFwrSzQiqu2DBVTshkCXacvNsWGYJVVhhawA7d4R5WSWGFNbi8Aw6ZRc1brxMyWMzG3DSSSSoekkudhUd9yLb6qx39T9nMdj:native_segwit",
                    "Bitcoin 1",
                    "bc1qar0srrr7xfkvy5l643lydnw9re59gtzzwf5mdq",
                    "bitcoin",
                    "150000",
                ),
            ],
            currencies: vec![
                currency("ethereum", "ETH", "Ethereum", "#0ebdcd", 18),
                currency("bitcoin", "BTC", "Bitcoin", "#ffae35", 8),
            ],
        }
    }
}

/// Answers every wallet API call from a fixed profile after a fixed latency.
#[derive(Debug, Clone)]
pub struct SimulatedWallet {
    profile: SimulatorProfile,
    latency: Duration,
}

impl SimulatedWallet {
    pub fn new(profile: SimulatorProfile, latency: Duration) -> Self {
        Self { profile, latency }
    }

    pub fn standard() -> Self {
        Self::new(SimulatorProfile::standard(), DEFAULT_SIMULATOR_LATENCY)
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    async fn respond(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn account(&self, account_id: &str) -> Result<&Account, InvokeError> {
        self.profile
            .accounts
            .iter()
            .find(|account| account.id == account_id)
            .ok_or_else(|| InvokeError::Remote {
                code: ACCOUNT_NOT_FOUND,
                message: format!("account {account_id} not found"),
                data: None,
            })
    }
}

impl Default for SimulatedWallet {
    fn default() -> Self {
        Self::standard()
    }
}

fn digest_hex(parts: &[&[u8]]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    format!("0x{}", hex::encode(hasher.finalize()))
}

fn filter_ids<'a, T>(
    items: &'a [T],
    ids: Option<&[String]>,
    id_of: impl Fn(&T) -> &str,
) -> Vec<&'a T> {
    items
        .iter()
        .filter(|item| ids.is_none_or(|ids| ids.iter().any(|id| id == id_of(item))))
        .collect()
}

#[async_trait]
impl WalletApi for SimulatedWallet {
    async fn list_accounts(&self, params: ListAccountsParams) -> Result<Vec<Account>, InvokeError> {
        self.respond().await;
        Ok(filter_ids(
            &self.profile.accounts,
            params.currency_ids.as_deref(),
            |account| account.currency.as_str(),
        )
        .into_iter()
        .cloned()
        .collect())
    }

    async fn list_currencies(
        &self,
        params: ListCurrenciesParams,
    ) -> Result<Vec<Currency>, InvokeError> {
        self.respond().await;
        Ok(filter_ids(
            &self.profile.currencies,
            params.currency_ids.as_deref(),
            |currency| currency.id.as_str(),
        )
        .into_iter()
        .cloned()
        .collect())
    }

    async fn request_account(&self, params: RequestAccountParams) -> Result<Account, InvokeError> {
        self.respond().await;
        filter_ids(
            &self.profile.accounts,
            params.currencies.as_deref(),
            |account| account.currency.as_str(),
        )
        .into_iter()
        .next()
        .cloned()
        .ok_or_else(|| InvokeError::Rejected("no account matches the requested currencies".into()))
    }

    async fn receive(&self, account_id: String) -> Result<String, InvokeError> {
        self.respond().await;
        Ok(self.account(&account_id)?.address.clone())
    }

    async fn sign_transaction(
        &self,
        account_id: String,
        transaction: Transaction,
        params: SignTransactionParams,
    ) -> Result<RawSignedTransaction, InvokeError> {
        self.respond().await;
        let account = self.account(&account_id)?;
        let raw = serialize_transaction(&transaction);
        let signature = digest_hex(&[
            account.address.as_bytes(),
            raw.amount.as_bytes(),
            raw.recipient.as_bytes(),
            transaction.data.as_deref().unwrap_or_default(),
        ]);
        Ok(RawSignedTransaction {
            operation: json!({
                "accountId": account.id,
                "type": "OUT",
                "value": raw.amount,
                "recipients": [raw.recipient],
                "senders": [account.address],
                "useApp": params.use_app,
            }),
            signature,
            expiration_date: None,
        })
    }

    async fn broadcast_signed_transaction(
        &self,
        account_id: String,
        signed_transaction: RawSignedTransaction,
    ) -> Result<String, InvokeError> {
        self.respond().await;
        let account = self.account(&account_id)?;
        Ok(digest_hex(&[
            account.id.as_bytes(),
            signed_transaction.signature.as_bytes(),
        ]))
    }

    async fn start_exchange(&self, exchange_type: ExchangeType) -> Result<String, InvokeError> {
        self.respond().await;
        Ok(format!("{}-{}", exchange_type.as_str().to_lowercase(), Utc::now().timestamp_millis()))
    }

    async fn complete_exchange(
        &self,
        params: CompleteExchangeParams,
    ) -> Result<String, InvokeError> {
        self.respond().await;
        self.account(&params.from_account_id)?;
        if let Some(to_account_id) = params.to_account_id.as_deref() {
            self.account(to_account_id)?;
        }
        Ok(digest_hex(&[
            params.provider.as_bytes(),
            params.binary_payload.as_bytes(),
            params.signature.as_bytes(),
        ]))
    }

    async fn sign_message(
        &self,
        account_id: String,
        message: Vec<u8>,
    ) -> Result<String, InvokeError> {
        self.respond().await;
        let account = self.account(&account_id)?;
        Ok(digest_hex(&[account.address.as_bytes(), message.as_slice()]))
    }
}
