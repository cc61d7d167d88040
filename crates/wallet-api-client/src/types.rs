//! Wire types shared by the wallet host API, the JSON-RPC client and the simulator.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::TransactionError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub name: String,
    pub address: String,
    pub currency: String,
    pub balance: String,
    pub spendable_balance: String,
    #[serde(default)]
    pub block_height: Option<u64>,
    pub last_sync_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurrencyKind {
    CryptoCurrency,
    TokenCurrency,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Currency {
    #[serde(rename = "type")]
    pub kind: CurrencyKind,
    pub id: String,
    pub ticker: String,
    pub name: String,
    pub family: String,
    pub color: String,
    pub decimals: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAccountsParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCurrenciesParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestAccountParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currencies: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_add_account: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignTransactionParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_app: Option<String>,
}

/// Transaction as it travels on the wire: amounts are decimal strings in the
/// currency's smallest unit and `data` is hex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransaction {
    pub family: String,
    pub amount: String,
    pub recipient: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    /// Family specific fields (`gasPrice`, `fees`, `memo`, ...) passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub family: String,
    pub amount: u128,
    pub recipient: String,
    pub data: Option<Vec<u8>>,
    pub extra: Map<String, Value>,
}

pub fn deserialize_transaction(raw: RawTransaction) -> Result<Transaction, TransactionError> {
    let amount = raw
        .amount
        .trim()
        .parse::<u128>()
        .map_err(|_| TransactionError::InvalidAmount(raw.amount.clone()))?;

    let data = match raw.data.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(encoded) => {
            let digits = encoded.strip_prefix("0x").unwrap_or(encoded);
            let bytes = hex::decode(digits)
                .map_err(|err| TransactionError::InvalidData(err.to_string()))?;
            Some(bytes)
        }
    };

    if raw.recipient.trim().is_empty() {
        return Err(TransactionError::MissingRecipient);
    }

    Ok(Transaction {
        family: raw.family,
        amount,
        recipient: raw.recipient,
        data,
        extra: raw.extra,
    })
}

pub fn serialize_transaction(transaction: &Transaction) -> RawTransaction {
    RawTransaction {
        family: transaction.family.clone(),
        amount: transaction.amount.to_string(),
        recipient: transaction.recipient.clone(),
        data: transaction
            .data
            .as_ref()
            .map(|bytes| format!("0x{}", hex::encode(bytes))),
        extra: transaction.extra.clone(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSignedTransaction {
    pub operation: Value,
    pub signature: String,
    #[serde(default)]
    pub expiration_date: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExchangeType {
    Swap,
    Sell,
    Fund,
}

impl ExchangeType {
    pub const ALL: [ExchangeType; 3] = [Self::Swap, Self::Fund, Self::Sell];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Swap => "SWAP",
            Self::Sell => "SELL",
            Self::Fund => "FUND",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Swap => "Swap",
            Self::Sell => "Sell",
            Self::Fund => "Fund",
        }
    }
}

impl fmt::Display for ExchangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExchangeType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "SWAP" => Ok(Self::Swap),
            "SELL" => Ok(Self::Sell),
            "FUND" => Ok(Self::Fund),
            other => Err(format!("unknown exchange type `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeeStrategy {
    Slow,
    Medium,
    Fast,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteExchangeParams {
    pub provider: String,
    pub from_account_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_account_id: Option<String>,
    pub transaction: RawTransaction,
    pub binary_payload: String,
    pub signature: String,
    pub fee_strategy: FeeStrategy,
    pub exchange_type: ExchangeType,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{
        ExchangeType, RawTransaction, deserialize_transaction, serialize_transaction,
    };
    use crate::error::TransactionError;

    fn raw(amount: &str, data: Option<&str>) -> anyhow::Result<RawTransaction> {
        let mut value = json!({
            "family": "ethereum",
            "amount": amount,
            "recipient": "0x0000000000000000000000000000000000000000",
            "gasPrice": "1000000000"
        });
        if let Some(data) = data {
            value["data"] = json!(data);
        }
        Ok(serde_json::from_value(value)?)
    }

    #[test]
    fn transaction_amount_and_data_are_decoded() -> anyhow::Result<()> {
        let transaction = deserialize_transaction(raw("1000000000000000", Some("0xdeadbeef"))?)?;
        assert_eq!(transaction.amount, 1_000_000_000_000_000);
        assert_eq!(transaction.data, Some(vec![0xde, 0xad, 0xbe, 0xef]));
        assert_eq!(transaction.extra["gasPrice"], json!("1000000000"));

        let back = serialize_transaction(&transaction);
        assert_eq!(back.amount, "1000000000000000");
        assert_eq!(back.data.as_deref(), Some("0xdeadbeef"));
        Ok(())
    }

    #[test]
    fn transaction_rejects_bad_amount_and_hex() -> anyhow::Result<()> {
        assert_eq!(
            deserialize_transaction(raw("1.5", None)?),
            Err(TransactionError::InvalidAmount("1.5".to_string()))
        );
        assert!(matches!(
            deserialize_transaction(raw("1", Some("0xzz"))?),
            Err(TransactionError::InvalidData(_))
        ));
        Ok(())
    }

    #[test]
    fn exchange_type_parses_case_insensitively() {
        assert_eq!("swap".parse::<ExchangeType>(), Ok(ExchangeType::Swap));
        assert_eq!(" FUND ".parse::<ExchangeType>(), Ok(ExchangeType::Fund));
        assert!("trade".parse::<ExchangeType>().is_err());
    }
}
