//! Seed values shown in JSON editor slots before the user edits them.

pub const LIST_CURRENCIES_PARAMETERS: &str = r#"{
   "currencyIds": [
      "ethereum",
      "bitcoin"
   ]
}"#;

pub const REQUEST_ACCOUNT_PARAMETERS: &str = r#"{
   "currencies": [
      "ethereum"
   ],
   "allowAddAccount": true
}"#;

pub const SIGN_TRANSACTION_TRANSACTION: &str = r#"{
   "family": "ethereum",
   "amount": "1000000000000000",
   "recipient": "0x0000000000000000000000000000000000000000",
   "gasPrice": "25000000000",
   "gasLimit": "21000",
   "data": "0x"
}"#;

pub const SIGN_TRANSACTION_PARAMETERS: &str = r#"{
   "useApp": "Ethereum"
}"#;

pub const BROADCAST_SIGNED_TRANSACTION: &str = r#"{
   "operation": {},
   "signature": "SIGNATURE",
   "expirationDate": null
}"#;

pub const COMPLETE_EXCHANGE_PARAMETERS: &str = r#"{
   "provider": "changelly",
   "fromAccountId": "js:2:ethereum:0x6EB963EFD0FEF7A4CFAB6CE6F1421C3279D11707:",
   "toAccountId": "js:2:ethereum:0x90F1A6B1C1A4A2A5E4E6A7D8E9C0B1A2F3D4E5F6:",
   "transaction": {
      "family": "ethereum",
      "amount": "1000000000000000",
      "recipient": "0x0000000000000000000000000000000000000000"
   },
   "binaryPayload": "BINARY_PAYLOAD",
   "signature": "SIGNATURE",
   "feeStrategy": "MEDIUM",
   "exchangeType": "SWAP"
}"#;

pub const SIGN_MESSAGE_MESSAGE: &str = "Message de test";
