//! Catalog of wallet API operations the console can invoke.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use wallet_api_client::{
    CompleteExchangeParams, ExchangeType, InvokeError, ListAccountsParams, ListCurrenciesParams,
    RawSignedTransaction, RequestAccountParams, SignTransactionParams, WalletApi,
};

use crate::defaults;
use crate::inputs::{
    ComposeError, InputList, InputSpec, RawValue, SelectOption, account_input, choice_input,
    json_input, text_input, transaction_input,
};

/// A composed call, ready to be driven. Resolves to the JSON form of the result.
pub type InvokeFuture = BoxFuture<'static, Result<Value, InvokeError>>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("duplicate operation id `{0}`")]
    DuplicateId(&'static str),
}

trait BoundOperation: Send + Sync {
    fn prepare(&self, raw: &[RawValue]) -> Result<InvokeFuture, ComposeError>;
}

type InvokeFn<A> = Box<dyn Fn(A) -> InvokeFuture + Send + Sync>;

struct TypedOperation<I: InputList> {
    inputs: I,
    invoke: InvokeFn<I::Args>,
}

impl<I: InputList> BoundOperation for TypedOperation<I> {
    fn prepare(&self, raw: &[RawValue]) -> Result<InvokeFuture, ComposeError> {
        let args = self.inputs.compose(raw)?;
        Ok((self.invoke)(args))
    }
}

pub struct OperationDescriptor {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    inputs: Vec<InputSpec>,
    bound: Box<dyn BoundOperation>,
}

impl fmt::Debug for OperationDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationDescriptor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("inputs", &self.inputs)
            .finish_non_exhaustive()
    }
}

impl OperationDescriptor {
    /// Binds `invoke` to a typed input list. `invoke` receives exactly the
    /// tuple the inputs compose to, so slots and arguments cannot drift apart.
    pub fn new<I, F, Fut, R>(
        id: &'static str,
        name: &'static str,
        description: &'static str,
        inputs: I,
        invoke: F,
    ) -> Self
    where
        I: InputList,
        F: Fn(I::Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, InvokeError>> + Send + 'static,
        R: Serialize + Send + 'static,
    {
        let specs = inputs.specs();
        let invoke: InvokeFn<I::Args> = Box::new(move |args| {
            let call = invoke(args);
            async move {
                let value = call.await?;
                serde_json::to_value(value).map_err(InvokeError::decode)
            }
            .boxed()
        });
        Self {
            id,
            name,
            description,
            inputs: specs,
            bound: Box::new(TypedOperation { inputs, invoke }),
        }
    }

    pub fn inputs(&self) -> &[InputSpec] {
        &self.inputs
    }

    pub fn arity(&self) -> usize {
        self.inputs.len()
    }

    pub fn default_values(&self) -> Vec<RawValue> {
        self.inputs
            .iter()
            .map(|input| input.default_value.clone())
            .collect()
    }

    /// Runs every modifier and returns the call without starting it.
    pub fn prepare(&self, raw: &[RawValue]) -> Result<InvokeFuture, ComposeError> {
        self.bound.prepare(raw)
    }
}

/// Builds the nine wallet operations bound to `api`. Nothing is sent.
pub fn catalog(api: Arc<dyn WalletApi>) -> Vec<OperationDescriptor> {
    let exchange_options = ExchangeType::ALL
        .iter()
        .map(|kind| SelectOption::new(kind.as_str(), kind.label()))
        .collect::<Vec<_>>();

    vec![
        OperationDescriptor::new(
            "listCurrencies",
            "List currencies",
            "List the currencies supported by the wallet",
            (json_input::<ListCurrenciesParams>("parameters")
                .with_default(defaults::LIST_CURRENCIES_PARAMETERS),),
            {
                let api = Arc::clone(&api);
                move |(params,)| {
                    let api = Arc::clone(&api);
                    async move { api.list_currencies(params).await }
                }
            },
        ),
        OperationDescriptor::new(
            "listAccounts",
            "List accounts",
            "List the accounts added by the user on the wallet",
            (),
            {
                let api = Arc::clone(&api);
                move |()| {
                    let api = Arc::clone(&api);
                    async move { api.list_accounts(ListAccountsParams::default()).await }
                }
            },
        ),
        OperationDescriptor::new(
            "requestAccount",
            "Request account",
            "Let the user choose an account in the wallet",
            (json_input::<RequestAccountParams>("parameters")
                .with_default(defaults::REQUEST_ACCOUNT_PARAMETERS),),
            {
                let api = Arc::clone(&api);
                move |(params,)| {
                    let api = Arc::clone(&api);
                    async move { api.request_account(params).await }
                }
            },
        ),
        OperationDescriptor::new(
            "verifyAddress",
            "Verify address",
            "Let the user verify an account address on their device",
            (account_input("account"),),
            {
                let api = Arc::clone(&api);
                move |(account_id,)| {
                    let api = Arc::clone(&api);
                    async move { api.receive(account_id).await }
                }
            },
        ),
        OperationDescriptor::new(
            "signTransaction",
            "Sign transaction",
            "Let the user sign a transaction through the wallet",
            (
                account_input("account"),
                transaction_input("transaction")
                    .with_default(defaults::SIGN_TRANSACTION_TRANSACTION),
                json_input::<SignTransactionParams>("parameters")
                    .with_default(defaults::SIGN_TRANSACTION_PARAMETERS),
            ),
            {
                let api = Arc::clone(&api);
                move |(account_id, transaction, params)| {
                    let api = Arc::clone(&api);
                    async move { api.sign_transaction(account_id, transaction, params).await }
                }
            },
        ),
        OperationDescriptor::new(
            "broadcastSignedTransaction",
            "Broadcast signed transaction",
            "Broadcast a transaction previously signed by the wallet",
            (
                account_input("account"),
                json_input::<RawSignedTransaction>("signed transaction")
                    .with_default(defaults::BROADCAST_SIGNED_TRANSACTION),
            ),
            {
                let api = Arc::clone(&api);
                move |(account_id, signed_transaction)| {
                    let api = Arc::clone(&api);
                    async move {
                        api.broadcast_signed_transaction(account_id, signed_transaction)
                            .await
                    }
                }
            },
        ),
        OperationDescriptor::new(
            "startExchange",
            "Start exchange",
            "Start an exchange flow and obtain its nonce",
            (choice_input::<ExchangeType>("Exchange Type", exchange_options),),
            {
                let api = Arc::clone(&api);
                move |(exchange_type,)| {
                    let api = Arc::clone(&api);
                    async move { api.start_exchange(exchange_type).await }
                }
            },
        ),
        OperationDescriptor::new(
            "completeExchange",
            "Complete exchange",
            "Complete a started exchange with a signed provider payload",
            (json_input::<CompleteExchangeParams>("parameters")
                .with_default(defaults::COMPLETE_EXCHANGE_PARAMETERS),),
            {
                let api = Arc::clone(&api);
                move |(params,)| {
                    let api = Arc::clone(&api);
                    async move { api.complete_exchange(params).await }
                }
            },
        ),
        OperationDescriptor::new(
            "signMessage",
            "Sign message",
            "Let the user sign a message with an account",
            (
                account_input("account"),
                text_input("message").with_default(defaults::SIGN_MESSAGE_MESSAGE),
            ),
            move |(account_id, message)| {
                let api = Arc::clone(&api);
                async move { api.sign_message(account_id, message).await }
            },
        ),
    ]
}

/// Ordered operations with O(1) lookup by id.
#[derive(Debug)]
pub struct OperationRegistry {
    operations: Vec<OperationDescriptor>,
    index: HashMap<&'static str, usize>,
}

impl OperationRegistry {
    pub fn new(api: Arc<dyn WalletApi>) -> Self {
        let operations = catalog(api);
        let index = operations
            .iter()
            .enumerate()
            .map(|(position, operation)| (operation.id, position))
            .collect::<HashMap<_, _>>();
        debug_assert_eq!(index.len(), operations.len(), "operation ids are unique");
        Self { operations, index }
    }

    pub fn from_operations(operations: Vec<OperationDescriptor>) -> Result<Self, RegistryError> {
        let mut index = HashMap::with_capacity(operations.len());
        for (position, operation) in operations.iter().enumerate() {
            if index.insert(operation.id, position).is_some() {
                return Err(RegistryError::DuplicateId(operation.id));
            }
        }
        Ok(Self { operations, index })
    }

    pub fn get(&self, id: &str) -> Option<&OperationDescriptor> {
        self.index
            .get(id)
            .and_then(|position| self.operations.get(*position))
    }

    pub fn iter(&self) -> impl Iterator<Item = &OperationDescriptor> {
        self.operations.iter()
    }

    pub fn first(&self) -> Option<&OperationDescriptor> {
        self.operations.first()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;
    use wallet_api_client::{SimulatedWallet, WalletApi};

    use super::{OperationDescriptor, OperationRegistry, RegistryError, catalog};
    use crate::inputs::{InputWidget, account_input};

    fn api() -> Arc<dyn WalletApi> {
        Arc::new(SimulatedWallet::standard().with_latency(Duration::ZERO))
    }

    #[test]
    fn catalog_ids_are_unique_and_ordered() {
        let registry = OperationRegistry::new(api());
        let ids = registry.iter().map(|op| op.id).collect::<Vec<_>>();
        assert_eq!(
            ids,
            vec![
                "listCurrencies",
                "listAccounts",
                "requestAccount",
                "verifyAddress",
                "signTransaction",
                "broadcastSignedTransaction",
                "startExchange",
                "completeExchange",
                "signMessage",
            ]
        );
        assert_eq!(ids.iter().collect::<HashSet<_>>().len(), ids.len());
    }

    #[test]
    fn lookup_by_id() {
        let registry = OperationRegistry::new(api());
        let Some(op) = registry.get("signTransaction") else {
            panic!("signTransaction is registered");
        };
        assert_eq!(op.arity(), 3);
        assert_eq!(op.inputs()[0].widget, InputWidget::AccountSelector);
        assert!(registry.get("unknown").is_none());
    }

    #[test]
    fn start_exchange_offers_fixed_options() {
        let registry = OperationRegistry::new(api());
        let Some(op) = registry.get("startExchange") else {
            panic!("startExchange is registered");
        };
        let InputWidget::ValueSelector { options } = &op.inputs()[0].widget else {
            panic!("exchange type is a value selector");
        };
        let values = options.iter().map(|o| o.value.as_str()).collect::<Vec<_>>();
        assert_eq!(values, vec!["SWAP", "FUND", "SELL"]);
        assert_eq!(op.default_values(), vec![None]);
        assert!(op.prepare(&op.default_values()).is_err());
    }

    #[test]
    fn default_json_values_compose() {
        let registry = OperationRegistry::new(api());
        for id in ["listCurrencies", "requestAccount", "completeExchange"] {
            let Some(op) = registry.get(id) else {
                panic!("{id} is registered");
            };
            assert!(op.prepare(&op.default_values()).is_ok(), "{id} defaults compose");
        }
    }

    #[tokio::test]
    async fn prepared_call_resolves_to_json() -> anyhow::Result<()> {
        let registry = OperationRegistry::new(api());
        let Some(op) = registry.get("listCurrencies") else {
            anyhow::bail!("listCurrencies is registered");
        };
        let value = op.prepare(&op.default_values())?.await?;
        assert_eq!(value.as_array().map(Vec::len), Some(2));
        assert_eq!(value[0]["ticker"], json!("ETH"));
        Ok(())
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let first = OperationDescriptor::new("same", "A", "", (), |()| async {
            Ok::<_, wallet_api_client::InvokeError>(1)
        });
        let second = OperationDescriptor::new("same", "B", "", (account_input("a"),), |(_,)| async {
            Ok::<_, wallet_api_client::InvokeError>(2)
        });
        assert_eq!(
            OperationRegistry::from_operations(vec![first, second]).err(),
            Some(RegistryError::DuplicateId("same"))
        );
        assert_eq!(catalog(api()).len(), 9);
    }
}
