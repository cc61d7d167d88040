//! Reference data used to populate selector widgets.

use serde::Serialize;
use thiserror::Error;
use wallet_api_client::{
    Account, Currency, InvokeError, ListAccountsParams, ListCurrenciesParams, WalletApi,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DebuggerContext {
    pub accounts: Vec<Account>,
    pub currencies: Vec<Currency>,
}

impl DebuggerContext {
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty() && self.currencies.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContextError {
    #[error("failed to load accounts: {0}")]
    Accounts(InvokeError),
    #[error("failed to load currencies: {0}")]
    Currencies(InvokeError),
}

/// Fetches accounts and currencies concurrently. Either failure fails the load.
pub async fn load_context(
    api: &dyn WalletApi,
    currency_ids: Option<&[String]>,
) -> Result<DebuggerContext, ContextError> {
    let currency_ids = currency_ids.map(<[String]>::to_vec);
    let (accounts, currencies) = tokio::try_join!(
        async {
            api.list_accounts(ListAccountsParams {
                currency_ids: currency_ids.clone(),
            })
            .await
            .map_err(ContextError::Accounts)
        },
        async {
            api.list_currencies(ListCurrenciesParams {
                currency_ids: currency_ids.clone(),
            })
            .await
            .map_err(ContextError::Currencies)
        },
    )?;

    Ok(DebuggerContext {
        accounts,
        currencies,
    })
}

/// Owns the current context. Readers only ever see a fully loaded snapshot or
/// the empty default.
#[derive(Debug, Default)]
pub struct ContextProvider {
    context: DebuggerContext,
    currency_ids: Option<Vec<String>>,
    last_error: Option<ContextError>,
}

impl ContextProvider {
    /// `currency_ids` scopes both sub-fetches; `None` loads everything.
    pub fn new(currency_ids: Option<Vec<String>>) -> Self {
        Self {
            context: DebuggerContext::default(),
            currency_ids,
            last_error: None,
        }
    }

    pub fn context(&self) -> &DebuggerContext {
        &self.context
    }

    pub fn last_error(&self) -> Option<&ContextError> {
        self.last_error.as_ref()
    }

    /// On failure the previously loaded context (empty before the first
    /// success) stays in place.
    pub async fn refresh(&mut self, api: &dyn WalletApi) -> Result<(), ContextError> {
        match load_context(api, self.currency_ids.as_deref()).await {
            Ok(context) => {
                tracing::info!(
                    accounts = context.accounts.len(),
                    currencies = context.currencies.len(),
                    "Debugger context loaded"
                );
                self.context = context;
                self.last_error = None;
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "Debugger context load failed");
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }
}
