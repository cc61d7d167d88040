//! Input slots: widgets, typed modifiers and fixed-arity input lists.
//!
//! An operation's inputs are a tuple of [`InputDescriptor`]s. The tuple's
//! [`InputList::Args`] is the argument tuple handed to the operation, so the
//! number and order of slots always match the invoke function's parameters.

use std::fmt::Display;
use std::marker::PhantomData;
use std::str::FromStr;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use wallet_api_client::{RawTransaction, Transaction, TransactionError, deserialize_transaction};

use crate::context::DebuggerContext;

/// Raw widget value. `None` is a slot the user never filled and that has no default.
pub type RawValue = Option<String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputWidget {
    /// Free text, usually JSON.
    JsonEditor,
    /// Single choice from a fixed option set.
    ValueSelector { options: Vec<SelectOption> },
    /// Single choice from the accounts held in the debugger context.
    AccountSelector,
}

impl InputWidget {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::JsonEditor => "json",
            Self::ValueSelector { .. } => "select",
            Self::AccountSelector => "account",
        }
    }

    pub const fn is_selector(&self) -> bool {
        !matches!(self, Self::JsonEditor)
    }

    /// Options the widget offers. Account selectors have none until the context loads.
    pub fn options(&self, context: &DebuggerContext) -> Vec<SelectOption> {
        match self {
            Self::JsonEditor => Vec::new(),
            Self::ValueSelector { options } => options.clone(),
            Self::AccountSelector => context
                .accounts
                .iter()
                .map(|account| SelectOption::new(account.id.clone(), account.name.clone()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModifierError {
    #[error("a value is required")]
    Missing,
    #[error("invalid JSON: {0}")]
    Json(String),
    #[error("JSON does not have the expected shape: {0}")]
    Shape(String),
    #[error(transparent)]
    Transaction(#[from] TransactionError),
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComposeError {
    #[error("input `{name}` (slot {index}): {source}")]
    Slot {
        index: usize,
        name: String,
        source: ModifierError,
    },
    #[error("expected {expected} input values, got {actual}")]
    Arity { expected: usize, actual: usize },
}

/// Pure transform from a raw widget value to a call argument.
pub trait Modifier: Send + Sync + 'static {
    type Output: Send + 'static;

    fn apply(&self, raw: Option<&str>) -> Result<Self::Output, ModifierError>;
}

/// Parses JSON text into `T`.
pub struct Json<T>(PhantomData<fn() -> T>);

impl<T> Json<T> {
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for Json<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Modifier for Json<T>
where
    T: DeserializeOwned + Send + 'static,
{
    type Output = T;

    fn apply(&self, raw: Option<&str>) -> Result<T, ModifierError> {
        let text = raw.ok_or(ModifierError::Missing)?;
        serde_json::from_str(text).map_err(|err| match err.classify() {
            serde_json::error::Category::Data => ModifierError::Shape(err.to_string()),
            _ => ModifierError::Json(err.to_string()),
        })
    }
}

/// Passes the text through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Verbatim;

impl Modifier for Verbatim {
    type Output = String;

    fn apply(&self, raw: Option<&str>) -> Result<String, ModifierError> {
        raw.map(str::to_string).ok_or(ModifierError::Missing)
    }
}

/// Encodes the text as UTF-8 bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8Bytes;

impl Modifier for Utf8Bytes {
    type Output = Vec<u8>;

    fn apply(&self, raw: Option<&str>) -> Result<Vec<u8>, ModifierError> {
        raw.map(|text| text.as_bytes().to_vec())
            .ok_or(ModifierError::Missing)
    }
}

/// Parses a selected option value with `FromStr`.
pub struct Choice<T>(PhantomData<fn() -> T>);

impl<T> Choice<T> {
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for Choice<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Modifier for Choice<T>
where
    T: FromStr + Send + 'static,
    T::Err: Display,
{
    type Output = T;

    fn apply(&self, raw: Option<&str>) -> Result<T, ModifierError> {
        let value = raw.ok_or(ModifierError::Missing)?;
        value
            .parse()
            .map_err(|err: T::Err| ModifierError::Invalid(err.to_string()))
    }
}

/// Parses a wire transaction from JSON, then decodes amounts and hex data.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionJson;

impl Modifier for TransactionJson {
    type Output = Transaction;

    fn apply(&self, raw: Option<&str>) -> Result<Transaction, ModifierError> {
        let raw = Json::<RawTransaction>::new().apply(raw)?;
        Ok(deserialize_transaction(raw)?)
    }
}

/// Metadata of a slot, independent of its modifier's types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSpec {
    pub name: &'static str,
    pub widget: InputWidget,
    pub default_value: Option<String>,
}

pub struct InputDescriptor<M> {
    pub name: &'static str,
    pub widget: InputWidget,
    pub default_value: Option<String>,
    pub modifier: M,
}

impl<M: Modifier> InputDescriptor<M> {
    pub fn new(name: &'static str, widget: InputWidget, modifier: M) -> Self {
        Self {
            name,
            widget,
            default_value: None,
            modifier,
        }
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn spec(&self) -> InputSpec {
        InputSpec {
            name: self.name,
            widget: self.widget.clone(),
            default_value: self.default_value.clone(),
        }
    }

    fn compose_slot(&self, index: usize, raw: &RawValue) -> Result<M::Output, ComposeError> {
        self.modifier
            .apply(raw.as_deref())
            .map_err(|source| ComposeError::Slot {
                index,
                name: self.name.to_string(),
                source,
            })
    }
}

pub fn json_input<T>(name: &'static str) -> InputDescriptor<Json<T>>
where
    T: DeserializeOwned + Send + 'static,
{
    InputDescriptor::new(name, InputWidget::JsonEditor, Json::new())
}

pub fn text_input(name: &'static str) -> InputDescriptor<Utf8Bytes> {
    InputDescriptor::new(name, InputWidget::JsonEditor, Utf8Bytes)
}

pub fn transaction_input(name: &'static str) -> InputDescriptor<TransactionJson> {
    InputDescriptor::new(name, InputWidget::JsonEditor, TransactionJson)
}

pub fn account_input(name: &'static str) -> InputDescriptor<Verbatim> {
    InputDescriptor::new(name, InputWidget::AccountSelector, Verbatim)
}

pub fn choice_input<T>(name: &'static str, options: Vec<SelectOption>) -> InputDescriptor<Choice<T>>
where
    T: FromStr + Send + 'static,
    T::Err: Display,
{
    InputDescriptor::new(name, InputWidget::ValueSelector { options }, Choice::new())
}

/// Ordered, fixed-arity set of slots whose composed values form the argument tuple.
pub trait InputList: Send + Sync + 'static {
    type Args: Send + 'static;

    fn specs(&self) -> Vec<InputSpec>;

    /// Applies every modifier in slot order. The first failing slot fails the whole list.
    fn compose(&self, raw: &[RawValue]) -> Result<Self::Args, ComposeError>;
}

fn expect_arity(raw: &[RawValue], expected: usize) -> Result<(), ComposeError> {
    if raw.len() == expected {
        Ok(())
    } else {
        Err(ComposeError::Arity {
            expected,
            actual: raw.len(),
        })
    }
}

impl InputList for () {
    type Args = ();

    fn specs(&self) -> Vec<InputSpec> {
        Vec::new()
    }

    fn compose(&self, raw: &[RawValue]) -> Result<(), ComposeError> {
        expect_arity(raw, 0)
    }
}

macro_rules! impl_input_list {
    ($arity:literal => $(($modifier:ident, $index:tt)),+) => {
        impl<$($modifier: Modifier),+> InputList for ($(InputDescriptor<$modifier>,)+) {
            type Args = ($(<$modifier as Modifier>::Output,)+);

            fn specs(&self) -> Vec<InputSpec> {
                vec![$(self.$index.spec()),+]
            }

            fn compose(&self, raw: &[RawValue]) -> Result<Self::Args, ComposeError> {
                expect_arity(raw, $arity)?;
                Ok(($(self.$index.compose_slot($index, &raw[$index])?,)+))
            }
        }
    };
}

impl_input_list!(1 => (A, 0));
impl_input_list!(2 => (A, 0), (B, 1));
impl_input_list!(3 => (A, 0), (B, 1), (C, 2));
impl_input_list!(4 => (A, 0), (B, 1), (C, 2), (D, 3));
