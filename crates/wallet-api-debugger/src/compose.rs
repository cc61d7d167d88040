//! Editable raw values for the selected operation's slots.

use serde::Serialize;
use serde_json::Value;
use serde_json::ser::PrettyFormatter;
use thiserror::Error;

use crate::inputs::RawValue;
use crate::registry::OperationDescriptor;

const JSON_INDENT: &[u8] = b"   ";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("unknown operation `{0}`")]
    UnknownOperation(String),
    #[error("no operation selected")]
    NoOperationSelected,
    #[error("slot {index} is out of range, the operation has {arity} inputs")]
    SlotOutOfRange { index: usize, arity: usize },
    #[error("slot {index} has {available} options, option {option} does not exist")]
    OptionOutOfRange {
        index: usize,
        option: usize,
        available: usize,
    },
}

#[derive(Debug, Clone, Default)]
pub struct InputComposer {
    operation_id: Option<&'static str>,
    values: Vec<RawValue>,
}

impl InputComposer {
    /// Switches to `operation` and resets every slot to its default.
    pub fn select(&mut self, operation: &OperationDescriptor) {
        self.operation_id = Some(operation.id);
        self.values = operation.default_values();
    }

    pub fn selected(&self) -> Option<&'static str> {
        self.operation_id
    }

    pub fn values(&self) -> &[RawValue] {
        &self.values
    }

    /// Replaces slot `index` only.
    pub fn edit(&mut self, index: usize, value: RawValue) -> Result<(), InputError> {
        let slot = self.slot_mut(index)?;
        *slot = value;
        Ok(())
    }

    /// Re-indents slot `index` if it holds valid JSON. Returns whether the
    /// text changed; invalid JSON is left as typed.
    pub fn format_slot(&mut self, index: usize) -> Result<bool, InputError> {
        let slot = self.slot_mut(index)?;
        let Some(formatted) = slot.as_deref().and_then(pretty_json) else {
            return Ok(false);
        };
        let changed = slot.as_deref() != Some(formatted.as_str());
        *slot = Some(formatted);
        Ok(changed)
    }

    fn slot_mut(&mut self, index: usize) -> Result<&mut RawValue, InputError> {
        if self.operation_id.is_none() {
            return Err(InputError::NoOperationSelected);
        }
        let arity = self.values.len();
        self.values
            .get_mut(index)
            .ok_or(InputError::SlotOutOfRange { index, arity })
    }
}

/// Pretty prints JSON text with the indentation used by the slot defaults.
pub fn pretty_json(text: &str) -> Option<String> {
    let value = serde_json::from_str::<Value>(text).ok()?;
    pretty_value(&value)
}

pub fn pretty_value(value: &Value) -> Option<String> {
    pretty_value_with_indent(value, JSON_INDENT)
}

pub(crate) fn pretty_value_with_indent(value: &Value, indent: &[u8]) -> Option<String> {
    let mut out = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(indent));
    value.serialize(&mut serializer).ok()?;
    String::from_utf8(out).ok()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use wallet_api_client::{SimulatedWallet, WalletApi};

    use super::{InputComposer, InputError, pretty_json};
    use crate::defaults;
    use crate::registry::OperationRegistry;

    fn registry() -> OperationRegistry {
        let api: Arc<dyn WalletApi> = Arc::new(SimulatedWallet::standard());
        OperationRegistry::new(api)
    }

    #[test]
    fn select_resets_to_defaults() -> anyhow::Result<()> {
        let registry = registry();
        let Some(sign) = registry.get("signTransaction") else {
            anyhow::bail!("signTransaction is registered");
        };
        let mut composer = InputComposer::default();
        composer.select(sign);
        composer.edit(0, Some("acc-1".to_string()))?;
        composer.select(sign);
        assert_eq!(composer.values(), sign.default_values().as_slice());
        assert_eq!(composer.values()[0], None);
        Ok(())
    }

    #[test]
    fn edits_touch_one_slot() -> anyhow::Result<()> {
        let registry = registry();
        let Some(sign) = registry.get("signTransaction") else {
            anyhow::bail!("signTransaction is registered");
        };
        let mut composer = InputComposer::default();
        composer.select(sign);
        let before = composer.values().to_vec();
        composer.edit(2, Some("{}".to_string()))?;
        assert_eq!(composer.values()[0], before[0]);
        assert_eq!(composer.values()[1], before[1]);
        assert_eq!(composer.values()[2].as_deref(), Some("{}"));
        assert_eq!(
            composer.edit(3, None),
            Err(InputError::SlotOutOfRange { index: 3, arity: 3 })
        );
        Ok(())
    }

    #[test]
    fn edit_without_selection_fails() {
        let mut composer = InputComposer::default();
        assert_eq!(composer.edit(0, None), Err(InputError::NoOperationSelected));
    }

    #[test]
    fn format_reindents_valid_json_only() -> anyhow::Result<()> {
        let registry = registry();
        let Some(op) = registry.get("listCurrencies") else {
            anyhow::bail!("listCurrencies is registered");
        };
        let mut composer = InputComposer::default();
        composer.select(op);

        composer.edit(0, Some(r#"{"currencyIds":["ethereum","bitcoin"]}"#.to_string()))?;
        assert!(composer.format_slot(0)?);
        assert_eq!(
            composer.values()[0].as_deref(),
            Some(defaults::LIST_CURRENCIES_PARAMETERS)
        );

        composer.edit(0, Some("{\"a\":1".to_string()))?;
        assert!(!composer.format_slot(0)?);
        assert_eq!(composer.values()[0].as_deref(), Some("{\"a\":1"));
        Ok(())
    }

    #[test]
    fn pretty_json_keeps_key_order() {
        assert_eq!(
            pretty_json(r#"{"b":1,"a":2}"#).as_deref(),
            Some("{\n   \"b\": 1,\n   \"a\": 2\n}")
        );
    }
}
