//! Debugger settings read from `WALLET_API_DEBUGGER_*` environment variables.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use wallet_api_client::HostCommand;

use crate::history::DEFAULT_HISTORY_CAPACITY;

const DEFAULT_MODE: TransportMode = TransportMode::Simulator;
const DEFAULT_LOG_FILTER: &str = "info";
const DEFAULT_SIMULATOR_LATENCY_MS: u64 = 120;
const DEFAULT_CONTEXT_CURRENCIES: &str = "ethereum";
const ALL_CURRENCIES: &str = "*";

const ENV_MODE: &str = "WALLET_API_DEBUGGER_MODE";
const ENV_HOST_CMD: &str = "WALLET_API_DEBUGGER_HOST_CMD";
const ENV_HISTORY_CAPACITY: &str = "WALLET_API_DEBUGGER_HISTORY_CAPACITY";
const ENV_LOG_FILTER: &str = "WALLET_API_DEBUGGER_LOG_FILTER";
const ENV_SIMULATOR_LATENCY_MS: &str = "WALLET_API_DEBUGGER_SIMULATOR_LATENCY_MS";
const ENV_WIRE_LOG: &str = "WALLET_API_DEBUGGER_WIRE_LOG";
const ENV_CONTEXT_CURRENCIES: &str = "WALLET_API_DEBUGGER_CONTEXT_CURRENCIES";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportMode {
    #[default]
    Simulator,
    Live,
}

impl TransportMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Simulator => "simulator",
            Self::Live => "live",
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportMode {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "simulator" | "sim" => Ok(Self::Simulator),
            "live" => Ok(Self::Live),
            _ => Err(ConfigError::InvalidMode(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid WALLET_API_DEBUGGER_MODE value '{0}': expected `simulator` or `live`")]
    InvalidMode(String),
    #[error("invalid {key} value '{value}': expected a positive integer")]
    InvalidNumber { key: &'static str, value: String },
    #[error("live mode needs a wallet host command (WALLET_API_DEBUGGER_HOST_CMD or --host-cmd)")]
    MissingHostCommand,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebuggerConfig {
    pub mode: TransportMode,
    pub host_cmd: Option<String>,
    pub history_capacity: usize,
    pub log_filter: String,
    pub simulator_latency: Duration,
    pub wire_log: Option<PathBuf>,
    /// Currencies the context load is scoped to; `None` loads every currency.
    pub context_currency_ids: Option<Vec<String>>,
}

impl Default for DebuggerConfig {
    fn default() -> Self {
        Self {
            mode: DEFAULT_MODE,
            host_cmd: None,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            simulator_latency: Duration::from_millis(DEFAULT_SIMULATOR_LATENCY_MS),
            wire_log: None,
            context_currency_ids: parse_currency_scope(DEFAULT_CONTEXT_CURRENCIES.to_string()),
        }
    }
}

impl DebuggerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source. Empty values count
    /// as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let mode = read(ENV_MODE)
            .map(|value| value.parse())
            .transpose()?
            .unwrap_or(defaults.mode);

        let history_capacity = read(ENV_HISTORY_CAPACITY)
            .map(|value| parse_positive(ENV_HISTORY_CAPACITY, &value))
            .transpose()?
            .map_or(defaults.history_capacity, |value| value as usize);

        let simulator_latency = read(ENV_SIMULATOR_LATENCY_MS)
            .map(|value| {
                value
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidNumber {
                        key: ENV_SIMULATOR_LATENCY_MS,
                        value,
                    })
            })
            .transpose()?
            .map_or(defaults.simulator_latency, Duration::from_millis);

        Ok(Self {
            mode,
            host_cmd: read(ENV_HOST_CMD),
            history_capacity,
            log_filter: read(ENV_LOG_FILTER).unwrap_or(defaults.log_filter),
            simulator_latency,
            wire_log: read(ENV_WIRE_LOG).map(PathBuf::from),
            context_currency_ids: read(ENV_CONTEXT_CURRENCIES)
                .map_or(defaults.context_currency_ids, parse_currency_scope),
        })
    }

    /// Simulator with no latency and an unscoped context.
    pub fn for_tests() -> Self {
        Self {
            mode: TransportMode::Simulator,
            host_cmd: None,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            log_filter: "debug".to_string(),
            simulator_latency: Duration::ZERO,
            wire_log: None,
            context_currency_ids: None,
        }
    }

    pub fn host_command(&self) -> Result<HostCommand, ConfigError> {
        self.host_cmd
            .as_deref()
            .and_then(HostCommand::parse)
            .ok_or(ConfigError::MissingHostCommand)
    }
}

fn parse_positive(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(parsed) if parsed > 0 => Ok(parsed),
        _ => Err(ConfigError::InvalidNumber {
            key,
            value: value.to_string(),
        }),
    }
}

/// Comma separated currency ids; `*` means every currency.
pub fn parse_currency_scope(value: String) -> Option<Vec<String>> {
    if value.trim() == ALL_CURRENCIES {
        return None;
    }
    Some(parse_csv(value))
}

fn parse_csv(value: String) -> Vec<String> {
    value
        .split(',')
        .map(|segment| segment.trim().to_string())
        .filter(|segment| !segment.is_empty())
        .collect()
}
