#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use clap::{Parser, Subcommand};
use wallet_api_client::{SimulatedWallet, WalletApi, WalletApiClient, WireLog};
use wallet_api_debugger::{
    Console, ConsoleEntry, DebuggerConfig, InvocationStatus, OperationDescriptor, TransportMode,
    render_entry,
};

mod repl;

#[derive(Parser, Debug)]
#[command(name = "wallet-api-debugger")]
#[command(about = "Interactive console for a wallet host's remote API")]
pub struct Cli {
    /// `simulator` or `live` (overrides WALLET_API_DEBUGGER_MODE)
    #[arg(long, global = true)]
    pub mode: Option<TransportMode>,
    /// Wallet host command line for live mode
    #[arg(long, global = true, value_name = "COMMAND")]
    pub host_cmd: Option<String>,
    /// Number of settled results kept in the history
    #[arg(long, global = true)]
    pub history_capacity: Option<NonZeroUsize>,
    /// Simulated wallet response latency
    #[arg(long, global = true)]
    pub latency_ms: Option<u64>,
    /// Append every JSON-RPC frame to this JSONL file (live mode)
    #[arg(long, global = true, value_name = "PATH")]
    pub wire_log: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List the operations the console can invoke
    Ops,
    /// Invoke one operation, wait for it and print the result
    Call {
        /// Operation id, e.g. `listAccounts`
        operation: String,
        /// Slot value as index or name; `@path` reads the value from a file
        #[arg(long = "input", short = 'i', value_name = "SLOT=VALUE")]
        inputs: Vec<String>,
    },
}

impl Cli {
    /// Environment configuration with command line flags applied on top.
    pub fn resolve_config(&self) -> Result<DebuggerConfig> {
        let mut config = DebuggerConfig::from_env().context("read debugger configuration")?;
        self.apply_overrides(&mut config);
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut DebuggerConfig) {
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(host_cmd) = &self.host_cmd {
            config.host_cmd = Some(host_cmd.clone());
        }
        if let Some(capacity) = self.history_capacity {
            config.history_capacity = capacity.get();
        }
        if let Some(latency_ms) = self.latency_ms {
            config.simulator_latency = Duration::from_millis(latency_ms);
        }
        if let Some(wire_log) = &self.wire_log {
            config.wire_log = Some(wire_log.clone());
        }
    }
}

pub async fn run(cli: Cli, config: DebuggerConfig) -> Result<ExitCode> {
    let api = connect(&config)?;
    let mut console = Console::new(api, &config);

    match cli.command {
        Some(Command::Ops) => {
            print_operations(&console);
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Call { operation, inputs }) => call(&mut console, &operation, &inputs).await,
        None => {
            if let Err(err) = console.mount().await {
                println!("context unavailable: {err}");
            }
            repl::run(&mut console).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn connect(config: &DebuggerConfig) -> Result<Arc<dyn WalletApi>> {
    match config.mode {
        TransportMode::Simulator => {
            if config.wire_log.is_some() {
                tracing::warn!("Wire log ignored in simulator mode");
            }
            tracing::info!(
                latency_ms = config.simulator_latency.as_millis() as u64,
                "Using simulated wallet"
            );
            Ok(Arc::new(
                SimulatedWallet::standard().with_latency(config.simulator_latency),
            ))
        }
        TransportMode::Live => {
            let command = config.host_command()?;
            let wire_log = config.wire_log.clone().map(WireLog::open);
            let client = WalletApiClient::spawn(&command, wire_log)
                .with_context(|| format!("start wallet host `{}`", command.program))?;
            tracing::info!(program = %command.program, "Connected to wallet host");
            Ok(Arc::new(client))
        }
    }
}

async fn call(console: &mut Console, operation: &str, inputs: &[String]) -> Result<ExitCode> {
    let operation = console.select(operation)?;
    let edits = resolve_inputs(operation, inputs)?;
    for (slot, value) in edits {
        let value = read_value(&value).await?;
        console.edit(slot, Some(value))?;
    }

    console.submit()?;
    console.wait_idle().await;
    let Some(result) = console.history().last() else {
        return Err(anyhow!("invocation produced no result"));
    };
    println!("{}", render_entry(&ConsoleEntry::Settled(result), Utc::now()));

    Ok(if result.status() == InvocationStatus::Error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn print_operations(console: &Console) {
    for operation in console.registry().iter() {
        let inputs = operation
            .inputs()
            .iter()
            .map(|input| format!("{} ({})", input.name, input.widget.label()))
            .collect::<Vec<_>>();
        println!("{:<28} {}", operation.id, operation.description);
        if !inputs.is_empty() {
            println!("{:<28} inputs: {}", "", inputs.join(", "));
        }
    }
}

/// Maps `SLOT=VALUE` pairs to slot indexes. `SLOT` is an index or a slot name.
pub fn resolve_inputs(
    operation: &OperationDescriptor,
    inputs: &[String],
) -> Result<Vec<(usize, String)>> {
    inputs
        .iter()
        .map(|input| {
            let (slot, value) = input
                .split_once('=')
                .ok_or_else(|| anyhow!("input `{input}` is not SLOT=VALUE"))?;
            Ok((resolve_slot(operation, slot.trim())?, value.to_string()))
        })
        .collect()
}

pub fn resolve_slot(operation: &OperationDescriptor, slot: &str) -> Result<usize> {
    if let Ok(index) = slot.parse::<usize>() {
        if index < operation.arity() {
            return Ok(index);
        }
        return Err(anyhow!(
            "slot {index} is out of range, `{}` has {} inputs",
            operation.id,
            operation.arity()
        ));
    }
    operation
        .inputs()
        .iter()
        .position(|input| input.name.eq_ignore_ascii_case(slot))
        .ok_or_else(|| anyhow!("`{}` has no input named `{slot}`", operation.id))
}

/// `@path` reads the value from a file; anything else is taken literally.
pub async fn read_value(value: &str) -> Result<String> {
    match value.strip_prefix('@') {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("read slot value from {path}")),
        None => Ok(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use clap::Parser;
    use wallet_api_client::{SimulatedWallet, WalletApi};
    use wallet_api_debugger::{DebuggerConfig, OperationRegistry, TransportMode};

    use super::{Cli, Command, read_value, resolve_inputs, resolve_slot};

    fn registry() -> OperationRegistry {
        let api: Arc<dyn WalletApi> = Arc::new(SimulatedWallet::standard());
        OperationRegistry::new(api)
    }

    #[test]
    fn no_subcommand_runs_the_repl() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from(["wallet-api-debugger"])?;
        assert_eq!(cli.command, None);
        Ok(())
    }

    #[test]
    fn call_collects_inputs_and_flags_override_config() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from([
            "wallet-api-debugger",
            "call",
            "signMessage",
            "--input",
            "account=acc-1",
            "-i",
            "1=hello",
            "--mode",
            "live",
            "--history-capacity",
            "3",
        ])?;
        assert_eq!(
            cli.command,
            Some(Command::Call {
                operation: "signMessage".to_string(),
                inputs: vec!["account=acc-1".to_string(), "1=hello".to_string()],
            })
        );

        let mut config = DebuggerConfig::for_tests();
        cli.apply_overrides(&mut config);
        assert_eq!(config.mode, TransportMode::Live);
        assert_eq!(config.history_capacity, 3);
        Ok(())
    }

    #[test]
    fn zero_history_capacity_is_rejected() {
        assert!(
            Cli::try_parse_from(["wallet-api-debugger", "--history-capacity", "0"]).is_err()
        );
    }

    #[test]
    fn slots_resolve_by_index_or_name() -> anyhow::Result<()> {
        let registry = registry();
        let Some(op) = registry.get("signTransaction") else {
            anyhow::bail!("signTransaction is registered");
        };
        assert_eq!(resolve_slot(op, "2")?, 2);
        assert_eq!(resolve_slot(op, "Transaction")?, 1);
        assert!(resolve_slot(op, "3").is_err());
        assert!(resolve_slot(op, "memo").is_err());

        let edits = resolve_inputs(op, &["account=a=b".to_string()])?;
        assert_eq!(edits, vec![(0, "a=b".to_string())]);
        assert!(resolve_inputs(op, &["account".to_string()]).is_err());
        Ok(())
    }

    #[tokio::test]
    async fn at_prefix_reads_a_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("tx.json");
        tokio::fs::write(&path, "{\"amount\":\"1\"}").await?;
        let value = read_value(&format!("@{}", path.display())).await?;
        assert_eq!(value, "{\"amount\":\"1\"}");
        assert_eq!(read_value("plain").await?, "plain");
        Ok(())
    }
}
