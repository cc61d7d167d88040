//! Line-oriented console: one command per line, settlements printed as they arrive.

use std::io::Write;
use std::str::FromStr;

use anyhow::Result;
use chrono::Utc;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use wallet_api_debugger::{
    Console, ConsoleEntry, InvocationResult, Submission, render_entry,
};

use crate::read_value;

const HELP: &str = "\
commands:
  ops                  list operations
  use <id>             select an operation (slots reset to defaults)
  show                 show the selected operation's slots
  set <n> [value]      set slot n; `@path` reads a file, no value clears it
  pick <n> <option>    set selector slot n to one of its listed options
  format <n>           re-indent the JSON in slot n
  reset                reset every slot to its default
  send                 invoke the selected operation
  wait                 wait for every in-flight call
  history              show settled results, then in-flight calls
  clear                clear the history (in-flight calls still land)
  context              show loaded accounts and currencies
  refresh              reload accounts and currencies
  help                 show this text
  quit                 leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Empty,
    Ops,
    Use(String),
    Show,
    Set { slot: usize, value: Option<String> },
    Pick { slot: usize, option: usize },
    Format(usize),
    Reset,
    Send,
    Wait,
    History,
    Clear,
    Context,
    Refresh,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown command `{0}`, try `help`")]
    Unknown(String),
    #[error("`{command}` needs {expected}")]
    MissingArgument {
        command: &'static str,
        expected: &'static str,
    },
    #[error("`{0}` is not a slot or option number")]
    InvalidNumber(String),
}

fn number(value: &str) -> Result<usize, ParseError> {
    value
        .parse()
        .map_err(|_| ParseError::InvalidNumber(value.to_string()))
}

fn required<'a>(
    value: Option<&'a str>,
    command: &'static str,
    expected: &'static str,
) -> Result<&'a str, ParseError> {
    value
        .filter(|value| !value.is_empty())
        .ok_or(ParseError::MissingArgument { command, expected })
}

impl FromStr for ReplCommand {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, Some(rest.trim_start())),
            None => (line, None),
        };

        Ok(match word {
            "" => Self::Empty,
            "ops" => Self::Ops,
            "use" => Self::Use(required(rest, "use", "an operation id")?.to_string()),
            "show" => Self::Show,
            "set" => {
                let args = required(rest, "set", "a slot number")?;
                let (slot, value) = match args.split_once(char::is_whitespace) {
                    Some((slot, value)) => (slot, Some(value.trim_start().to_string())),
                    None => (args, None),
                };
                Self::Set {
                    slot: number(slot)?,
                    value: value.filter(|value| !value.is_empty()),
                }
            }
            "pick" => {
                let args = required(rest, "pick", "a slot and an option number")?;
                let mut parts = args.split_whitespace();
                let slot = number(parts.next().unwrap_or_default())?;
                let option = required(parts.next(), "pick", "an option number")?;
                Self::Pick {
                    slot,
                    option: number(option)?,
                }
            }
            "format" => Self::Format(number(required(rest, "format", "a slot number")?)?),
            "reset" => Self::Reset,
            "send" => Self::Send,
            "wait" => Self::Wait,
            "history" => Self::History,
            "clear" => Self::Clear,
            "context" => Self::Context,
            "refresh" => Self::Refresh,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => return Err(ParseError::Unknown(other.to_string())),
        })
    }
}

enum ReplEvent {
    Line(Option<String>),
    Settled(InvocationResult),
}

pub async fn run(console: &mut Console) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{HELP}");
    show_slots(console);

    loop {
        prompt();
        let event = tokio::select! {
            line = lines.next_line() => ReplEvent::Line(line?),
            Some(result) = console.next_settlement() => ReplEvent::Settled(result),
        };

        match event {
            ReplEvent::Settled(result) => {
                println!();
                print_result(&result);
            }
            ReplEvent::Line(None) => break,
            ReplEvent::Line(Some(line)) => match line.parse::<ReplCommand>() {
                Ok(ReplCommand::Quit) => break,
                Ok(command) => {
                    if let Err(err) = execute(console, command).await {
                        println!("error: {err:#}");
                    }
                }
                Err(err) => println!("{err}"),
            },
        }
    }

    let in_flight = console.in_flight();
    if in_flight > 0 {
        println!("leaving with {in_flight} call(s) still in flight");
    }
    Ok(())
}

async fn execute(console: &mut Console, command: ReplCommand) -> Result<()> {
    match command {
        ReplCommand::Empty | ReplCommand::Quit => {}
        ReplCommand::Ops => crate::print_operations(console),
        ReplCommand::Use(id) => {
            console.select(&id)?;
            show_slots(console);
        }
        ReplCommand::Show => show_slots(console),
        ReplCommand::Set { slot, value } => {
            let value = match value {
                Some(value) => Some(read_value(&value).await?),
                None => None,
            };
            console.edit(slot, value)?;
        }
        ReplCommand::Pick { slot, option } => {
            console.pick(slot, option)?;
            show_slots(console);
        }
        ReplCommand::Format(slot) => {
            if console.format_slot(slot)? {
                show_slots(console);
            } else {
                println!("slot {slot} left as is");
            }
        }
        ReplCommand::Reset => {
            console.reset_inputs()?;
            show_slots(console);
        }
        ReplCommand::Send => match console.submit()? {
            Submission::Started(uuid) => println!("[PENDING] {uuid}"),
            Submission::Rejected(_) => {
                if let Some(result) = console.history().last() {
                    print_result(result);
                }
            }
        },
        ReplCommand::Wait => {
            for result in console.wait_idle().await {
                print_result(&result);
            }
        }
        ReplCommand::History => {
            for result in console.drain() {
                print_result(&result);
            }
            for entry in console.render() {
                println!("{entry}\n");
            }
        }
        ReplCommand::Clear => console.clear_history(),
        ReplCommand::Context => show_context(console)?,
        ReplCommand::Refresh => {
            console.refresh_context().await?;
            show_context(console)?;
        }
        ReplCommand::Help => println!("{HELP}"),
    }
    Ok(())
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

fn print_result(result: &InvocationResult) {
    println!("{}", render_entry(&ConsoleEntry::Settled(result), Utc::now()));
}

fn show_slots(console: &Console) {
    let Some(operation) = console.selected() else {
        println!("no operation selected");
        return;
    };
    println!("{}: {}", operation.id, operation.description);
    for slot in console.slots() {
        let value = slot.value.as_deref().unwrap_or("<empty>");
        println!("  [{}] {} ({}): {}", slot.index, slot.name, slot.widget, value);
        for (position, option) in slot.options.iter().enumerate() {
            println!("      {position}) {} = {}", option.label, option.value);
        }
    }
}

fn show_context(console: &Console) -> Result<()> {
    if let Some(err) = console.context_error() {
        println!("last context load failed: {err}");
    }
    println!("{}", serde_json::to_string_pretty(console.context())?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{ParseError, ReplCommand};

    #[test]
    fn parses_commands_with_arguments() -> anyhow::Result<()> {
        assert_eq!("use listAccounts".parse::<ReplCommand>()?, ReplCommand::Use("listAccounts".into()));
        assert_eq!(
            "set 1 {\"a\": 1}".parse::<ReplCommand>()?,
            ReplCommand::Set {
                slot: 1,
                value: Some("{\"a\": 1}".to_string()),
            }
        );
        assert_eq!(
            "set 0".parse::<ReplCommand>()?,
            ReplCommand::Set {
                slot: 0,
                value: None,
            }
        );
        assert_eq!(
            "pick 0 2".parse::<ReplCommand>()?,
            ReplCommand::Pick { slot: 0, option: 2 }
        );
        assert_eq!("  ".parse::<ReplCommand>()?, ReplCommand::Empty);
        assert_eq!("exit".parse::<ReplCommand>()?, ReplCommand::Quit);
        Ok(())
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(
            "launch".parse::<ReplCommand>(),
            Err(ParseError::Unknown("launch".to_string()))
        );
        assert_eq!(
            "set x 1".parse::<ReplCommand>(),
            Err(ParseError::InvalidNumber("x".to_string()))
        );
        assert_eq!(
            "pick 0".parse::<ReplCommand>(),
            Err(ParseError::MissingArgument {
                command: "pick",
                expected: "an option number",
            })
        );
        assert!(matches!(
            "use".parse::<ReplCommand>(),
            Err(ParseError::MissingArgument { command: "use", .. })
        ));
    }
}
