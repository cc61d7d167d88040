//! Plain-text rendering of console entries.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::compose::pretty_value_with_indent;
use crate::invocation::{InvocationResult, InvocationStatus, PendingInvocation};

const RESULT_INDENT: &[u8] = b"    ";
const PENDING_BODY: &str = "[...]";

/// One line of the console: a settled result or an in-flight placeholder.
#[derive(Debug, Clone, Copy)]
pub enum ConsoleEntry<'a> {
    Settled(&'a InvocationResult),
    Pending(&'a PendingInvocation),
}

impl ConsoleEntry<'_> {
    pub fn uuid(&self) -> Uuid {
        match self {
            Self::Settled(result) => result.uuid(),
            Self::Pending(pending) => pending.uuid(),
        }
    }

    pub fn operation_id(&self) -> &str {
        match self {
            Self::Settled(result) => result.operation_id(),
            Self::Pending(pending) => pending.operation_id(),
        }
    }

    pub fn status(&self) -> InvocationStatus {
        match self {
            Self::Settled(result) => result.status(),
            Self::Pending(pending) => pending.status(),
        }
    }

    /// Settled entries report their response time; pending ones the time
    /// elapsed so far.
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        match self {
            Self::Settled(result) => result.elapsed(),
            Self::Pending(pending) => now - pending.queried_at(),
        }
    }

    pub fn body(&self) -> String {
        match self {
            Self::Pending(_) => PENDING_BODY.to_string(),
            Self::Settled(result) => match (result.data(), result.error()) {
                (Some(data), _) => {
                    pretty_value_with_indent(data, RESULT_INDENT).unwrap_or_else(|| data.to_string())
                }
                (None, Some(err)) => err.to_string(),
                (None, None) => String::new(),
            },
        }
    }
}

/// `N milliseconds` up to one second, `N seconds` above.
pub fn format_distance(elapsed: Duration) -> String {
    let millis = elapsed.num_milliseconds().unsigned_abs();
    if millis > 1000 {
        format!("{} seconds", millis as f64 / 1000.0)
    } else {
        format!("{millis} milliseconds")
    }
}

pub fn render_entry(entry: &ConsoleEntry<'_>, now: DateTime<Utc>) -> String {
    format!(
        "[{}] {} ~{}\n{}",
        entry.status().label(),
        entry.operation_id(),
        format_distance(entry.elapsed(now)),
        entry.body()
    )
}
