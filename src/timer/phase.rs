use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How long the overlay stays hidden after a prepare request.
pub const PREPARE_HIDE: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Idle,
    Working,
    OnBreak,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "IDLE",
            Phase::Working => "WORK",
            Phase::OnBreak => "BREAK",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Phase::Idle => "⏸",
            Phase::Working => "💼",
            Phase::OnBreak => "☕",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.emoji(), self.as_str())
    }
}

pub fn minutes(n: i64) -> Duration {
    Duration::from_millis((n.max(0) as u64).saturating_mul(60_000))
}
