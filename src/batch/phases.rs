//! Lifecycle phase and finish-check strategy definitions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Phase marker recorded on a step's context as it moves through the
/// pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionPhase {
    /// Batch-wide before hook is running
    Before,
    /// The operation's own action is running
    Execution,
    /// Batch-wide after hook is running
    After,
    /// The operation's success hook is running
    Success,
    /// The operation's error hook is running
    Error,
    /// The operation's complete hook is running
    Complete,
    /// Every operation has completed; the when-all-finished hook is running
    Finished,
    /// The pipeline was cancelled; the when-cancelled hook is running
    Cancelled,
}

impl ExecutionPhase {
    /// Whether this phase ends the pipeline (no further operations run)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Cancelled)
    }

    /// Whether this phase is the error side channel
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }

    /// Whether the step is still in its happy-path phases
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Before | Self::Execution | Self::After)
    }
}

impl fmt::Display for ExecutionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Before => write!(f, "before"),
            Self::Execution => write!(f, "execution"),
            Self::After => write!(f, "after"),
            Self::Success => write!(f, "success"),
            Self::Error => write!(f, "error"),
            Self::Complete => write!(f, "complete"),
            Self::Finished => write!(f, "finished"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for ExecutionPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "before" => Ok(Self::Before),
            "execution" => Ok(Self::Execution),
            "after" => Ok(Self::After),
            "success" => Ok(Self::Success),
            "error" => Ok(Self::Error),
            "complete" => Ok(Self::Complete),
            "finished" => Ok(Self::Finished),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("Invalid execution phase: {s}")),
        }
    }
}

/// How a step's completion bookkeeping is triggered.
///
/// `Automatic` runs the finish check after every operation; `Manual`
/// requires the step itself to call `invoke_next()` on its context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvokeStrategy {
    Automatic,
    Manual,
}

impl fmt::Display for InvokeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Automatic => write!(f, "automatic"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

impl std::str::FromStr for InvokeStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "automatic" => Ok(Self::Automatic),
            "manual" => Ok(Self::Manual),
            _ => Err(format!("Invalid invoke strategy: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_display_round_trip() {
        let phases = [
            ExecutionPhase::Before,
            ExecutionPhase::Execution,
            ExecutionPhase::After,
            ExecutionPhase::Success,
            ExecutionPhase::Error,
            ExecutionPhase::Complete,
            ExecutionPhase::Finished,
            ExecutionPhase::Cancelled,
        ];
        for phase in phases {
            let parsed: ExecutionPhase = phase.to_string().parse().unwrap();
            assert_eq!(parsed, phase);
        }
    }

    #[test]
    fn test_phase_serde_snake_case() {
        let json = serde_json::to_string(&ExecutionPhase::Execution).unwrap();
        assert_eq!(json, "\"execution\"");
    }

    #[test]
    fn test_terminal_phases() {
        assert!(ExecutionPhase::Finished.is_terminal());
        assert!(ExecutionPhase::Cancelled.is_terminal());
        assert!(!ExecutionPhase::Complete.is_terminal());
    }

    #[test]
    fn test_invoke_strategy_parse() {
        assert_eq!(
            "manual".parse::<InvokeStrategy>().unwrap(),
            InvokeStrategy::Manual
        );
        assert!("eager".parse::<InvokeStrategy>().is_err());
    }
}
