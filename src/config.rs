//! # Engine Configuration
//!
//! Defaults for batch execution, overridable from `STEPSEQ_*` environment
//! variables.

use crate::batch::InvokeStrategy;
use crate::error::{Result, StepseqError};
use serde::{Deserialize, Serialize};

/// Engine-wide defaults applied to newly created batches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Default finish-check invoke strategy for batches that do not set one
    pub invoke_strategy: InvokeStrategy,
    /// Emit a trace event on every step phase transition
    pub trace_phases: bool,
    /// Maximum operations allowed in a single batch (0 = unlimited)
    pub max_operations: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            invoke_strategy: InvokeStrategy::Automatic,
            trace_phases: false,
            max_operations: 0,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(strategy) = std::env::var("STEPSEQ_INVOKE_STRATEGY") {
            config.invoke_strategy = strategy.parse().map_err(|e| {
                StepseqError::Configuration {
                    message: format!("Invalid invoke_strategy: {e}"),
                }
            })?;
        }

        if let Ok(trace) = std::env::var("STEPSEQ_TRACE_PHASES") {
            config.trace_phases = matches!(trace.as_str(), "1" | "true" | "yes");
        }

        if let Ok(max_ops) = std::env::var("STEPSEQ_MAX_OPERATIONS") {
            config.max_operations = max_ops.parse().map_err(|e| {
                StepseqError::Configuration {
                    message: format!("Invalid max_operations: {e}"),
                }
            })?;
        }

        Ok(config)
    }
}
