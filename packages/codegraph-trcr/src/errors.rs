//! Error types for codegraph-trcr
//!
//! Provides unified error handling across the crate. Per-rule compile failures
//! and runtime diagnostics are values, not errors; `TrcrError` is only returned
//! by the entry points that refuse partial results.

use thiserror::Error;

use crate::config::ConfigError;
use crate::features::rule_compiler::CompileError;
use crate::shared::models::MalformedEntity;

/// Main error type for codegraph-trcr operations
#[derive(Debug, Error)]
pub enum TrcrError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A single rule failed to compile
    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),

    /// Several rules failed to compile
    #[error("{} rule(s) failed to compile; first: {}", .0.len(), .0.first().map(|e| e.to_string()).unwrap_or_default())]
    CompileBatch(Vec<CompileError>),

    /// Entity record could not be converted
    #[error("Malformed entity: {0}")]
    MalformedEntity(#[from] MalformedEntity),
}

impl TrcrError {
    /// Rule ids of every compile failure carried by this error
    pub fn failed_rule_ids(&self) -> Vec<&str> {
        match self {
            TrcrError::Compile(e) => vec![e.rule_id()],
            TrcrError::CompileBatch(errors) => errors.iter().map(|e| e.rule_id()).collect(),
            _ => Vec::new(),
        }
    }
}

/// Result type alias for trcr operations
pub type Result<T> = std::result::Result<T, TrcrError>;
