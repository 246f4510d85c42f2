//! Rule compilation errors
//!
//! Every variant names the offending rule so a broken rule is reported, never
//! dropped or turned into an always/never-matching rule.

use crate::features::pattern_matching::PatternError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("atom at position {position} has an empty id")]
    EmptyRuleId { position: usize },

    #[error("rule '{rule_id}': atom has no match rules")]
    EmptyAtom { rule_id: String },

    #[error("rule '{rule_id}': neither 'call' nor 'read' is populated")]
    MissingMatchTarget { rule_id: String },

    #[error("rule '{rule_id}': both 'call' and 'read' are populated")]
    ConflictingMatchTarget { rule_id: String },

    #[error("rule '{rule_id}': malformed {field} pattern: {source}")]
    MalformedPattern {
        rule_id: String,
        field: &'static str,
        #[source]
        source: PatternError,
    },

    #[error("rule '{rule_id}': confidence {value} (base {base} + adjustment {adjustment}) is outside [0, 1]")]
    ConfidenceOutOfRange {
        rule_id: String,
        value: f64,
        base: f64,
        adjustment: f64,
    },

    #[error("rule '{rule_id}': no viable candidate generator ({reason})")]
    NoViableGenerator { rule_id: String, reason: String },

    #[error("rule '{rule_id}': invalid constraint on argument {position}: {reason}")]
    InvalidArgConstraint {
        rule_id: String,
        position: usize,
        reason: String,
    },

    #[error("rule '{rule_id}': duplicate rule id")]
    DuplicateRuleId { rule_id: String },
}

impl CompileError {
    /// Offending rule id (empty for `EmptyRuleId`)
    pub fn rule_id(&self) -> &str {
        match self {
            CompileError::EmptyRuleId { .. } => "",
            CompileError::EmptyAtom { rule_id }
            | CompileError::MissingMatchTarget { rule_id }
            | CompileError::ConflictingMatchTarget { rule_id }
            | CompileError::MalformedPattern { rule_id, .. }
            | CompileError::ConfidenceOutOfRange { rule_id, .. }
            | CompileError::NoViableGenerator { rule_id, .. }
            | CompileError::InvalidArgConstraint { rule_id, .. }
            | CompileError::DuplicateRuleId { rule_id } => rule_id,
        }
    }
}

pub type CompileResult<T> = Result<T, CompileError>;
