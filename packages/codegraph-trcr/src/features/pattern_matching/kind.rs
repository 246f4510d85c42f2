//! Wildcard pattern classification
//!
//! Patterns are classified once, when a rule is compiled, into a closed set of
//! shapes. Three single-wildcard shapes have a cheap evaluation strategy; the
//! rest fall back to an anchored compiled matcher.

use super::matcher::build_anchored_regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use thiserror::Error;

/// Wildcard character: matches zero or more characters
pub const WILDCARD: char = '*';

/// Pattern shape
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "shape", content = "literal", rename_all = "lowercase")]
pub enum PatternKind {
    /// No wildcard: whole-string comparison
    Exact,
    /// `*.Cursor`: text ends with the literal
    Suffix(String),
    /// `subprocess.*`: text starts with the literal
    Prefix(String),
    /// `*mongo*`: text contains the literal
    Contains(String),
    /// Anything else (`*`, `a*b`, `a*b*c`): compiled anchored matcher
    General,
}

impl PatternKind {
    /// Classify a raw pattern string
    pub fn classify(pattern: &str) -> Self {
        let wildcards = pattern.matches(WILDCARD).count();
        let len = pattern.len();

        match wildcards {
            0 => PatternKind::Exact,
            1 if len > 1 && pattern.starts_with(WILDCARD) => {
                PatternKind::Suffix(pattern[1..].to_string())
            }
            1 if len > 1 && pattern.ends_with(WILDCARD) => {
                PatternKind::Prefix(pattern[..len - 1].to_string())
            }
            2 if len > 2 && pattern.starts_with(WILDCARD) && pattern.ends_with(WILDCARD) => {
                PatternKind::Contains(pattern[1..len - 1].to_string())
            }
            _ => PatternKind::General,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PatternKind::Exact => "exact",
            PatternKind::Suffix(_) => "suffix",
            PatternKind::Prefix(_) => "prefix",
            PatternKind::Contains(_) => "contains",
            PatternKind::General => "general",
        }
    }

    /// Suffix, prefix or contains
    pub fn is_single_wildcard_shape(&self) -> bool {
        matches!(
            self,
            PatternKind::Suffix(_) | PatternKind::Prefix(_) | PatternKind::Contains(_)
        )
    }

    /// Relative evaluation cost (used by generator and predicate planning)
    pub fn eval_cost(&self) -> u32 {
        match self {
            PatternKind::Exact => 1,
            PatternKind::Prefix(_) | PatternKind::Suffix(_) => 2,
            PatternKind::Contains(_) => 3,
            PatternKind::General => 10,
        }
    }
}

/// Malformed wildcard pattern
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("pattern is empty")]
    Empty,

    #[error("pattern '{0}' contains adjacent wildcards")]
    AdjacentWildcards(String),

    #[error("pattern '{pattern}' does not build a matcher: {reason}")]
    Unbuildable { pattern: String, reason: String },
}

/// A pattern classified once and stored on the executable rule
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompiledPattern {
    raw: String,
    kind: PatternKind,
    /// Same classification over the lowercased pattern (case-insensitive mode)
    folded_kind: PatternKind,
    folded: String,
}

impl CompiledPattern {
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(PatternError::Empty);
        }
        if raw.contains("**") {
            return Err(PatternError::AdjacentWildcards(raw.to_string()));
        }

        let folded = raw.to_lowercase();
        let pattern = Self {
            raw: raw.to_string(),
            kind: PatternKind::classify(raw),
            folded_kind: PatternKind::classify(&folded),
            folded,
        };
        for case_sensitive in [true, false] {
            if *pattern.kind_for(case_sensitive) == PatternKind::General {
                build_anchored_regex(pattern.text_for(case_sensitive), case_sensitive).map_err(
                    |e| PatternError::Unbuildable {
                        pattern: pattern.raw.clone(),
                        reason: e.to_string(),
                    },
                )?;
            }
        }
        Ok(pattern)
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn kind(&self) -> &PatternKind {
        &self.kind
    }

    /// Classification for the requested case mode
    pub fn kind_for(&self, case_sensitive: bool) -> &PatternKind {
        if case_sensitive {
            &self.kind
        } else {
            &self.folded_kind
        }
    }

    /// Pattern text for the requested case mode
    pub fn text_for(&self, case_sensitive: bool) -> &str {
        if case_sensitive {
            &self.raw
        } else {
            &self.folded
        }
    }

    pub fn is_exact(&self) -> bool {
        self.kind == PatternKind::Exact
    }

    pub fn wildcard_count(&self) -> usize {
        self.raw.matches(WILDCARD).count()
    }

    /// Number of non-wildcard characters
    pub fn literal_length(&self) -> usize {
        self.raw.chars().filter(|c| *c != WILDCARD).count()
    }

    /// Literal segments between wildcards, in order
    pub fn segments(&self, case_sensitive: bool) -> impl Iterator<Item = &str> {
        self.text_for(case_sensitive)
            .split(WILDCARD)
            .filter(|s| !s.is_empty())
    }

    /// Longest literal segment (first one on ties)
    pub fn longest_literal(&self, case_sensitive: bool) -> Option<&str> {
        self.segments(case_sensitive)
            .fold(None, |best: Option<&str>, seg| match best {
                Some(b) if b.len() >= seg.len() => Some(b),
                _ => Some(seg),
            })
    }
}

impl std::fmt::Display for CompiledPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Lowercase `text` unless matching is case-sensitive
///
/// Agrees with `str::to_lowercase` for every input (titlecase letters such as
/// 'ǅ' included); ASCII text without uppercase letters is borrowed.
pub fn fold_case(text: &str, case_sensitive: bool) -> Cow<'_, str> {
    if case_sensitive || (text.is_ascii() && !text.bytes().any(|b| b.is_ascii_uppercase())) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.to_lowercase())
    }
}
