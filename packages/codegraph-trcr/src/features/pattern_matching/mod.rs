//! Pattern Matcher
//!
//! Classifies and evaluates wildcard string patterns:
//!
//! ```text
//! "sqlite3.Cursor"   -> Exact     (string equality)
//! "*.Cursor"         -> Suffix    (ends_with)
//! "subprocess.*"     -> Prefix    (starts_with)
//! "*mongo*"          -> Contains  (substring)
//! "os.*.system", "*" -> General   (cached anchored regex)
//! ```
//!
//! Matching is case-insensitive unless requested otherwise.

mod kind;
mod matcher;

pub use kind::{fold_case, CompiledPattern, PatternError, PatternKind, WILDCARD};
pub use matcher::{build_anchored_regex, wildcard_match, MatcherStats, WildcardMatcher};
