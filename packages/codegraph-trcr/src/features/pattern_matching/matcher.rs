//! Wildcard matcher with a bounded LRU cache of compiled anchored regexes
//!
//! The same small set of patterns recurs across a very large entity stream, so
//! general patterns are compiled once and cached keyed by
//! `(pattern, case_sensitivity)`. The cache is owned by the matcher instance
//! (inject an `Arc<WildcardMatcher>` to share it) and is safe for concurrent
//! read/insert. Correctness never depends on a cache hit.

use super::kind::{fold_case, CompiledPattern, PatternKind, WILDCARD};
use lru::LruCache;
use parking_lot::Mutex;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Cache statistics snapshot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatcherStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub capacity: usize,
}

impl MatcherStats {
    /// Cache hit rate (0.0-1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Wildcard pattern matcher
pub struct WildcardMatcher {
    /// (pattern as matched, case_sensitive) -> anchored regex
    cache: Mutex<LruCache<(String, bool), Regex>>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl WildcardMatcher {
    /// Create a matcher whose cache holds at most `capacity` compiled patterns
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let size = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(size)),
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// `wildcard_match(pattern, text, case_sensitive)`
    ///
    /// Empty pattern or empty text never match; `"*"` matches any non-empty text.
    pub fn wildcard_match(&self, pattern: &str, text: &str, case_sensitive: bool) -> bool {
        if pattern.is_empty() || text.is_empty() {
            return false;
        }
        let pattern = fold_case(pattern, case_sensitive);
        let text = fold_case(text, case_sensitive);
        let kind = PatternKind::classify(&pattern);
        self.eval(&kind, &pattern, &text, case_sensitive)
    }

    /// Match a pre-classified pattern
    pub fn matches(&self, pattern: &CompiledPattern, text: &str, case_sensitive: bool) -> bool {
        if text.is_empty() {
            return false;
        }
        let text = fold_case(text, case_sensitive);
        self.eval(
            pattern.kind_for(case_sensitive),
            pattern.text_for(case_sensitive),
            &text,
            case_sensitive,
        )
    }

    /// Match text that is already in the requested case mode (index keys)
    pub(crate) fn matches_folded(
        &self,
        pattern: &CompiledPattern,
        folded_text: &str,
        case_sensitive: bool,
    ) -> bool {
        if folded_text.is_empty() {
            return false;
        }
        self.eval(
            pattern.kind_for(case_sensitive),
            pattern.text_for(case_sensitive),
            folded_text,
            case_sensitive,
        )
    }

    fn eval(&self, kind: &PatternKind, pattern: &str, text: &str, case_sensitive: bool) -> bool {
        match kind {
            PatternKind::Exact => text == pattern,
            PatternKind::Suffix(lit) => text.ends_with(lit.as_str()),
            PatternKind::Prefix(lit) => text.starts_with(lit.as_str()),
            PatternKind::Contains(lit) => text.contains(lit.as_str()),
            PatternKind::General => match self.compiled(pattern, case_sensitive) {
                Ok(re) => re.is_match(text),
                Err(e) => {
                    tracing::warn!(pattern, error = %e, "wildcard pattern failed to compile");
                    false
                }
            },
        }
    }

    /// Compiled anchored regex for a general pattern (cached)
    pub fn compiled(&self, pattern: &str, case_sensitive: bool) -> Result<Regex, regex::Error> {
        let key = (pattern.to_string(), case_sensitive);

        if let Some(re) = self.cache.lock().get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(re.clone());
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let re = build_anchored_regex(pattern, case_sensitive)?;
        self.cache.lock().put(key, re.clone());
        Ok(re)
    }

    pub fn stats(&self) -> MatcherStats {
        MatcherStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.cache.lock().len(),
            capacity: self.capacity,
        }
    }

    pub fn clear(&self) {
        self.cache.lock().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}

impl Default for WildcardMatcher {
    fn default() -> Self {
        Self::new(1_000)
    }
}

impl std::fmt::Debug for WildcardMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WildcardMatcher")
            .field("stats", &self.stats())
            .finish()
    }
}

/// Build `^lit(.*)lit...$`: literal segments escaped, `*` -> `.*`, fully anchored
pub fn build_anchored_regex(pattern: &str, case_sensitive: bool) -> Result<Regex, regex::Error> {
    let body = pattern
        .split(WILDCARD)
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");

    RegexBuilder::new(&format!("^{}$", body))
        .case_insensitive(!case_sensitive)
        .dot_matches_new_line(true)
        .build()
}

/// One-off match without a shared cache (ad-hoc callers, tests)
pub fn wildcard_match(pattern: &str, text: &str, case_sensitive: bool) -> bool {
    WildcardMatcher::new(1).wildcard_match(pattern, text, case_sensitive)
}
