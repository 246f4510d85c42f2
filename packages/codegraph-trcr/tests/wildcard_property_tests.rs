//! Wildcard semantics against a straightforward glob reference
//!
//! The shape fast paths (suffix, prefix, contains) and the compiled anchored
//! matcher must agree with plain `*`-glob matching on every input.

use codegraph_trcr::{wildcard_match, CompiledPattern, WildcardMatcher};
use proptest::prelude::*;

/// Classic glob DP: `*` matches zero or more characters, anchored both ends
fn reference(pattern: &str, text: &str, case_sensitive: bool) -> bool {
    if pattern.is_empty() || text.is_empty() {
        return false;
    }
    let fold = |s: &str| if case_sensitive { s.to_string() } else { s.to_lowercase() };
    let p: Vec<char> = fold(pattern).chars().collect();
    let t: Vec<char> = fold(text).chars().collect();

    let mut dp = vec![vec![false; t.len() + 1]; p.len() + 1];
    dp[0][0] = true;
    for i in 1..=p.len() {
        dp[i][0] = dp[i - 1][0] && p[i - 1] == '*';
        for j in 1..=t.len() {
            dp[i][j] = if p[i - 1] == '*' {
                dp[i - 1][j] || dp[i][j - 1]
            } else {
                dp[i - 1][j - 1] && p[i - 1] == t[j - 1]
            };
        }
    }
    dp[p.len()][t.len()]
}

fn pattern() -> impl Strategy<Value = String> {
    "[aAbB.]{0,3}(\\*[aAbB.]{1,3}){0,2}\\*?".prop_filter("non-empty", |p| !p.is_empty())
}

fn text() -> impl Strategy<Value = String> {
    "[aAbB.]{0,8}"
}

proptest! {
    #[test]
    fn matches_reference(pattern in pattern(), text in text(), case_sensitive in any::<bool>()) {
        prop_assert_eq!(
            wildcard_match(&pattern, &text, case_sensitive),
            reference(&pattern, &text, case_sensitive)
        );
    }

    #[test]
    fn compiled_pattern_agrees_with_raw(pattern in pattern(), text in text(), case_sensitive in any::<bool>()) {
        let matcher = WildcardMatcher::default();
        let compiled = CompiledPattern::parse(&pattern).unwrap();
        prop_assert_eq!(
            matcher.matches(&compiled, &text, case_sensitive),
            matcher.wildcard_match(&pattern, &text, case_sensitive)
        );
    }

    #[test]
    fn star_matches_any_non_empty(text in "[a-zA-Z0-9._]{1,12}") {
        prop_assert!(wildcard_match("*", &text, false));
    }
}

#[test]
fn known_cases() {
    assert!(wildcard_match("*.Cursor", "sqlite3.Cursor", false));
    assert!(!wildcard_match("*.Cursor", "sqlite3.Connection", false));
    assert!(wildcard_match("subprocess.*", "subprocess.Popen", false));
    assert!(wildcard_match("*mongo*", "pymongo.collection.Collection", false));
    assert!(wildcard_match("sqlite3.Cursor", "SQLITE3.cursor", false));
    assert!(!wildcard_match("sqlite3.Cursor", "sqlite3.Cursor2", false));
    assert!(!wildcard_match("", "x", false));
    assert!(!wildcard_match("*", "", false));
}

#[test]
fn general_patterns_hit_the_cache() {
    let matcher = WildcardMatcher::new(4);
    for _ in 0..5 {
        assert!(matcher.wildcard_match("os.*sys*", "os.system", false));
    }
    let stats = matcher.stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 4);
}

#[test]
fn compiled_and_ad_hoc_agree_on_titlecase_letters() {
    let matcher = WildcardMatcher::default();
    let cases = [
        ("*.ǅ", "a.ǅ"),
        ("*.ǅ", "a.ǆ"),
        ("*.ǆ", "A.Ǆ"),
        ("ǅ.*", "ǆ.run"),
        ("*ǈ*", "xǉy"),
        ("ǅ*x*z", "ǆaxbz"),
        ("Straße.*", "STRAßE.open"),
    ];
    for (pattern, text) in cases {
        let compiled = CompiledPattern::parse(pattern).unwrap();
        assert!(wildcard_match(pattern, text, false), "{} !~ {}", pattern, text);
        assert!(matcher.matches(&compiled, text, false), "{} !~ {} (compiled)", pattern, text);
        assert_eq!(
            matcher.matches(&compiled, text, true),
            wildcard_match(pattern, text, true),
            "{} vs {} (case-sensitive)",
            pattern,
            text
        );
    }
}
