//! Candidate generation against the tiered index

use crate::features::indexing::{EntityIndex, EntityOrdinal, TieredIndex, TypeMemberKey};
use crate::features::pattern_matching::{fold_case, CompiledPattern, WildcardMatcher};
use crate::features::rule_compiler::{IndexTarget, KeyField, Lookup, TaintRuleExecutableIR};
use std::time::Instant;

/// Candidates for one rule, in discovery order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidates {
    pub ordinals: Vec<EntityOrdinal>,
    /// Distinct candidates found before truncation
    pub generated: usize,
    /// Deadline hit while scanning keys
    pub timed_out: bool,
}

/// Run a rule's generator. Ordinals are sorted and deduplicated so truncation
/// keeps the earliest-discovered entities.
pub fn generate_candidates(
    rule: &TaintRuleExecutableIR,
    index: &TieredIndex,
    matcher: &WildcardMatcher,
    deadline: Option<Instant>,
) -> Candidates {
    let cs = index.case_sensitive();
    let patterns = &rule.patterns;
    let generator = &rule.generator_exec;

    let mut timed_out = false;
    let mut ordinals: Vec<EntityOrdinal> = match (&generator.lookup, generator.target) {
        (Lookup::Exact, IndexTarget::Call) => index.call().lookup(patterns.member.as_str(), cs).to_vec(),
        (Lookup::Exact, target) => {
            let base_type = patterns.base_type.as_ref().map_or("", CompiledPattern::as_str);
            let key = TypeMemberKey::new(base_type, patterns.member.as_str(), cs);
            match target {
                IndexTarget::TypeRead => index.type_read().query(&key).to_vec(),
                _ => index.type_call().query(&key).to_vec(),
            }
        }
        (lookup, IndexTarget::Call) => {
            let anchor = scan_anchor(lookup, KeyField::Member, cs);
            let mut out = Vec::new();
            for (key, ords) in index.call().iter() {
                if past(deadline) {
                    timed_out = true;
                    break;
                }
                if anchor.as_deref().map_or(true, |a| key.contains(a))
                    && matcher.matches_folded(&patterns.member, key, cs)
                {
                    out.extend_from_slice(ords);
                }
            }
            out
        }
        (lookup, target) => {
            let base_anchor = scan_anchor(lookup, KeyField::BaseType, cs);
            let member_anchor = scan_anchor(lookup, KeyField::Member, cs);
            let base_pattern = patterns.base_type.as_ref().filter(|_| generator.filters_base_type);
            let keys: Box<dyn Iterator<Item = (&TypeMemberKey, &[EntityOrdinal])> + '_> = match target {
                IndexTarget::TypeRead => Box::new(index.type_read().iter()),
                _ => Box::new(index.type_call().iter()),
            };

            let mut out = Vec::new();
            for (key, ords) in keys {
                if past(deadline) {
                    timed_out = true;
                    break;
                }
                let anchored = base_anchor.as_deref().map_or(true, |a| key.base_type.contains(a))
                    && member_anchor.as_deref().map_or(true, |a| key.member.contains(a));
                if anchored
                    && base_pattern.map_or(true, |p| matcher.matches_folded(p, &key.base_type, cs))
                    && matcher.matches_folded(&patterns.member, &key.member, cs)
                {
                    out.extend_from_slice(ords);
                }
            }
            out
        }
    };

    ordinals.sort_unstable();
    ordinals.dedup();

    Candidates {
        generated: ordinals.len(),
        ordinals,
        timed_out,
    }
}

fn scan_anchor(lookup: &Lookup, field: KeyField, case_sensitive: bool) -> Option<String> {
    match lookup {
        Lookup::LiteralScan { field: f, anchor } if *f == field => {
            Some(fold_case(anchor, case_sensitive).into_owned())
        }
        _ => None,
    }
}

fn past(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|d| Instant::now() >= d)
}
