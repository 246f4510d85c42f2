//! Generator planning
//!
//! Enumerates the indices that can produce candidates for a rule, records a
//! cost hint for each, and keeps the cheapest. Costs are relative units:
//!
//! ```text
//! exact typed lookup      1
//! exact call-name lookup  2
//! literal-anchored scan   8  + pattern eval costs
//! key scan                10 + pattern eval costs
//! residual base_type      1  + pattern eval cost (when not enforced by the index)
//! ```

use super::error::{CompileError, CompileResult};
use super::ir::{GeneratorExec, IndexTarget, KeyField, Lookup, RulePatterns};
use crate::features::pattern_matching::{CompiledPattern, PatternKind};
use crate::shared::models::EntityKind;

const EXACT_TYPED_COST: u32 = 1;
const EXACT_CALL_COST: u32 = 2;
const LITERAL_SCAN_COST: u32 = 8;
const KEY_SCAN_COST: u32 = 10;

/// Static candidate estimates per lookup (the corpus is unknown at compile time)
const EXACT_TYPED_ESTIMATE: usize = 16;
const EXACT_CALL_ESTIMATE: usize = 64;
const KEY_SCAN_ESTIMATE: usize = 256;
const LITERAL_SCAN_ESTIMATE: usize = 1_024;

const GENERAL_HIT_RATE: f64 = 0.95;

/// Cheapest viable generator for `patterns`
pub fn plan_generator(rule_id: &str, patterns: &RulePatterns) -> CompileResult<GeneratorExec> {
    if patterns.literal_length() == 0 {
        return Err(CompileError::NoViableGenerator {
            rule_id: rule_id.to_string(),
            reason: "patterns contain no literal text and would match every entity".to_string(),
        });
    }

    let options = generator_options(patterns);
    let best = options
        .into_iter()
        .min_by_key(|g| g.cost_hint)
        .ok_or_else(|| CompileError::NoViableGenerator {
            rule_id: rule_id.to_string(),
            reason: format!("no index covers {} rules", patterns.target),
        })?;

    tracing::trace!(
        rule_id,
        target = best.target.as_str(),
        lookup = best.lookup.name(),
        cost = best.cost_hint,
        "generator selected"
    );
    Ok(best)
}

/// Every viable generator, in a fixed order (ties keep the first)
pub fn generator_options(patterns: &RulePatterns) -> Vec<GeneratorExec> {
    let member = (KeyField::Member, &patterns.member);
    let mut options = Vec::with_capacity(2);

    match patterns.target {
        EntityKind::Call => {
            if let Some(base_type) = &patterns.base_type {
                options.push(option(
                    IndexTarget::TypeCall,
                    &[(KeyField::BaseType, base_type), member],
                    true,
                    None,
                ));
            }
            options.push(option(
                IndexTarget::Call,
                &[member],
                false,
                patterns.base_type.as_ref(),
            ));
        }
        EntityKind::Read => match &patterns.base_type {
            Some(base_type) => options.push(option(
                IndexTarget::TypeRead,
                &[(KeyField::BaseType, base_type), member],
                true,
                None,
            )),
            // Untyped reads are not indexed; scan read keys on the member only
            None => options.push(option(IndexTarget::TypeRead, &[member], false, None)),
        },
    }

    options
}

fn option(
    target: IndexTarget,
    components: &[(KeyField, &CompiledPattern)],
    filters_base_type: bool,
    residual_base_type: Option<&CompiledPattern>,
) -> GeneratorExec {
    // A typed index reached with only the member pattern must scan its keys
    let member_only_typed = target != IndexTarget::Call && components.len() == 1;
    let lookup = if member_only_typed {
        scan_lookup(components)
    } else {
        lookup_for(components)
    };

    let eval: u32 = components.iter().map(|(_, p)| p.kind().eval_cost()).sum();
    let (mut cost_hint, estimated_candidates) = match (&lookup, target) {
        (Lookup::Exact, IndexTarget::Call) => (EXACT_CALL_COST, EXACT_CALL_ESTIMATE),
        (Lookup::Exact, _) => (EXACT_TYPED_COST, EXACT_TYPED_ESTIMATE),
        (Lookup::LiteralScan { .. }, _) => (LITERAL_SCAN_COST + eval, LITERAL_SCAN_ESTIMATE),
        (Lookup::KeyScan, _) => (KEY_SCAN_COST + eval, KEY_SCAN_ESTIMATE),
    };
    if let Some(base_type) = residual_base_type {
        cost_hint += 1 + base_type.kind().eval_cost();
    }

    let scans_general = lookup != Lookup::Exact
        && components
            .iter()
            .any(|(_, p)| *p.kind() == PatternKind::General);

    GeneratorExec {
        target,
        lookup,
        filters_base_type,
        cost_hint,
        estimated_candidates,
        expected_cache_hit_rate: if scans_general { GENERAL_HIT_RATE } else { 1.0 },
    }
}

fn lookup_for(components: &[(KeyField, &CompiledPattern)]) -> Lookup {
    if components.iter().all(|(_, p)| p.is_exact()) {
        Lookup::Exact
    } else {
        scan_lookup(components)
    }
}

/// Literal-anchored scan when a general pattern carries a literal, else a key scan
fn scan_lookup(components: &[(KeyField, &CompiledPattern)]) -> Lookup {
    let anchor = components
        .iter()
        .filter(|(_, p)| *p.kind() == PatternKind::General)
        .filter_map(|(field, p)| p.longest_literal(true).map(|lit| (*field, lit)))
        .fold(None, |best: Option<(KeyField, &str)>, (field, lit)| match best {
            Some((_, b)) if b.len() >= lit.len() => best,
            _ => Some((field, lit)),
        });

    match anchor {
        Some((field, anchor)) => Lookup::LiteralScan {
            field,
            anchor: anchor.to_string(),
        },
        None => Lookup::KeyScan,
    }
}
