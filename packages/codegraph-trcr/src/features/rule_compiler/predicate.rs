//! Predicate planning: structural checks ordered cheapest-first

use super::error::{CompileError, CompileResult};
use super::ir::{GeneratorExec, Predicate, PredicateExec, RulePatterns};
use crate::features::pattern_matching::CompiledPattern;
use crate::features::rule_spec::{ArgCheck, ArgConstraint};
use crate::shared::models::EntityKind;

pub fn plan_predicates(
    rule_id: &str,
    patterns: &RulePatterns,
    generator: &GeneratorExec,
    args: &[ArgConstraint],
) -> CompileResult<PredicateExec> {
    let mut steps = Vec::with_capacity(args.len() + 1);

    if let Some(base_type) = &patterns.base_type {
        if !generator.filters_base_type {
            steps.push(Predicate::BaseType {
                pattern: base_type.clone(),
            });
        }
    }

    if !args.is_empty() && patterns.target == EntityKind::Read {
        return Err(CompileError::InvalidArgConstraint {
            rule_id: rule_id.to_string(),
            position: args[0].position,
            reason: "property reads have no arguments".to_string(),
        });
    }

    for constraint in args {
        let position = constraint.position;
        let step = match &constraint.check {
            ArgCheck::Present => Predicate::ArgPresent { position },
            ArgCheck::Const => Predicate::ArgConst { position },
            ArgCheck::NotConst => Predicate::ArgNotConst { position },
            ArgCheck::Matches { pattern } => {
                let pattern = CompiledPattern::parse(pattern).map_err(|e| {
                    CompileError::InvalidArgConstraint {
                        rule_id: rule_id.to_string(),
                        position,
                        reason: e.to_string(),
                    }
                })?;
                Predicate::ArgMatches { position, pattern }
            }
        };

        if let Some(conflict) = steps.iter().find(|s| contradicts(s, &step)) {
            return Err(CompileError::InvalidArgConstraint {
                rule_id: rule_id.to_string(),
                position,
                reason: format!("'{}' contradicts '{}'", step.name(), conflict.name()),
            });
        }
        if !steps.contains(&step) {
            steps.push(step);
        }
    }

    // Stable: equal costs keep declaration order
    steps.sort_by_key(Predicate::cost);

    let total_cost = steps.iter().map(Predicate::cost).sum();
    let best_case_cost = steps.first().map(Predicate::cost).unwrap_or(0);

    Ok(PredicateExec {
        steps,
        total_cost,
        best_case_cost,
    })
}

/// `const` and `not_const` on the same argument can never both hold
fn contradicts(a: &Predicate, b: &Predicate) -> bool {
    matches!(
        (a, b),
        (Predicate::ArgConst { position: x }, Predicate::ArgNotConst { position: y })
            | (Predicate::ArgNotConst { position: x }, Predicate::ArgConst { position: y })
            if x == y
    )
}
