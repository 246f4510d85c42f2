//! Specificity and confidence scoring

use super::error::{CompileError, CompileResult};
use super::ir::{Confidence, PatternType, RulePatterns, Specificity, Tier};
use crate::config::{ConfidenceConfig, TierConfig};

/// Float slack tolerated at the `[0, 1]` bounds before a confidence is rejected
const CONFIDENCE_EPSILON: f64 = 1e-9;

/// `specificity_base(tier) - wildcard_penalty * wildcards + literal_bonus * literals`
pub fn specificity(tier: Tier, patterns: &RulePatterns, tiers: &TierConfig) -> Specificity {
    let wildcard_count = patterns.wildcard_count();
    let literal_length = patterns.literal_length();

    let base = match tier {
        Tier::Tier1 => tiers.tier1_specificity,
        Tier::Tier2 => tiers.tier2_specificity,
        Tier::Tier3 => tiers.tier3_specificity,
    };

    Specificity {
        final_score: base - tiers.wildcard_penalty * wildcard_count as f64
            + tiers.literal_bonus * literal_length as f64,
        wildcard_count,
        literal_length,
    }
}

pub fn base_confidence(tier: Tier, tiers: &TierConfig) -> f64 {
    match tier {
        Tier::Tier1 => tiers.tier1_confidence,
        Tier::Tier2 => tiers.tier2_confidence,
        Tier::Tier3 => tiers.tier3_confidence,
    }
}

/// Signed adjustment for a pattern type within its tier
pub fn tier_adjustment(tier: Tier, pattern_type: PatternType, confidence: &ConfidenceConfig) -> f64 {
    match (tier, pattern_type) {
        (Tier::Tier2, PatternType::Suffix) => confidence.tier2_suffix_bonus,
        (Tier::Tier2, PatternType::Prefix) => confidence.tier2_prefix_bonus,
        (Tier::Tier2, PatternType::Contains) => confidence.tier2_contains_bonus,
        (Tier::Tier3, PatternType::Trigram) => -confidence.tier3_trigram_penalty,
        (Tier::Tier3, PatternType::Fallback) => -confidence.tier3_fallback_penalty,
        _ => 0.0,
    }
}

/// `base(tier) + adjustment(tier, pattern_type)`; outside `[0, 1]` is an error
pub fn confidence(
    rule_id: &str,
    tier: Tier,
    pattern_type: PatternType,
    tiers: &TierConfig,
    adjustments: &ConfidenceConfig,
) -> CompileResult<Confidence> {
    let base = base_confidence(tier, tiers);
    let adjustment = tier_adjustment(tier, pattern_type, adjustments);
    let raw = base + adjustment;

    if raw.is_nan() || raw < -CONFIDENCE_EPSILON || raw > 1.0 + CONFIDENCE_EPSILON {
        return Err(CompileError::ConfidenceOutOfRange {
            rule_id: rule_id.to_string(),
            value: raw,
            base,
            adjustment,
        });
    }

    Ok(Confidence {
        base,
        adjustment,
        value: raw.clamp(0.0, 1.0),
        min_report_threshold: adjustments.min_report_threshold,
    })
}
