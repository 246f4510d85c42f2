//! Section configuration types
//!
//! Each section has its own struct with preset defaults, builder setters and
//! validation. All sections are immutable once wrapped in a `ValidatedConfig`.

use super::error::{check_unit_range, ConfigError, ConfigResult};
use super::preset::Preset;
use super::validation::Validatable;
use serde::{Deserialize, Serialize};

// ============================================================================
// Tier scoring
// ============================================================================

/// Per-tier base confidence and specificity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TierConfig {
    /// Tier 1 (exact) base confidence (0.0..=1.0)
    pub tier1_confidence: f64,
    /// Tier 2 (single wildcard) base confidence
    pub tier2_confidence: f64,
    /// Tier 3 (fuzzy/fallback) base confidence
    pub tier3_confidence: f64,

    /// Specificity base per tier
    pub tier1_specificity: f64,
    pub tier2_specificity: f64,
    pub tier3_specificity: f64,

    /// Subtracted per wildcard character
    pub wildcard_penalty: f64,
    /// Added per literal character
    pub literal_bonus: f64,
}

impl TierConfig {
    pub fn from_preset(_preset: Preset) -> Self {
        // Scoring is preset-independent; presets only move runtime bounds
        Self {
            tier1_confidence: 1.0,
            tier2_confidence: 0.85,
            tier3_confidence: 0.6,
            tier1_specificity: 100.0,
            tier2_specificity: 80.0,
            tier3_specificity: 50.0,
            wildcard_penalty: 10.0,
            literal_bonus: 0.5,
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        for (field, value) in [
            ("tier1_confidence", self.tier1_confidence),
            ("tier2_confidence", self.tier2_confidence),
            ("tier3_confidence", self.tier3_confidence),
        ] {
            check_unit_range(field, value, 0.0, 1.0, "Base confidence is a probability")?;
        }

        if !(self.tier1_confidence >= self.tier2_confidence
            && self.tier2_confidence >= self.tier3_confidence)
        {
            return Err(ConfigError::ordering(
                format!(
                    "tier confidences {} / {} / {} are not monotonic",
                    self.tier1_confidence, self.tier2_confidence, self.tier3_confidence
                ),
                "keep tier1_confidence >= tier2_confidence >= tier3_confidence",
            ));
        }

        for (field, value) in [
            ("tier1_specificity", self.tier1_specificity),
            ("tier2_specificity", self.tier2_specificity),
            ("tier3_specificity", self.tier3_specificity),
        ] {
            check_unit_range(field, value, 0.0, 10_000.0, "Specificity base must be non-negative")?;
        }

        if !(self.tier1_specificity >= self.tier2_specificity
            && self.tier2_specificity >= self.tier3_specificity)
        {
            return Err(ConfigError::ordering(
                "tier specificity bases are not monotonic",
                "keep tier1_specificity >= tier2_specificity >= tier3_specificity",
            ));
        }

        check_unit_range("wildcard_penalty", self.wildcard_penalty, 0.0, 1_000.0, "Penalty must be non-negative")?;
        check_unit_range("literal_bonus", self.literal_bonus, 0.0, 100.0, "Bonus must be non-negative")?;

        Ok(())
    }

    /// Builder: Set tier base confidences
    pub fn confidences(mut self, tier1: f64, tier2: f64, tier3: f64) -> Self {
        self.tier1_confidence = tier1;
        self.tier2_confidence = tier2;
        self.tier3_confidence = tier3;
        self
    }

    /// Builder: Set tier specificity bases
    pub fn specificities(mut self, tier1: f64, tier2: f64, tier3: f64) -> Self {
        self.tier1_specificity = tier1;
        self.tier2_specificity = tier2;
        self.tier3_specificity = tier3;
        self
    }

    /// Builder: Set wildcard_penalty
    pub fn wildcard_penalty(mut self, v: f64) -> Self {
        self.wildcard_penalty = v;
        self
    }

    /// Builder: Set literal_bonus
    pub fn literal_bonus(mut self, v: f64) -> Self {
        self.literal_bonus = v;
        self
    }
}

impl Default for TierConfig {
    fn default() -> Self {
        Self::from_preset(Preset::Balanced)
    }
}

impl Validatable for TierConfig {
    fn validate(&self) -> ConfigResult<()> {
        TierConfig::validate(self)
    }

    fn config_name(&self) -> &'static str {
        "TierConfig"
    }
}

// ============================================================================
// Confidence adjustments and reporting
// ============================================================================

/// Pattern-type adjustments, reporting threshold and guard scaling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfidenceConfig {
    /// Tier 2 `*.Foo` adjustment
    pub tier2_suffix_bonus: f64,
    /// Tier 2 `Foo.*` adjustment
    pub tier2_prefix_bonus: f64,
    /// Tier 2 `*Foo*` adjustment
    pub tier2_contains_bonus: f64,
    /// Tier 3 declared `trigram` strategy (subtracted)
    pub tier3_trigram_penalty: f64,
    /// Tier 3 fallback (subtracted)
    pub tier3_fallback_penalty: f64,

    /// Matches below this are discarded (0.0..=1.0)
    pub min_report_threshold: f64,

    /// Confidence multiplier for matches relying on guarded evidence (0.0 exclusive..=1.0)
    pub guard_multiplier: f64,
}

impl ConfidenceConfig {
    pub fn from_preset(preset: Preset) -> Self {
        Self {
            tier2_suffix_bonus: 0.05,
            tier2_prefix_bonus: 0.03,
            tier2_contains_bonus: 0.0,
            tier3_trigram_penalty: 0.1,
            tier3_fallback_penalty: 0.2,
            min_report_threshold: preset.report_threshold(),
            guard_multiplier: 0.9,
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        for (field, value) in [
            ("tier2_suffix_bonus", self.tier2_suffix_bonus),
            ("tier2_prefix_bonus", self.tier2_prefix_bonus),
            ("tier2_contains_bonus", self.tier2_contains_bonus),
            ("tier3_trigram_penalty", self.tier3_trigram_penalty),
            ("tier3_fallback_penalty", self.tier3_fallback_penalty),
        ] {
            check_unit_range(field, value, 0.0, 1.0, "Adjustments are magnitudes in [0, 1]")?;
        }

        check_unit_range(
            "min_report_threshold",
            self.min_report_threshold,
            0.0,
            1.0,
            "Reporting threshold is a probability",
        )?;

        if self.guard_multiplier.is_nan() || self.guard_multiplier <= 0.0 || self.guard_multiplier > 1.0 {
            return Err(ConfigError::range_with_hint(
                "guard_multiplier",
                self.guard_multiplier,
                "0 (exclusive)",
                1.0,
                "Guarded evidence can only lower confidence",
            ));
        }

        Ok(())
    }

    /// Builder: Set min_report_threshold
    pub fn min_report_threshold(mut self, v: f64) -> Self {
        self.min_report_threshold = v;
        self
    }

    /// Builder: Set guard_multiplier
    pub fn guard_multiplier(mut self, v: f64) -> Self {
        self.guard_multiplier = v;
        self
    }

    /// Builder: Set Tier 2 shape bonuses (suffix, prefix, contains)
    pub fn tier2_bonuses(mut self, suffix: f64, prefix: f64, contains: f64) -> Self {
        self.tier2_suffix_bonus = suffix;
        self.tier2_prefix_bonus = prefix;
        self.tier2_contains_bonus = contains;
        self
    }

    /// Builder: Set Tier 3 penalties (trigram, fallback)
    pub fn tier3_penalties(mut self, trigram: f64, fallback: f64) -> Self {
        self.tier3_trigram_penalty = trigram;
        self.tier3_fallback_penalty = fallback;
        self
    }
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self::from_preset(Preset::Balanced)
    }
}

impl Validatable for ConfidenceConfig {
    fn validate(&self) -> ConfigResult<()> {
        ConfidenceConfig::validate(self)
    }

    fn config_name(&self) -> &'static str {
        "ConfidenceConfig"
    }
}

// ============================================================================
// Runtime bounds
// ============================================================================

/// Execution bounds and performance tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Candidates kept per rule before deterministic truncation (1..=10_000_000)
    pub max_candidates_per_rule: usize,

    /// Soft per-rule time budget in ms (0..=3_600_000; 0 expires immediately)
    pub max_execution_time_ms: u64,

    /// Compiled-pattern LRU capacity (1..=1_000_000)
    pub pattern_cache_size: usize,

    /// Reuse window for an unchanged batch's index in ms (0 disables reuse)
    pub index_cache_ttl_ms: u64,

    /// Case-sensitive pattern matching and index keys
    pub case_sensitive: bool,

    /// Report at most N matches per entity, in rule order (None = all)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_matches_per_entity: Option<usize>,

    /// Run independent batches in parallel
    pub parallel_batches: bool,
}

impl RuntimeConfig {
    pub fn from_preset(preset: Preset) -> Self {
        let (max_candidates_per_rule, max_execution_time_ms) = preset.runtime_bounds();

        Self {
            max_candidates_per_rule,
            max_execution_time_ms,
            pattern_cache_size: 1_000,
            index_cache_ttl_ms: 60_000,
            case_sensitive: false,
            max_matches_per_entity: None,
            parallel_batches: true,
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_candidates_per_rule == 0 || self.max_candidates_per_rule > 10_000_000 {
            return Err(ConfigError::range_with_hint(
                "max_candidates_per_rule",
                self.max_candidates_per_rule,
                1,
                10_000_000,
                "Candidate bound must be positive",
            ));
        }

        if self.max_execution_time_ms > 3_600_000 {
            return Err(ConfigError::range_with_hint(
                "max_execution_time_ms",
                self.max_execution_time_ms,
                0,
                3_600_000,
                "Per-rule budget should be at most 1 hour",
            ));
        }

        if self.pattern_cache_size == 0 || self.pattern_cache_size > 1_000_000 {
            return Err(ConfigError::range_with_hint(
                "pattern_cache_size",
                self.pattern_cache_size,
                1,
                1_000_000,
                "Pattern cache needs at least one slot",
            ));
        }

        if self.index_cache_ttl_ms > 86_400_000 {
            return Err(ConfigError::range_with_hint(
                "index_cache_ttl_ms",
                self.index_cache_ttl_ms,
                0,
                86_400_000,
                "Index reuse window should be at most one day",
            ));
        }

        if self.max_matches_per_entity == Some(0) {
            return Err(ConfigError::Validation(
                "max_matches_per_entity must be at least 1 (omit it to report all matches)"
                    .to_string(),
            ));
        }

        Ok(())
    }

    /// Builder: Set max_candidates_per_rule
    pub fn max_candidates_per_rule(mut self, v: usize) -> Self {
        self.max_candidates_per_rule = v;
        self
    }

    /// Builder: Set max_execution_time_ms
    pub fn max_execution_time_ms(mut self, v: u64) -> Self {
        self.max_execution_time_ms = v;
        self
    }

    /// Builder: Set pattern_cache_size
    pub fn pattern_cache_size(mut self, v: usize) -> Self {
        self.pattern_cache_size = v;
        self
    }

    /// Builder: Set index_cache_ttl_ms
    pub fn index_cache_ttl_ms(mut self, v: u64) -> Self {
        self.index_cache_ttl_ms = v;
        self
    }

    /// Builder: Set case_sensitive
    pub fn case_sensitive(mut self, v: bool) -> Self {
        self.case_sensitive = v;
        self
    }

    /// Builder: Set max_matches_per_entity
    pub fn max_matches_per_entity(mut self, v: Option<usize>) -> Self {
        self.max_matches_per_entity = v;
        self
    }

    /// Builder: Set parallel_batches
    pub fn parallel_batches(mut self, v: bool) -> Self {
        self.parallel_batches = v;
        self
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::from_preset(Preset::Balanced)
    }
}

impl Validatable for RuntimeConfig {
    fn validate(&self) -> ConfigResult<()> {
        RuntimeConfig::validate(self)
    }

    fn config_name(&self) -> &'static str {
        "RuntimeConfig"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_defaults_monotonic() {
        let tiers = TierConfig::default();
        assert!(tiers.validate().is_ok());
        assert!(tiers.tier1_confidence >= tiers.tier2_confidence);
        assert!(tiers.tier2_confidence >= tiers.tier3_confidence);
        assert_eq!(tiers.tier2_confidence, 0.85);
        assert_eq!(tiers.tier1_specificity, 100.0);
    }

    #[test]
    fn test_tier_rejects_non_monotonic() {
        let tiers = TierConfig::default().confidences(0.8, 0.9, 0.6);
        assert!(matches!(tiers.validate(), Err(ConfigError::Ordering { .. })));

        let tiers = TierConfig::default().specificities(50.0, 80.0, 10.0);
        assert!(matches!(tiers.validate(), Err(ConfigError::Ordering { .. })));
    }

    #[test]
    fn test_tier_rejects_out_of_range() {
        let tiers = TierConfig::default().confidences(1.2, 0.85, 0.6);
        assert!(matches!(tiers.validate(), Err(ConfigError::Range { .. })));

        let tiers = TierConfig::default().wildcard_penalty(-1.0);
        assert!(tiers.validate().is_err());
    }

    #[test]
    fn test_confidence_presets() {
        assert_eq!(ConfidenceConfig::from_preset(Preset::Fast).min_report_threshold, 0.8);
        assert_eq!(ConfidenceConfig::from_preset(Preset::Balanced).min_report_threshold, 0.7);
        assert_eq!(ConfidenceConfig::from_preset(Preset::Thorough).min_report_threshold, 0.5);
    }

    #[test]
    fn test_confidence_validation() {
        assert!(ConfidenceConfig::default().validate().is_ok());
        assert!(ConfidenceConfig::default().guard_multiplier(0.0).validate().is_err());
        assert!(ConfidenceConfig::default().min_report_threshold(1.01).validate().is_err());
        assert!(ConfidenceConfig::default().tier3_penalties(-0.1, 0.2).validate().is_err());
    }

    #[test]
    fn test_runtime_defaults() {
        let runtime = RuntimeConfig::default();
        assert_eq!(runtime.max_candidates_per_rule, 10_000);
        assert_eq!(runtime.max_execution_time_ms, 1_000);
        assert_eq!(runtime.pattern_cache_size, 1_000);
        assert_eq!(runtime.index_cache_ttl_ms, 60_000);
        assert!(!runtime.case_sensitive);
        assert!(runtime.validate().is_ok());
    }

    #[test]
    fn test_runtime_validation() {
        assert!(RuntimeConfig::default().max_candidates_per_rule(0).validate().is_err());
        assert!(RuntimeConfig::default().pattern_cache_size(0).validate().is_err());
        assert!(RuntimeConfig::default().max_matches_per_entity(Some(0)).validate().is_err());
        assert!(RuntimeConfig::default().max_execution_time_ms(0).validate().is_ok());
    }

    #[test]
    fn test_runtime_builder() {
        let runtime = RuntimeConfig::from_preset(Preset::Fast)
            .max_candidates_per_rule(50)
            .max_matches_per_entity(Some(1));
        assert_eq!(runtime.max_candidates_per_rule, 50);
        assert_eq!(runtime.max_execution_time_ms, 100);
        assert_eq!(runtime.max_matches_per_entity, Some(1));
    }
}
