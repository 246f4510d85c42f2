//! Compiler/runtime configuration builder
//!
//! ```text
//! TrcrConfig::preset(Preset::Fast)          // Level 1: preset
//!     .runtime(|c| c.case_sensitive(true))  // Level 2: section override
//!     .build()?                             // validate -> ValidatedConfig
//! ```

use super::error::{ConfigError, ConfigResult};
use super::io::{ConfigExportV1, ConfigOverrides, SUPPORTED_VERSIONS};
use super::preset::Preset;
use super::provenance::{ConfigProvenance, ConfigSource};
use super::stage_configs::{ConfidenceConfig, RuntimeConfig, TierConfig};
use super::validation::validate_sections;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

/// Configuration builder
#[derive(Debug, Clone)]
pub struct TrcrConfig {
    pub(crate) preset: Preset,
    pub(crate) tiers: TierConfig,
    pub(crate) confidence: ConfidenceConfig,
    pub(crate) runtime: RuntimeConfig,
    pub(crate) provenance: ConfigProvenance,
}

impl TrcrConfig {
    /// Level 1: Create from preset
    pub fn preset(preset: Preset) -> Self {
        Self {
            preset,
            tiers: TierConfig::from_preset(preset),
            confidence: ConfidenceConfig::from_preset(preset),
            runtime: RuntimeConfig::from_preset(preset),
            provenance: ConfigProvenance::from_preset(preset),
        }
    }

    /// Level 2: Override tier scoring
    pub fn tiers<F>(mut self, f: F) -> Self
    where
        F: FnOnce(TierConfig) -> TierConfig,
    {
        self.tiers = f(self.tiers);
        self.provenance.track_field("tiers.*", ConfigSource::Builder);
        self
    }

    /// Level 2: Override confidence adjustments
    pub fn confidence<F>(mut self, f: F) -> Self
    where
        F: FnOnce(ConfidenceConfig) -> ConfidenceConfig,
    {
        self.confidence = f(self.confidence);
        self.provenance.track_field("confidence.*", ConfigSource::Builder);
        self
    }

    /// Level 2: Override runtime bounds
    pub fn runtime<F>(mut self, f: F) -> Self
    where
        F: FnOnce(RuntimeConfig) -> RuntimeConfig,
    {
        self.runtime = f(self.runtime);
        self.provenance.track_field("runtime.*", ConfigSource::Builder);
        self
    }

    /// Build and validate
    pub fn build(self) -> ConfigResult<ValidatedConfig> {
        validate_sections(&[&self.tiers, &self.confidence, &self.runtime])?;

        tracing::debug!(
            preset = %self.preset,
            max_candidates = self.runtime.max_candidates_per_rule,
            budget_ms = self.runtime.max_execution_time_ms,
            threshold = self.confidence.min_report_threshold,
            "configuration validated"
        );

        Ok(ValidatedConfig(self))
    }

    pub fn get_preset(&self) -> Preset {
        self.preset
    }

    pub fn provenance(&self) -> &ConfigProvenance {
        &self.provenance
    }

    /// Load from YAML file (v1 schema)
    pub fn from_yaml(path: impl AsRef<Path>) -> ConfigResult<ValidatedConfig> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::parse_yaml(&content, &path.display().to_string())
    }

    /// Load from an in-memory YAML document (v1 schema)
    pub fn from_yaml_str(content: &str) -> ConfigResult<ValidatedConfig> {
        Self::parse_yaml(content, "<inline>")
    }

    fn parse_yaml(content: &str, origin: &str) -> ConfigResult<ValidatedConfig> {
        let document: serde_yaml::Value = serde_yaml::from_str(content)?;
        let export: ConfigExportV1 = serde_yaml::from_value(document.clone())?;

        if !SUPPORTED_VERSIONS.contains(&export.version) {
            return Err(ConfigError::UnsupportedVersion {
                found: export.version,
                supported: SUPPORTED_VERSIONS.to_vec(),
            });
        }

        let preset: Preset = export.preset.parse()?;

        let mut config = Self::preset(preset);
        let source = || ConfigSource::Yaml {
            path: origin.to_string(),
        };

        // Keys given in a section replace the preset's values; omitted keys keep them
        if let Some(overrides) = export.overrides {
            let section = |name: &str| document.get("overrides").and_then(|o| o.get(name));
            if overrides.tiers.is_some() {
                config.tiers = overlay(&config.tiers, section("tiers"))?;
                config.provenance.track_field("tiers.*", source());
            }
            if overrides.confidence.is_some() {
                config.confidence = overlay(&config.confidence, section("confidence"))?;
                config.provenance.track_field("confidence.*", source());
            }
            if overrides.runtime.is_some() {
                config.runtime = overlay(&config.runtime, section("runtime"))?;
                config.provenance.track_field("runtime.*", source());
            }
        }

        config.build()
    }

    /// Export to YAML
    pub fn to_yaml(&self) -> ConfigResult<String> {
        let export = ConfigExportV1 {
            version: 1,
            preset: self.preset.to_string(),
            overrides: Some(ConfigOverrides {
                tiers: Some(self.tiers.clone()),
                confidence: Some(self.confidence.clone()),
                runtime: Some(self.runtime.clone()),
            }),
        };

        Ok(serde_yaml::to_string(&export)?)
    }

    /// Human-readable one-line description
    pub fn describe(&self) -> String {
        format!(
            "{} [candidates<={}, budget={}ms, report>={}, case_sensitive={}]",
            self.preset,
            self.runtime.max_candidates_per_rule,
            self.runtime.max_execution_time_ms,
            self.confidence.min_report_threshold,
            self.runtime.case_sensitive
        )
    }
}

impl Default for TrcrConfig {
    fn default() -> Self {
        Self::preset(Preset::Balanced)
    }
}

/// Validated configuration (immutable, safe to use)
#[derive(Debug, Clone)]
pub struct ValidatedConfig(TrcrConfig);

impl ValidatedConfig {
    pub fn into_inner(self) -> TrcrConfig {
        self.0
    }

    pub fn as_inner(&self) -> &TrcrConfig {
        &self.0
    }

    pub fn preset(&self) -> Preset {
        self.0.preset
    }

    pub fn tiers(&self) -> &TierConfig {
        &self.0.tiers
    }

    pub fn confidence(&self) -> &ConfidenceConfig {
        &self.0.confidence
    }

    pub fn runtime(&self) -> &RuntimeConfig {
        &self.0.runtime
    }

    /// Per-rule time budget
    pub fn execution_budget(&self) -> Duration {
        Duration::from_millis(self.0.runtime.max_execution_time_ms)
    }

    /// Index reuse window (zero disables reuse)
    pub fn index_cache_ttl(&self) -> Duration {
        Duration::from_millis(self.0.runtime.index_cache_ttl_ms)
    }

    pub fn describe(&self) -> String {
        self.0.describe()
    }

    pub fn provenance_summary(&self) -> String {
        self.0.provenance.summary()
    }

    pub fn to_yaml(&self) -> ConfigResult<String> {
        self.0.to_yaml()
    }
}

impl Default for ValidatedConfig {
    /// Balanced defaults always validate
    fn default() -> Self {
        ValidatedConfig(TrcrConfig::default())
    }
}

/// Lay the keys of a YAML section over `base`
fn overlay<T>(base: &T, section: Option<&serde_yaml::Value>) -> ConfigResult<T>
where
    T: Serialize + DeserializeOwned,
{
    let mut merged = serde_yaml::to_value(base)?;
    if let (serde_yaml::Value::Mapping(target), Some(serde_yaml::Value::Mapping(patch))) =
        (&mut merged, section)
    {
        for (key, value) in patch {
            target.insert(key.clone(), value.clone());
        }
    }
    Ok(serde_yaml::from_value(merged)?)
}
