//! Configuration I/O
//!
//! YAML schema types. Loading and export live on `TrcrConfig`.

use super::stage_configs::{ConfidenceConfig, RuntimeConfig, TierConfig};
use serde::{Deserialize, Serialize};

/// Supported schema versions
pub const SUPPORTED_VERSIONS: &[u32] = &[1];

/// YAML Schema v1
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigExportV1 {
    /// Schema version (always 1 for v1)
    pub version: u32,

    /// Base preset
    pub preset: String,

    /// Section overrides
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overrides: Option<ConfigOverrides>,
}

/// Section overrides. Fields a section omits keep the base preset's values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tiers: Option<TierConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<ConfidenceConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime: Option<RuntimeConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::error::ConfigError;
    use crate::config::{Preset, TrcrConfig};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(content: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();
        temp_file
    }

    #[test]
    fn test_yaml_export() {
        let config = TrcrConfig::preset(Preset::Balanced).runtime(|c| c.max_candidates_per_rule(500));

        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("version: 1"));
        assert!(yaml.contains("preset: balanced"));
        assert!(yaml.contains("max_candidates_per_rule: 500"));
    }

    #[test]
    fn test_yaml_loading() {
        let temp_file = write_temp(
            r#"
version: 1
preset: fast
overrides:
  runtime:
    max_candidates_per_rule: 250
    case_sensitive: true
  confidence:
    min_report_threshold: 0.6
"#,
        );

        let config = TrcrConfig::from_yaml(temp_file.path()).unwrap();
        assert_eq!(config.runtime().max_candidates_per_rule, 250);
        assert!(config.runtime().case_sensitive);
        assert_eq!(config.confidence().min_report_threshold, 0.6);
        // Omitted fields keep the fast preset's values
        assert_eq!(config.tiers().tier2_confidence, 0.85);
        assert_eq!(config.runtime().max_execution_time_ms, 100);
        assert_eq!(config.confidence().guard_multiplier, 0.9);
    }

    #[test]
    fn test_yaml_missing_version() {
        let temp_file = write_temp("preset: fast\n");
        assert!(TrcrConfig::from_yaml(temp_file.path()).is_err());
    }

    #[test]
    fn test_yaml_unsupported_version() {
        let temp_file = write_temp("version: 2\npreset: fast\n");
        let result = TrcrConfig::from_yaml(temp_file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::UnsupportedVersion { .. }));
    }

    #[test]
    fn test_yaml_unknown_field_rejected() {
        let result = TrcrConfig::from_yaml_str(
            r#"
version: 1
preset: balanced
overrides:
  scoring:
    foo: 1
"#,
        );
        assert!(matches!(result.unwrap_err(), ConfigError::Yaml(_)));
    }

    #[test]
    fn test_yaml_misspelled_section_key_rejected() {
        let typos = [
            "tiers:\n    tier1_confidense",
            "confidence:\n    guard_multipler",
            "runtime:\n    max_candidate_per_rule",
        ];
        for section in typos {
            let yaml = format!("version: 1\npreset: balanced\noverrides:\n  {}: 0.5\n", section);
            let result = TrcrConfig::from_yaml_str(&yaml);
            assert!(matches!(result, Err(ConfigError::Yaml(_))), "accepted: {}", section);
        }
    }

    #[test]
    fn test_yaml_unknown_preset() {
        let result = TrcrConfig::from_yaml_str("version: 1\npreset: paranoid\n");
        assert!(matches!(result.unwrap_err(), ConfigError::UnknownPreset(_)));
    }

    #[test]
    fn test_yaml_invalid_override_rejected() {
        let result = TrcrConfig::from_yaml_str(
            r#"
version: 1
preset: balanced
overrides:
  runtime:
    max_candidates_per_rule: 0
"#,
        );
        assert!(matches!(result.unwrap_err(), ConfigError::Range { .. }));
    }
}
