//! Configuration provenance tracking
//!
//! Track where each configuration section came from (preset, YAML, builder)

use super::preset::Preset;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Configuration source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// From preset defaults
    Preset(Preset),

    /// From YAML file (path, or `<inline>` for string input)
    Yaml { path: String },

    /// From builder API
    Builder,
}

impl ConfigSource {
    pub fn describe(&self) -> String {
        match self {
            ConfigSource::Preset(p) => format!("preset:{}", p),
            ConfigSource::Yaml { path } => format!("yaml:{}", path),
            ConfigSource::Builder => "builder".to_string(),
        }
    }
}

/// Section-level provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigProvenance {
    preset: Preset,
    /// "tiers.*" -> source (sorted for stable summaries)
    field_sources: BTreeMap<String, ConfigSource>,
}

impl ConfigProvenance {
    pub fn from_preset(preset: Preset) -> Self {
        Self {
            preset,
            field_sources: BTreeMap::new(),
        }
    }

    pub fn track_field(&mut self, field_path: &str, source: ConfigSource) {
        self.field_sources.insert(field_path.to_string(), source);
    }

    /// Source of a field path; falls back to the preset
    pub fn source_of(&self, field_path: &str) -> ConfigSource {
        self.field_sources
            .get(field_path)
            .cloned()
            .unwrap_or(ConfigSource::Preset(self.preset))
    }

    pub fn preset(&self) -> Preset {
        self.preset
    }

    pub fn summary(&self) -> String {
        let mut lines = vec![format!("Base preset: {}", self.preset)];
        for (field, source) in &self.field_sources {
            lines.push(format!("  {} <- {}", field, source.describe()));
        }
        lines.join("\n")
    }
}
