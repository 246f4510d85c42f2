//! Scan presets
//!
//! A preset fixes the runtime bounds and the reporting threshold. Scoring
//! constants (tier bases, penalties, bonuses) are the same for every preset.
//!
//! | preset   | candidates/rule | budget/rule | report >= |
//! |----------|-----------------|-------------|-----------|
//! | fast     | 1,000           | 100 ms      | 0.8       |
//! | balanced | 10,000          | 1,000 ms    | 0.7       |
//! | thorough | 100,000         | 10,000 ms   | 0.5       |

use super::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// Editor/CI feedback loop: Tier 1 and strong Tier 2 only
    Fast,
    #[default]
    Balanced,
    /// Security audit: Tier 3 matches surface
    Thorough,
    /// User-defined (YAML or builder); starts from balanced values
    Custom,
}

impl Preset {
    pub const ALL: [Preset; 4] = [Preset::Fast, Preset::Balanced, Preset::Thorough, Preset::Custom];

    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::Fast => "fast",
            Preset::Balanced => "balanced",
            Preset::Thorough => "thorough",
            Preset::Custom => "custom",
        }
    }

    /// `(max_candidates_per_rule, max_execution_time_ms)`
    pub fn runtime_bounds(&self) -> (usize, u64) {
        match self {
            Preset::Fast => (1_000, 100),
            Preset::Balanced | Preset::Custom => (10_000, 1_000),
            Preset::Thorough => (100_000, 10_000),
        }
    }

    pub fn report_threshold(&self) -> f64 {
        match self {
            Preset::Fast => 0.8,
            Preset::Balanced | Preset::Custom => 0.7,
            Preset::Thorough => 0.5,
        }
    }
}

impl FromStr for Preset {
    type Err = ConfigError;

    /// Case-insensitive; surrounding whitespace ignored
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Preset::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| ConfigError::UnknownPreset(s.to_string()))
    }
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
