//! Configuration error types

use thiserror::Error;

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Range validation error
    #[error("Invalid range for field '{field}': {value} not in {min}..={max}. {hint}")]
    Range {
        field: String,
        value: String,
        min: String,
        max: String,
        hint: String,
    },

    /// Ordering between related fields violated (e.g. tier monotonicity)
    #[error("Invalid ordering: {issue}. Fix: {fix}")]
    Ordering { issue: String, fix: String },

    /// Unsupported version
    #[error("Unsupported configuration version {found}. Supported versions: {}", supported.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", "))]
    UnsupportedVersion { found: u32, supported: Vec<u32> },

    /// Unknown preset name
    #[error("Unknown preset '{0}'. Valid presets: fast, balanced, thorough, custom")]
    UnknownPreset(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Configuration result type
pub type ConfigResult<T> = Result<T, ConfigError>;

impl ConfigError {
    /// Create a range error with a hint
    pub fn range_with_hint(
        field: impl Into<String>,
        value: impl ToString,
        min: impl ToString,
        max: impl ToString,
        hint: impl Into<String>,
    ) -> Self {
        Self::Range {
            field: field.into(),
            value: value.to_string(),
            min: min.to_string(),
            max: max.to_string(),
            hint: hint.into(),
        }
    }

    pub fn ordering(issue: impl Into<String>, fix: impl Into<String>) -> Self {
        Self::Ordering {
            issue: issue.into(),
            fix: fix.into(),
        }
    }
}

/// `[min, max]` check for float fields (NaN is out of range)
pub(crate) fn check_unit_range(field: &str, value: f64, min: f64, max: f64, hint: &str) -> ConfigResult<()> {
    if value.is_nan() || value < min || value > max {
        return Err(ConfigError::range_with_hint(field, value, min, max, hint));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_error_message() {
        let err = ConfigError::range_with_hint("min_report_threshold", 1.5, 0.0, 1.0, "Must be a probability");
        let msg = err.to_string();
        assert!(msg.contains("min_report_threshold"));
        assert!(msg.contains("1.5"));
        assert!(msg.contains("Must be a probability"));
    }

    #[test]
    fn test_unsupported_version_message() {
        let err = ConfigError::UnsupportedVersion {
            found: 2,
            supported: vec![1],
        };
        assert!(err.to_string().contains("Supported versions: 1"));
    }

    #[test]
    fn test_nan_out_of_range() {
        assert!(check_unit_range("x", f64::NAN, 0.0, 1.0, "").is_err());
        assert!(check_unit_range("x", 0.5, 0.0, 1.0, "").is_ok());
    }
}
