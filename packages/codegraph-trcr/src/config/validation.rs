//! Configuration validation

use super::error::ConfigResult;

/// Trait for validatable configuration objects
pub trait Validatable {
    /// Returns `Ok(())` if valid, `Err(ConfigError)` with details if invalid.
    fn validate(&self) -> ConfigResult<()>;

    /// Configuration name for error messages and logs
    fn config_name(&self) -> &'static str {
        "Config"
    }
}

/// Validate sections in order, stopping at the first failure
pub fn validate_sections(sections: &[&dyn Validatable]) -> ConfigResult<()> {
    for section in sections {
        if let Err(e) = section.validate() {
            tracing::warn!(section = section.config_name(), error = %e, "configuration rejected");
            return Err(e);
        }
    }
    Ok(())
}
