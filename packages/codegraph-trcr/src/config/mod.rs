//! Configuration
//!
//! Three levels, each optional:
//! 1. Preset (`fast`, `balanced`, `thorough`)
//! 2. Section overrides through builder closures
//! 3. YAML v1 documents with `overrides.{tiers,confidence,runtime}`
//!
//! Every path ends in `build()`, which validates ranges and tier ordering and
//! returns an immutable `ValidatedConfig`.

pub mod error;
pub mod io;
pub mod preset;
pub mod provenance;
pub mod stage_configs;
pub mod trcr_config;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use io::{ConfigExportV1, ConfigOverrides};
pub use preset::Preset;
pub use provenance::{ConfigProvenance, ConfigSource};
pub use stage_configs::{ConfidenceConfig, RuntimeConfig, TierConfig};
pub use trcr_config::{TrcrConfig, ValidatedConfig};
pub use validation::Validatable;
