//! Merge rules: defaults, override order, conflict handling.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
///
/// Only scalar settings are seeded here; list-valued defaults come from the
/// serde defaults of each section.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("scan.attribute", "exports")?
        .set_default("scan.concurrent", false)?
        .set_default("scan.max_in_flight", 16_i64)?
        .set_default("merge.default_strategy", "auto")?
        .set_default("naming.fragment_suffix", ".d")?
        .set_default("naming.escape_suffix", "_")?
        .set_default("logging.enabled", false)
}
