use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub logging: LoggingConfig,
    pub pivot: PivotConfig,
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    pub log_dir: String,
    pub stdout_level: String,
    pub file_level: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PivotConfig {
    /// Build the session key map from the Describe-phase catalog result when one is
    /// available instead of executing the catalog query again at Start.
    #[serde(default = "default_reuse_describe_snapshot")]
    pub reuse_describe_snapshot: bool,
    /// Reject catalog results where two rows encode to the same pivot key.
    #[serde(default)]
    pub reject_duplicate_keys: bool,
    /// Upper bound on the number of output columns a single pivot may declare.
    #[serde(default = "default_max_output_columns")]
    pub max_output_columns: usize,
}

fn default_reuse_describe_snapshot() -> bool {
    true
}

fn default_max_output_columns() -> usize {
    1600
}

impl Default for PivotConfig {
    fn default() -> Self {
        Self {
            reuse_describe_snapshot: default_reuse_describe_snapshot(),
            reject_duplicate_keys: false,
            max_output_columns: default_max_output_columns(),
        }
    }
}

impl PivotConfig {
    pub fn from_app_config() -> Self {
        crate::shared::config::CONFIG.pivot.clone()
    }
}

use std::env;

pub fn load_settings() -> Result<Settings, config::ConfigError> {
    let config_path = env::var("PIVOT_UDX_CONFIG").unwrap_or_else(|_| "config".to_string());

    let settings: Settings = config::Config::builder()
        .set_default("logging.log_dir", "logs")?
        .set_default("logging.stdout_level", "info")?
        .set_default("logging.file_level", "debug")?
        .set_default("pivot.reuse_describe_snapshot", default_reuse_describe_snapshot())?
        .set_default("pivot.reject_duplicate_keys", false)?
        .set_default("pivot.max_output_columns", default_max_output_columns() as i64)?
        .add_source(config::File::with_name(&config_path).required(false))
        .add_source(config::Environment::with_prefix("PIVOT_UDX").separator("__"))
        .build()?
        .try_deserialize()?;

    Ok(settings)
}
