//! Configuration for the lotdraw CLI

use lotdraw_engine::{
    BroadcastConfig, EngineConfig, GroupQuota, QuotaError, QuotaLimits, QuotaSchedule,
};
use serde::{Deserialize, Serialize};

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LotdrawConfig {
    /// Quota per group, in any order
    #[serde(default = "default_quota")]
    pub quota: Vec<GroupQuotaConfig>,

    /// Commit behaviour
    #[serde(default)]
    pub engine: EngineConfig,

    /// Broadcast delays and channel buffering
    #[serde(default)]
    pub broadcast: BroadcastConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for LotdrawConfig {
    fn default() -> Self {
        Self {
            quota: default_quota(),
            engine: EngineConfig::default(),
            broadcast: BroadcastConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Limits of one group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupQuotaConfig {
    pub group: u32,
    #[serde(default)]
    pub priority: QuotaLimits,
    #[serde(default)]
    pub general: QuotaLimits,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or `EnvFilter` directive
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_quota() -> Vec<GroupQuotaConfig> {
    QuotaSchedule::default()
        .groups()
        .map(|(group, quota)| GroupQuotaConfig {
            group: group.number(),
            priority: quota.priority,
            general: quota.general,
        })
        .collect()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl LotdrawConfig {
    /// Load configuration: defaults, then the optional file, then
    /// `LOTDRAW_*` environment variables (`__` separates nested keys).
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&LotdrawConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("LOTDRAW")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Build the quota schedule shared by every engine component.
    pub fn to_quota_schedule(&self) -> Result<QuotaSchedule, QuotaError> {
        let table: Vec<(u32, GroupQuota)> = self
            .quota
            .iter()
            .map(|entry| (entry.group, GroupQuota::new(entry.priority, entry.general)))
            .collect();
        QuotaSchedule::from_table(&table)
    }
}
