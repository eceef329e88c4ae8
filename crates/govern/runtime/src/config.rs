//! Configuration for a governance deployment

use govern_registry::CREDIT_DECIMALS;
use govern_types::Amount;
use govern_voting::{ExpiryPolicy, MachineParams, VotingSchedule};
use serde::{Deserialize, Serialize};

/// Top-level deployment configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceConfig {
    /// Voting machine parameters
    #[serde(default)]
    pub voting: VotingConfig,

    /// Treasury and credit token parameters
    #[serde(default)]
    pub treasury: TreasuryConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Voting machine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingConfig {
    /// Governor name
    #[serde(default = "default_governor_name")]
    pub name: String,

    /// Seconds between proposal creation and the opening of voting
    #[serde(default = "default_delay_secs")]
    pub delay_secs: u64,

    /// Length of the voting window in seconds
    #[serde(default = "default_period_secs")]
    pub period_secs: u64,

    /// Minimum total vote weight, in whole credits
    #[serde(default)]
    pub quorum: u64,

    /// Handling of proposals whose window closed without finalize
    #[serde(default)]
    pub expiry_policy: ExpiryPolicy,
}

impl Default for VotingConfig {
    fn default() -> Self {
        Self {
            name: default_governor_name(),
            delay_secs: default_delay_secs(),
            period_secs: default_period_secs(),
            quorum: 0,
            expiry_policy: ExpiryPolicy::default(),
        }
    }
}

impl VotingConfig {
    /// Quorum in credit base units.
    pub fn quorum_base_units(&self) -> Amount {
        Amount::from(self.quorum) * 10u128.pow(u32::from(CREDIT_DECIMALS))
    }

    pub fn machine_params(&self) -> MachineParams {
        MachineParams::new(
            self.name.clone(),
            VotingSchedule::new(self.delay_secs, self.period_secs),
        )
        .with_quorum(self.quorum_base_units())
        .with_expiry_policy(self.expiry_policy)
    }
}

/// Credit token configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasuryConfig {
    #[serde(default = "default_credit_name")]
    pub credit_name: String,

    #[serde(default = "default_credit_symbol")]
    pub credit_symbol: String,
}

impl Default for TreasuryConfig {
    fn default() -> Self {
        Self {
            credit_name: default_credit_name(),
            credit_symbol: default_credit_symbol(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive
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

fn default_governor_name() -> String {
    "GOV".to_string()
}

fn default_delay_secs() -> u64 {
    VotingSchedule::ONE_DAY
}

fn default_period_secs() -> u64 {
    VotingSchedule::ONE_WEEK
}

fn default_credit_name() -> String {
    "Governance Credit".to_string()
}

fn default_credit_symbol() -> String {
    "GCR".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl GovernanceConfig {
    /// Load configuration: defaults, then the optional file, then `GOVERN_*`
    /// environment variables (`GOVERN_VOTING__DELAY_SECS=60`).
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&GovernanceConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("GOVERN")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Parse a TOML document layered over the defaults.
    pub fn from_toml(text: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Config::try_from(&GovernanceConfig::default())?)
            .add_source(config::File::from_str(text, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    /// Short windows for local runs and tests.
    pub fn development() -> Self {
        Self {
            voting: VotingConfig {
                delay_secs: 60,
                period_secs: 600,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}
