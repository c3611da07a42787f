//! Simulator configuration with TOML file support.

use grantgov_governance::{ProposalId, ProposalType, VoteChoice};
use grantgov_types::{GovernanceConfig, TOKEN_UNIT};
use grantgov_utils::LogFormat;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {reason}")]
    Read { path: String, reason: String },
    #[error("invalid scenario: {0}")]
    Parse(String),
    #[error("cannot serialize settings: {0}")]
    Serialize(String),
}

/// A scenario for `grantgov simulate`.
///
/// Loaded from TOML via [`SimulatorConfig::from_toml_file`]; every table is
/// optional, so an empty file is a valid (if uneventful) scenario.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub governance: GovernanceSettings,

    /// Accounts known to the in-memory collaborators.
    #[serde(default)]
    pub accounts: Vec<AccountSpec>,

    /// Actions replayed in order.
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// The `[governance]` table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceSettings {
    #[serde(default = "default_admin")]
    pub admin: String,

    /// Account that holds locked bonds.
    #[serde(default = "default_custody")]
    pub custody: String,

    #[serde(default = "default_voting_period")]
    pub voting_period_secs: u64,

    #[serde(default = "default_veto_period")]
    pub veto_period_secs: u64,

    /// Bond in whole tokens.
    #[serde(default = "default_bond_tokens")]
    pub proposal_bond_tokens: u64,

    /// Where bonds of failed proposals go; unset keeps them in custody.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forfeit_sink: Option<String>,

    /// Clock value at the start of the scenario, in unix seconds.
    #[serde(default = "default_start_time")]
    pub start_time: u64,
}

/// One `[[accounts]]` entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSpec {
    pub name: String,

    /// Bond-token balance in whole tokens, pre-approved for the custody account.
    #[serde(default)]
    pub balance_tokens: u64,

    #[serde(default)]
    pub voice_credits: u64,

    /// Seed this account into the beneficiary registry.
    #[serde(default)]
    pub registered: bool,
}

/// One `[[steps]]` entry, selected by its `action` key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    Create {
        proposer: String,
        beneficiary: String,
        kind: ProposalType,
        /// Application reference: `0x`-prefixed hex, or a short label.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        application: Option<String>,
    },
    Vote {
        proposal: ProposalId,
        voter: String,
        choice: VoteChoice,
    },
    Advance {
        #[serde(default)]
        days: u64,
        #[serde(default)]
        secs: u64,
    },
    Finalize {
        proposal: ProposalId,
    },
    Configure {
        /// Defaults to the configured admin.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        caller: Option<String>,
        voting_period_secs: u64,
        veto_period_secs: u64,
        proposal_bond_tokens: u64,
    },
}

impl Step {
    pub fn action(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Vote { .. } => "vote",
            Self::Advance { .. } => "advance",
            Self::Finalize { .. } => "finalize",
            Self::Configure { .. } => "configure",
        }
    }
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}

fn default_admin() -> String {
    "admin".to_string()
}

fn default_custody() -> String {
    "governance".to_string()
}

fn default_voting_period() -> u64 {
    GovernanceConfig::default().voting_period_secs
}

fn default_veto_period() -> u64 {
    GovernanceConfig::default().veto_period_secs
}

fn default_bond_tokens() -> u64 {
    u64::try_from(GovernanceConfig::default().proposal_bond.raw() / TOKEN_UNIT).unwrap_or(u64::MAX)
}

fn default_start_time() -> u64 {
    1_700_000_000
}

// ── Impl ───────────────────────────────────────────────────────────────

impl SimulatorConfig {
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            governance: GovernanceSettings::default(),
            accounts: Vec::new(),
            steps: Vec::new(),
        }
    }
}

impl Default for GovernanceSettings {
    fn default() -> Self {
        Self {
            admin: default_admin(),
            custody: default_custody(),
            voting_period_secs: default_voting_period(),
            veto_period_secs: default_veto_period(),
            proposal_bond_tokens: default_bond_tokens(),
            forfeit_sink: None,
            start_time: default_start_time(),
        }
    }
}
