//! Governance configuration: periods and bond applied to new proposals.
//!
//! The admin can change these values at any time; each proposal captures a
//! [`ConfigSnapshot`] at creation so later changes never reach it.

use crate::amount::TokenAmount;
use serde::{Deserialize, Serialize};

const ONE_DAY_SECS: u64 = 24 * 3600;

/// Process-wide configuration for newly created proposals.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceConfig {
    /// Length of the initial voting window, in seconds.
    pub voting_period_secs: u64,

    /// Length of the challenge/veto window that follows a leading Yes tally.
    pub veto_period_secs: u64,

    /// Bond pulled from the proposer when a proposal is created.
    pub proposal_bond: TokenAmount,
}

impl GovernanceConfig {
    /// Default periods: two days each. Default bond: 2000 tokens.
    pub fn beneficiary_defaults() -> Self {
        Self {
            voting_period_secs: 2 * ONE_DAY_SECS,
            veto_period_secs: 2 * ONE_DAY_SECS,
            proposal_bond: TokenAmount::from_tokens(2000),
        }
    }

    /// Total time from proposal start until the veto window closes.
    pub fn total_period_secs(&self) -> u64 {
        self.voting_period_secs.saturating_add(self.veto_period_secs)
    }

    /// Capture these values, tagged with the engine's config version.
    pub fn snapshot(&self, version: u64) -> ConfigSnapshot {
        ConfigSnapshot {
            voting_period_secs: self.voting_period_secs,
            veto_period_secs: self.veto_period_secs,
            proposal_bond: self.proposal_bond,
            version,
        }
    }
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self::beneficiary_defaults()
    }
}

/// The configuration a proposal was created under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    pub voting_period_secs: u64,
    pub veto_period_secs: u64,
    pub proposal_bond: TokenAmount,
    /// Config version active at creation (starts at 0, bumped per update).
    pub version: u64,
}
