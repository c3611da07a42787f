//! Serializable engine state, for hosts that persist the engine between runs.

use crate::error::GovernanceError;
use crate::proposal::{BondState, Proposal};
use grantgov_types::{AccountId, GovernanceConfig, TokenAmount};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Everything needed to rebuild a [`GovernanceEngine`](crate::GovernanceEngine)
/// apart from its collaborators.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub admin: AccountId,
    pub custody: AccountId,
    pub config: GovernanceConfig,
    pub config_version: u64,
    pub forfeit_sink: Option<AccountId>,
    pub retained_bonds: TokenAmount,
    /// Indexed by proposal id.
    pub proposals: Vec<Proposal>,
}

impl EngineSnapshot {
    pub fn to_bytes(&self) -> Result<Vec<u8>, GovernanceError> {
        bincode::serialize(self).map_err(|e| GovernanceError::CorruptSnapshot(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, GovernanceError> {
        bincode::deserialize(bytes).map_err(|e| GovernanceError::CorruptSnapshot(e.to_string()))
    }

    /// Check the invariants the engine relies on.
    pub fn validate(&self) -> Result<(), GovernanceError> {
        let mut open = HashSet::new();
        for (idx, p) in self.proposals.iter().enumerate() {
            if p.id != idx as u64 {
                return Err(corrupt(format!("proposal at index {idx} has id {}", p.id)));
            }
            if p.voter_count != p.voted_by.len() as u64 {
                return Err(corrupt(format!(
                    "proposal {} counts {} voters but records {}",
                    p.id,
                    p.voter_count,
                    p.voted_by.len()
                )));
            }
            if p.is_terminal() == p.bond.is_locked() {
                return Err(corrupt(format!(
                    "proposal {} is {} with bond {:?}",
                    p.id, p.status, p.bond
                )));
            }
            if !p.is_terminal() && !open.insert(&p.beneficiary) {
                return Err(corrupt(format!(
                    "beneficiary {} has more than one open proposal",
                    p.beneficiary
                )));
            }
        }
        let retained_in_proposals = self
            .proposals
            .iter()
            .filter_map(|p| match &p.bond {
                BondState::Forfeited { amount, sink: None } => Some(amount.raw()),
                _ => None,
            })
            .fold(0u128, u128::saturating_add);
        if retained_in_proposals != self.retained_bonds.raw() {
            return Err(corrupt(format!(
                "retained bonds {} do not match forfeited bonds {}",
                self.retained_bonds,
                TokenAmount::new(retained_in_proposals)
            )));
        }
        Ok(())
    }
}

fn corrupt(reason: String) -> GovernanceError {
    GovernanceError::CorruptSnapshot(reason)
}
