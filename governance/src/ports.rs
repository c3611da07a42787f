//! Capabilities the engine consumes from the outside world.
//!
//! The staking ledger, the beneficiary registry and the bond token are
//! injected as trait objects. `grantgov-nullables` provides in-memory
//! implementations for tests and simulation.

use grantgov_types::{AccountId, TokenAmount};
use std::sync::Arc;
use thiserror::Error;

/// A collaborator refused or failed an operation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PortError {
    #[error("insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: u128, available: u128 },

    #[error("insufficient allowance: need {needed}, approved {approved}")]
    InsufficientAllowance { needed: u128, approved: u128 },

    #[error("{0} is already registered")]
    AlreadyRegistered(String),

    #[error("{0} is not registered")]
    NotRegistered(String),

    #[error("{0}")]
    Unavailable(String),
}

/// Source of voice credits (stake-derived voting weight).
pub trait VotingPowerSource: Send + Sync {
    /// Current voting weight of `account`; zero means it may not vote.
    fn power_of(&self, account: &AccountId) -> Result<u128, PortError>;
}

/// Registry of beneficiaries. The engine is its only writer.
pub trait BeneficiaryRegistry: Send + Sync {
    fn exists(&self, beneficiary: &AccountId) -> Result<bool, PortError>;

    fn add(&self, beneficiary: &AccountId) -> Result<(), PortError>;

    fn remove(&self, beneficiary: &AccountId) -> Result<(), PortError>;
}

/// Fungible token holding proposal bonds.
pub trait BondToken: Send + Sync {
    /// Check, without moving funds, that `transfer_from` for `amount` would
    /// currently succeed on allowance and balance.
    fn can_pull(
        &self,
        payer: &AccountId,
        custodian: &AccountId,
        amount: TokenAmount,
    ) -> Result<(), PortError>;

    /// Pull `amount` from `payer` into `custodian` using a prior approval.
    fn transfer_from(
        &self,
        payer: &AccountId,
        custodian: &AccountId,
        amount: TokenAmount,
    ) -> Result<(), PortError>;

    /// Move `amount` out of the custodian's own balance.
    fn transfer(
        &self,
        custodian: &AccountId,
        payee: &AccountId,
        amount: TokenAmount,
    ) -> Result<(), PortError>;
}

/// The three collaborators an engine is wired to.
#[derive(Clone)]
pub struct Ports {
    pub staking: Arc<dyn VotingPowerSource>,
    pub registry: Arc<dyn BeneficiaryRegistry>,
    pub bond_token: Arc<dyn BondToken>,
}

impl Ports {
    pub fn new(
        staking: Arc<dyn VotingPowerSource>,
        registry: Arc<dyn BeneficiaryRegistry>,
        bond_token: Arc<dyn BondToken>,
    ) -> Self {
        Self {
            staking,
            registry,
            bond_token,
        }
    }
}
