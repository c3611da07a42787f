//! Beneficiary governance for grantgov.
//!
//! Proposals nominate a beneficiary for the registry or take one down.
//! Lifecycle: New → (ChallengePeriod) → PendingFinalization → Passed | Failed.
//!
//! - The proposer locks a bond at creation; it is refunded on Passed and
//!   forfeited on Failed.
//! - Votes are weighted by voice credits from staking; each account votes once.
//! - If Yes leads when the initial window closes, a veto window opens in
//!   which opponents can still vote. Ties always go to No.
//! - Phases are derived from timestamps on every call; nothing is scheduled.

pub mod engine;
pub mod error;
pub mod events;
pub mod phase;
pub mod ports;
pub mod proposal;
pub mod snapshot;

pub use engine::GovernanceEngine;
pub use error::GovernanceError;
pub use events::{EventBus, GovernanceEvent};
pub use ports::{BeneficiaryRegistry, BondToken, PortError, Ports, VotingPowerSource};
pub use proposal::{
    BondState, Proposal, ProposalFilter, ProposalId, ProposalStatus, ProposalType, VoteChoice,
};
pub use snapshot::EngineSnapshot;
