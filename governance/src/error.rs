use crate::proposal::ProposalId;
use thiserror::Error;

/// Rejections from the governance engine.
///
/// Every variant is returned before any state is mutated (or after a failed
/// step has been reversed), so the caller can retry with corrected input or timing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GovernanceError {
    #[error("proposal bond could not be collected: {0}")]
    InsufficientBond(String),

    #[error("beneficiary {0} already exists or has a pending proposal")]
    DuplicateOrExistingBeneficiary(String),

    #[error("beneficiary {0} is not registered")]
    UnknownBeneficiary(String),

    #[error("proposal {0} not found")]
    ProposalNotFound(ProposalId),

    #[error("account {0} has no voice credits from staking")]
    NoVotingPower(String),

    #[error("account {voter} already voted on proposal {proposal}")]
    DuplicateVote { proposal: ProposalId, voter: String },

    #[error("proposal {0} is not in a voting window")]
    VotingClosed(ProposalId),

    #[error("finalization of proposal {0} is not allowed")]
    FinalizationNotAllowed(ProposalId),

    #[error("account {0} is not the governance admin")]
    Unauthorized(String),

    #[error("bond transfer failed: {0}")]
    TransferFailed(String),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("beneficiary registry rejected the change: {0}")]
    RegistryFailure(String),

    #[error("voting power lookup failed: {0}")]
    VotingPowerUnavailable(String),

    #[error("vote tally overflow on proposal {0}")]
    TallyOverflow(ProposalId),

    #[error("corrupt engine snapshot: {0}")]
    CorruptSnapshot(String),
}
