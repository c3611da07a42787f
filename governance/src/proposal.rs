//! Beneficiary proposals and their lifecycle state.

use crate::error::GovernanceError;
use crate::phase;
use grantgov_types::{AccountId, ConfigSnapshot, ContentRef, Timestamp, TokenAmount};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Sequential proposal identifier, starting at 0.
pub type ProposalId = u64;

/// Whether the proposal adds or removes a beneficiary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalType {
    /// Add the beneficiary to the registry.
    Nomination,
    /// Remove the beneficiary from the registry.
    Takedown,
}

impl fmt::Display for ProposalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nomination => write!(f, "nomination"),
            Self::Takedown => write!(f, "takedown"),
        }
    }
}

/// Lifecycle status of a proposal.
///
/// `New → ChallengePeriod → PendingFinalization → {Passed | Failed}`, with
/// `New → PendingFinalization` when the initial vote does not favour Yes.
/// Variants are ordered so that a legal transition never decreases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    /// Initial voting window is open.
    New,
    /// Yes led when the initial window closed; the veto window is open.
    ChallengePeriod,
    /// All windows closed; waiting for someone to finalize.
    PendingFinalization,
    /// Finalized in favour; the registry change has been applied.
    Passed,
    /// Finalized against.
    Failed,
}

impl ProposalStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Passed | Self::Failed)
    }

    pub fn accepts_votes(&self) -> bool {
        matches!(self, Self::New | Self::ChallengePeriod)
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::New => "new",
            Self::ChallengePeriod => "challenge-period",
            Self::PendingFinalization => "pending-finalization",
            Self::Passed => "passed",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// A ballot choice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteChoice {
    Yes,
    No,
}

/// Custody state of a proposal's bond.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BondState {
    /// Held by the engine since creation.
    Locked(TokenAmount),
    /// Returned to the proposer after the proposal passed.
    Refunded(TokenAmount),
    /// Kept after the proposal failed; `sink` is `None` when it stayed in custody.
    Forfeited {
        amount: TokenAmount,
        sink: Option<AccountId>,
    },
}

impl BondState {
    pub fn amount(&self) -> TokenAmount {
        match self {
            Self::Locked(a) | Self::Refunded(a) => *a,
            Self::Forfeited { amount, .. } => *amount,
        }
    }

    pub fn is_locked(&self) -> bool {
        matches!(self, Self::Locked(_))
    }
}

/// A beneficiary nomination or takedown proposal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    /// Account being nominated or taken down.
    pub beneficiary: AccountId,
    /// Reference to the off-chain application.
    pub application_ref: ContentRef,
    pub kind: ProposalType,
    /// Who posted the bond.
    pub proposer: AccountId,
    pub start_time: Timestamp,
    /// Voice credits cast for Yes.
    pub yes_count: u128,
    /// Voice credits cast for No.
    pub no_count: u128,
    pub voter_count: u64,
    /// Stored status; see [`Proposal::effective_status`] for the live phase.
    pub status: ProposalStatus,
    /// Periods and bond in effect at creation.
    pub config: ConfigSnapshot,
    pub voted_by: BTreeSet<AccountId>,
    pub bond: BondState,
    pub finalized_at: Option<Timestamp>,
}

impl Proposal {
    pub fn new(
        id: ProposalId,
        beneficiary: AccountId,
        application_ref: ContentRef,
        kind: ProposalType,
        proposer: AccountId,
        config: ConfigSnapshot,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            beneficiary,
            application_ref,
            kind,
            proposer,
            start_time: now,
            yes_count: 0,
            no_count: 0,
            voter_count: 0,
            status: ProposalStatus::New,
            config,
            voted_by: BTreeSet::new(),
            bond: BondState::Locked(config.proposal_bond),
            finalized_at: None,
        }
    }

    /// The phase this proposal is in at `now`, derived from its timestamps and tally.
    pub fn effective_status(&self, now: Timestamp) -> ProposalStatus {
        phase::effective_status(
            now,
            self.start_time,
            self.config.voting_period_secs,
            self.config.veto_period_secs,
            self.status,
            self.yes_count,
            self.no_count,
        )
    }

    /// When the initial voting window closes.
    pub fn voting_ends_at(&self) -> Timestamp {
        self.start_time.plus(self.config.voting_period_secs)
    }

    /// When the veto window closes (if one opens).
    pub fn veto_ends_at(&self) -> Timestamp {
        self.voting_ends_at().plus(self.config.veto_period_secs)
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn has_voted(&self, account: &AccountId) -> bool {
        self.voted_by.contains(account)
    }

    /// Whether Yes strictly leads. Ties go to No.
    pub fn yes_leads(&self) -> bool {
        self.yes_count > self.no_count
    }

    /// Add `weight` to the chosen side and record `voter`.
    ///
    /// Fails without mutating anything on a repeat voter or a tally overflow.
    /// Window checks are the engine's job.
    pub fn record_vote(
        &mut self,
        voter: &AccountId,
        choice: VoteChoice,
        weight: u128,
    ) -> Result<(), GovernanceError> {
        if self.voted_by.contains(voter) {
            return Err(GovernanceError::DuplicateVote {
                proposal: self.id,
                voter: voter.to_string(),
            });
        }
        let side = match choice {
            VoteChoice::Yes => &mut self.yes_count,
            VoteChoice::No => &mut self.no_count,
        };
        *side = side
            .checked_add(weight)
            .ok_or(GovernanceError::TallyOverflow(self.id))?;
        self.voted_by.insert(voter.clone());
        self.voter_count += 1;
        Ok(())
    }
}

/// Query filter for listing proposals.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProposalFilter {
    pub kind: Option<ProposalType>,
    /// Matched against the effective status at query time.
    pub status: Option<ProposalStatus>,
    pub beneficiary: Option<AccountId>,
}

impl ProposalFilter {
    pub fn kind(kind: ProposalType) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: ProposalStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn matches(&self, proposal: &Proposal, now: Timestamp) -> bool {
        self.kind.map_or(true, |k| k == proposal.kind)
            && self
                .status
                .map_or(true, |s| s == proposal.effective_status(now))
            && self
                .beneficiary
                .as_ref()
                .map_or(true, |b| b == &proposal.beneficiary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grantgov_types::GovernanceConfig;

    fn account(name: &str) -> AccountId {
        AccountId::new(name)
    }

    fn make_proposal() -> Proposal {
        Proposal::new(
            0,
            account("beneficiary"),
            ContentRef::from_label("testCid").unwrap(),
            ProposalType::Nomination,
            account("proposer"),
            GovernanceConfig::default().snapshot(0),
            Timestamp::new(1000),
        )
    }

    #[test]
    fn new_proposal_starts_empty_with_locked_bond() {
        let p = make_proposal();
        assert_eq!(p.status, ProposalStatus::New);
        assert_eq!((p.yes_count, p.no_count, p.voter_count), (0, 0, 0));
        assert!(p.bond.is_locked());
        assert_eq!(p.bond.amount(), GovernanceConfig::default().proposal_bond);
    }

    #[test]
    fn record_vote_updates_tally_and_voter_set() {
        let mut p = make_proposal();
        p.record_vote(&account("v1"), VoteChoice::Yes, 20).unwrap();
        p.record_vote(&account("v2"), VoteChoice::No, 40).unwrap();
        assert_eq!(p.yes_count, 20);
        assert_eq!(p.no_count, 40);
        assert_eq!(p.voter_count, 2);
        assert!(p.has_voted(&account("v1")));
        assert!(!p.yes_leads());
    }

    #[test]
    fn repeat_voter_is_rejected_without_changes() {
        let mut p = make_proposal();
        p.record_vote(&account("v1"), VoteChoice::Yes, 20).unwrap();
        let err = p.record_vote(&account("v1"), VoteChoice::No, 50).unwrap_err();
        assert!(matches!(err, GovernanceError::DuplicateVote { proposal: 0, .. }));
        assert_eq!(p.no_count, 0);
        assert_eq!(p.voter_count, 1);
    }

    #[test]
    fn overflow_leaves_proposal_untouched() {
        let mut p = make_proposal();
        p.record_vote(&account("whale"), VoteChoice::Yes, u128::MAX).unwrap();
        let err = p.record_vote(&account("v2"), VoteChoice::Yes, 1).unwrap_err();
        assert_eq!(err, GovernanceError::TallyOverflow(0));
        assert_eq!(p.voter_count, 1);
        assert!(!p.has_voted(&account("v2")));
    }

    #[test]
    fn windows_are_measured_from_start() {
        let p = make_proposal();
        assert_eq!(p.voting_ends_at(), Timestamp::new(1000 + 172_800));
        assert_eq!(p.veto_ends_at(), Timestamp::new(1000 + 2 * 172_800));
    }

    #[test]
    fn status_order_follows_lifecycle() {
        assert!(ProposalStatus::New < ProposalStatus::ChallengePeriod);
        assert!(ProposalStatus::ChallengePeriod < ProposalStatus::PendingFinalization);
        assert!(ProposalStatus::PendingFinalization < ProposalStatus::Passed);
    }

    #[test]
    fn filter_matches_on_kind_and_effective_status() {
        let p = make_proposal();
        let now = Timestamp::new(1001);
        assert!(ProposalFilter::kind(ProposalType::Nomination).matches(&p, now));
        assert!(!ProposalFilter::kind(ProposalType::Takedown).matches(&p, now));
        let closed = p.voting_ends_at();
        assert!(ProposalFilter::default()
            .with_status(ProposalStatus::PendingFinalization)
            .matches(&p, closed));
    }
}
