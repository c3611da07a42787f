#![allow(dead_code)]

use grantgov_governance::{
    GovernanceEngine, GovernanceError, ProposalId, ProposalStatus, ProposalType, VoteChoice,
};
use grantgov_nullables::{NullClock, NullPorts};
use grantgov_types::{AccountId, ContentRef, GovernanceConfig, TokenAmount};

pub const ONE_DAY: u64 = 86_400;
pub const GENESIS: u64 = 1_700_000_000;

pub fn account(name: &str) -> AccountId {
    AccountId::new(name)
}

pub fn bond() -> TokenAmount {
    GovernanceConfig::default().proposal_bond
}

/// Engine wired to nullable collaborators and a manual clock.
pub struct Harness {
    pub null: NullPorts,
    pub clock: NullClock,
    pub engine: GovernanceEngine,
    pub admin: AccountId,
}

impl Harness {
    pub fn new() -> Self {
        let null = NullPorts::new();
        let engine = GovernanceEngine::new(account("admin"), account("engine"), null.ports());
        Self {
            null,
            clock: NullClock::new(GENESIS),
            engine,
            admin: account("admin"),
        }
    }

    pub fn custody(&self) -> AccountId {
        self.engine.custody().clone()
    }

    /// Mint `amount` to `who` and approve the engine to pull it.
    pub fn fund(&self, who: &str, amount: TokenAmount) {
        let owner = account(who);
        self.null.bond_token.mint(&owner, amount);
        self.null.bond_token.approve(&owner, &self.custody(), amount);
    }

    /// Fund the proposer with exactly one bond and create the proposal now.
    pub fn propose(
        &self,
        proposer: &str,
        beneficiary: &str,
        kind: ProposalType,
    ) -> Result<ProposalId, GovernanceError> {
        self.fund(proposer, self.engine.configuration().proposal_bond);
        self.engine.create_proposal(
            &account(proposer),
            &account(beneficiary),
            ContentRef::from_label("testCid").unwrap(),
            kind,
            self.clock.now(),
        )
    }

    /// Give `voter` `power` voice credits and vote now.
    pub fn vote(
        &self,
        id: ProposalId,
        voter: &str,
        power: u128,
        choice: VoteChoice,
    ) -> Result<ProposalStatus, GovernanceError> {
        self.null.staking.set_power(&account(voter), power);
        self.engine.vote(id, &account(voter), choice, self.clock.now())
    }

    pub fn finalize(&self, id: ProposalId) -> Result<ProposalStatus, GovernanceError> {
        self.engine.finalize(id, self.clock.now())
    }

    pub fn is_registered(&self, beneficiary: &str) -> bool {
        self.null.registry.beneficiaries().contains(&account(beneficiary))
    }

    pub fn balance(&self, who: &str) -> TokenAmount {
        self.null.bond_token.balance_of(&account(who))
    }
}
