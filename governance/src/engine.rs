//! The governance engine: drives beneficiary proposals through their lifecycle.
//!
//! Each proposal sits behind its own mutex, so votes on one proposal are
//! serialized while different proposals proceed in parallel. Creation holds
//! the collection write lock for the whole validate → bond → append sequence,
//! which keeps the one-open-proposal-per-beneficiary check and id assignment
//! atomic.

use crate::error::GovernanceError;
use crate::events::{EventBus, GovernanceEvent};
use crate::ports::Ports;
use crate::proposal::{
    BondState, Proposal, ProposalFilter, ProposalId, ProposalStatus, ProposalType, VoteChoice,
};
use crate::snapshot::EngineSnapshot;
use grantgov_types::{AccountId, ContentRef, GovernanceConfig, Timestamp, TokenAmount};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

/// Admin-controlled settings.
#[derive(Clone, Debug)]
struct Settings {
    admin: AccountId,
    config: GovernanceConfig,
    config_version: u64,
    forfeit_sink: Option<AccountId>,
}

pub struct GovernanceEngine {
    ports: Ports,
    /// Account that holds locked bonds on the bond token.
    custody: AccountId,
    settings: RwLock<Settings>,
    proposals: RwLock<Vec<Arc<Mutex<Proposal>>>>,
    /// Beneficiary → its open (non-terminal) proposal.
    open_by_beneficiary: Mutex<HashMap<AccountId, ProposalId>>,
    /// Forfeited bonds that stayed in custody because no sink was set.
    retained_bonds: Mutex<TokenAmount>,
    events: EventBus,
}

impl GovernanceEngine {
    /// Create an engine with the default configuration.
    pub fn new(admin: AccountId, custody: AccountId, ports: Ports) -> Self {
        Self::from_parts(
            ports,
            custody,
            Settings {
                admin,
                config: GovernanceConfig::default(),
                config_version: 0,
                forfeit_sink: None,
            },
            Vec::new(),
            TokenAmount::ZERO,
        )
    }

    /// Create an engine with an explicit initial configuration.
    pub fn with_config(
        admin: AccountId,
        custody: AccountId,
        config: GovernanceConfig,
        ports: Ports,
    ) -> Result<Self, GovernanceError> {
        validate_config(&config)?;
        Ok(Self::from_parts(
            ports,
            custody,
            Settings {
                admin,
                config,
                config_version: 0,
                forfeit_sink: None,
            },
            Vec::new(),
            TokenAmount::ZERO,
        ))
    }

    fn from_parts(
        ports: Ports,
        custody: AccountId,
        settings: Settings,
        proposals: Vec<Proposal>,
        retained_bonds: TokenAmount,
    ) -> Self {
        let open_by_beneficiary = proposals
            .iter()
            .filter(|p| !p.is_terminal())
            .map(|p| (p.beneficiary.clone(), p.id))
            .collect();
        Self {
            ports,
            custody,
            settings: RwLock::new(settings),
            proposals: RwLock::new(
                proposals
                    .into_iter()
                    .map(|p| Arc::new(Mutex::new(p)))
                    .collect(),
            ),
            open_by_beneficiary: Mutex::new(open_by_beneficiary),
            retained_bonds: Mutex::new(retained_bonds),
            events: EventBus::new(),
        }
    }

    /// Register a listener for engine events. Call before sharing the engine.
    pub fn subscribe(&mut self, listener: Box<dyn Fn(&GovernanceEvent) + Send + Sync>) {
        self.events.subscribe(listener);
    }

    // ── Lifecycle ──────────────────────────────────────────────────────

    /// Open a nomination or takedown proposal, pulling the bond from `proposer`.
    pub fn create_proposal(
        &self,
        proposer: &AccountId,
        beneficiary: &AccountId,
        application_ref: ContentRef,
        kind: ProposalType,
        now: Timestamp,
    ) -> Result<ProposalId, GovernanceError> {
        let snapshot = {
            let settings = read(&self.settings);
            settings.config.snapshot(settings.config_version)
        };

        // The bond is checked before the beneficiary so an underfunded
        // proposer learns that first; the actual pull happens last.
        self.ports
            .bond_token
            .can_pull(proposer, &self.custody, snapshot.proposal_bond)
            .map_err(|e| GovernanceError::InsufficientBond(e.to_string()))?;

        let mut proposals = write(&self.proposals);
        let mut open = lock(&self.open_by_beneficiary);

        let registered = self
            .ports
            .registry
            .exists(beneficiary)
            .map_err(|e| GovernanceError::RegistryFailure(e.to_string()))?;
        let pending = open.contains_key(beneficiary);
        match kind {
            ProposalType::Nomination if registered || pending => {
                return Err(GovernanceError::DuplicateOrExistingBeneficiary(
                    beneficiary.to_string(),
                ));
            }
            ProposalType::Takedown if !registered => {
                return Err(GovernanceError::UnknownBeneficiary(beneficiary.to_string()));
            }
            ProposalType::Takedown if pending => {
                return Err(GovernanceError::DuplicateOrExistingBeneficiary(
                    beneficiary.to_string(),
                ));
            }
            _ => {}
        }

        self.ports
            .bond_token
            .transfer_from(proposer, &self.custody, snapshot.proposal_bond)
            .map_err(|e| GovernanceError::InsufficientBond(e.to_string()))?;

        let id = proposals.len() as ProposalId;
        let proposal = Proposal::new(
            id,
            beneficiary.clone(),
            application_ref,
            kind,
            proposer.clone(),
            snapshot,
            now,
        );
        proposals.push(Arc::new(Mutex::new(proposal)));
        open.insert(beneficiary.clone(), id);
        drop(open);
        drop(proposals);

        info!(
            id,
            %proposer,
            %beneficiary,
            %kind,
            bond = %snapshot.proposal_bond,
            "proposal created"
        );
        self.events.emit(&GovernanceEvent::ProposalCreated {
            id,
            proposer: proposer.clone(),
            beneficiary: beneficiary.clone(),
            kind,
            bond: snapshot.proposal_bond,
        });
        Ok(id)
    }

    /// Cast `voter`'s full voice credits for `choice`.
    ///
    /// Returns the proposal's phase after the vote. The first vote after the
    /// initial window closes with Yes ahead records the move to `ChallengePeriod`.
    ///
    /// Rejections, in order: unknown proposal, closed window, no voting
    /// power, repeat voter. Staking is not consulted for a closed proposal.
    pub fn vote(
        &self,
        id: ProposalId,
        voter: &AccountId,
        choice: VoteChoice,
        now: Timestamp,
    ) -> Result<ProposalStatus, GovernanceError> {
        let cell = self.proposal_cell(id)?;
        if !lock(&cell).effective_status(now).accepts_votes() {
            return Err(GovernanceError::VotingClosed(id));
        }

        let weight = self
            .ports
            .staking
            .power_of(voter)
            .map_err(|e| GovernanceError::VotingPowerUnavailable(e.to_string()))?;
        if weight == 0 {
            return Err(GovernanceError::NoVotingPower(voter.to_string()));
        }

        let (phase, challenge_started) = {
            let mut proposal = lock(&cell);
            // Re-derived under the lock: a finalize may have landed while
            // staking was queried.
            let phase = proposal.effective_status(now);
            if !phase.accepts_votes() {
                return Err(GovernanceError::VotingClosed(id));
            }
            if proposal.has_voted(voter) {
                return Err(GovernanceError::DuplicateVote {
                    proposal: id,
                    voter: voter.to_string(),
                });
            }
            proposal.record_vote(voter, choice, weight)?;
            let challenge_started =
                proposal.status == ProposalStatus::New && phase == ProposalStatus::ChallengePeriod;
            proposal.status = phase;
            (phase, challenge_started)
        };

        if challenge_started {
            info!(id, "initial vote favours yes, challenge period open");
            self.events.emit(&GovernanceEvent::ChallengeStarted { id });
        }
        debug!(id, %voter, ?choice, weight, %phase, "vote counted");
        self.events.emit(&GovernanceEvent::VoteCast {
            id,
            voter: voter.clone(),
            choice,
            weight,
        });
        Ok(phase)
    }

    /// Settle a proposal whose voting windows have closed.
    ///
    /// Applies the registry change on `Passed`, then settles the bond. If the
    /// bond transfer fails the registry change is reversed and nothing is recorded.
    pub fn finalize(&self, id: ProposalId, now: Timestamp) -> Result<ProposalStatus, GovernanceError> {
        let cell = self.proposal_cell(id)?;
        let sink = read(&self.settings).forfeit_sink.clone();

        let mut proposal = lock(&cell);
        if proposal.effective_status(now) != ProposalStatus::PendingFinalization {
            return Err(GovernanceError::FinalizationNotAllowed(id));
        }

        let passed = proposal.yes_leads();
        let amount = proposal.bond.amount();
        let registry_changed = if passed {
            self.apply_registry_change(&proposal)?
        } else {
            false
        };

        let settled = if passed {
            self.ports
                .bond_token
                .transfer(&self.custody, &proposal.proposer, amount)
                .map(|()| BondState::Refunded(amount))
        } else if let Some(sink) = sink {
            self.ports
                .bond_token
                .transfer(&self.custody, &sink, amount)
                .map(|()| BondState::Forfeited {
                    amount,
                    sink: Some(sink),
                })
        } else {
            Ok(BondState::Forfeited { amount, sink: None })
        };

        let bond = match settled {
            Ok(bond) => bond,
            Err(e) => {
                if registry_changed {
                    self.revert_registry_change(&proposal);
                }
                return Err(GovernanceError::TransferFailed(e.to_string()));
            }
        };

        if matches!(bond, BondState::Forfeited { sink: None, .. }) {
            let mut retained = lock(&self.retained_bonds);
            *retained = retained.checked_add(amount).unwrap_or(TokenAmount::new(u128::MAX));
        }
        let status = if passed {
            ProposalStatus::Passed
        } else {
            ProposalStatus::Failed
        };
        proposal.bond = bond.clone();
        proposal.status = status;
        proposal.finalized_at = Some(now);
        let beneficiary = proposal.beneficiary.clone();
        let proposer = proposal.proposer.clone();
        let (yes_count, no_count) = (proposal.yes_count, proposal.no_count);
        {
            // Cleared before the proposal lock is released, so anyone who
            // sees the terminal status can immediately re-propose.
            let mut open = lock(&self.open_by_beneficiary);
            if open.get(&beneficiary) == Some(&id) {
                open.remove(&beneficiary);
            }
        }
        drop(proposal);

        info!(id, %status, yes_count, no_count, %beneficiary, "proposal finalized");
        self.events.emit(&GovernanceEvent::Finalized {
            id,
            status,
            yes_count,
            no_count,
        });
        match bond {
            BondState::Refunded(amount) => self.events.emit(&GovernanceEvent::BondRefunded {
                id,
                proposer,
                amount,
            }),
            BondState::Forfeited { amount, sink } => {
                self.events.emit(&GovernanceEvent::BondForfeited { id, amount, sink })
            }
            BondState::Locked(_) => {}
        }
        Ok(status)
    }

    /// Returns whether the registry was actually changed.
    fn apply_registry_change(&self, proposal: &Proposal) -> Result<bool, GovernanceError> {
        let registry = &self.ports.registry;
        let target = &proposal.beneficiary;
        let exists = registry
            .exists(target)
            .map_err(|e| GovernanceError::RegistryFailure(e.to_string()))?;
        let result = match proposal.kind {
            ProposalType::Nomination if !exists => registry.add(target),
            ProposalType::Takedown if exists => registry.remove(target),
            _ => return Ok(false),
        };
        result
            .map(|()| true)
            .map_err(|e| GovernanceError::RegistryFailure(e.to_string()))
    }

    fn revert_registry_change(&self, proposal: &Proposal) {
        let registry = &self.ports.registry;
        let result = match proposal.kind {
            ProposalType::Nomination => registry.remove(&proposal.beneficiary),
            ProposalType::Takedown => registry.add(&proposal.beneficiary),
        };
        match result {
            Ok(()) => warn!(
                id = proposal.id,
                beneficiary = %proposal.beneficiary,
                "bond settlement failed, registry change reverted"
            ),
            Err(e) => warn!(
                id = proposal.id,
                beneficiary = %proposal.beneficiary,
                error = %e,
                "bond settlement failed and registry change could not be reverted"
            ),
        }
    }

    // ── Administration ─────────────────────────────────────────────────

    /// Replace the configuration used for proposals created from now on.
    ///
    /// Returns the new config version.
    pub fn set_configuration(
        &self,
        caller: &AccountId,
        voting_period_secs: u64,
        veto_period_secs: u64,
        proposal_bond: TokenAmount,
    ) -> Result<u64, GovernanceError> {
        let config = GovernanceConfig {
            voting_period_secs,
            veto_period_secs,
            proposal_bond,
        };
        validate_config(&config)?;
        let version = {
            let mut settings = write(&self.settings);
            ensure_admin(&settings, caller)?;
            settings.config = config;
            settings.config_version += 1;
            settings.config_version
        };
        info!(
            version,
            voting_period_secs,
            veto_period_secs,
            bond = %proposal_bond,
            "configuration updated"
        );
        self.events
            .emit(&GovernanceEvent::ConfigurationUpdated { version });
        Ok(version)
    }

    /// Choose where bonds of failed proposals go. `None` keeps them in custody.
    pub fn set_forfeit_sink(
        &self,
        caller: &AccountId,
        sink: Option<AccountId>,
    ) -> Result<(), GovernanceError> {
        let mut settings = write(&self.settings);
        ensure_admin(&settings, caller)?;
        info!(sink = ?sink.as_ref().map(AccountId::as_str), "forfeit sink updated");
        settings.forfeit_sink = sink;
        Ok(())
    }

    pub fn transfer_admin(
        &self,
        caller: &AccountId,
        new_admin: AccountId,
    ) -> Result<(), GovernanceError> {
        {
            let mut settings = write(&self.settings);
            ensure_admin(&settings, caller)?;
            settings.admin = new_admin.clone();
        }
        info!(from = %caller, to = %new_admin, "admin transferred");
        self.events.emit(&GovernanceEvent::AdminTransferred {
            from: caller.clone(),
            to: new_admin,
        });
        Ok(())
    }

    // ── Queries ────────────────────────────────────────────────────────

    pub fn get_proposal(&self, id: ProposalId) -> Result<Proposal, GovernanceError> {
        let cell = self.proposal_cell(id)?;
        let proposal = lock(&cell).clone();
        Ok(proposal)
    }

    /// Live phase of a proposal at `now`, without persisting anything.
    pub fn effective_status(
        &self,
        id: ProposalId,
        now: Timestamp,
    ) -> Result<ProposalStatus, GovernanceError> {
        let cell = self.proposal_cell(id)?;
        let status = lock(&cell).effective_status(now);
        Ok(status)
    }

    pub fn number_of_proposals(&self) -> u64 {
        read(&self.proposals).len() as u64
    }

    pub fn has_voted(&self, id: ProposalId, account: &AccountId) -> Result<bool, GovernanceError> {
        let cell = self.proposal_cell(id)?;
        let voted = lock(&cell).has_voted(account);
        Ok(voted)
    }

    /// Proposals matching `filter`, in id order.
    pub fn list_proposals(&self, filter: &ProposalFilter, now: Timestamp) -> Vec<Proposal> {
        let cells: Vec<_> = read(&self.proposals).iter().cloned().collect();
        cells
            .iter()
            .map(|cell| lock(cell).clone())
            .filter(|p| filter.matches(p, now))
            .collect()
    }

    /// The open proposal for `beneficiary`, if any.
    pub fn open_proposal_for(&self, beneficiary: &AccountId) -> Option<ProposalId> {
        lock(&self.open_by_beneficiary).get(beneficiary).copied()
    }

    pub fn configuration(&self) -> GovernanceConfig {
        read(&self.settings).config.clone()
    }

    pub fn config_version(&self) -> u64 {
        read(&self.settings).config_version
    }

    pub fn admin(&self) -> AccountId {
        read(&self.settings).admin.clone()
    }

    pub fn forfeit_sink(&self) -> Option<AccountId> {
        read(&self.settings).forfeit_sink.clone()
    }

    pub fn custody(&self) -> &AccountId {
        &self.custody
    }

    /// Total forfeited bond held in custody.
    pub fn retained_bonds(&self) -> TokenAmount {
        *lock(&self.retained_bonds)
    }

    fn proposal_cell(&self, id: ProposalId) -> Result<Arc<Mutex<Proposal>>, GovernanceError> {
        let proposals = read(&self.proposals);
        usize::try_from(id)
            .ok()
            .and_then(|idx| proposals.get(idx))
            .cloned()
            .ok_or(GovernanceError::ProposalNotFound(id))
    }

    // ── Persistence ────────────────────────────────────────────────────

    /// Capture the full engine state.
    ///
    /// Every proposal lock is held while the retained total is read, so a
    /// concurrent finalize is either fully in the snapshot or not at all.
    pub fn snapshot(&self) -> EngineSnapshot {
        let settings = read(&self.settings).clone();
        let cells: Vec<_> = read(&self.proposals).iter().cloned().collect();
        // Id order; no other path holds more than one proposal lock.
        let guards: Vec<_> = cells.iter().map(|cell| lock(cell)).collect();
        let retained_bonds = self.retained_bonds();
        let proposals = guards.iter().map(|p| (**p).clone()).collect();
        drop(guards);
        EngineSnapshot {
            admin: settings.admin,
            custody: self.custody.clone(),
            config: settings.config,
            config_version: settings.config_version,
            forfeit_sink: settings.forfeit_sink,
            retained_bonds,
            proposals,
        }
    }

    /// Rebuild an engine from a snapshot, wiring it to `ports`.
    pub fn restore(snapshot: EngineSnapshot, ports: Ports) -> Result<Self, GovernanceError> {
        snapshot.validate()?;
        validate_config(&snapshot.config)
            .map_err(|e| GovernanceError::CorruptSnapshot(e.to_string()))?;
        info!(
            proposals = snapshot.proposals.len(),
            config_version = snapshot.config_version,
            "engine restored from snapshot"
        );
        Ok(Self::from_parts(
            ports,
            snapshot.custody,
            Settings {
                admin: snapshot.admin,
                config: snapshot.config,
                config_version: snapshot.config_version,
                forfeit_sink: snapshot.forfeit_sink,
            },
            snapshot.proposals,
            snapshot.retained_bonds,
        ))
    }
}

/// Reject configurations that would open proposals with an empty window.
pub fn validate_config(config: &GovernanceConfig) -> Result<(), GovernanceError> {
    if config.voting_period_secs == 0 {
        return Err(GovernanceError::InvalidConfiguration(
            "voting period must be non-zero".into(),
        ));
    }
    if config.veto_period_secs == 0 {
        return Err(GovernanceError::InvalidConfiguration(
            "veto period must be non-zero".into(),
        ));
    }
    Ok(())
}

fn ensure_admin(settings: &Settings, caller: &AccountId) -> Result<(), GovernanceError> {
    if &settings.admin == caller {
        Ok(())
    } else {
        Err(GovernanceError::Unauthorized(caller.to_string()))
    }
}

// A panic while holding one of these locks cannot leave a proposal half
// written: every mutation happens after all fallible checks.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&GovernanceConfig::default()).is_ok());
    }

    #[test]
    fn zero_periods_are_rejected() {
        let mut cfg = GovernanceConfig::default();
        cfg.voting_period_secs = 0;
        assert!(matches!(
            validate_config(&cfg),
            Err(GovernanceError::InvalidConfiguration(_))
        ));
        let mut cfg = GovernanceConfig::default();
        cfg.veto_period_secs = 0;
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn ensure_admin_checks_identity() {
        let settings = Settings {
            admin: AccountId::new("admin"),
            config: GovernanceConfig::default(),
            config_version: 0,
            forfeit_sink: None,
        };
        assert!(ensure_admin(&settings, &AccountId::new("admin")).is_ok());
        assert_eq!(
            ensure_admin(&settings, &AccountId::new("mallory")),
            Err(GovernanceError::Unauthorized("mallory".into()))
        );
    }

    #[test]
    fn poisoned_lock_is_recovered() {
        let mutex = Arc::new(Mutex::new(5u32));
        let poisoner = Arc::clone(&mutex);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison");
        })
        .join();
        assert!(mutex.is_poisoned());
        assert_eq!(*lock(&mutex), 5);
    }
}
