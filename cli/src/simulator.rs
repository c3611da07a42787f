//! Replays a [`SimulatorConfig`] scenario against an in-memory engine.

use crate::config::{GovernanceSettings, SimulatorConfig, Step};
use grantgov_governance::{
    BondState, GovernanceEngine, GovernanceError, ProposalFilter, ProposalStatus,
};
use grantgov_nullables::{NullClock, NullPorts};
use grantgov_types::{AccountId, ContentRef, GovernanceConfig, TokenAmount, TypesError};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error("invalid account name: {0}")]
    Account(#[from] TypesError),
    #[error("engine setup failed: {0}")]
    Setup(GovernanceError),
    #[error("step {index} ({action}) failed: {source}")]
    StepFailed {
        index: usize,
        action: &'static str,
        source: StepError,
    },
}

/// Why a single step was rejected.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum StepError {
    #[error(transparent)]
    Engine(#[from] GovernanceError),
    #[error("invalid account name: {0}")]
    Account(TypesError),
    #[error("invalid application reference: {0}")]
    Application(TypesError),
}

/// Outcome of one scenario step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    pub index: usize,
    pub action: &'static str,
    /// Clock value when the step ran.
    pub at: u64,
    pub ok: bool,
    pub detail: String,
}

/// One row of the final proposal table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProposalRow {
    pub id: u64,
    pub kind: String,
    pub beneficiary: String,
    pub proposer: String,
    pub status: ProposalStatus,
    pub yes: u128,
    pub no: u128,
    pub voters: u64,
    pub bond: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Report {
    pub steps: Vec<StepRecord>,
    pub proposals: Vec<ProposalRow>,
    pub registry: Vec<String>,
    pub retained_bonds: String,
    pub finished_at: u64,
}

impl Report {
    pub fn failed_steps(&self) -> usize {
        self.steps.iter().filter(|s| !s.ok).count()
    }
}

pub struct Simulator {
    null: NullPorts,
    clock: NullClock,
    engine: GovernanceEngine,
    admin: AccountId,
}

impl Simulator {
    /// Wire the engine to in-memory collaborators seeded from `[[accounts]]`.
    pub fn new(config: &SimulatorConfig) -> Result<Self, SimulationError> {
        let settings = &config.governance;
        let null = NullPorts::new();
        let admin = AccountId::parse(&settings.admin)?;
        let custody = AccountId::parse(&settings.custody)?;
        let engine = GovernanceEngine::with_config(
            admin.clone(),
            custody.clone(),
            governance_config(settings),
            null.ports(),
        )
        .map_err(SimulationError::Setup)?;
        if let Some(sink) = &settings.forfeit_sink {
            engine
                .set_forfeit_sink(&admin, Some(AccountId::parse(sink)?))
                .map_err(SimulationError::Setup)?;
        }

        for spec in &config.accounts {
            let account = AccountId::parse(&spec.name)?;
            let balance = TokenAmount::from_tokens(u128::from(spec.balance_tokens));
            if !balance.is_zero() {
                null.bond_token.mint(&account, balance);
                null.bond_token.approve(&account, &custody, balance);
            }
            null.staking
                .set_power(&account, u128::from(spec.voice_credits));
            if spec.registered {
                null.registry.register(&account);
            }
        }
        info!(
            accounts = config.accounts.len(),
            steps = config.steps.len(),
            start = settings.start_time,
            "simulator ready"
        );

        Ok(Self {
            null,
            clock: NullClock::new(settings.start_time),
            engine,
            admin,
        })
    }

    pub fn engine(&self) -> &GovernanceEngine {
        &self.engine
    }

    pub fn now(&self) -> u64 {
        self.clock.now().as_secs()
    }

    /// Run every step. Without `strict`, failed steps are recorded and the
    /// run continues.
    pub fn run(&self, steps: &[Step], strict: bool) -> Result<Report, SimulationError> {
        let mut records = Vec::with_capacity(steps.len());
        for (index, step) in steps.iter().enumerate() {
            let at = self.now();
            match self.apply(step) {
                Ok(detail) => {
                    info!(index, action = step.action(), %detail, "step ok");
                    records.push(StepRecord {
                        index,
                        action: step.action(),
                        at,
                        ok: true,
                        detail,
                    });
                }
                Err(source) if !strict => {
                    warn!(index, action = step.action(), error = %source, "step failed");
                    records.push(StepRecord {
                        index,
                        action: step.action(),
                        at,
                        ok: false,
                        detail: source.to_string(),
                    });
                }
                Err(source) => {
                    return Err(SimulationError::StepFailed {
                        index,
                        action: step.action(),
                        source,
                    });
                }
            }
        }
        Ok(self.report(records))
    }

    fn apply(&self, step: &Step) -> Result<String, StepError> {
        let now = self.clock.now();
        match step {
            Step::Create {
                proposer,
                beneficiary,
                kind,
                application,
            } => {
                let application = match application {
                    Some(raw) if raw.starts_with("0x") => ContentRef::from_hex(raw),
                    Some(label) => ContentRef::from_label(label),
                    None => Ok(ContentRef::ZERO),
                }
                .map_err(StepError::Application)?;
                let id = self
                    .engine
                    .create_proposal(
                        &step_account(proposer)?,
                        &step_account(beneficiary)?,
                        application,
                        *kind,
                        now,
                    )?;
                Ok(format!("proposal {id}: {kind} of {beneficiary} by {proposer}"))
            }
            Step::Vote {
                proposal,
                voter,
                choice,
            } => {
                let phase = self
                    .engine
                    .vote(*proposal, &step_account(voter)?, *choice, now)?;
                Ok(format!("{voter} voted {choice:?} on {proposal}, now {phase}"))
            }
            Step::Advance { days, secs } => {
                let delta = days.saturating_mul(86_400).saturating_add(*secs);
                self.clock.advance(delta);
                Ok(format!(
                    "clock +{} to {}",
                    grantgov_utils::format_duration(delta),
                    self.now()
                ))
            }
            Step::Finalize { proposal } => {
                let status = self.engine.finalize(*proposal, now)?;
                Ok(format!("proposal {proposal} {status}"))
            }
            Step::Configure {
                caller,
                voting_period_secs,
                veto_period_secs,
                proposal_bond_tokens,
            } => {
                let caller = match caller {
                    Some(name) => step_account(name)?,
                    None => self.admin.clone(),
                };
                let version = self
                    .engine
                    .set_configuration(
                        &caller,
                        *voting_period_secs,
                        *veto_period_secs,
                        TokenAmount::from_tokens(u128::from(*proposal_bond_tokens)),
                    )?;
                Ok(format!("configuration v{version}"))
            }
        }
    }

    fn report(&self, steps: Vec<StepRecord>) -> Report {
        let now = self.clock.now();
        let proposals = self
            .engine
            .list_proposals(&ProposalFilter::default(), now)
            .into_iter()
            .map(|p| ProposalRow {
                id: p.id,
                kind: p.kind.to_string(),
                beneficiary: p.beneficiary.to_string(),
                proposer: p.proposer.to_string(),
                status: p.effective_status(now),
                yes: p.yes_count,
                no: p.no_count,
                voters: p.voter_count,
                bond: describe_bond(&p.bond),
            })
            .collect();
        Report {
            steps,
            proposals,
            registry: self
                .null
                .registry
                .beneficiaries()
                .iter()
                .map(ToString::to_string)
                .collect(),
            retained_bonds: self.engine.retained_bonds().to_string(),
            finished_at: now.as_secs(),
        }
    }
}

fn step_account(name: &str) -> Result<AccountId, StepError> {
    AccountId::parse(name).map_err(StepError::Account)
}

pub fn governance_config(settings: &GovernanceSettings) -> GovernanceConfig {
    GovernanceConfig {
        voting_period_secs: settings.voting_period_secs,
        veto_period_secs: settings.veto_period_secs,
        proposal_bond: TokenAmount::from_tokens(u128::from(settings.proposal_bond_tokens)),
    }
}

fn describe_bond(bond: &BondState) -> String {
    match bond {
        BondState::Locked(amount) => format!("locked {amount}"),
        BondState::Refunded(amount) => format!("refunded {amount}"),
        BondState::Forfeited {
            amount,
            sink: Some(sink),
        } => format!("forfeited {amount} to {sink}"),
        BondState::Forfeited { amount, sink: None } => format!("retained {amount}"),
    }
}
