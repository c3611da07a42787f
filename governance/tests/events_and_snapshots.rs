mod common;

use common::{account, bond, Harness, ONE_DAY};
use grantgov_governance::{
    EngineSnapshot, GovernanceEngine, GovernanceError, GovernanceEvent, ProposalStatus,
    ProposalType, VoteChoice,
};
use grantgov_nullables::NullPorts;
use grantgov_types::{ContentRef, GovernanceConfig, TokenAmount};
use std::sync::{Arc, Mutex};

#[test]
fn lifecycle_emits_events_in_order() {
    let null = NullPorts::new();
    let mut engine = GovernanceEngine::new(account("admin"), account("engine"), null.ports());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    engine.subscribe(Box::new(move |e| sink.lock().unwrap().push(e.clone())));

    let proposer = account("proposer");
    let voter = account("voter");
    null.bond_token.mint(&proposer, bond());
    null.bond_token.approve(&proposer, &account("engine"), bond());
    null.staking.set_power(&voter, 5);

    let start = grantgov_types::Timestamp::new(10_000);
    let id = engine
        .create_proposal(
            &proposer,
            &account("beneficiary"),
            ContentRef::ZERO,
            ProposalType::Nomination,
            start,
        )
        .unwrap();
    engine.vote(id, &voter, VoteChoice::Yes, start).unwrap();
    null.staking.set_power(&account("late"), 1);
    engine
        .vote(id, &account("late"), VoteChoice::No, start.plus(2 * ONE_DAY))
        .unwrap();
    engine.finalize(id, start.plus(4 * ONE_DAY)).unwrap();

    let events = seen.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            GovernanceEvent::ProposalCreated {
                id,
                proposer: proposer.clone(),
                beneficiary: account("beneficiary"),
                kind: ProposalType::Nomination,
                bond: bond(),
            },
            GovernanceEvent::VoteCast {
                id,
                voter: voter.clone(),
                choice: VoteChoice::Yes,
                weight: 5,
            },
            GovernanceEvent::ChallengeStarted { id },
            GovernanceEvent::VoteCast {
                id,
                voter: account("late"),
                choice: VoteChoice::No,
                weight: 1,
            },
            GovernanceEvent::Finalized {
                id,
                status: ProposalStatus::Passed,
                yes_count: 5,
                no_count: 1,
            },
            GovernanceEvent::BondRefunded {
                id,
                proposer,
                amount: bond(),
            },
        ]
    );
}

#[test]
fn rejected_calls_emit_nothing() {
    let null = NullPorts::new();
    let mut engine = GovernanceEngine::new(account("admin"), account("engine"), null.ports());
    let count = Arc::new(Mutex::new(0usize));
    let counter = Arc::clone(&count);
    engine.subscribe(Box::new(move |_| *counter.lock().unwrap() += 1));

    let now = grantgov_types::Timestamp::new(0);
    assert!(engine
        .create_proposal(
            &account("broke"),
            &account("b"),
            ContentRef::ZERO,
            ProposalType::Nomination,
            now,
        )
        .is_err());
    assert!(engine.vote(0, &account("v"), VoteChoice::Yes, now).is_err());
    assert!(engine
        .set_configuration(&account("mallory"), 1, 1, TokenAmount::ZERO)
        .is_err());
    assert_eq!(*count.lock().unwrap(), 0);
}

#[test]
fn snapshot_restores_and_keeps_running() {
    let h = Harness::new();
    h.engine
        .set_configuration(&h.admin, ONE_DAY, ONE_DAY, TokenAmount::from_tokens(10))
        .unwrap();
    let failed = h.propose("p", "loser", ProposalType::Nomination).unwrap();
    let open = h.propose("p", "winner", ProposalType::Nomination).unwrap();
    h.vote(open, "v1", 9, VoteChoice::Yes).unwrap();
    h.clock.advance(ONE_DAY);
    h.finalize(failed).unwrap();

    let bytes = h.engine.snapshot().to_bytes().unwrap();
    let snapshot = EngineSnapshot::from_bytes(&bytes).unwrap();
    assert_eq!(snapshot.config_version, 1);
    assert_eq!(snapshot.retained_bonds, TokenAmount::from_tokens(10));

    let restored = GovernanceEngine::restore(snapshot, h.null.ports()).unwrap();
    assert_eq!(restored.number_of_proposals(), 2);
    assert_eq!(restored.configuration().proposal_bond, TokenAmount::from_tokens(10));
    assert_eq!(restored.open_proposal_for(&account("winner")), Some(open));
    assert_eq!(restored.open_proposal_for(&account("loser")), None);
    assert!(restored.has_voted(open, &account("v1")).unwrap());

    // The restored engine still rejects a repeat vote and finishes the lifecycle.
    h.null.staking.set_power(&account("v1"), 9);
    assert!(matches!(
        restored.vote(open, &account("v1"), VoteChoice::No, h.clock.now()),
        Err(GovernanceError::DuplicateVote { .. })
    ));
    h.clock.advance(ONE_DAY);
    assert_eq!(
        restored.finalize(open, h.clock.now()).unwrap(),
        ProposalStatus::Passed
    );
    assert!(h.is_registered("winner"));
}

#[test]
fn restore_rejects_tampered_snapshot() {
    let h = Harness::new();
    let id = h.propose("p", "b", ProposalType::Nomination).unwrap();
    h.vote(id, "v1", 3, VoteChoice::Yes).unwrap();

    let mut snapshot = h.engine.snapshot();
    snapshot.proposals[0].voter_count = 2;
    assert!(matches!(
        GovernanceEngine::restore(snapshot, h.null.ports()),
        Err(GovernanceError::CorruptSnapshot(_))
    ));

    let mut snapshot = h.engine.snapshot();
    snapshot.config = GovernanceConfig {
        voting_period_secs: 0,
        ..GovernanceConfig::default()
    };
    assert!(GovernanceEngine::restore(snapshot, h.null.ports()).is_err());
}
