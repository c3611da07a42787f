mod common;

use common::{account, Harness, ONE_DAY};
use grantgov_governance::phase::effective_status;
use grantgov_governance::{GovernanceError, ProposalStatus, ProposalType, VoteChoice};
use grantgov_types::Timestamp;
use proptest::prelude::*;

fn choice() -> impl Strategy<Value = VoteChoice> {
    prop_oneof![Just(VoteChoice::Yes), Just(VoteChoice::No)]
}

proptest! {
    /// voter_count == |voted_by| and tallies equal the sum of accepted weights,
    /// whatever mix of repeat voters and zero-power accounts shows up.
    #[test]
    fn tally_matches_accepted_votes(
        ballots in prop::collection::vec((0u8..12, 0u128..1_000, choice()), 0..60),
    ) {
        let h = Harness::new();
        let id = h.propose("p", "b", ProposalType::Nomination).unwrap();
        let (mut yes, mut no, mut accepted) = (0u128, 0u128, 0u64);

        for (voter, power, choice) in ballots {
            let name = format!("v{voter}");
            match h.vote(id, &name, power, choice) {
                Ok(_) => {
                    accepted += 1;
                    match choice {
                        VoteChoice::Yes => yes += power,
                        VoteChoice::No => no += power,
                    }
                }
                Err(GovernanceError::NoVotingPower(_)) => prop_assert_eq!(power, 0),
                Err(GovernanceError::DuplicateVote { .. }) => {
                    prop_assert!(h.engine.has_voted(id, &account(&name)).unwrap())
                }
                Err(other) => prop_assert!(false, "unexpected error {other}"),
            }
        }

        let p = h.engine.get_proposal(id).unwrap();
        prop_assert_eq!(p.voter_count, p.voted_by.len() as u64);
        prop_assert_eq!(p.voter_count, accepted);
        prop_assert_eq!(p.yes_count, yes);
        prop_assert_eq!(p.no_count, no);
    }

    /// Stored status never moves backwards, and finalization passes iff Yes leads.
    #[test]
    fn status_is_monotone_and_outcome_follows_tally(
        steps in prop::collection::vec((0u64..ONE_DAY, 1u128..100, choice()), 1..40),
    ) {
        let h = Harness::new();
        let id = h.propose("p", "b", ProposalType::Nomination).unwrap();
        let mut last = ProposalStatus::New;

        for (i, (gap, power, choice)) in steps.into_iter().enumerate() {
            h.clock.advance(gap);
            let _ = h.vote(id, &format!("v{i}"), power, choice);
            let status = h.engine.get_proposal(id).unwrap().status;
            prop_assert!(status >= last, "{status} after {last}");
            last = status;
        }

        h.clock.advance(4 * ONE_DAY);
        let p = h.engine.get_proposal(id).unwrap();
        let outcome = h.finalize(id).unwrap();
        prop_assert_eq!(outcome == ProposalStatus::Passed, p.yes_count > p.no_count);
    }

    /// The derived phase never regresses as time moves forward.
    #[test]
    fn effective_status_is_monotone_in_time(
        v in 1u64..10_000,
        vt in 1u64..10_000,
        yes in 0u128..100,
        no in 0u128..100,
        t1 in 0u64..30_000,
        dt in 0u64..30_000,
    ) {
        let start = Timestamp::new(1_000);
        let a = effective_status(Timestamp::new(1_000 + t1), start, v, vt, ProposalStatus::New, yes, no);
        let b = effective_status(Timestamp::new(1_000 + t1 + dt), start, v, vt, a, yes, no);
        prop_assert!(b >= a, "{b} after {a}");
    }
}
