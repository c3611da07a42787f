//! Effective phase of a proposal as a pure function of time and tally.
//!
//! Stored status only changes on a vote or finalize call, so the live phase is
//! always re-derived here. There are no timers.
//!
//! ```text
//! start            start+V                  start+V+Vt
//!   |---- New -------|--- ChallengePeriod ----|--- PendingFinalization --->
//!                    |   (only if yes > no at V; otherwise PendingFinalization)
//! ```

use crate::proposal::ProposalStatus;
use grantgov_types::Timestamp;

/// Derive the phase a proposal is in at `now`.
///
/// `yes`/`no` are only consulted when the stored status is still `New` past
/// the initial window, which means no vote has landed since that window
/// closed, so they are exactly the tally at `start + voting_period`.
pub fn effective_status(
    now: Timestamp,
    start: Timestamp,
    voting_period_secs: u64,
    veto_period_secs: u64,
    stored: ProposalStatus,
    yes: u128,
    no: u128,
) -> ProposalStatus {
    if stored.is_terminal() {
        return stored;
    }
    if !start.has_expired(voting_period_secs, now) {
        return ProposalStatus::New;
    }
    let voting_end = start.plus(voting_period_secs);
    if voting_end.has_expired(veto_period_secs, now) {
        return ProposalStatus::PendingFinalization;
    }
    match stored {
        ProposalStatus::ChallengePeriod => ProposalStatus::ChallengePeriod,
        ProposalStatus::New if yes > no => ProposalStatus::ChallengePeriod,
        _ => ProposalStatus::PendingFinalization,
    }
}
