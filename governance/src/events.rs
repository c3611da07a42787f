//! Events emitted by the engine after a state change commits.

use crate::proposal::{ProposalId, ProposalStatus, ProposalType, VoteChoice};
use grantgov_types::{AccountId, TokenAmount};
use serde::{Deserialize, Serialize};

/// Governance events that observers can subscribe to via the [`EventBus`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GovernanceEvent {
    /// A proposal was created and its bond locked.
    ProposalCreated {
        id: ProposalId,
        proposer: AccountId,
        beneficiary: AccountId,
        kind: ProposalType,
        bond: TokenAmount,
    },
    /// A vote was counted.
    VoteCast {
        id: ProposalId,
        voter: AccountId,
        choice: VoteChoice,
        weight: u128,
    },
    /// The initial window closed with Yes ahead; the veto window is open.
    ChallengeStarted { id: ProposalId },
    /// The proposal reached a terminal status.
    Finalized {
        id: ProposalId,
        status: ProposalStatus,
        yes_count: u128,
        no_count: u128,
    },
    BondRefunded {
        id: ProposalId,
        proposer: AccountId,
        amount: TokenAmount,
    },
    /// `sink` is `None` when the bond stayed in engine custody.
    BondForfeited {
        id: ProposalId,
        amount: TokenAmount,
        sink: Option<AccountId>,
    },
    ConfigurationUpdated { version: u64 },
    AdminTransferred { from: AccountId, to: AccountId },
}

type Listener = Box<dyn Fn(&GovernanceEvent) + Send + Sync>;

/// Synchronous fan-out event bus.
///
/// Listeners run inline on the calling thread after the engine has released
/// the proposal lock; keep them fast.
pub struct EventBus {
    listeners: Vec<Listener>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Listener) {
        self.listeners.push(listener);
    }

    pub fn emit(&self, event: &GovernanceEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn every_listener_sees_each_event() {
        let mut bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let hits = Arc::clone(&hits);
            bus.subscribe(Box::new(move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            }));
        }
        bus.emit(&GovernanceEvent::ChallengeStarted { id: 4 });
        bus.emit(&GovernanceEvent::ConfigurationUpdated { version: 1 });
        assert_eq!(hits.load(Ordering::SeqCst), 6);
        assert_eq!(bus.listener_count(), 3);
    }
}
