//! Nullable infrastructure for deterministic testing.
//!
//! Every collaborator the governance engine talks to (staking ledger,
//! beneficiary registry, bond token, clock) has an in-memory version here that:
//! - Returns deterministic values
//! - Can be controlled programmatically, including injected failures
//! - Never touches the filesystem or network
//!
//! Usage: wire these into `Ports` in tests and in the simulator.

pub mod clock;
pub mod registry;
pub mod staking;
pub mod token;

pub use clock::NullClock;
pub use registry::NullRegistry;
pub use staking::NullStaking;
pub use token::NullBondToken;

use grantgov_governance::Ports;
use std::sync::Arc;

/// A full set of nullable collaborators plus the `Ports` view over them.
pub struct NullPorts {
    pub staking: Arc<NullStaking>,
    pub registry: Arc<NullRegistry>,
    pub bond_token: Arc<NullBondToken>,
}

impl NullPorts {
    pub fn new() -> Self {
        Self {
            staking: Arc::new(NullStaking::new()),
            registry: Arc::new(NullRegistry::new()),
            bond_token: Arc::new(NullBondToken::new()),
        }
    }

    pub fn ports(&self) -> Ports {
        Ports::new(
            self.staking.clone(),
            self.registry.clone(),
            self.bond_token.clone(),
        )
    }
}

impl Default for NullPorts {
    fn default() -> Self {
        Self::new()
    }
}
