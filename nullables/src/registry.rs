//! Nullable beneficiary registry: thread-safe in-memory set.

use grantgov_governance::{BeneficiaryRegistry, PortError};
use grantgov_types::AccountId;
use std::collections::BTreeSet;
use std::sync::Mutex;

/// An in-memory beneficiary registry.
///
/// Adding an existing beneficiary or removing a missing one fails, like the
/// real registry. The next mutation can be made to fail on demand.
pub struct NullRegistry {
    beneficiaries: Mutex<BTreeSet<AccountId>>,
    fail_next_mutation: Mutex<Option<String>>,
    mutations: Mutex<u64>,
}

impl NullRegistry {
    pub fn new() -> Self {
        Self {
            beneficiaries: Mutex::new(BTreeSet::new()),
            fail_next_mutation: Mutex::new(None),
            mutations: Mutex::new(0),
        }
    }

    /// Seed a beneficiary directly, bypassing governance.
    pub fn register(&self, beneficiary: &AccountId) {
        self.beneficiaries.lock().unwrap().insert(beneficiary.clone());
    }

    /// Make the next `add` or `remove` fail with `reason`.
    pub fn fail_next_mutation(&self, reason: &str) {
        *self.fail_next_mutation.lock().unwrap() = Some(reason.to_string());
    }

    /// Number of successful `add`/`remove` calls.
    pub fn mutation_count(&self) -> u64 {
        *self.mutations.lock().unwrap()
    }

    pub fn beneficiaries(&self) -> Vec<AccountId> {
        self.beneficiaries.lock().unwrap().iter().cloned().collect()
    }

    fn take_injected_failure(&self) -> Result<(), PortError> {
        match self.fail_next_mutation.lock().unwrap().take() {
            Some(reason) => Err(PortError::Unavailable(reason)),
            None => Ok(()),
        }
    }
}

impl Default for NullRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BeneficiaryRegistry for NullRegistry {
    fn exists(&self, beneficiary: &AccountId) -> Result<bool, PortError> {
        Ok(self.beneficiaries.lock().unwrap().contains(beneficiary))
    }

    fn add(&self, beneficiary: &AccountId) -> Result<(), PortError> {
        self.take_injected_failure()?;
        if !self.beneficiaries.lock().unwrap().insert(beneficiary.clone()) {
            return Err(PortError::AlreadyRegistered(beneficiary.to_string()));
        }
        *self.mutations.lock().unwrap() += 1;
        Ok(())
    }

    fn remove(&self, beneficiary: &AccountId) -> Result<(), PortError> {
        self.take_injected_failure()?;
        if !self.beneficiaries.lock().unwrap().remove(beneficiary) {
            return Err(PortError::NotRegistered(beneficiary.to_string()));
        }
        *self.mutations.lock().unwrap() += 1;
        Ok(())
    }
}
