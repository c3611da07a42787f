//! Nullable staking ledger: voice credits set directly by the test.

use grantgov_governance::{PortError, VotingPowerSource};
use grantgov_types::AccountId;
use std::collections::HashMap;
use std::sync::Mutex;

/// An in-memory voting power source. Unknown accounts have zero power.
pub struct NullStaking {
    credits: Mutex<HashMap<AccountId, u128>>,
    outage: Mutex<Option<String>>,
}

impl NullStaking {
    pub fn new() -> Self {
        Self {
            credits: Mutex::new(HashMap::new()),
            outage: Mutex::new(None),
        }
    }

    /// Set the voice credits `account` will report.
    pub fn set_power(&self, account: &AccountId, credits: u128) {
        self.credits.lock().unwrap().insert(account.clone(), credits);
    }

    /// Make every lookup fail with `reason` until cleared with `None`.
    pub fn set_outage(&self, reason: Option<&str>) {
        *self.outage.lock().unwrap() = reason.map(str::to_string);
    }
}

impl Default for NullStaking {
    fn default() -> Self {
        Self::new()
    }
}

impl VotingPowerSource for NullStaking {
    fn power_of(&self, account: &AccountId) -> Result<u128, PortError> {
        if let Some(reason) = self.outage.lock().unwrap().clone() {
            return Err(PortError::Unavailable(reason));
        }
        Ok(self
            .credits
            .lock()
            .unwrap()
            .get(account)
            .copied()
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_accounts_have_no_power() {
        let staking = NullStaking::new();
        let a = AccountId::new("a");
        assert_eq!(staking.power_of(&a).unwrap(), 0);
        staking.set_power(&a, 40);
        assert_eq!(staking.power_of(&a).unwrap(), 40);
    }

    #[test]
    fn outage_fails_lookups() {
        let staking = NullStaking::new();
        staking.set_outage(Some("node down"));
        assert!(staking.power_of(&AccountId::new("a")).is_err());
        staking.set_outage(None);
        assert!(staking.power_of(&AccountId::new("a")).is_ok());
    }
}
