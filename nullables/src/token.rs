//! Nullable bond token with balances, allowances and pull transfers.

use grantgov_governance::{BondToken, PortError};
use grantgov_types::{AccountId, TokenAmount};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
struct Ledger {
    balances: HashMap<AccountId, u128>,
    /// (owner, spender) → remaining approval.
    allowances: HashMap<(AccountId, AccountId), u128>,
}

/// An in-memory fungible token.
pub struct NullBondToken {
    ledger: Mutex<Ledger>,
    fail_next_transfer: Mutex<Option<String>>,
}

impl NullBondToken {
    pub fn new() -> Self {
        Self {
            ledger: Mutex::new(Ledger::default()),
            fail_next_transfer: Mutex::new(None),
        }
    }

    pub fn mint(&self, to: &AccountId, amount: TokenAmount) {
        let mut ledger = self.ledger.lock().unwrap();
        let balance = ledger.balances.entry(to.clone()).or_insert(0);
        *balance = balance.saturating_add(amount.raw());
    }

    /// Let `spender` pull up to `amount` from `owner` (replaces any prior approval).
    pub fn approve(&self, owner: &AccountId, spender: &AccountId, amount: TokenAmount) {
        self.ledger
            .lock()
            .unwrap()
            .allowances
            .insert((owner.clone(), spender.clone()), amount.raw());
    }

    pub fn balance_of(&self, account: &AccountId) -> TokenAmount {
        TokenAmount::new(
            self.ledger
                .lock()
                .unwrap()
                .balances
                .get(account)
                .copied()
                .unwrap_or(0),
        )
    }

    pub fn allowance(&self, owner: &AccountId, spender: &AccountId) -> TokenAmount {
        TokenAmount::new(
            self.ledger
                .lock()
                .unwrap()
                .allowances
                .get(&(owner.clone(), spender.clone()))
                .copied()
                .unwrap_or(0),
        )
    }

    /// Make the next `transfer` or `transfer_from` fail with `reason`.
    pub fn fail_next_transfer(&self, reason: &str) {
        *self.fail_next_transfer.lock().unwrap() = Some(reason.to_string());
    }

    fn take_injected_failure(&self) -> Result<(), PortError> {
        match self.fail_next_transfer.lock().unwrap().take() {
            Some(reason) => Err(PortError::Unavailable(reason)),
            None => Ok(()),
        }
    }
}

impl Default for NullBondToken {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    /// Remaining approval if `payer` can cover `amount` for `spender`.
    fn check_pull(&self, payer: &AccountId, spender: &AccountId, amount: u128) -> Result<u128, PortError> {
        let approved = self
            .allowances
            .get(&(payer.clone(), spender.clone()))
            .copied()
            .unwrap_or(0);
        if approved < amount {
            return Err(PortError::InsufficientAllowance {
                needed: amount,
                approved,
            });
        }
        let available = self.balances.get(payer).copied().unwrap_or(0);
        if available < amount {
            return Err(PortError::InsufficientBalance {
                needed: amount,
                available,
            });
        }
        Ok(approved)
    }

    fn move_balance(&mut self, from: &AccountId, to: &AccountId, amount: u128) -> Result<(), PortError> {
        let available = self.balances.get(from).copied().unwrap_or(0);
        if available < amount {
            return Err(PortError::InsufficientBalance {
                needed: amount,
                available,
            });
        }
        self.balances.insert(from.clone(), available - amount);
        let to_balance = self.balances.entry(to.clone()).or_insert(0);
        *to_balance = to_balance.saturating_add(amount);
        Ok(())
    }
}

impl BondToken for NullBondToken {
    fn can_pull(
        &self,
        payer: &AccountId,
        custodian: &AccountId,
        amount: TokenAmount,
    ) -> Result<(), PortError> {
        self.ledger
            .lock()
            .unwrap()
            .check_pull(payer, custodian, amount.raw())
            .map(|_| ())
    }

    fn transfer_from(
        &self,
        payer: &AccountId,
        custodian: &AccountId,
        amount: TokenAmount,
    ) -> Result<(), PortError> {
        self.take_injected_failure()?;
        let mut ledger = self.ledger.lock().unwrap();
        let approved = ledger.check_pull(payer, custodian, amount.raw())?;
        ledger.move_balance(payer, custodian, amount.raw())?;
        ledger
            .allowances
            .insert((payer.clone(), custodian.clone()), approved - amount.raw());
        Ok(())
    }

    fn transfer(
        &self,
        custodian: &AccountId,
        payee: &AccountId,
        amount: TokenAmount,
    ) -> Result<(), PortError> {
        self.take_injected_failure()?;
        self.ledger
            .lock()
            .unwrap()
            .move_balance(custodian, payee, amount.raw())
    }
}
