//! Nullable value vault — in-memory balances for testing.

use capstan_types::Account;
use capstan_upstream::{ValueVault, VaultError};
use std::collections::HashMap;

/// An in-memory vault. Balances start at zero; `mint` funds accounts.
#[derive(Default)]
pub struct NullVault {
    balances: HashMap<Account, u128>,
}

impl NullVault {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mint(&mut self, account: &Account, amount: u128) {
        *self.balances.entry(account.clone()).or_insert(0) += amount;
    }
}

impl ValueVault for NullVault {
    fn balance_of(&self, account: &Account) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn transfer(
        &mut self,
        from: &Account,
        to: &Account,
        amount: u128,
    ) -> Result<(), VaultError> {
        let available = self.balance_of(from);
        if amount > available {
            return Err(VaultError::InsufficientFunds {
                needed: amount,
                available,
            });
        }
        *self.balances.entry(from.clone()).or_insert(0) -= amount;
        *self.balances.entry(to.clone()).or_insert(0) += amount;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(name: &str) -> Account {
        Account::new(format!("cap_{name}"))
    }

    #[test]
    fn transfers_move_balances() {
        let mut vault = NullVault::new();
        let (a, b) = (account("a"), account("b"));
        vault.mint(&a, 100);
        vault.transfer(&a, &b, 30).unwrap();
        assert_eq!(vault.balance_of(&a), 70);
        assert_eq!(vault.balance_of(&b), 30);
    }

    #[test]
    fn overdrafts_are_rejected() {
        let mut vault = NullVault::new();
        let (a, b) = (account("a"), account("b"));
        vault.mint(&a, 10);
        let err = vault.transfer(&a, &b, 11).unwrap_err();
        assert_eq!(
            err,
            VaultError::InsufficientFunds {
                needed: 11,
                available: 10
            }
        );
    }
}
