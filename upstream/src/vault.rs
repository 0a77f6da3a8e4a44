use capstan_types::Account;

use crate::VaultError;

/// The wrapping value vault holding the underlying value token.
///
/// The fee distributor moves bonded and unbonding funds through this trait;
/// the vault in turn reports user balance increases to the distributor's
/// maturation queue via `BondingFeeDistributor::notify_balance_increase`.
pub trait ValueVault {
    fn balance_of(&self, account: &Account) -> u128;

    fn transfer(&mut self, from: &Account, to: &Account, amount: u128)
        -> Result<(), VaultError>;
}
