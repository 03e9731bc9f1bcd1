use std::collections::HashMap;

use super::{Account, AccountError, AccountNumber, Cents, generate_account_number};

/// All accounts known to the running session.
///
/// Accounts are kept in opening order; the index map gives O(1) lookup by
/// account number.
#[derive(Debug, Default)]
pub struct Ledger {
    accounts: Vec<Account>,
    index: HashMap<AccountNumber, usize>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new account under a freshly generated, unused account number.
    pub fn open_account(
        &mut self,
        holder_name: &str,
        initial_balance: Cents,
    ) -> Result<&Account, AccountError> {
        self.open_account_with(holder_name, initial_balance, generate_account_number)
    }

    /// Like [`Ledger::open_account`], drawing candidate numbers from `generate`.
    /// Candidates already in use are discarded and redrawn.
    pub fn open_account_with<F>(
        &mut self,
        holder_name: &str,
        initial_balance: Cents,
        mut generate: F,
    ) -> Result<&Account, AccountError>
    where
        F: FnMut() -> AccountNumber,
    {
        let number = loop {
            let candidate = generate();
            if !self.index.contains_key(&candidate) {
                break candidate;
            }
        };

        let account = Account::new(number.clone(), holder_name, initial_balance)?;
        let slot = self.accounts.len();
        self.accounts.push(account);
        self.index.insert(number, slot);
        Ok(&self.accounts[slot])
    }

    pub fn get(&self, number: &str) -> Option<&Account> {
        self.index.get(number).map(|&slot| &self.accounts[slot])
    }

    pub fn get_mut(&mut self, number: &str) -> Option<&mut Account> {
        let slot = *self.index.get(number)?;
        self.accounts.get_mut(slot)
    }

    /// Accounts in the order they were opened.
    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}
