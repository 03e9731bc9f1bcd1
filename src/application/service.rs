use tracing::{debug, info};

use crate::domain::{Account, Cents, Ledger, format_cents};

use super::AppError;

/// Application service providing high-level operations on the ledger.
/// This is the interface any front end (the interactive session, tests) talks to.
#[derive(Debug, Default)]
pub struct BankService {
    ledger: Ledger,
}

impl BankService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a service over an existing ledger.
    pub fn with_ledger(ledger: Ledger) -> Self {
        Self { ledger }
    }

    // ========================
    // Account operations
    // ========================

    /// Open a new account and return it.
    pub fn open_account(
        &mut self,
        holder_name: &str,
        initial_cents: Cents,
    ) -> Result<&Account, AppError> {
        let account = self
            .ledger
            .open_account(holder_name, initial_cents)
            .inspect_err(|e| debug!(error = %e, "account rejected"))?;

        info!(
            account = account.number(),
            holder = account.holder_name(),
            initial = %format_cents(account.balance()),
            "account opened"
        );
        Ok(account)
    }

    /// Look up an account by number.
    pub fn account(&self, number: &str) -> Result<&Account, AppError> {
        self.ledger
            .get(number)
            .ok_or_else(|| AppError::AccountNotFound(number.to_string()))
    }

    /// All accounts, in the order they were opened.
    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.ledger.accounts().iter()
    }

    pub fn account_count(&self) -> usize {
        self.ledger.len()
    }

    // ========================
    // Balance operations
    // ========================

    /// Deposit into an account. Returns the new balance.
    pub fn deposit(&mut self, number: &str, amount_cents: Cents) -> Result<Cents, AppError> {
        let account = self.account_mut(number)?;

        if !account.deposit(amount_cents) {
            debug!(account = number, amount = amount_cents, "deposit rejected");
            let reason = if amount_cents <= 0 {
                "Deposit amount must be positive"
            } else {
                "Deposit would overflow the account balance"
            };
            return Err(AppError::InvalidAmount(reason.to_string()));
        }

        info!(
            account = number,
            amount = %format_cents(amount_cents),
            balance = %format_cents(account.balance()),
            "deposit"
        );
        Ok(account.balance())
    }

    /// Withdraw from an account. Returns the new balance.
    pub fn withdraw(&mut self, number: &str, amount_cents: Cents) -> Result<Cents, AppError> {
        let account = self.account_mut(number)?;
        let balance = account.balance();

        if !account.withdraw(amount_cents) {
            debug!(account = number, amount = amount_cents, "withdrawal rejected");
            if amount_cents <= 0 {
                return Err(AppError::InvalidAmount(
                    "Withdrawal amount must be positive".to_string(),
                ));
            }
            return Err(AppError::InsufficientFunds {
                account_number: number.to_string(),
                balance,
                required: amount_cents,
            });
        }

        info!(
            account = number,
            amount = %format_cents(amount_cents),
            balance = %format_cents(account.balance()),
            "withdrawal"
        );
        Ok(account.balance())
    }

    fn account_mut(&mut self, number: &str) -> Result<&mut Account, AppError> {
        self.ledger
            .get_mut(number)
            .ok_or_else(|| AppError::AccountNotFound(number.to_string()))
    }
}
