use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Cents, Transaction, TransactionKind, format_currency};

/// A 10-digit account handle, e.g. "0412958837".
pub type AccountNumber = String;

pub const ACCOUNT_NUMBER_LEN: usize = 10;

const ACCOUNT_NUMBER_SPACE: u128 = 10_000_000_000;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Draw a pseudo-random 10-digit account number.
/// Uniqueness is not guaranteed here; the ledger re-rolls on collision.
pub fn generate_account_number() -> AccountNumber {
    let n = Uuid::new_v4().as_u128() % ACCOUNT_NUMBER_SPACE;
    format!("{:0width$}", n, width = ACCOUNT_NUMBER_LEN)
}

/// An account holds a balance and the append-only log of every movement on it.
///
/// The balance never goes below zero: [`Account::withdraw`] is the only way
/// to lower it, and it refuses to overdraw.
#[derive(Debug, Clone)]
pub struct Account {
    number: AccountNumber,
    holder_name: String,
    balance: Cents,
    history: Vec<Transaction>,
    opened_at: DateTime<Utc>,
}

impl Account {
    /// Open an account. The initial balance is not logged as a transaction.
    pub fn new(
        number: AccountNumber,
        holder_name: &str,
        initial_balance: Cents,
    ) -> Result<Self, AccountError> {
        let holder_name = holder_name.trim();
        if holder_name.is_empty() {
            return Err(AccountError::EmptyHolderName);
        }
        if initial_balance < 0 {
            return Err(AccountError::NegativeInitialBalance(initial_balance));
        }

        Ok(Self {
            number,
            holder_name: holder_name.to_string(),
            balance: initial_balance,
            history: Vec::new(),
            opened_at: Utc::now(),
        })
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn holder_name(&self) -> &str {
        &self.holder_name
    }

    pub fn balance(&self) -> Cents {
        self.balance
    }

    pub fn history(&self) -> &[Transaction] {
        &self.history
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    /// When the latest transaction was recorded, if there is one.
    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.history.last().map(|tx| tx.timestamp)
    }

    /// Credit the account. Returns false, leaving the account untouched,
    /// unless `amount` is positive.
    pub fn deposit(&mut self, amount: Cents) -> bool {
        if amount <= 0 {
            return false;
        }
        let Some(new_balance) = self.balance.checked_add(amount) else {
            return false;
        };
        self.apply(TransactionKind::Deposit, amount, new_balance);
        true
    }

    /// Debit the account. Returns false, leaving the account untouched,
    /// unless `0 < amount <= balance`.
    pub fn withdraw(&mut self, amount: Cents) -> bool {
        if amount <= 0 || amount > self.balance {
            return false;
        }
        self.apply(TransactionKind::Withdrawal, amount, self.balance - amount);
        true
    }

    fn apply(&mut self, kind: TransactionKind, amount: Cents, new_balance: Cents) {
        self.balance = new_balance;
        self.history.push(Transaction::new(kind, amount, new_balance));
    }

    /// Multi-line account card used by the balance screen.
    pub fn summary(&self, currency: &str) -> String {
        let mut card = format!(
            "=== Account Information ===\n\
             Account Holder: {}\n\
             Account Number: {}\n\
             Current Balance: {}\n\
             Opened: {}",
            self.holder_name,
            self.number,
            format_currency(self.balance, currency),
            self.opened_at.format(TIMESTAMP_FORMAT)
        );
        if let Some(at) = self.last_activity() {
            card.push_str(&format!("\nLast activity: {}", at.format(TIMESTAMP_FORMAT)));
        }
        card
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountError {
    EmptyHolderName,
    NegativeInitialBalance(Cents),
}

impl std::fmt::Display for AccountError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountError::EmptyHolderName => write!(f, "Name cannot be empty"),
            AccountError::NegativeInitialBalance(cents) => {
                write!(f, "Initial deposit cannot be negative ({} cents)", cents)
            }
        }
    }
}

impl std::error::Error for AccountError {}
