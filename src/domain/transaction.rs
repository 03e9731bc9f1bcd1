use chrono::{DateTime, Utc};

use super::Cents;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "DEPOSIT",
            TransactionKind::Withdrawal => "WITHDRAWAL",
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single balance movement on an account.
/// Transactions are immutable once appended to an account's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub kind: TransactionKind,
    /// Amount in cents (always positive)
    pub amount_cents: Cents,
    /// Account balance right after this transaction was applied
    pub balance_after: Cents,
    /// When the transaction was recorded
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    pub fn new(kind: TransactionKind, amount_cents: Cents, balance_after: Cents) -> Self {
        assert!(amount_cents > 0, "Transaction amount must be positive");
        Self {
            kind,
            amount_cents,
            balance_after,
            timestamp: Utc::now(),
        }
    }
}
