use thiserror::Error;

use crate::domain::{AccountError, Cents};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] AccountError),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Insufficient funds in account {account_number}: balance {balance}, required {required}")]
    InsufficientFunds {
        account_number: String,
        balance: Cents,
        required: Cents,
    },

    #[error("Input closed")]
    Interrupted,
}

impl AppError {
    /// True for errors caused by what the user typed, as opposed to the session itself.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AppError::InvalidInput(_)
                | AppError::InvalidAmount(_)
                | AppError::InsufficientFunds { .. }
        )
    }
}
