// Application layer - use cases over the in-memory ledger.
// Front ends never touch the domain types' mutators directly; they go
// through BankService so that every failure surfaces as an AppError.

pub mod error;
pub mod service;

pub use error::*;
pub use service::*;
