pub mod application;
pub mod cli;
pub mod domain;

pub use application::{AppError, BankService};
pub use domain::*;
