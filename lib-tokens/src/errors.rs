//! Token Ledger Errors

use lib_types::Amount;
use thiserror::Error;

/// Error during token operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Zero amount not allowed")]
    ZeroAmount,

    #[error("Insufficient payment: sent {sent} wei, required {required} wei")]
    InsufficientPayment { sent: Amount, required: Amount },

    #[error("Insufficient reserve: available {available}, requested {requested}")]
    InsufficientReserve { available: Amount, requested: Amount },

    #[error("Insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: Amount, need: Amount },

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Invalid token configuration: {0}")]
    InvalidConfig(String),

    #[error("Conservation invariant violated: {0}")]
    ConservationViolated(String),
}

/// Result type for token operations
pub type TokenResult<T> = Result<T, TokenError>;
