//! Primitive parsing errors

use thiserror::Error;

/// Error parsing an address from text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressParseError {
    #[error("Address must have 40 hex digits, got {0}")]
    InvalidLength(usize),

    #[error("Address is not valid hex: {0}")]
    InvalidHex(String),
}

/// Error converting between human-readable units and smallest units
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnitsError {
    #[error("Empty amount")]
    Empty,

    #[error("Invalid digit in amount: {0:?}")]
    InvalidDigit(String),

    #[error("Too many fractional digits: max {max}, got {got}")]
    TooManyDecimals { max: u32, got: usize },

    #[error("Amount does not fit in 256 bits")]
    Overflow,
}
