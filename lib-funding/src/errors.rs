//! Funding Engine Errors

use lib_tokens::TokenError;
use lib_types::{Address, Amount, Bps};
use thiserror::Error;

use crate::escrow::FundingState;

/// Error during escrow, sponsor or distribution operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FundingError {
    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("Invalid campaign state: expected {expected}, found {found}")]
    InvalidState {
        expected: FundingState,
        found: FundingState,
    },

    #[error("Goal not reached: collected {collected}, goal {goal}")]
    GoalNotReached { collected: Amount, goal: Amount },

    #[error("Withdrawal exceeds contribution: contributed {contributed}, requested {requested}")]
    ExceedsContribution { contributed: Amount, requested: Amount },

    #[error("Match base {requested} does not equal collected {collected}")]
    MatchBaseMismatch { collected: Amount, requested: Amount },

    #[error("Campaign {0} is not allow-listed for sponsorship")]
    NotAllowed(Address),

    #[error("Insufficient sponsor balance: available {available}, match {required}")]
    InsufficientSponsorBalance { available: Amount, required: Amount },

    #[error("Shares exceeded: total would be {total} bps (max 10000)")]
    SharesExceeded { total: u32 },

    #[error("Nothing to claim for {0}")]
    NothingToClaim(Address),

    #[error("Unauthorized: {caller} may not {action}")]
    Unauthorized { caller: Address, action: String },

    #[error("Campaign already funded")]
    AlreadyFunded,

    #[error("Zero amount not allowed")]
    ZeroAmount,

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Invalid basis points: {0} (max 10000)")]
    InvalidBps(Bps),

    #[error("Unknown campaign: {0}")]
    UnknownCampaign(Address),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Unknown funding state tag: {0:?}")]
    UnknownStateTag(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl FundingError {
    /// Stable snake_case name of the error kind, for logs and script output
    pub fn kind(&self) -> &'static str {
        match self {
            FundingError::Token(TokenError::ZeroAmount) => "zero_amount",
            FundingError::Token(TokenError::InsufficientPayment { .. }) => "insufficient_payment",
            FundingError::Token(TokenError::InsufficientReserve { .. }) => "insufficient_reserve",
            FundingError::Token(TokenError::InsufficientBalance { .. }) => "insufficient_balance",
            FundingError::Token(TokenError::Overflow) => "overflow",
            FundingError::Token(TokenError::InvalidConfig(_)) => "config",
            FundingError::Token(TokenError::ConservationViolated(_)) => "conservation_violated",
            FundingError::InvalidState { .. } => "invalid_state",
            FundingError::GoalNotReached { .. } => "goal_not_reached",
            FundingError::ExceedsContribution { .. } => "exceeds_contribution",
            FundingError::MatchBaseMismatch { .. } => "match_base_mismatch",
            FundingError::NotAllowed(_) => "not_allowed",
            FundingError::InsufficientSponsorBalance { .. } => "insufficient_sponsor_balance",
            FundingError::SharesExceeded { .. } => "shares_exceeded",
            FundingError::NothingToClaim(_) => "nothing_to_claim",
            FundingError::Unauthorized { .. } => "unauthorized",
            FundingError::AlreadyFunded => "already_funded",
            FundingError::ZeroAmount => "zero_amount",
            FundingError::Overflow => "overflow",
            FundingError::InvalidBps(_) => "invalid_bps",
            FundingError::UnknownCampaign(_) => "unknown_campaign",
            FundingError::InvalidAddress(_) => "invalid_address",
            FundingError::UnknownStateTag(_) => "unknown_state_tag",
            FundingError::Config(_) => "config",
        }
    }
}

/// Result type for funding operations
pub type FundingResult<T> = Result<T, FundingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_errors_keep_their_kind() {
        let err: FundingError = TokenError::InsufficientBalance {
            have: Amount::zero(),
            need: Amount::one(),
        }
        .into();
        assert_eq!(err.kind(), "insufficient_balance");
        assert_eq!(err.to_string(), "Insufficient balance: have 0, need 1");
    }

    #[test]
    fn test_zero_amount_kind_is_shared() {
        let token: FundingError = TokenError::ZeroAmount.into();
        assert_eq!(token.kind(), FundingError::ZeroAmount.kind());
    }
}
