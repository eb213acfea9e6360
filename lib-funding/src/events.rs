//! Funding Events
//!
//! Every committed command appends its events to the engine's log.
//! Rejected commands append nothing.

use serde::{Deserialize, Serialize};

use lib_types::{Address, Amount, Bps};

use crate::escrow::FundingState;

/// Ledger events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    CampaignCreated {
        campaign: Address,
        #[serde(with = "lib_types::decimal")]
        goal: Amount,
    },

    /// Tokens sold from the reserve
    TokensPurchased {
        /// Account that sent the payment
        payer: Address,
        /// Account credited
        beneficiary: Address,
        #[serde(with = "lib_types::decimal")]
        amount: Amount,
        /// Native cost retained
        #[serde(with = "lib_types::decimal")]
        required_wei: Amount,
    },

    Transferred {
        from: Address,
        to: Address,
        #[serde(with = "lib_types::decimal")]
        amount: Amount,
    },

    Contributed {
        campaign: Address,
        contributor: Address,
        #[serde(with = "lib_types::decimal")]
        amount: Amount,
        #[serde(with = "lib_types::decimal")]
        total_collected: Amount,
    },

    Withdrawn {
        campaign: Address,
        contributor: Address,
        #[serde(with = "lib_types::decimal")]
        amount: Amount,
        #[serde(with = "lib_types::decimal")]
        total_collected: Amount,
    },

    AllowListUpdated {
        campaign: Address,
        allowed: bool,
    },

    SponsorMatched {
        campaign: Address,
        #[serde(with = "lib_types::decimal")]
        base_amount: Amount,
        #[serde(with = "lib_types::decimal")]
        matched: Amount,
    },

    CampaignFinalized {
        campaign: Address,
        #[serde(with = "lib_types::decimal")]
        collected: Amount,
        state: FundingState,
    },

    ReleasedToDistribution {
        campaign: Address,
        #[serde(with = "lib_types::decimal")]
        amount: Amount,
    },

    Deposited {
        #[serde(with = "lib_types::decimal")]
        amount: Amount,
        #[serde(with = "lib_types::decimal")]
        total_deposited: Amount,
    },

    ShareUpdated {
        holder: Address,
        previous: Bps,
        bps: Bps,
    },

    Claimed {
        holder: Address,
        #[serde(with = "lib_types::decimal")]
        amount: Amount,
    },
}

impl LedgerEvent {
    /// Event type name for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            LedgerEvent::CampaignCreated { .. } => "campaign_created",
            LedgerEvent::TokensPurchased { .. } => "tokens_purchased",
            LedgerEvent::Transferred { .. } => "transferred",
            LedgerEvent::Contributed { .. } => "contributed",
            LedgerEvent::Withdrawn { .. } => "withdrawn",
            LedgerEvent::AllowListUpdated { .. } => "allow_list_updated",
            LedgerEvent::SponsorMatched { .. } => "sponsor_matched",
            LedgerEvent::CampaignFinalized { .. } => "campaign_finalized",
            LedgerEvent::ReleasedToDistribution { .. } => "released_to_distribution",
            LedgerEvent::Deposited { .. } => "deposited",
            LedgerEvent::ShareUpdated { .. } => "share_updated",
            LedgerEvent::Claimed { .. } => "claimed",
        }
    }
}
