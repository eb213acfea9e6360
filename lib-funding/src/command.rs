//! Commands and outcomes.
//!
//! A [`Command`] is one atomic operation submitted to the engine on behalf
//! of a caller. Scripts carry them as JSON objects tagged by `"op"`:
//!
//! ```json
//! { "op": "contribute", "campaign": "0x…", "amount": "100000000000000000000" }
//! ```
//!
//! Amounts are smallest units (tokens) or wei (payments), as decimal strings.

use serde::{Deserialize, Serialize};

use lib_tokens::{PurchaseReceipt, TransferReceipt};
use lib_types::{Address, Amount, Bps};

use crate::authority::AdminAction;
use crate::escrow::FundingState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    /// Open a new campaign escrow (admin)
    CreateCampaign {
        #[serde(with = "lib_types::decimal")]
        goal: Amount,
    },
    /// Buy tokens for the caller at the fixed price
    BuyTokens {
        #[serde(with = "lib_types::decimal")]
        amount: Amount,
        #[serde(with = "lib_types::decimal")]
        payment_wei: Amount,
    },
    Transfer {
        to: Address,
        #[serde(with = "lib_types::decimal")]
        amount: Amount,
    },
    /// Buy tokens credited to the sponsor pool
    BuyTokensForSponsorship {
        #[serde(with = "lib_types::decimal")]
        amount: Amount,
        #[serde(with = "lib_types::decimal")]
        payment_wei: Amount,
    },
    /// Toggle sponsor allow-list membership (admin)
    SetAllowedCampaign { campaign: Address, allowed: bool },
    Contribute {
        campaign: Address,
        #[serde(with = "lib_types::decimal")]
        amount: Amount,
    },
    Withdraw {
        campaign: Address,
        #[serde(with = "lib_types::decimal")]
        amount: Amount,
    },
    /// Finalize with an explicit match base, which must equal the
    /// campaign's collected total (admin)
    RequestMatch {
        campaign: Address,
        #[serde(with = "lib_types::decimal")]
        base_amount: Amount,
    },
    /// Close the campaign and pull the sponsor match (admin)
    Finalize { campaign: Address },
    /// Forward a finalized escrow to distribution (admin)
    TransferToDistribute { campaign: Address },
    /// Record tokens that arrived at the distribution account
    Deposit {
        #[serde(with = "lib_types::decimal")]
        amount: Amount,
    },
    /// Set a beneficiary's share (admin)
    AddOrUpdateShareholder { holder: Address, bps: Bps },
    /// Pay the caller's unpaid entitlement
    Claim,
}

impl Command {
    /// Operation name, matching the JSON `op` tag
    pub fn name(&self) -> &'static str {
        match self {
            Command::CreateCampaign { .. } => "create_campaign",
            Command::BuyTokens { .. } => "buy_tokens",
            Command::Transfer { .. } => "transfer",
            Command::BuyTokensForSponsorship { .. } => "buy_tokens_for_sponsorship",
            Command::SetAllowedCampaign { .. } => "set_allowed_campaign",
            Command::Contribute { .. } => "contribute",
            Command::Withdraw { .. } => "withdraw",
            Command::RequestMatch { .. } => "request_match",
            Command::Finalize { .. } => "finalize",
            Command::TransferToDistribute { .. } => "transfer_to_distribute",
            Command::Deposit { .. } => "deposit",
            Command::AddOrUpdateShareholder { .. } => "add_or_update_shareholder",
            Command::Claim => "claim",
        }
    }

    /// Authorization the command needs, if any
    pub fn admin_action(&self) -> Option<AdminAction> {
        match self {
            Command::CreateCampaign { .. } => Some(AdminAction::CreateCampaign),
            Command::SetAllowedCampaign { .. } => Some(AdminAction::ManageAllowList),
            Command::Finalize { .. } | Command::RequestMatch { .. } => {
                Some(AdminAction::FinalizeCampaign)
            }
            Command::TransferToDistribute { .. } => Some(AdminAction::ReleaseToDistribution),
            Command::AddOrUpdateShareholder { .. } => Some(AdminAction::ManageShares),
            _ => None,
        }
    }
}

/// Result of a committed command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    CampaignCreated {
        campaign: Address,
        #[serde(with = "lib_types::decimal")]
        goal: Amount,
    },
    Purchased(PurchaseReceipt),
    Transferred(TransferReceipt),
    Contributed {
        campaign: Address,
        #[serde(with = "lib_types::decimal")]
        total_collected: Amount,
    },
    Withdrawn {
        campaign: Address,
        #[serde(with = "lib_types::decimal")]
        total_collected: Amount,
    },
    AllowListUpdated {
        campaign: Address,
        allowed: bool,
        changed: bool,
    },
    Matched {
        campaign: Address,
        #[serde(with = "lib_types::decimal")]
        amount: Amount,
    },
    Finalized {
        campaign: Address,
        #[serde(with = "lib_types::decimal")]
        matched: Amount,
        state: FundingState,
    },
    Released {
        campaign: Address,
        #[serde(with = "lib_types::decimal")]
        amount: Amount,
    },
    Deposited {
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
