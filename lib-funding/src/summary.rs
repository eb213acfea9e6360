//! Point-in-time snapshot of every engine table, for reporting and for
//! comparing state before and after a command.

use serde::Serialize;

use lib_types::{Address, Amount, Bps};

use crate::engine::FundingEngine;
use crate::escrow::FundingState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineSummary {
    pub token: TokenSummary,
    /// Non-zero balances in address order
    pub balances: Vec<BalanceEntry>,
    pub sponsor: SponsorSummary,
    pub campaigns: Vec<CampaignSummary>,
    pub distribution: DistributionSummary,
    pub event_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenSummary {
    pub name: String,
    pub symbol: String,
    #[serde(with = "lib_types::decimal")]
    pub total_supply: Amount,
    pub reserve_account: Address,
    #[serde(with = "lib_types::decimal")]
    pub reserve: Amount,
    #[serde(with = "lib_types::decimal")]
    pub proceeds_wei: Amount,
    /// sum(balances) == total_supply
    pub conserved: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceEntry {
    pub account: Address,
    #[serde(with = "lib_types::decimal")]
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SponsorSummary {
    pub account: Address,
    pub match_bps: Bps,
    #[serde(with = "lib_types::decimal")]
    pub balance: Amount,
    #[serde(with = "lib_types::decimal")]
    pub total_matched: Amount,
    pub allowed: Vec<Address>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CampaignSummary {
    pub account: Address,
    pub state: FundingState,
    #[serde(with = "lib_types::decimal")]
    pub goal: Amount,
    #[serde(with = "lib_types::decimal")]
    pub total_collected: Amount,
    pub contributors: usize,
    #[serde(with = "lib_types::decimal")]
    pub sponsor_match: Amount,
    #[serde(with = "lib_types::decimal")]
    pub released: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistributionSummary {
    pub account: Address,
    #[serde(with = "lib_types::decimal")]
    pub balance: Amount,
    #[serde(with = "lib_types::decimal")]
    pub total_deposited: Amount,
    #[serde(with = "lib_types::decimal")]
    pub total_claimed: Amount,
    #[serde(with = "lib_types::decimal")]
    pub outstanding: Amount,
    pub total_shares: u32,
    pub shareholders: Vec<ShareholderSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShareholderSummary {
    pub holder: Address,
    pub bps: Bps,
    #[serde(with = "lib_types::decimal")]
    pub claimed: Amount,
    #[serde(with = "lib_types::decimal")]
    pub claimable: Amount,
}

impl EngineSummary {
    pub fn capture(engine: &FundingEngine) -> Self {
        let ledger = engine.ledger();
        let config = ledger.config();
        let pool = engine.pool();
        let distribution = engine.distribution();

        Self {
            token: TokenSummary {
                name: config.name.clone(),
                symbol: config.symbol.clone(),
                total_supply: ledger.total_supply(),
                reserve_account: ledger.reserve_address(),
                reserve: ledger.reserve(),
                proceeds_wei: ledger.proceeds_wei(),
                conserved: ledger.verify_conservation().is_ok(),
            },
            balances: ledger
                .holders()
                .map(|(account, amount)| BalanceEntry {
                    account: *account,
                    amount: *amount,
                })
                .collect(),
            sponsor: SponsorSummary {
                account: pool.account(),
                match_bps: pool.match_bps(),
                balance: pool.balance(ledger),
                total_matched: pool.total_matched(),
                allowed: pool.allowed().copied().collect(),
            },
            campaigns: engine
                .campaigns()
                .map(|escrow| CampaignSummary {
                    account: escrow.account(),
                    state: escrow.state(),
                    goal: escrow.goal(),
                    total_collected: escrow.total_collected(),
                    contributors: escrow.contributions().count(),
                    sponsor_match: escrow.sponsor_match(),
                    released: escrow.released(),
                })
                .collect(),
            distribution: DistributionSummary {
                account: distribution.account(),
                balance: ledger.balance_of(&distribution.account()),
                total_deposited: distribution.total_deposited(),
                total_claimed: distribution.total_claimed(),
                outstanding: distribution.outstanding(),
                total_shares: distribution.total_shares(),
                shareholders: distribution
                    .shareholders()
                    .map(|(holder, bps)| ShareholderSummary {
                        holder: *holder,
                        bps: *bps,
                        claimed: distribution.claimed_of(holder),
                        claimable: distribution.claimable_of(holder),
                    })
                    .collect(),
            },
            event_count: engine.events().len(),
        }
    }
}
