//! Funding Engine
//!
//! The single transactional context. Owns the token ledger, the sponsor
//! pool, the distribution ledger, every campaign escrow, the authorization
//! policy and the event log.
//!
//! # Atomicity
//!
//! Each [`Command`] runs against one staged token overlay. Components run all
//! of their checks before touching their own state, so the first error
//! aborts the command with nothing changed: the overlay is dropped and no
//! event is logged. On success the overlay is committed and the events are
//! appended together.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use lib_tokens::{TokenConfig, TokenLedger};
use lib_types::{Address, Amount, Bps};

use crate::authority::AuthorizationPolicy;
use crate::command::{Command, Outcome};
use crate::distribution::{DistributionLedger, DISTRIBUTION_DOMAIN};
use crate::errors::{FundingError, FundingResult};
use crate::escrow::{CampaignEscrow, CAMPAIGN_DOMAIN};
use crate::events::LedgerEvent;
use crate::sponsor::{SponsorPool, SPONSOR_DOMAIN};
use crate::summary::EngineSummary;

#[derive(Debug)]
pub struct FundingEngine {
    ledger: TokenLedger,
    pool: SponsorPool,
    distribution: DistributionLedger,
    campaigns: BTreeMap<Address, CampaignEscrow>,
    /// Campaign accounts in creation order
    campaign_order: Vec<Address>,
    policy: Box<dyn AuthorizationPolicy>,
    events: Vec<LedgerEvent>,
}

impl FundingEngine {
    /// Create the ledger (full supply minted to the reserve), an empty pool
    /// with `match_bps`, and an empty distribution ledger.
    pub fn new(
        token: TokenConfig,
        match_bps: Bps,
        policy: Box<dyn AuthorizationPolicy>,
    ) -> FundingResult<Self> {
        let seed = token.symbol.clone();
        let ledger = TokenLedger::new(token)?;
        let pool = SponsorPool::new(Address::derive(SPONSOR_DOMAIN, seed.as_bytes()), match_bps)?;
        let distribution = DistributionLedger::new(Address::derive(DISTRIBUTION_DOMAIN, seed.as_bytes()));

        tracing::info!(
            pool = %pool.account(),
            distribution = %distribution.account(),
            match_bps,
            "funding engine created"
        );

        Ok(Self {
            ledger,
            pool,
            distribution,
            campaigns: BTreeMap::new(),
            campaign_order: Vec::new(),
            policy,
            events: Vec::new(),
        })
    }

    // ========================================================================
    // VIEWS
    // ========================================================================

    pub fn ledger(&self) -> &TokenLedger {
        &self.ledger
    }

    pub fn pool(&self) -> &SponsorPool {
        &self.pool
    }

    pub fn distribution(&self) -> &DistributionLedger {
        &self.distribution
    }

    pub fn policy(&self) -> &dyn AuthorizationPolicy {
        self.policy.as_ref()
    }

    pub fn campaign(&self, account: &Address) -> Option<&CampaignEscrow> {
        self.campaigns.get(account)
    }

    /// Campaigns in creation order
    pub fn campaigns(&self) -> impl Iterator<Item = &CampaignEscrow> {
        self.campaign_order
            .iter()
            .filter_map(|account| self.campaigns.get(account))
    }

    pub fn balance_of(&self, address: &Address) -> Amount {
        self.ledger.balance_of(address)
    }

    /// Append-only event log
    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    /// Account the next created campaign will use
    pub fn next_campaign_account(&self) -> Address {
        let mut seed = self.ledger.config().symbol.as_bytes().to_vec();
        seed.extend_from_slice(&(self.campaign_order.len() as u64).to_le_bytes());
        Address::derive(CAMPAIGN_DOMAIN, &seed)
    }

    /// Accounts the engine moves tokens for: reserve, pool, distribution
    /// and every campaign escrow. None of them may issue commands.
    pub fn is_system_account(&self, address: &Address) -> bool {
        *address == self.ledger.reserve_address()
            || *address == self.pool.account()
            || *address == self.distribution.account()
            || self.campaigns.contains_key(address)
    }

    pub fn summary(&self) -> EngineSummary {
        EngineSummary::capture(self)
    }

    // ========================================================================
    // EXECUTION
    // ========================================================================

    /// Run one command atomically on behalf of `caller`
    pub fn execute(&mut self, caller: Address, command: Command) -> FundingResult<Outcome> {
        let op = command.name();
        match self.apply(caller, command) {
            Ok((outcome, events)) => {
                tracing::debug!(caller = %caller, op, events = events.len(), "command committed");
                self.events.extend(events);
                debug_assert!(self.ledger.verify_conservation().is_ok());
                Ok(outcome)
            }
            Err(err) => {
                tracing::warn!(caller = %caller, op, kind = err.kind(), error = %err, "command rejected");
                Err(err)
            }
        }
    }

    fn authorize(&self, caller: &Address, command: &Command) -> FundingResult<()> {
        if caller.is_zero() {
            return Err(FundingError::InvalidAddress("zero address cannot act".to_string()));
        }
        if self.is_system_account(caller) {
            return Err(FundingError::Unauthorized {
                caller: *caller,
                action: command.name().to_string(),
            });
        }
        if let Some(action) = command.admin_action() {
            if !self.policy.authorize(caller, action) {
                return Err(FundingError::Unauthorized {
                    caller: *caller,
                    action: action.to_string(),
                });
            }
        }
        Ok(())
    }

    fn apply(&mut self, caller: Address, command: Command) -> FundingResult<(Outcome, Vec<LedgerEvent>)> {
        self.authorize(&caller, &command)?;
        let next_campaign = self.next_campaign_account();

        let FundingEngine {
            ledger,
            pool,
            distribution,
            campaigns,
            campaign_order,
            ..
        } = self;

        let mut tx = ledger.begin();

        let (outcome, events) = match command {
            Command::CreateCampaign { goal } => {
                let escrow = CampaignEscrow::new(next_campaign, goal)?;
                campaigns.insert(next_campaign, escrow);
                campaign_order.push(next_campaign);
                tracing::info!(campaign = %next_campaign, goal = %goal, "campaign created");
                (
                    Outcome::CampaignCreated { campaign: next_campaign, goal },
                    vec![LedgerEvent::CampaignCreated { campaign: next_campaign, goal }],
                )
            }

            Command::BuyTokens { amount, payment_wei } => {
                let receipt = tx.purchase(caller, caller, amount, payment_wei)?;
                tracing::info!(
                    buyer = %caller,
                    amount = %amount,
                    required_wei = %receipt.required_wei,
                    refund_wei = %receipt.refund_wei,
                    "tokens purchased"
                );
                (Outcome::Purchased(receipt), vec![purchase_event(&receipt)])
            }

            Command::Transfer { to, amount } => {
                require_nonzero(&to, "recipient")?;
                let receipt = tx.transfer(caller, to, amount)?;
                tracing::info!(from = %caller, to = %to, amount = %amount, "tokens transferred");
                (
                    Outcome::Transferred(receipt),
                    vec![LedgerEvent::Transferred { from: caller, to, amount }],
                )
            }

            Command::BuyTokensForSponsorship { amount, payment_wei } => {
                let receipt = pool.buy_tokens_for_sponsorship(&mut tx, caller, amount, payment_wei)?;
                tracing::info!(
                    payer = %caller,
                    pool = %pool.account(),
                    amount = %amount,
                    "sponsorship tokens purchased"
                );
                (Outcome::Purchased(receipt), vec![purchase_event(&receipt)])
            }

            Command::SetAllowedCampaign { campaign, allowed } => {
                require_nonzero(&campaign, "campaign")?;
                let changed = pool.set_allowed_campaign(campaign, allowed);
                tracing::info!(campaign = %campaign, allowed, changed, "allow-list updated");
                let events = if changed {
                    vec![LedgerEvent::AllowListUpdated { campaign, allowed }]
                } else {
                    Vec::new()
                };
                (Outcome::AllowListUpdated { campaign, allowed, changed }, events)
            }

            Command::Contribute { campaign, amount } => {
                let escrow = campaigns
                    .get_mut(&campaign)
                    .ok_or(FundingError::UnknownCampaign(campaign))?;
                let total_collected = escrow.contribute(&mut tx, caller, amount)?;
                (
                    Outcome::Contributed { campaign, total_collected },
                    vec![LedgerEvent::Contributed {
                        campaign,
                        contributor: caller,
                        amount,
                        total_collected,
                    }],
                )
            }

            Command::Withdraw { campaign, amount } => {
                let escrow = campaigns
                    .get_mut(&campaign)
                    .ok_or(FundingError::UnknownCampaign(campaign))?;
                let total_collected = escrow.withdraw(&mut tx, caller, amount)?;
                (
                    Outcome::Withdrawn { campaign, total_collected },
                    vec![LedgerEvent::Withdrawn {
                        campaign,
                        contributor: caller,
                        amount,
                        total_collected,
                    }],
                )
            }

            Command::RequestMatch { campaign, base_amount } => {
                let escrow = campaigns
                    .get_mut(&campaign)
                    .ok_or(FundingError::UnknownCampaign(campaign))?;
                let collected = escrow.total_collected();
                if base_amount != collected {
                    return Err(FundingError::MatchBaseMismatch {
                        collected,
                        requested: base_amount,
                    });
                }
                let matched = escrow.finalize_and_request_sponsorship(&mut tx, pool)?;
                let state = escrow.state();
                (
                    Outcome::Matched { campaign, amount: matched },
                    vec![
                        LedgerEvent::SponsorMatched {
                            campaign,
                            base_amount,
                            matched,
                        },
                        LedgerEvent::CampaignFinalized { campaign, collected, state },
                    ],
                )
            }

            Command::Finalize { campaign } => {
                let escrow = campaigns
                    .get_mut(&campaign)
                    .ok_or(FundingError::UnknownCampaign(campaign))?;
                let matched = escrow.finalize_and_request_sponsorship(&mut tx, pool)?;
                let collected = escrow.total_collected();
                let state = escrow.state();
                (
                    Outcome::Finalized { campaign, matched, state },
                    vec![
                        LedgerEvent::SponsorMatched {
                            campaign,
                            base_amount: collected,
                            matched,
                        },
                        LedgerEvent::CampaignFinalized { campaign, collected, state },
                    ],
                )
            }

            Command::TransferToDistribute { campaign } => {
                let escrow = campaigns
                    .get_mut(&campaign)
                    .ok_or(FundingError::UnknownCampaign(campaign))?;
                let amount = escrow.transfer_to_distribute(&mut tx, distribution.account())?;
                (
                    Outcome::Released { campaign, amount },
                    vec![LedgerEvent::ReleasedToDistribution { campaign, amount }],
                )
            }

            Command::Deposit { amount } => {
                let total_deposited = distribution.deposit_from_crowdfunding(&tx, amount)?;
                (
                    Outcome::Deposited { total_deposited },
                    vec![LedgerEvent::Deposited { amount, total_deposited }],
                )
            }

            Command::AddOrUpdateShareholder { holder, bps } => {
                require_nonzero(&holder, "shareholder")?;
                let previous = distribution.add_or_update_shareholder(holder, bps)?;
                (
                    Outcome::ShareUpdated { holder, previous, bps },
                    vec![LedgerEvent::ShareUpdated { holder, previous, bps }],
                )
            }

            Command::Claim => {
                let amount = distribution.claim(&mut tx, caller)?;
                (
                    Outcome::Claimed { holder: caller, amount },
                    vec![LedgerEvent::Claimed { holder: caller, amount }],
                )
            }
        };

        let staged = tx.into_staged();
        ledger.commit(staged);

        Ok((outcome, events))
    }
}

fn require_nonzero(address: &Address, role: &str) -> FundingResult<()> {
    if address.is_zero() {
        return Err(FundingError::InvalidAddress(format!("{role} must not be the zero address")));
    }
    Ok(())
}

fn purchase_event(receipt: &lib_tokens::PurchaseReceipt) -> LedgerEvent {
    LedgerEvent::TokensPurchased {
        payer: receipt.payer,
        beneficiary: receipt.beneficiary,
        amount: receipt.amount,
        required_wei: receipt.required_wei,
    }
}

// ============================================================================
// SHARED ENGINE
// ============================================================================

/// Engine behind one lock; concurrent callers are serialized per instance
#[derive(Debug, Clone)]
pub struct SharedFundingEngine {
    inner: Arc<Mutex<FundingEngine>>,
}

impl SharedFundingEngine {
    pub fn new(engine: FundingEngine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FundingEngine> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::error!("funding engine mutex poisoned: {}", poisoned);
                poisoned.into_inner()
            }
        }
    }

    pub fn execute(&self, caller: Address, command: Command) -> FundingResult<Outcome> {
        self.lock().execute(caller, command)
    }

    /// Run a read-only closure under the lock
    pub fn read<R>(&self, f: impl FnOnce(&FundingEngine) -> R) -> R {
        let guard = self.lock();
        f(&*guard)
    }

    pub fn summary(&self) -> EngineSummary {
        self.read(FundingEngine::summary)
    }
}
