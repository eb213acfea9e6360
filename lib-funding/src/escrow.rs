//! Campaign Escrow
//!
//! Collects contributions toward a goal under the campaign's own ledger
//! account.
//!
//! State machine: `Open` -> `PendingSponsor` -> `Funded` (terminal).
//!
//! - `Open`: contributions and withdrawals; reaching the goal changes nothing
//! - `PendingSponsor`: closed, sponsor match received, awaiting release
//! - `Funded`: whole balance forwarded to the distribution ledger and kept
//!   in `released`; contributions and `total_collected` are cleared. Inert.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use lib_tokens::{BalanceStore, LedgerTx};
use lib_types::{Address, Amount};

use crate::errors::{FundingError, FundingResult};
use crate::sponsor::SponsorPool;

/// Derivation domain of campaign escrow accounts
pub const CAMPAIGN_DOMAIN: &str = "campaign-escrow";

// =============================================================================
// FUNDING STATE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundingState {
    Open,
    PendingSponsor,
    Funded,
}

impl FundingState {
    /// Literal tag exposed to presentation layers
    pub fn tag(&self) -> &'static str {
        match self {
            FundingState::Open => "open",
            FundingState::PendingSponsor => "pending_sponsor",
            FundingState::Funded => "funded",
        }
    }
}

impl fmt::Display for FundingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for FundingState {
    type Err = FundingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(FundingState::Open),
            "pending_sponsor" => Ok(FundingState::PendingSponsor),
            "funded" => Ok(FundingState::Funded),
            other => Err(FundingError::UnknownStateTag(other.to_string())),
        }
    }
}

// =============================================================================
// CAMPAIGN ESCROW
// =============================================================================

/// Invariant: `total_collected == sum(contributions)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignEscrow {
    account: Address,
    goal: Amount,
    total_collected: Amount,
    contributions: BTreeMap<Address, Amount>,
    state: FundingState,
    sponsor_match: Amount,
    released: Amount,
}

impl CampaignEscrow {
    pub fn new(account: Address, goal: Amount) -> FundingResult<Self> {
        if goal.is_zero() {
            return Err(FundingError::ZeroAmount);
        }
        Ok(Self {
            account,
            goal,
            total_collected: Amount::zero(),
            contributions: BTreeMap::new(),
            state: FundingState::Open,
            sponsor_match: Amount::zero(),
            released: Amount::zero(),
        })
    }

    /// Escrow account; also the campaign's identity
    pub fn account(&self) -> Address {
        self.account
    }

    pub fn goal(&self) -> Amount {
        self.goal
    }

    pub fn total_collected(&self) -> Amount {
        self.total_collected
    }

    pub fn state(&self) -> FundingState {
        self.state
    }

    pub fn funding_state(&self) -> &'static str {
        self.state.tag()
    }

    pub fn contribution_of(&self, contributor: &Address) -> Amount {
        self.contributions.get(contributor).copied().unwrap_or_default()
    }

    pub fn contributions(&self) -> impl Iterator<Item = (&Address, &Amount)> {
        self.contributions.iter()
    }

    pub fn sponsor_match(&self) -> Amount {
        self.sponsor_match
    }

    /// Amount forwarded to the distribution ledger
    pub fn released(&self) -> Amount {
        self.released
    }

    pub fn goal_reached(&self) -> bool {
        self.total_collected >= self.goal
    }

    fn require_state(&self, expected: FundingState) -> FundingResult<()> {
        if self.state != expected {
            return Err(FundingError::InvalidState {
                expected,
                found: self.state,
            });
        }
        Ok(())
    }

    /// Pull `amount` from the contributor into escrow. Returns the new total.
    pub fn contribute(
        &mut self,
        tx: &mut LedgerTx<'_>,
        contributor: Address,
        amount: Amount,
    ) -> FundingResult<Amount> {
        self.require_state(FundingState::Open)?;
        if amount.is_zero() {
            return Err(FundingError::ZeroAmount);
        }

        let stake = self
            .contribution_of(&contributor)
            .checked_add(amount)
            .ok_or(FundingError::Overflow)?;
        let total = self
            .total_collected
            .checked_add(amount)
            .ok_or(FundingError::Overflow)?;

        tx.transfer(contributor, self.account, amount)?;

        self.contributions.insert(contributor, stake);
        self.total_collected = total;

        tracing::info!(
            campaign = %self.account,
            contributor = %contributor,
            amount = %amount,
            total_collected = %total,
            goal_reached = self.goal_reached(),
            "contribution accepted"
        );

        Ok(total)
    }

    /// Return up to the contributor's own stake. Returns the new total.
    pub fn withdraw(
        &mut self,
        tx: &mut LedgerTx<'_>,
        contributor: Address,
        amount: Amount,
    ) -> FundingResult<Amount> {
        self.require_state(FundingState::Open)?;
        if amount.is_zero() {
            return Err(FundingError::ZeroAmount);
        }

        let contributed = self.contribution_of(&contributor);
        if amount > contributed {
            return Err(FundingError::ExceedsContribution {
                contributed,
                requested: amount,
            });
        }
        let stake = contributed - amount;
        let total = self
            .total_collected
            .checked_sub(amount)
            .ok_or(FundingError::Overflow)?;

        tx.transfer(self.account, contributor, amount)?;

        if stake.is_zero() {
            self.contributions.remove(&contributor);
        } else {
            self.contributions.insert(contributor, stake);
        }
        self.total_collected = total;

        tracing::info!(
            campaign = %self.account,
            contributor = %contributor,
            amount = %amount,
            total_collected = %total,
            "contribution withdrawn"
        );

        Ok(total)
    }

    /// Close the campaign and pull the sponsor match into escrow.
    ///
    /// Ends in `PendingSponsor`. Returns the matched amount.
    pub fn finalize_and_request_sponsorship(
        &mut self,
        tx: &mut LedgerTx<'_>,
        pool: &mut SponsorPool,
    ) -> FundingResult<Amount> {
        self.require_state(FundingState::Open)?;
        if !self.goal_reached() {
            return Err(FundingError::GoalNotReached {
                collected: self.total_collected,
                goal: self.goal,
            });
        }

        let matched = pool.request_match(tx, self.account, self.total_collected)?;

        self.sponsor_match = matched;
        self.state = FundingState::PendingSponsor;

        tracing::info!(
            campaign = %self.account,
            collected = %self.total_collected,
            matched = %matched,
            "campaign finalized"
        );

        Ok(matched)
    }

    /// Forward the entire escrow balance to `distribution`. Ends in `Funded`.
    pub fn transfer_to_distribute(
        &mut self,
        tx: &mut LedgerTx<'_>,
        distribution: Address,
    ) -> FundingResult<Amount> {
        match self.state {
            FundingState::Funded => return Err(FundingError::AlreadyFunded),
            FundingState::Open => {
                return Err(FundingError::InvalidState {
                    expected: FundingState::PendingSponsor,
                    found: FundingState::Open,
                })
            }
            FundingState::PendingSponsor => {}
        }

        let balance = tx.balance(&self.account);
        if !balance.is_zero() {
            tx.transfer(self.account, distribution, balance)?;
        }

        self.contributions.clear();
        self.total_collected = Amount::zero();
        self.released = balance;
        self.state = FundingState::Funded;

        tracing::info!(
            campaign = %self.account,
            distribution = %distribution,
            amount = %balance,
            "escrow released to distribution"
        );

        Ok(balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_tokens::{TokenConfig, TokenLedger};
    use lib_types::tokens;

    fn addr(n: u8) -> Address {
        Address::new([n; 20])
    }

    struct Fixture {
        ledger: TokenLedger,
        pool: SponsorPool,
        escrow: CampaignEscrow,
    }

    /// Alice (1) holds 150 tokens, the pool 20; goal 100, match 10%
    fn setup() -> Fixture {
        let mut ledger =
            TokenLedger::new(TokenConfig::new("Test", "TST", tokens(1_000), Amount::exp10(16))).unwrap();
        let mut pool = SponsorPool::new(addr(8), 1_000).unwrap();
        let escrow = CampaignEscrow::new(addr(5), tokens(100)).unwrap();
        pool.set_allowed_campaign(escrow.account(), true);

        let mut tx = ledger.begin();
        tx.purchase(addr(1), addr(1), tokens(150), Amount::exp10(19)).unwrap();
        tx.purchase(addr(9), addr(8), tokens(20), Amount::exp10(19)).unwrap();
        let staged = tx.into_staged();
        ledger.commit(staged);

        Fixture { ledger, pool, escrow }
    }

    impl Fixture {
        fn contribute(&mut self, who: Address, amount: Amount) -> FundingResult<Amount> {
            let mut tx = self.ledger.begin();
            let result = self.escrow.contribute(&mut tx, who, amount);
            let staged = tx.into_staged();
            if result.is_ok() {
                self.ledger.commit(staged);
            }
            result
        }

        fn withdraw(&mut self, who: Address, amount: Amount) -> FundingResult<Amount> {
            let mut tx = self.ledger.begin();
            let result = self.escrow.withdraw(&mut tx, who, amount);
            let staged = tx.into_staged();
            if result.is_ok() {
                self.ledger.commit(staged);
            }
            result
        }

        fn finalize(&mut self) -> FundingResult<Amount> {
            let mut tx = self.ledger.begin();
            let result = self.escrow.finalize_and_request_sponsorship(&mut tx, &mut self.pool);
            let staged = tx.into_staged();
            if result.is_ok() {
                self.ledger.commit(staged);
            }
            result
        }

        fn release(&mut self) -> FundingResult<Amount> {
            let mut tx = self.ledger.begin();
            let result = self.escrow.transfer_to_distribute(&mut tx, addr(6));
            let staged = tx.into_staged();
            if result.is_ok() {
                self.ledger.commit(staged);
            }
            result
        }
    }

    #[test]
    fn test_state_tags() {
        for state in [FundingState::Open, FundingState::PendingSponsor, FundingState::Funded] {
            assert_eq!(state.tag().parse::<FundingState>().unwrap(), state);
        }
        assert_eq!(
            "loading".parse::<FundingState>(),
            Err(FundingError::UnknownStateTag("loading".to_string()))
        );
    }

    #[test]
    fn test_zero_goal_rejected() {
        assert_eq!(CampaignEscrow::new(addr(5), Amount::zero()), Err(FundingError::ZeroAmount));
    }

    #[test]
    fn test_contribute_and_withdraw() {
        let mut f = setup();
        assert_eq!(f.contribute(addr(1), tokens(60)).unwrap(), tokens(60));
        assert_eq!(f.withdraw(addr(1), tokens(20)).unwrap(), tokens(40));

        assert_eq!(f.escrow.contribution_of(&addr(1)), tokens(40));
        assert_eq!(f.ledger.balance_of(&addr(5)), tokens(40));
        assert_eq!(f.ledger.balance_of(&addr(1)), tokens(110));

        f.withdraw(addr(1), tokens(40)).unwrap();
        assert_eq!(f.escrow.contributions().count(), 0);
        assert_eq!(f.escrow.total_collected(), Amount::zero());
    }

    #[test]
    fn test_reaching_goal_keeps_open() {
        let mut f = setup();
        f.contribute(addr(1), tokens(120)).unwrap();
        assert!(f.escrow.goal_reached());
        assert_eq!(f.escrow.state(), FundingState::Open);
    }

    #[test]
    fn test_withdraw_exceeds_contribution() {
        let mut f = setup();
        f.contribute(addr(1), tokens(10)).unwrap();

        let result = f.withdraw(addr(1), tokens(11));
        assert_eq!(
            result,
            Err(FundingError::ExceedsContribution {
                contributed: tokens(10),
                requested: tokens(11),
            })
        );
        assert_eq!(f.escrow.contribution_of(&addr(1)), tokens(10));
        assert_eq!(f.ledger.balance_of(&addr(5)), tokens(10));
    }

    #[test]
    fn test_contribute_insufficient_balance() {
        let mut f = setup();
        let result = f.contribute(addr(2), tokens(1));
        assert!(matches!(result, Err(FundingError::Token(_))));
        assert_eq!(f.escrow.total_collected(), Amount::zero());
    }

    #[test]
    fn test_finalize_requires_goal() {
        let mut f = setup();
        f.contribute(addr(1), tokens(99)).unwrap();
        assert_eq!(
            f.finalize(),
            Err(FundingError::GoalNotReached {
                collected: tokens(99),
                goal: tokens(100),
            })
        );
        assert_eq!(f.escrow.state(), FundingState::Open);
    }

    #[test]
    fn test_finalize_then_release() {
        let mut f = setup();
        f.contribute(addr(1), tokens(100)).unwrap();

        assert_eq!(f.finalize().unwrap(), tokens(10));
        assert_eq!(f.escrow.state(), FundingState::PendingSponsor);
        assert_eq!(f.ledger.balance_of(&addr(5)), tokens(110));

        // Closed to contributions once finalized
        assert!(matches!(
            f.contribute(addr(1), tokens(1)),
            Err(FundingError::InvalidState { .. })
        ));
        assert!(matches!(
            f.withdraw(addr(1), tokens(1)),
            Err(FundingError::InvalidState { .. })
        ));

        assert_eq!(f.release().unwrap(), tokens(110));
        assert_eq!(f.escrow.state(), FundingState::Funded);
        assert_eq!(f.escrow.released(), tokens(110));
        assert_eq!(f.escrow.contributions().count(), 0);
        assert_eq!(f.escrow.total_collected(), Amount::zero());
        assert_eq!(f.escrow.sponsor_match(), tokens(10));
        assert_eq!(f.ledger.balance_of(&addr(6)), tokens(110));
        assert_eq!(f.ledger.balance_of(&addr(5)), Amount::zero());

        assert_eq!(f.release(), Err(FundingError::AlreadyFunded));
        assert!(matches!(f.finalize(), Err(FundingError::InvalidState { .. })));
    }

    #[test]
    fn test_release_from_open_is_invalid() {
        let mut f = setup();
        assert_eq!(
            f.release(),
            Err(FundingError::InvalidState {
                expected: FundingState::PendingSponsor,
                found: FundingState::Open,
            })
        );
    }

    #[test]
    fn test_finalize_not_allowed_leaves_open() {
        let mut f = setup();
        f.pool.set_allowed_campaign(addr(5), false);
        f.contribute(addr(1), tokens(100)).unwrap();

        assert_eq!(f.finalize(), Err(FundingError::NotAllowed(addr(5))));
        assert_eq!(f.escrow.state(), FundingState::Open);
        assert_eq!(f.ledger.balance_of(&addr(8)), tokens(20));
    }
}
