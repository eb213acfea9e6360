//! Sponsor Pool
//!
//! Holds sponsor-purchased tokens under the pool's own ledger account and
//! releases a basis-point match to allow-listed campaigns. The pool keeps no
//! copy of its balance; the spendable amount is always read from the token
//! ledger.

use std::collections::{BTreeMap, BTreeSet};

use lib_tokens::{BalanceStore, LedgerTx, PurchaseReceipt, TokenLedger};
use lib_types::{bps_of, Address, Amount, Bps, MAX_BPS};

use crate::errors::{FundingError, FundingResult};

/// Derivation domain of the pool account
pub const SPONSOR_DOMAIN: &str = "sponsor-pool";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SponsorPool {
    account: Address,
    match_bps: Bps,
    allowed: BTreeSet<Address>,
    /// Total released to campaigns (audit trail)
    total_matched: Amount,
    matched: BTreeMap<Address, Amount>,
}

impl SponsorPool {
    pub fn new(account: Address, match_bps: Bps) -> FundingResult<Self> {
        if match_bps > MAX_BPS {
            return Err(FundingError::InvalidBps(match_bps));
        }
        Ok(Self {
            account,
            match_bps,
            allowed: BTreeSet::new(),
            total_matched: Amount::zero(),
            matched: BTreeMap::new(),
        })
    }

    pub fn account(&self) -> Address {
        self.account
    }

    pub fn match_bps(&self) -> Bps {
        self.match_bps
    }

    pub fn is_allowed(&self, campaign: &Address) -> bool {
        self.allowed.contains(campaign)
    }

    /// Allow-listed campaigns in address order
    pub fn allowed(&self) -> impl Iterator<Item = &Address> {
        self.allowed.iter()
    }

    /// Spendable tokens, read from the ledger
    pub fn balance(&self, ledger: &TokenLedger) -> Amount {
        ledger.balance_of(&self.account)
    }

    pub fn total_matched(&self) -> Amount {
        self.total_matched
    }

    pub fn matched_for(&self, campaign: &Address) -> Amount {
        self.matched.get(campaign).copied().unwrap_or_default()
    }

    /// floor(base * match_bps / 10000)
    pub fn quote_match(&self, base_amount: Amount) -> FundingResult<Amount> {
        bps_of(base_amount, self.match_bps).ok_or(FundingError::Overflow)
    }

    /// Toggle allow-list membership. Returns whether anything changed.
    pub fn set_allowed_campaign(&mut self, campaign: Address, allowed: bool) -> bool {
        if allowed {
            self.allowed.insert(campaign)
        } else {
            self.allowed.remove(&campaign)
        }
    }

    /// Buy tokens at the fixed price, credited to the pool account
    pub fn buy_tokens_for_sponsorship(
        &self,
        tx: &mut LedgerTx<'_>,
        payer: Address,
        amount: Amount,
        payment_wei: Amount,
    ) -> FundingResult<PurchaseReceipt> {
        Ok(tx.purchase(payer, self.account, amount, payment_wei)?)
    }

    /// Release the match for `base_amount` to `campaign`.
    ///
    /// A match that rounds to zero succeeds without moving tokens.
    pub fn request_match(
        &mut self,
        tx: &mut LedgerTx<'_>,
        campaign: Address,
        base_amount: Amount,
    ) -> FundingResult<Amount> {
        if !self.is_allowed(&campaign) {
            return Err(FundingError::NotAllowed(campaign));
        }

        let match_amount = self.quote_match(base_amount)?;
        let available = tx.balance(&self.account);
        if available < match_amount {
            return Err(FundingError::InsufficientSponsorBalance {
                available,
                required: match_amount,
            });
        }

        let total_matched = self
            .total_matched
            .checked_add(match_amount)
            .ok_or(FundingError::Overflow)?;
        let campaign_matched = self
            .matched_for(&campaign)
            .checked_add(match_amount)
            .ok_or(FundingError::Overflow)?;

        if !match_amount.is_zero() {
            tx.transfer(self.account, campaign, match_amount)?;
        }

        self.total_matched = total_matched;
        self.matched.insert(campaign, campaign_matched);

        tracing::info!(
            campaign = %campaign,
            base = %base_amount,
            match_bps = self.match_bps,
            matched = %match_amount,
            "sponsor match released"
        );

        Ok(match_amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_tokens::TokenConfig;
    use lib_types::tokens;

    fn addr(n: u8) -> Address {
        Address::new([n; 20])
    }

    fn setup() -> (TokenLedger, SponsorPool) {
        let ledger =
            TokenLedger::new(TokenConfig::new("Test", "TST", tokens(1_000), Amount::exp10(16))).unwrap();
        let pool = SponsorPool::new(Address::derive(SPONSOR_DOMAIN, b"TST"), 1_000).unwrap();
        (ledger, pool)
    }

    fn fund_pool(ledger: &mut TokenLedger, pool: &SponsorPool, amount: Amount) {
        let mut tx = ledger.begin();
        pool.buy_tokens_for_sponsorship(&mut tx, addr(7), amount, Amount::exp10(20))
            .unwrap();
        let staged = tx.into_staged();
        ledger.commit(staged);
    }

    #[test]
    fn test_rejects_bps_above_max() {
        assert_eq!(
            SponsorPool::new(addr(1), 10_001),
            Err(FundingError::InvalidBps(10_001))
        );
    }

    #[test]
    fn test_allow_list_toggle_is_idempotent() {
        let (_, mut pool) = setup();
        assert!(pool.set_allowed_campaign(addr(5), true));
        assert!(!pool.set_allowed_campaign(addr(5), true));
        assert!(pool.is_allowed(&addr(5)));
        assert!(pool.set_allowed_campaign(addr(5), false));
        assert!(!pool.set_allowed_campaign(addr(5), false));
        assert!(!pool.is_allowed(&addr(5)));
    }

    #[test]
    fn test_match_moves_tokens_to_campaign() {
        let (mut ledger, mut pool) = setup();
        fund_pool(&mut ledger, &pool, tokens(50));
        pool.set_allowed_campaign(addr(5), true);

        let mut tx = ledger.begin();
        let matched = pool.request_match(&mut tx, addr(5), tokens(100)).unwrap();
        let staged = tx.into_staged();
        ledger.commit(staged);

        assert_eq!(matched, tokens(10));
        assert_eq!(ledger.balance_of(&addr(5)), tokens(10));
        assert_eq!(pool.balance(&ledger), tokens(40));
        assert_eq!(pool.total_matched(), tokens(10));
        assert_eq!(pool.matched_for(&addr(5)), tokens(10));
    }

    #[test]
    fn test_match_not_allowed() {
        let (mut ledger, mut pool) = setup();
        fund_pool(&mut ledger, &pool, tokens(50));

        let mut tx = ledger.begin();
        let result = pool.request_match(&mut tx, addr(5), tokens(100));
        assert_eq!(result, Err(FundingError::NotAllowed(addr(5))));
        assert!(tx.into_staged().is_empty());
        assert_eq!(pool.total_matched(), Amount::zero());
    }

    #[test]
    fn test_match_insufficient_sponsor_balance() {
        let (mut ledger, mut pool) = setup();
        fund_pool(&mut ledger, &pool, tokens(5));
        pool.set_allowed_campaign(addr(5), true);

        let mut tx = ledger.begin();
        let result = pool.request_match(&mut tx, addr(5), tokens(100));
        assert_eq!(
            result,
            Err(FundingError::InsufficientSponsorBalance {
                available: tokens(5),
                required: tokens(10),
            })
        );
    }

    #[test]
    fn test_match_rounding_to_zero_moves_nothing() {
        let (ledger, mut pool) = setup();
        pool.set_allowed_campaign(addr(5), true);

        let mut tx = ledger.begin();
        let matched = pool.request_match(&mut tx, addr(5), Amount::from(9u64)).unwrap();
        assert_eq!(matched, Amount::zero());
        assert!(tx.into_staged().is_empty());
    }
}
