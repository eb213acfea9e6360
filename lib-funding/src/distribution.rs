//! Distribution Ledger
//!
//! Proportional claim rights against the tokens deposited from funded
//! campaigns. Each shareholder may claim
//! `floor(total_deposited * shares / 10000)` in total; claims pay only the
//! unpaid difference.
//!
//! Invariants:
//! - sum(shares) <= 10000
//! - total_deposited never decreases
//! - total_claimed == sum(claimed) <= total_deposited
//! - deposited tokens are backed by the ledger account balance

use std::collections::BTreeMap;

use lib_tokens::{BalanceStore, LedgerTx, TokenError};
use lib_types::{Address, Amount, Bps, MAX_BPS};

use crate::errors::{FundingError, FundingResult};

/// Derivation domain of the distribution account
pub const DISTRIBUTION_DOMAIN: &str = "distribution";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionLedger {
    account: Address,
    shares: BTreeMap<Address, Bps>,
    total_shares: u32,
    total_deposited: Amount,
    claimed: BTreeMap<Address, Amount>,
    total_claimed: Amount,
}

impl DistributionLedger {
    pub fn new(account: Address) -> Self {
        Self {
            account,
            shares: BTreeMap::new(),
            total_shares: 0,
            total_deposited: Amount::zero(),
            claimed: BTreeMap::new(),
            total_claimed: Amount::zero(),
        }
    }

    pub fn account(&self) -> Address {
        self.account
    }

    pub fn shares_of(&self, holder: &Address) -> Bps {
        self.shares.get(holder).copied().unwrap_or(0)
    }

    /// Share table in address order
    pub fn shareholders(&self) -> impl Iterator<Item = (&Address, &Bps)> {
        self.shares.iter()
    }

    pub fn total_shares(&self) -> u32 {
        self.total_shares
    }

    pub fn total_deposited(&self) -> Amount {
        self.total_deposited
    }

    pub fn total_claimed(&self) -> Amount {
        self.total_claimed
    }

    pub fn claimed_of(&self, holder: &Address) -> Amount {
        self.claimed.get(holder).copied().unwrap_or_default()
    }

    /// Deposited but not yet paid out, including the bps remainder
    pub fn outstanding(&self) -> Amount {
        self.total_deposited.saturating_sub(self.total_claimed)
    }

    /// floor(total_deposited * shares / 10000)
    ///
    /// Split as `q * bps + floor(r * bps / 10000)` with `total = q * 10000 + r`.
    /// Shares never exceed 10000 bps, so the result is at most
    /// `total_deposited` and cannot overflow.
    pub fn entitlement_of(&self, holder: &Address) -> Amount {
        let bps = Amount::from(self.shares_of(holder));
        let scale = Amount::from(MAX_BPS);
        let (quotient, remainder) = self.total_deposited.div_mod(scale);
        quotient * bps + remainder * bps / scale
    }

    /// Entitlement not yet paid (zero if a share cut left it below the paid amount)
    pub fn claimable_of(&self, holder: &Address) -> Amount {
        self.entitlement_of(holder)
            .saturating_sub(self.claimed_of(holder))
    }

    /// Replace `holder`'s share. `bps == 0` removes the holder.
    ///
    /// Returns the previous share. Claimed amounts are untouched.
    pub fn add_or_update_shareholder(&mut self, holder: Address, bps: Bps) -> FundingResult<Bps> {
        let previous = self.shares_of(&holder);
        let total = self.total_shares - u32::from(previous) + u32::from(bps);
        if bps > MAX_BPS || total > u32::from(MAX_BPS) {
            return Err(FundingError::SharesExceeded { total });
        }

        if bps == 0 {
            self.shares.remove(&holder);
        } else {
            self.shares.insert(holder, bps);
        }
        self.total_shares = total;

        tracing::info!(
            holder = %holder,
            previous,
            bps,
            total_shares = total,
            "distribution share updated"
        );

        Ok(previous)
    }

    /// Tokens held by the account but not yet recorded as deposited
    pub fn unaccounted(&self, store: &dyn BalanceStore) -> Amount {
        store.balance(&self.account).saturating_sub(self.outstanding())
    }

    /// Record `amount` newly arrived tokens as deposited. Returns the new total.
    pub fn deposit_from_crowdfunding(
        &mut self,
        tx: &LedgerTx<'_>,
        amount: Amount,
    ) -> FundingResult<Amount> {
        if amount.is_zero() {
            return Err(FundingError::ZeroAmount);
        }

        let unaccounted = self.unaccounted(tx);
        if amount > unaccounted {
            return Err(TokenError::InsufficientBalance {
                have: unaccounted,
                need: amount,
            }
            .into());
        }

        let total = self
            .total_deposited
            .checked_add(amount)
            .ok_or(FundingError::Overflow)?;
        self.total_deposited = total;

        tracing::info!(amount = %amount, total_deposited = %total, "deposit recorded");

        Ok(total)
    }

    /// Pay `holder` the unpaid part of their entitlement
    pub fn claim(&mut self, tx: &mut LedgerTx<'_>, holder: Address) -> FundingResult<Amount> {
        let entitlement = self.entitlement_of(&holder);
        let payable = entitlement.saturating_sub(self.claimed_of(&holder));
        if payable.is_zero() {
            return Err(FundingError::NothingToClaim(holder));
        }

        let total_claimed = self
            .total_claimed
            .checked_add(payable)
            .ok_or(FundingError::Overflow)?;
        if total_claimed > self.total_deposited {
            return Err(TokenError::InsufficientBalance {
                have: self.outstanding(),
                need: payable,
            }
            .into());
        }

        tx.transfer(self.account, holder, payable)?;

        self.claimed.insert(holder, entitlement);
        self.total_claimed = total_claimed;

        tracing::info!(
            holder = %holder,
            paid = %payable,
            entitlement = %entitlement,
            "claim paid"
        );

        Ok(payable)
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

    const ACCOUNT: Address = Address::new([6; 20]);

    /// Ledger where the distribution account already holds `held`
    fn setup(held: Amount) -> (TokenLedger, DistributionLedger) {
        let mut ledger =
            TokenLedger::new(TokenConfig::new("Test", "TST", tokens(1_000), Amount::exp10(16))).unwrap();
        let mut tx = ledger.begin();
        tx.purchase(addr(9), ACCOUNT, held, Amount::exp10(20)).unwrap();
        let staged = tx.into_staged();
        ledger.commit(staged);
        (ledger, DistributionLedger::new(ACCOUNT))
    }

    fn deposit(ledger: &TokenLedger, dist: &mut DistributionLedger, amount: Amount) -> FundingResult<Amount> {
        let tx = ledger.begin();
        dist.deposit_from_crowdfunding(&tx, amount)
    }

    fn claim(ledger: &mut TokenLedger, dist: &mut DistributionLedger, holder: Address) -> FundingResult<Amount> {
        let mut tx = ledger.begin();
        let result = dist.claim(&mut tx, holder);
        let staged = tx.into_staged();
        if result.is_ok() {
            ledger.commit(staged);
        }
        result
    }

    #[test]
    fn test_entitlement_at_amount_max() {
        let mut dist = DistributionLedger::new(ACCOUNT);
        dist.add_or_update_shareholder(addr(1), 10_000).unwrap();
        dist.total_deposited = Amount::MAX;
        assert_eq!(dist.entitlement_of(&addr(1)), Amount::MAX);
        assert_eq!(dist.claimable_of(&addr(1)), Amount::MAX);

        dist.add_or_update_shareholder(addr(1), 3_333).unwrap();
        let expected = lib_types::bps_of(Amount::MAX, 3_333).unwrap();
        assert_eq!(dist.entitlement_of(&addr(1)), expected);
        assert_eq!(dist.entitlement_of(&addr(2)), Amount::zero());
    }

    #[test]
    fn test_entitlement_floors_small_deposits() {
        let mut dist = DistributionLedger::new(ACCOUNT);
        dist.add_or_update_shareholder(addr(1), 3_333).unwrap();
        dist.total_deposited = Amount::from(10_001u64);
        // floor(10001 * 3333 / 10000) = 3333
        assert_eq!(dist.entitlement_of(&addr(1)), Amount::from(3_333u64));
    }

    #[test]
    fn test_shares_capped_at_max() {
        let mut dist = DistributionLedger::new(ACCOUNT);
        dist.add_or_update_shareholder(addr(1), 6_000).unwrap();
        dist.add_or_update_shareholder(addr(2), 4_000).unwrap();

        assert_eq!(
            dist.add_or_update_shareholder(addr(3), 1),
            Err(FundingError::SharesExceeded { total: 10_001 })
        );
        assert_eq!(
            dist.add_or_update_shareholder(addr(1), 10_001),
            Err(FundingError::SharesExceeded { total: 14_001 })
        );

        // Replacing a share frees its old weight
        assert_eq!(dist.add_or_update_shareholder(addr(1), 5_000).unwrap(), 6_000);
        dist.add_or_update_shareholder(addr(3), 1_000).unwrap();
        assert_eq!(dist.total_shares(), 10_000);
    }

    #[test]
    fn test_zero_bps_removes_holder() {
        let mut dist = DistributionLedger::new(ACCOUNT);
        dist.add_or_update_shareholder(addr(1), 2_500).unwrap();
        dist.add_or_update_shareholder(addr(1), 0).unwrap();
        assert_eq!(dist.shareholders().count(), 0);
        assert_eq!(dist.total_shares(), 0);
    }

    #[test]
    fn test_deposit_limited_to_unaccounted_tokens() {
        let (ledger, mut dist) = setup(tokens(110));

        assert_eq!(deposit(&ledger, &mut dist, tokens(100)).unwrap(), tokens(100));
        assert!(matches!(
            deposit(&ledger, &mut dist, tokens(11)),
            Err(FundingError::Token(TokenError::InsufficientBalance { .. }))
        ));
        assert_eq!(deposit(&ledger, &mut dist, tokens(10)).unwrap(), tokens(110));
        assert_eq!(dist.unaccounted(&ledger.begin()), Amount::zero());
        assert_eq!(deposit(&ledger, &mut dist, Amount::zero()), Err(FundingError::ZeroAmount));
    }

    #[test]
    fn test_claim_pays_once_per_deposit() {
        let (mut ledger, mut dist) = setup(tokens(110));
        deposit(&ledger, &mut dist, tokens(110)).unwrap();
        dist.add_or_update_shareholder(addr(1), 10_000).unwrap();

        assert_eq!(claim(&mut ledger, &mut dist, addr(1)).unwrap(), tokens(110));
        assert_eq!(ledger.balance_of(&addr(1)), tokens(110));
        assert_eq!(
            claim(&mut ledger, &mut dist, addr(1)),
            Err(FundingError::NothingToClaim(addr(1)))
        );
        assert_eq!(dist.outstanding(), Amount::zero());
    }

    #[test]
    fn test_claim_follows_new_deposits() {
        let (mut ledger, mut dist) = setup(tokens(100));
        dist.add_or_update_shareholder(addr(1), 5_000).unwrap();
        deposit(&ledger, &mut dist, tokens(40)).unwrap();

        assert_eq!(claim(&mut ledger, &mut dist, addr(1)).unwrap(), tokens(20));
        deposit(&ledger, &mut dist, tokens(60)).unwrap();
        assert_eq!(claim(&mut ledger, &mut dist, addr(1)).unwrap(), tokens(30));
        assert_eq!(dist.claimed_of(&addr(1)), tokens(50));
    }

    #[test]
    fn test_remainder_stays_outstanding() {
        let (mut ledger, mut dist) = setup(Amount::from(10u64));
        deposit(&ledger, &mut dist, Amount::from(10u64)).unwrap();
        dist.add_or_update_shareholder(addr(1), 3_333).unwrap();
        dist.add_or_update_shareholder(addr(2), 3_333).unwrap();
        dist.add_or_update_shareholder(addr(3), 3_334).unwrap();

        let paid: Amount = [addr(1), addr(2), addr(3)]
            .into_iter()
            .map(|h| claim(&mut ledger, &mut dist, h).unwrap())
            .fold(Amount::zero(), |acc, p| acc + p);

        assert_eq!(paid, Amount::from(9u64));
        assert_eq!(dist.outstanding(), Amount::one());
        assert_eq!(ledger.balance_of(&ACCOUNT), Amount::one());
    }

    #[test]
    fn test_share_reshuffle_cannot_overdraw() {
        let (mut ledger, mut dist) = setup(tokens(100));
        deposit(&ledger, &mut dist, tokens(100)).unwrap();

        dist.add_or_update_shareholder(addr(1), 10_000).unwrap();
        claim(&mut ledger, &mut dist, addr(1)).unwrap();

        // Everything is paid; a new holder's entitlement has no backing
        dist.add_or_update_shareholder(addr(1), 0).unwrap();
        dist.add_or_update_shareholder(addr(2), 10_000).unwrap();
        assert!(matches!(
            claim(&mut ledger, &mut dist, addr(2)),
            Err(FundingError::Token(TokenError::InsufficientBalance { .. }))
        ));
        assert_eq!(dist.claimed_of(&addr(2)), Amount::zero());
    }

    #[test]
    fn test_unknown_holder_has_nothing() {
        let (mut ledger, mut dist) = setup(tokens(10));
        deposit(&ledger, &mut dist, tokens(10)).unwrap();
        assert_eq!(dist.claimable_of(&addr(4)), Amount::zero());
        assert_eq!(
            claim(&mut ledger, &mut dist, addr(4)),
            Err(FundingError::NothingToClaim(addr(4)))
        );
    }
}
