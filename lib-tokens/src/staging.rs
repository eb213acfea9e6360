//! Staged balance overlay.
//!
//! A [`LedgerTx`] reads through to the committed [`TokenLedger`] and buffers
//! every write. Nothing reaches the ledger until the owner of the `&mut
//! TokenLedger` calls [`TokenLedger::commit`] with [`LedgerTx::into_staged`].
//! Dropping the overlay discards the whole operation.

use std::collections::BTreeMap;

use lib_types::{Address, Amount};

use crate::contract::{PurchaseReceipt, TokenLedger, TransferReceipt};
use crate::errors::{TokenError, TokenResult};
use crate::transfer::{apply_token_purchase, apply_token_transfer, BalanceStore};

/// Writes buffered by a [`LedgerTx`], ready to commit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagedBalances {
    /// Absolute post-operation balances of every touched account
    pub writes: BTreeMap<Address, Amount>,
    /// Native proceeds earned by purchases in this operation
    pub proceeds_wei: Amount,
}

impl StagedBalances {
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty() && self.proceeds_wei.is_zero()
    }
}

/// Overlay over the committed balance table
#[derive(Debug)]
pub struct LedgerTx<'a> {
    base: &'a TokenLedger,
    staged: StagedBalances,
}

impl<'a> LedgerTx<'a> {
    pub(crate) fn new(base: &'a TokenLedger) -> Self {
        Self {
            base,
            staged: StagedBalances::default(),
        }
    }

    /// The committed ledger this overlay reads through to
    pub fn ledger(&self) -> &'a TokenLedger {
        self.base
    }

    /// Move tokens between two accounts
    pub fn transfer(&mut self, from: Address, to: Address, amount: Amount) -> TokenResult<TransferReceipt> {
        apply_token_transfer(self, from, to, amount)
    }

    /// Sell tokens from the reserve to `beneficiary`, paid by `payer`
    pub fn purchase(
        &mut self,
        payer: Address,
        beneficiary: Address,
        amount: Amount,
        payment_wei: Amount,
    ) -> TokenResult<PurchaseReceipt> {
        let base = self.base;
        let proceeds = self
            .staged
            .proceeds_wei
            .checked_add(base.config().quote(amount)?)
            .filter(|p| base.proceeds_wei().checked_add(*p).is_some())
            .ok_or(TokenError::Overflow)?;

        let receipt = apply_token_purchase(
            self,
            base.config(),
            base.reserve_address(),
            payer,
            beneficiary,
            amount,
            payment_wei,
        )?;

        self.staged.proceeds_wei = proceeds;
        Ok(receipt)
    }

    /// Number of accounts written so far
    pub fn touched(&self) -> usize {
        self.staged.writes.len()
    }

    /// Finish the overlay, releasing the borrow of the ledger
    pub fn into_staged(self) -> StagedBalances {
        self.staged
    }
}

impl BalanceStore for LedgerTx<'_> {
    fn balance(&self, address: &Address) -> Amount {
        self.staged
            .writes
            .get(address)
            .copied()
            .unwrap_or_else(|| self.base.balance_of(address))
    }

    fn set_balance(&mut self, address: &Address, amount: Amount) {
        self.staged.writes.insert(*address, amount);
    }
}
