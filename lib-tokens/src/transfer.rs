//! Token Transfer and Purchase Execution
//!
//! [`apply_token_transfer`] and [`apply_token_purchase`] are the only ways
//! balances change. Both run every check before the first write, so a failed
//! call leaves the store untouched.

use lib_types::{Address, Amount};

use crate::contract::{PurchaseReceipt, TokenConfig, TransferReceipt};
use crate::errors::{TokenError, TokenResult};

/// Minimal balance storage interface needed for transfers.
///
/// Implemented by the staged overlay [`crate::LedgerTx`]; tests provide
/// their own map-backed store.
pub trait BalanceStore {
    /// Current balance (zero for unknown accounts)
    fn balance(&self, address: &Address) -> Amount;

    /// Overwrite a balance
    fn set_balance(&mut self, address: &Address, amount: Amount);
}

/// Apply a token transfer with full validation
///
/// # Enforcement
///
/// - **Amount**: must be non-zero
/// - **Balance**: balances[from] >= amount
/// - **Conservation**: debit(from) == credit(to)
///
/// A self-transfer validates the balance and changes nothing.
pub fn apply_token_transfer(
    store: &mut dyn BalanceStore,
    from: Address,
    to: Address,
    amount: Amount,
) -> TokenResult<TransferReceipt> {
    if amount.is_zero() {
        return Err(TokenError::ZeroAmount);
    }

    let from_balance = store.balance(&from);
    if from_balance < amount {
        return Err(TokenError::InsufficientBalance {
            have: from_balance,
            need: amount,
        });
    }

    if from != to {
        let new_from_balance = from_balance
            .checked_sub(amount)
            .ok_or(TokenError::Overflow)?;
        let new_to_balance = store
            .balance(&to)
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;

        store.set_balance(&from, new_from_balance);
        store.set_balance(&to, new_to_balance);
    }

    Ok(TransferReceipt { from, to, amount })
}

/// Sell `amount` tokens out of `reserve` for `payment_wei`.
///
/// # Order of checks
///
/// 1. amount > 0
/// 2. payment_wei >= floor(amount * price / 10^18)
/// 3. reserve holds at least `amount`
///
/// The overpayment is reported as `refund_wei`; the caller returns it to the
/// payer.
pub fn apply_token_purchase(
    store: &mut dyn BalanceStore,
    config: &TokenConfig,
    reserve: Address,
    payer: Address,
    beneficiary: Address,
    amount: Amount,
    payment_wei: Amount,
) -> TokenResult<PurchaseReceipt> {
    if amount.is_zero() {
        return Err(TokenError::ZeroAmount);
    }

    let required_wei = config.quote(amount)?;
    if payment_wei < required_wei {
        return Err(TokenError::InsufficientPayment {
            sent: payment_wei,
            required: required_wei,
        });
    }

    let available = store.balance(&reserve);
    if available < amount {
        return Err(TokenError::InsufficientReserve {
            available,
            requested: amount,
        });
    }

    apply_token_transfer(store, reserve, beneficiary, amount)?;

    Ok(PurchaseReceipt {
        payer,
        beneficiary,
        amount,
        required_wei,
        refund_wei: payment_wei - required_wei,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_types::tokens;
    use std::collections::HashMap;

    /// Mock balance store for testing
    #[derive(Default)]
    struct MockBalanceStore {
        balances: HashMap<Address, Amount>,
    }

    impl BalanceStore for MockBalanceStore {
        fn balance(&self, address: &Address) -> Amount {
            self.balances.get(address).copied().unwrap_or_default()
        }

        fn set_balance(&mut self, address: &Address, amount: Amount) {
            self.balances.insert(*address, amount);
        }
    }

    fn addr(n: u8) -> Address {
        Address::new([n; 20])
    }

    fn create_test_config() -> TokenConfig {
        // 0.01 native per token
        TokenConfig::new("Test", "TST", tokens(1_000), Amount::exp10(16))
    }

    #[test]
    fn test_basic_transfer() {
        let mut store = MockBalanceStore::default();
        store.set_balance(&addr(1), tokens(10));

        let receipt = apply_token_transfer(&mut store, addr(1), addr(2), tokens(4)).unwrap();

        assert_eq!(receipt.amount, tokens(4));
        assert_eq!(store.balance(&addr(1)), tokens(6));
        assert_eq!(store.balance(&addr(2)), tokens(4));
    }

    #[test]
    fn test_transfer_insufficient_balance() {
        let mut store = MockBalanceStore::default();
        store.set_balance(&addr(1), Amount::from(500u64));

        let result = apply_token_transfer(&mut store, addr(1), addr(2), Amount::from(1_000u64));
        assert_eq!(
            result,
            Err(TokenError::InsufficientBalance {
                have: Amount::from(500u64),
                need: Amount::from(1_000u64),
            })
        );
        assert_eq!(store.balance(&addr(1)), Amount::from(500u64));
        assert_eq!(store.balance(&addr(2)), Amount::zero());
    }

    #[test]
    fn test_transfer_zero_amount() {
        let mut store = MockBalanceStore::default();
        let result = apply_token_transfer(&mut store, addr(1), addr(2), Amount::zero());
        assert_eq!(result, Err(TokenError::ZeroAmount));
    }

    #[test]
    fn test_self_transfer_is_noop() {
        let mut store = MockBalanceStore::default();
        store.set_balance(&addr(1), tokens(3));

        apply_token_transfer(&mut store, addr(1), addr(1), tokens(3)).unwrap();
        assert_eq!(store.balance(&addr(1)), tokens(3));

        let result = apply_token_transfer(&mut store, addr(1), addr(1), tokens(4));
        assert!(matches!(result, Err(TokenError::InsufficientBalance { .. })));
    }

    #[test]
    fn test_purchase_with_refund() {
        let config = create_test_config();
        let reserve = addr(9);
        let mut store = MockBalanceStore::default();
        store.set_balance(&reserve, tokens(1_000));

        // 100 tokens cost 1.0 native; pay 1.5
        let payment = Amount::exp10(18) + Amount::exp10(17) * Amount::from(5u64);
        let receipt =
            apply_token_purchase(&mut store, &config, reserve, addr(1), addr(1), tokens(100), payment)
                .unwrap();

        assert_eq!(receipt.required_wei, Amount::exp10(18));
        assert_eq!(receipt.refund_wei, Amount::exp10(17) * Amount::from(5u64));
        assert_eq!(store.balance(&addr(1)), tokens(100));
        assert_eq!(store.balance(&reserve), tokens(900));
    }

    #[test]
    fn test_purchase_underpaid() {
        let config = create_test_config();
        let reserve = addr(9);
        let mut store = MockBalanceStore::default();
        store.set_balance(&reserve, tokens(1_000));

        let result = apply_token_purchase(
            &mut store,
            &config,
            reserve,
            addr(1),
            addr(1),
            tokens(100),
            Amount::exp10(18) - Amount::one(),
        );
        assert!(matches!(result, Err(TokenError::InsufficientPayment { .. })));
        assert_eq!(store.balance(&reserve), tokens(1_000));
    }

    #[test]
    fn test_purchase_exceeds_reserve() {
        let config = create_test_config();
        let reserve = addr(9);
        let mut store = MockBalanceStore::default();
        store.set_balance(&reserve, tokens(5));

        let result = apply_token_purchase(
            &mut store,
            &config,
            reserve,
            addr(1),
            addr(1),
            tokens(6),
            Amount::exp10(18),
        );
        assert_eq!(
            result,
            Err(TokenError::InsufficientReserve {
                available: tokens(5),
                requested: tokens(6),
            })
        );
    }

    #[test]
    fn test_purchase_truncated_cost() {
        // 3 smallest units at 2 wei per whole token cost nothing
        let config = TokenConfig::new("Cheap", "CHP", tokens(1), Amount::from(2u64));
        let reserve = addr(9);
        let mut store = MockBalanceStore::default();
        store.set_balance(&reserve, tokens(1));

        let receipt = apply_token_purchase(
            &mut store,
            &config,
            reserve,
            addr(1),
            addr(1),
            Amount::from(3u64),
            Amount::zero(),
        )
        .unwrap();
        assert_eq!(receipt.required_wei, Amount::zero());
        assert_eq!(receipt.refund_wei, Amount::zero());
        assert_eq!(store.balance(&addr(1)), Amount::from(3u64));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn total(store: &MockBalanceStore) -> Amount {
            store.balances.values().fold(Amount::zero(), |acc, b| acc + *b)
        }

        proptest! {
            #[test]
            fn transfers_conserve_total(
                moves in prop::collection::vec((0u8..4, 0u8..4, 1u64..2_000), 1..40)
            ) {
                let mut store = MockBalanceStore::default();
                for n in 0..4 {
                    store.set_balance(&addr(n), Amount::from(1_000u64));
                }

                for (from, to, amount) in moves {
                    let before = store.balance(&addr(from));
                    let result = apply_token_transfer(&mut store, addr(from), addr(to), Amount::from(amount));
                    if result.is_err() {
                        prop_assert!(before < Amount::from(amount));
                    }
                    prop_assert_eq!(total(&store), Amount::from(4_000u64));
                }
            }
        }
    }
}
