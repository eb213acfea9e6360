//! Fixed-price token ledger.
//!
//! The whole supply is minted once, to the ledger's own reserve account, at
//! construction. Sales move tokens out of the reserve; every other movement
//! is a transfer between accounts. Supply never changes afterwards.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use lib_types::{mul_div_floor, one_token, Address, Amount, TOKEN_DECIMALS};

use crate::errors::{TokenError, TokenResult};
use crate::staging::{LedgerTx, StagedBalances};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Derivation domain of the reserve account
pub const RESERVE_DOMAIN: &str = "token-reserve";

// =============================================================================
// TOKEN CONFIG
// =============================================================================

/// Immutable token configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Human-readable token name
    pub name: String,
    /// Token symbol (e.g., "BFT")
    pub symbol: String,
    /// Fractional digits (display only, always 18)
    pub decimals: u8,
    /// Total supply in smallest units, minted to the reserve at construction
    #[serde(with = "lib_types::decimal")]
    pub total_supply: Amount,
    /// Native wei charged per whole token (10^18 smallest units)
    #[serde(with = "lib_types::decimal")]
    pub price_per_token_wei: Amount,
}

impl TokenConfig {
    /// Create a config with 18 decimals
    pub fn new(
        name: impl Into<String>,
        symbol: impl Into<String>,
        total_supply: Amount,
        price_per_token_wei: Amount,
    ) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            decimals: TOKEN_DECIMALS as u8,
            total_supply,
            price_per_token_wei,
        }
    }

    /// Check the config can back a ledger
    pub fn validate(&self) -> TokenResult<()> {
        if self.total_supply.is_zero() {
            return Err(TokenError::InvalidConfig("total supply must be positive".to_string()));
        }
        if self.decimals as u32 != TOKEN_DECIMALS {
            return Err(TokenError::InvalidConfig(format!(
                "decimals must be {}, got {}",
                TOKEN_DECIMALS, self.decimals
            )));
        }
        if self.symbol.trim().is_empty() {
            return Err(TokenError::InvalidConfig("symbol must not be empty".to_string()));
        }
        Ok(())
    }

    /// Native cost of `amount` smallest units.
    ///
    /// Formula: floor(amount * price_per_token_wei / 10^18)
    pub fn quote(&self, amount: Amount) -> TokenResult<Amount> {
        mul_div_floor(amount, self.price_per_token_wei, one_token()).ok_or(TokenError::Overflow)
    }
}

// =============================================================================
// RECEIPTS
// =============================================================================

/// Result of a successful transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub from: Address,
    pub to: Address,
    #[serde(with = "lib_types::decimal")]
    pub amount: Amount,
}

/// Purchase record: who paid, who was credited, what it cost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseReceipt {
    /// Account that sent the native payment
    pub payer: Address,
    /// Account credited with the tokens
    pub beneficiary: Address,
    /// Tokens bought, in smallest units
    #[serde(with = "lib_types::decimal")]
    pub amount: Amount,
    /// Native cost retained by the ledger
    #[serde(with = "lib_types::decimal")]
    pub required_wei: Amount,
    /// Overpayment returned to the payer
    #[serde(with = "lib_types::decimal")]
    pub refund_wei: Amount,
}

// =============================================================================
// TOKEN LEDGER
// =============================================================================

/// Committed balance table
///
/// Invariants:
/// - sum(balances) == config.total_supply
/// - zero balances are not stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenLedger {
    config: TokenConfig,
    reserve: Address,
    balances: BTreeMap<Address, Amount>,
    /// Native value retained from sales (refunds excluded)
    proceeds_wei: Amount,
}

impl TokenLedger {
    /// Create the ledger and mint the full supply to the reserve
    pub fn new(config: TokenConfig) -> TokenResult<Self> {
        config.validate()?;

        let reserve = Address::derive(RESERVE_DOMAIN, config.symbol.as_bytes());
        let mut balances = BTreeMap::new();
        balances.insert(reserve, config.total_supply);

        tracing::info!(
            symbol = %config.symbol,
            supply = %config.total_supply,
            price_per_token_wei = %config.price_per_token_wei,
            reserve = %reserve,
            "token ledger created"
        );

        Ok(Self {
            config,
            reserve,
            balances,
            proceeds_wei: Amount::zero(),
        })
    }

    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    /// Account holding unsold supply
    pub fn reserve_address(&self) -> Address {
        self.reserve
    }

    /// Unsold supply
    pub fn reserve(&self) -> Amount {
        self.balance_of(&self.reserve)
    }

    pub fn total_supply(&self) -> Amount {
        self.config.total_supply
    }

    pub fn proceeds_wei(&self) -> Amount {
        self.proceeds_wei
    }

    /// Committed balance; unknown accounts hold zero
    pub fn balance_of(&self, address: &Address) -> Amount {
        self.balances.get(address).copied().unwrap_or_default()
    }

    /// Native cost of `amount` at the fixed price
    pub fn quote(&self, amount: Amount) -> TokenResult<Amount> {
        self.config.quote(amount)
    }

    /// All non-zero balances in address order
    pub fn holders(&self) -> impl Iterator<Item = (&Address, &Amount)> {
        self.balances.iter()
    }

    /// Verify sum(balances) == total_supply
    pub fn verify_conservation(&self) -> TokenResult<()> {
        let mut sum = Amount::zero();
        for amount in self.balances.values() {
            sum = sum.checked_add(*amount).ok_or(TokenError::Overflow)?;
        }
        if sum != self.config.total_supply {
            return Err(TokenError::ConservationViolated(format!(
                "sum of balances ({}) != total supply ({})",
                sum, self.config.total_supply
            )));
        }
        Ok(())
    }

    /// Open a staged overlay against the committed table
    pub fn begin(&self) -> LedgerTx<'_> {
        LedgerTx::new(self)
    }

    /// Apply staged writes in one step
    pub fn commit(&mut self, staged: StagedBalances) {
        let StagedBalances { writes, proceeds_wei } = staged;
        tracing::debug!(accounts = writes.len(), "committing staged balances");

        for (address, amount) in writes {
            if amount.is_zero() {
                self.balances.remove(&address);
            } else {
                self.balances.insert(address, amount);
            }
        }
        self.proceeds_wei = self.proceeds_wei.saturating_add(proceeds_wei);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_types::tokens;

    fn create_test_config() -> TokenConfig {
        TokenConfig::new("Test", "TST", tokens(1_000_000), Amount::exp10(16))
    }

    #[test]
    fn test_supply_minted_to_reserve() {
        let ledger = TokenLedger::new(create_test_config()).unwrap();
        assert_eq!(ledger.reserve(), tokens(1_000_000));
        assert_eq!(ledger.total_supply(), tokens(1_000_000));
        assert_eq!(ledger.holders().count(), 1);
        assert!(ledger.verify_conservation().is_ok());
    }

    #[test]
    fn test_invalid_configs_rejected() {
        let mut config = create_test_config();
        config.total_supply = Amount::zero();
        assert!(matches!(TokenLedger::new(config), Err(TokenError::InvalidConfig(_))));

        let mut config = create_test_config();
        config.decimals = 6;
        assert!(matches!(TokenLedger::new(config), Err(TokenError::InvalidConfig(_))));

        let mut config = create_test_config();
        config.symbol = " ".to_string();
        assert!(matches!(TokenLedger::new(config), Err(TokenError::InvalidConfig(_))));
    }

    #[test]
    fn test_quote_truncates() {
        // 100 tokens at 0.01 native each = 1 native unit
        let config = create_test_config();
        assert_eq!(config.quote(tokens(100)).unwrap(), Amount::exp10(18));

        // 3 smallest units at 2 wei per token: 6 / 10^18 floors to zero
        let cheap = TokenConfig::new("Cheap", "CHP", tokens(1), Amount::from(2u64));
        assert_eq!(cheap.quote(Amount::from(3u64)).unwrap(), Amount::zero());

        // 1.5 tokens at 3 wei per token = 4.5 wei, floors to 4
        let odd = TokenConfig::new("Odd", "ODD", tokens(10), Amount::from(3u64));
        let one_and_half = tokens(1) + tokens(1) / Amount::from(2u64);
        assert_eq!(odd.quote(one_and_half).unwrap(), Amount::from(4u64));
    }

    #[test]
    fn test_reserve_address_is_stable() {
        let a = TokenLedger::new(create_test_config()).unwrap();
        let b = TokenLedger::new(create_test_config()).unwrap();
        assert_eq!(a.reserve_address(), b.reserve_address());
        assert_eq!(a.reserve_address(), Address::derive(RESERVE_DOMAIN, b"TST"));
    }
}
