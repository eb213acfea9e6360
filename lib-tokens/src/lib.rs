//! BlockFund Token Ledger
//!
//! Fixed-price issuance and balance bookkeeping for the funding engine.
//!
//! # Key Types
//!
//! - [`TokenConfig`]: immutable price and supply
//! - [`TokenLedger`]: the committed balance table (whole supply minted to the reserve)
//! - [`LedgerTx`]: staged overlay; all writes of one operation commit together
//! - [`BalanceStore`]: the seam transfers and purchases are applied through
//!
//! # Execution
//!
//! ```ignore
//! let mut tx = ledger.begin();
//! tx.purchase(payer, payer, amount, payment_wei)?;
//! tx.transfer(payer, escrow, amount)?;
//! let staged = tx.into_staged();
//! ledger.commit(staged);
//! ```

pub mod contract;
pub mod errors;
pub mod staging;
pub mod transfer;

pub use contract::*;
pub use errors::*;
pub use staging::{LedgerTx, StagedBalances};
pub use transfer::{apply_token_purchase, apply_token_transfer, BalanceStore};
