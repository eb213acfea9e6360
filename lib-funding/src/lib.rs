//! BlockFund Funding Engine
//!
//! A fixed-price token sale feeds goal-gated campaign escrows. A funded
//! campaign is topped up by a basis-point sponsor match and forwarded to a
//! distribution ledger, where registered beneficiaries claim pro-rata.
//!
//! # Key Types
//!
//! - [`FundingEngine`]: the only call surface; runs each [`Command`] atomically
//! - [`CampaignEscrow`]: `open` -> `pending_sponsor` -> `funded`
//! - [`SponsorPool`]: allow-listed, basis-point matching
//! - [`DistributionLedger`]: share table, deposits and claims
//! - [`AuthorizationPolicy`]: injected admin checks ([`SingleAdmin`], [`RoleAuthority`])
//!
//! # Flow
//!
//! ```ignore
//! engine.execute(buyer, Command::BuyTokens { amount, payment_wei })?;
//! engine.execute(buyer, Command::Contribute { campaign, amount })?;
//! engine.execute(admin, Command::Finalize { campaign })?;
//! engine.execute(admin, Command::TransferToDistribute { campaign })?;
//! engine.execute(anyone, Command::Deposit { amount: released })?;
//! engine.execute(admin, Command::AddOrUpdateShareholder { holder, bps: 10_000 })?;
//! engine.execute(holder, Command::Claim)?;
//! ```

pub mod authority;
pub mod command;
pub mod config;
pub mod distribution;
pub mod engine;
pub mod errors;
pub mod escrow;
pub mod events;
pub mod sponsor;
pub mod summary;

pub use authority::{AdminAction, AuthorizationPolicy, Role, RoleAuthority, SingleAdmin};
pub use command::{Command, Outcome};
pub use config::{load_config, FundingConfig};
pub use distribution::DistributionLedger;
pub use engine::{FundingEngine, SharedFundingEngine};
pub use errors::{FundingError, FundingResult};
pub use escrow::{CampaignEscrow, FundingState};
pub use events::LedgerEvent;
pub use sponsor::SponsorPool;
pub use summary::EngineSummary;
