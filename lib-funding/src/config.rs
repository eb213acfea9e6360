//! Engine configuration loaded from TOML.
//!
//! ```toml
//! [token]
//! name = "BlockFund Token"
//! symbol = "BFT"
//! total_supply = "1000000"     # whole tokens
//! price_per_token = "0.01"     # native units per whole token
//!
//! [sponsor]
//! match_bps = 1000
//!
//! [authority]
//! admins = ["0x…"]
//!
//! [[campaigns]]
//! goal = "100"
//! allowed = true
//! ```
//!
//! Amounts are decimal strings in whole units with up to 18 fractional
//! digits.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use lib_tokens::TokenConfig;
use lib_types::{parse_units, Address, Amount, Bps, MAX_BPS, TOKEN_DECIMALS};

use crate::authority::{Role, RoleAuthority};
use crate::command::Command;
use crate::engine::FundingEngine;
use crate::errors::{FundingError, FundingResult};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FundingConfig {
    pub token: TokenSection,
    #[serde(default)]
    pub sponsor: SponsorSection,
    pub authority: AuthoritySection,
    #[serde(default)]
    pub campaigns: Vec<CampaignSection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TokenSection {
    pub name: String,
    pub symbol: String,
    pub total_supply: String,
    pub price_per_token: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SponsorSection {
    #[serde(default)]
    pub match_bps: Bps,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AuthoritySection {
    /// Hold every administrative right; the first one bootstraps campaigns
    pub admins: Vec<Address>,
    #[serde(default)]
    pub campaign_operators: Vec<Address>,
    #[serde(default)]
    pub sponsor_curators: Vec<Address>,
    #[serde(default)]
    pub distribution_registrars: Vec<Address>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CampaignSection {
    pub goal: String,
    /// Pre-allow-list in the sponsor pool
    #[serde(default)]
    pub allowed: bool,
}

/// Read and parse a config file. Does not validate.
pub fn load_config(path: &Path) -> FundingResult<FundingConfig> {
    let raw = fs::read_to_string(path).map_err(|e| {
        FundingError::Config(format!("Failed to read config {}: {}", path.display(), e))
    })?;
    FundingConfig::from_toml_str(&raw)
}

fn parse_amount(field: &str, text: &str) -> FundingResult<Amount> {
    parse_units(text, TOKEN_DECIMALS)
        .map_err(|e| FundingError::Config(format!("{field}: {e}")))
}

impl FundingConfig {
    pub fn from_toml_str(raw: &str) -> FundingResult<Self> {
        toml::from_str(raw).map_err(|e| FundingError::Config(format!("Invalid config: {}", e)))
    }

    pub fn token_config(&self) -> FundingResult<TokenConfig> {
        Ok(TokenConfig::new(
            self.token.name.clone(),
            self.token.symbol.clone(),
            parse_amount("token.total_supply", &self.token.total_supply)?,
            parse_amount("token.price_per_token", &self.token.price_per_token)?,
        ))
    }

    /// Campaign goals in smallest units, in file order
    pub fn campaign_goals(&self) -> FundingResult<Vec<Amount>> {
        self.campaigns
            .iter()
            .enumerate()
            .map(|(i, c)| parse_amount(&format!("campaigns[{i}].goal"), &c.goal))
            .collect()
    }

    pub fn authority(&self) -> RoleAuthority {
        let section = &self.authority;
        let mut authority = RoleAuthority::with_admins(section.admins.iter().copied());
        for (role, members) in [
            (Role::CampaignOperator, &section.campaign_operators),
            (Role::SponsorCurator, &section.sponsor_curators),
            (Role::DistributionRegistrar, &section.distribution_registrars),
        ] {
            for member in members {
                authority.add(role, *member);
            }
        }
        authority
    }

    /// Check ranges and parse every amount
    pub fn validate(&self) -> FundingResult<()> {
        self.token_config()?
            .validate()
            .map_err(|e| FundingError::Config(e.to_string()))?;

        if self.sponsor.match_bps > MAX_BPS {
            return Err(FundingError::InvalidBps(self.sponsor.match_bps));
        }

        let section = &self.authority;
        if section.admins.is_empty() {
            return Err(FundingError::Config("authority.admins must not be empty".to_string()));
        }
        let all_members = section
            .admins
            .iter()
            .chain(&section.campaign_operators)
            .chain(&section.sponsor_curators)
            .chain(&section.distribution_registrars);
        for member in all_members {
            if member.is_zero() {
                return Err(FundingError::Config(
                    "authority members must not be the zero address".to_string(),
                ));
            }
        }

        for (i, goal) in self.campaign_goals()?.into_iter().enumerate() {
            if goal.is_zero() {
                return Err(FundingError::Config(format!("campaigns[{i}].goal must be positive")));
            }
        }
        Ok(())
    }
}

impl FundingEngine {
    /// Build an engine and bootstrap the configured campaigns.
    ///
    /// Campaigns are created (and allow-listed when requested) by the first
    /// admin through ordinary commands, so they appear in the event log.
    pub fn from_config(config: &FundingConfig) -> FundingResult<Self> {
        config.validate()?;

        let mut engine = FundingEngine::new(
            config.token_config()?,
            config.sponsor.match_bps,
            Box::new(config.authority()),
        )?;

        let bootstrap = config.authority.admins[0];
        for (section, goal) in config.campaigns.iter().zip(config.campaign_goals()?) {
            let campaign = engine.next_campaign_account();
            engine.execute(bootstrap, Command::CreateCampaign { goal })?;
            if section.allowed {
                engine.execute(
                    bootstrap,
                    Command::SetAllowedCampaign {
                        campaign,
                        allowed: true,
                    },
                )?;
            }
        }

        tracing::info!(campaigns = config.campaigns.len(), "engine bootstrapped from config");
        Ok(engine)
    }
}
