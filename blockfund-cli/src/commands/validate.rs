//! `blockfund validate`

use serde::Serialize;

use lib_funding::{FundingConfig, FundingEngine};
use lib_types::{Address, Amount, Bps};

use crate::commands::units;
use crate::error::CliResult;
use crate::output::{Output, OutputFormat};

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub name: String,
    pub symbol: String,
    #[serde(with = "lib_types::decimal")]
    pub total_supply: Amount,
    #[serde(with = "lib_types::decimal")]
    pub price_per_token_wei: Amount,
    pub reserve_account: Address,
    pub sponsor_account: Address,
    pub distribution_account: Address,
    pub match_bps: Bps,
    pub admins: Vec<Address>,
    pub campaigns: Vec<CampaignEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CampaignEntry {
    pub account: Address,
    #[serde(with = "lib_types::decimal")]
    pub goal: Amount,
    pub allowed: bool,
}

/// Validate `config` by bootstrapping an engine from it
pub fn build_report(config: &FundingConfig) -> CliResult<ValidationReport> {
    let engine = FundingEngine::from_config(config)?;
    let ledger = engine.ledger();
    let token = ledger.config();

    Ok(ValidationReport {
        name: token.name.clone(),
        symbol: token.symbol.clone(),
        total_supply: token.total_supply,
        price_per_token_wei: token.price_per_token_wei,
        reserve_account: ledger.reserve_address(),
        sponsor_account: engine.pool().account(),
        distribution_account: engine.distribution().account(),
        match_bps: engine.pool().match_bps(),
        admins: config.authority.admins.clone(),
        campaigns: engine
            .campaigns()
            .map(|c| CampaignEntry {
                account: c.account(),
                goal: c.goal(),
                allowed: engine.pool().is_allowed(&c.account()),
            })
            .collect(),
    })
}

pub fn handle_validate(
    config: &FundingConfig,
    format: OutputFormat,
    output: &dyn Output,
) -> CliResult<()> {
    let report = build_report(config)?;

    match format {
        OutputFormat::Json => output.print_json(&serde_json::to_value(&report)?),
        OutputFormat::Table => {
            output.header("Configuration OK")?;
            output.print(&format!("{:<20} {} ({})", "token", report.name, report.symbol))?;
            output.print(&format!("{:<20} {}", "total supply", units(report.total_supply)))?;
            output.print(&format!("{:<20} {}", "price per token", units(report.price_per_token_wei)))?;
            output.print(&format!("{:<20} {}", "reserve", report.reserve_account))?;
            output.print(&format!("{:<20} {}", "sponsor pool", report.sponsor_account))?;
            output.print(&format!("{:<20} {}", "distribution", report.distribution_account))?;
            output.print(&format!("{:<20} {} bps", "match rate", report.match_bps))?;
            for admin in &report.admins {
                output.print(&format!("{:<20} {}", "admin", admin))?;
            }
            for campaign in &report.campaigns {
                output.print(&format!(
                    "{:<20} {} goal {}{}",
                    "campaign",
                    campaign.account,
                    units(campaign.goal),
                    if campaign.allowed { " (allow-listed)" } else { "" }
                ))?;
            }
            Ok(())
        }
    }
}
