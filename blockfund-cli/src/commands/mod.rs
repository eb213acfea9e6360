//! Subcommand handlers.
//!
//! Each handler builds a serializable report with no I/O, then renders it
//! through [`crate::output::Output`] as JSON or as aligned table lines.

pub mod run;
pub mod validate;

use lib_funding::EngineSummary;
use lib_types::{format_units, Amount, TOKEN_DECIMALS};

/// Whole-unit rendering of a smallest-unit amount
pub fn units(amount: Amount) -> String {
    format_units(amount, TOKEN_DECIMALS)
}

/// Table lines for an engine summary
pub fn summary_lines(summary: &EngineSummary) -> Vec<String> {
    let token = &summary.token;
    let mut lines = vec![
        format!("{:<20} {} ({})", "token", token.name, token.symbol),
        format!("{:<20} {}", "total supply", units(token.total_supply)),
        format!("{:<20} {}", "reserve", units(token.reserve)),
        format!("{:<20} {}", "proceeds", units(token.proceeds_wei)),
        format!(
            "{:<20} {}",
            "conservation",
            if token.conserved { "ok" } else { "VIOLATED" }
        ),
        String::new(),
        format!("{:<20} {}", "sponsor pool", summary.sponsor.account),
        format!("{:<20} {} bps", "match rate", summary.sponsor.match_bps),
        format!("{:<20} {}", "pool balance", units(summary.sponsor.balance)),
        format!("{:<20} {}", "total matched", units(summary.sponsor.total_matched)),
        format!("{:<20} {}", "allow-listed", summary.sponsor.allowed.len()),
    ];

    for campaign in &summary.campaigns {
        lines.push(String::new());
        lines.push(format!("{:<20} {}", "campaign", campaign.account));
        lines.push(format!("{:<20} {}", "state", campaign.state));
        lines.push(format!(
            "{:<20} {} / {}",
            "collected",
            units(campaign.total_collected),
            units(campaign.goal)
        ));
        lines.push(format!("{:<20} {}", "contributors", campaign.contributors));
        lines.push(format!("{:<20} {}", "sponsor match", units(campaign.sponsor_match)));
        lines.push(format!("{:<20} {}", "released", units(campaign.released)));
    }

    let distribution = &summary.distribution;
    lines.push(String::new());
    lines.push(format!("{:<20} {}", "distribution", distribution.account));
    lines.push(format!("{:<20} {}", "deposited", units(distribution.total_deposited)));
    lines.push(format!("{:<20} {}", "claimed", units(distribution.total_claimed)));
    lines.push(format!("{:<20} {}", "outstanding", units(distribution.outstanding)));
    lines.push(format!("{:<20} {} bps", "shares", distribution.total_shares));
    for holder in &distribution.shareholders {
        lines.push(format!(
            "  {} {:>5} bps  claimed {}  claimable {}",
            holder.holder,
            holder.bps,
            units(holder.claimed),
            units(holder.claimable)
        ));
    }

    lines.push(String::new());
    lines.push(format!("{:<20} {}", "accounts", summary.balances.len()));
    lines.push(format!("{:<20} {}", "events", summary.event_count));
    lines
}
