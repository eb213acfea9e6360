//! Administrative authorization.
//!
//! The engine never hardcodes an owner. It asks an injected
//! [`AuthorizationPolicy`] whether a caller may perform an [`AdminAction`].

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

use lib_types::Address;

// =============================================================================
// ADMIN ACTIONS
// =============================================================================

/// Operations gated by the authorization policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminAction {
    /// Open a new campaign escrow
    CreateCampaign,
    /// Add or remove a campaign from the sponsor allow-list
    ManageAllowList,
    /// Set a beneficiary's distribution share
    ManageShares,
    /// Close an escrow and request the sponsor match
    FinalizeCampaign,
    /// Move a finalized escrow into the distribution ledger
    ReleaseToDistribution,
}

impl AdminAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminAction::CreateCampaign => "create_campaign",
            AdminAction::ManageAllowList => "manage_allow_list",
            AdminAction::ManageShares => "manage_shares",
            AdminAction::FinalizeCampaign => "finalize_campaign",
            AdminAction::ReleaseToDistribution => "release_to_distribution",
        }
    }

    /// Role that grants this action in a [`RoleAuthority`]
    pub fn required_role(&self) -> Role {
        match self {
            AdminAction::CreateCampaign
            | AdminAction::FinalizeCampaign
            | AdminAction::ReleaseToDistribution => Role::CampaignOperator,
            AdminAction::ManageAllowList => Role::SponsorCurator,
            AdminAction::ManageShares => Role::DistributionRegistrar,
        }
    }
}

impl fmt::Display for AdminAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// POLICY
// =============================================================================

/// Decides whether `caller` may perform `action`
pub trait AuthorizationPolicy: fmt::Debug + Send + Sync {
    fn authorize(&self, caller: &Address, action: AdminAction) -> bool;
}

/// One address holds every administrative right
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SingleAdmin(pub Address);

impl AuthorizationPolicy for SingleAdmin {
    fn authorize(&self, caller: &Address, _action: AdminAction) -> bool {
        !caller.is_zero() && *caller == self.0
    }
}

// =============================================================================
// ROLE AUTHORITY
// =============================================================================

/// Role enumeration for authority checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Holds every administrative right
    Admin,
    /// Creates, finalizes and releases campaigns
    CampaignOperator,
    /// Maintains the sponsor allow-list
    SponsorCurator,
    /// Maintains the distribution share table
    DistributionRegistrar,
}

/// Authority set: maps roles to sets of authorized addresses
#[derive(Debug, Clone, Default)]
pub struct RoleAuthority {
    authorities: HashMap<Role, HashSet<Address>>,
}

impl RoleAuthority {
    pub fn new() -> Self {
        Self::default()
    }

    /// Authority where every listed address is [`Role::Admin`]
    pub fn with_admins(admins: impl IntoIterator<Item = Address>) -> Self {
        let mut authority = Self::new();
        for admin in admins {
            authority.add(Role::Admin, admin);
        }
        authority
    }

    /// Add an address to a role
    pub fn add(&mut self, role: Role, address: Address) {
        self.authorities.entry(role).or_default().insert(address);
    }

    /// Remove an address from a role
    pub fn remove(&mut self, role: Role, address: &Address) {
        if let Some(set) = self.authorities.get_mut(&role) {
            set.remove(address);
        }
    }

    pub fn has_role(&self, role: Role, address: &Address) -> bool {
        self.authorities
            .get(&role)
            .map(|set| set.contains(address))
            .unwrap_or(false)
    }

    /// Get all addresses for a role
    pub fn addresses(&self, role: Role) -> impl Iterator<Item = &Address> {
        self.authorities
            .get(&role)
            .map(|set| set.iter())
            .into_iter()
            .flatten()
    }
}

impl AuthorizationPolicy for RoleAuthority {
    fn authorize(&self, caller: &Address, action: AdminAction) -> bool {
        if caller.is_zero() {
            return false;
        }
        self.has_role(Role::Admin, caller) || self.has_role(action.required_role(), caller)
    }
}
