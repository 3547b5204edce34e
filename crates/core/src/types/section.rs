//! Admin dashboard sections.

use serde::{Deserialize, Serialize};

/// Top-level section of the admin dashboard.
///
/// Persisted as its snake_case name so a reload restores position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DashboardSection {
    #[default]
    Overview,
    Products,
    Orders,
    Clients,
    Inventory,
    Settings,
}

impl DashboardSection {
    /// All sections in navigation order.
    pub const ALL: [Self; 6] = [
        Self::Overview,
        Self::Products,
        Self::Orders,
        Self::Clients,
        Self::Inventory,
        Self::Settings,
    ];

    /// The persisted name of the section.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Overview => "overview",
            Self::Products => "products",
            Self::Orders => "orders",
            Self::Clients => "clients",
            Self::Inventory => "inventory",
            Self::Settings => "settings",
        }
    }
}

impl std::fmt::Display for DashboardSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DashboardSection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|section| section.as_str() == s)
            .ok_or_else(|| format!("invalid dashboard section: {s}"))
    }
}
