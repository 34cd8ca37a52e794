//! GICS level 1 sectors.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// GICS level 1 sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GicsSector {
    /// Energy (10)
    Energy,
    /// Materials (15)
    Materials,
    /// Industrials (20)
    Industrials,
    /// Consumer Discretionary (25)
    ConsumerDiscretionary,
    /// Consumer Staples (30)
    ConsumerStaples,
    /// Health Care (35)
    HealthCare,
    /// Financials (40)
    Financials,
    /// Information Technology (45)
    InformationTechnology,
    /// Communication Services (50)
    CommunicationServices,
    /// Utilities (55)
    Utilities,
    /// Real Estate (60)
    RealEstate,
}

impl GicsSector {
    /// All sectors in code order.
    pub const ALL: [Self; 11] = [
        Self::Energy,
        Self::Materials,
        Self::Industrials,
        Self::ConsumerDiscretionary,
        Self::ConsumerStaples,
        Self::HealthCare,
        Self::Financials,
        Self::InformationTechnology,
        Self::CommunicationServices,
        Self::Utilities,
        Self::RealEstate,
    ];

    /// Two-digit sector code.
    pub const fn code(&self) -> u8 {
        match self {
            Self::Energy => 10,
            Self::Materials => 15,
            Self::Industrials => 20,
            Self::ConsumerDiscretionary => 25,
            Self::ConsumerStaples => 30,
            Self::HealthCare => 35,
            Self::Financials => 40,
            Self::InformationTechnology => 45,
            Self::CommunicationServices => 50,
            Self::Utilities => 55,
            Self::RealEstate => 60,
        }
    }

    /// Sector with the given two-digit code.
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }

    /// Display name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Energy => "Energy",
            Self::Materials => "Materials",
            Self::Industrials => "Industrials",
            Self::ConsumerDiscretionary => "Consumer Discretionary",
            Self::ConsumerStaples => "Consumer Staples",
            Self::HealthCare => "Health Care",
            Self::Financials => "Financials",
            Self::InformationTechnology => "Information Technology",
            Self::CommunicationServices => "Communication Services",
            Self::Utilities => "Utilities",
            Self::RealEstate => "Real Estate",
        }
    }

    /// Short name used in universe names such as `sp500-tech`.
    pub const fn slug(&self) -> &'static str {
        match self {
            Self::Energy => "energy",
            Self::Materials => "materials",
            Self::Industrials => "industrials",
            Self::ConsumerDiscretionary => "discretionary",
            Self::ConsumerStaples => "staples",
            Self::HealthCare => "health",
            Self::Financials => "financials",
            Self::InformationTechnology => "tech",
            Self::CommunicationServices => "communication",
            Self::Utilities => "utilities",
            Self::RealEstate => "realestate",
        }
    }
}

impl fmt::Display for GicsSector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error for an unrecognized sector name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown sector: {0}")]
pub struct UnknownSector(pub String);

impl FromStr for GicsSector {
    type Err = UnknownSector;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .flat_map(char::to_lowercase)
            .collect();

        if let Ok(code) = normalized.parse::<u8>() {
            return Self::from_code(code).ok_or_else(|| UnknownSector(s.to_string()));
        }

        Ok(match normalized.as_str() {
            "informationtechnology" | "it" | "tech" => Self::InformationTechnology,
            "healthcare" | "health" => Self::HealthCare,
            "financials" | "finance" => Self::Financials,
            "consumerdiscretionary" | "discretionary" => Self::ConsumerDiscretionary,
            "communicationservices" | "communication" | "comms" => Self::CommunicationServices,
            "industrials" | "industrial" => Self::Industrials,
            "consumerstaples" | "staples" => Self::ConsumerStaples,
            "energy" => Self::Energy,
            "utilities" | "utility" => Self::Utilities,
            "realestate" | "estate" => Self::RealEstate,
            "materials" => Self::Materials,
            _ => return Err(UnknownSector(s.to_string())),
        })
    }
}
