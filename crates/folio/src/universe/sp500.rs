//! S&P 500 constituents by sector.

use crate::universe::gics::GicsSector;
use std::collections::BTreeMap;

const ENERGY: &[&str] = &[
    "XOM", "CVX", "COP", "SLB", "EOG", "MPC", "PSX", "VLO", "OXY", "HAL",
];
const MATERIALS: &[&str] = &[
    "LIN", "APD", "SHW", "FCX", "NEM", "ECL", "DD", "DOW", "PPG", "NUE",
];
const INDUSTRIALS: &[&str] = &[
    "CAT", "UNP", "RTX", "HON", "UPS", "BA", "DE", "LMT", "GE", "MMM", "FDX", "NSC",
];
const CONSUMER_DISCRETIONARY: &[&str] = &[
    "AMZN", "TSLA", "HD", "MCD", "NKE", "SBUX", "LOW", "TJX", "BKNG", "CMG", "F", "GM",
];
const CONSUMER_STAPLES: &[&str] = &[
    "WMT", "PG", "COST", "KO", "PEP", "PM", "MO", "CL", "MDLZ", "KHC",
];
const HEALTH_CARE: &[&str] = &[
    "LLY", "UNH", "JNJ", "ABBV", "MRK", "TMO", "ABT", "DHR", "PFE", "BMY", "AMGN", "GILD",
];
// Yahoo spells share classes with a dash.
const FINANCIALS: &[&str] = &[
    "BRK-B", "JPM", "V", "MA", "BAC", "WFC", "MS", "GS", "BLK", "C", "AXP", "SCHW",
];
const INFORMATION_TECHNOLOGY: &[&str] = &[
    "AAPL", "MSFT", "NVDA", "AVGO", "ORCL", "CSCO", "ACN", "AMD", "IBM", "INTC", "TXN", "QCOM",
    "ADBE", "CRM", "NOW",
];
const COMMUNICATION_SERVICES: &[&str] = &[
    "GOOGL", "GOOG", "META", "NFLX", "DIS", "CMCSA", "T", "VZ", "TMUS", "EA",
];
const UTILITIES: &[&str] = &["NEE", "SO", "DUK", "CEG", "AEP", "EXC", "XEL", "D"];
const REAL_ESTATE: &[&str] = &["PLD", "AMT", "EQIX", "CCI", "PSA", "SPG", "O", "WELL"];

/// Large-cap S&P 500 members across all eleven sectors.
#[derive(Debug, Clone, Copy, Default)]
pub struct SP500Universe;

impl SP500Universe {
    /// Create the universe.
    pub const fn new() -> Self {
        Self
    }

    /// Members of `sector`.
    pub const fn sector_members(&self, sector: GicsSector) -> &'static [&'static str] {
        match sector {
            GicsSector::Energy => ENERGY,
            GicsSector::Materials => MATERIALS,
            GicsSector::Industrials => INDUSTRIALS,
            GicsSector::ConsumerDiscretionary => CONSUMER_DISCRETIONARY,
            GicsSector::ConsumerStaples => CONSUMER_STAPLES,
            GicsSector::HealthCare => HEALTH_CARE,
            GicsSector::Financials => FINANCIALS,
            GicsSector::InformationTechnology => INFORMATION_TECHNOLOGY,
            GicsSector::CommunicationServices => COMMUNICATION_SERVICES,
            GicsSector::Utilities => UTILITIES,
            GicsSector::RealEstate => REAL_ESTATE,
        }
    }

    /// All members, grouped by sector in code order.
    pub fn symbols(&self) -> Vec<String> {
        GicsSector::ALL
            .into_iter()
            .flat_map(|sector| self.symbols_in_sector(sector))
            .collect()
    }

    /// Members of `sector` as owned strings.
    pub fn symbols_in_sector(&self, sector: GicsSector) -> Vec<String> {
        self.sector_members(sector)
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Sector of `symbol`.
    pub fn sector(&self, symbol: &str) -> Option<GicsSector> {
        GicsSector::ALL
            .into_iter()
            .find(|sector| self.sector_members(*sector).contains(&symbol))
    }

    /// Number of members per sector.
    pub fn sector_counts(&self) -> BTreeMap<GicsSector, usize> {
        GicsSector::ALL
            .into_iter()
            .map(|sector| (sector, self.sector_members(sector).len()))
            .collect()
    }
}
