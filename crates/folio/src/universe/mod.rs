//! Instrument universes and universe selection.

pub mod gics;
pub mod sp500;

pub use gics::GicsSector;
pub use sp500::SP500Universe;

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};

/// Name of the full S&P 500 universe.
pub const SP500: &str = "sp500";

/// A named set of instruments.
pub trait Universe {
    /// Member symbols.
    fn symbols(&self) -> Vec<String>;

    /// Whether `symbol` is a member.
    fn contains(&self, symbol: &str) -> bool {
        self.symbols().iter().any(|s| s == symbol)
    }

    /// Number of members.
    fn size(&self) -> usize {
        self.symbols().len()
    }
}

impl Universe for SP500Universe {
    fn symbols(&self) -> Vec<String> {
        Self::symbols(self)
    }
}

/// One S&P 500 sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectorUniverse(pub GicsSector);

impl Universe for SectorUniverse {
    fn symbols(&self) -> Vec<String> {
        SP500Universe.symbols_in_sector(self.0)
    }
}

/// Look up a universe by name.
///
/// Accepts `sp500`, `sp500-<sector>` and bare sector names or aliases
/// (`tech`, `energy`, `45`, ...). Case and separators are ignored.
pub fn by_name(name: &str) -> Option<Box<dyn Universe>> {
    let lowered = name.trim().to_lowercase();
    let compact: String = lowered
        .chars()
        .filter(|c| !matches!(c, ' ' | '_' | '&'))
        .collect();

    if compact == SP500 || compact == "sp500-all" {
        return Some(Box::new(SP500Universe));
    }

    let sector = compact
        .strip_prefix("sp500-")
        .unwrap_or(&compact)
        .parse::<GicsSector>()
        .ok()?;
    Some(Box::new(SectorUniverse(sector)))
}

/// Names accepted by [`by_name`], one per universe.
pub fn available_universes() -> Vec<String> {
    std::iter::once(SP500.to_string())
        .chain(
            GicsSector::ALL
                .iter()
                .map(|s| format!("{SP500}-{}", s.slug())),
        )
        .collect()
}

/// The instruments a returns preparation should cover: an explicit list,
/// or else a universe name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniverseSelection {
    /// Explicit instrument identifiers; take precedence over `universe`.
    pub symbols: Option<Vec<String>>,
    /// Universe name resolved with [`by_name`].
    pub universe: Option<String>,
}

impl UniverseSelection {
    /// Select explicit instruments.
    pub fn symbols<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            symbols: Some(symbols.into_iter().map(Into::into).collect()),
            universe: None,
        }
    }

    /// Select a named universe.
    pub fn universe(name: impl Into<String>) -> Self {
        Self {
            symbols: None,
            universe: Some(name.into()),
        }
    }

    /// Resolve to a list of unique, upper-cased symbols in request order.
    pub fn resolve(&self) -> Result<Vec<String>> {
        let raw = match (&self.symbols, &self.universe) {
            (Some(symbols), _) if !symbols.is_empty() => symbols.clone(),
            (_, Some(name)) => by_name(name)
                .ok_or_else(|| PipelineError::Config(format!("Unknown universe: {name}")))?
                .symbols(),
            _ => {
                return Err(PipelineError::Config(
                    "Either an instrument list or a universe name is required".to_string(),
                ));
            }
        };

        let mut resolved: Vec<String> = Vec::with_capacity(raw.len());
        for symbol in raw {
            let symbol = symbol.trim().to_uppercase();
            if symbol.is_empty() {
                return Err(PipelineError::Config("Empty instrument identifier".to_string()));
            }
            if !resolved.contains(&symbol) {
                resolved.push(symbol);
            }
        }
        Ok(resolved)
    }
}
