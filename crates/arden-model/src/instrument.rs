//! Immutable instrument reference data.

use crate::sector::Sector;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Broad asset class of an instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetClass {
    /// Listed equity
    Equity,
    /// Bonds and other rate products
    FixedIncome,
    /// Commodity exposure
    Commodity,
    /// Cash and cash equivalents
    Cash,
    /// Anything else (private assets, hedge fund stakes, ...)
    Alternative,
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Equity => "Equity",
            Self::FixedIncome => "Fixed Income",
            Self::Commodity => "Commodity",
            Self::Cash => "Cash",
            Self::Alternative => "Alternative",
        };
        write!(f, "{name}")
    }
}

/// Immutable reference data for a tradable instrument.
///
/// `sector` is `None` for cash and other unclassified holdings; engines that
/// group by sector (stress testing, attribution) treat sector-less positions
/// via their own documented fallback rather than dropping them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    /// Unique ticker identifier
    pub ticker: String,
    /// Broad asset class
    pub asset_class: AssetClass,
    /// GICS sector, if classified
    pub sector: Option<Sector>,
}

impl Instrument {
    /// Create an equity instrument with a sector classification.
    pub const fn equity(ticker: String, sector: Sector) -> Self {
        Self {
            ticker,
            asset_class: AssetClass::Equity,
            sector: Some(sector),
        }
    }

    /// Create a cash instrument; cash carries no sector.
    pub const fn cash(ticker: String) -> Self {
        Self {
            ticker,
            asset_class: AssetClass::Cash,
            sector: None,
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.sector {
            Some(sector) => write!(f, "{} ({}, {})", self.ticker, self.asset_class, sector),
            None => write!(f, "{} ({})", self.ticker, self.asset_class),
        }
    }
}
