//! GICS (Global Industry Classification Standard) sector definitions.
//!
//! Sectors drive the stress-test shock lookup and the Brinson-Fachler
//! attribution grouping, so the enum doubles as a parse target for
//! caller-supplied shock maps and holdings files.

use serde::{Deserialize, Serialize};
use std::fmt;

/// GICS Level 1 sectors (11 sectors).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sector {
    /// Information Technology
    InformationTechnology,

    /// Health Care
    HealthCare,

    /// Financials
    Financials,

    /// Consumer Discretionary
    ConsumerDiscretionary,

    /// Communication Services
    CommunicationServices,

    /// Industrials
    Industrials,

    /// Consumer Staples
    ConsumerStaples,

    /// Energy
    Energy,

    /// Utilities
    Utilities,

    /// Real Estate
    RealEstate,

    /// Materials
    Materials,
}

impl Sector {
    /// Returns all GICS sectors.
    pub fn all() -> Vec<Self> {
        vec![
            Self::InformationTechnology,
            Self::HealthCare,
            Self::Financials,
            Self::ConsumerDiscretionary,
            Self::CommunicationServices,
            Self::Industrials,
            Self::ConsumerStaples,
            Self::Energy,
            Self::Utilities,
            Self::RealEstate,
            Self::Materials,
        ]
    }

    /// Returns the 2-digit GICS sector code.
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

    /// Returns the full sector name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::InformationTechnology => "Information Technology",
            Self::HealthCare => "Health Care",
            Self::Financials => "Financials",
            Self::ConsumerDiscretionary => "Consumer Discretionary",
            Self::CommunicationServices => "Communication Services",
            Self::Industrials => "Industrials",
            Self::ConsumerStaples => "Consumer Staples",
            Self::Energy => "Energy",
            Self::Utilities => "Utilities",
            Self::RealEstate => "Real Estate",
            Self::Materials => "Materials",
        }
    }

    /// Parse a sector from its 2-digit code.
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            10 => Some(Self::Energy),
            15 => Some(Self::Materials),
            20 => Some(Self::Industrials),
            25 => Some(Self::ConsumerDiscretionary),
            30 => Some(Self::ConsumerStaples),
            35 => Some(Self::HealthCare),
            40 => Some(Self::Financials),
            45 => Some(Self::InformationTechnology),
            50 => Some(Self::CommunicationServices),
            55 => Some(Self::Utilities),
            60 => Some(Self::RealEstate),
            _ => None,
        }
    }

    /// Parse a sector from a display name, case- and whitespace-insensitive.
    ///
    /// Accepts both spaced names ("Health Care") and compact variants
    /// ("healthcare", "information_technology") since shock maps arrive from
    /// callers with no fixed casing convention.
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match normalized.as_str() {
            "informationtechnology" | "technology" | "tech" => Some(Self::InformationTechnology),
            "healthcare" => Some(Self::HealthCare),
            "financials" | "financial" => Some(Self::Financials),
            "consumerdiscretionary" => Some(Self::ConsumerDiscretionary),
            "communicationservices" | "communications" => Some(Self::CommunicationServices),
            "industrials" | "industrial" => Some(Self::Industrials),
            "consumerstaples" => Some(Self::ConsumerStaples),
            "energy" => Some(Self::Energy),
            "utilities" => Some(Self::Utilities),
            "realestate" => Some(Self::RealEstate),
            "materials" => Some(Self::Materials),
            _ => None,
        }
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
