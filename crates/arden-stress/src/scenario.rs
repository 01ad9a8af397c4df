//! Stress scenarios: named maps from sector to percentage price shock.

use arden_model::Sector;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A named set of per-sector shocks with an optional scenario-wide default.
///
/// Predefined historical scenarios are immutable lookup entries built by
/// the constructors below; custom scenarios carry caller-supplied shock
/// maps. Shocks are fractional price moves: −0.40 means a 40% decline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressScenario {
    /// Scenario name, e.g. "2008 Financial Crisis"
    pub name: String,
    /// Explicit per-sector shocks
    pub shocks: HashMap<Sector, f64>,
    /// Fallback shock for sectors (and sector-less positions) with no
    /// explicit entry; `None` makes an unmapped sector an error
    pub default_shock: Option<f64>,
}

impl StressScenario {
    /// Build a custom scenario from a caller-supplied shock map.
    ///
    /// Passing `default_shock = Some(0.0)` leaves unmapped sectors
    /// untouched — the documented convention for partial shock maps.
    pub const fn custom(
        name: String,
        shocks: HashMap<Sector, f64>,
        default_shock: Option<f64>,
    ) -> Self {
        Self {
            name,
            shocks,
            default_shock,
        }
    }

    /// 2008 global financial crisis: broad −40% with financials and real
    /// estate at the epicenter hit hardest, staples and utilities defensive.
    pub fn financial_crisis_2008() -> Self {
        Self {
            name: "2008 Financial Crisis".to_string(),
            shocks: HashMap::from([
                (Sector::Financials, -0.55),
                (Sector::RealEstate, -0.48),
                (Sector::Industrials, -0.42),
                (Sector::Energy, -0.38),
                (Sector::ConsumerStaples, -0.22),
                (Sector::Utilities, -0.25),
            ]),
            default_shock: Some(-0.40),
        }
    }

    /// 2020 COVID crash: energy and travel-adjacent discretionary worst,
    /// technology comparatively resilient.
    pub fn covid_crash_2020() -> Self {
        Self {
            name: "2020 COVID Crash".to_string(),
            shocks: HashMap::from([
                (Sector::Energy, -0.55),
                (Sector::ConsumerDiscretionary, -0.40),
                (Sector::Financials, -0.40),
                (Sector::InformationTechnology, -0.25),
                (Sector::ConsumerStaples, -0.18),
                (Sector::HealthCare, -0.20),
            ]),
            default_shock: Some(-0.35),
        }
    }

    /// 1987 Black Monday: a broad one-day −20% across sectors.
    pub fn black_monday_1987() -> Self {
        Self {
            name: "1987 Black Monday".to_string(),
            shocks: HashMap::new(),
            default_shock: Some(-0.20),
        }
    }

    /// 2000 dot-com bust: technology and communications crushed, old
    /// economy comparatively spared.
    pub fn dotcom_bust_2000() -> Self {
        Self {
            name: "2000 Dot-Com Bust".to_string(),
            shocks: HashMap::from([
                (Sector::InformationTechnology, -0.65),
                (Sector::CommunicationServices, -0.55),
                (Sector::ConsumerStaples, -0.10),
                (Sector::Utilities, -0.08),
                (Sector::Energy, -0.12),
            ]),
            default_shock: Some(-0.45),
        }
    }

    /// Look up a predefined scenario by a lenient name key.
    ///
    /// Accepts the snake_case identifiers used in request payloads
    /// ("2008_financial_crisis") as well as the display names.
    pub fn by_name(name: &str) -> Option<Self> {
        let key: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "2008financialcrisis" | "financialcrisis2008" => Some(Self::financial_crisis_2008()),
            "2020covidcrash" | "covidcrash2020" => Some(Self::covid_crash_2020()),
            "1987blackmonday" | "blackmonday1987" => Some(Self::black_monday_1987()),
            "2000dotcombubble" | "2000dotcombust" | "dotcombust2000" => {
                Some(Self::dotcom_bust_2000())
            }
            _ => None,
        }
    }

    /// All predefined scenarios.
    pub fn catalog() -> Vec<Self> {
        vec![
            Self::financial_crisis_2008(),
            Self::covid_crash_2020(),
            Self::black_monday_1987(),
            Self::dotcom_bust_2000(),
        ]
    }

    /// Shock for a position's sector: explicit entry, then scenario
    /// default. `None` when the sector is unmapped and no default exists.
    pub fn shock_for(&self, sector: Option<Sector>) -> Option<f64> {
        match sector {
            Some(sector) => self.shocks.get(&sector).copied().or(self.default_shock),
            None => self.default_shock,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_by_name_resolves_request_identifiers() {
        assert!(StressScenario::by_name("2008_financial_crisis").is_some());
        assert!(StressScenario::by_name("2020 COVID Crash").is_some());
        assert!(StressScenario::by_name("1987_black_monday").is_some());
        assert!(StressScenario::by_name("2000_dotcom_bubble").is_some());
        assert!(StressScenario::by_name("flash_crash_2010").is_none());
    }

    #[test]
    fn test_shock_for_prefers_explicit_entry() {
        let scenario = StressScenario::financial_crisis_2008();
        assert_abs_diff_eq!(scenario.shock_for(Some(Sector::Financials)).unwrap(), -0.55);
        // Technology has no explicit entry, falls back to scenario default.
        assert_abs_diff_eq!(
            scenario.shock_for(Some(Sector::InformationTechnology)).unwrap(),
            -0.40
        );
        // Cash (no sector) also takes the default.
        assert_abs_diff_eq!(scenario.shock_for(None).unwrap(), -0.40);
    }

    #[test]
    fn test_custom_without_default_yields_none() {
        let scenario = StressScenario::custom(
            "tech only".to_string(),
            HashMap::from([(Sector::InformationTechnology, -0.30)]),
            None,
        );
        assert!(scenario.shock_for(Some(Sector::Energy)).is_none());
        assert!(scenario.shock_for(None).is_none());
    }

    #[test]
    fn test_catalog_has_four_scenarios() {
        assert_eq!(StressScenario::catalog().len(), 4);
    }
}
