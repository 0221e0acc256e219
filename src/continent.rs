//! Continent derivation for corrected country names.

use crate::countries::ReferenceData;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Continent {
    Africa,
    Antarctica,
    Asia,
    Europe,
    #[serde(rename = "North America")]
    NorthAmerica,
    Oceania,
    #[serde(rename = "South America")]
    SouthAmerica,
}

impl Continent {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "AF" => Some(Continent::Africa),
            "AN" => Some(Continent::Antarctica),
            "AS" => Some(Continent::Asia),
            "EU" => Some(Continent::Europe),
            "NA" => Some(Continent::NorthAmerica),
            "OC" => Some(Continent::Oceania),
            "SA" => Some(Continent::SouthAmerica),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Continent::Africa => "Africa",
            Continent::Antarctica => "Antarctica",
            Continent::Asia => "Asia",
            Continent::Europe => "Europe",
            Continent::NorthAmerica => "North America",
            Continent::Oceania => "Oceania",
            Continent::SouthAmerica => "South America",
        }
    }
}

impl fmt::Display for Continent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a country name has no continent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnmappedReason {
    /// The name is neither a reference country nor a known alias.
    UnknownCountry,
    /// The country code is known but carries no (valid) continent code.
    NoContinent { alpha2: String },
}

impl fmt::Display for UnmappedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnmappedReason::UnknownCountry => f.write_str("unknown country"),
            UnmappedReason::NoContinent { alpha2 } => {
                write!(f, "no continent for code {}", alpha2)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContinentLookup {
    Found(Continent),
    Unmapped(UnmappedReason),
}

impl ContinentLookup {
    pub fn continent(&self) -> Option<Continent> {
        match self {
            ContinentLookup::Found(c) => Some(*c),
            ContinentLookup::Unmapped(_) => None,
        }
    }
}

pub struct ContinentResolver<'a> {
    reference: &'a ReferenceData,
}

impl<'a> ContinentResolver<'a> {
    pub fn new(reference: &'a ReferenceData) -> Self {
        Self { reference }
    }

    /// name → alpha-2 → continent code → continent.
    pub fn resolve(&self, country: &str) -> ContinentLookup {
        let Some(alpha2) = self.reference.alpha2(country) else {
            return ContinentLookup::Unmapped(UnmappedReason::UnknownCountry);
        };
        match self
            .reference
            .continent_code(alpha2)
            .and_then(Continent::from_code)
        {
            Some(continent) => ContinentLookup::Found(continent),
            None => ContinentLookup::Unmapped(UnmappedReason::NoContinent {
                alpha2: alpha2.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code() {
        assert_eq!(Continent::from_code("eu"), Some(Continent::Europe));
        assert_eq!(Continent::from_code("NA"), Some(Continent::NorthAmerica));
        assert_eq!(Continent::from_code("XX"), None);
        assert_eq!(Continent::SouthAmerica.to_string(), "South America");
    }

    #[test]
    fn test_resolve_canonical_and_alias_names() {
        let reference = ReferenceData::embedded().unwrap();
        let resolver = ContinentResolver::new(&reference);
        assert_eq!(resolver.resolve("Japan"), ContinentLookup::Found(Continent::Asia));
        assert_eq!(resolver.resolve("Russia"), ContinentLookup::Found(Continent::Europe));
        assert_eq!(resolver.resolve("Brazil"), ContinentLookup::Found(Continent::SouthAmerica));
        assert_eq!(resolver.resolve("Côte d'Ivoire"), ContinentLookup::Found(Continent::Africa));
    }

    #[test]
    fn test_unknown_country_is_unmapped() {
        let reference = ReferenceData::embedded().unwrap();
        let resolver = ContinentResolver::new(&reference);
        assert_eq!(
            resolver.resolve("Kosovo"),
            ContinentLookup::Unmapped(UnmappedReason::UnknownCountry)
        );
        assert_eq!(resolver.resolve("").continent(), None);
    }

    #[test]
    fn test_code_without_continent_is_unmapped() {
        let reference = ReferenceData::embedded().unwrap();
        let resolver = ContinentResolver::new(&reference);
        assert_eq!(
            resolver.resolve("United States Minor Outlying Islands"),
            ContinentLookup::Unmapped(UnmappedReason::NoContinent {
                alpha2: "UM".to_string()
            })
        );
    }

    #[test]
    fn test_invalid_continent_code_is_unmapped() {
        let countries = "name,alpha2,continent\nAtlantis,AT,XX\n";
        let reference = ReferenceData::from_readers(countries.as_bytes(), None::<&[u8]>).unwrap();
        let resolver = ContinentResolver::new(&reference);
        assert!(matches!(
            resolver.resolve("Atlantis"),
            ContinentLookup::Unmapped(UnmappedReason::NoContinent { .. })
        ));
    }
}
