//! Reference country data: the canonical name list, name → alpha-2 codes
//! (including common aliases) and alpha-2 → continent codes.
//!
//! The data is loaded once per run and is read-only afterwards, so a single
//! `ReferenceData` can be shared by reference across resolver threads.

use crate::error::{PipelineError, Result};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;
use tracing::info;

const EMBEDDED_COUNTRIES: &str = include_str!("../data/countries.csv");
const EMBEDDED_ALIASES: &str = include_str!("../data/country_aliases.csv");

#[derive(Debug, Deserialize)]
struct CountryEntry {
    name: String,
    alpha2: String,
    continent: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AliasEntry {
    alias: String,
    alpha2: String,
}

#[derive(Debug, Clone)]
pub struct ReferenceData {
    names: Vec<String>,
    name_to_alpha2: HashMap<String, String>,
    alpha2_to_continent: HashMap<String, String>,
}

fn lookup_key(name: &str) -> String {
    name.trim().to_lowercase()
}

fn reference_err(source: &str, e: impl std::fmt::Display) -> PipelineError {
    PipelineError::ReferenceData(format!("{}: {}", source, e))
}

impl ReferenceData {
    /// The ISO 3166-1 table compiled into the binary.
    pub fn embedded() -> Result<Self> {
        Self::from_readers(EMBEDDED_COUNTRIES.as_bytes(), Some(EMBEDDED_ALIASES.as_bytes()))
    }

    /// Load a country table (`name,alpha2,continent`) and an optional alias
    /// table (`alias,alpha2`) from disk.
    pub fn from_paths(countries: &Path, aliases: Option<&Path>) -> Result<Self> {
        let countries_file = std::fs::File::open(countries)
            .map_err(|e| reference_err(&countries.display().to_string(), e))?;
        let data = match aliases {
            Some(path) => {
                let aliases_file = std::fs::File::open(path)
                    .map_err(|e| reference_err(&path.display().to_string(), e))?;
                Self::from_readers(countries_file, Some(aliases_file))?
            }
            None => Self::from_readers(countries_file, None::<std::fs::File>)?,
        };
        info!(
            path = %countries.display(),
            countries = data.len(),
            "loaded external reference data"
        );
        Ok(data)
    }

    pub fn from_readers<C: Read, A: Read>(countries: C, aliases: Option<A>) -> Result<Self> {
        let mut names = Vec::new();
        let mut name_to_alpha2 = HashMap::new();
        let mut alpha2_to_continent = HashMap::new();
        let mut known_codes = HashSet::new();

        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(countries);
        for result in rdr.deserialize::<CountryEntry>() {
            let entry = result.map_err(|e| reference_err("country table", e))?;
            let code = entry.alpha2.to_uppercase();
            if entry.name.is_empty() || code.len() != 2 {
                return Err(reference_err(
                    "country table",
                    format!("invalid entry '{}' / '{}'", entry.name, entry.alpha2),
                ));
            }
            if name_to_alpha2.insert(lookup_key(&entry.name), code.clone()).is_some() {
                return Err(reference_err(
                    "country table",
                    format!("duplicate country name '{}'", entry.name),
                ));
            }
            if let Some(continent) = entry.continent.filter(|c| !c.is_empty()) {
                alpha2_to_continent.insert(code.clone(), continent.to_uppercase());
            }
            known_codes.insert(code);
            names.push(entry.name);
        }

        if names.is_empty() {
            return Err(reference_err("country table", "no countries loaded"));
        }

        if let Some(aliases) = aliases {
            let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(aliases);
            for result in rdr.deserialize::<AliasEntry>() {
                let entry = result.map_err(|e| reference_err("alias table", e))?;
                let code = entry.alpha2.to_uppercase();
                if !known_codes.contains(&code) {
                    return Err(reference_err(
                        "alias table",
                        format!("alias '{}' points at unknown code '{}'", entry.alias, code),
                    ));
                }
                // Official names win over aliases.
                name_to_alpha2.entry(lookup_key(&entry.alias)).or_insert(code);
            }
        }

        Ok(Self {
            names,
            name_to_alpha2,
            alpha2_to_continent,
        })
    }

    /// Canonical country names in reference order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Alpha-2 code for a canonical name or known alias, case-insensitive.
    pub fn alpha2(&self, name: &str) -> Option<&str> {
        self.name_to_alpha2.get(&lookup_key(name)).map(String::as_str)
    }

    pub fn continent_code(&self, alpha2: &str) -> Option<&str> {
        self.alpha2_to_continent
            .get(&alpha2.to_uppercase())
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_table_loads() {
        let data = ReferenceData::embedded().unwrap();
        assert_eq!(data.len(), 249);
        assert!(data.contains("Japan"));
        assert!(data.contains("Côte d'Ivoire"));
        assert_eq!(data.names()[0], "Aruba");
    }

    #[test]
    fn test_alpha2_lookup_uses_names_and_aliases() {
        let data = ReferenceData::embedded().unwrap();
        assert_eq!(data.alpha2("Russian Federation"), Some("RU"));
        assert_eq!(data.alpha2("russia"), Some("RU"));
        assert_eq!(data.alpha2("  Moldova "), Some("MD"));
        assert_eq!(data.alpha2("Kosovo"), None);
    }

    #[test]
    fn test_continent_codes() {
        let data = ReferenceData::embedded().unwrap();
        assert_eq!(data.continent_code("RU"), Some("EU"));
        assert_eq!(data.continent_code("jp"), Some("AS"));
        assert_eq!(data.continent_code("UM"), None);
    }

    #[test]
    fn test_empty_table_is_fatal() {
        let err = ReferenceData::from_readers("name,alpha2,continent\n".as_bytes(), None::<&[u8]>)
            .unwrap_err();
        assert!(matches!(err, PipelineError::ReferenceData(_)));
    }

    #[test]
    fn test_alias_to_unknown_code_is_fatal() {
        let countries = "name,alpha2,continent\nJapan,JP,AS\n";
        let aliases = "alias,alpha2\nNippon,XX\n";
        let err = ReferenceData::from_readers(countries.as_bytes(), Some(aliases.as_bytes()))
            .unwrap_err();
        assert!(matches!(err, PipelineError::ReferenceData(_)));
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let err = ReferenceData::from_paths(Path::new("/nonexistent/countries.csv"), None)
            .unwrap_err();
        assert!(matches!(err, PipelineError::ReferenceData(_)));
    }
}
