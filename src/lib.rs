//! Visa issuance cleaning: country name resolution, continent derivation and
//! chart-ready aggregates.

pub mod config;
pub mod continent;
pub mod countries;
pub mod error;
pub mod fuzzy;
pub mod loader;
pub mod output;
pub mod pipeline;
pub mod reports;
pub mod resolver;
pub mod schema;
pub mod types;
pub mod util;

pub use config::PipelineConfig;
pub use continent::{Continent, ContinentLookup, ContinentResolver, UnmappedReason};
pub use countries::ReferenceData;
pub use error::{PipelineError, Result};
pub use pipeline::{Pipeline, Resolved};
pub use resolver::{CountryResolver, MatchOutcome, Resolution};

/// Reference data named by the configuration, or the embedded table.
pub fn load_reference(config: &PipelineConfig) -> Result<ReferenceData> {
    match &config.reference_countries {
        Some(path) => ReferenceData::from_paths(path, config.reference_aliases.as_deref()),
        None => ReferenceData::embedded(),
    }
}
