//! Applies country and continent resolution to every loaded record.
//!
//! Resolution depends only on the label and the read-only reference data,
//! so it runs once per distinct label, in parallel, and the results are
//! joined back onto the rows.

use crate::config::PipelineConfig;
use crate::continent::{ContinentLookup, ContinentResolver};
use crate::countries::ReferenceData;
use crate::resolver::{CountryResolver, MatchOutcome, Resolution};
use crate::types::{AuditRow, RawRecord, ResolvedRecord};
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct LabelResolution {
    pub resolution: Resolution,
    pub continent: ContinentLookup,
    pub rows: usize,
    /// Aggregate row such as "total"; never a country.
    pub sentinel: bool,
}

impl LabelResolution {
    fn left_unmatched(&self) -> bool {
        self.resolution.fuzzy.outcome != MatchOutcome::Matched && !self.resolution.override_applied
    }

    pub fn needs_review(&self) -> bool {
        !self.sentinel
            && (self.left_unmatched() || matches!(self.continent, ContinentLookup::Unmapped(_)))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Resolved {
    pub records: Vec<ResolvedRecord>,
    /// Keyed by the raw label.
    pub labels: BTreeMap<String, LabelResolution>,
}

pub struct Pipeline<'a> {
    config: &'a PipelineConfig,
    countries: CountryResolver<'a>,
    continents: ContinentResolver<'a>,
}

impl<'a> Pipeline<'a> {
    pub fn new(reference: &'a ReferenceData, config: &'a PipelineConfig) -> Self {
        let countries = CountryResolver::new(reference, config);
        for (key, produced) in countries.dead_overrides() {
            warn!(
                label = %key,
                fuzzy_result = %produced,
                "override entry can never fire: the fuzzy matcher rewrites its label first"
            );
        }
        Self {
            config,
            countries,
            continents: ContinentResolver::new(reference),
        }
    }

    pub fn resolve_label(&self, label: &str) -> (Resolution, ContinentLookup) {
        let resolution = self.countries.resolve(label);
        let continent = self.continents.resolve(&resolution.corrected);
        (resolution, continent)
    }

    pub fn run(&self, records: &[RawRecord]) -> Resolved {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for r in records {
            if let Some(country) = r.country.as_deref() {
                *counts.entry(country).or_default() += 1;
            }
        }

        let distinct: Vec<(&str, usize)> = counts.into_iter().collect();
        let resolved: Vec<(String, LabelResolution)> = distinct
            .par_iter()
            .map(|(label, rows)| {
                let (resolution, continent) = self.resolve_label(label);
                (
                    label.to_string(),
                    LabelResolution {
                        resolution,
                        continent,
                        rows: *rows,
                        sentinel: self.config.is_sentinel(label),
                    },
                )
            })
            .collect();
        let labels: BTreeMap<String, LabelResolution> = resolved.into_iter().collect();

        let records = records
            .iter()
            .map(|r| {
                let entry = r.country.as_deref().and_then(|c| labels.get(c));
                ResolvedRecord {
                    year: r.year,
                    country: r.country.clone(),
                    number_of_issued: r.number_of_issued,
                    country_corrected: entry.map(|e| e.resolution.corrected.clone()),
                    continent: entry.and_then(|e| e.continent.continent()),
                }
            })
            .collect();

        let out = Resolved { records, labels };
        out.log_findings();
        out
    }
}

impl Resolved {
    fn log_findings(&self) {
        let mut flagged = 0usize;
        for (label, entry) in &self.labels {
            if !entry.needs_review() {
                continue;
            }
            flagged += 1;
            if let ContinentLookup::Unmapped(reason) = &entry.continent {
                warn!(
                    label = %label,
                    corrected = %entry.resolution.corrected,
                    reason = %reason,
                    rows = entry.rows,
                    "no continent for resolved country"
                );
            }
            if entry.left_unmatched() {
                warn!(
                    label = %label,
                    best_candidate = entry.resolution.fuzzy.candidate.as_deref().unwrap_or(""),
                    score = entry.resolution.fuzzy.score,
                    outcome = %entry.resolution.fuzzy.outcome,
                    rows = entry.rows,
                    "country label left unmatched"
                );
            }
        }
        info!(
            records = self.records.len(),
            labels = self.labels.len(),
            flagged,
            "country resolution finished"
        );
    }

    /// One audit line per distinct raw label, in label order.
    pub fn audit_rows(&self) -> Vec<AuditRow> {
        self.labels
            .iter()
            .map(|(label, entry)| {
                let fuzzy = &entry.resolution.fuzzy;
                let continent = match &entry.continent {
                    ContinentLookup::Found(c) => c.to_string(),
                    ContinentLookup::Unmapped(reason) => format!("({})", reason),
                };
                AuditRow {
                    raw_label: label.clone(),
                    best_candidate: fuzzy.candidate.clone().unwrap_or_default(),
                    score: fuzzy.score,
                    outcome: fuzzy.outcome.to_string(),
                    override_applied: entry.resolution.override_applied,
                    corrected: entry.resolution.corrected.clone(),
                    continent,
                    rows: entry.rows,
                }
            })
            .collect()
    }

    /// Audit lines that need a human look: unmatched without an override, or
    /// without a continent. Sentinel labels stay in the audit but not here.
    pub fn review_rows(&self) -> Vec<AuditRow> {
        self.audit_rows()
            .into_iter()
            .filter(|row| {
                self.labels
                    .get(&row.raw_label)
                    .map_or(false, LabelResolution::needs_review)
            })
            .collect()
    }
}
