use crate::config::PipelineConfig;
use crate::continent::Continent;
use crate::pipeline::Resolved;
use crate::resolver::MatchOutcome;
use crate::types::{ContinentYearRow, CountryTotalRow, CountryYearRow, ResolvedRecord, SummaryStats};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

/// Corrected country of a record, unless it is null or a sentinel label.
fn reportable_country<'r>(r: &'r ResolvedRecord, config: &PipelineConfig) -> Option<&'r str> {
    r.country_corrected
        .as_deref()
        .filter(|c| !config.is_sentinel(c))
}

fn issued(r: &ResolvedRecord) -> f64 {
    r.number_of_issued.unwrap_or(0.0)
}

/// Visa applications per (year, continent); rows without a continent are
/// left out. Sorted by year, then continent.
pub fn yearly_by_continent(data: &[ResolvedRecord]) -> Vec<ContinentYearRow> {
    let mut map: BTreeMap<(i32, Continent), f64> = BTreeMap::new();
    for r in data {
        if let Some(continent) = r.continent {
            *map.entry((r.year, continent)).or_default() += issued(r);
        }
    }
    map.into_iter()
        .map(|((year, continent), applications)| ContinentYearRow {
            year,
            continent,
            applications,
        })
        .collect()
}

/// The `n` countries with the most applications in `year`, largest first.
/// Equal totals are ordered by country name.
pub fn top_countries_for_year(
    data: &[ResolvedRecord],
    year: i32,
    n: usize,
    config: &PipelineConfig,
) -> Vec<CountryTotalRow> {
    let mut map: HashMap<&str, f64> = HashMap::new();
    for r in data.iter().filter(|r| r.year == year) {
        if let Some(country) = reportable_country(r, config) {
            *map.entry(country).or_default() += issued(r);
        }
    }

    let mut totals: Vec<(&str, f64)> = map.into_iter().collect();
    totals.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });
    totals
        .into_iter()
        .take(n)
        .enumerate()
        .map(|(idx, (country, applications))| CountryTotalRow {
            rank: idx + 1,
            country: country.to_string(),
            applications,
        })
        .collect()
}

/// Applications per (year, country), sorted by year then country. Rows are
/// kept whether or not their continent resolved.
pub fn yearly_by_country(data: &[ResolvedRecord], config: &PipelineConfig) -> Vec<CountryYearRow> {
    let mut map: BTreeMap<(i32, &str), f64> = BTreeMap::new();
    for r in data {
        if let Some(country) = reportable_country(r, config) {
            *map.entry((r.year, country)).or_default() += issued(r);
        }
    }
    map.into_iter()
        .map(|((year, country), applications)| CountryYearRow {
            year,
            country: country.to_string(),
            applications,
        })
        .collect()
}

/// Label outcome counts and the year span. `total_issued` sums reportable
/// rows only, so a "total" row in the input is not counted twice.
pub fn generate_summary(resolved: &Resolved, config: &PipelineConfig) -> SummaryStats {
    let data = &resolved.records;
    let labels = resolved.labels.values();

    let mut stats = SummaryStats {
        generated_at: chrono::Utc::now().to_rfc3339(),
        total_rows: data.len(),
        distinct_labels: resolved.labels.len(),
        matched_labels: 0,
        overridden_labels: 0,
        unmatched_labels: 0,
        low_confidence_labels: 0,
        unmapped_continent_labels: 0,
        first_year: data.iter().map(|r| r.year).min(),
        last_year: data.iter().map(|r| r.year).max(),
        total_issued: data
            .iter()
            .filter(|r| reportable_country(r, config).is_some())
            .map(issued)
            .sum(),
    };

    for entry in labels {
        match entry.resolution.fuzzy.outcome {
            MatchOutcome::Matched => stats.matched_labels += 1,
            MatchOutcome::Unmatched => stats.unmatched_labels += 1,
            MatchOutcome::LowConfidence => {
                stats.unmatched_labels += 1;
                stats.low_confidence_labels += 1;
            }
        }
        if entry.resolution.override_applied {
            stats.overridden_labels += 1;
        }
        if entry.continent.continent().is_none() {
            stats.unmapped_continent_labels += 1;
        }
    }
    stats
}
