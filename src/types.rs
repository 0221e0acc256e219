use crate::continent::Continent;
use crate::util::format_number;
use serde::Serialize;
use tabled::Tabled;

/// A typed input row, produced by the loader after header normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub year: i32,
    pub country: Option<String>,
    pub number_of_issued: Option<f64>,
}

/// A raw record enriched with its corrected country name and continent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedRecord {
    pub year: i32,
    pub country: Option<String>,
    pub number_of_issued: Option<f64>,
    pub country_corrected: Option<String>,
    pub continent: Option<Continent>,
}

fn display_applications(v: &f64) -> String {
    format_number(*v, 0)
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct ContinentYearRow {
    #[tabled(rename = "Year")]
    pub year: i32,
    #[tabled(rename = "Continent")]
    pub continent: Continent,
    #[tabled(rename = "Applications", display_with = "display_applications")]
    pub applications: f64,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct CountryTotalRow {
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[tabled(rename = "Country")]
    pub country: String,
    #[tabled(rename = "Applications", display_with = "display_applications")]
    pub applications: f64,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct CountryYearRow {
    #[tabled(rename = "Year")]
    pub year: i32,
    #[tabled(rename = "Country")]
    pub country: String,
    #[tabled(rename = "Applications", display_with = "display_applications")]
    pub applications: f64,
}

/// One line of the country resolution audit: how a distinct raw label was
/// resolved and how many rows carried it.
#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct AuditRow {
    #[tabled(rename = "Label")]
    pub raw_label: String,
    #[tabled(rename = "BestCandidate")]
    pub best_candidate: String,
    #[tabled(rename = "Score")]
    pub score: u8,
    #[tabled(rename = "Outcome")]
    pub outcome: String,
    #[tabled(rename = "Override")]
    pub override_applied: bool,
    #[tabled(rename = "Corrected")]
    pub corrected: String,
    #[tabled(rename = "Continent")]
    pub continent: String,
    #[tabled(rename = "Rows")]
    pub rows: usize,
}

#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub generated_at: String,
    pub total_rows: usize,
    pub distinct_labels: usize,
    pub matched_labels: usize,
    pub overridden_labels: usize,
    pub unmatched_labels: usize,
    pub low_confidence_labels: usize,
    pub unmapped_continent_labels: usize,
    pub first_year: Option<i32>,
    pub last_year: Option<i32>,
    pub total_issued: f64,
}
