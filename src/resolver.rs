//! Country name resolution: fuzzy match against the reference set, then an
//! exact-string override pass on the matched value.
//!
//! The two stages are kept as separate functions and always run in that
//! order, once each, so the override table stays auditable on its own.

use crate::config::PipelineConfig;
use crate::countries::ReferenceData;
use crate::fuzzy;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchOutcome {
    /// Best score reached the threshold; the label was replaced.
    Matched,
    /// Best score below threshold; the label was kept as-is.
    Unmatched,
    /// Unmatched and far below threshold, needs human review.
    LowConfidence,
}

impl fmt::Display for MatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MatchOutcome::Matched => "matched",
            MatchOutcome::Unmatched => "unmatched",
            MatchOutcome::LowConfidence => "low confidence",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuzzyMatch {
    /// Highest scoring reference name, if the reference set is non-empty.
    pub candidate: Option<String>,
    pub score: u8,
    pub outcome: MatchOutcome,
    /// The candidate when matched, otherwise the original label.
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub input: String,
    pub fuzzy: FuzzyMatch,
    pub override_applied: bool,
    pub corrected: String,
}

pub struct CountryResolver<'a> {
    reference: &'a ReferenceData,
    overrides: &'a BTreeMap<String, String>,
    threshold: u8,
    review_margin: u8,
}

impl<'a> CountryResolver<'a> {
    pub fn new(reference: &'a ReferenceData, config: &'a PipelineConfig) -> Self {
        Self {
            reference,
            overrides: &config.overrides,
            threshold: config.threshold,
            review_margin: config.review_margin,
        }
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Score `label` against every reference name and keep the best one.
    /// Ties go to the name that comes first in reference order.
    pub fn fuzzy_match(&self, label: &str) -> FuzzyMatch {
        let mut best: Option<(&str, u8)> = None;
        for name in self.reference.names() {
            let score = fuzzy::score(label, name);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((name.as_str(), score));
                if score == 100 {
                    break;
                }
            }
        }

        let score = best.map_or(0, |(_, s)| s);
        let (outcome, value) = match best {
            Some((name, s)) if s >= self.threshold => (MatchOutcome::Matched, name.to_string()),
            _ if score < self.threshold.saturating_sub(self.review_margin) => {
                (MatchOutcome::LowConfidence, label.to_string())
            }
            _ => (MatchOutcome::Unmatched, label.to_string()),
        };

        FuzzyMatch {
            candidate: best.map(|(name, _)| name.to_string()),
            score,
            outcome,
            value,
        }
    }

    /// Exact-string substitution from the override table.
    pub fn apply_override(&self, name: &str) -> (String, bool) {
        match self.overrides.get(name) {
            Some(corrected) => (corrected.clone(), true),
            None => (name.to_string(), false),
        }
    }

    pub fn resolve(&self, label: &str) -> Resolution {
        let fuzzy = self.fuzzy_match(label);
        let (corrected, override_applied) = self.apply_override(&fuzzy.value);
        debug!(
            label,
            candidate = fuzzy.candidate.as_deref().unwrap_or(""),
            score = fuzzy.score,
            outcome = %fuzzy.outcome,
            override_applied,
            corrected = %corrected,
            "resolved country label"
        );
        Resolution {
            input: label.to_string(),
            fuzzy,
            override_applied,
            corrected,
        }
    }

    /// Override keys the fuzzy stage rewrites to something else, paired with
    /// what it produces. Such entries can never fire.
    pub fn dead_overrides(&self) -> Vec<(String, String)> {
        self.overrides
            .keys()
            .filter_map(|key| {
                let m = self.fuzzy_match(key);
                (m.value != *key).then(|| (key.clone(), m.value))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_reference(names: &[&str]) -> ReferenceData {
        let mut csv = String::from("name,alpha2,continent\n");
        for (i, n) in names.iter().enumerate() {
            let code: String = [b'A' + (i / 26) as u8, b'A' + (i % 26) as u8]
                .iter()
                .map(|b| *b as char)
                .collect();
            csv.push_str(&format!("\"{}\",{},EU\n", n, code));
        }
        ReferenceData::from_readers(csv.as_bytes(), None::<&[u8]>).unwrap()
    }

    #[test]
    fn test_canonical_name_is_unchanged() {
        let reference = ReferenceData::embedded().unwrap();
        let config = PipelineConfig::default();
        let resolver = CountryResolver::new(&reference, &config);
        for name in ["Japan", "China", "Viet Nam", "Côte d'Ivoire", "Korea, Republic of"] {
            let r = resolver.resolve(name);
            assert_eq!(r.corrected, name);
            assert_eq!(r.fuzzy.score, 100);
            assert_eq!(r.fuzzy.outcome, MatchOutcome::Matched);
        }
    }

    #[test]
    fn test_misspelling_is_corrected() {
        let reference = ReferenceData::embedded().unwrap();
        let config = PipelineConfig::default();
        let resolver = CountryResolver::new(&reference, &config);
        let r = resolver.resolve("Philipines");
        assert_eq!(r.corrected, "Philippines");
        assert_eq!(r.fuzzy.score, 91);
        assert!(!r.override_applied);
    }

    #[test]
    fn test_every_default_override_fires() {
        let reference = ReferenceData::embedded().unwrap();
        let config = PipelineConfig::default();
        let resolver = CountryResolver::new(&reference, &config);
        for (label, expected) in config.overrides.iter() {
            let r = resolver.resolve(label);
            assert_eq!(&r.corrected, expected, "label {}", label);
            assert!(r.override_applied);
            assert_ne!(r.fuzzy.outcome, MatchOutcome::Matched);
        }
        assert!(resolver.dead_overrides().is_empty());
    }

    #[test]
    fn test_override_applies_to_fuzzy_result_not_raw_label() {
        let reference = ReferenceData::embedded().unwrap();
        let mut config = PipelineConfig::default();
        config
            .overrides
            .insert("Russian Federation".to_string(), "Russia".to_string());
        config
            .overrides
            .insert("Philipines".to_string(), "Nowhere".to_string());
        let resolver = CountryResolver::new(&reference, &config);

        assert_eq!(resolver.resolve("Russia").corrected, "Russia");
        assert_eq!(resolver.resolve("Russian Federation").corrected, "Russia");
        // Fuzzy rewrites the raw label first, so this entry never fires.
        assert_eq!(resolver.resolve("Philipines").corrected, "Philippines");
        assert_eq!(
            resolver.dead_overrides(),
            vec![("Philipines".to_string(), "Philippines".to_string())]
        );
    }

    #[test]
    fn test_threshold_boundary() {
        let reference = small_reference(&["Abcdefghij"]);
        let mut config = PipelineConfig::default();

        config.threshold = 90;
        let resolver = CountryResolver::new(&reference, &config);
        let r = resolver.resolve("Abcdefghix");
        assert_eq!(r.fuzzy.score, 90);
        assert_eq!(r.corrected, "Abcdefghij");

        config.threshold = 91;
        let resolver = CountryResolver::new(&reference, &config);
        let r = resolver.resolve("Abcdefghix");
        assert_eq!(r.fuzzy.outcome, MatchOutcome::Unmatched);
        assert_eq!(r.corrected, "Abcdefghix");
    }

    #[test]
    fn test_ties_keep_reference_order() {
        let reference = small_reference(&["Abcdefghik", "Abcdefghij"]);
        let config = PipelineConfig::default();
        let resolver = CountryResolver::new(&reference, &config);
        let m = resolver.fuzzy_match("Abcdefghix");
        assert_eq!(m.candidate.as_deref(), Some("Abcdefghik"));
    }

    #[test]
    fn test_empty_and_whitespace_labels() {
        let reference = ReferenceData::embedded().unwrap();
        let config = PipelineConfig::default();
        let resolver = CountryResolver::new(&reference, &config);
        for label in ["", "   "] {
            let r = resolver.resolve(label);
            assert_eq!(r.corrected, label);
            assert_eq!(r.fuzzy.score, 0);
            assert_eq!(r.fuzzy.outcome, MatchOutcome::LowConfidence);
        }
    }

    #[test]
    fn test_low_confidence_flag() {
        let reference = ReferenceData::embedded().unwrap();
        let config = PipelineConfig::default();
        let resolver = CountryResolver::new(&reference, &config);
        // Best candidate scores 45, below 85 - 30.
        assert_eq!(resolver.fuzzy_match("Kosovo").outcome, MatchOutcome::LowConfidence);
        // Best candidate scores 80, unmatched but close.
        assert_eq!(resolver.fuzzy_match("Benan").outcome, MatchOutcome::Unmatched);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let reference = ReferenceData::embedded().unwrap();
        let config = PipelineConfig::default();
        let resolver = CountryResolver::new(&reference, &config);
        for label in ["Untied States", "Andra", "Korea", "others"] {
            assert_eq!(resolver.resolve(label), resolver.resolve(label));
        }
    }
}
