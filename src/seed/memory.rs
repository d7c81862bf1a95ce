use super::{EstimateMap, QueryMode, SearchCriteria, SeedSource, SourceError};
use crate::core_types::{MatchType, StatsEstimate};
use std::collections::{BTreeMap, BTreeSet};

/// A fixed table of keyword ideas and estimates.
///
/// Rows without a match type apply to every match type; a row for a specific
/// match type takes precedence. Idea queries relate keywords that share at
/// least one (case-insensitive) word with a seed.
#[derive(Debug, Clone, Default)]
pub struct MemorySeedSource {
    rows: BTreeMap<(String, Option<MatchType>), StatsEstimate>,
}

impl MemorySeedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a row. A second row for the same key is treated as the other end
    /// of an estimate range and the two are averaged.
    pub fn insert(
        &mut self,
        text: impl Into<String>,
        match_type: Option<MatchType>,
        estimate: StatsEstimate,
    ) {
        let key = (text.into(), match_type);
        let merged = match self.rows.get(&key) {
            Some(existing) => StatsEstimate::mean(existing, &estimate),
            None => estimate,
        };
        self.rows.insert(key, merged);
    }

    pub fn with(
        mut self,
        text: impl Into<String>,
        match_type: Option<MatchType>,
        estimate: StatsEstimate,
    ) -> Self {
        self.insert(text, match_type, estimate);
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn lookup(&self, text: &str, match_type: MatchType) -> Option<StatsEstimate> {
        self.rows
            .get(&(text.to_string(), Some(match_type)))
            .or_else(|| self.rows.get(&(text.to_string(), None)))
            .copied()
    }

    fn texts_for(&self, match_type: MatchType) -> BTreeSet<&str> {
        self.rows
            .keys()
            .filter(|(_, mt)| mt.is_none() || *mt == Some(match_type))
            .map(|(text, _)| text.as_str())
            .collect()
    }
}

fn words(text: &str) -> BTreeSet<String> {
    text.split_whitespace().map(|w| w.to_lowercase()).collect()
}

impl SeedSource for MemorySeedSource {
    fn fetch_estimates(&self, criteria: &SearchCriteria<'_>) -> Result<EstimateMap, SourceError> {
        let mt = criteria.match_type;
        let mut out = EstimateMap::new();

        match criteria.mode {
            QueryMode::Estimates => {
                for text in &criteria.seeds {
                    let estimate = self.lookup(text, mt).unwrap_or_default();
                    out.insert(text.clone(), estimate);
                }
            }
            QueryMode::Ideas => {
                let seed_words: BTreeSet<String> =
                    criteria.seeds.iter().flat_map(|s| words(s)).collect();
                for text in self.texts_for(mt) {
                    let related = seed_words.is_empty()
                        || words(text).iter().any(|w| seed_words.contains(w));
                    if related {
                        if let Some(estimate) = self.lookup(text, mt) {
                            out.insert(text.to_string(), estimate);
                        }
                    }
                }
            }
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::campaign::CampaignConfiguration;

    fn est(impressions: f64) -> StatsEstimate {
        StatsEstimate {
            impressions_per_day: Some(impressions),
            ..Default::default()
        }
    }

    fn source() -> MemorySeedSource {
        MemorySeedSource::new()
            .with("running shoes", None, est(100.0))
            .with("running shoes", Some(MatchType::Exact), est(40.0))
            .with("trail shoes", None, est(60.0))
            .with("garden hose", None, est(10.0))
            .with("exact only", Some(MatchType::Exact), est(5.0))
    }

    #[test]
    fn test_ideas_without_seeds_returns_all_for_match_type() {
        let campaign = CampaignConfiguration::default();
        let broad = source()
            .fetch_estimates(&SearchCriteria::ideas(MatchType::Broad, &campaign))
            .unwrap();
        assert_eq!(broad.len(), 3);
        assert!(!broad.contains_key("exact only"));

        let exact = source()
            .fetch_estimates(&SearchCriteria::ideas(MatchType::Exact, &campaign))
            .unwrap();
        assert_eq!(exact.len(), 4);
        assert_eq!(exact["running shoes"].impressions_per_day, Some(40.0));
    }

    #[test]
    fn test_ideas_relate_by_shared_word() {
        let campaign = CampaignConfiguration::default();
        let criteria = SearchCriteria::ideas(MatchType::Broad, &campaign)
            .with_seeds(["Shoes".to_string()]);
        let ideas = source().fetch_estimates(&criteria).unwrap();
        let texts: Vec<&str> = ideas.keys().map(|s| s.as_str()).collect();
        assert_eq!(texts, vec!["running shoes", "trail shoes"]);
    }

    #[test]
    fn test_estimates_for_unknown_text_are_empty() {
        let campaign = CampaignConfiguration::default();
        let criteria = SearchCriteria::estimates(
            MatchType::Phrase,
            &campaign,
            ["garden hose".to_string(), "unknown".to_string()],
        );
        let estimates = source().fetch_estimates(&criteria).unwrap();
        assert_eq!(estimates["garden hose"].impressions_per_day, Some(10.0));
        assert!(estimates["unknown"].is_empty());
    }

    #[test]
    fn test_duplicate_rows_are_averaged() {
        let src = MemorySeedSource::new()
            .with("a", None, est(10.0))
            .with("a", None, est(30.0));
        assert_eq!(src.len(), 1);
        assert_eq!(
            src.lookup("a", MatchType::Broad).unwrap().impressions_per_day,
            Some(20.0)
        );
    }
}
