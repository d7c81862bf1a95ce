use crate::campaign::CampaignConfiguration;
use crate::core_types::{Keyword, StatsEstimate};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// A keyword with its estimate and (once scored) its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateEntry {
    pub keyword: Keyword,
    pub estimate: StatsEstimate,
    pub score: Option<f64>,
}

impl CandidateEntry {
    pub fn unscored(keyword: Keyword, estimate: StatsEstimate) -> Self {
        Self {
            keyword,
            estimate,
            score: None,
        }
    }

    pub fn scored(keyword: Keyword, estimate: StatsEstimate, score: f64) -> Self {
        Self {
            keyword,
            estimate,
            score: Some(score),
        }
    }

    /// Ranking order: higher score first, unscored last, then keyword text
    /// and match type ascending.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        let a = self.score.unwrap_or(f64::NEG_INFINITY);
        let b = other.score.unwrap_or(f64::NEG_INFINITY);
        b.total_cmp(&a).then_with(|| self.keyword.cmp(&other.keyword))
    }
}

/// Deduplicated candidates keyed by (text, match type).
///
/// Every operation returns a new pool; a pool handed to a later round is
/// never modified.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidatePool {
    campaign: Arc<CampaignConfiguration>,
    entries: BTreeMap<Keyword, CandidateEntry>,
}

impl CandidatePool {
    pub fn new(campaign: Arc<CampaignConfiguration>) -> Self {
        Self {
            campaign,
            entries: BTreeMap::new(),
        }
    }

    pub fn from_entries(
        campaign: Arc<CampaignConfiguration>,
        entries: impl IntoIterator<Item = CandidateEntry>,
    ) -> Self {
        Self::new(campaign).merge(entries)
    }

    pub fn campaign(&self) -> &CampaignConfiguration {
        &self.campaign
    }

    /// Inserts or replaces by key. Later entries win.
    pub fn merge(&self, new_entries: impl IntoIterator<Item = CandidateEntry>) -> Self {
        let mut entries = self.entries.clone();
        for entry in new_entries {
            entries.insert(entry.keyword.clone(), entry);
        }
        Self {
            campaign: Arc::clone(&self.campaign),
            entries,
        }
    }

    pub fn merge_pool(&self, other: &CandidatePool) -> Self {
        self.merge(other.entries.values().cloned())
    }

    /// Keeps entries whose score is at least `threshold`. Unscored entries
    /// are dropped.
    pub fn filter_by_minimum_score(&self, threshold: f64) -> Self {
        let entries = self
            .entries
            .iter()
            .filter(|(_, e)| e.score.is_some_and(|s| s >= threshold))
            .map(|(k, e)| (k.clone(), e.clone()))
            .collect();
        Self {
            campaign: Arc::clone(&self.campaign),
            entries,
        }
    }

    pub fn top_n(&self, n: usize) -> Vec<CandidateEntry> {
        let mut ranked: Vec<&CandidateEntry> = self.entries.values().collect();
        ranked.sort_by(|a, b| a.rank_cmp(b));
        ranked.into_iter().take(n).cloned().collect()
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, keyword: &Keyword) -> bool {
        self.entries.contains_key(keyword)
    }

    pub fn get(&self, keyword: &Keyword) -> Option<&CandidateEntry> {
        self.entries.get(keyword)
    }

    pub fn keys(&self) -> impl Iterator<Item = &Keyword> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CandidateEntry> {
        self.entries.values()
    }

    /// Distinct keyword texts, regardless of match type.
    pub fn texts(&self) -> BTreeSet<String> {
        self.entries.keys().map(|k| k.text().to_string()).collect()
    }

    pub fn best_score(&self) -> Option<f64> {
        self.entries
            .values()
            .filter_map(|e| e.score)
            .max_by(|a, b| a.total_cmp(b))
    }

    pub fn average_score(&self) -> Option<f64> {
        let scores: Vec<f64> = self.entries.values().filter_map(|e| e.score).collect();
        if scores.is_empty() {
            None
        } else {
            Some(scores.iter().sum::<f64>() / scores.len() as f64)
        }
    }
}
