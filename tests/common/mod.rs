#![allow(dead_code)]

use keyword_optimizer::campaign::CampaignConfiguration;
use keyword_optimizer::core_types::{Keyword, MatchType, StatsEstimate};
use keyword_optimizer::pool::{CandidateEntry, CandidatePool};
use std::sync::Arc;

pub fn kw(text: &str, mt: MatchType) -> Keyword {
    Keyword::new(text, mt).unwrap()
}

pub fn scored(text: &str, score: f64) -> CandidateEntry {
    CandidateEntry::scored(kw(text, MatchType::Broad), StatsEstimate::default(), score)
}

pub fn impressions(value: f64) -> StatsEstimate {
    StatsEstimate {
        impressions_per_day: Some(value),
        ..Default::default()
    }
}

pub fn empty_pool() -> CandidatePool {
    CandidatePool::new(Arc::new(CampaignConfiguration::default()))
}

/// Pool of broad keywords with the given scores, named `k0`, `k1`, ...
pub fn pool_with_scores(scores: &[f64]) -> CandidatePool {
    empty_pool().merge(
        scores
            .iter()
            .enumerate()
            .map(|(i, s)| scored(&format!("k{}", i), *s)),
    )
}
