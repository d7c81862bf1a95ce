//! The seed source is the collaborator that supplies keyword ideas and their
//! traffic estimates. Remote backends (paging, rate limiting, retries) live
//! behind this trait; the optimizer only sees finished estimate tables.

pub mod loader;
pub mod memory;

pub use self::loader::{load_seed_table, read_seed_table};
pub use self::memory::MemorySeedSource;

use crate::campaign::CampaignConfiguration;
use crate::core_types::{MatchType, StatsEstimate};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    #[error("seed source unavailable: {0}")]
    Unavailable(String),

    #[error("seed source query failed: {0}")]
    Query(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    /// Keyword ideas related to the seed texts (or every known idea when no
    /// seeds are given), each with its estimate.
    Ideas,
    /// Estimates for exactly the seed texts.
    Estimates,
}

#[derive(Debug, Clone)]
pub struct SearchCriteria<'a> {
    pub match_type: MatchType,
    pub campaign: &'a CampaignConfiguration,
    pub seeds: BTreeSet<String>,
    pub mode: QueryMode,
}

impl<'a> SearchCriteria<'a> {
    pub fn ideas(match_type: MatchType, campaign: &'a CampaignConfiguration) -> Self {
        Self {
            match_type,
            campaign,
            seeds: BTreeSet::new(),
            mode: QueryMode::Ideas,
        }
    }

    pub fn estimates(
        match_type: MatchType,
        campaign: &'a CampaignConfiguration,
        texts: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            match_type,
            campaign,
            seeds: texts.into_iter().collect(),
            mode: QueryMode::Estimates,
        }
    }

    pub fn with_seeds(mut self, seeds: impl IntoIterator<Item = String>) -> Self {
        self.seeds = seeds.into_iter().collect();
        self
    }
}

/// Estimates keyed by keyword text.
pub type EstimateMap = BTreeMap<String, StatsEstimate>;

/// Supplies keyword texts and their statistics for a set of criteria.
///
/// Implementations may block; they must be shareable across the threads that
/// issue independent queries within one round.
pub trait SeedSource: Send + Sync {
    fn fetch_estimates(&self, criteria: &SearchCriteria<'_>) -> Result<EstimateMap, SourceError>;
}

impl<S: SeedSource + ?Sized> SeedSource for Arc<S> {
    fn fetch_estimates(&self, criteria: &SearchCriteria<'_>) -> Result<EstimateMap, SourceError> {
        (**self).fetch_estimates(criteria)
    }
}

impl<S: SeedSource + ?Sized> SeedSource for &S {
    fn fetch_estimates(&self, criteria: &SearchCriteria<'_>) -> Result<EstimateMap, SourceError> {
        (**self).fetch_estimates(criteria)
    }
}
