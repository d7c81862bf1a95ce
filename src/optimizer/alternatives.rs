use crate::campaign::CampaignConfiguration;
use crate::core_types::Keyword;
use crate::error::KoResult;
use crate::pool::CandidatePool;
use crate::seed::{SearchCriteria, SeedSource, SourceError};
use rayon::prelude::*;
use std::collections::{BTreeSet, VecDeque};
use tracing::debug;

/// Rounds for which a rejected keyword stays barred from re-proposal.
pub const REJECTION_MEMORY_ROUNDS: usize = 2;

/// Keywords rejected in the most recent rounds.
#[derive(Debug, Clone)]
pub struct RejectionHistory {
    rounds: VecDeque<BTreeSet<Keyword>>,
    depth: usize,
}

impl Default for RejectionHistory {
    fn default() -> Self {
        Self::new(REJECTION_MEMORY_ROUNDS)
    }
}

impl RejectionHistory {
    pub fn new(depth: usize) -> Self {
        Self {
            rounds: VecDeque::with_capacity(depth),
            depth,
        }
    }

    /// Records one round's rejections, forgetting the oldest round once the
    /// window is full.
    pub fn record(&mut self, rejected: BTreeSet<Keyword>) {
        if self.depth == 0 {
            return;
        }
        if self.rounds.len() == self.depth {
            self.rounds.pop_front();
        }
        self.rounds.push_back(rejected);
    }

    pub fn contains(&self, keyword: &Keyword) -> bool {
        self.rounds.iter().any(|r| r.contains(keyword))
    }

    pub fn len(&self) -> usize {
        self.rounds.iter().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Proposes the next candidates to evaluate given the current pool.
///
/// Implementations never return keywords that are already in the pool or
/// that were rejected within the remembered window.
pub trait AlternativesFinder: Send + Sync {
    fn name(&self) -> &'static str;

    fn find(
        &self,
        pool: &CandidatePool,
        campaign: &CampaignConfiguration,
        history: &RejectionHistory,
    ) -> KoResult<BTreeSet<Keyword>>;
}

fn is_new(keyword: &Keyword, pool: &CandidatePool, history: &RejectionHistory) -> bool {
    !pool.contains(keyword) && !history.contains(keyword)
}

/// Re-proposes every pool text under each configured match type.
#[derive(Debug, Clone, Default)]
pub struct MatchTypeExpander;

impl AlternativesFinder for MatchTypeExpander {
    fn name(&self) -> &'static str {
        "match-type-expander"
    }

    fn find(
        &self,
        pool: &CandidatePool,
        campaign: &CampaignConfiguration,
        history: &RejectionHistory,
    ) -> KoResult<BTreeSet<Keyword>> {
        let out = pool
            .keys()
            .flat_map(|kw| {
                campaign
                    .match_types
                    .iter()
                    .map(move |mt| kw.with_match_type(*mt))
            })
            .filter(|kw| is_new(kw, pool, history))
            .collect();
        Ok(out)
    }
}

/// Asks the seed source for ideas related to the current top performers.
/// Issues one query per configured match type.
#[derive(Debug, Clone)]
pub struct RelatedIdeasFinder<S> {
    source: S,
    population_size: usize,
}

impl<S: SeedSource> RelatedIdeasFinder<S> {
    pub fn new(source: S, population_size: usize) -> Self {
        Self {
            source,
            population_size,
        }
    }
}

impl<S: SeedSource> AlternativesFinder for RelatedIdeasFinder<S> {
    fn name(&self) -> &'static str {
        "related-ideas"
    }

    fn find(
        &self,
        pool: &CandidatePool,
        campaign: &CampaignConfiguration,
        history: &RejectionHistory,
    ) -> KoResult<BTreeSet<Keyword>> {
        let seeds: BTreeSet<String> = pool
            .top_n(self.population_size)
            .into_iter()
            .map(|e| e.keyword.text().to_string())
            .collect();

        if seeds.is_empty() {
            return Ok(BTreeSet::new());
        }
        debug!("Querying related ideas for {} seed texts", seeds.len());

        let criteria: Vec<SearchCriteria<'_>> = campaign
            .match_types
            .iter()
            .map(|mt| SearchCriteria::ideas(*mt, campaign).with_seeds(seeds.iter().cloned()))
            .collect();

        let batches = criteria
            .par_iter()
            .map(|c| {
                self.source
                    .fetch_estimates(c)
                    .map(|ideas| (c.match_type, ideas))
            })
            .collect::<Result<Vec<_>, SourceError>>()?;

        let out = batches
            .into_iter()
            .flat_map(|(mt, ideas)| {
                ideas
                    .into_keys()
                    .filter_map(move |text| Keyword::new(text, mt).ok())
            })
            .filter(|kw| is_new(kw, pool, history))
            .collect();
        Ok(out)
    }
}

/// Union of several finders, queried in order.
#[derive(Default)]
pub struct CombinedFinder {
    finders: Vec<Box<dyn AlternativesFinder>>,
}

impl CombinedFinder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, finder: impl AlternativesFinder + 'static) -> Self {
        self.finders.push(Box::new(finder));
        self
    }
}

impl AlternativesFinder for CombinedFinder {
    fn name(&self) -> &'static str {
        "combined"
    }

    fn find(
        &self,
        pool: &CandidatePool,
        campaign: &CampaignConfiguration,
        history: &RejectionHistory,
    ) -> KoResult<BTreeSet<Keyword>> {
        let mut out = BTreeSet::new();
        for finder in &self.finders {
            let found = finder.find(pool, campaign, history)?;
            debug!("{} proposed {} alternatives", finder.name(), found.len());
            out.extend(found);
        }
        Ok(out)
    }
}
