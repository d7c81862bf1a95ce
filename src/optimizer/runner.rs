use crate::campaign::CampaignConfiguration;
use crate::config::Config;
use crate::core_types::{Keyword, MatchType, StatsEstimate};
use crate::error::KoResult;
use crate::optimizer::alternatives::{
    AlternativesFinder, CombinedFinder, MatchTypeExpander, RejectionHistory, RelatedIdeasFinder,
};
use crate::optimizer::round::{DefaultRoundStrategy, FinishReason, RoundStrategy};
use crate::pool::{CandidateEntry, CandidatePool};
use crate::scorer::Scorer;
use crate::seed::{SearchCriteria, SeedSource, SourceError};
use itertools::Itertools;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct OptimizationOptions {
    pub max_steps: usize,
    pub min_improvement: f64,
    pub max_population_size: usize,
    pub max_alternatives: usize,
    pub min_score: Option<f64>,
    pub result_size: usize,
}

impl From<&Config> for OptimizationOptions {
    fn from(cfg: &Config) -> Self {
        Self {
            max_steps: cfg.rounds.max_steps,
            min_improvement: cfg.rounds.min_improvement,
            max_population_size: cfg.rounds.max_population_size,
            max_alternatives: cfg.rounds.max_alternatives,
            min_score: cfg.rounds.min_score,
            result_size: cfg.rounds.result_size,
        }
    }
}

impl Default for OptimizationOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundReport {
    pub round: usize,
    pub alternatives: usize,
    pub rejected: usize,
    pub pool_size: usize,
    pub best_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptimizationResult {
    pub keywords: Vec<CandidateEntry>,
    pub rounds: usize,
    pub finish_reason: FinishReason,
    pub pool_size: usize,
}

/// Receives a report after every completed round.
pub trait ProgressCallback: Send + Sync {
    fn on_round(&self, report: &RoundReport);
}

/// Ignores all progress reports.
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_round(&self, _report: &RoundReport) {}
}

impl<F: Fn(&RoundReport) + Send + Sync> ProgressCallback for F {
    fn on_round(&self, report: &RoundReport) {
        self(report)
    }
}

/// Runs the seed -> score -> (generate -> fetch -> score -> merge -> filter)*
/// loop until the round strategy reports completion.
pub struct Optimizer {
    source: Arc<dyn SeedSource>,
    scorer: Scorer,
    campaign: Arc<CampaignConfiguration>,
    options: OptimizationOptions,
    finder: Box<dyn AlternativesFinder>,
    strategy: Box<dyn RoundStrategy>,
}

impl Optimizer {
    /// Uses related-idea queries plus match-type expansion to find
    /// alternatives, and the default round strategy.
    pub fn new(
        source: Arc<dyn SeedSource>,
        scorer: Scorer,
        campaign: CampaignConfiguration,
        options: OptimizationOptions,
    ) -> Self {
        let finder = CombinedFinder::new()
            .with(RelatedIdeasFinder::new(
                Arc::clone(&source),
                options.max_population_size,
            ))
            .with(MatchTypeExpander);
        let strategy = DefaultRoundStrategy::new(
            options.max_steps,
            options.min_improvement,
            options.max_alternatives,
        );

        Self {
            source,
            scorer,
            campaign: Arc::new(campaign),
            options,
            finder: Box::new(finder),
            strategy: Box::new(strategy),
        }
    }

    pub fn with_finder(mut self, finder: impl AlternativesFinder + 'static) -> Self {
        self.finder = Box::new(finder);
        self
    }

    pub fn with_strategy(mut self, strategy: impl RoundStrategy + 'static) -> Self {
        self.strategy = Box::new(strategy);
        self
    }

    pub fn campaign(&self) -> &CampaignConfiguration {
        &self.campaign
    }

    pub fn run<CB: ProgressCallback>(&mut self, callback: CB) -> KoResult<OptimizationResult> {
        self.strategy.reset();
        let mut history = RejectionHistory::default();

        info!(
            "🚀 Starting keyword optimization (scorer: {}, match types: {})",
            self.scorer.describe(),
            self.campaign.match_types.iter().join(",")
        );

        // 1. Seed
        let seed_criteria: Vec<SearchCriteria<'_>> = self
            .campaign
            .match_types
            .iter()
            .map(|mt| SearchCriteria::ideas(*mt, &self.campaign))
            .collect();
        let seeded = self.fetch_scored(&seed_criteria)?;
        let mut pool = CandidatePool::from_entries(Arc::clone(&self.campaign), seeded);
        info!("🌱 Seeded pool with {} keywords", pool.size());

        if pool.is_empty() {
            info!("🏁 Nothing to optimize: seed source returned no keywords");
            return Ok(OptimizationResult {
                keywords: Vec::new(),
                rounds: 0,
                finish_reason: FinishReason::EmptyPool,
                pool_size: 0,
            });
        }

        // 2. Rounds
        loop {
            if !history.is_empty() {
                debug!("{} recently rejected keywords barred", history.len());
            }
            let alternatives = self.finder.find(&pool, &self.campaign, &history)?;
            let candidates = self.fetch_alternatives(&alternatives)?;

            let merged = pool.merge(candidates);
            let next = match self.options.min_score {
                Some(threshold) => merged.filter_by_minimum_score(threshold),
                None => merged,
            };

            let rejected: BTreeSet<Keyword> = alternatives
                .iter()
                .chain(pool.keys())
                .filter(|k| !next.contains(k))
                .cloned()
                .collect();

            let round = self.strategy.state().round + 1;
            let report = RoundReport {
                round,
                alternatives: alternatives.len(),
                rejected: rejected.len(),
                pool_size: next.size(),
                best_score: next.best_score(),
            };
            info!(
                "🔄 Round {}: {} alternatives, {} rejected, pool={}, best={}",
                report.round,
                report.alternatives,
                report.rejected,
                report.pool_size,
                report
                    .best_score
                    .map(|s| format!("{:.3}", s))
                    .unwrap_or_else(|| "---".to_string())
            );

            history.record(rejected);
            pool = next;
            callback.on_round(&report);

            if self.strategy.is_finished(&pool) {
                break;
            }
        }

        // 3. Result
        let state = self.strategy.state();
        let finish_reason = state.finish_reason.unwrap_or(FinishReason::MaxSteps);
        info!(
            "🏁 Finished after {} rounds ({}), pool={}",
            state.round,
            finish_reason,
            pool.size()
        );

        Ok(OptimizationResult {
            keywords: pool.top_n(self.options.result_size),
            rounds: state.round,
            finish_reason,
            pool_size: pool.size(),
        })
    }

    fn fetch_alternatives(&self, alternatives: &BTreeSet<Keyword>) -> KoResult<Vec<CandidateEntry>> {
        let by_type: BTreeMap<MatchType, Vec<String>> = alternatives
            .iter()
            .map(|k| (k.match_type(), k.text().to_string()))
            .into_group_map()
            .into_iter()
            .collect();

        let criteria: Vec<SearchCriteria<'_>> = by_type
            .into_iter()
            .map(|(mt, texts)| SearchCriteria::estimates(mt, &self.campaign, texts))
            .collect();

        let scored = self.fetch_scored(&criteria)?;
        Ok(scored
            .into_iter()
            .filter(|e| alternatives.contains(&e.keyword))
            .collect())
    }

    /// Queries every criteria set (concurrently), merges the answers in key
    /// order and scores them.
    fn fetch_scored(&self, criteria: &[SearchCriteria<'_>]) -> KoResult<Vec<CandidateEntry>> {
        if criteria.is_empty() {
            return Ok(Vec::new());
        }

        let source = &self.source;
        let batches = criteria
            .par_iter()
            .map(|c| {
                source
                    .fetch_estimates(c)
                    .map(|estimates| (c.match_type, estimates))
            })
            .collect::<Result<Vec<_>, SourceError>>()?;

        let mut estimates: BTreeMap<Keyword, StatsEstimate> = BTreeMap::new();
        for (mt, batch) in batches {
            for (text, estimate) in batch {
                match Keyword::new(&text, mt) {
                    Ok(keyword) => {
                        estimates.insert(keyword, estimate);
                    }
                    Err(_) => debug!("Ignoring blank keyword text from seed source"),
                }
            }
        }

        self.scorer.score_all(estimates)
    }
}
