mod common;

use common::impressions;
use keyword_optimizer::campaign::CampaignConfiguration;
use keyword_optimizer::core_types::MatchType;
use keyword_optimizer::error::OptimizerError;
use keyword_optimizer::optimizer::{
    FinishReason, NoProgress, OptimizationOptions, OptimizationResult, Optimizer, RoundReport,
};
use keyword_optimizer::scorer::Scorer;
use keyword_optimizer::seed::{
    EstimateMap, MemorySeedSource, QueryMode, SearchCriteria, SeedSource, SourceError,
};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

/// Answers the unseeded idea query with a fixed starting set and every other
/// query from the full table.
struct StartingSet {
    initial: BTreeSet<String>,
    table: MemorySeedSource,
}

impl SeedSource for StartingSet {
    fn fetch_estimates(&self, criteria: &SearchCriteria<'_>) -> Result<EstimateMap, SourceError> {
        let mut out = self.table.fetch_estimates(criteria)?;
        if criteria.mode == QueryMode::Ideas && criteria.seeds.is_empty() {
            out.retain(|text, _| self.initial.contains(text));
        }
        Ok(out)
    }
}

struct Offline;

impl SeedSource for Offline {
    fn fetch_estimates(&self, _criteria: &SearchCriteria<'_>) -> Result<EstimateMap, SourceError> {
        Err(SourceError::Unavailable("connection refused".to_string()))
    }
}

fn shoe_source() -> Arc<StartingSet> {
    let table = MemorySeedSource::new()
        .with("shoes", None, impressions(10.0))
        .with("running shoes", None, impressions(50.0))
        .with("trail running", None, impressions(80.0))
        .with("garden hose", None, impressions(5.0));
    Arc::new(StartingSet {
        initial: ["shoes".to_string()].into_iter().collect(),
        table,
    })
}

fn broad_only() -> CampaignConfiguration {
    CampaignConfiguration::builder()
        .match_types([MatchType::Broad].into_iter().collect())
        .build()
}

fn options() -> OptimizationOptions {
    OptimizationOptions {
        max_steps: 10,
        min_improvement: 1.0,
        max_population_size: 10,
        max_alternatives: 1000,
        min_score: None,
        result_size: 25,
    }
}

fn texts(result: &OptimizationResult) -> Vec<&str> {
    result.keywords.iter().map(|e| e.keyword.text()).collect()
}

#[test]
fn test_discovers_related_keywords_until_converged() {
    let reports = Mutex::new(Vec::new());
    let mut optimizer = Optimizer::new(shoe_source(), Scorer::default(), broad_only(), options());

    let result = optimizer
        .run(|r: &RoundReport| reports.lock().unwrap().push(r.clone()))
        .unwrap();

    assert_eq!(texts(&result), vec!["trail running", "running shoes", "shoes"]);
    assert_eq!(result.finish_reason, FinishReason::Converged);
    assert_eq!(result.rounds, 3);
    assert_eq!(result.pool_size, 3);

    let reports = reports.into_inner().unwrap();
    let sizes: Vec<usize> = reports.iter().map(|r| r.pool_size).collect();
    assert_eq!(sizes, vec![2, 3, 3]);
    assert_eq!(reports[1].best_score, Some(80.0));
    assert!(reports.iter().all(|r| r.rejected == 0));
}

#[test]
fn test_garden_hose_is_never_related() {
    let mut optimizer = Optimizer::new(shoe_source(), Scorer::default(), broad_only(), options());
    let result = optimizer.run(NoProgress).unwrap();
    assert!(!texts(&result).contains(&"garden hose"));
}

#[test]
fn test_min_score_drops_weak_keywords() {
    let opts = OptimizationOptions {
        min_score: Some(20.0),
        ..options()
    };
    let mut optimizer = Optimizer::new(shoe_source(), Scorer::default(), broad_only(), opts);
    let result = optimizer.run(NoProgress).unwrap();

    assert_eq!(texts(&result), vec!["trail running", "running shoes"]);
    assert!(result.keywords.iter().all(|e| e.score >= Some(20.0)));
}

#[test]
fn test_max_steps_limits_rounds() {
    let opts = OptimizationOptions {
        max_steps: 1,
        ..options()
    };
    let mut optimizer = Optimizer::new(shoe_source(), Scorer::default(), broad_only(), opts);
    let result = optimizer.run(NoProgress).unwrap();

    assert_eq!(result.rounds, 1);
    assert_eq!(result.finish_reason, FinishReason::MaxSteps);
    assert_eq!(texts(&result), vec!["running shoes", "shoes"]);
}

#[test]
fn test_pool_cap_stops_growth() {
    let opts = OptimizationOptions {
        max_alternatives: 1,
        ..options()
    };
    let mut optimizer = Optimizer::new(shoe_source(), Scorer::default(), broad_only(), opts);
    let result = optimizer.run(NoProgress).unwrap();

    assert_eq!(result.rounds, 1);
    assert_eq!(result.finish_reason, FinishReason::MaxAlternatives);
}

#[test]
fn test_result_size_truncates() {
    let opts = OptimizationOptions {
        result_size: 1,
        ..options()
    };
    let mut optimizer = Optimizer::new(shoe_source(), Scorer::default(), broad_only(), opts);
    let result = optimizer.run(NoProgress).unwrap();

    assert_eq!(texts(&result), vec!["trail running"]);
    assert_eq!(result.pool_size, 3);
}

#[test]
fn test_match_types_are_expanded() {
    let campaign = CampaignConfiguration::builder()
        .match_types([MatchType::Broad, MatchType::Exact].into_iter().collect())
        .build();
    let opts = OptimizationOptions {
        max_steps: 1,
        ..options()
    };
    let mut optimizer = Optimizer::new(shoe_source(), Scorer::default(), campaign, opts);
    let result = optimizer.run(NoProgress).unwrap();

    // Both texts under both match types.
    assert_eq!(result.pool_size, 4);
}

#[test]
fn test_runs_are_deterministic() {
    let run = || {
        let mut optimizer =
            Optimizer::new(shoe_source(), Scorer::default(), broad_only(), options());
        optimizer.run(NoProgress).unwrap()
    };
    let first = run();
    let second = run();
    assert_eq!(first.keywords, second.keywords);
    assert_eq!(first.rounds, second.rounds);
}

#[test]
fn test_optimizer_can_be_rerun() {
    let mut optimizer = Optimizer::new(shoe_source(), Scorer::default(), broad_only(), options());
    let first = optimizer.run(NoProgress).unwrap();
    let second = optimizer.run(NoProgress).unwrap();
    assert_eq!(first.keywords, second.keywords);
    assert_eq!(second.rounds, 3);
}

#[test]
fn test_empty_source_finishes_at_round_zero() {
    let mut optimizer = Optimizer::new(
        Arc::new(MemorySeedSource::new()),
        Scorer::default(),
        CampaignConfiguration::default(),
        options(),
    );
    let result = optimizer.run(NoProgress).unwrap();

    assert!(result.keywords.is_empty());
    assert_eq!(result.rounds, 0);
    assert_eq!(result.finish_reason, FinishReason::EmptyPool);
}

#[test]
fn test_source_failure_aborts_run() {
    let mut optimizer = Optimizer::new(
        Arc::new(Offline),
        Scorer::default(),
        CampaignConfiguration::default(),
        options(),
    );
    let err = optimizer.run(NoProgress).unwrap_err();
    assert!(matches!(
        err,
        OptimizerError::Source(SourceError::Unavailable(_))
    ));
}

#[test]
fn test_formula_failure_aborts_run() {
    let scorer = Scorer::new(Some("impressionsPerDay / avgCpc")).unwrap();
    let mut optimizer = Optimizer::new(shoe_source(), scorer, broad_only(), options());
    let err = optimizer.run(NoProgress).unwrap_err();
    assert!(matches!(err, OptimizerError::Evaluation { .. }));
}

#[test]
fn test_result_serializes_to_json() {
    let mut optimizer = Optimizer::new(shoe_source(), Scorer::default(), broad_only(), options());
    let result = optimizer.run(NoProgress).unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["finish_reason"], "converged");
    assert_eq!(json["keywords"][0]["keyword"]["match_type"], "BROAD");
}

/// Records the texts of every estimates query.
struct Recording {
    inner: Arc<StartingSet>,
    estimate_queries: Mutex<Vec<BTreeSet<String>>>,
}

impl SeedSource for Recording {
    fn fetch_estimates(&self, criteria: &SearchCriteria<'_>) -> Result<EstimateMap, SourceError> {
        if criteria.mode == QueryMode::Estimates {
            self.estimate_queries
                .lock()
                .unwrap()
                .push(criteria.seeds.clone());
        }
        self.inner.fetch_estimates(criteria)
    }
}

#[test]
fn test_rejected_keyword_is_barred_for_two_rounds() {
    let source = Arc::new(Recording {
        inner: shoe_source(),
        estimate_queries: Mutex::new(Vec::new()),
    });
    let opts = OptimizationOptions {
        max_steps: 5,
        min_improvement: f64::NEG_INFINITY,
        min_score: Some(20.0),
        ..options()
    };
    let mut optimizer = Optimizer::new(source.clone(), Scorer::default(), broad_only(), opts);

    let reports = Mutex::new(Vec::new());
    let boundaries = Mutex::new(Vec::new());
    let result = optimizer
        .run(|r: &RoundReport| {
            reports.lock().unwrap().push(r.clone());
            boundaries
                .lock()
                .unwrap()
                .push(source.estimate_queries.lock().unwrap().len());
        })
        .unwrap();
    assert_eq!(result.rounds, 5);

    let queries = source.estimate_queries.lock().unwrap().clone();
    let boundaries = boundaries.into_inner().unwrap();
    let mut start = 0;
    let per_round: Vec<BTreeSet<String>> = boundaries
        .iter()
        .map(|&end| {
            let texts = queries[start..end].iter().flatten().cloned().collect();
            start = end;
            texts
        })
        .collect();
    let queried = |round: usize, text: &str| per_round[round - 1].contains(text);

    // "shoes" scores 10 and is dropped in round 1.
    let reports = reports.into_inner().unwrap();
    assert_eq!(reports[0].rejected, 1);
    assert!(!result.keywords.iter().any(|e| e.keyword.text() == "shoes"));

    // Barred from re-proposal in the next two rounds...
    assert!(queried(2, "trail running"));
    assert!(!queried(2, "shoes"));
    assert!(!queried(3, "shoes"));

    // ...then proposed again once the window has passed, and rejected again.
    assert!(queried(4, "shoes"));
    assert_eq!(reports[3].rejected, 1);
    assert!(!queried(5, "shoes"));
}

#[test]
fn test_non_finite_estimate_aborts_run() {
    let source = MemorySeedSource::new()
        .with("fine", None, impressions(10.0))
        .with("broken", None, impressions(f64::NAN));
    let mut optimizer = Optimizer::new(
        Arc::new(source),
        Scorer::default(),
        broad_only(),
        options(),
    );
    let err = optimizer.run(NoProgress).unwrap_err();
    assert!(matches!(
        err,
        OptimizerError::Evaluation { ref keyword, .. } if keyword == "broken[BROAD]"
    ));
}
