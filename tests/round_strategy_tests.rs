mod common;

use common::{empty_pool, pool_with_scores};
use keyword_optimizer::optimizer::{
    DefaultRoundStrategy, FinishReason, RoundStatus, RoundStrategy,
};
use rstest::rstest;

#[test]
fn test_empty_pool_finishes_immediately() {
    let mut strategy = DefaultRoundStrategy::new(10, 0.0, 1000);
    assert!(strategy.is_finished(&empty_pool()));
    assert_eq!(strategy.state().finish_reason, Some(FinishReason::EmptyPool));
    assert_eq!(strategy.state().round, 1);
}

#[test]
fn test_single_step_finishes_on_first_round() {
    let mut strategy = DefaultRoundStrategy::new(1, 0.0, 1000);
    assert!(strategy.is_finished(&pool_with_scores(&[1.0])));
    assert_eq!(strategy.state().finish_reason, Some(FinishReason::MaxSteps));
}

#[rstest]
#[case(1)]
#[case(3)]
#[case(7)]
fn test_max_steps_bounds_round_count(#[case] max_steps: usize) {
    let mut strategy = DefaultRoundStrategy::new(max_steps, f64::NEG_INFINITY, 1000);
    let mut calls = 0;
    loop {
        calls += 1;
        // Strictly improving so convergence never triggers.
        if strategy.is_finished(&pool_with_scores(&[calls as f64 * 10.0])) {
            break;
        }
        assert!(calls < 100, "strategy never finished");
    }
    assert_eq!(calls, max_steps);
    assert_eq!(strategy.state().finish_reason, Some(FinishReason::MaxSteps));
}

#[test]
fn test_pool_over_cap_finishes() {
    let mut strategy = DefaultRoundStrategy::new(10, 0.0, 2);
    assert!(!strategy.is_finished(&pool_with_scores(&[1.0, 2.0])));
    assert!(strategy.is_finished(&pool_with_scores(&[1.0, 2.0, 3.0])));
    assert_eq!(
        strategy.state().finish_reason,
        Some(FinishReason::MaxAlternatives)
    );
}

#[rstest]
#[case(10.0, 10.5, 1.0, true)]
#[case(10.0, 11.0, 1.0, false)]
#[case(10.0, 12.0, 1.0, false)]
#[case(10.0, 10.0, 0.0, false)]
#[case(10.0, 9.0, 0.0, true)]
fn test_convergence_on_small_improvement(
    #[case] first: f64,
    #[case] second: f64,
    #[case] min_improvement: f64,
    #[case] finished: bool,
) {
    let mut strategy = DefaultRoundStrategy::new(10, min_improvement, 1000);
    assert!(!strategy.is_finished(&pool_with_scores(&[first])));
    assert_eq!(strategy.is_finished(&pool_with_scores(&[second])), finished);
    if finished {
        assert_eq!(strategy.state().finish_reason, Some(FinishReason::Converged));
    }
}

#[test]
fn test_finished_state_is_sticky() {
    let mut strategy = DefaultRoundStrategy::new(1, 0.0, 1000);
    assert!(strategy.is_finished(&pool_with_scores(&[1.0])));
    assert!(strategy.is_finished(&pool_with_scores(&[100.0])));
    assert_eq!(strategy.state().round, 1);
    assert_eq!(strategy.state().status, RoundStatus::Finished);
}

#[test]
fn test_history_tracks_each_round() {
    let mut strategy = DefaultRoundStrategy::new(10, f64::NEG_INFINITY, 1000);
    strategy.is_finished(&pool_with_scores(&[1.0]));
    strategy.is_finished(&pool_with_scores(&[1.0, 5.0]));
    let state = strategy.state();
    assert_eq!(state.best_history, vec![Some(1.0), Some(5.0)]);
    assert_eq!(state.size_history, vec![1, 2]);
    assert_eq!(state.previous_best(), Some(5.0));
}

#[test]
fn test_reset_allows_reuse() {
    let mut strategy = DefaultRoundStrategy::new(1, 0.0, 1000);
    assert!(strategy.is_finished(&pool_with_scores(&[1.0])));
    strategy.reset();
    assert_eq!(strategy.state().round, 0);
    assert_eq!(strategy.state().status, RoundStatus::Running);
}
