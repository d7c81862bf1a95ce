use crate::pool::CandidatePool;
use serde::Serialize;
use strum_macros::Display;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize)]
pub enum RoundStatus {
    #[default]
    Running,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum FinishReason {
    /// Nothing left to optimize.
    EmptyPool,
    /// The configured number of rounds has run.
    MaxSteps,
    /// The pool outgrew the alternatives cap.
    MaxAlternatives,
    /// The best score stopped improving by the required margin.
    Converged,
}

/// Bookkeeping owned by a round strategy. Reset per run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoundState {
    /// Rounds completed so far.
    pub round: usize,
    pub status: RoundStatus,
    pub finish_reason: Option<FinishReason>,
    /// Best score at the end of each completed round.
    pub best_history: Vec<Option<f64>>,
    /// Pool size at the end of each completed round.
    pub size_history: Vec<usize>,
}

impl RoundState {
    pub fn previous_best(&self) -> Option<f64> {
        self.best_history.last().copied().flatten()
    }
}

/// Decides when the refinement loop stops.
///
/// `is_finished` is called exactly once at the end of every round. It must
/// not depend on anything but the sequence of pools it has been shown.
pub trait RoundStrategy: Send {
    fn is_finished(&mut self, pool: &CandidatePool) -> bool;

    fn state(&self) -> &RoundState;

    fn reset(&mut self);
}

#[derive(Debug, Clone)]
pub struct DefaultRoundStrategy {
    max_steps: usize,
    min_improvement: f64,
    max_alternatives: usize,
    state: RoundState,
}

impl DefaultRoundStrategy {
    pub fn new(max_steps: usize, min_improvement: f64, max_alternatives: usize) -> Self {
        Self {
            max_steps,
            min_improvement,
            max_alternatives,
            state: RoundState::default(),
        }
    }

    fn decide(&self, pool: &CandidatePool, round: usize) -> Option<FinishReason> {
        if pool.is_empty() {
            return Some(FinishReason::EmptyPool);
        }
        if round >= self.max_steps {
            return Some(FinishReason::MaxSteps);
        }
        if pool.size() > self.max_alternatives {
            return Some(FinishReason::MaxAlternatives);
        }
        // The first round has no previous best to compare against.
        if round >= 2 {
            if let (Some(prev), Some(best)) = (self.state.previous_best(), pool.best_score()) {
                if best - prev < self.min_improvement {
                    return Some(FinishReason::Converged);
                }
            }
        }
        None
    }
}

impl RoundStrategy for DefaultRoundStrategy {
    fn is_finished(&mut self, pool: &CandidatePool) -> bool {
        if self.state.status == RoundStatus::Finished {
            return true;
        }

        let round = self.state.round + 1;
        let reason = self.decide(pool, round);

        self.state.round = round;
        self.state.best_history.push(pool.best_score());
        self.state.size_history.push(pool.size());

        debug!(
            "Round {}: size={} best={:?} -> {:?}",
            round,
            pool.size(),
            pool.best_score(),
            reason
        );

        if let Some(reason) = reason {
            self.state.status = RoundStatus::Finished;
            self.state.finish_reason = Some(reason);
            return true;
        }
        false
    }

    fn state(&self) -> &RoundState {
        &self.state
    }

    fn reset(&mut self) {
        self.state = RoundState::default();
    }
}
