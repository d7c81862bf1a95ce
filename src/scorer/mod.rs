use crate::core_types::{Keyword, StatsEstimate};
use crate::error::{KoResult, OptimizerError};
use crate::formula::eval::finite;
use crate::formula::{EvaluationError, Formula, FormulaContext};
use crate::pool::CandidateEntry;
use std::collections::BTreeMap;
use tracing::debug;

/// Weight of the daily impressions in the default score.
pub const DEFAULT_IMPRESSIONS_WEIGHT: f64 = 1.0;
/// Weight of the inverse average CPC (in nominal units) in the default score.
pub const DEFAULT_INVERSE_CPC_WEIGHT: f64 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub enum ScoreFunction {
    /// `impressionsPerDay * 1.0 + 10.0 / avgCpc`; the CPC term is 0.0 when
    /// the CPC is absent or not positive.
    Default,
    Formula(Formula),
}

/// Turns statistics estimates into scalar scores. Higher is better.
#[derive(Debug, Clone, PartialEq)]
pub struct Scorer {
    function: ScoreFunction,
}

impl Default for Scorer {
    fn default() -> Self {
        Self {
            function: ScoreFunction::Default,
        }
    }
}

impl Scorer {
    /// Compiles the formula if one is given. Blank formulas select the default.
    pub fn new(formula: Option<&str>) -> KoResult<Self> {
        match formula.map(str::trim).filter(|f| !f.is_empty()) {
            Some(src) => {
                let formula = Formula::compile(src)?;
                debug!(
                    "Compiled score formula {} (uses {:?})",
                    formula.expr(),
                    formula.expr().variables()
                );
                Ok(Self::with_formula(formula))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn with_formula(formula: Formula) -> Self {
        Self {
            function: ScoreFunction::Formula(formula),
        }
    }

    pub fn describe(&self) -> String {
        match &self.function {
            ScoreFunction::Default => format!(
                "default ({} * impressionsPerDay + {} / avgCpc)",
                DEFAULT_IMPRESSIONS_WEIGHT, DEFAULT_INVERSE_CPC_WEIGHT
            ),
            ScoreFunction::Formula(f) => format!("formula '{}'", f.source()),
        }
    }

    /// Fails with [`EvaluationError::NonFinite`] rather than returning NaN or
    /// an infinity.
    pub fn score(&self, estimate: &StatsEstimate) -> Result<f64, EvaluationError> {
        let value = match &self.function {
            ScoreFunction::Default => default_score(estimate),
            ScoreFunction::Formula(f) => f.evaluate(&FormulaContext::from_estimate(estimate))?,
        };
        finite(value, || "score".to_string())
    }

    pub fn score_entry(&self, keyword: Keyword, estimate: StatsEstimate) -> KoResult<CandidateEntry> {
        let score = self
            .score(&estimate)
            .map_err(|source| OptimizerError::Evaluation {
                keyword: keyword.to_string(),
                source,
            })?;
        Ok(CandidateEntry::scored(keyword, estimate, score))
    }

    /// Scores a batch in keyword order; the first failure aborts the batch.
    pub fn score_all(
        &self,
        estimates: BTreeMap<Keyword, StatsEstimate>,
    ) -> KoResult<Vec<CandidateEntry>> {
        estimates
            .into_iter()
            .map(|(keyword, estimate)| self.score_entry(keyword, estimate))
            .collect()
    }
}

fn default_score(estimate: &StatsEstimate) -> f64 {
    let impressions = estimate.impressions_per_day.unwrap_or(0.0);
    let cpc = estimate.avg_cpc.map(|m| m.as_units()).unwrap_or(0.0);
    let inverse_cpc = if cpc > 0.0 { 1.0 / cpc } else { 0.0 };
    DEFAULT_IMPRESSIONS_WEIGHT * impressions + DEFAULT_INVERSE_CPC_WEIGHT * inverse_cpc
}
