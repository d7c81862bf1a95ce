use super::ast::{BinaryOp, Expr, Function, Variable};
use super::EvaluationError;
use crate::core_types::{Money, StatsEstimate};
use std::collections::BTreeMap;

/// Variable bindings for a single evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormulaContext {
    values: BTreeMap<Variable, f64>,
}

impl FormulaContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(mut self, variable: Variable, value: f64) -> Self {
        self.values.insert(variable, value);
        self
    }

    pub fn get(&self, variable: Variable) -> Option<f64> {
        self.values.get(&variable).copied()
    }

    /// Binds every statistic of the estimate. Absent statistics are bound to
    /// 0.0; currency values are expressed in nominal units.
    pub fn from_estimate(estimate: &StatsEstimate) -> Self {
        let money = |m: Option<Money>| m.map(|m| m.as_units()).unwrap_or(0.0);
        Self::new()
            .bind(Variable::AvgCpc, money(estimate.avg_cpc))
            .bind(Variable::AvgPosition, estimate.avg_position.unwrap_or(0.0))
            .bind(Variable::ClicksPerDay, estimate.clicks_per_day.unwrap_or(0.0))
            .bind(
                Variable::ImpressionsPerDay,
                estimate.impressions_per_day.unwrap_or(0.0),
            )
            .bind(Variable::Ctr, estimate.click_through_rate.unwrap_or(0.0))
            .bind(Variable::TotalCost, money(estimate.total_cost))
    }
}

/// Evaluates the tree against the given bindings.
///
/// Division by zero fails with [`EvaluationError::DivisionByZero`]; any other
/// operation producing NaN or an infinity fails with
/// [`EvaluationError::NonFinite`].
pub fn evaluate(expr: &Expr, context: &FormulaContext) -> Result<f64, EvaluationError> {
    match expr {
        Expr::Number(n) => Ok(*n),
        Expr::Variable(v) => {
            let value = context
                .get(*v)
                .ok_or(EvaluationError::UnboundVariable(*v))?;
            finite(value, || v.to_string())
        }
        Expr::Negate(inner) => Ok(-evaluate(inner, context)?),
        Expr::Binary { op, lhs, rhs } => {
            let l = evaluate(lhs, context)?;
            let r = evaluate(rhs, context)?;
            let value = match op {
                BinaryOp::Add => l + r,
                BinaryOp::Sub => l - r,
                BinaryOp::Mul => l * r,
                BinaryOp::Div => {
                    if r == 0.0 {
                        return Err(EvaluationError::DivisionByZero);
                    }
                    l / r
                }
            };
            finite(value, || format!("{} {} {}", l, op.symbol(), r))
        }
        Expr::Call { function, args } => {
            let values = args
                .iter()
                .map(|a| evaluate(a, context))
                .collect::<Result<Vec<f64>, _>>()?;
            let value = apply(*function, &values)?;
            finite(value, || format!("{}({:?})", function, values))
        }
    }
}

fn apply(function: Function, args: &[f64]) -> Result<f64, EvaluationError> {
    let arity_error = || EvaluationError::Arity {
        function: function.to_string(),
        found: args.len(),
    };
    let value = match (function, args) {
        (Function::Abs, [x]) => x.abs(),
        (Function::Sqrt, [x]) => x.sqrt(),
        (Function::Ln, [x]) => x.ln(),
        (Function::Log10, [x]) => x.log10(),
        (Function::Pow, [x, y]) => x.powf(*y),
        (Function::Min, [first, rest @ ..]) => rest.iter().fold(*first, |a, b| a.min(*b)),
        (Function::Max, [first, rest @ ..]) => rest.iter().fold(*first, |a, b| a.max(*b)),
        _ => return Err(arity_error()),
    };
    Ok(value)
}

pub(crate) fn finite(
    value: f64,
    describe: impl FnOnce() -> String,
) -> Result<f64, EvaluationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EvaluationError::NonFinite {
            operation: describe(),
        })
    }
}
