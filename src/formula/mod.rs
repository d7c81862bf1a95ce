//! Arithmetic formula language for composite keyword scores.
//!
//! A formula combines the estimated statistics of a keyword, e.g.
//! `clicksPerDay * 2 - avgCpc / 10` or `max(ctr, 0.01) * impressionsPerDay`.
//! Formulas are parsed once at configuration time; unknown variables and
//! functions are rejected by the parser, never at evaluation time.

pub mod ast;
pub mod eval;
pub mod lexer;
pub mod parser;

pub use self::ast::{BinaryOp, Expr, Function, Variable};
pub use self::eval::{evaluate, FormulaContext};
pub use self::parser::parse;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyntaxError {
    #[error("empty formula")]
    Empty,

    #[error("unexpected character '{ch}' at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },

    #[error("invalid number '{text}' at offset {offset}")]
    InvalidNumber { text: String, offset: usize },

    #[error("unknown variable `{name}` at offset {offset}")]
    UnknownVariable { name: String, offset: usize },

    #[error("unknown function `{name}` at offset {offset}")]
    UnknownFunction { name: String, offset: usize },

    #[error("function `{name}` expects {expected} argument(s), got {found} (offset {offset})")]
    Arity {
        name: String,
        expected: String,
        found: usize,
        offset: usize,
    },

    #[error("unexpected {found} at offset {offset}, expected {expected}")]
    UnexpectedToken {
        found: String,
        expected: &'static str,
        offset: usize,
    },

    #[error("unexpected end of formula, expected {expected}")]
    UnexpectedEnd { expected: &'static str },

    #[error("formula nested deeper than {limit} levels at offset {offset}")]
    TooDeep { limit: usize, offset: usize },
}

impl SyntaxError {
    /// Byte offset of the offending token, when there is one.
    pub fn offset(&self) -> Option<usize> {
        match self {
            SyntaxError::Empty | SyntaxError::UnexpectedEnd { .. } => None,
            SyntaxError::UnexpectedChar { offset, .. }
            | SyntaxError::InvalidNumber { offset, .. }
            | SyntaxError::UnknownVariable { offset, .. }
            | SyntaxError::UnknownFunction { offset, .. }
            | SyntaxError::Arity { offset, .. }
            | SyntaxError::UnexpectedToken { offset, .. }
            | SyntaxError::TooDeep { offset, .. } => Some(*offset),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    #[error("variable `{0}` is not bound")]
    UnboundVariable(Variable),

    #[error("division by zero")]
    DivisionByZero,

    #[error("non-finite result from {operation}")]
    NonFinite { operation: String },

    #[error("function `{function}` called with {found} argument(s)")]
    Arity { function: String, found: usize },
}

/// A parsed formula together with its source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    source: String,
    expr: Expr,
}

impl Formula {
    pub fn compile(source: &str) -> Result<Self, SyntaxError> {
        Ok(Self {
            source: source.trim().to_string(),
            expr: parse(source)?,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn evaluate(&self, context: &FormulaContext) -> Result<f64, EvaluationError> {
        evaluate(&self.expr, context)
    }
}
