//! The refinement loop: propose alternatives, fetch and score them, merge
//! them into the pool and let the round strategy decide when to stop.

pub mod alternatives;
pub mod round;
pub mod runner;

pub use self::alternatives::{
    AlternativesFinder, CombinedFinder, MatchTypeExpander, RejectionHistory, RelatedIdeasFinder,
};
pub use self::round::{DefaultRoundStrategy, FinishReason, RoundState, RoundStatus, RoundStrategy};
pub use self::runner::{
    NoProgress, OptimizationOptions, OptimizationResult, Optimizer, ProgressCallback, RoundReport,
};
