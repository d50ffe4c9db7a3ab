//! Decision combination and reviewer-facing explanations.

mod engine;
mod explain;

pub use engine::{combine, AnomalyVerdict, DecisionCombiner, FinalFlag};
pub use explain::{debtor_amount_z, ExplainContext, ExplanationGenerator, Reason, NO_STRONG_REASONS};
