//! Active learning
//!
//! When no ground truth is supplied, the search builds its own: each
//! generation it ranks the pairs the population proposed by how informative
//! an answer would be, and asks an oracle about the best few.
//!
//! # Scorers
//!
//! - **Agreement** (first generation): pairs most genotypes call a match, so
//!   the ground truth gets some confirmed matches early.
//! - **Disagreement** (later generations): pairs the population is split on,
//!   which sit on the decision boundary.

pub mod exemplars;
pub mod oracle;
pub mod scorer;

/// Prelude for convenient imports
pub mod prelude {
    pub use super::exemplars::{Exemplar, ExemplarsTracker};
    pub use super::oracle::{
        ConsoleOracle, Oracle, Question, ScriptedOracle, StdioOracle, TimeoutOracle,
    };
    pub use super::scorer::{
        scorer_for_generation, DisagreementScorer, FindCorrectScorer, Scorer,
    };
}
