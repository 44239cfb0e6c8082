//! # linkage-evo
//!
//! Genetic-algorithm tuning of record-linkage configurations.
//!
//! A matching engine is driven by dozens of interacting weights and
//! thresholds. This library evolves a population of candidate configurations,
//! scoring each by the F-measure of the links it proposes against known
//! ground truth.
//!
//! When no ground truth exists the search runs with active learning: each
//! generation the pairs the population is most informative about are shown to
//! an oracle (usually a person at the console), and the answers become ground
//! truth for later generations.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use linkage_evo::prelude::*;
//! use rand::SeedableRng;
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(42);
//! let engine = InMemoryEngine::new(["name", "email"]);
//! let space = engine.parameter_space();
//!
//! let mut ga = GeneticAlgorithmBuilder::new()
//!     .engine(engine)
//!     .parameter_space(space)
//!     .test_file("links.csv")
//!     .generations(50)
//!     .build()?;
//! let result = ga.run(&[&records], &mut rng)?;
//! println!("{}", result.to_json()?);
//! ```

pub mod active_learning;
pub mod algorithms;
pub mod diagnostics;
pub mod error;
pub mod fitness;
pub mod genome;
pub mod ground_truth;
pub mod matching;
pub mod population;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::active_learning::prelude::*;
    pub use crate::algorithms::prelude::*;
    pub use crate::diagnostics::prelude::*;
    pub use crate::error::*;
    pub use crate::fitness::prelude::*;
    pub use crate::genome::prelude::*;
    pub use crate::ground_truth::prelude::*;
    pub use crate::matching::prelude::*;
    pub use crate::population::prelude::*;
}
