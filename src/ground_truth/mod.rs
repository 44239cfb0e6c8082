//! Ground truth
//!
//! Known match and non-match facts used to score configurations, loaded from
//! a test file or built up from oracle answers.

pub mod link;
pub mod store;
pub mod test_file;

pub mod prelude {
    pub use super::link::{Decision, Link, Provenance, RecordPair};
    pub use super::store::GroundTruthStore;
    pub use super::test_file::{load_test_file, read_test_file, save_test_file, write_test_file};
}
