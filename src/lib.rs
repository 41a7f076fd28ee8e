//! Machetli minimizes failing AI-planning task instances: given a task that
//! exhibits some observed behavior and a user-supplied evaluator that tests
//! for it, [`search::search`] hill-climbs over a stream of candidate
//! transformations to a smaller instance that still triggers the behavior.

pub mod blob;
pub mod config;
pub mod driver;
pub mod errors;
pub mod search;
pub mod shim;
pub mod state;
pub mod successor;
pub mod task;
