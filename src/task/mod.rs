//! Grounded (SAS⁺) planning-task model, text-format codec, and the rename
//! transformation.

pub mod codec;
pub mod model;
pub mod rename;

pub use codec::{read_task, write_task, write_task_to};
pub use model::{Axiom, Effect, GroundedTask, MutexGroup, Operator, Variable};
pub use rename::rename;
