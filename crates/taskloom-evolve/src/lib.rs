//! Evolutionary profile tuner contract.
//!
//! Models the tuner as an external collaborator: this crate only implements
//! the fitness/mutation interface the core demands, not a search policy.
//! The internal search strategy is explicitly out of scope (spec §1); the
//! single mutation operator here exists to prove the contract works end to
//! end, not to be competitive.

mod error;
mod fitness;
mod generation;
mod mutate;
mod profile;

pub use error::{Error, Result};
pub use fitness::{Fitness, PassRateFitness};
pub use generation::Generation;
pub use mutate::{Mutate, NudgeOneKnob};
pub use profile::Profile;
