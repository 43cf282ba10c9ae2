//! Scenario tests with mandatory oracles.
//!
//! A scenario names a measurer configuration, the connections to open and a
//! script of verifier messages. Running it replays the script against a fresh
//! [`ImcAgent`](pts_imc::ImcAgent) and then calls the oracle with the final
//! [`World`]; a scenario cannot run without one.

mod builder;
mod world;

pub use builder::{RunnableScenario, Scenario};
pub use world::{StepOutcome, World};

/// Verification run after the script completes.
pub type OracleFn = Box<dyn Fn(&World) -> Result<(), String>>;
