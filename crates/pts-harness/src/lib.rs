//! Test harness for the PTS measurer.
//!
//! Provides an in-memory transport that records every reply, a scripted
//! verifier that builds request messages, and a scenario builder that runs a
//! script against an [`ImcAgent`](pts_imc::ImcAgent) and hands the resulting
//! world to an oracle.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod memory_transport;
pub mod scenario;
pub mod verifier;

pub use memory_transport::MemoryTransport;
pub use scenario::{OracleFn, Scenario, World};
pub use verifier::Verifier;
