//! Measurer side of TCG PTS platform attestation.
//!
//! A remote verifier drives a multi-round exchange: it asks for protocol
//! capabilities, agrees on a measurement algorithm, asks for TPM details and
//! finally requests digests of files and directories. This crate answers those
//! requests for one or more concurrent connections.
//!
//! # Architecture
//!
//! Each inbound PA-TNC message runs through three stages:
//!
//! ```text
//! bytes ──decode──> PaTncMessage ──dispatch──> ConnectionState ──build──> reply
//!                                   │                             │
//!                                   └─ peer error: stop, no reply └─ MeasurementCollector
//! ```
//!
//! The per-connection logic in [`connection`] is I/O-free apart from reading
//! the files it is asked to measure: it returns [`connection::ImcAction`]s and
//! the [`agent::ImcAgent`] executes them against a [`transport::Transport`].
//!
//! # Components
//!
//! - [`connection`]: per-connection state and handshake phases
//! - [`dispatch`]: inbound attribute classification and phase transitions
//! - [`response`]: reply construction for the current phase
//! - [`measurement`]: file and directory digests
//! - [`algorithm`]: digest algorithms and negotiation order
//! - [`agent`]: connection table and action execution
//! - [`host`]: plugin lifecycle shell with IF-IMC result codes
//! - [`transport`]: outbound message delivery
//! - [`config`]: local capabilities and limits
//! - [`error`]: error types

pub mod agent;
pub mod algorithm;
pub mod config;
pub mod connection;
pub mod dispatch;
pub mod error;
pub mod host;
pub mod measurement;
pub mod response;
pub mod tnc;
pub mod transport;

pub use agent::ImcAgent;
pub use algorithm::HashAlgorithm;
pub use config::ImcConfig;
pub use connection::{ConnectionState, ImcAction, MeasurementRequest, Phase, UnsupportedPhase};
pub use error::{ImcError, MeasurementError};
pub use host::ImcHost;
pub use measurement::{FileMeasurement, MeasurementCollector};
pub use tnc::{ConnectionId, ImcId, TncConnectionState, TncResult};
pub use transport::{Transport, TransportError};
