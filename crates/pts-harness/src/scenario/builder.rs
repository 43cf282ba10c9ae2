//! Scenario builder API.

use std::{collections::HashMap, sync::Arc};

use bytes::Bytes;
use pts_imc::{ConnectionId, ImcAgent, ImcConfig};
use pts_proto::Attribute;

use crate::{
    memory_transport::MemoryTransport,
    scenario::{OracleFn, StepOutcome, World},
    verifier::Verifier,
};

const IMC_ID: u32 = 1;

enum Step {
    Send { connection_id: ConnectionId, attributes: Vec<Attribute> },
    SendRaw { connection_id: ConnectionId, message: Bytes },
    CloseTransport(ConnectionId),
}

/// Scenario builder.
///
/// Add connections and scripted messages, then call `.oracle()` to get a
/// [`RunnableScenario`].
pub struct Scenario {
    name: String,
    config: ImcConfig,
    connections: Vec<ConnectionId>,
    steps: Vec<Step>,
}

impl Scenario {
    /// Scenario with the default measurer configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: ImcConfig::default(),
            connections: Vec::new(),
            steps: Vec::new(),
        }
    }

    /// Use a custom measurer configuration.
    pub fn config(mut self, config: ImcConfig) -> Self {
        self.config = config;
        self
    }

    /// Open a connection before the script runs.
    pub fn connection(mut self, connection_id: ConnectionId) -> Self {
        self.connections.push(connection_id);
        self
    }

    /// Verifier sends a message carrying `attributes`.
    pub fn send(mut self, connection_id: ConnectionId, attributes: Vec<Attribute>) -> Self {
        self.steps.push(Step::Send { connection_id, attributes });
        self
    }

    /// Verifier sends raw bytes, well-formed or not.
    pub fn send_raw(mut self, connection_id: ConnectionId, message: impl Into<Bytes>) -> Self {
        self.steps.push(Step::SendRaw { connection_id, message: message.into() });
        self
    }

    /// Make replies on `connection_id` undeliverable from this point on.
    pub fn close_transport(mut self, connection_id: ConnectionId) -> Self {
        self.steps.push(Step::CloseTransport(connection_id));
        self
    }

    /// Set the oracle and return a runnable scenario.
    pub fn oracle(self, oracle: OracleFn) -> RunnableScenario {
        RunnableScenario { scenario: self, oracle }
    }
}

/// A scenario with an oracle that can be executed.
pub struct RunnableScenario {
    scenario: Scenario,
    oracle: OracleFn,
}

impl RunnableScenario {
    /// Execute the script and run the oracle.
    ///
    /// Errors returned by the agent are recorded in the world, not raised;
    /// only setup failures and oracle failures make the run fail.
    pub fn run(self) -> Result<(), String> {
        let Scenario { name, config, connections, steps } = self.scenario;

        let transport = Arc::new(MemoryTransport::new());
        let agent = ImcAgent::new(IMC_ID, config);
        agent.bind_transport(transport.clone());
        for connection_id in &connections {
            agent
                .create_state(*connection_id)
                .map_err(|e| format!("Scenario '{name}': cannot open {connection_id}: {e}"))?;
        }

        let mut world = World::new(agent, transport.clone());
        let mut verifiers: HashMap<ConnectionId, Verifier> = HashMap::new();

        for step in steps {
            let (connection_id, message) = match step {
                Step::CloseTransport(connection_id) => {
                    transport.close(connection_id);
                    continue;
                },
                Step::SendRaw { connection_id, message } => (connection_id, message),
                Step::Send { connection_id, attributes } => {
                    let message = verifiers
                        .entry(connection_id)
                        .or_default()
                        .request(attributes)
                        .map_err(|e| format!("Scenario '{name}': cannot encode request: {e}"))?;
                    (connection_id, message)
                },
            };

            let result = world.agent().receive_message(connection_id, message);
            tracing::debug!(scenario = %name, connection_id, ok = result.is_ok(), "step done");
            world.record(StepOutcome { connection_id, result });
        }

        (self.oracle)(&world).map_err(|e| format!("Scenario '{name}': {e}"))
    }
}
