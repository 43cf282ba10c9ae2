//! World state after a scenario run.

use std::sync::Arc;

use pts_imc::{ConnectionId, ConnectionState, ImcAgent, ImcError};
use pts_proto::PaTncMessage;

use crate::memory_transport::MemoryTransport;

/// Result of one scripted message.
#[derive(Debug)]
pub struct StepOutcome {
    /// Connection the message was sent on.
    pub connection_id: ConnectionId,
    /// What the agent returned.
    pub result: Result<(), ImcError>,
}

/// The agent, its transport and every step outcome.
pub struct World {
    agent: ImcAgent,
    transport: Arc<MemoryTransport>,
    outcomes: Vec<StepOutcome>,
}

impl World {
    pub(crate) fn new(agent: ImcAgent, transport: Arc<MemoryTransport>) -> Self {
        Self { agent, transport, outcomes: Vec::new() }
    }

    pub(crate) fn record(&mut self, outcome: StepOutcome) {
        self.outcomes.push(outcome);
    }

    /// The agent under test.
    pub fn agent(&self) -> &ImcAgent {
        &self.agent
    }

    /// Snapshot of a connection's state.
    pub fn state(&self, connection_id: ConnectionId) -> Option<ConnectionState> {
        self.agent.state(connection_id)
    }

    /// Outcomes in script order.
    pub fn outcomes(&self) -> &[StepOutcome] {
        &self.outcomes
    }

    /// Outcome of the `index`-th scripted message.
    pub fn outcome(&self, index: usize) -> Option<&StepOutcome> {
        self.outcomes.get(index)
    }

    /// Number of replies delivered on a connection.
    pub fn messages_sent(&self, connection_id: ConnectionId) -> usize {
        self.transport.sent_to(connection_id).len()
    }

    /// Decoded replies delivered on a connection, oldest first.
    pub fn replies(&self, connection_id: ConnectionId) -> Result<Vec<PaTncMessage>, String> {
        self.transport
            .sent_to(connection_id)
            .into_iter()
            .map(|bytes| {
                PaTncMessage::decode(bytes)
                    .map_err(|e| format!("connection {connection_id}: undecodable reply: {e}"))
            })
            .collect()
    }

    /// The most recent reply on a connection.
    pub fn last_reply(&self, connection_id: ConnectionId) -> Result<PaTncMessage, String> {
        self.replies(connection_id)?
            .pop()
            .ok_or_else(|| format!("connection {connection_id}: no reply sent"))
    }
}
