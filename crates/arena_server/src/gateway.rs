//! Connection gateway: the single event loop in front of the registry.
//!
//! Transport tasks never touch the registry. They push [`GatewayEvent`]s
//! through a [`GatewayHandle`], and one task runs [`Gateway::run`], which
//! handles each event to completion before taking the next. Outbound
//! messages go back through the per-connection channel registered on
//! connect.

use crate::error::SessionError;
use crate::identity::ConnectionId;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::registry::{Dispatch, SessionRegistry};
use derive_more::{Display, Error};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Something that happened on a connection.
#[derive(Debug)]
pub enum GatewayEvent {
    /// A connection opened; `outbound` receives its messages.
    Connected {
        /// New connection.
        conn: ConnectionId,
        /// Sender half of the connection's outbound queue.
        outbound: mpsc::UnboundedSender<ServerMessage>,
    },
    /// A client frame arrived.
    Inbound {
        /// Sender.
        conn: ConnectionId,
        /// Parsed frame.
        message: ClientMessage,
    },
    /// The connection closed or failed.
    Disconnected {
        /// The lost connection.
        conn: ConnectionId,
    },
}

/// Gateway error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Gateway error: {} at {}:{}", message, file, line)]
pub struct GatewayError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl GatewayError {
    /// Creates a new gateway error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

/// Owns the registry and the outbound side of every connection.
#[derive(Debug)]
pub struct Gateway {
    registry: SessionRegistry,
    connections: HashMap<ConnectionId, mpsc::UnboundedSender<ServerMessage>>,
}

impl Gateway {
    /// Wraps a registry.
    #[instrument(skip(registry))]
    pub fn new(registry: SessionRegistry) -> Self {
        info!("Creating connection gateway");
        Self {
            registry,
            connections: HashMap::new(),
        }
    }

    /// Returns the registry.
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Number of open connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Starts the event loop on its own task.
    pub fn spawn(self) -> (GatewayHandle, JoinHandle<Self>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = GatewayHandle {
            events: tx,
            next_conn: Arc::new(AtomicU64::new(1)),
        };
        let task = tokio::spawn(self.run(rx));
        (handle, task)
    }

    /// Handles events until every [`GatewayHandle`] is dropped, then
    /// returns the gateway.
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<GatewayEvent>) -> Self {
        info!("Gateway event loop started");
        while let Some(event) = events.recv().await {
            self.handle(event);
        }
        info!("Gateway event loop stopped");
        self
    }

    /// Processes one event to completion.
    #[instrument(skip(self, event))]
    pub fn handle(&mut self, event: GatewayEvent) {
        match event {
            GatewayEvent::Connected { conn, outbound } => {
                info!(conn = %conn, "Player connected");
                self.connections.insert(conn, outbound);
            }
            GatewayEvent::Inbound { conn, message } => {
                debug!(conn = %conn, ?message, "Inbound event");
                match self.route(conn, message) {
                    Ok(dispatches) => self.deliver(dispatches),
                    Err(e) => {
                        warn!(conn = %conn, error = %e, "Request rejected");
                        self.deliver(vec![Dispatch::new(conn, ServerMessage::error(e.to_string()))]);
                    }
                }
            }
            GatewayEvent::Disconnected { conn } => {
                info!(conn = %conn, "Player disconnected");
                self.connections.remove(&conn);
                let dispatches = self.registry.disconnect(conn);
                self.deliver(dispatches);
            }
        }
    }

    fn route(&mut self, conn: ConnectionId, message: ClientMessage) -> Result<Vec<Dispatch>, SessionError> {
        match message {
            ClientMessage::JoinQueue(request) => {
                let request = request.unwrap_or_default();
                self.registry.join_queue(conn, request.profile)
            }
            ClientMessage::PlayComputer(request) => {
                let request = request.unwrap_or_default();
                self.registry.play_computer(conn, request.profile, request.mark)
            }
            ClientMessage::MakeMove { room_id, index } => {
                self.registry.make_move(conn, &room_id, index)
            }
            ClientMessage::ResetGame => self.registry.reset(conn),
            ClientMessage::LeaveGame => Ok(self.registry.leave(conn)),
            ClientMessage::LeaveQueue => Ok(self.registry.leave_queue(conn)),
        }
    }

    fn deliver(&self, dispatches: Vec<Dispatch>) {
        for Dispatch { to, message } in dispatches {
            match self.connections.get(&to) {
                Some(outbound) => {
                    if outbound.send(message).is_err() {
                        debug!(conn = %to, "Outbound channel closed, dropping message");
                    }
                }
                None => debug!(conn = %to, "No connection for dispatch"),
            }
        }
    }
}

/// Cloneable entry point for transport tasks.
#[derive(Debug, Clone)]
pub struct GatewayHandle {
    events: mpsc::UnboundedSender<GatewayEvent>,
    next_conn: Arc<AtomicU64>,
}

impl GatewayHandle {
    /// Registers a new connection and returns its id and outbound queue.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] if the event loop has stopped.
    #[instrument(skip(self))]
    pub fn connect(
        &self,
    ) -> Result<(ConnectionId, mpsc::UnboundedReceiver<ServerMessage>), GatewayError> {
        let conn = ConnectionId::new(self.next_conn.fetch_add(1, Ordering::Relaxed));
        let (outbound, rx) = mpsc::unbounded_channel();
        self.push(GatewayEvent::Connected { conn, outbound })?;
        Ok((conn, rx))
    }

    /// Forwards a client frame.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] if the event loop has stopped.
    pub fn send(&self, conn: ConnectionId, message: ClientMessage) -> Result<(), GatewayError> {
        self.push(GatewayEvent::Inbound { conn, message })
    }

    /// Reports a closed connection.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] if the event loop has stopped.
    pub fn disconnect(&self, conn: ConnectionId) -> Result<(), GatewayError> {
        self.push(GatewayEvent::Disconnected { conn })
    }

    fn push(&self, event: GatewayEvent) -> Result<(), GatewayError> {
        self.events
            .send(event)
            .map_err(|_| GatewayError::new("Gateway event loop has stopped"))
    }
}
