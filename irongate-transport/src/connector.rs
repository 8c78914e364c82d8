/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 25/8/26
******************************************************************************/

//! Transport connector traits.

use async_trait::async_trait;
use irongate_core::error::TransportError;
use serde_json::Value;

/// An established bidirectional message channel to the remote endpoint.
///
/// Frames are generic property maps; the byte-to-map parser sits inside the
/// transport implementation. A connection is owned by exactly one session
/// task, which serializes all sends.
#[async_trait]
pub trait Connection: Send {
    /// Sends one frame to the remote.
    ///
    /// # Errors
    /// Returns [`TransportError::SendClosed`] if the channel is closed.
    async fn send(&mut self, frame: Value) -> Result<(), TransportError>;

    /// Receives the next inbound frame.
    ///
    /// Returns `None` when the remote has closed the channel.
    async fn recv(&mut self) -> Option<Value>;

    /// Closes the channel. Idempotent; no sends may follow.
    async fn close(&mut self);
}

/// Opens connections to a gateway endpoint.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Opens a new connection.
    ///
    /// # Arguments
    /// * `endpoint` - The gateway endpoint to connect to
    ///
    /// # Errors
    /// Returns [`TransportError::ConnectFailed`] on network failure.
    async fn open(&self, endpoint: &str) -> Result<Box<dyn Connection>, TransportError>;
}
