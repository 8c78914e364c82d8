/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 25/8/26
******************************************************************************/

//! In-memory duplex transport.
//!
//! Each `open` call yields a client [`Connection`] wired by channel to a
//! [`RemoteEnd`] handed to the test, which plays the remote endpoint:
//! it reads the frames the session sends and scripts the frames the session
//! receives.

use crate::connector::{Connection, Connector};
use async_trait::async_trait;
use irongate_core::error::TransportError;
use serde_json::Value;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::mpsc;
use tracing::debug;

/// Connector producing paired in-memory connections.
pub struct MemoryConnector {
    accepted: mpsc::UnboundedSender<RemoteEnd>,
    fail_remaining: AtomicU32,
}

impl MemoryConnector {
    /// Creates a connector and the receiver on which each accepted
    /// [`RemoteEnd`] is delivered, one per `open` call.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<RemoteEnd>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                accepted: tx,
                fail_remaining: AtomicU32::new(0),
            },
            rx,
        )
    }

    /// Makes the next `n` open attempts fail with a connect error, to
    /// exercise retry paths.
    pub fn fail_next(&self, n: u32) {
        self.fail_remaining.store(n, Ordering::SeqCst);
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn open(&self, endpoint: &str) -> Result<Box<dyn Connection>, TransportError> {
        if self
            .fail_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(TransportError::ConnectFailed {
                endpoint: endpoint.to_string(),
                reason: "scripted failure".to_string(),
            });
        }

        let (to_remote, from_client) = mpsc::unbounded_channel();
        let (to_client, from_remote) = mpsc::unbounded_channel();

        let remote = RemoteEnd {
            inbound: from_client,
            outbound: to_client,
        };
        self.accepted
            .send(remote)
            .map_err(|_| TransportError::ConnectFailed {
                endpoint: endpoint.to_string(),
                reason: "no acceptor".to_string(),
            })?;

        debug!(endpoint, "opened in-memory connection");
        Ok(Box::new(MemoryConnection {
            outbound: Some(to_remote),
            inbound: from_remote,
        }))
    }
}

struct MemoryConnection {
    outbound: Option<mpsc::UnboundedSender<Value>>,
    inbound: mpsc::UnboundedReceiver<Value>,
}

#[async_trait]
impl Connection for MemoryConnection {
    async fn send(&mut self, frame: Value) -> Result<(), TransportError> {
        self.outbound
            .as_ref()
            .ok_or(TransportError::SendClosed)?
            .send(frame)
            .map_err(|_| TransportError::SendClosed)
    }

    async fn recv(&mut self) -> Option<Value> {
        self.inbound.recv().await
    }

    async fn close(&mut self) {
        // Dropping the sender ends the remote's inbound stream.
        self.outbound = None;
        self.inbound.close();
    }
}

/// The remote side of an in-memory connection.
pub struct RemoteEnd {
    inbound: mpsc::UnboundedReceiver<Value>,
    outbound: mpsc::UnboundedSender<Value>,
}

impl RemoteEnd {
    /// Delivers a frame to the session under test.
    pub fn send(&self, frame: Value) {
        // Ignore a closed client; tests assert on observed frames instead.
        let _ = self.outbound.send(frame);
    }

    /// Receives the next frame the session sent, or `None` once the session
    /// closed its side.
    pub async fn recv(&mut self) -> Option<Value> {
        self.inbound.recv().await
    }

    /// Receives without waiting.
    pub fn try_recv(&mut self) -> Option<Value> {
        self.inbound.try_recv().ok()
    }

    /// Drops the sending half, simulating a remote close.
    pub fn close(self) {}
}
