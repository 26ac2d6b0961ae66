//! Broadcast transport.
//!
//! A [`BroadcastDomain`] is one named, in-process fan-out bus. Every peer
//! joins it through a [`Channel`] and sees every frame, its own included.
//! Delivery is fire-and-forget: a receiver that falls more than the bus
//! capacity behind loses the oldest frames.

use bytes::Bytes;
use protocol::SyncMessage;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Inbound side of a channel: raw frames as published on the domain.
pub type Inbox = broadcast::Receiver<Bytes>;

/// Transport failures surfaced to the caller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("channel {0:?} is closed")]
    Closed(String),
}

/// The broadcast primitive the engine publishes to and subscribes from.
pub trait Transport: Send + Sync {
    /// Publish a message to every participant. Never blocks, never reports delivery.
    fn send(&self, message: &SyncMessage);

    /// Register the ingestion side and get the stream of inbound frames.
    fn subscribe(&self) -> Result<Inbox, TransportError>;

    /// Release the channel. Later sends are dropped, later subscribes fail.
    fn close(&self);
}

/// A named fan-out bus shared by every participant in the process.
#[derive(Debug, Clone)]
pub struct BroadcastDomain {
    name: String,
    tx: broadcast::Sender<Bytes>,
}

impl BroadcastDomain {
    /// Create a domain buffering up to `capacity` frames per receiver.
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            name: name.into(),
            tx,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Open a channel onto this domain.
    pub fn join(&self) -> Channel {
        Channel {
            domain: self.name.clone(),
            tx: self.tx.clone(),
            closed: AtomicBool::new(false),
        }
    }

    /// Listen to the raw traffic without joining as a participant.
    pub fn tap(&self) -> Inbox {
        self.tx.subscribe()
    }
}

/// One participant's handle on a [`BroadcastDomain`].
#[derive(Debug)]
pub struct Channel {
    domain: String,
    tx: broadcast::Sender<Bytes>,
    closed: AtomicBool,
}

impl Channel {
    /// Publish an already encoded frame.
    pub fn send_frame(&self, frame: Bytes) {
        if self.closed.load(Ordering::Acquire) {
            debug!("Dropping frame on closed channel {}", self.domain);
            return;
        }
        // No receivers is not an error for a broadcast.
        let _ = self.tx.send(frame);
    }
}

impl Transport for Channel {
    fn send(&self, message: &SyncMessage) {
        match message.encode() {
            Ok(frame) => self.send_frame(frame),
            Err(e) => warn!("Failed to encode {}: {}", message.kind(), e),
        }
    }

    fn subscribe(&self) -> Result<Inbox, TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed(self.domain.clone()));
        }
        Ok(self.tx.subscribe())
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!("Channel {} closed", self.domain);
        }
    }
}
