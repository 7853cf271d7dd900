//! Relayed connection adapter
//!
//! When a counterparty is not directly reachable, the connection layer
//! obtains a byte stream through a third relay peer. This wraps that
//! stream into a connection object with the usual lifecycle surface. The
//! remote address is synthesized from the counterparty's peer id; relays
//! never learn or leak real network addresses.

use std::time::Instant;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use mixcraft_core::PeerId;

use crate::error::{NetworkError, Result};

/// A bidirectional stream reached through a relay peer
pub struct RelayedConnection<S> {
    stream: Option<S>,
    counterparty: PeerId,
    remote_address: String,
    opened_at: Instant,
}

impl<S: AsyncRead + AsyncWrite + Unpin> RelayedConnection<S> {
    pub fn new(stream: S, counterparty: PeerId) -> Self {
        Self {
            stream: Some(stream),
            counterparty,
            remote_address: format!("/mix/{counterparty}"),
            opened_at: Instant::now(),
        }
    }

    pub fn counterparty(&self) -> PeerId {
        self.counterparty
    }

    /// Synthesized address of the form `/mix/<peer id hex>`.
    pub fn remote_address(&self) -> &str {
        &self.remote_address
    }

    pub fn opened_at(&self) -> Instant {
        self.opened_at
    }

    pub fn is_closed(&self) -> bool {
        self.stream.is_none()
    }

    /// The underlying stream, until `close()` releases it.
    pub fn stream_mut(&mut self) -> Result<&mut S> {
        self.stream.as_mut().ok_or(NetworkError::ConnectionClosed)
    }

    /// Shut the stream down and release it. Safe to call repeatedly; only
    /// the first call touches the stream.
    pub async fn close(&mut self) -> Result<()> {
        let Some(mut stream) = self.stream.take() else {
            return Ok(());
        };
        debug!(counterparty = %self.counterparty, "closing relayed connection");
        stream.shutdown().await?;
        Ok(())
    }
}
