//! The daemon capability boundary: one round trip per accumulated batch.
//!
//! The wire encoding belongs to the daemon; this crate only needs the
//! capability `call(batch) -> parallel results`. Concrete transports plug in
//! behind the [`Transport`] trait, the same way the upstream engine hides its
//! native session behind a command channel.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use crate::error::{ProtoError, ProtoResult};

/// One named remote call within a batch.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MethodCall {
    /// Raw daemon method name.
    pub method: String,
    /// Positional arguments.
    pub args: Vec<Value>,
}

impl MethodCall {
    /// Construct a call from a method name and positional arguments.
    #[must_use]
    pub fn new(method: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            method: method.into(),
            args,
        }
    }
}

/// Capability boundary to the external daemon.
///
/// Implementations must return a result array positionally parallel to the
/// submitted batch, or a single error covering the whole round trip.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute one batch round trip.
    async fn call(&self, batch: &[MethodCall]) -> ProtoResult<Vec<Value>>;
}

/// A batch forwarded over the channel transport, carrying its reply slot.
pub struct TransportRequest {
    /// The accumulated batch.
    pub batch: Vec<MethodCall>,
    /// One-shot reply channel; dropping it fails the request.
    pub reply: oneshot::Sender<ProtoResult<Vec<Value>>>,
}

/// Transport that forwards batches to an in-process bridge task over a
/// bounded channel. Tests and embedders drain the receiver side.
#[derive(Clone)]
pub struct ChannelTransport {
    sender: mpsc::Sender<TransportRequest>,
}

impl ChannelTransport {
    /// Create a transport and the receiver its bridge task drains.
    #[must_use]
    pub fn pair(buffer: usize) -> (Self, mpsc::Receiver<TransportRequest>) {
        let (sender, receiver) = mpsc::channel(buffer);
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn call(&self, batch: &[MethodCall]) -> ProtoResult<Vec<Value>> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(TransportRequest {
                batch: batch.to_vec(),
                reply,
            })
            .await
            .map_err(|_| ProtoError::Unavailable)?;
        response.await.map_err(|_| ProtoError::Unavailable)?
    }
}

struct UnconnectedTransport;

#[async_trait]
impl Transport for UnconnectedTransport {
    async fn call(&self, _batch: &[MethodCall]) -> ProtoResult<Vec<Value>> {
        Err(ProtoError::Unavailable)
    }
}

/// Transport used when no daemon bridge has been wired; every batch fails
/// with [`ProtoError::Unavailable`] and surfaces as a 503 at the API.
#[must_use]
pub fn unconnected() -> Arc<dyn Transport> {
    Arc::new(UnconnectedTransport)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn channel_transport_round_trips_batches() -> ProtoResult<()> {
        let (transport, mut receiver) = ChannelTransport::pair(4);

        let bridge = tokio::spawn(async move {
            while let Some(request) = receiver.recv().await {
                let echoed = request
                    .batch
                    .iter()
                    .map(|call| json!(call.method))
                    .collect();
                let _ = request.reply.send(Ok(echoed));
            }
        });

        let batch = vec![
            MethodCall::new("d.stop", vec![json!("HASH")]),
            MethodCall::new("d.close", vec![json!("HASH")]),
        ];
        let results = transport.call(&batch).await?;
        assert_eq!(results, vec![json!("d.stop"), json!("d.close")]);

        drop(transport);
        bridge.await.expect("bridge task");
        Ok(())
    }

    #[tokio::test]
    async fn dropped_bridge_reports_unavailable() {
        let (transport, receiver) = ChannelTransport::pair(1);
        drop(receiver);

        let batch = vec![MethodCall::new("d.stop", vec![])];
        let error = transport.call(&batch).await.expect_err("no bridge");
        assert!(matches!(error, ProtoError::Unavailable));
    }

    #[tokio::test]
    async fn unconnected_transport_always_fails() {
        let transport = unconnected();
        let error = transport.call(&[]).await.expect_err("unconnected");
        assert!(matches!(error, ProtoError::Unavailable));
    }
}
