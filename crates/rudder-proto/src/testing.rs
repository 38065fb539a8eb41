//! Scripted transport for exercising dispatch logic without a daemon.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{ProtoError, ProtoResult};
use crate::transport::{MethodCall, Transport};

/// Transport that replays queued responses and records every sent batch.
///
/// Each call pops the next scripted outcome; an exhausted script fails with
/// [`ProtoError::Unavailable`] so tests never hang on a missing expectation.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<ProtoResult<Vec<Value>>>>,
    sent: Mutex<Vec<Vec<MethodCall>>>,
}

impl ScriptedTransport {
    /// Queue a successful result array for the next batch.
    pub fn push_ok(&self, results: Vec<Value>) {
        self.script
            .lock()
            .expect("script lock")
            .push_back(Ok(results));
    }

    /// Queue a failure for the next batch.
    pub fn push_err(&self, error: ProtoError) {
        self.script
            .lock()
            .expect("script lock")
            .push_back(Err(error));
    }

    /// Every batch sent so far, in order.
    #[must_use]
    pub fn sent(&self) -> Vec<Vec<MethodCall>> {
        self.sent.lock().expect("sent lock").clone()
    }

    /// Method names of every call across all sent batches, flattened.
    #[must_use]
    pub fn sent_methods(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .flatten()
            .map(|call| call.method)
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn call(&self, batch: &[MethodCall]) -> ProtoResult<Vec<Value>> {
        self.sent.lock().expect("sent lock").push(batch.to_vec());
        self.script
            .lock()
            .expect("script lock")
            .pop_front()
            .unwrap_or(Err(ProtoError::Unavailable))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn replays_in_order_and_records_batches() -> ProtoResult<()> {
        let transport = ScriptedTransport::default();
        transport.push_ok(vec![json!(1)]);
        transport.push_ok(vec![json!(2)]);

        let first = transport
            .call(&[MethodCall::new("d.stop", vec![])])
            .await?;
        let second = transport
            .call(&[MethodCall::new("d.start", vec![])])
            .await?;
        assert_eq!(first, vec![json!(1)]);
        assert_eq!(second, vec![json!(2)]);
        assert_eq!(transport.sent_methods(), vec!["d.stop", "d.start"]);
        Ok(())
    }

    #[tokio::test]
    async fn exhausted_script_fails_closed() {
        let transport = ScriptedTransport::default();
        let error = transport
            .call(&[MethodCall::new("d.stop", vec![])])
            .await
            .expect_err("no script");
        assert!(matches!(error, ProtoError::Unavailable));
    }
}
