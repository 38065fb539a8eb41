//! Single-use batch request: accumulate named operations, send once.

use serde_json::{Value, json};
use tracing::debug;

use crate::error::{ProtoError, ProtoResult};
use crate::transport::{MethodCall, Transport};

/// Properties requested for every torrent list row, in zip order.
pub const TORRENT_LIST_PROPS: &[&str] = &[
    "d.hash=",
    "d.name=",
    "d.directory=",
    "d.is_open=",
    "d.is_active=",
    "d.complete=",
    "d.message=",
    "d.size_bytes=",
    "d.completed_bytes=",
    "d.down.rate=",
    "d.up.rate=",
    "d.custom1=",
];

/// File properties requested for torrent details, in zip order.
pub const FILE_PROPS: &[&str] = &["f.path=", "f.size_bytes="];

/// Peer properties requested for torrent details, in zip order.
pub const PEER_PROPS: &[&str] = &[
    "p.address=",
    "p.client_version=",
    "p.down_rate=",
    "p.up_rate=",
];

/// Tracker properties requested for torrent details, in zip order.
pub const TRACKER_PROPS: &[&str] = &["t.url=", "t.is_enabled="];

type PostProcess = Box<dyn FnOnce(Value) -> Option<Value> + Send>;

/// An ephemeral batch of remote calls with an optional response transform.
///
/// Operations accumulate method calls; [`Request::send`] consumes the request,
/// makes exactly one round trip for everything accumulated, and yields exactly
/// one outcome. A request therefore cannot be sent twice, and its result is
/// observed exactly once, with either a response or an error, never both.
#[derive(Default)]
pub struct Request {
    calls: Vec<MethodCall>,
    post_process: Option<PostProcess>,
}

impl Request {
    /// Start an empty request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of method calls accumulated so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// Whether no operations have been accumulated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Register a transform applied to the raw response array before the
    /// caller sees it. Returning `None` yields `Value::Null`.
    pub fn post_process<F>(&mut self, transform: F) -> &mut Self
    where
        F: FnOnce(Value) -> Option<Value> + Send + 'static,
    {
        self.post_process = Some(Box::new(transform));
        self
    }

    /// Push a raw method call. Typed helpers below should be preferred.
    pub fn push(&mut self, call: MethodCall) -> &mut Self {
        self.calls.push(call);
        self
    }

    /// Create a destination directory on the daemon host.
    pub fn create_directory(&mut self, path: &str) -> &mut Self {
        self.push(MethodCall::new(
            "execute2",
            vec![json!(""), json!("mkdir"), json!("-p"), json!(path)],
        ))
    }

    /// Load one uploaded metainfo payload (base64), optionally started, with
    /// destination and tag commands attached to the load call.
    pub fn add_file(
        &mut self,
        content_b64: &str,
        destination: &str,
        is_base_path: bool,
        start: bool,
        tags: &[String],
    ) -> &mut Self {
        let method = if start { "load.raw_start" } else { "load.raw" };
        let mut args = vec![json!(""), json!(content_b64)];
        args.push(json!(directory_command(destination, is_base_path)));
        args.push(json!(format!("d.custom1.set={}", tags.join(","))));
        self.push(MethodCall::new(method, args))
    }

    /// Load torrents by URL or magnet link, optionally started.
    pub fn add_urls(
        &mut self,
        urls: &[String],
        destination: &str,
        is_base_path: bool,
        start: bool,
        tags: &[String],
    ) -> &mut Self {
        let method = if start { "load.start" } else { "load.normal" };
        for url in urls {
            let args = vec![
                json!(""),
                json!(url),
                json!(directory_command(destination, is_base_path)),
                json!(format!("d.custom1.set={}", tags.join(","))),
            ];
            self.push(MethodCall::new(method, args));
        }
        self
    }

    /// Stop and close every listed torrent.
    pub fn stop_torrents(&mut self, hashes: &[String]) -> &mut Self {
        for hash in hashes {
            self.push(MethodCall::new("d.stop", vec![json!(hash)]));
            self.push(MethodCall::new("d.close", vec![json!(hash)]));
        }
        self
    }

    /// Open and start every listed torrent.
    pub fn start_torrents(&mut self, hashes: &[String]) -> &mut Self {
        for hash in hashes {
            self.push(MethodCall::new("d.open", vec![json!(hash)]));
            self.push(MethodCall::new("d.start", vec![json!(hash)]));
        }
        self
    }

    /// Re-verify on-disk data for every listed torrent.
    pub fn check_hash(&mut self, hashes: &[String]) -> &mut Self {
        for hash in hashes {
            self.push(MethodCall::new("d.check_hash", vec![json!(hash)]));
        }
        self
    }

    /// Point every listed torrent at a new storage directory.
    pub fn set_download_path(
        &mut self,
        hashes: &[String],
        path: &str,
        is_base_path: bool,
    ) -> &mut Self {
        let method = if is_base_path {
            "d.directory_base.set"
        } else {
            "d.directory.set"
        };
        for hash in hashes {
            self.push(MethodCall::new(method, vec![json!(hash), json!(path)]));
        }
        self
    }

    /// Move payload data on the daemon host's filesystem.
    pub fn move_files(&mut self, filenames: &[String], sources: &[String], destination: &str) -> &mut Self {
        for (filename, source) in filenames.iter().zip(sources) {
            self.push(MethodCall::new(
                "execute2",
                vec![
                    json!(""),
                    json!("mv"),
                    json!("-n"),
                    json!(format!("{source}/{filename}")),
                    json!(destination),
                ],
            ));
        }
        self
    }

    /// Set the scheduling priority of every listed torrent.
    pub fn set_priority(&mut self, hashes: &[String], level: u8) -> &mut Self {
        for hash in hashes {
            self.push(MethodCall::new(
                "d.priority.set",
                vec![json!(hash), json!(level)],
            ));
            self.push(MethodCall::new("d.update_priorities", vec![json!(hash)]));
        }
        self
    }

    /// Set per-file priorities within one torrent.
    pub fn set_file_priority(&mut self, hash: &str, indices: &[u32], level: u8) -> &mut Self {
        for index in indices {
            self.push(MethodCall::new(
                "f.priority.set",
                vec![json!(hash), json!(index), json!(level)],
            ));
        }
        self.push(MethodCall::new("d.update_priorities", vec![json!(hash)]))
    }

    /// Replace the tag set of every listed torrent.
    pub fn set_taxonomy(&mut self, hashes: &[String], tags: &[String]) -> &mut Self {
        let joined = tags.join(",");
        for hash in hashes {
            self.push(MethodCall::new(
                "d.custom1.set",
                vec![json!(hash), json!(joined)],
            ));
        }
        self
    }

    /// Fetch one raw getter per listed method name, in order.
    pub fn fetch_settings(&mut self, raw_methods: &[String]) -> &mut Self {
        for method in raw_methods {
            self.push(MethodCall::new(method.clone(), vec![json!("")]));
        }
        self
    }

    /// Apply one raw setter with its already-transformed value.
    pub fn set_setting(&mut self, raw_method: &str, value: &Value) -> &mut Self {
        self.push(MethodCall::new(
            format!("{raw_method}.set"),
            vec![json!(""), value.clone()],
        ))
    }

    /// Set a global transfer-rate ceiling, value in bytes per second.
    pub fn set_throttle(&mut self, direction: ThrottleDirection, bytes_per_second: u64) -> &mut Self {
        let method = match direction {
            ThrottleDirection::Download => "throttle.global_down.max_rate.set",
            ThrottleDirection::Upload => "throttle.global_up.max_rate.set",
        };
        self.push(MethodCall::new(
            method,
            vec![json!(""), json!(bytes_per_second)],
        ))
    }

    /// Fetch the full torrent list with [`TORRENT_LIST_PROPS`].
    pub fn list_torrents(&mut self) -> &mut Self {
        let mut args = vec![json!(""), json!("main")];
        args.extend(TORRENT_LIST_PROPS.iter().map(|prop| json!(prop)));
        self.push(MethodCall::new("d.multicall2", args))
    }

    /// Fetch file, peer, and tracker rows for one torrent.
    pub fn torrent_details(&mut self, hash: &str) -> &mut Self {
        let mut file_args = vec![json!(hash), json!("")];
        file_args.extend(FILE_PROPS.iter().map(|prop| json!(prop)));
        self.push(MethodCall::new("f.multicall", file_args));

        let mut peer_args = vec![json!(hash), json!("")];
        peer_args.extend(PEER_PROPS.iter().map(|prop| json!(prop)));
        self.push(MethodCall::new("p.multicall", peer_args));

        let mut tracker_args = vec![json!(hash), json!("")];
        tracker_args.extend(TRACKER_PROPS.iter().map(|prop| json!(prop)));
        self.push(MethodCall::new("t.multicall", tracker_args))
    }

    /// Passthrough daemon introspection call.
    pub fn list_methods(&mut self, method: &str, args: &[Value]) -> &mut Self {
        self.push(MethodCall::new(method, args.to_vec()))
    }

    /// Send everything accumulated in one round trip.
    ///
    /// Consuming `self` makes a second send unrepresentable, and the single
    /// `Result` return carries either the (post-processed) response or the
    /// error, never both.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoError::EmptyBatch`] when nothing was accumulated, a
    /// transport or daemon error verbatim, or [`ProtoError::ShapeMismatch`]
    /// when the result array is not parallel to the batch.
    pub async fn send(self, transport: &dyn Transport) -> ProtoResult<Value> {
        if self.calls.is_empty() {
            return Err(ProtoError::EmptyBatch);
        }

        let expected = self.calls.len();
        debug!(calls = expected, "dispatching daemon batch");
        let results = transport.call(&self.calls).await?;
        if results.len() != expected {
            return Err(ProtoError::ShapeMismatch {
                expected,
                actual: results.len(),
            });
        }

        let raw = Value::Array(results);
        let response = match self.post_process {
            Some(transform) => transform(raw).unwrap_or(Value::Null),
            None => raw,
        };
        Ok(response)
    }
}

/// Direction selector for global throttle updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThrottleDirection {
    /// Global download ceiling.
    Download,
    /// Global upload ceiling.
    Upload,
}

fn directory_command(destination: &str, is_base_path: bool) -> String {
    if is_base_path {
        format!("d.directory_base.set={destination}")
    } else {
        format!("d.directory.set={destination}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedTransport;
    use serde_json::json;

    #[tokio::test]
    async fn send_makes_exactly_one_round_trip() -> anyhow::Result<()> {
        let transport = ScriptedTransport::default();
        transport.push_ok(vec![json!(0), json!(0), json!(0), json!(0)]);

        let mut request = Request::new();
        request.stop_torrents(&["A".into()]);
        request.set_download_path(&["A".into()], "/downloads", false);
        assert_eq!(request.len(), 3);
        request.check_hash(&["A".into()]);

        let response = request.send(&transport).await?;
        assert_eq!(response, json!([0, 0, 0, 0]));

        let batches = transport.sent();
        assert_eq!(batches.len(), 1, "one send, one round trip");
        assert_eq!(batches[0].len(), 4);
        assert_eq!(batches[0][0].method, "d.stop");
        assert_eq!(batches[0][2].method, "d.directory.set");
        Ok(())
    }

    #[tokio::test]
    async fn empty_request_refuses_to_send() {
        let transport = ScriptedTransport::default();
        let error = Request::new().send(&transport).await.expect_err("empty");
        assert!(matches!(error, ProtoError::EmptyBatch));
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn post_process_transforms_the_raw_response() -> anyhow::Result<()> {
        let transport = ScriptedTransport::default();
        transport.push_ok(vec![json!(2048)]);

        let mut request = Request::new();
        request.fetch_settings(&["throttle.global_down.max_rate".into()]);
        request.post_process(|raw| {
            let first = raw.get(0)?.as_u64()?;
            Some(json!(first / 1024))
        });

        let response = request.send(&transport).await?;
        assert_eq!(response, json!(2));
        Ok(())
    }

    #[tokio::test]
    async fn post_process_none_yields_null() -> anyhow::Result<()> {
        let transport = ScriptedTransport::default();
        transport.push_ok(vec![json!(null)]);

        let mut request = Request::new();
        request.list_methods("system.listMethods", &[]);
        request.post_process(|_| None);

        let response = request.send(&transport).await?;
        assert_eq!(response, Value::Null);
        Ok(())
    }

    #[tokio::test]
    async fn daemon_error_surfaces_verbatim() {
        let transport = ScriptedTransport::default();
        transport.push_err(ProtoError::daemon("could not create download"));

        let mut request = Request::new();
        request.check_hash(&["A".into()]);
        let error = request.send(&transport).await.expect_err("daemon error");
        assert!(
            matches!(error, ProtoError::Daemon { message, .. } if message == "could not create download")
        );
    }

    #[tokio::test]
    async fn mismatched_result_shape_is_rejected() {
        let transport = ScriptedTransport::default();
        transport.push_ok(vec![json!(0)]);

        let mut request = Request::new();
        request.stop_torrents(&["A".into()]);
        let error = request.send(&transport).await.expect_err("shape");
        assert!(matches!(
            error,
            ProtoError::ShapeMismatch {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn file_priority_updates_after_each_index() {
        let mut request = Request::new();
        request.set_file_priority("A", &[0, 3], 2);
        assert_eq!(request.len(), 3);
        assert!(!request.is_empty());
    }
}
