//! Internal ↔ raw daemon setting identifiers and unit transforms.
//!
//! Internal identifiers are the stable names the API speaks; raw names are
//! what the daemon understands. Bandwidth ceilings travel as KiB/s
//! internally but bytes/s on the wire, and the piece cache as MiB internally
//! but bytes on the wire, so values cross the boundary through
//! [`to_internal_value`] (outbound, divide) and [`to_raw_value`] (inbound,
//! multiply).

use serde_json::Value;

/// Every supported setting as an `(internal, raw)` pair.
pub const SETTINGS: &[(&str, &str)] = &[
    ("dht_mode", "dht.mode"),
    ("dht_port", "dht.port"),
    ("directory_default", "directory.default"),
    ("network_http_max_open", "network.http.max_open"),
    ("network_local_address", "network.local_address"),
    ("network_max_open_files", "network.max_open_files"),
    ("network_port_open", "network.port_open"),
    ("network_port_random", "network.port_random"),
    ("network_port_range", "network.port_range"),
    ("pieces_hash_on_completion", "pieces.hash.on_completion"),
    ("pieces_memory_max", "pieces.memory.max"),
    ("protocol_pex", "protocol.pex"),
    ("throttle_global_down_max", "throttle.global_down.max_rate"),
    ("throttle_global_up_max", "throttle.global_up.max_rate"),
    ("throttle_max_downloads_global", "throttle.max_downloads.global"),
    ("throttle_max_peers_normal", "throttle.max_peers.normal"),
    ("throttle_max_peers_seed", "throttle.max_peers.seed"),
    ("throttle_max_uploads_global", "throttle.max_uploads.global"),
    ("throttle_min_peers_normal", "throttle.min_peers.normal"),
    ("throttle_min_peers_seed", "throttle.min_peers.seed"),
    ("trackers_num_want", "trackers.numwant"),
];

/// Multiplier applied when a value travels toward the daemon.
const SCALES: &[(&str, u64)] = &[
    ("throttle_global_down_max", 1024),
    ("throttle_global_up_max", 1024),
    ("pieces_memory_max", 1024 * 1024),
];

/// Raw daemon name for an internal identifier.
#[must_use]
pub fn raw_for(internal: &str) -> Option<&'static str> {
    SETTINGS
        .iter()
        .find(|(id, _)| *id == internal)
        .map(|(_, raw)| *raw)
}

/// Internal identifier for a raw daemon name.
#[must_use]
pub fn internal_for(raw: &str) -> Option<&'static str> {
    SETTINGS
        .iter()
        .find(|(_, name)| *name == raw)
        .map(|(id, _)| *id)
}

/// Every internal identifier, in table order.
#[must_use]
pub fn internal_ids() -> Vec<&'static str> {
    SETTINGS.iter().map(|(id, _)| *id).collect()
}

/// Raw getter methods for the given internal identifiers, skipping unknown
/// ids. Order follows the input so results stay positionally parallel.
#[must_use]
pub fn getter_methods(internal: &[&str]) -> Vec<String> {
    internal
        .iter()
        .filter_map(|id| raw_for(id))
        .map(str::to_owned)
        .collect()
}

fn scale_for(internal: &str) -> Option<u64> {
    SCALES
        .iter()
        .find(|(id, _)| *id == internal)
        .map(|(_, scale)| *scale)
}

/// Convert a daemon value to its internal unit (outbound, divide).
///
/// Non-numeric values and unscaled settings pass through unchanged.
#[must_use]
pub fn to_internal_value(internal: &str, raw_value: Value) -> Value {
    match (scale_for(internal), raw_value.as_u64()) {
        (Some(scale), Some(number)) => Value::from(number / scale),
        _ => raw_value,
    }
}

/// Convert an internal value to its daemon unit (inbound, multiply).
///
/// Non-numeric values and unscaled settings pass through unchanged.
#[must_use]
pub fn to_raw_value(internal: &str, value: Value) -> Value {
    match (scale_for(internal), value.as_u64()) {
        (Some(scale), Some(number)) => Value::from(number * scale),
        _ => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_mapping_is_symmetric() {
        for (internal, raw) in SETTINGS {
            assert_eq!(raw_for(internal), Some(*raw));
            assert_eq!(internal_for(raw), Some(*internal));
        }
        assert_eq!(SETTINGS.len(), internal_ids().len());
    }

    #[test]
    fn every_transform_round_trips() {
        for (internal, _) in SETTINGS {
            let raw = json!(5 * 1024 * 1024_u64);
            let there = to_internal_value(internal, raw.clone());
            let back = to_raw_value(internal, there);
            assert_eq!(back, raw, "{internal} must round-trip");
        }
    }

    #[test]
    fn bandwidth_values_travel_as_kib() {
        assert_eq!(
            to_internal_value("throttle_global_down_max", json!(2048)),
            json!(2)
        );
        assert_eq!(
            to_raw_value("throttle_global_up_max", json!(500)),
            json!(512_000)
        );
    }

    #[test]
    fn memory_values_travel_as_mib() {
        assert_eq!(
            to_internal_value("pieces_memory_max", json!(1_073_741_824_u64)),
            json!(1024)
        );
        assert_eq!(
            to_raw_value("pieces_memory_max", json!(1)),
            json!(1_048_576)
        );
    }

    #[test]
    fn unscaled_and_non_numeric_values_pass_through() {
        assert_eq!(
            to_internal_value("directory_default", json!("/downloads")),
            json!("/downloads")
        );
        assert_eq!(to_raw_value("dht_port", json!(6881)), json!(6881));
        assert_eq!(
            to_raw_value("throttle_global_down_max", json!("fast")),
            json!("fast")
        );
    }

    #[test]
    fn unknown_identifiers_are_skipped() {
        assert_eq!(raw_for("no_such_setting"), None);
        assert_eq!(internal_for("no.such.setting"), None);
        let methods = getter_methods(&["dht_port", "no_such_setting"]);
        assert_eq!(methods, vec!["dht.port".to_owned()]);
    }
}
