//! Router construction for the API.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    http::{HeaderName, Method, Request, header::CONTENT_TYPE},
    routing::{delete, get, patch, post},
};
use rudder_telemetry::build_sha;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::Span;

use crate::http::downloads::download;
use crate::http::feeds::{add_feed, list_feeds, remove_feed};
use crate::http::health::health;
use crate::http::history::get_history;
use crate::http::notifications::{
    clear_notifications, list_notifications, mark_notifications_read,
};
use crate::http::settings::{get_preferences, get_settings, patch_settings, set_speed_limit};
use crate::http::sse::stream_events;
use crate::http::torrents::{
    add_files, add_urls, call_method, check_hash, get_taxonomy, get_torrent, list_torrents,
    move_torrents, set_file_priority, set_priority, set_taxonomy, start_torrents, stop_torrents,
};
use crate::http::users::destroy_user;
use crate::state::{ApiState, HEADER_USER};

const HEADER_REQUEST_ID: &str = "x-request-id";
const HEADER_LAST_EVENT_ID: &str = "last-event-id";

/// Build the full API router over shared state.
#[must_use]
pub fn build_router(state: Arc<ApiState>) -> Router {
    let cors_layer = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            CONTENT_TYPE,
            HeaderName::from_static(HEADER_USER),
            HeaderName::from_static(HEADER_LAST_EVENT_ID),
        ]);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<_>| {
            let request_id = request
                .headers()
                .get(HEADER_REQUEST_ID)
                .and_then(|value| value.to_str().ok())
                .unwrap_or("")
                .to_string();
            tracing::info_span!(
                "http.request",
                method = %request.method(),
                route = %request.uri().path(),
                request_id = %request_id,
                build_sha = %build_sha(),
                status_code = tracing::field::Empty,
                latency_ms = tracing::field::Empty
            )
        })
        .on_response(
            |response: &axum::response::Response, latency: Duration, span: &Span| {
                span.record("status_code", response.status().as_u16());
                let latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
                span.record("latency_ms", latency_ms);
            },
        );

    let layered = ServiceBuilder::new()
        .layer(rudder_telemetry::propagate_request_id_layer())
        .layer(rudder_telemetry::set_request_id_layer())
        .layer(trace_layer);

    Router::new()
        .route("/health", get(health))
        .route("/api/torrents", get(list_torrents))
        .route("/api/torrents/add-files", post(add_files))
        .route("/api/torrents/add-urls", post(add_urls))
        .route("/api/torrents/start", post(start_torrents))
        .route("/api/torrents/stop", post(stop_torrents))
        .route("/api/torrents/check-hash", post(check_hash))
        .route("/api/torrents/move", post(move_torrents))
        .route("/api/torrents/priority", post(set_priority))
        .route("/api/torrents/file-priority", post(set_file_priority))
        .route("/api/torrents/taxonomy", patch(set_taxonomy))
        .route("/api/torrents/{hash}", get(get_torrent))
        .route("/api/torrents/{hash}/download", get(download))
        .route("/api/taxonomy", get(get_taxonomy))
        .route("/api/settings", get(get_settings).patch(patch_settings))
        .route("/api/settings/speed-limit", post(set_speed_limit))
        .route("/api/preferences", get(get_preferences))
        .route(
            "/api/notifications",
            get(list_notifications).delete(clear_notifications),
        )
        .route("/api/notifications/mark-read", post(mark_notifications_read))
        .route("/api/history", get(get_history))
        .route("/api/feeds", get(list_feeds).post(add_feed))
        .route("/api/feeds/{id}", delete(remove_feed))
        .route("/api/users/{user}", delete(destroy_user))
        .route("/api/events", get(stream_events))
        .route("/api/methods", post(call_method))
        .layer(cors_layer)
        .route_layer(layered)
        .with_state(state)
}
