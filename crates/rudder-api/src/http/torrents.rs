//! Torrent list, mutation, and introspection handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use rudder_client::types::{AddFilesOptions, AddUrlsOptions, MoveOptions};
use rudder_core::{TorrentDetail, TorrentSummary};
use rudder_services::taxonomy::TaxonomySnapshot;

use crate::http::errors::ApiError;
use crate::models::{
    Acknowledged, FilePriorityBody, HashesBody, MethodCallBody, MoveResponse, PriorityBody,
    TaxonomyBody,
};
use crate::state::{ApiState, acting_user};

/// Serves `GET /api/torrents` by refreshing from the daemon and returning
/// the list.
pub async fn list_torrents(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<TorrentSummary>>, ApiError> {
    let user = acting_user(&headers);
    let torrents = state.registry().torrent(&user).fetch_torrent_list().await?;
    Ok(Json(torrents))
}

/// Serves `GET /api/torrents/{hash}` with the file tree, peers, and
/// trackers.
pub async fn get_torrent(
    State(state): State<Arc<ApiState>>,
    Path(hash): Path<String>,
) -> Result<Json<TorrentDetail>, ApiError> {
    Ok(Json(state.client().torrent_details(&hash).await?))
}

/// Loads uploaded metainfo payloads for `POST /api/torrents/add-files`.
pub async fn add_files(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Json(options): Json<AddFilesOptions>,
) -> Result<Json<Acknowledged>, ApiError> {
    if options.files.is_empty() {
        return Err(ApiError::bad_request("no files supplied"));
    }
    for file in &options.files {
        if BASE64.decode(&file.content).is_err() {
            let name = file.name.as_deref().unwrap_or("upload");
            return Err(ApiError::bad_request(format!(
                "file {name} is not valid base64"
            )));
        }
    }

    let user = acting_user(&headers);
    let count = state.client().add_files(&user, options).await?;
    Ok(Json(Acknowledged { count }))
}

/// Loads torrents by URL or magnet link for `POST /api/torrents/add-urls`.
pub async fn add_urls(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Json(options): Json<AddUrlsOptions>,
) -> Result<Json<Acknowledged>, ApiError> {
    if options.urls.is_empty() {
        return Err(ApiError::bad_request("no urls supplied"));
    }
    let user = acting_user(&headers);
    let count = state.client().add_urls(&user, options).await?;
    Ok(Json(Acknowledged { count }))
}

/// `POST /api/torrents/start`.
pub async fn start_torrents(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Json(body): Json<HashesBody>,
) -> Result<Json<Acknowledged>, ApiError> {
    let user = acting_user(&headers);
    state.client().start_torrents(&user, &body.hashes).await?;
    Ok(Json(Acknowledged {
        count: body.hashes.len(),
    }))
}

/// `POST /api/torrents/stop`.
pub async fn stop_torrents(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Json(body): Json<HashesBody>,
) -> Result<Json<Acknowledged>, ApiError> {
    let user = acting_user(&headers);
    state.client().stop_torrents(&user, &body.hashes).await?;
    Ok(Json(Acknowledged {
        count: body.hashes.len(),
    }))
}

/// `POST /api/torrents/check-hash`.
pub async fn check_hash(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Json(body): Json<HashesBody>,
) -> Result<Json<Acknowledged>, ApiError> {
    let user = acting_user(&headers);
    state.client().check_hash(&user, &body.hashes).await?;
    Ok(Json(Acknowledged {
        count: body.hashes.len(),
    }))
}

/// Runs the staged relocation for `POST /api/torrents/move`.
pub async fn move_torrents(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Json(options): Json<MoveOptions>,
) -> Result<Json<MoveResponse>, ApiError> {
    if options.destination.trim().is_empty() {
        return Err(ApiError::bad_request("destination must not be empty"));
    }
    let user = acting_user(&headers);
    let plan = state.client().move_torrents(&user, options).await?;
    Ok(Json(MoveResponse {
        moved: plan.hashes.len(),
        restarted: plan.restart.len(),
    }))
}

/// `POST /api/torrents/priority`.
pub async fn set_priority(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Json(body): Json<PriorityBody>,
) -> Result<Json<Acknowledged>, ApiError> {
    let user = acting_user(&headers);
    state
        .client()
        .set_priority(&user, &body.hashes, body.priority)
        .await?;
    Ok(Json(Acknowledged {
        count: body.hashes.len(),
    }))
}

/// `POST /api/torrents/file-priority`.
pub async fn set_file_priority(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Json(body): Json<FilePriorityBody>,
) -> Result<Json<Acknowledged>, ApiError> {
    let user = acting_user(&headers);
    state
        .client()
        .set_file_priority(&user, &body.hash, &body.indices, body.priority)
        .await?;
    Ok(Json(Acknowledged {
        count: body.indices.len(),
    }))
}

/// Replaces tag sets for `PATCH /api/torrents/taxonomy`.
pub async fn set_taxonomy(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Json(body): Json<TaxonomyBody>,
) -> Result<Json<Acknowledged>, ApiError> {
    let user = acting_user(&headers);
    state
        .client()
        .set_taxonomy(&user, &body.hashes, body.tags)
        .await?;
    Ok(Json(Acknowledged {
        count: body.hashes.len(),
    }))
}

/// Returns the current tag index for `GET /api/taxonomy`.
pub async fn get_taxonomy(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
) -> Json<TaxonomySnapshot> {
    let user = acting_user(&headers);
    Json(state.registry().taxonomy(&user).snapshot())
}

/// Passes a daemon introspection call through for `POST /api/methods`.
pub async fn call_method(
    State(state): State<Arc<ApiState>>,
    Json(body): Json<MethodCallBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    Ok(Json(
        state.client().list_methods(&body.method, &body.args).await?,
    ))
}
