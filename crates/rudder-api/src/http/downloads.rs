//! Payload download handler: single file verbatim, multiple files as tar.

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::Response,
};
use rudder_download::{DownloadPlan, stream_archive, stream_file};

use crate::http::errors::ApiError;
use crate::models::DownloadQuery;
use crate::state::{ApiState, acting_user};

/// `GET /api/torrents/{hash}/download?indices=0,2`.
pub async fn download(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Path(hash): Path<String>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, ApiError> {
    let user = acting_user(&headers);
    let torrents = state.registry().torrent(&user);

    // The cache may be cold right after startup; retry once after a refresh.
    let summary = match torrents.torrent(&hash) {
        Some(summary) => summary,
        None => {
            torrents.fetch_torrent_list().await?;
            torrents
                .torrent(&hash)
                .ok_or_else(|| ApiError::not_found(format!("torrent {hash} is not in the list")))?
        }
    };

    let detail = state.client().torrent_details(&hash).await?;
    let indices: Option<HashSet<String>> = query.indices.map(|text| {
        text.split(',')
            .map(str::trim)
            .filter(|index| !index.is_empty())
            .map(str::to_string)
            .collect()
    });

    let plan = DownloadPlan::resolve(&summary, &detail, indices.as_ref())?;
    plan.verify()?;

    let name = plan.name().replace('"', "'");
    let (body, content_type) = match plan {
        DownloadPlan::Single { path, .. } => {
            (Body::from_stream(stream_file(path)), "application/octet-stream")
        }
        DownloadPlan::Archive { entries, .. } => {
            (Body::from_stream(stream_archive(entries)), "application/x-tar")
        }
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{name}\""),
        )
        .body(body)
        .map_err(|error| ApiError::internal(error.to_string()))
}
