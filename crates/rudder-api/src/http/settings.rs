//! Daemon settings handlers.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    http::HeaderMap,
};
use serde_json::Value;

use crate::http::errors::ApiError;
use crate::models::{Acknowledged, SettingsBody, SettingsQuery, SpeedLimitBody};
use crate::state::{ApiState, acting_user};

/// Returns the acting user's persisted preferences for
/// `GET /api/preferences`.
pub async fn get_preferences(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
) -> Result<Json<rudder_services::UserPreferences>, ApiError> {
    let user = acting_user(&headers);
    Ok(Json(state.registry().preferences().load(&user)?))
}

/// Fetches settings in internal units for `GET /api/settings`.
pub async fn get_settings(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<SettingsQuery>,
) -> Result<Json<BTreeMap<String, Value>>, ApiError> {
    let ids: Option<Vec<String>> = query.ids.map(|text| {
        text.split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect()
    });
    let settings = state.client().get_settings(ids.as_deref()).await?;
    Ok(Json(settings))
}

/// Applies settings given in internal units for `PATCH /api/settings`.
pub async fn patch_settings(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Json(body): Json<SettingsBody>,
) -> Result<Json<Acknowledged>, ApiError> {
    let user = acting_user(&headers);
    let count = state.client().set_settings(&user, &body.settings).await?;
    Ok(Json(Acknowledged { count }))
}

/// Sets one global rate ceiling, in KiB/s, for
/// `POST /api/settings/speed-limit`.
pub async fn set_speed_limit(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Json(body): Json<SpeedLimitBody>,
) -> Result<Json<Acknowledged>, ApiError> {
    let user = acting_user(&headers);
    state
        .client()
        .set_speed_limit(&user, body.direction, body.kib_per_second)
        .await?;
    Ok(Json(Acknowledged { count: 1 }))
}
