//! Feed subscription handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};
use rudder_services::feed::{FeedSubscription, NewFeedSubscription};
use uuid::Uuid;

use crate::http::errors::ApiError;
use crate::state::{ApiState, acting_user};

/// `GET /api/feeds`.
pub async fn list_feeds(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
) -> Json<Vec<FeedSubscription>> {
    let user = acting_user(&headers);
    Json(state.registry().feeds(&user).list())
}

/// `POST /api/feeds`.
pub async fn add_feed(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Json(new): Json<NewFeedSubscription>,
) -> Result<Json<FeedSubscription>, ApiError> {
    if new.url.trim().is_empty() {
        return Err(ApiError::bad_request("feed url must not be empty"));
    }
    let user = acting_user(&headers);
    Ok(Json(state.registry().feeds(&user).add(new)))
}

/// `DELETE /api/feeds/{id}`.
pub async fn remove_feed(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = Uuid::parse_str(&id)
        .map_err(|_| ApiError::bad_request(format!("feed id '{id}' is not a valid UUID")))?;
    let user = acting_user(&headers);
    if state.registry().feeds(&user).remove(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(format!("feed {id} does not exist")))
    }
}
