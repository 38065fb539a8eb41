//! Transfer-rate history handler.

use std::sync::Arc;

use axum::{Json, extract::State, http::HeaderMap};
use rudder_services::history::RateSnapshot;

use crate::state::{ApiState, acting_user};

/// Returns the retained rate samples for `GET /api/history`, oldest first.
pub async fn get_history(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
) -> Json<Vec<RateSnapshot>> {
    let user = acting_user(&headers);
    Json(state.registry().history(&user).snapshots())
}
