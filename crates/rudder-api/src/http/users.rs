//! User lifecycle handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use rudder_events::UserId;

use crate::state::ApiState;

/// Tears down the named user's services for `DELETE /api/users/{user}`.
///
/// Idempotent: destroying a user that was never seen is a no-op.
pub async fn destroy_user(
    State(state): State<Arc<ApiState>>,
    Path(user): Path<String>,
) -> StatusCode {
    state.registry().destroy_user(&UserId::new(user));
    StatusCode::NO_CONTENT
}
