//! Notification log handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
};
use rudder_services::notification::{Notification, NotificationCounts};
use serde::Serialize;

use crate::models::NotificationQuery;
use crate::state::{ApiState, acting_user};

/// Page of notifications plus totals.
#[derive(Debug, Serialize)]
pub struct NotificationPage {
    /// Entries, newest first.
    pub notifications: Vec<Notification>,
    /// Log totals.
    pub counts: NotificationCounts,
}

/// `GET /api/notifications?offset=0&limit=20`.
pub async fn list_notifications(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Query(query): Query<NotificationQuery>,
) -> Json<NotificationPage> {
    let user = acting_user(&headers);
    let (notifications, counts) = state
        .registry()
        .notifications(&user)
        .list(query.offset, query.limit);
    Json(NotificationPage {
        notifications,
        counts,
    })
}

/// Acknowledges every notification for `POST /api/notifications/mark-read`.
pub async fn mark_notifications_read(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
) -> StatusCode {
    let user = acting_user(&headers);
    state.registry().notifications(&user).mark_all_read();
    StatusCode::NO_CONTENT
}

/// Clears the notification log for `DELETE /api/notifications`.
pub async fn clear_notifications(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
) -> StatusCode {
    let user = acting_user(&headers);
    state.registry().notifications(&user).clear();
    StatusCode::NO_CONTENT
}
