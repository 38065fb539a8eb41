//! RFC9457-style API error wrapper.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rudder_client::ClientError;
use rudder_download::DownloadError;
use rudder_proto::ProtoError;
use rudder_services::ServiceError;

use crate::models::ProblemDetails;

/// Structured API error. Titles are constant per problem type; occurrence
/// context goes in `detail`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    title: &'static str,
    detail: Option<String>,
}

impl ApiError {
    const fn new(status: StatusCode, kind: &'static str, title: &'static str) -> Self {
        Self {
            status,
            kind,
            title,
            detail: None,
        }
    }

    /// Attach occurrence-specific detail.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// 400 with detail.
    #[must_use]
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", "bad request").with_detail(detail)
    }

    /// 404 with detail.
    #[must_use]
    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            "not_found",
            "resource not found",
        )
        .with_detail(detail)
    }

    /// 500 with detail.
    #[must_use]
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal",
            "internal server error",
        )
        .with_detail(detail)
    }

    /// 502 with detail.
    #[must_use]
    pub fn bad_gateway(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_GATEWAY,
            "daemon_error",
            "daemon request failed",
        )
        .with_detail(detail)
    }

    /// 503 without detail; the daemon connection is not configured or down.
    #[must_use]
    pub const fn service_unavailable() -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "daemon_unavailable",
            "daemon unavailable",
        )
    }

    /// The HTTP status this error renders with.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ProblemDetails {
            kind: self.kind.to_string(),
            title: self.title.to_string(),
            status: self.status.as_u16(),
            detail: self.detail,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<ProtoError> for ApiError {
    fn from(error: ProtoError) -> Self {
        match error {
            ProtoError::Unavailable => Self::service_unavailable(),
            ProtoError::EmptyBatch => Self::bad_request("operation produced no daemon calls"),
            daemon @ (ProtoError::Daemon { .. } | ProtoError::ShapeMismatch { .. }) => {
                Self::bad_gateway(daemon.to_string())
            }
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::Proto(proto) => proto.into(),
            ServiceError::MalformedRow { .. } => Self::bad_gateway(error.to_string()),
            ServiceError::PreferenceIo { .. } | ServiceError::PreferenceDecode { .. } => {
                Self::internal(error.to_string())
            }
        }
    }
}

impl From<ClientError> for ApiError {
    fn from(error: ClientError) -> Self {
        match error {
            ClientError::Proto(proto) => proto.into(),
            ClientError::Service(service) => service.into(),
            ClientError::UnknownTorrent { hash } => {
                Self::not_found(format!("torrent {hash} is not in the list"))
            }
            ClientError::MalformedDetails { .. } => Self::bad_gateway(error.to_string()),
        }
    }
}

impl From<DownloadError> for ApiError {
    fn from(error: DownloadError) -> Self {
        match &error {
            DownloadError::NoFilesSelected { .. } | DownloadError::Missing { .. } => {
                Self::not_found(error.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daemon_errors_map_to_gateway_statuses() {
        let unavailable: ApiError = ProtoError::Unavailable.into();
        assert_eq!(unavailable.status(), StatusCode::SERVICE_UNAVAILABLE);

        let daemon: ApiError = ProtoError::daemon("could not create download").into();
        assert_eq!(daemon.status(), StatusCode::BAD_GATEWAY);

        let empty: ApiError = ProtoError::EmptyBatch.into();
        assert_eq!(empty.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn missing_torrents_and_files_are_not_found() {
        let unknown: ApiError = ClientError::UnknownTorrent { hash: "A".into() }.into();
        assert_eq!(unknown.status(), StatusCode::NOT_FOUND);

        let empty: ApiError = DownloadError::NoFilesSelected { hash: "A".into() }.into();
        assert_eq!(empty.status(), StatusCode::NOT_FOUND);
    }
}
