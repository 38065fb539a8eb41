//! Server-sent event stream of the acting user's store updates.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::sse::{Event, KeepAlive, Sse},
};
use rudder_events::{EventEnvelope, EventId};
use tokio::sync::mpsc;
use tokio_stream::{Stream, StreamExt, wrappers::ReceiverStream};

use crate::models::EventsQuery;
use crate::state::{ApiState, acting_user};

/// Standard SSE reconnect header carrying the last delivered event id.
const HEADER_LAST_EVENT_ID: &str = "last-event-id";

const KEEP_ALIVE_SECS: u64 = 15;

/// Serves the live event stream for `GET /api/events`, replaying missed
/// events on reconnect.
///
/// The `Last-Event-ID` header takes precedence over the `since` query
/// parameter. Only events belonging to the acting user are delivered.
pub async fn stream_events(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Query(query): Query<EventsQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + Send> {
    let user = acting_user(&headers);
    let since = headers
        .get(HEADER_LAST_EVENT_ID)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<EventId>().ok())
        .or(query.since);

    let mut stream = state.events().subscribe(since);
    let (sender, receiver) = mpsc::channel::<EventEnvelope>(64);
    tokio::spawn(async move {
        while let Some(envelope) = stream.next().await {
            if envelope.event.user() != &user {
                continue;
            }
            if sender.send(envelope).await.is_err() {
                break;
            }
        }
    });

    let events = ReceiverStream::new(receiver).map(|envelope| {
        let event = Event::default()
            .id(envelope.id.to_string())
            .event(envelope.event.kind());
        Ok(event
            .json_data(&envelope)
            .unwrap_or_else(|_| Event::default().data("{}")))
    });

    Sse::new(events).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(KEEP_ALIVE_SECS))
            .text("keep-alive"),
    )
}
