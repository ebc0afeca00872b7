use std::{convert::Infallible, sync::Arc, time::Duration};

use axum::{
    extract::State,
    response::sse::{Event as SseEvent, KeepAlive, Sse},
};
use futures_core::stream::Stream;

use crate::main_lib::AppState;

/// SSE push channel for dashboard clients.
///
/// Registers the connection with the hub and streams its events out as named
/// SSE events. Dropping the response body drops the hub handle, which
/// deregisters the connection.
pub async fn stream_orders(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    let connection = state.hub.accept();
    let stream = tokio_stream::StreamExt::filter_map(connection, |evt| {
        let sse_event = SseEvent::default().event(evt.name);
        let sse_event = if let Some(payload) = evt.payload {
            match sse_event.json_data(payload) {
                Ok(ev) => ev,
                Err(err) => {
                    tracing::error!("Failed to serialize SSE payload for {}: {}", evt.name, err);
                    return None;
                }
            }
        } else {
            sse_event.data("null")
        };
        Some(Ok(sse_event))
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
