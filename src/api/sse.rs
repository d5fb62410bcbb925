//! Server-Sent Events support

use crate::runtime::{ChatSnapshot, SseEvent};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde_json::json;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Convert broadcast stream to SSE stream, starting from `snapshot`
pub fn sse_stream(
    snapshot: ChatSnapshot,
    broadcast_rx: tokio::sync::broadcast::Receiver<SseEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let init =
        futures::stream::once(async move { Ok(sse_event_to_axum(SseEvent::Init(snapshot))) });

    let broadcasts = BroadcastStream::new(broadcast_rx).filter_map(|result| match result {
        Ok(event) => Some(Ok(sse_event_to_axum(event))),
        Err(e) => {
            // Lagged partials are superseded by the next one
            tracing::debug!(error = %e, "SSE subscriber lagged");
            None
        }
    });

    Sse::new(init.chain(broadcasts)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn sse_event_to_axum(event: SseEvent) -> Event {
    let (event_type, data) = match event {
        SseEvent::Init(snapshot) => (
            "init",
            json!({
                "type": "init",
                "thread_id": snapshot.thread_id,
                "turns": snapshot.turns,
                "agent_working": snapshot.agent_working,
            }),
        ),
        SseEvent::Phase { phase } => (
            "phase",
            json!({
                "type": "phase",
                "phase": phase
            }),
        ),
        SseEvent::Partial { text } => (
            "partial",
            json!({
                "type": "partial",
                "text": text
            }),
        ),
        SseEvent::Message { turn } => (
            "message",
            json!({
                "type": "message",
                "turn": turn
            }),
        ),
        SseEvent::AgentDone { followup } => (
            "agent_done",
            json!({
                "type": "agent_done",
                "followup": followup
            }),
        ),
        SseEvent::Error { message } => (
            "error",
            json!({
                "type": "error",
                "message": message
            }),
        ),
    };

    Event::default().event(event_type).data(data.to_string())
}
