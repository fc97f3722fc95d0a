use axum::response::sse::Event as SseEvent;
use botpilot_core::automation::StatusEvent;

/// Converts a status event into an SSE frame named after the event kind.
/// Returns `None` if the payload cannot be serialized.
pub fn to_sse_event(event: &StatusEvent) -> Option<SseEvent> {
    let payload = match event.payload() {
        Ok(payload) => payload,
        Err(err) => {
            tracing::error!("Failed to serialize SSE payload for {}: {}", event.name(), err);
            return None;
        }
    };
    match SseEvent::default().event(event.name()).json_data(payload) {
        Ok(sse_event) => Some(sse_event),
        Err(err) => {
            tracing::error!("Failed to encode SSE event {}: {}", event.name(), err);
            None
        }
    }
}
