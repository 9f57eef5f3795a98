//! Drains a pipeline's event channel into a `text/event-stream` response.
//!
//! Each status event becomes `data: {"status": .., "message": ..}`. A fatal
//! item becomes an `error` event; the pipeline ends its run after sending
//! one, so the stream closes right after.

use std::{convert::Infallible, fmt::Display};

use axum::response::sse::{Event, KeepAlive, Sse};
use serde::Serialize;
use serde_json::json;
use services::events::EventItem;
use tokio::sync::mpsc;
use tokio_stream::{Stream, StreamExt, wrappers::ReceiverStream};
use tracing::{error, warn};

pub fn event_stream<S, E>(
    rx: mpsc::Receiver<EventItem<S, E>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    S: Serialize + Send + 'static,
    E: Display + Send + 'static,
{
    let stream = ReceiverStream::new(rx).map(|item| Ok(to_event(item)));
    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn to_event<S: Serialize, E: Display>(item: EventItem<S, E>) -> Event {
    match item {
        Ok(ev) => match serde_json::to_string(&ev) {
            Ok(data) => Event::default().data(data),
            Err(e) => {
                warn!(target: "api::sse", error = %e, "failed to encode status event");
                Event::default().event("error").data(
                    json!({ "status": "Error", "message": "failed to encode event" }).to_string(),
                )
            }
        },
        Err(e) => {
            error!(target: "api::sse", error = %e, "pipeline failed");
            Event::default()
                .event("error")
                .data(json!({ "status": "Error", "message": e.to_string() }).to_string())
        }
    }
}
