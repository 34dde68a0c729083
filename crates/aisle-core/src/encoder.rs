//! Server-sent event framing
//!
//! Each [`StreamEvent`] becomes one `data: <json>\n\n` frame. The body stream
//! ends after the session's terminal event, or when the session task goes
//! away without sending one.

use bytes::Bytes;
use futures::stream::{self, Stream};
use tokio::sync::mpsc;

use crate::session::StreamEvent;

/// Encode one event as an SSE frame
pub fn encode_event(event: &StreamEvent) -> Bytes {
    let json = serde_json::to_string(event)
        .unwrap_or_else(|e| format!(r#"{{"type":"error","message":"failed to encode event: {}"}}"#, e));
    Bytes::from(format!("data: {}\n\n", json))
}

/// Turn a session's event receiver into a stream of SSE frames
pub fn event_stream(rx: mpsc::Receiver<StreamEvent>) -> impl Stream<Item = Bytes> + Send + 'static {
    stream::unfold((rx, false), |(mut rx, finished)| async move {
        if finished {
            return None;
        }
        let event = rx.recv().await?;
        let finished = event.is_terminal();
        Some((encode_event(&event), (rx, finished)))
    })
}
