//! Live WebSocket channel to the backend.
//!
//! One connection per job; the server pushes tagged JSON frames and
//! the client sends nothing after the handshake.

use futures_util::StreamExt;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::debug;

use super::ProgressStream;
use crate::error::{Error, Result};
use crate::types::{JobId, ProgressEvent};

/// Connect and adapt the raw message stream into progress events.
///
/// Connection failures surface as channel errors so the reconnect
/// policy can absorb them. Frame decode failures are yielded inline;
/// a close frame or read error ends the stream.
pub(crate) async fn open_event_stream(ws_url: &str, job: &JobId) -> Result<ProgressStream> {
    let url = format!("{ws_url}?job={job}");
    debug!("opening live channel: {}", url);

    let (mut socket, _response) = connect_async(&url).await.map_err(Error::channel)?;

    Ok(Box::pin(async_stream::stream! {
        while let Some(frame) = socket.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    yield serde_json::from_str::<ProgressEvent>(text.as_str()).map_err(Error::from);
                }
                Ok(Message::Close(_)) => break,
                // Ping/pong are answered by the protocol layer; binary
                // frames carry nothing we know how to read.
                Ok(_) => {}
                Err(e) => {
                    yield Err(Error::channel(e));
                    break;
                }
            }
        }
    }))
}
