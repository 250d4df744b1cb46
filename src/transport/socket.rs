//! WebSocket driver task: bridges a real socket to a [`WireEnd`].

use futures::{SinkExt, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};
use url::Url;

use crate::transport::link::{LinkEvent, WireEnd};

/// Connect to `endpoint` and pump frames both ways until either side goes
/// away. Always finishes by reporting `Closed` to the transport.
pub(crate) async fn drive(endpoint: Url, wire: WireEnd) {
    let (events, mut outgoing) = wire.into_parts();

    let ws = match connect_async(endpoint.as_str()).await {
        Ok((ws, _response)) => ws,
        Err(e) => {
            warn!("connection to {endpoint} failed: {e}");
            let _ = events.send(LinkEvent::Closed {
                reason: Some(e.to_string()),
            });
            return;
        }
    };
    let _ = events.send(LinkEvent::Opened);

    let (mut ws_tx, mut ws_rx) = ws.split();
    let reason = loop {
        tokio::select! {
            out = outgoing.recv() => {
                let Some(text) = out else {
                    // Transport dropped: close our side politely.
                    let _ = ws_tx.send(Message::Close(None)).await;
                    break None;
                };
                if let Err(e) = ws_tx.send(Message::Text(text.into())).await {
                    break Some(e.to_string());
                }
            }
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let _ = events.send(LinkEvent::Text(text.as_str().to_owned()));
                    }
                    Some(Ok(Message::Binary(data))) => {
                        debug!("ignoring {} byte binary frame", data.len());
                    }
                    Some(Ok(Message::Close(frame))) => {
                        break frame.map(|f| f.reason.as_str().to_owned()).filter(|r| !r.is_empty());
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => break Some(e.to_string()),
                    None => break None,
                }
            }
        }
    };

    let _ = events.send(LinkEvent::Closed { reason });
}
