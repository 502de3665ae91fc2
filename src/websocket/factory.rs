use super::transport::{Outgoing, Transport, TransportHandle};
use crate::messaging::{CloseInfo, TransportEvent};
use crate::types::Result;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket factory for creating WebSocket connections
pub struct WebSocketFactory;

impl WebSocketFactory {
    /// Performs the client handshake against `url`
    pub async fn create(url: &str) -> Result<WsStream> {
        tracing::debug!("Creating WebSocket connection to: {}", url);
        let (ws_stream, response) = tokio_tungstenite::connect_async(url).await?;
        tracing::debug!("WebSocket handshake completed: {}", response.status());
        Ok(ws_stream)
    }
}

/// [`Transport`] backed by tokio-tungstenite.
///
/// Each `open` spawns one socket task that owns the stream until the close
/// handshake finishes or either side goes away.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketTransport;

impl Transport for WebSocketTransport {
    fn open(&self, url: &str) -> TransportHandle {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (out_tx, out_rx) = mpsc::unbounded_channel();

        tokio::spawn(run_socket(url.to_string(), event_tx, out_rx));

        TransportHandle::new(out_tx, event_rx)
    }
}

async fn run_socket(
    url: String,
    events: mpsc::UnboundedSender<TransportEvent>,
    mut outgoing: mpsc::UnboundedReceiver<Outgoing>,
) {
    let ws_stream = match WebSocketFactory::create(&url).await {
        Ok(ws_stream) => ws_stream,
        Err(e) => {
            tracing::error!("WebSocket connection to {} failed: {}", url, e);
            let _ = events.send(TransportEvent::Error(e.to_string()));
            let _ = events.send(TransportEvent::Closed(CloseInfo::abnormal(e.to_string())));
            return;
        }
    };

    let (mut write_half, mut read_half) = ws_stream.split();

    if events.send(TransportEvent::Opened).is_err() {
        tracing::debug!("Client went away during handshake, closing socket");
        let _ = write_half.close().await;
        return;
    }

    loop {
        tokio::select! {
            out = outgoing.recv() => match out {
                Some(Outgoing::Text(text)) => {
                    if let Err(e) = write_half.send(Message::Text(text.into())).await {
                        tracing::error!("WebSocket write error: {}", e);
                        let _ = events.send(TransportEvent::Error(e.to_string()));
                    }
                }
                Some(Outgoing::Close) | None => {
                    tracing::debug!("Closing WebSocket on client request");
                    if let Err(e) = write_half.close().await {
                        tracing::debug!("WebSocket close handshake failed: {}", e);
                    }
                    break;
                }
            },
            incoming = read_half.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    tracing::debug!("Received text message: {}", text.as_str());
                    let _ = events.send(TransportEvent::Message(text.as_str().to_owned()));
                }
                Some(Ok(Message::Binary(data))) => match String::from_utf8(data.to_vec()) {
                    Ok(text) => {
                        let _ = events.send(TransportEvent::Message(text));
                    }
                    Err(_) => {
                        tracing::warn!(
                            "Dropping binary message that is not UTF-8 ({} bytes)",
                            data.len()
                        );
                    }
                },
                Some(Ok(Message::Close(frame))) => {
                    let info = close_info(frame);
                    tracing::info!("Server closed connection: {}", info);
                    let _ = events.send(TransportEvent::Closed(info));
                    break;
                }
                Some(Ok(Message::Ping(data))) => {
                    tracing::debug!("Received ping ({} bytes)", data.len());
                }
                Some(Ok(Message::Pong(data))) => {
                    tracing::debug!("Received pong ({} bytes)", data.len());
                }
                Some(Ok(Message::Frame(_))) => {
                    tracing::debug!("Received raw frame (internal)");
                }
                Some(Err(e)) => {
                    tracing::error!("WebSocket read error: {}", e);
                    let _ = events.send(TransportEvent::Error(e.to_string()));
                    let _ = events.send(TransportEvent::Closed(CloseInfo::abnormal(e.to_string())));
                    break;
                }
                None => {
                    tracing::warn!("WebSocket stream ended without close frame");
                    let _ = events.send(TransportEvent::Closed(CloseInfo::abnormal("stream ended")));
                    break;
                }
            },
        }
    }

    tracing::debug!("Socket task for {} finished", url);
}

/// Maps a received close frame to the reported close code and reason
fn close_info(frame: Option<CloseFrame>) -> CloseInfo {
    match frame {
        Some(close_frame) => CloseInfo::new(u16::from(close_frame.code), close_frame.reason.as_str()),
        None => {
            tracing::warn!("Server closed connection without a status code");
            CloseInfo::no_status()
        }
    }
}
