use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::protocol::Message;
use tracing::{debug, info, warn};

use super::protocol::{BridgeRequest, BridgeResponse, PushEvent};
use crate::error::AppResult;
use crate::timer::ControllerHandle;

pub const DEFAULT_LISTEN: &str = "127.0.0.1:8765";
const EVENT_BUFFER: usize = 64;

pub type EventSender = broadcast::Sender<PushEvent>;
type WsSink = SplitSink<WebSocketStream<TcpStream>, Message>;

pub fn create_event_channel() -> EventSender {
    broadcast::channel(EVENT_BUFFER).0
}

/// Binding is separate from serving so the caller can tell "port taken" apart.
pub async fn bind(addr: SocketAddr) -> std::io::Result<TcpListener> {
    TcpListener::bind(addr).await
}

pub async fn start_websocket_server(
    listener: TcpListener,
    controller: ControllerHandle,
    events: EventSender,
) {
    if let Ok(addr) = listener.local_addr() {
        info!("WebSocket bridge listening on: {}", addr);
    }

    loop {
        match listener.accept().await {
            Ok((stream, peer_addr)) => {
                debug!("New WebSocket connection from: {}", peer_addr);
                tokio::spawn(handle_connection(
                    stream,
                    peer_addr,
                    controller.clone(),
                    events.subscribe(),
                ));
            }
            Err(e) => warn!("Failed to accept connection: {}", e),
        }
    }
}

async fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    controller: ControllerHandle,
    mut events: broadcast::Receiver<PushEvent>,
) {
    let ws_stream = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("WebSocket handshake failed with {}: {}", peer_addr, e);
            return;
        }
    };

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    loop {
        tokio::select! {
            msg = ws_receiver.next() => {
                let Some(msg) = msg else { break };
                match msg {
                    Ok(Message::Text(text)) => {
                        let response = dispatch(&controller, &text).await;
                        if let Err(e) = send_json(&mut ws_sender, &response).await {
                            warn!("Failed to send WebSocket response: {}", e);
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => {
                        debug!("WebSocket connection closed by {}", peer_addr);
                        break;
                    }
                    Ok(Message::Ping(data)) => {
                        if let Err(e) = ws_sender.send(Message::Pong(data)).await {
                            warn!("Failed to send pong: {}", e);
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("WebSocket error from {}: {}", peer_addr, e);
                        break;
                    }
                }
            }
            event = events.recv() => match event {
                Ok(event) => {
                    if let Err(e) = send_json(&mut ws_sender, &event).await {
                        warn!("Failed to push {:?} to {}: {}", event, peer_addr, e);
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("{} fell behind, {} events dropped", peer_addr, skipped);
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    debug!("WebSocket connection with {} terminated", peer_addr);
}

async fn dispatch(controller: &ControllerHandle, text: &str) -> BridgeResponse {
    let request = match serde_json::from_str::<BridgeRequest>(text) {
        Ok(request) => request,
        Err(e) => {
            warn!("Failed to parse message: {}", e);
            return BridgeResponse::failure(None, format!("Parse error: {}", e));
        }
    };
    let id = request.id;
    debug!("[WebSocket] {:?}.{} id={:?}", request.channel, request.method, id);

    match request.into_request() {
        Ok(request) => BridgeResponse::from_reply(id, controller.request(request).await),
        Err(message) => BridgeResponse::failure(id, message),
    }
}

async fn send_json<T: Serialize>(sink: &mut WsSink, value: &T) -> AppResult<()> {
    let json = serde_json::to_string(value)?;
    sink.send(Message::Text(json)).await?;
    Ok(())
}
