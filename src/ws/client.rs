use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::Message;

use super::protocol::{BridgeRequest, BridgeResponse, Channel};
use crate::error::{AppError, AppResult};

const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

/// Sends one request to a running daemon and waits for its reply, skipping push events.
pub async fn call(
    addr: SocketAddr,
    channel: Channel,
    method: &str,
    params: Option<Value>,
) -> AppResult<Option<Value>> {
    timeout(REPLY_TIMEOUT, call_inner(addr, channel, method, params))
        .await
        .map_err(|_| AppError::Bridge(format!("no reply from {} within {:?}", addr, REPLY_TIMEOUT)))?
}

async fn call_inner(
    addr: SocketAddr,
    channel: Channel,
    method: &str,
    params: Option<Value>,
) -> AppResult<Option<Value>> {
    let (mut ws, _) = connect_async(format!("ws://{}", addr)).await?;

    let request = BridgeRequest {
        id: Some(1),
        channel,
        method: method.to_string(),
        params,
    };
    ws.send(Message::Text(serde_json::to_string(&request)?)).await?;

    while let Some(msg) = ws.next().await {
        let Message::Text(text) = msg? else {
            continue;
        };
        let value: Value = serde_json::from_str(&text)?;
        if value.get("event").is_some() {
            continue;
        }
        let response: BridgeResponse = serde_json::from_value(value)?;
        if response.id != request.id {
            continue;
        }
        let _ = ws.close(None).await;
        return if response.success {
            Ok(response.result)
        } else {
            Err(AppError::Rejected(response.message.unwrap_or_default()))
        };
    }

    Err(AppError::Bridge("connection closed before a reply arrived".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws::websocket_server::bind;

    #[tokio::test]
    async fn test_unreachable_daemon_is_a_bridge_error() {
        // Grab a free port, then release it so nothing is listening there.
        let listener = bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = call(addr, Channel::App, "status", None).await.unwrap_err();
        assert!(matches!(err, AppError::Bridge(_)));
    }
}
