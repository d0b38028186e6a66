use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppResult;
use crate::settings::SettingsPatch;
use crate::timer::{Reply, Request};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Config,
    Break,
    App,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub channel: Channel,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl BridgeRequest {
    pub fn into_request(self) -> Result<Request, String> {
        let request = match (self.channel, self.method.as_str()) {
            (Channel::Config, "get") => Request::GetConfig,
            (Channel::Config, "update") => {
                let params = self.params.unwrap_or(Value::Null);
                let patch: SettingsPatch = serde_json::from_value(params)
                    .map_err(|e| format!("invalid settings payload: {}", e))?;
                Request::UpdateConfig(patch)
            }
            (Channel::Break, "close") => Request::CloseBreak,
            (Channel::Break, "prepare") => Request::PrepareBreak,
            (Channel::App, "status") => Request::Status,
            (Channel::App, "restNow") => Request::RestNow,
            (Channel::App, "showSettings") => Request::ShowSettings,
            (Channel::App, "hideSettings") => Request::HideSettings,
            (channel, method) => return Err(format!("unknown method {:?}.{}", channel, method)),
        };
        Ok(request)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeResponse {
    #[serde(default)]
    pub id: Option<u64>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl BridgeResponse {
    pub fn from_reply(id: Option<u64>, reply: AppResult<Reply>) -> Self {
        match reply {
            Ok(reply) => match serde_json::to_value(reply) {
                Ok(result) => Self::ok(id, result),
                Err(e) => Self::failure(id, e.to_string()),
            },
            Err(e) => Self::failure(id, e.to_string()),
        }
    }

    pub fn ok(id: Option<u64>, result: Value) -> Self {
        Self {
            id,
            success: true,
            result: (!result.is_null()).then_some(result),
            message: None,
        }
    }

    pub fn failure(id: Option<u64>, message: String) -> Self {
        Self {
            id,
            success: false,
            result: None,
            message: Some(message),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurfaceAction {
    Show,
    Hide,
}

/// Unsolicited messages sent to every connected client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum PushEvent {
    NextRestTime { timestamp: i64 },
    Overlay { action: SurfaceAction },
    Settings { action: SurfaceAction },
}
