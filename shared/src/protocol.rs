//! JSON messages exchanged with the Stream Deck host over its local WebSocket.

use serde::{Deserialize, Deserializer, Serialize};

use crate::settings::ButtonSettings;

/// `target` value addressing both the hardware key and the software preview.
pub const TARGET_HARDWARE_AND_SOFTWARE: u8 = 0;

/// Host events the plugin reacts to. Everything else folds into `Unhandled`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum InboundEvent {
    WillAppear {
        context: String,
        #[serde(default)]
        payload: SettingsPayload,
    },
    WillDisappear {
        context: String,
    },
    KeyUp {
        context: String,
    },
    DidReceiveSettings {
        context: String,
        #[serde(default)]
        payload: SettingsPayload,
    },
    #[serde(other)]
    Unhandled,
}

impl InboundEvent {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn context(&self) -> Option<&str> {
        match self {
            Self::WillAppear { context, .. }
            | Self::WillDisappear { context }
            | Self::KeyUp { context }
            | Self::DidReceiveSettings { context, .. } => Some(context),
            Self::Unhandled => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SettingsPayload {
    #[serde(default, deserialize_with = "null_as_default")]
    pub settings: ButtonSettings,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Messages the plugin pushes back to the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum OutboundMessage {
    SetTitle {
        context: String,
        payload: TitlePayload,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TitlePayload {
    pub title: String,
    pub target: u8,
}

impl OutboundMessage {
    pub fn set_title(context: impl Into<String>, title: impl Into<String>) -> Self {
        Self::SetTitle {
            context: context.into(),
            payload: TitlePayload {
                title: title.into(),
                target: TARGET_HARDWARE_AND_SOFTWARE,
            },
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// First frame sent after connecting; `event` is the register event name the
/// host passed on the command line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Registration {
    pub event: String,
    pub uuid: String,
}
