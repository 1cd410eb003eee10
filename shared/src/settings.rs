use serde::{Deserialize, Serialize};

use crate::profile::lenient_string;

pub const DEFAULT_PLATFORM: &str = "pc";

/// Platforms the provider is known to accept. Anything else is still sent as-is.
pub const KNOWN_PLATFORMS: &[&str] = &["pc", "ps5", "xboxseries", "ps4", "xboxone"];

/// Per-key settings as stored by the host for one action instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonSettings {
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub player_name: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub platform: Option<String>,
}

impl ButtonSettings {
    pub fn new(player_name: impl Into<String>, platform: impl Into<String>) -> Self {
        Self {
            player_name: Some(player_name.into()),
            platform: Some(platform.into()),
        }
    }

    /// Configured player name, `None` when absent or blank.
    pub fn player_name(&self) -> Option<&str> {
        self.player_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    /// Platform sent to the provider, trimmed and lowercased, `pc` when unset.
    pub fn platform(&self) -> String {
        self.platform
            .as_deref()
            .map(str::trim)
            .filter(|platform| !platform.is_empty())
            .map(str::to_ascii_lowercase)
            .unwrap_or_else(|| DEFAULT_PLATFORM.to_string())
    }
}

pub fn is_known_platform(platform: &str) -> bool {
    KNOWN_PLATFORMS.contains(&platform)
}
