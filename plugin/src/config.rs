use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

pub const STATS_API_URL: &str = "https://api.gametools.network/bf6/stats/";
pub const HOST_ADDRESS: &str = "127.0.0.1";
pub const USER_AGENT: &str = concat!("bf6-stats-plugin/", env!("CARGO_PKG_VERSION"));

pub const REFRESH_INTERVAL_SECS: u64 = 300; // 5 minutes
pub const DEFAULT_UPSTREAM_HTTP_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS: u64 = 3;

/// Arguments the Stream Deck host passes when it launches the plugin executable.
#[derive(Debug, Clone, Parser)]
#[command(name = "bf6-stats-plugin", about = "Battlefield 6 stats for Stream Deck keys")]
pub struct LaunchArgs {
    /// Port of the host's local WebSocket server.
    #[arg(long)]
    pub port: u16,
    /// Identifier the plugin must register with.
    #[arg(long = "pluginUUID")]
    pub plugin_uuid: String,
    /// Event name for the registration frame.
    #[arg(long = "registerEvent")]
    pub register_event: String,
    /// Host application and device info as JSON.
    #[arg(long, default_value = "{}")]
    pub info: String,
}

impl LaunchArgs {
    pub fn from_env() -> Result<Self, clap::Error> {
        Self::try_parse_from(normalize_host_args(std::env::args()))
    }

    pub fn websocket_url(&self) -> String {
        format!("ws://{HOST_ADDRESS}:{}", self.port)
    }

    /// `-info` is informational only; an unparsable blob is not an error.
    pub fn host_info(&self) -> Option<serde_json::Value> {
        serde_json::from_str(&self.info).ok()
    }
}

/// The host uses single-dash long flags (`-port 28196`). Rewrite them to the
/// double-dash form clap expects, leaving values untouched.
pub fn normalize_host_args<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    args.into_iter()
        .enumerate()
        .map(|(position, arg)| {
            let is_single_dash_flag = position > 0
                && arg
                    .strip_prefix('-')
                    .is_some_and(|name| name.len() > 1 && name.chars().all(|c| c.is_ascii_alphabetic()));
            if is_single_dash_flag {
                format!("-{arg}")
            } else {
                arg
            }
        })
        .collect()
}

pub fn stats_api_url() -> String {
    std::env::var("BF6_STATS_API_URL")
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| STATS_API_URL.to_string())
}

pub fn refresh_interval() -> Duration {
    positive_secs_from_env("BF6_STATS_REFRESH_SECS", REFRESH_INTERVAL_SECS)
}

pub fn upstream_http_timeout() -> Duration {
    positive_secs_from_env("UPSTREAM_HTTP_TIMEOUT_SECS", DEFAULT_UPSTREAM_HTTP_TIMEOUT_SECS)
}

pub fn upstream_connect_timeout() -> Duration {
    positive_secs_from_env(
        "UPSTREAM_CONNECT_TIMEOUT_SECS",
        DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS,
    )
}

/// The host swallows plugin stderr, so logs can be redirected to a file.
pub fn log_file() -> Option<PathBuf> {
    std::env::var_os("BF6_STATS_LOG_FILE")
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

fn positive_secs_from_env(name: &str, default_secs: u64) -> Duration {
    std::env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(default_secs))
}
