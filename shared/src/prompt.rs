/// Fallback titles shown when there is nothing to display yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    /// No player name configured; no request is made.
    SetPlayer,
    /// The provider answered but could not resolve the player.
    PlayerNotFound,
    /// Non-success status, network failure or unreadable body.
    ApiError,
}

impl Prompt {
    pub fn title(self) -> &'static str {
        match self {
            Self::SetPlayer => "Set\nPlayer",
            Self::PlayerNotFound => "Player\nNot Found",
            Self::ApiError => "API\nError",
        }
    }
}
