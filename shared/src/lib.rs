pub mod format;
pub mod mode;
pub mod profile;
pub mod prompt;
pub mod protocol;
pub mod settings;

pub use format::{format_count, kd_ratio, win_rate};
pub use mode::StatMode;
pub use profile::{PlayerProfile, StatSummary};
pub use prompt::Prompt;
pub use protocol::{InboundEvent, OutboundMessage, Registration, SettingsPayload};
pub use settings::ButtonSettings;
