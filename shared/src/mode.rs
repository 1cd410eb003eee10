use crate::format::format_count;
use crate::profile::StatSummary;

/// Metric family shown on a key. Key presses rotate through [`StatMode::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatMode {
    #[default]
    KillDeath,
    Kills,
    WinRate,
}

impl StatMode {
    pub const ALL: [StatMode; 3] = [Self::KillDeath, Self::Kills, Self::WinRate];

    pub fn index(self) -> usize {
        match self {
            Self::KillDeath => 0,
            Self::Kills => 1,
            Self::WinRate => 2,
        }
    }

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }

    /// Next mode in rotation, wrapping after the last one.
    pub fn next(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::KillDeath => "kd",
            Self::Kills => "kills",
            Self::WinRate => "wins",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::KillDeath => "K/D",
            Self::Kills => "Kills",
            Self::WinRate => "Wins",
        }
    }

    /// Two-line key title for this mode.
    pub fn title(self, summary: &StatSummary) -> String {
        let value = match self {
            Self::KillDeath => summary.kd.clone(),
            Self::Kills => format_count(summary.kills),
            Self::WinRate => format!("{}%", summary.win_rate),
        };
        format!("{}\n{value}", self.label())
    }
}
