use bf6_stats_shared::{ButtonSettings, StatMode, StatSummary};
use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;

/// One visible key. Dropping it cancels its refresh timer.
#[derive(Debug)]
pub struct ButtonContext {
    pub settings: ButtonSettings,
    pub mode: StatMode,
    /// Distinguishes this registration from earlier ones for the same context.
    pub registration: u64,
    /// Id of the most recent fetch issued; older results are discarded.
    pub latest_fetch: Option<u64>,
    refresh_timer: JoinHandle<()>,
}

impl ButtonContext {
    pub fn new(settings: ButtonSettings, registration: u64, refresh_timer: JoinHandle<()>) -> Self {
        Self {
            settings,
            mode: StatMode::default(),
            registration,
            latest_fetch: None,
            refresh_timer,
        }
    }
}

impl Drop for ButtonContext {
    fn drop(&mut self) {
        self.refresh_timer.abort();
    }
}

#[derive(Debug, Clone)]
pub struct CachedStats {
    pub summary: StatSummary,
    pub fetched_at: DateTime<Utc>,
}

impl CachedStats {
    pub fn new(summary: StatSummary) -> Self {
        Self {
            summary,
            fetched_at: Utc::now(),
        }
    }
}
