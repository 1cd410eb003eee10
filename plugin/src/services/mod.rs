pub mod refresh_timer;
pub mod stats_provider;
