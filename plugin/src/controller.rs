use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bf6_stats_shared::settings::is_known_platform;
use bf6_stats_shared::{ButtonSettings, InboundEvent, OutboundMessage, PlayerProfile, Prompt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::services::refresh_timer;
use crate::services::stats_provider::{FetchError, StatsProvider};
use crate::state::{ButtonContext, CachedStats};

/// Everything the controller reacts to arrives through one queue, so all
/// per-key state is mutated from a single task.
#[derive(Debug)]
pub enum ControllerEvent {
    Host(InboundEvent),
    RefreshDue {
        context: String,
        registration: u64,
    },
    FetchFinished {
        context: String,
        fetch_id: u64,
        outcome: Result<PlayerProfile, FetchError>,
    },
}

pub struct StatDisplayController {
    contexts: HashMap<String, ButtonContext>,
    stats_cache: HashMap<String, CachedStats>,
    provider: Arc<dyn StatsProvider>,
    outbound: mpsc::UnboundedSender<OutboundMessage>,
    events: mpsc::UnboundedSender<ControllerEvent>,
    refresh_interval: Duration,
    next_registration: u64,
    next_fetch_id: u64,
}

impl StatDisplayController {
    pub fn new(
        provider: Arc<dyn StatsProvider>,
        outbound: mpsc::UnboundedSender<OutboundMessage>,
        events: mpsc::UnboundedSender<ControllerEvent>,
        refresh_interval: Duration,
    ) -> Self {
        Self {
            contexts: HashMap::new(),
            stats_cache: HashMap::new(),
            provider,
            outbound,
            events,
            refresh_interval,
            next_registration: 0,
            next_fetch_id: 0,
        }
    }

    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<ControllerEvent>) {
        info!(
            "stat display controller started (refresh interval: {}s)",
            self.refresh_interval.as_secs()
        );
        while let Some(event) = events.recv().await {
            self.handle(event);
        }
    }

    pub fn handle(&mut self, event: ControllerEvent) {
        match event {
            ControllerEvent::Host(event) => self.handle_host_event(event),
            ControllerEvent::RefreshDue {
                context,
                registration,
            } => {
                let current = self
                    .contexts
                    .get(&context)
                    .is_some_and(|button| button.registration == registration);
                if current {
                    self.refresh(&context);
                }
            }
            ControllerEvent::FetchFinished {
                context,
                fetch_id,
                outcome,
            } => self.apply_fetch(&context, fetch_id, outcome),
        }
    }

    fn handle_host_event(&mut self, event: InboundEvent) {
        match event {
            InboundEvent::WillAppear { context, payload } => {
                self.on_appear(context, payload.settings)
            }
            InboundEvent::WillDisappear { context } => self.on_disappear(&context),
            InboundEvent::KeyUp { context } => self.on_press(&context),
            InboundEvent::DidReceiveSettings { context, payload } => {
                self.on_settings_changed(&context, payload.settings)
            }
            InboundEvent::Unhandled => {}
        }
    }

    /// Register a key, replacing any earlier registration and its timer, then
    /// fetch right away.
    pub fn on_appear(&mut self, context: String, settings: ButtonSettings) {
        self.next_registration += 1;
        let registration = self.next_registration;
        let timer = refresh_timer::spawn(
            context.clone(),
            registration,
            self.refresh_interval,
            self.events.clone(),
        );

        let replaced = self
            .contexts
            .insert(context.clone(), ButtonContext::new(settings, registration, timer))
            .is_some();
        debug!(context = %context, registration, replaced, "key appeared");

        self.refresh(&context);
    }

    pub fn on_disappear(&mut self, context: &str) {
        if self.contexts.remove(context).is_some() {
            self.stats_cache.remove(context);
            debug!(context = %context, "key disappeared");
        }
    }

    /// Rotate to the next stat and redraw from cache. Never fetches.
    pub fn on_press(&mut self, context: &str) {
        let Some(button) = self.contexts.get_mut(context) else {
            return;
        };
        button.mode = button.mode.next();
        debug!(context = %context, mode = button.mode.key(), "stat mode changed");
        self.render(context);
    }

    pub fn on_settings_changed(&mut self, context: &str, settings: ButtonSettings) {
        let Some(button) = self.contexts.get_mut(context) else {
            return;
        };
        button.settings = settings;
        self.refresh(context);
    }

    fn refresh(&mut self, context: &str) {
        let Some(button) = self.contexts.get_mut(context) else {
            return;
        };
        let Some(player) = button.settings.player_name().map(str::to_owned) else {
            button.latest_fetch = None;
            self.send_title(context, Prompt::SetPlayer.title());
            return;
        };
        let platform = button.settings.platform();

        self.next_fetch_id += 1;
        let fetch_id = self.next_fetch_id;
        button.latest_fetch = Some(fetch_id);

        if !is_known_platform(&platform) {
            debug!(context = %context, platform = %platform, "passing through unrecognised platform");
        }
        debug!(context = %context, player = %player, platform = %platform, fetch_id, "fetching stats");

        let provider = Arc::clone(&self.provider);
        let events = self.events.clone();
        let context = context.to_owned();
        tokio::spawn(async move {
            let outcome = provider.fetch_profile(&player, &platform).await;
            let _ = events.send(ControllerEvent::FetchFinished {
                context,
                fetch_id,
                outcome,
            });
        });
    }

    fn apply_fetch(
        &mut self,
        context: &str,
        fetch_id: u64,
        outcome: Result<PlayerProfile, FetchError>,
    ) {
        let Some(button) = self.contexts.get(context) else {
            debug!(context = %context, fetch_id, "discarding stats for a key that is gone");
            return;
        };
        if button.latest_fetch != Some(fetch_id) {
            debug!(context = %context, fetch_id, "discarding superseded stats");
            return;
        }

        match outcome {
            Ok(profile) => match profile.summarize() {
                Some(summary) => {
                    info!(
                        context = %context,
                        player = %summary.player_name,
                        kills = summary.kills,
                        deaths = summary.deaths,
                        wins = summary.wins,
                        losses = summary.losses,
                        "stats refreshed"
                    );
                    self.stats_cache
                        .insert(context.to_owned(), CachedStats::new(summary));
                    self.render(context);
                }
                None => {
                    info!(context = %context, "provider could not resolve player");
                    self.send_title(context, Prompt::PlayerNotFound.title());
                }
            },
            Err(e) => {
                let last_success = self
                    .stats_cache
                    .get(context)
                    .map(|cached| cached.fetched_at.to_rfc3339());
                warn!(
                    context = %context,
                    error = %e,
                    last_success = last_success.as_deref().unwrap_or("never"),
                    "failed to fetch stats"
                );
                self.send_title(context, Prompt::ApiError.title());
            }
        }
    }

    fn render(&self, context: &str) {
        let (Some(button), Some(cached)) =
            (self.contexts.get(context), self.stats_cache.get(context))
        else {
            return;
        };
        self.send_title(context, button.mode.title(&cached.summary));
    }

    fn send_title(&self, context: &str, title: impl Into<String>) {
        if self
            .outbound
            .send(OutboundMessage::set_title(context, title))
            .is_err()
        {
            warn!(context = %context, "host transport closed, dropping title update");
        }
    }
}
