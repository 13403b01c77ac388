// Interval pollers for the live status and settings panels
use crate::application::device_api::DeviceApi;
use crate::domain::live::{BatteryCalibration, LiveDisplay};
use crate::domain::settings::SettingsView;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

/// One refresh of a panel. Failures are absorbed into the returned value,
/// so a poll loop never stops because the device went away.
#[async_trait]
pub trait Refresh: Send + Sync + 'static {
    type Output: Send + Sync + 'static;

    async fn refresh(&self) -> Self::Output;
}

#[derive(Clone)]
pub struct LivePoller {
    api: Arc<dyn DeviceApi>,
    calibration: BatteryCalibration,
}

impl LivePoller {
    pub fn new(api: Arc<dyn DeviceApi>, calibration: BatteryCalibration) -> Self {
        Self { api, calibration }
    }

    pub async fn poll_once(&self) -> LiveDisplay {
        match self.api.live_snapshot().await {
            Ok(snapshot) => LiveDisplay::from_snapshot(&snapshot, &self.calibration),
            Err(e) => {
                tracing::warn!("Live data unavailable (device unreachable?): {}", e);
                LiveDisplay::disconnected()
            }
        }
    }
}

#[async_trait]
impl Refresh for LivePoller {
    type Output = LiveDisplay;

    async fn refresh(&self) -> LiveDisplay {
        self.poll_once().await
    }
}

#[derive(Clone)]
pub struct SettingsPoller {
    api: Arc<dyn DeviceApi>,
}

impl SettingsPoller {
    pub fn new(api: Arc<dyn DeviceApi>) -> Self {
        Self { api }
    }

    pub async fn poll_once(&self) -> SettingsView {
        match self.api.settings().await {
            Ok(settings) => SettingsView::from_settings(&settings),
            Err(e) => {
                tracing::warn!("Settings unavailable: {}", e);
                SettingsView::default()
            }
        }
    }
}

#[async_trait]
impl Refresh for SettingsPoller {
    type Output = SettingsView;

    async fn refresh(&self) -> SettingsView {
        self.poll_once().await
    }
}

/// Refresh every `period` while `active` is true, publishing each result.
///
/// The first refresh runs as soon as the loop becomes active. Refreshes are
/// sequential; a slow device delays the next tick instead of stacking
/// requests. Returns when the `active` sender is dropped.
pub async fn run_poll_loop<R: Refresh>(
    source: R,
    period: Duration,
    out: Arc<watch::Sender<R::Output>>,
    mut active: watch::Receiver<bool>,
) {
    loop {
        if !*active.borrow_and_update() {
            if active.changed().await.is_err() {
                return;
            }
            continue;
        }

        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let value = source.refresh().await;
                    out.send_replace(value);
                }
                changed = active.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    break;
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Main,
    Settings,
}

/// Switches which panel is being refreshed; exactly one poller runs at a time
pub struct Navigator {
    live_active: watch::Sender<bool>,
    settings_active: watch::Sender<bool>,
}

impl Navigator {
    pub fn channel() -> (Self, watch::Receiver<bool>, watch::Receiver<bool>) {
        let (live_active, live_rx) = watch::channel(false);
        let (settings_active, settings_rx) = watch::channel(false);
        (
            Self {
                live_active,
                settings_active,
            },
            live_rx,
            settings_rx,
        )
    }

    pub fn show(&self, section: Section) {
        tracing::debug!("Showing {:?} section", section);
        self.live_active.send_if_modified(|v| {
            let changed = *v != (section == Section::Main);
            *v = section == Section::Main;
            changed
        });
        self.settings_active.send_if_modified(|v| {
            let changed = *v != (section == Section::Settings);
            *v = section == Section::Settings;
            changed
        });
    }
}
