// Command handlers - wire application services to the console
use crate::application::device_api::DeviceApi;
use crate::application::log_importer::ImportedLog;
use crate::application::poller::{run_poll_loop, LivePoller, Navigator, Section, SettingsPoller};
use crate::application::session::{
    spawn_session, DashboardSession, SessionError, SessionEvent, SessionHandle, FRAME_INTERVAL,
};
use crate::application::snap_back::SNAP_BACK_DURATION;
use crate::application::settings_service::SettingsService;
use crate::domain::live::LiveDisplay;
use crate::domain::settings::{SettingsView, WifiForm};
use crate::domain::view::Axis;
use crate::infrastructure::config::DashboardConfig;
use crate::presentation::cli::{ChartArgs, Command, DownloadArgs, ResetArgs, SetWifiArgs, WatchArgs};
use crate::presentation::console::{
    confirm, drain_events, print_live, print_settings, view_summary,
};
use crate::presentation::terminal_chart::TerminalChart;
use anyhow::{Context, Result};
use chrono::Local;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

const DEFAULT_CHART_WIDTH: usize = 72;
const DEFAULT_CHART_HEIGHT: usize = 16;

/// A running dashboard session plus the channels the console reads
struct OpenSession {
    handle: SessionHandle,
    task: JoinHandle<()>,
    events: broadcast::Receiver<SessionEvent>,
    live: watch::Receiver<LiveDisplay>,
    frames: watch::Receiver<String>,
}

impl OpenSession {
    /// Print queued alerts; returns the point count if the chart changed
    fn print_events(&mut self) -> Option<usize> {
        drain_events(&mut self.events)
    }

    fn print_chart(&mut self) {
        println!("{}", self.frames.borrow_and_update().as_str());
    }

    /// Wait until every released slider is back at rest
    async fn settle_sliders(&self) -> Result<()> {
        let settle = async {
            loop {
                if self.handle.view_state().await?.sliders == [0.0, 0.0] {
                    return Ok::<_, SessionError>(());
                }
                tokio::time::sleep(FRAME_INTERVAL).await;
            }
        };
        match tokio::time::timeout(SNAP_BACK_DURATION * 10, settle).await {
            Ok(result) => Ok(result?),
            Err(_) => {
                tracing::warn!("Sliders did not settle");
                Ok(())
            }
        }
    }

    async fn close(self) -> Result<()> {
        drop(self.handle);
        self.task.await.context("Dashboard session panicked")
    }
}

pub struct Dashboard {
    config: DashboardConfig,
    api: Arc<dyn DeviceApi>,
}

impl Dashboard {
    pub fn new(config: DashboardConfig, api: Arc<dyn DeviceApi>) -> Self {
        Self { config, api }
    }

    pub async fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::Watch(args) => self.watch(args).await,
            Command::Chart(args) => self.chart(args).await,
            Command::Start => self.start().await,
            Command::Stop => self.stop().await,
            Command::Reset(args) => self.reset(args).await,
            Command::Download(args) => self.download(args).await.map(|_| ()),
            Command::Settings => self.settings().await,
            Command::SetWifi(args) => self.set_wifi(args).await,
        }
    }

    fn live_poller(&self) -> LivePoller {
        LivePoller::new(self.api.clone(), self.config.battery_calibration())
    }

    fn open_session(&self, width: usize, height: usize) -> OpenSession {
        let (chart, frames) = TerminalChart::new(width, height);
        let (live_out, live) = watch::channel(LiveDisplay::default());
        let session = DashboardSession::new(self.api.clone(), self.live_poller(), Arc::new(live_out), chart);
        let (handle, task) = spawn_session(session);
        let events = handle.subscribe();

        OpenSession {
            handle,
            task,
            events,
            live,
            frames,
        }
    }

    async fn watch(&self, args: WatchArgs) -> Result<()> {
        let (navigator, live_active, settings_active) = Navigator::channel();
        let (live_tx, mut live_rx) = watch::channel(LiveDisplay::default());
        let (settings_tx, mut settings_rx) = watch::channel(SettingsView::default());

        let live_task = tokio::spawn(run_poll_loop(
            self.live_poller(),
            self.config.live_interval(),
            Arc::new(live_tx),
            live_active,
        ));
        let settings_task = tokio::spawn(run_poll_loop(
            SettingsPoller::new(self.api.clone()),
            self.config.settings_interval(),
            Arc::new(settings_tx),
            settings_active,
        ));

        navigator.show(if args.settings {
            Section::Settings
        } else {
            Section::Main
        });

        let mut printed = 0;
        while args.ticks.is_none_or(|ticks| printed < ticks) {
            tokio::select! {
                changed = live_rx.changed(), if !args.settings => {
                    if changed.is_err() {
                        break;
                    }
                    print_live(&live_rx.borrow_and_update());
                }
                changed = settings_rx.changed(), if args.settings => {
                    if changed.is_err() {
                        break;
                    }
                    print_settings(&settings_rx.borrow_and_update());
                    println!();
                }
                _ = tokio::signal::ctrl_c() => break,
            }
            printed += 1;
        }

        // dropping the navigator ends both poll loops
        drop(navigator);
        live_task.await.context("Live poller panicked")?;
        settings_task.await.context("Settings poller panicked")?;
        Ok(())
    }

    async fn chart(&self, args: ChartArgs) -> Result<()> {
        let mut session = self.open_session(args.width, args.height);

        let imported = session.handle.import_log(true).await;
        session.print_events();
        let points = imported.context("Could not import the device log")?;
        if points == 0 {
            tracing::warn!("Device log has no data rows");
        }

        let handle = &session.handle;
        if args.x_range.is_some() || args.y_range.is_some() {
            let mut window = handle.view_state().await?.visible;
            window.x = args.x_range.unwrap_or(window.x);
            window.y = args.y_range.unwrap_or(window.y);
            handle.gesture_zoom(window).await?;
        }
        for _ in 0..args.zoom_in_x {
            handle.zoom_in(Axis::X).await?;
        }
        for _ in 0..args.zoom_in_y {
            handle.zoom_in(Axis::Y).await?;
        }
        for _ in 0..args.zoom_out_x {
            handle.zoom_out(Axis::X).await?;
        }
        for _ in 0..args.zoom_out_y {
            handle.zoom_out(Axis::Y).await?;
        }

        let pans = [(Axis::X, args.pan_x), (Axis::Y, args.pan_y)];
        for (axis, value) in pans {
            if let Some(value) = value {
                handle.set_slider(axis, value).await?;
            }
        }
        if args.release {
            for (axis, value) in pans {
                if value.is_some() {
                    handle.release_slider(axis).await?;
                }
            }
            session.settle_sliders().await?;
        }

        if args.reset_zoom {
            session.handle.reset_zoom().await?;
        }

        // answered only after every queued command ran
        let state = session.handle.view_state().await?;
        session.print_chart();
        println!("{}", view_summary(&state));
        session.close().await
    }

    async fn start(&self) -> Result<()> {
        let mut session = self.open_session(DEFAULT_CHART_WIDTH, DEFAULT_CHART_HEIGHT);
        let result = session.handle.start_logging().await;
        let chart = session.print_events();
        result.context("Start logging failed")?;

        if chart == Some(0) {
            println!("Chart cleared");
        }
        print_live(&session.live.borrow());
        session.close().await
    }

    async fn stop(&self) -> Result<()> {
        let mut session = self.open_session(DEFAULT_CHART_WIDTH, DEFAULT_CHART_HEIGHT);
        let result = session.handle.stop_logging().await;
        let chart = session.print_events();
        result.context("Stop logging failed")?;

        match chart {
            Some(points) if points > 0 => {
                session.print_chart();
                let state = session.handle.view_state().await?;
                println!("{}", view_summary(&state));
            }
            Some(_) => println!("Recorded log is empty"),
            None => println!("Logging stopped, the log could not be imported"),
        }
        print_live(&session.live.borrow());
        session.close().await
    }

    async fn reset(&self, args: ResetArgs) -> Result<()> {
        if !args.yes
            && !confirm("Reset all data and statistics on the device?")
                .context("Could not read confirmation")?
        {
            println!("Reset cancelled");
            return Ok(());
        }

        let mut session = self.open_session(DEFAULT_CHART_WIDTH, DEFAULT_CHART_HEIGHT);
        let result = session.handle.reset().await;
        let chart = session.print_events();
        result.context("Reset failed")?;

        if chart == Some(0) {
            println!("Chart cleared");
        }
        print_live(&session.live.borrow());
        session.close().await
    }

    /// Save the raw device log. Returns the written path.
    async fn download(&self, args: DownloadArgs) -> Result<PathBuf> {
        let path = args.output.unwrap_or_else(default_download_path);

        let csv = self
            .api
            .download_log()
            .await
            .context("Could not download the log from the device")?;

        let parsed = ImportedLog::from_csv(&csv);
        if parsed.entries.is_empty() {
            tracing::warn!("No log data to import; saving the device file as is");
        }

        tokio::fs::write(&path, csv.as_bytes())
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        tracing::info!(
            "Saved {} rows ({} skipped) to {}",
            parsed.entries.len(),
            parsed.skipped.len(),
            path.display()
        );
        println!("{}", path.display());
        Ok(path)
    }

    async fn settings(&self) -> Result<()> {
        let view = SettingsService::new(self.api.clone())
            .load()
            .await
            .context("Could not load device settings")?;
        print_settings(&view);
        Ok(())
    }

    async fn set_wifi(&self, args: SetWifiArgs) -> Result<()> {
        let service = SettingsService::new(self.api.clone());
        let current = service
            .load()
            .await
            .context("Could not load device settings")?;

        let form = WifiForm {
            ssid_prefix: args.ssid_prefix,
            password_prefix: args.password_prefix,
            ..current.wifi
        };
        let outcome = service.save_wifi(&form).await?;

        println!("Wi-Fi settings saved, the device restarts its access point");
        if !outcome.message.is_empty() {
            println!("{}", outcome.message);
        }
        Ok(())
    }
}

fn default_download_path() -> PathBuf {
    PathBuf::from(format!("madspeed_log_{}.csv", Local::now().format("%Y%m%d_%H%M%S")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{FakeDevice, Failure};
    use crate::domain::settings::{DeviceSettings, WifiUpdateRequest};
    use crate::domain::view::Range;

    const LOG: &str = "timestamp,speed,distance\n0,0.0,0\n1,8.0,4\n2,14.0,11\n";

    fn dashboard(device: Arc<FakeDevice>) -> Dashboard {
        Dashboard::new(DashboardConfig::default(), device)
    }

    #[test]
    fn test_default_download_name() {
        let name = default_download_path().display().to_string();

        assert!(name.starts_with("madspeed_log_"));
        assert!(name.ends_with(".csv"));
        // madspeed_log_YYYYmmdd_HHMMSS.csv
        assert_eq!(name.len(), "madspeed_log_".len() + 15 + ".csv".len());
    }

    #[tokio::test]
    async fn test_download_writes_raw_csv() {
        let device = Arc::new(FakeDevice::with_log(LOG));
        let path = std::env::temp_dir().join(format!("madspeed-download-{}.csv", std::process::id()));

        let written = dashboard(device)
            .download(DownloadArgs {
                output: Some(path.clone()),
            })
            .await
            .unwrap();

        assert_eq!(written, path);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), LOG);
        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_download_failure_writes_nothing() {
        let device = Arc::new(FakeDevice::with_log(LOG));
        device.fail("download_log", Failure::Status(500));
        let path = std::env::temp_dir().join(format!("madspeed-missing-{}.csv", std::process::id()));

        let result = dashboard(device)
            .download(DownloadArgs {
                output: Some(path.clone()),
            })
            .await;

        assert!(result.is_err());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_set_wifi_keeps_device_suffix() {
        let device = Arc::new(FakeDevice::with_log(""));
        device.set_settings(DeviceSettings {
            spiffs_total: 1000,
            spiffs_used: 10,
            current_ssid: "MadSpeed_77AB".to_string(),
            current_password: "12345678_77AB".to_string(),
            mac_address_suffix: "_77AB".to_string(),
        });

        dashboard(device.clone())
            .set_wifi(SetWifiArgs {
                ssid_prefix: "Track".to_string(),
                password_prefix: "pit-lane".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(
            device.wifi_requests(),
            vec![WifiUpdateRequest {
                ssid: "Track_77AB".to_string(),
                password: "pit-lane_77AB".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_chart_fails_when_log_unavailable() {
        let device = Arc::new(FakeDevice::with_log(LOG));
        device.fail("download_log", Failure::Transport);

        let result = dashboard(device)
            .chart(ChartArgs {
                width: 40,
                height: 8,
                zoom_in_x: 1,
                zoom_in_y: 0,
                zoom_out_x: 0,
                zoom_out_y: 0,
                x_range: None,
                y_range: None,
                pan_x: None,
                pan_y: None,
                release: false,
                reset_zoom: false,
            })
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_chart_runs_every_view_control() {
        let device = Arc::new(FakeDevice::with_log(LOG));

        dashboard(device.clone())
            .chart(ChartArgs {
                width: 40,
                height: 8,
                zoom_in_x: 2,
                zoom_in_y: 1,
                zoom_out_x: 1,
                zoom_out_y: 0,
                x_range: Some(Range::new(2.0, 8.0)),
                y_range: None,
                pan_x: Some(60.0),
                pan_y: Some(-30.0),
                release: true,
                reset_zoom: false,
            })
            .await
            .unwrap();

        assert_eq!(device.calls(), vec!["download_log"]);
    }

    #[tokio::test]
    async fn test_stop_reimports_log() {
        let device = Arc::new(FakeDevice::with_log(LOG));

        dashboard(device.clone()).stop().await.unwrap();

        assert_eq!(
            device.calls(),
            vec!["stop_logging", "download_log", "live_snapshot"]
        );
    }

    #[tokio::test]
    async fn test_reset_with_yes_skips_prompt() {
        let device = Arc::new(FakeDevice::with_log(LOG));

        dashboard(device.clone())
            .reset(ResetArgs { yes: true })
            .await
            .unwrap();

        assert!(device.calls().contains(&"reset"));
    }
}
