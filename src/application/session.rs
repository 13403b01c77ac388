// Dashboard session - single owner of chart state, driven as an actor task
use crate::application::chart_view::ChartView;
use crate::application::device_api::{DeviceApi, DeviceError};
use crate::application::log_importer::LogImporter;
use crate::application::poller::LivePoller;
use crate::application::view_controller::ViewRangeController;
use crate::domain::live::LiveDisplay;
use crate::domain::view::{Axis, PanOffset, Window};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Pause between a successful stop and re-reading the log, so the device
/// has flushed the last rows
pub const STOP_SETTLE_DELAY: Duration = Duration::from_millis(100);
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

const ALERT_START_FAILED: &str = "Could not start logging. Check the connection to the device.";
const ALERT_STOP_FAILED: &str =
    "Could not stop logging or fetch the data. Check the connection to the device.";
const ALERT_RESET_FAILED: &str = "Could not reset the data. Check the connection to the device.";
const ALERT_LOG_DOWNLOAD_FAILED: &str =
    "Could not download the log for the chart. Check the connection to the device.";
const ALERT_LOG_PROCESSING_FAILED: &str = "Error while processing the log data.";

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Message the user has to see
    Alert(String),
    ChartUpdated { points: usize, window: Window },
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Device(#[from] DeviceError),
    #[error("dashboard session has shut down")]
    Closed,
}

/// Snapshot of the chart state for callers outside the actor
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub full_range: Window,
    pub visible: Window,
    pub pan_offset: PanOffset,
    pub sliders: [f64; 2],
    pub points: usize,
    pub entries: usize,
}

pub struct DashboardSession<C: ChartView> {
    api: Arc<dyn DeviceApi>,
    importer: LogImporter,
    live: LivePoller,
    live_out: Arc<watch::Sender<LiveDisplay>>,
    controller: ViewRangeController<C>,
    events: broadcast::Sender<SessionEvent>,
    points: usize,
    entries: usize,
    stop_settle: Duration,
}

impl<C: ChartView> DashboardSession<C> {
    pub fn new(
        api: Arc<dyn DeviceApi>,
        live: LivePoller,
        live_out: Arc<watch::Sender<LiveDisplay>>,
        chart: C,
    ) -> Self {
        let (events, _) = broadcast::channel(32);
        Self {
            importer: LogImporter::new(api.clone()),
            api,
            live,
            live_out,
            controller: ViewRangeController::new(chart),
            events,
            points: 0,
            entries: 0,
            stop_settle: STOP_SETTLE_DELAY,
        }
    }

    #[cfg(test)]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    #[cfg(test)]
    pub fn controller(&self) -> &ViewRangeController<C> {
        &self.controller
    }

    #[cfg(test)]
    pub fn controller_mut(&mut self) -> &mut ViewRangeController<C> {
        &mut self.controller
    }

    pub fn view_state(&self) -> ViewState {
        ViewState {
            full_range: self.controller.full_range(),
            visible: self.controller.visible_window(),
            pan_offset: self.controller.pan_offset(),
            sliders: [self.controller.slider(Axis::X), self.controller.slider(Axis::Y)],
            points: self.points,
            entries: self.entries,
        }
    }

    fn alert(&self, message: &str) {
        let _ = self.events.send(SessionEvent::Alert(message.to_string()));
    }

    fn clear_chart(&mut self) {
        self.controller.clear();
        self.points = 0;
        self.entries = 0;
        self.chart_updated();
    }

    fn chart_updated(&self) {
        let _ = self.events.send(SessionEvent::ChartUpdated {
            points: self.points,
            window: self.controller.visible_window(),
        });
    }

    pub async fn refresh_live(&self) {
        let display = self.live.poll_once().await;
        self.live_out.send_replace(display);
    }

    /// Fetch the device log and replace the chart contents with it.
    ///
    /// The chart is only touched once the whole log was fetched and parsed.
    /// With `surface_errors` a failure also raises exactly one alert.
    pub async fn import_log(&mut self, surface_errors: bool) -> Result<usize, DeviceError> {
        match self.importer.import().await {
            Ok(imported) => {
                self.controller.load(&imported.entries, &imported.points);
                self.points = imported.points.len();
                self.entries = imported.entries.len();
                self.chart_updated();
                Ok(self.points)
            }
            Err(e) => {
                tracing::error!("Failed to import log or parse CSV: {}", e);
                if surface_errors {
                    if e.is_http_status() {
                        self.alert(ALERT_LOG_DOWNLOAD_FAILED);
                    } else {
                        self.alert(ALERT_LOG_PROCESSING_FAILED);
                    }
                }
                Err(e)
            }
        }
    }

    pub async fn start_logging(&mut self) -> Result<(), DeviceError> {
        if let Err(e) = self.api.start_logging().await {
            tracing::error!("Failed to send START command: {}", e);
            self.alert(ALERT_START_FAILED);
            return Err(e);
        }

        self.clear_chart();
        self.refresh_live().await;
        Ok(())
    }

    /// Stop logging, then pull the finished log into the chart. An import
    /// failure after a successful stop is reported but does not fail the stop.
    pub async fn stop_logging(&mut self) -> Result<(), DeviceError> {
        if let Err(e) = self.api.stop_logging().await {
            tracing::error!("Failed to stop logging: {}", e);
            if !e.is_http_status() {
                self.alert(ALERT_STOP_FAILED);
            }
            return Err(e);
        }

        tokio::time::sleep(self.stop_settle).await;
        let _ = self.import_log(true).await;
        self.refresh_live().await;
        Ok(())
    }

    /// Reset statistics and delete the stored log. Callers confirm first.
    pub async fn reset(&mut self) -> Result<(), DeviceError> {
        if let Err(e) = self.api.reset().await {
            tracing::error!("Failed to send RESET command: {}", e);
            self.alert(ALERT_RESET_FAILED);
            return Err(e);
        }

        self.live_out.send_replace(LiveDisplay::reset());
        self.clear_chart();
        self.refresh_live().await;
        Ok(())
    }

    async fn handle(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Start(reply) => {
                let _ = reply.send(self.start_logging().await);
            }
            SessionCommand::Stop(reply) => {
                let _ = reply.send(self.stop_logging().await);
            }
            SessionCommand::Reset(reply) => {
                let _ = reply.send(self.reset().await);
            }
            SessionCommand::ImportLog {
                surface_errors,
                reply,
            } => {
                let _ = reply.send(self.import_log(surface_errors).await);
            }
            SessionCommand::ZoomIn(axis) => self.controller.zoom_in(axis),
            SessionCommand::ZoomOut(axis) => self.controller.zoom_out(axis),
            SessionCommand::ResetZoom => self.controller.reset_zoom(),
            SessionCommand::GestureZoom(window) => self.controller.on_gesture_zoom(window),
            SessionCommand::SetSlider(axis, value) => self.controller.set_slider(axis, value),
            SessionCommand::ReleaseSlider(axis) => {
                self.controller.release_slider(axis, now())
            }
            SessionCommand::ViewState(reply) => {
                let _ = reply.send(self.view_state());
            }
        }
    }
}

fn now() -> std::time::Instant {
    tokio::time::Instant::now().into_std()
}

enum SessionCommand {
    Start(oneshot::Sender<Result<(), DeviceError>>),
    Stop(oneshot::Sender<Result<(), DeviceError>>),
    Reset(oneshot::Sender<Result<(), DeviceError>>),
    ImportLog {
        surface_errors: bool,
        reply: oneshot::Sender<Result<usize, DeviceError>>,
    },
    ZoomIn(Axis),
    ZoomOut(Axis),
    ResetZoom,
    GestureZoom(Window),
    SetSlider(Axis, f64),
    ReleaseSlider(Axis),
    ViewState(oneshot::Sender<ViewState>),
}

/// Cloneable front door to a running session. Commands are processed one
/// at a time in the order they were sent.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionCommand>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    async fn send(&self, command: SessionCommand) -> Result<(), SessionError> {
        self.tx.send(command).await.map_err(|_| SessionError::Closed)
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> Result<T, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(make(reply)).await?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    pub async fn start_logging(&self) -> Result<(), SessionError> {
        Ok(self.request(SessionCommand::Start).await??)
    }

    pub async fn stop_logging(&self) -> Result<(), SessionError> {
        Ok(self.request(SessionCommand::Stop).await??)
    }

    pub async fn reset(&self) -> Result<(), SessionError> {
        Ok(self.request(SessionCommand::Reset).await??)
    }

    pub async fn import_log(&self, surface_errors: bool) -> Result<usize, SessionError> {
        Ok(self
            .request(|reply| SessionCommand::ImportLog {
                surface_errors,
                reply,
            })
            .await??)
    }

    pub async fn zoom_in(&self, axis: Axis) -> Result<(), SessionError> {
        self.send(SessionCommand::ZoomIn(axis)).await
    }

    pub async fn zoom_out(&self, axis: Axis) -> Result<(), SessionError> {
        self.send(SessionCommand::ZoomOut(axis)).await
    }

    pub async fn reset_zoom(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::ResetZoom).await
    }

    pub async fn gesture_zoom(&self, window: Window) -> Result<(), SessionError> {
        self.send(SessionCommand::GestureZoom(window)).await
    }

    pub async fn set_slider(&self, axis: Axis, value: f64) -> Result<(), SessionError> {
        self.send(SessionCommand::SetSlider(axis, value)).await
    }

    pub async fn release_slider(&self, axis: Axis) -> Result<(), SessionError> {
        self.send(SessionCommand::ReleaseSlider(axis)).await
    }

    pub async fn view_state(&self) -> Result<ViewState, SessionError> {
        self.request(SessionCommand::ViewState).await
    }
}

/// Move the session into its own task. The task ends when every handle is
/// dropped.
pub fn spawn_session<C>(session: DashboardSession<C>) -> (SessionHandle, JoinHandle<()>)
where
    C: ChartView + Send + Sync + 'static,
{
    let (tx, rx) = mpsc::channel(64);
    let handle = SessionHandle {
        tx,
        events: session.events.clone(),
    };
    let task = tokio::spawn(run_session(session, rx));
    (handle, task)
}

async fn run_session<C: ChartView>(
    mut session: DashboardSession<C>,
    mut rx: mpsc::Receiver<SessionCommand>,
) {
    let mut frames = tokio::time::interval(FRAME_INTERVAL);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        let animating = session.controller.is_animating();
        tokio::select! {
            command = rx.recv() => match command {
                Some(command) => session.handle(command).await,
                None => break,
            },
            _ = frames.tick(), if animating => {
                session.controller.tick(now());
            }
        }
    }
    tracing::debug!("Dashboard session stopped");
}
