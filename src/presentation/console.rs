// Console output for the dashboard commands
use crate::application::session::{SessionEvent, ViewState};
use crate::domain::live::{BatteryLevel, LiveDisplay};
use crate::domain::settings::{SettingsView, StorageLevel};
use chrono::{DateTime, Local};
use std::io::{self, BufRead, Write};
use tokio::sync::broadcast;

pub fn live_line(at: DateTime<Local>, display: &LiveDisplay) -> String {
    let battery = match display.battery_level() {
        BatteryLevel::Low => " (low)",
        BatteryLevel::Medium | BatteryLevel::High => "",
    };
    format!("[{}] {}{}", at.format("%H:%M:%S"), display, battery)
}

pub fn print_live(display: &LiveDisplay) {
    println!("{}", live_line(Local::now(), display));
}

pub fn settings_text(view: &SettingsView) -> String {
    let warning = match view.storage.map(|s| s.level()) {
        Some(StorageLevel::Critical) => "\nstorage almost full, download and reset the log",
        Some(StorageLevel::Warning) => "\nstorage filling up",
        Some(StorageLevel::Ok) | None => "",
    };
    format!("{}{}", view, warning)
}

pub fn print_settings(view: &SettingsView) {
    println!("{}", settings_text(view));
}

pub fn view_summary(state: &ViewState) -> String {
    format!(
        "{} points from {} rows | x {:.1}..{:.1} m | y {:.1}..{:.1} km/h | pan {:.3}/{:.3}",
        state.points,
        state.entries,
        state.visible.x.min,
        state.visible.x.max,
        state.visible.y.min,
        state.visible.y.max,
        state.pan_offset.x,
        state.pan_offset.y,
    )
}

/// Print every alert already queued on `events` without waiting for more.
/// Returns the point count of the last chart update seen, if any.
pub fn drain_events(events: &mut broadcast::Receiver<SessionEvent>) -> Option<usize> {
    let mut chart_points = None;
    loop {
        match events.try_recv() {
            Ok(SessionEvent::Alert(message)) => eprintln!("! {}", message),
            Ok(SessionEvent::ChartUpdated { points, window }) => {
                tracing::debug!(
                    "Chart now shows {} points, x {:.1}..{:.1}",
                    points,
                    window.x.min,
                    window.x.max
                );
                chart_points = Some(points);
            }
            Err(broadcast::error::TryRecvError::Lagged(n)) => {
                tracing::warn!("Missed {} session events", n);
            }
            Err(_) => break,
        }
    }
    chart_points
}

/// Ask a yes/no question on the terminal; anything but `y`/`yes` is a no
pub fn confirm(prompt: &str) -> io::Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
