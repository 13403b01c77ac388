// Command line surface of the `madspeed` binary
use crate::domain::view::Range;
use clap::{ArgAction, Parser, Subcommand, ValueHint};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Dashboard for the MadSpeed GPS speed logger", long_about = None)]
pub struct Cli {
    /// Device base URL, overrides the configured one
    #[arg(long, global = true, value_hint = ValueHint::Url)]
    pub device: Option<String>,

    /// Configuration file (without `.toml` works too)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Poll the live status (or the settings panel) and print each refresh
    Watch(WatchArgs),
    /// Import the device log and draw the speed chart
    Chart(ChartArgs),
    /// Start logging on the device
    Start,
    /// Stop logging and import the recorded log
    Stop,
    /// Erase the log and statistics on the device
    Reset(ResetArgs),
    /// Save the raw CSV log to a file
    Download(DownloadArgs),
    /// Show storage usage and Wi-Fi credentials
    Settings,
    /// Change the Wi-Fi access point credentials
    SetWifi(SetWifiArgs),
}

#[derive(Parser, Debug)]
pub struct WatchArgs {
    /// Stop after this many refreshes (default: until Ctrl-C)
    #[arg(long)]
    pub ticks: Option<u64>,

    /// Watch the settings panel instead of the live status
    #[arg(long, action = ArgAction::SetTrue)]
    pub settings: bool,
}

#[derive(Parser, Debug)]
pub struct ChartArgs {
    /// Plot width in characters
    #[arg(long, default_value_t = 72)]
    pub width: usize,

    /// Plot height in characters
    #[arg(long, default_value_t = 16)]
    pub height: usize,

    /// Zoom steps in on the distance axis
    #[arg(long, default_value_t = 0)]
    pub zoom_in_x: u32,

    /// Zoom steps in on the speed axis
    #[arg(long, default_value_t = 0)]
    pub zoom_in_y: u32,

    /// Zoom steps out on the distance axis
    #[arg(long, default_value_t = 0)]
    pub zoom_out_x: u32,

    /// Zoom steps out on the speed axis
    #[arg(long, default_value_t = 0)]
    pub zoom_out_y: u32,

    /// Select a distance span `MIN:MAX` (meters), like a drag zoom
    #[arg(long, value_parser = parse_range, allow_hyphen_values = true)]
    pub x_range: Option<Range>,

    /// Select a speed span `MIN:MAX` (km/h), like a drag zoom
    #[arg(long, value_parser = parse_range, allow_hyphen_values = true)]
    pub y_range: Option<Range>,

    /// Distance slider position (-100..100)
    #[arg(long, allow_hyphen_values = true)]
    pub pan_x: Option<f64>,

    /// Speed slider position (-100..100)
    #[arg(long, allow_hyphen_values = true)]
    pub pan_y: Option<f64>,

    /// Let go of the sliders: keep the panned window and wait for them to return to rest
    #[arg(long, action = ArgAction::SetTrue)]
    pub release: bool,

    /// Go back to the full range after all other steps
    #[arg(long, action = ArgAction::SetTrue)]
    pub reset_zoom: bool,
}

fn parse_range(value: &str) -> Result<Range, String> {
    let (min, max) = value
        .split_once(':')
        .ok_or_else(|| format!("expected MIN:MAX, got {:?}", value))?;
    let min: f64 = min.trim().parse().map_err(|e| format!("bad minimum {:?}: {}", min, e))?;
    let max: f64 = max.trim().parse().map_err(|e| format!("bad maximum {:?}: {}", max, e))?;
    if !(min < max) {
        return Err(format!("minimum {} must be below maximum {}", min, max));
    }
    Ok(Range::new(min, max))
}

#[derive(Parser, Debug)]
pub struct ResetArgs {
    /// Do not ask for confirmation
    #[arg(long, action = ArgAction::SetTrue)]
    pub yes: bool,
}

#[derive(Parser, Debug)]
pub struct DownloadArgs {
    /// Output CSV path (default: madspeed_log_<timestamp>.csv)
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct SetWifiArgs {
    /// New SSID prefix; the device appends its MAC suffix
    #[arg(long)]
    pub ssid_prefix: String,

    /// New password prefix; the device appends its MAC suffix
    #[arg(long)]
    pub password_prefix: String,
}
