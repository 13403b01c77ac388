// Text-mode chart backend
use crate::application::chart_view::ChartView;
use crate::domain::log::ChartPoint;
use crate::domain::view::{Range, Window};
use tokio::sync::watch;

pub const MIN_WIDTH: usize = 16;
pub const MIN_HEIGHT: usize = 4;

/// Speed over distance plotted into a character grid. Every redraw
/// publishes the rendered frame on a watch channel.
pub struct TerminalChart {
    width: usize,
    height: usize,
    window: Window,
    points: Vec<ChartPoint>,
    frames: watch::Sender<String>,
}

impl TerminalChart {
    pub fn new(width: usize, height: usize) -> (Self, watch::Receiver<String>) {
        let (frames, rx) = watch::channel(String::new());
        let chart = Self {
            width: width.max(MIN_WIDTH),
            height: height.max(MIN_HEIGHT),
            window: Window::default(),
            points: Vec::new(),
            frames,
        };
        (chart, rx)
    }

    pub fn render(&self) -> String {
        let mut grid = vec![vec![' '; self.width]; self.height];

        for point in &self.points {
            let (Some(col), Some(row)) = (
                cell(self.window.x, point.distance, self.width),
                cell(self.window.y, point.speed, self.height),
            ) else {
                continue;
            };
            // rows grow downwards, speed grows upwards
            grid[self.height - 1 - row][col] = '*';
        }

        let mut out = format!("{:>8.1} km/h\n", self.window.y.max);
        for row in grid {
            out.push_str("        |");
            out.extend(row);
            out.push('\n');
        }
        out.push_str(&format!("{:>8.1} +{}\n", self.window.y.min, "-".repeat(self.width)));

        let left = format!("{:.0} m", self.window.x.min);
        let right = format!("{:.0} m", self.window.x.max);
        let gap = (self.width + 1).saturating_sub(left.len() + right.len()).max(1);
        out.push_str(&format!("         {}{}{}", left, " ".repeat(gap), right));
        out
    }
}

/// Grid index of `value` along an axis of `cells` cells, `None` when outside
fn cell(range: Range, value: f64, cells: usize) -> Option<usize> {
    let extent = range.extent();
    if extent <= 0.0 || value < range.min || value > range.max {
        return None;
    }
    let index = ((value - range.min) / extent * (cells - 1) as f64).round() as usize;
    Some(index.min(cells - 1))
}

impl ChartView for TerminalChart {
    fn visible_window(&self) -> Window {
        self.window
    }

    fn set_visible_window(&mut self, window: Window) {
        self.window = window;
    }

    fn set_points(&mut self, points: &[ChartPoint]) {
        self.points = points.to_vec();
    }

    fn redraw(&mut self) {
        self.frames.send_replace(self.render());
    }
}
