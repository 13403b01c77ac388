// View range controller - keeps the chart window consistent with the data
use crate::application::chart_view::ChartView;
use crate::application::snap_back::SnapBack;
use crate::domain::log::{ChartPoint, LogEntry};
use crate::domain::view::{full_range, offset_of, pan_axis, zoom_axis, Axis, PanOffset, Window};
use std::time::Instant;

pub const SLIDER_MIN: f64 = -100.0;
pub const SLIDER_MAX: f64 = 100.0;
/// Extent multiplier for one zoom-in button press (zoom-out uses the inverse step)
pub const ZOOM_IN_SCALE: f64 = 0.9;
pub const ZOOM_OUT_SCALE: f64 = 1.1;

/// Pan sliders are relative nudges: the window sits at
/// `base_offset + slider / 100` and every zoom or slider release folds the
/// current position back into `base_offset` so the slider can rest at 0.
pub struct ViewRangeController<C: ChartView> {
    chart: C,
    full: Window,
    base_offset: PanOffset,
    sliders: [f64; 2],
    snap_backs: [Option<SnapBack>; 2],
    has_data: bool,
}

impl<C: ChartView> ViewRangeController<C> {
    pub fn new(mut chart: C) -> Self {
        let full = Window::default();
        chart.set_visible_window(full);
        Self {
            chart,
            full,
            base_offset: PanOffset::default(),
            sliders: [0.0; 2],
            snap_backs: [None; 2],
            has_data: false,
        }
    }

    #[cfg(test)]
    pub fn chart(&self) -> &C {
        &self.chart
    }

    pub fn full_range(&self) -> Window {
        self.full
    }

    pub fn visible_window(&self) -> Window {
        self.chart.visible_window()
    }

    pub fn pan_offset(&self) -> PanOffset {
        self.base_offset
    }

    pub fn slider(&self, axis: Axis) -> f64 {
        self.sliders[axis.index()]
    }

    pub fn is_animating(&self) -> bool {
        self.snap_backs.iter().any(Option::is_some)
    }

    /// Replace the plotted data set and reframe the chart around it
    pub fn load(&mut self, entries: &[LogEntry], points: &[ChartPoint]) {
        self.chart.set_points(points);
        self.has_data = !entries.is_empty();
        self.recompute_full_range(entries);
    }

    pub fn clear(&mut self) {
        self.load(&[], &[]);
    }

    pub fn recompute_full_range(&mut self, entries: &[LogEntry]) {
        self.full = full_range(entries);
        tracing::debug!(
            "Full range x=[{}, {}] y=[{}, {}]",
            self.full.x.min,
            self.full.x.max,
            self.full.y.min,
            self.full.y.max
        );
        self.reset_zoom();
    }

    /// Window back to the full range, offsets and sliders to rest
    pub fn reset_zoom(&mut self) {
        self.base_offset = PanOffset::default();
        self.sliders = [0.0; 2];
        self.snap_backs = [None; 2];
        self.chart.set_visible_window(self.full);
        self.apply_pan();
    }

    /// Reposition the window from the base offset and slider positions.
    /// Zoom level is never changed here.
    pub fn apply_pan(&mut self) {
        if !self.has_data {
            self.chart.set_visible_window(self.full);
            self.chart.redraw();
            return;
        }

        let current = self.chart.visible_window();
        let mut window = current;
        for axis in Axis::ALL {
            let offset = self.base_offset.get(axis) + self.sliders[axis.index()] / 100.0;
            *window.axis_mut(axis) = pan_axis(self.full.axis(axis), current.axis(axis), offset);
        }

        self.chart.set_visible_window(window);
        self.chart.redraw();
    }

    /// Slider moved by the user; interrupts a snap-back on that axis
    pub fn set_slider(&mut self, axis: Axis, value: f64) {
        let idx = axis.index();
        self.snap_backs[idx] = None;
        self.sliders[idx] = value.clamp(SLIDER_MIN, SLIDER_MAX);
        self.apply_pan();
    }

    /// Slider let go: keep the window where it is and glide the slider home
    pub fn release_slider(&mut self, axis: Axis, now: Instant) {
        let idx = axis.index();
        let window = self.chart.visible_window();
        self.base_offset
            .set(axis, offset_of(self.full.axis(axis), window.axis(axis)));

        let from = self.sliders[idx];
        if from == 0.0 {
            self.snap_backs[idx] = None;
        } else {
            self.snap_backs[idx] = Some(SnapBack::new(from, now));
        }
    }

    /// Advance running snap-backs. Returns whether any is still running.
    pub fn tick(&mut self, now: Instant) -> bool {
        for idx in 0..self.snap_backs.len() {
            if let Some(anim) = self.snap_backs[idx] {
                self.sliders[idx] = anim.value_at(now);
                if anim.is_finished(now) {
                    self.snap_backs[idx] = None;
                }
            }
        }
        self.is_animating()
    }

    pub fn zoom_in(&mut self, axis: Axis) {
        self.zoom_button(axis, ZOOM_IN_SCALE);
    }

    pub fn zoom_out(&mut self, axis: Axis) {
        self.zoom_button(axis, ZOOM_OUT_SCALE);
    }

    fn zoom_button(&mut self, axis: Axis, scale: f64) {
        let mut window = self.chart.visible_window();
        *window.axis_mut(axis) = zoom_axis(self.full.axis(axis), window.axis(axis), scale);
        self.on_gesture_zoom(window);
    }

    /// The chart backend finished a wheel, pinch or drag zoom that produced
    /// `window`. The window is kept (limited to the full extent) and the pan
    /// state is rebased on it so the sliders do not snap it back.
    pub fn on_gesture_zoom(&mut self, window: Window) {
        let mut limited = window;
        for axis in Axis::ALL {
            let full = self.full.axis(axis);
            *limited.axis_mut(axis) = zoom_axis(full, window.axis(axis), 1.0);
        }
        self.chart.set_visible_window(limited);
        self.snap_backs = [None; 2];
        self.sliders = [0.0; 2];

        let degenerate = self.full.x.extent() <= 0.0 || self.full.y.extent() <= 0.0;
        if !self.has_data || degenerate {
            self.base_offset = PanOffset::default();
        } else {
            for axis in Axis::ALL {
                self.base_offset
                    .set(axis, offset_of(self.full.axis(axis), limited.axis(axis)));
            }
        }
        self.chart.redraw();
    }
}
