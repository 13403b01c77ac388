// Chart capability consumed by the view range controller
use crate::domain::log::ChartPoint;
use crate::domain::view::Window;

/// What the controller needs from a chart backend.
///
/// Wheel, pinch and drag zooming belong to the backend: it changes the
/// visible window itself and then reports the gesture to the controller
/// (see `ViewRangeController::on_gesture_zoom`).
pub trait ChartView {
    fn visible_window(&self) -> Window;

    fn set_visible_window(&mut self, window: Window);

    /// Replace the plotted series
    fn set_points(&mut self, points: &[ChartPoint]);

    fn redraw(&mut self);
}
