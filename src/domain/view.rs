// Chart window geometry: ranges, pan arithmetic and the data extent
use super::log::LogEntry;

pub const DEFAULT_X_RANGE: Range = Range { min: 0.0, max: 100.0 };
pub const DEFAULT_Y_RANGE: Range = Range { min: 0.0, max: 10.0 };

/// Pan limits below this are treated as "no room to pan"
pub const MIN_PAN_LIMIT: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    pub const ALL: [Axis; 2] = [Axis::X, Axis::Y];

    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn extent(&self) -> f64 {
        self.max - self.min
    }

    pub fn center(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    pub fn around(center: f64, extent: f64) -> Self {
        Self::new(center - extent / 2.0, center + extent / 2.0)
    }

    #[cfg(test)]
    pub fn contains_range(&self, other: &Range, epsilon: f64) -> bool {
        other.min >= self.min - epsilon && other.max <= self.max + epsilon
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    pub x: Range,
    pub y: Range,
}

impl Window {
    pub fn new(x: Range, y: Range) -> Self {
        Self { x, y }
    }

    pub fn axis(&self, axis: Axis) -> Range {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }

    pub fn axis_mut(&mut self, axis: Axis) -> &mut Range {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
        }
    }
}

impl Default for Window {
    fn default() -> Self {
        Self::new(DEFAULT_X_RANGE, DEFAULT_Y_RANGE)
    }
}

/// Fractional position of the window center inside the allowed excursion
/// around the full-range center, `[-1, 1]` per axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PanOffset {
    pub x: f64,
    pub y: f64,
}

impl PanOffset {
    pub fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }

    pub fn set(&mut self, axis: Axis, value: f64) {
        let value = value.clamp(-1.0, 1.0);
        match axis {
            Axis::X => self.x = value,
            Axis::Y => self.y = value,
        }
    }
}

/// Data extent of the full log.
///
/// The window always starts at 0 on both axes and reaches at least 100 m and
/// 10 km/h, so a short or all-zero run still gets a usable chart.
pub fn full_range(entries: &[LogEntry]) -> Window {
    if entries.is_empty() {
        return Window::default();
    }

    let x = entries
        .iter()
        .map(|e| e.distance as f64)
        .fold(DEFAULT_X_RANGE, |r, d| Range::new(r.min.min(d), r.max.max(d)));

    let mut speeds = entries.iter().map(|e| e.speed).filter(|s| *s >= 0.0).peekable();
    let y = if speeds.peek().is_none() {
        DEFAULT_Y_RANGE
    } else {
        let mut y = speeds.fold(DEFAULT_Y_RANGE, |r, s| Range::new(r.min.min(s), r.max.max(s)));
        if y.max == 0.0 {
            y.max = DEFAULT_Y_RANGE.max;
        }
        y
    };

    Window::new(x, y)
}

/// How far the window center may move away from the full-range center.
/// Zero when the window already covers the full range.
pub fn pan_limit(full: Range, current_extent: f64) -> f64 {
    let limit = full.extent() / 2.0 - current_extent / 2.0;
    if limit < 0.0 || limit.abs() < MIN_PAN_LIMIT {
        0.0
    } else {
        limit
    }
}

/// Place a window of unchanged extent at `offset` (clamped to `[-1, 1]`)
pub fn pan_axis(full: Range, current: Range, offset: f64) -> Range {
    let extent = current.extent();
    let limit = pan_limit(full, extent);
    let center = full.center() + limit * offset.clamp(-1.0, 1.0);
    Range::around(center, extent)
}

/// Inverse of [`pan_axis`]: the offset that reproduces `current`'s center.
pub fn offset_of(full: Range, current: Range) -> f64 {
    let mut limit = full.extent() / 2.0 - current.extent() / 2.0;
    if limit <= 0.0 {
        limit = MIN_PAN_LIMIT;
    }
    ((current.center() - full.center()) / limit).clamp(-1.0, 1.0)
}

/// Scale a range around its center, never wider than `full`, and shift it
/// back inside `full` if the grown range would poke out.
pub fn zoom_axis(full: Range, current: Range, scale: f64) -> Range {
    let extent = (current.extent() * scale).min(full.extent());
    let half = extent / 2.0;
    let (lo, hi) = (full.min + half, full.max - half);
    let center = if lo >= hi {
        full.center()
    } else {
        current.center().clamp(lo, hi)
    };
    Range::around(center, extent)
}
