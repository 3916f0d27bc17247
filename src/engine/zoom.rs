use crate::engine::render::{Point, ZoomView};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Pixels one wheel line stands for. Line-mode wheels report about three
/// lines per notch where pixel-mode wheels report about 100 px.
pub const PIXELS_PER_LINE: f64 = 100.0 / 3.0;

/// Finger distance change (px) below which a pinch sample is ignored.
pub const PINCH_DEAD_ZONE: f64 = 1.5;

/// Intensity added or removed per accepted pinch sample, before the
/// configured pinch factor.
pub const PINCH_STEP: f64 = 30.0;

/// Wheel delta as the platform reports it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WheelDelta {
    Pixels(f64),
    Lines(f64),
}

impl WheelDelta {
    /// The delta in pixel units.
    pub fn pixels(self) -> f64 {
        match self {
            WheelDelta::Pixels(d) => d,
            WheelDelta::Lines(d) => d * PIXELS_PER_LINE,
        }
    }
}

/// Intensity change for one wheel event, uniform across delta modes.
pub fn normalize_zoom_factor(delta: WheelDelta, pointer_zoom_factor: f64) -> f64 {
    delta.pixels() * pointer_zoom_factor
}

/// Extra pixels the surface can grow by before exceeding `max_scale` times
/// its own width.
pub fn max_intensity(surface_width: f64, max_scale: f64) -> f64 {
    (surface_width * max_scale - surface_width).max(0.0)
}

/// Which gesture owns the current zoom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomSource {
    Wheel,
    Pinch,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoomChange {
    Unchanged,
    Started(f64),
    Changed(f64),
    Ended,
}

// ---------------------------------------------------------------------------
// ZoomEngine
// ---------------------------------------------------------------------------

/// Zoom intensity and anchor. The anchor is surface-local, in logical units.
#[derive(Debug, Clone)]
pub struct ZoomEngine {
    intensity: f64,
    anchor: Option<Point>,
    source: Option<ZoomSource>,
    pointer_factor: f64,
    pinch_factor: f64,
    max_scale: f64,
}

impl ZoomEngine {
    pub fn new(pointer_factor: f64, pinch_factor: f64, max_scale: f64) -> Self {
        Self {
            intensity: 0.0,
            anchor: None,
            source: None,
            pointer_factor,
            pinch_factor,
            max_scale,
        }
    }

    pub fn intensity(&self) -> f64 {
        self.intensity
    }

    pub fn anchor(&self) -> Option<Point> {
        self.anchor
    }

    pub fn source(&self) -> Option<ZoomSource> {
        self.source
    }

    pub fn is_active(&self) -> bool {
        self.source.is_some()
    }

    pub fn max_intensity(&self, surface_width: f64) -> f64 {
        max_intensity(surface_width, self.max_scale)
    }

    /// Render input while zoomed.
    pub fn view(&self) -> Option<ZoomView> {
        self.source?;
        Some(ZoomView {
            intensity: self.intensity,
            anchor: self.anchor.unwrap_or_default(),
        })
    }

    /// Follow the pointer while a wheel zoom is active.
    pub fn track(&mut self, anchor: Point) {
        if self.source == Some(ZoomSource::Wheel) {
            self.anchor = Some(anchor);
        }
    }

    pub fn wheel(&mut self, delta: WheelDelta, anchor: Point, surface_width: f64) -> ZoomChange {
        let max = self.max_intensity(surface_width);
        let next = self.intensity + normalize_zoom_factor(delta, self.pointer_factor);
        self.anchor = Some(anchor);
        self.apply(next.clamp(0.0, max), ZoomSource::Wheel)
    }

    /// One pinch sample. `distance_delta` is current minus previous finger
    /// distance; `midpoint` is the surface-local finger midpoint.
    pub fn pinch(&mut self, distance_delta: f64, midpoint: Point, surface_width: f64) -> ZoomChange {
        if !distance_delta.is_finite() {
            return ZoomChange::Unchanged;
        }
        let max = self.max_intensity(surface_width);
        let step = self.pinch_factor * PINCH_STEP;
        let next = if distance_delta > PINCH_DEAD_ZONE {
            self.intensity + step
        } else if distance_delta < -PINCH_DEAD_ZONE {
            self.intensity - step
        } else {
            if self.source == Some(ZoomSource::Pinch) {
                self.anchor = Some(midpoint);
                return ZoomChange::Changed(self.intensity);
            }
            return ZoomChange::Unchanged;
        };
        self.anchor = Some(midpoint);
        self.apply(next.clamp(0.0, max), ZoomSource::Pinch)
    }

    fn apply(&mut self, next: f64, source: ZoomSource) -> ZoomChange {
        let was_active = self.is_active();
        self.intensity = next;
        if next > 0.0 {
            self.source = Some(source);
            if was_active {
                ZoomChange::Changed(next)
            } else {
                ZoomChange::Started(next)
            }
        } else {
            self.source = None;
            self.anchor = None;
            if was_active { ZoomChange::Ended } else { ZoomChange::Unchanged }
        }
    }

    /// Keep the intensity inside the range allowed by a new surface width.
    pub fn clamp_to(&mut self, surface_width: f64) -> ZoomChange {
        let max = self.max_intensity(surface_width);
        if self.intensity <= max {
            return ZoomChange::Unchanged;
        }
        match self.source {
            Some(source) => self.apply(max, source),
            None => {
                self.intensity = max;
                ZoomChange::Unchanged
            }
        }
    }

    /// Drop zoom entirely. Safe to call at any time.
    pub fn reset(&mut self) -> ZoomChange {
        let was_active = self.is_active();
        self.intensity = 0.0;
        self.anchor = None;
        self.source = None;
        if was_active { ZoomChange::Ended } else { ZoomChange::Unchanged }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> ZoomEngine {
        ZoomEngine::new(1.0, 1.0, 2.0)
    }

    #[test]
    fn max_intensity_for_600_wide_at_2x() {
        assert_eq!(max_intensity(600.0, 2.0), 600.0);
        assert_eq!(max_intensity(600.0, 1.0), 0.0);
        assert!(max_intensity(800.0, 2.0) > max_intensity(600.0, 2.0));
    }

    #[test]
    fn wheel_clamps_at_max_intensity() {
        let mut z = engine();
        let anchor = Point::new(10.0, 10.0);
        assert_eq!(z.wheel(WheelDelta::Pixels(400.0), anchor, 600.0), ZoomChange::Started(400.0));
        assert_eq!(z.wheel(WheelDelta::Pixels(400.0), anchor, 600.0), ZoomChange::Changed(600.0));
        assert_eq!(z.wheel(WheelDelta::Pixels(400.0), anchor, 600.0), ZoomChange::Changed(600.0));
        assert_eq!(z.intensity(), 600.0);
    }

    #[test]
    fn wheel_back_to_zero_ends_zoom() {
        let mut z = engine();
        z.wheel(WheelDelta::Pixels(50.0), Point::new(1.0, 1.0), 600.0);
        assert_eq!(z.wheel(WheelDelta::Pixels(-80.0), Point::new(1.0, 1.0), 600.0), ZoomChange::Ended);
        assert_eq!(z.intensity(), 0.0);
        assert!(z.anchor().is_none());
        assert!(!z.is_active());
    }

    #[test]
    fn wheel_out_when_idle_is_unchanged() {
        let mut z = engine();
        assert_eq!(z.wheel(WheelDelta::Pixels(-10.0), Point::default(), 600.0), ZoomChange::Unchanged);
        assert!(z.anchor().is_none());
    }

    #[test]
    fn line_mode_matches_pixel_mode_per_notch() {
        let lines = normalize_zoom_factor(WheelDelta::Lines(3.0), 1.0);
        let pixels = normalize_zoom_factor(WheelDelta::Pixels(100.0), 1.0);
        assert!((lines - pixels).abs() < 1e-9);
    }

    #[test]
    fn pinch_dead_zone_ignores_jitter() {
        let mut z = engine();
        assert_eq!(z.pinch(1.0, Point::default(), 600.0), ZoomChange::Unchanged);
        assert_eq!(z.pinch(-1.5, Point::default(), 600.0), ZoomChange::Unchanged);
        assert_eq!(z.intensity(), 0.0);
    }

    #[test]
    fn pinch_steps_by_fixed_amount() {
        let mut z = engine();
        let mid = Point::new(5.0, 6.0);
        assert_eq!(z.pinch(4.0, mid, 600.0), ZoomChange::Started(30.0));
        assert_eq!(z.pinch(4.0, mid, 600.0), ZoomChange::Changed(60.0));
        assert_eq!(z.anchor(), Some(mid));
        assert_eq!(z.pinch(-4.0, mid, 600.0), ZoomChange::Changed(30.0));
        assert_eq!(z.pinch(-4.0, mid, 600.0), ZoomChange::Ended);
        assert_eq!(z.pinch(-4.0, mid, 600.0), ZoomChange::Unchanged);
    }

    #[test]
    fn pinch_respects_max_intensity() {
        let mut z = ZoomEngine::new(1.0, 10.0, 1.5);
        for _ in 0..10 {
            z.pinch(20.0, Point::default(), 400.0);
        }
        assert_eq!(z.intensity(), 200.0);
    }

    #[test]
    fn reset_is_idempotent() {
        let mut z = engine();
        z.wheel(WheelDelta::Pixels(120.0), Point::new(3.0, 3.0), 600.0);
        assert_eq!(z.reset(), ZoomChange::Ended);
        for _ in 0..3 {
            assert_eq!(z.reset(), ZoomChange::Unchanged);
            assert_eq!(z.intensity(), 0.0);
        }
    }

    #[test]
    fn shrinking_surface_clamps_intensity() {
        let mut z = engine();
        z.wheel(WheelDelta::Pixels(500.0), Point::default(), 600.0);
        assert_eq!(z.clamp_to(300.0), ZoomChange::Changed(300.0));
        assert_eq!(z.intensity(), 300.0);
    }

    #[test]
    fn track_only_follows_wheel_zoom() {
        let mut z = engine();
        z.pinch(5.0, Point::new(1.0, 1.0), 600.0);
        z.track(Point::new(9.0, 9.0));
        assert_eq!(z.anchor(), Some(Point::new(1.0, 1.0)));
    }
}
