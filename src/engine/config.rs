use std::time::Duration;

use crate::engine::error::{ConfigError, Result};

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

pub const DEFAULT_DRAG_SPEED: f64 = 150.0;
pub const DEFAULT_AUTOPLAY_SPEED: f64 = 80.0;
pub const DEFAULT_MAX_SCALE: f64 = 2.0;
pub const DEFAULT_MAGNIFIER_LEVEL: f64 = 3.0;

/// Frame count the speed constants are calibrated against.
pub const REFERENCE_FRAME_COUNT: f64 = 36.0;

// ---------------------------------------------------------------------------
// Policies
// ---------------------------------------------------------------------------

/// Index movement past the first/last frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgePolicy {
    /// Cyclic: stepping past N lands on 1 and vice versa.
    #[default]
    Wrap,
    /// Saturate at 1 and N.
    Clamp,
}

/// What arms wheel zoom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZoomStart {
    /// A press inside the viewer must come first.
    ClickToStart,
    #[default]
    ScrollToStart,
}

/// When zoom is dropped as a side effect of the pointer going away. Kept per
/// input modality: touch and mouse deliberately differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleasePolicy {
    pub reset_on_touch_end: bool,
    pub reset_on_pointer_leave: bool,
}

impl Default for ReleasePolicy {
    fn default() -> Self {
        Self {
            reset_on_touch_end: true,
            reset_on_pointer_leave: false,
        }
    }
}

// ---------------------------------------------------------------------------
// ViewerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub edge_policy: EdgePolicy,
    pub spin_reverse: bool,
    /// Inverts the prev/next controls on top of `spin_reverse`.
    pub control_reverse: bool,

    pub drag_enabled: bool,
    /// Screen distance scale for one frame step; higher is slower.
    pub drag_speed: f64,
    pub keys: bool,

    pub pointer_zoom: bool,
    pub pinch_zoom: bool,
    pub pointer_zoom_factor: f64,
    pub pinch_zoom_factor: f64,
    pub max_scale: f64,
    pub zoom_start: ZoomStart,
    pub release: ReleasePolicy,

    pub autoplay: bool,
    /// Milliseconds per frame for a 36-frame sequence.
    pub autoplay_speed: f64,
    pub autoplay_reverse: bool,
    pub play_once: bool,

    /// 1-based frame shown once loading completes.
    pub start_frame: Option<usize>,
    /// Magnifier lens level; `None` disables the magnifier.
    pub magnifier: Option<f64>,
    /// This instance is the fullscreen view.
    pub fullscreen: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            edge_policy: EdgePolicy::Wrap,
            spin_reverse: false,
            control_reverse: false,
            drag_enabled: true,
            drag_speed: DEFAULT_DRAG_SPEED,
            keys: true,
            pointer_zoom: true,
            pinch_zoom: true,
            pointer_zoom_factor: 1.0,
            pinch_zoom_factor: 1.0,
            max_scale: DEFAULT_MAX_SCALE,
            zoom_start: ZoomStart::ScrollToStart,
            release: ReleasePolicy::default(),
            autoplay: false,
            autoplay_speed: DEFAULT_AUTOPLAY_SPEED,
            autoplay_reverse: false,
            play_once: false,
            start_frame: None,
            magnifier: None,
            fullscreen: false,
        }
    }
}

impl ViewerConfig {
    pub fn validate(&self, frame_count: usize) -> Result<()> {
        if frame_count == 0 {
            return Err(ConfigError::EmptySequence);
        }
        positive("drag speed", self.drag_speed)?;
        positive("autoplay speed", self.autoplay_speed)?;
        positive("pointer zoom factor", self.pointer_zoom_factor)?;
        positive("pinch zoom factor", self.pinch_zoom_factor)?;
        if !(self.max_scale >= 1.0) || !self.max_scale.is_finite() {
            return Err(ConfigError::MaxScale(self.max_scale));
        }
        if let Some(level) = self.magnifier {
            positive("magnifier level", level)?;
        }
        if let Some(index) = self.start_frame {
            if index == 0 || index > frame_count {
                return Err(ConfigError::StartFrameOutOfRange { index, total: frame_count });
            }
        }
        Ok(())
    }

    /// Direction flip applied to the prev/next controls and edge markers.
    pub fn effective_reverse(&self) -> bool {
        self.spin_reverse ^ self.control_reverse
    }

    /// Autoplay and hold-to-repeat period for a sequence of `frame_count`.
    pub fn autoplay_interval(&self, frame_count: usize) -> Duration {
        let ms = self.autoplay_speed * REFERENCE_FRAME_COUNT / frame_count.max(1) as f64;
        Duration::from_micros((ms.max(1.0) * 1000.0).round() as u64)
    }
}

fn positive(name: &'static str, value: f64) -> Result<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { name, value })
    }
}
