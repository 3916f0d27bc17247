use crate::engine::index::Control;

/// Semantic state changes for the presentation layer. The engine never
/// knows what chrome exists; the glue maps these onto hints, icons and
/// loaders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Notification {
    FrameChanged { index: usize },
    ZoomStarted,
    ZoomChanged { intensity: f64 },
    ZoomEnded,
    LoadProgress(u8),
    LoadComplete,
    /// `control` just became disabled at a clamped edge.
    EdgeReached(Control),
    /// Every control is enabled again.
    EdgesCleared,
    /// Whether the "drag to rotate" hint may be shown.
    RotateHint { visible: bool },
    AutoplayStarted,
    AutoplayStopped,
    MagnifierOpened,
    MagnifierClosed,
}
