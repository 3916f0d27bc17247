// Gesture recognizer: classifies normalized pointer/touch/wheel/key input
// into drag rotation, wheel zoom or pinch zoom, and routes it to the frame
// index or the zoom engine.

use std::time::Instant;

use crate::engine::autoplay::TaskKind;
use crate::engine::config::ZoomStart;
use crate::engine::index::{Control, Direction};
use crate::engine::notify::Notification;
use crate::engine::render::Point;
use crate::engine::viewer::{RenderSurface, Viewer};
use crate::engine::zoom::{WheelDelta, ZoomChange, ZoomSource};

// ---------------------------------------------------------------------------
// Input events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    Other,
}

/// Input in the shape the glue layer normalizes to. Positions are client
/// (window) coordinates in logical units.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown { position: Point },
    PointerMove { position: Point },
    PointerUp { position: Point },
    PointerLeave,
    Wheel { position: Point, delta: WheelDelta },
    /// Every finger currently down, in arrival order.
    TouchStart { touches: Vec<Point> },
    TouchMove { touches: Vec<Point> },
    /// Fingers still down after the release.
    TouchEnd { touches: Vec<Point> },
    KeyDown(Key),
    KeyUp(Key),
    ControlPress(Control),
    ControlRelease(Control),
}

// ---------------------------------------------------------------------------
// Mode and sessions
// ---------------------------------------------------------------------------

/// A drag in progress. Displacement from `origin` not yet turned into frame
/// steps carries over to the next move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    pub origin: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinchSession {
    pub previous_distance: f64,
}

/// The one interaction that currently owns the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Mode {
    #[default]
    Idle,
    Dragging(DragSession),
    WheelZooming,
    PinchZooming(PinchSession),
    Autoplaying,
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Idle => "idle",
            Mode::Dragging(_) => "dragging",
            Mode::WheelZooming => "wheel-zooming",
            Mode::PinchZooming(_) => "pinch-zooming",
            Mode::Autoplaying => "autoplaying",
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self, Mode::Dragging(_))
    }

    pub fn is_pinching(&self) -> bool {
        matches!(self, Mode::PinchZooming(_))
    }
}

/// The first two fingers, if there are at least two.
pub fn two_fingers(touches: &[Point]) -> Option<(Point, Point)> {
    match touches {
        [a, b, ..] => Some((*a, *b)),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

impl<S: RenderSurface> Viewer<S> {
    /// Apply one input event. Events before loading completes are ignored;
    /// malformed events leave the state untouched.
    pub fn handle(&mut self, event: InputEvent) {
        if !self.is_interactive() {
            log::trace!("Input ignored while loading");
            return;
        }
        match event {
            InputEvent::PointerDown { position } => self.pointer_down(position),
            InputEvent::PointerMove { position } => self.pointer_move(position),
            InputEvent::PointerUp { position } => self.pointer_up(position),
            InputEvent::PointerLeave => self.pointer_leave(),
            InputEvent::Wheel { position, delta } => self.wheel(position, delta),
            InputEvent::TouchStart { touches } => self.touch_start(&touches),
            InputEvent::TouchMove { touches } => self.touch_move(&touches),
            InputEvent::TouchEnd { touches } => self.touch_end(&touches),
            InputEvent::KeyDown(key) => self.key_down(key),
            InputEvent::KeyUp(key) => self.key_up(key),
            InputEvent::ControlPress(control) => self.control_press(control),
            InputEvent::ControlRelease(control) => self.control_release(control),
        }
    }

    pub(super) fn set_mode(&mut self, mode: Mode) {
        if self.mode.is_dragging() && mode.is_pinching() {
            log::debug!("Drag session discarded by pinch");
        }
        if self.mode.name() != mode.name() {
            log::debug!("Mode {} -> {}", self.mode.name(), mode.name());
        }
        self.mode = mode;
    }

    fn surface_pixel_width(&self) -> f64 {
        self.geometry.pixel_width()
    }

    fn show_hint_if_unzoomed(&mut self) {
        let visible = self.zoom.intensity() == 0.0;
        self.emit(Notification::RotateHint { visible });
    }

    // -----------------------------------------------------------------------
    // Mouse
    // -----------------------------------------------------------------------

    fn pointer_down(&mut self, position: Point) {
        self.pointer = Some(position);
        self.close_magnifier();
        self.interrupt_automation();

        self.clicked_to_zoom = true;
        if !self.config.drag_enabled || self.mode.is_pinching() {
            return;
        }
        self.set_mode(Mode::Dragging(DragSession { origin: position.x }));
    }

    fn pointer_move(&mut self, position: Point) {
        self.pointer = Some(position);
        if self.magnifier_open {
            return;
        }
        let local = self.to_local(position);
        self.zoom.track(local);

        match self.mode {
            Mode::Dragging(_) => {
                if !self.drag_to(position.x) && self.zoom.is_active() {
                    self.render();
                }
            }
            Mode::WheelZooming => self.render(),
            _ => {}
        }
    }

    fn pointer_up(&mut self, position: Point) {
        self.pointer = Some(position);
        if !self.mode.is_dragging() {
            return;
        }
        let next = if self.zoom.source() == Some(ZoomSource::Wheel) {
            Mode::WheelZooming
        } else {
            Mode::Idle
        };
        self.set_mode(next);
        if self.zoom.intensity() == 0.0 {
            self.emit(Notification::RotateHint { visible: true });
        }
    }

    fn pointer_leave(&mut self) {
        self.pointer = None;
        if self.config.release.reset_on_pointer_leave {
            self.reset_zoom();
        }
    }

    fn wheel(&mut self, position: Point, delta: WheelDelta) {
        if !self.config.pointer_zoom || self.config.fullscreen || self.magnifier_open {
            return;
        }
        let armed = match self.config.zoom_start {
            ZoomStart::ClickToStart => self.clicked_to_zoom,
            ZoomStart::ScrollToStart => true,
        };
        if !armed || self.mode.is_pinching() {
            return;
        }

        self.pointer = Some(position);
        self.interrupt_automation();
        self.emit(Notification::RotateHint { visible: false });

        let anchor = self.to_local(position);
        let change = self.zoom.wheel(delta, anchor, self.surface_pixel_width());
        // A held drag keeps its session; pointer-up hands over to the zoom.
        let dragging = self.mode.is_dragging();
        if !dragging {
            let next = if self.zoom.is_active() { Mode::WheelZooming } else { Mode::Idle };
            self.set_mode(next);
        }
        self.emit_zoom(change);
        if change == ZoomChange::Unchanged && !self.zoom.is_active() && !dragging {
            self.show_hint_if_unzoomed();
        }
        self.render();
    }

    /// Turn the drag displacement into frame steps. Returns whether a step
    /// was applied.
    fn drag_to(&mut self, x: f64) -> bool {
        let Mode::Dragging(session) = self.mode else {
            return false;
        };
        let Some(steps) = self.index.translate_drag(x - session.origin) else {
            return false;
        };
        self.mode = Mode::Dragging(DragSession {
            origin: session.origin + steps.consumed,
        });
        self.apply_step(steps.direction, steps.count);
        true
    }

    // -----------------------------------------------------------------------
    // Touch
    // -----------------------------------------------------------------------

    fn touch_start(&mut self, touches: &[Point]) {
        let Some(&first) = touches.first() else {
            return;
        };
        let magnifier_was_open = self.magnifier_open;
        self.close_magnifier();
        self.interrupt_automation();

        if self.config.pinch_zoom && !magnifier_was_open {
            if let Some((a, b)) = two_fingers(touches) {
                self.begin_pinch(a, b);
                return;
            }
        }
        if !self.config.drag_enabled || self.mode.is_pinching() {
            return;
        }
        self.set_mode(Mode::Dragging(DragSession { origin: first.x }));
    }

    fn begin_pinch(&mut self, a: Point, b: Point) {
        self.set_mode(Mode::PinchZooming(PinchSession {
            previous_distance: a.distance(b),
        }));
        self.emit(Notification::RotateHint { visible: false });
    }

    fn touch_move(&mut self, touches: &[Point]) {
        match self.mode {
            Mode::PinchZooming(session) => {
                let Some((a, b)) = two_fingers(touches) else {
                    return;
                };
                let distance = a.distance(b);
                let midpoint = self.to_local(a.midpoint(b));
                let change = self.zoom.pinch(
                    distance - session.previous_distance,
                    midpoint,
                    self.surface_pixel_width(),
                );
                self.mode = Mode::PinchZooming(PinchSession { previous_distance: distance });
                self.emit_zoom(change);
                if change != ZoomChange::Unchanged {
                    self.render();
                }
            }
            Mode::Dragging(_) => {
                if self.config.pinch_zoom && !self.magnifier_open {
                    if let Some((a, b)) = two_fingers(touches) {
                        self.begin_pinch(a, b);
                        return;
                    }
                }
                let Some(first) = touches.first() else {
                    return;
                };
                if !self.drag_to(first.x) && self.zoom.is_active() {
                    self.render();
                }
            }
            _ => {}
        }
    }

    fn touch_end(&mut self, _remaining: &[Point]) {
        if !(self.mode.is_dragging() || self.mode.is_pinching()) {
            return;
        }
        if self.config.release.reset_on_touch_end && self.zoom.intensity() != 0.0 {
            self.reset_zoom();
        }
        self.set_mode(Mode::Idle);
        self.show_hint_if_unzoomed();
    }

    // -----------------------------------------------------------------------
    // Keys and controls
    // -----------------------------------------------------------------------

    fn key_down(&mut self, key: Key) {
        self.close_magnifier();
        self.interrupt_automation();
        if !self.config.keys {
            return;
        }
        let direction = match key {
            Key::ArrowLeft => Direction::Up,
            Key::ArrowRight => Direction::Down,
            Key::Other => return,
        };
        let direction = if self.config.spin_reverse { direction.flip() } else { direction };
        self.apply_step(direction, 1);
        self.emit(Notification::RotateHint { visible: false });
    }

    fn key_up(&mut self, key: Key) {
        if self.config.keys && key != Key::Other {
            self.show_hint_if_unzoomed();
        }
    }

    fn control_press(&mut self, control: Control) {
        self.close_magnifier();
        self.interrupt_automation();

        let direction = self.index.direction_of(control);
        self.apply_step(direction, 1);
        self.emit(Notification::RotateHint { visible: false });

        let interval = self.config.autoplay_interval(self.frames.len());
        self.task = Some(
            self.scheduler
                .schedule(TaskKind::Repeat(control), interval, Instant::now()),
        );
    }

    fn control_release(&mut self, control: Control) {
        if self.scheduler.current() == Some(TaskKind::Repeat(control)) {
            if let Some(handle) = self.task.take() {
                self.scheduler.cancel_handle(handle);
            }
        }
        self.show_hint_if_unzoomed();
    }
}
