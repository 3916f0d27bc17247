use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use winit::keyboard::{Key as WinitKey, NamedKey};
use winit::window::{Fullscreen, Window};

use spin360::engine::render::device_pixel_scale;
use spin360::engine::{
    ConfigError, Control, EdgeControls, Frame, InputEvent, Key, LoadError, Notification, Point,
    Rect, RenderSurface, Size, SurfaceGeometry, Viewer, ViewerConfig, WheelDelta,
};

use crate::cli::HELP_KEYS;
use crate::ui::canvas::CanvasSurface;
use crate::ui::render::{background, blit_scaled, copy_pixels, draw_text, fill_rect, stroke_rect, text_width};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Height of the control bar along the bottom edge, logical px.
const BAR_HEIGHT: f64 = 44.0;
const BUTTON_WIDTH: f64 = 64.0;
const BUTTON_MARGIN: f64 = 8.0;

const WHITE: (u8, u8, u8, u8) = (255, 255, 255, 255);
const DIMMED: (u8, u8, u8, u8) = (110, 110, 110, 255);

// ---------------------------------------------------------------------------
// Chrome: presentation state fed by notifications
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Chrome {
    pub frame: usize,
    /// Load percentage while loading, `None` once every frame settled.
    pub progress: Option<u8>,
    pub hint_visible: bool,
    pub zoom_intensity: f64,
    pub edges: EdgeControls,
    pub autoplaying: bool,
    pub magnifier_open: bool,
}

impl Chrome {
    fn new(frame: usize) -> Self {
        Self {
            frame,
            progress: Some(0),
            hint_visible: true,
            zoom_intensity: 0.0,
            edges: EdgeControls::ENABLED,
            autoplaying: false,
            magnifier_open: false,
        }
    }

    pub fn apply(&mut self, notification: Notification) {
        match notification {
            Notification::FrameChanged { index } => self.frame = index,
            Notification::ZoomStarted => {}
            Notification::ZoomChanged { intensity } => self.zoom_intensity = intensity,
            Notification::ZoomEnded => self.zoom_intensity = 0.0,
            Notification::LoadProgress(percent) => {
                if self.progress.is_some() {
                    self.progress = Some(percent);
                }
            }
            Notification::LoadComplete => self.progress = None,
            Notification::EdgeReached(Control::Prev) => self.edges.prev = false,
            Notification::EdgeReached(Control::Next) => self.edges.next = false,
            Notification::EdgesCleared => self.edges = EdgeControls::ENABLED,
            Notification::RotateHint { visible } => self.hint_visible = visible,
            Notification::AutoplayStarted => self.autoplaying = true,
            Notification::AutoplayStopped => self.autoplaying = false,
            Notification::MagnifierOpened => self.magnifier_open = true,
            Notification::MagnifierClosed => self.magnifier_open = false,
        }
    }
}

/// A viewer plus the chrome that mirrors it.
struct Instance {
    viewer: Viewer<CanvasSurface>,
    chrome: Chrome,
}

impl Instance {
    fn new(viewer: Viewer<CanvasSurface>) -> Self {
        let chrome = Chrome::new(viewer.active_index());
        let mut instance = Self { viewer, chrome };
        instance.pump();
        instance
    }

    /// Move pending notifications into the chrome. Returns whether any
    /// arrived.
    fn pump(&mut self) -> bool {
        let notifications = self.viewer.drain_notifications();
        for n in &notifications {
            log::trace!("{:?}", n);
            self.chrome.apply(*n);
        }
        !notifications.is_empty()
    }
}

/// A second copy of a load result for the fullscreen instance.
fn duplicate(result: &Result<Frame, LoadError>, path: Option<&PathBuf>) -> Result<Frame, LoadError> {
    match result {
        Ok(frame) => Ok(frame.clone()),
        Err(e) => Err(LoadError::Source {
            path: path.map(|p| p.display().to_string()).unwrap_or_default(),
            message: e.to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Viewer state
// ---------------------------------------------------------------------------

pub struct ViewerState {
    pub files: Arc<Vec<PathBuf>>,
    config: ViewerConfig,
    inline: Instance,
    fullscreen: Option<Instance>,

    /// Window size, logical px.
    window_size: Size,
    device_pixel_scale: f64,

    cursor: Option<Point>,
    /// Fingers currently down, in arrival order.
    fingers: Vec<(u64, Point)>,
    held_control: Option<Control>,
    pub show_help: bool,
}

impl ViewerState {
    pub fn new(files: Arc<Vec<PathBuf>>, config: ViewerConfig, window_size: Size) -> Result<Self, ConfigError> {
        let viewport = Rect::new(0.0, 0.0, window_size.width, (window_size.height - BAR_HEIGHT).max(1.0));
        let geometry = SurfaceGeometry::new(Size::new(viewport.width, viewport.height), 1.0);
        let viewer = Viewer::new(config.clone(), files.len(), CanvasSurface::new(viewport), geometry)?;
        Ok(Self {
            files,
            config,
            inline: Instance::new(viewer),
            fullscreen: None,
            window_size,
            device_pixel_scale: 1.0,
            cursor: None,
            fingers: Vec::new(),
            held_control: None,
            show_help: false,
        })
    }

    fn active(&self) -> &Instance {
        self.fullscreen.as_ref().unwrap_or(&self.inline)
    }

    fn active_mut(&mut self) -> &mut Instance {
        self.fullscreen.as_mut().unwrap_or(&mut self.inline)
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen.is_some()
    }

    // -----------------------------------------------------------------------
    // Layout
    // -----------------------------------------------------------------------

    fn viewport(&self) -> Rect {
        Rect::new(
            0.0,
            0.0,
            self.window_size.width,
            (self.window_size.height - BAR_HEIGHT).max(1.0),
        )
    }

    /// Inline container: the widest box of the frames' aspect ratio that
    /// fits the viewport.
    fn inline_geometry(&self) -> SurfaceGeometry {
        let viewport = self.viewport();
        let width = match self.inline.viewer.frames().aspect_ratio() {
            Some(ratio) if ratio > 0.0 => viewport.width.min(viewport.height / ratio),
            _ => viewport.width,
        };
        SurfaceGeometry::new(Size::new(width.floor(), viewport.height), self.device_pixel_scale)
    }

    fn fullscreen_geometry(&self) -> SurfaceGeometry {
        let viewport = self.viewport();
        SurfaceGeometry::new(Size::new(viewport.width, viewport.height), self.device_pixel_scale)
    }

    /// New window size (physical px) or scale factor.
    pub fn resize(&mut self, physical_width: u32, physical_height: u32, scale_factor: f64) {
        self.device_pixel_scale = device_pixel_scale(scale_factor);
        self.window_size = Size::new(
            physical_width as f64 / self.device_pixel_scale,
            physical_height as f64 / self.device_pixel_scale,
        );
        log::debug!(
            "Window {}x{} logical at {}x",
            self.window_size.width,
            self.window_size.height,
            self.device_pixel_scale
        );
        self.relayout();
    }

    fn relayout(&mut self) {
        let viewport = self.viewport();
        let inline = self.inline_geometry();
        self.inline.viewer.surface_mut().set_viewport(viewport);
        self.inline.viewer.set_geometry(inline);
        self.inline.pump();

        let full = self.fullscreen_geometry();
        if let Some(instance) = self.fullscreen.as_mut() {
            instance.viewer.surface_mut().set_viewport(viewport);
            instance.viewer.set_geometry(full);
            instance.pump();
        }
    }

    fn prev_button(&self) -> Rect {
        Rect::new(
            BUTTON_MARGIN,
            self.window_size.height - BAR_HEIGHT + 6.0,
            BUTTON_WIDTH,
            BAR_HEIGHT - 12.0,
        )
    }

    fn next_button(&self) -> Rect {
        Rect::new(
            self.window_size.width - BUTTON_MARGIN - BUTTON_WIDTH,
            self.window_size.height - BAR_HEIGHT + 6.0,
            BUTTON_WIDTH,
            BAR_HEIGHT - 12.0,
        )
    }

    fn control_at(&self, point: Point) -> Option<Control> {
        let hit = |r: Rect| point.x >= r.x && point.x < r.right() && point.y >= r.y && point.y < r.bottom();
        let control = if hit(self.prev_button()) {
            Control::Prev
        } else if hit(self.next_button()) {
            Control::Next
        } else {
            return None;
        };
        let instance = self.active();
        (instance.viewer.is_interactive() && instance.chrome.edges.is_enabled(control)).then_some(control)
    }

    // -----------------------------------------------------------------------
    // Loading and timers
    // -----------------------------------------------------------------------

    pub fn on_frame_loaded(&mut self, index: usize, result: Result<Frame, LoadError>) {
        let had_ratio = self.inline.viewer.frames().aspect_ratio().is_some();
        if let Some(instance) = self.fullscreen.as_mut() {
            let copy = duplicate(&result, self.files.get(index.wrapping_sub(1)));
            instance.viewer.on_frame_loaded(index, copy);
            instance.pump();
        }
        self.inline.viewer.on_frame_loaded(index, result);
        self.inline.pump();

        if !had_ratio && self.inline.viewer.frames().aspect_ratio().is_some() {
            self.relayout();
        }
    }

    /// Run due autoplay and repeat ticks. Returns the earliest next deadline
    /// and whether anything changed on screen.
    pub fn tick(&mut self, now: Instant) -> (Option<Instant>, bool) {
        let mut deadline = self.inline.viewer.tick(now);
        let mut changed = self.inline.pump();
        if let Some(instance) = self.fullscreen.as_mut() {
            let d = instance.viewer.tick(now);
            changed |= instance.pump();
            deadline = match (deadline, d) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            };
        }
        (deadline, changed)
    }

    fn send(&mut self, event: InputEvent) {
        let instance = self.active_mut();
        instance.viewer.handle(event);
        instance.pump();
    }

    // -----------------------------------------------------------------------
    // Fullscreen
    // -----------------------------------------------------------------------

    pub fn toggle_fullscreen(&mut self, window: &Window) {
        if self.fullscreen.take().is_some() {
            log::info!("Leaving fullscreen view");
            window.set_fullscreen(None);
            return;
        }
        let mut config = self.config.clone();
        config.fullscreen = true;
        config.start_frame = Some(self.inline.viewer.active_index());
        let surface = CanvasSurface::new(self.viewport());
        let frames = self.inline.viewer.frames().clone();
        match Viewer::with_frames(config, frames, surface, self.fullscreen_geometry()) {
            Ok(viewer) => {
                log::info!("Entering fullscreen view at frame {}", viewer.active_index());
                self.inline.viewer.stop();
                self.inline.pump();
                self.fullscreen = Some(Instance::new(viewer));
                window.set_fullscreen(Some(Fullscreen::Borderless(None)));
            }
            Err(e) => log::error!("Cannot open fullscreen view: {}", e),
        }
    }

    // -----------------------------------------------------------------------
    // Input mapping
    // -----------------------------------------------------------------------

    /// Returns true if the app should quit.
    pub fn key_event(&mut self, key: &WinitKey, pressed: bool, window: &Window) -> bool {
        let spin_key = match key {
            WinitKey::Named(NamedKey::ArrowLeft) => Some(Key::ArrowLeft),
            WinitKey::Named(NamedKey::ArrowRight) => Some(Key::ArrowRight),
            _ => None,
        };
        if let Some(k) = spin_key {
            self.send(if pressed { InputEvent::KeyDown(k) } else { InputEvent::KeyUp(k) });
            return false;
        }
        if !pressed {
            return false;
        }

        match key {
            WinitKey::Named(NamedKey::Escape) => {
                if self.show_help {
                    self.show_help = false;
                } else if self.is_fullscreen() {
                    self.toggle_fullscreen(window);
                } else {
                    return true;
                }
            }
            WinitKey::Character(s) => match s.as_str() {
                "q" => return true,
                "f" => self.toggle_fullscreen(window),
                "?" => self.show_help = !self.show_help,
                "p" => {
                    let instance = self.active_mut();
                    if !instance.viewer.stop() {
                        instance.viewer.play(Instant::now());
                    }
                    instance.pump();
                }
                "m" => {
                    let instance = self.active_mut();
                    if !instance.viewer.close_magnifier() {
                        instance.viewer.open_magnifier();
                    }
                    instance.pump();
                }
                "0" => {
                    let instance = self.active_mut();
                    instance.viewer.reset_zoom();
                    instance.pump();
                }
                _ => self.send(InputEvent::KeyDown(Key::Other)),
            },
            _ => self.send(InputEvent::KeyDown(Key::Other)),
        }
        false
    }

    fn to_logical(&self, x: f64, y: f64) -> Point {
        Point::new(x / self.device_pixel_scale, y / self.device_pixel_scale)
    }

    pub fn cursor_moved(&mut self, x: f64, y: f64) {
        let position = self.to_logical(x, y);
        self.cursor = Some(position);
        self.send(InputEvent::PointerMove { position });
    }

    pub fn cursor_left(&mut self) {
        self.cursor = None;
        self.send(InputEvent::PointerLeave);
    }

    pub fn mouse_button(&mut self, pressed: bool) {
        let Some(position) = self.cursor else {
            return;
        };
        if pressed {
            if self.show_help {
                self.show_help = false;
                return;
            }
            if let Some(control) = self.control_at(position) {
                self.held_control = Some(control);
                self.send(InputEvent::ControlPress(control));
            } else if position.y < self.viewport().bottom() {
                self.send(InputEvent::PointerDown { position });
            }
        } else if let Some(control) = self.held_control.take() {
            self.send(InputEvent::ControlRelease(control));
        } else {
            self.send(InputEvent::PointerUp { position });
        }
    }

    pub fn wheel_lines(&mut self, lines_y: f64) {
        self.wheel(WheelDelta::Lines(-lines_y));
    }

    pub fn wheel_pixels(&mut self, physical_y: f64) {
        self.wheel(WheelDelta::Pixels(-physical_y / self.device_pixel_scale));
    }

    fn wheel(&mut self, delta: WheelDelta) {
        let Some(position) = self.cursor else {
            return;
        };
        self.send(InputEvent::Wheel { position, delta });
    }

    fn touches(&self) -> Vec<Point> {
        self.fingers.iter().map(|(_, p)| *p).collect()
    }

    pub fn touch_started(&mut self, id: u64, x: f64, y: f64) {
        let position = self.to_logical(x, y);
        if self.fingers.is_empty() {
            if let Some(control) = self.control_at(position) {
                self.held_control = Some(control);
                self.send(InputEvent::ControlPress(control));
                return;
            }
        }
        self.fingers.retain(|(f, _)| *f != id);
        self.fingers.push((id, position));
        let touches = self.touches();
        self.send(InputEvent::TouchStart { touches });
    }

    pub fn touch_moved(&mut self, id: u64, x: f64, y: f64) {
        let position = self.to_logical(x, y);
        let Some(finger) = self.fingers.iter_mut().find(|(f, _)| *f == id) else {
            return;
        };
        finger.1 = position;
        let touches = self.touches();
        self.send(InputEvent::TouchMove { touches });
    }

    pub fn touch_ended(&mut self, id: u64) {
        if self.fingers.is_empty() {
            if let Some(control) = self.held_control.take() {
                self.send(InputEvent::ControlRelease(control));
            }
            return;
        }
        self.fingers.retain(|(f, _)| *f != id);
        let touches = self.touches();
        self.send(InputEvent::TouchEnd { touches });
    }

    // -----------------------------------------------------------------------
    // Rendering
    // -----------------------------------------------------------------------

    /// Render into the softbuffer framebuffer (u32 per pixel, 0x00RRGGBB).
    pub fn render(&self, frame: &mut [u32], fb_w: u32, fb_h: u32) {
        frame.fill(background());

        let dpr = self.device_pixel_scale;
        let px = |v: f64| (v * dpr).round() as i32;
        let instance = self.active();
        let viewer = &instance.viewer;
        let chrome = &instance.chrome;

        // Canvas
        let canvas = viewer.surface();
        let origin = canvas.origin();
        let (ox, oy) = (px(origin.x), px(origin.y));
        copy_pixels(frame, fb_w, fb_h, canvas.pixels(), canvas.width(), canvas.height(), ox, oy);

        // Magnifier lens
        if let Some((bitmap, lens)) = viewer.magnifier_view() {
            let mut dest = lens.dest;
            dest.x += ox as f64;
            dest.y += oy as f64;
            let (lx, ly) = (dest.x.round() as i32, dest.y.round() as i32);
            fill_rect(frame, fb_w, fb_h, lx, ly, lens.pixel_width, lens.pixel_height, (0, 0, 0, 255));
            blit_scaled(frame, fb_w, fb_h, bitmap, lens.source_rect, dest);
            stroke_rect(frame, fb_w, fb_h, lx, ly, lens.pixel_width, lens.pixel_height, 2 * dpr as u32, WHITE);
        }

        let text_scale = 2 * dpr as u32;
        let line_h = (7 * text_scale) as i32;
        let viewport = self.viewport();

        // Load progress
        if let Some(percent) = chrome.progress {
            let bar_w = px(viewport.width * 0.4).max(1) as u32;
            let bar_x = (fb_w as i32 - bar_w as i32) / 2;
            let bar_y = px(viewport.height / 2.0);
            let bar_h = px(6.0).max(1) as u32;
            fill_rect(frame, fb_w, fb_h, bar_x, bar_y, bar_w, bar_h, (255, 255, 255, 60));
            let done = (bar_w as f64 * percent as f64 / 100.0) as u32;
            fill_rect(frame, fb_w, fb_h, bar_x, bar_y, done, bar_h, WHITE);
            let label = format!("Loading {}%", percent);
            let lx = (fb_w as i32 - text_width(&label, text_scale) as i32) / 2;
            draw_text(frame, fb_w, fb_h, &label, lx, bar_y - line_h - px(8.0), text_scale, WHITE);
        }

        // Rotate hint
        if chrome.progress.is_none() && chrome.hint_visible && !chrome.magnifier_open {
            let hint = "< drag to rotate >";
            let hx = (fb_w as i32 - text_width(hint, text_scale) as i32) / 2;
            let hy = px(viewport.bottom()) - line_h - px(12.0);
            fill_rect(frame, fb_w, fb_h, hx - px(8.0), hy - px(6.0), text_width(hint, text_scale) + px(16.0) as u32, (line_h + px(12.0)) as u32, (0, 0, 0, 140));
            draw_text(frame, fb_w, fb_h, hint, hx, hy, text_scale, WHITE);
        }

        // Status line: zoom and autoplay
        let mut status = Vec::new();
        if chrome.zoom_intensity > 0.0 {
            let scale = 1.0 + chrome.zoom_intensity / viewer.geometry().pixel_width().max(1.0);
            status.push(format!("zoom {:.0}%", scale * 100.0));
        }
        if chrome.autoplaying {
            status.push("autoplay".to_string());
        }
        if chrome.magnifier_open {
            status.push("magnifier".to_string());
        }
        if !status.is_empty() {
            let line = status.join(" | ");
            let sx = fb_w as i32 - text_width(&line, text_scale) as i32 - px(12.0);
            draw_text(frame, fb_w, fb_h, &line, sx, px(12.0), text_scale, WHITE);
        }

        // Control bar
        let bar_y = px(viewport.bottom());
        fill_rect(frame, fb_w, fb_h, 0, bar_y, fb_w, fb_h.saturating_sub(bar_y.max(0) as u32), (0, 0, 0, 180));
        for (control, rect, label) in [
            (Control::Prev, self.prev_button(), "<"),
            (Control::Next, self.next_button(), ">"),
        ] {
            let enabled = viewer.is_interactive() && chrome.edges.is_enabled(control);
            let color = if enabled { WHITE } else { DIMMED };
            let (bx, by) = (px(rect.x), px(rect.y));
            let (bw, bh) = (px(rect.width) as u32, px(rect.height) as u32);
            if self.held_control == Some(control) {
                fill_rect(frame, fb_w, fb_h, bx, by, bw, bh, (255, 255, 255, 50));
            }
            stroke_rect(frame, fb_w, fb_h, bx, by, bw, bh, dpr as u32, color);
            let tx = bx + (bw as i32 - text_width(label, text_scale) as i32) / 2;
            let ty = by + (bh as i32 - line_h) / 2;
            draw_text(frame, fb_w, fb_h, label, tx, ty, text_scale, color);
        }
        let counter = format!("{} / {}", chrome.frame, viewer.frame_count());
        let cx = (fb_w as i32 - text_width(&counter, text_scale) as i32) / 2;
        let cy = bar_y + (px(BAR_HEIGHT) - line_h) / 2;
        draw_text(frame, fb_w, fb_h, &counter, cx, cy, text_scale, WHITE);

        // Help Overlay
        if self.show_help {
            fill_rect(frame, fb_w, fb_h, 0, 0, fb_w, fb_h, (0, 0, 0, 200));
            let mut y = px(20.0);
            for line in HELP_KEYS.lines() {
                draw_text(frame, fb_w, fb_h, line, px(20.0), y, text_scale, WHITE);
                y += line_h + px(10.0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chrome_tracks_edges_and_loading() {
        let mut chrome = Chrome::new(1);
        chrome.apply(Notification::LoadProgress(50));
        assert_eq!(chrome.progress, Some(50));
        chrome.apply(Notification::LoadComplete);
        assert_eq!(chrome.progress, None);
        chrome.apply(Notification::LoadProgress(100));
        assert_eq!(chrome.progress, None);

        chrome.apply(Notification::EdgeReached(Control::Prev));
        assert!(!chrome.edges.prev && chrome.edges.next);
        chrome.apply(Notification::EdgesCleared);
        assert_eq!(chrome.edges, EdgeControls::ENABLED);
    }

    #[test]
    fn chrome_follows_zoom_and_hint() {
        let mut chrome = Chrome::new(1);
        chrome.apply(Notification::RotateHint { visible: false });
        chrome.apply(Notification::ZoomStarted);
        chrome.apply(Notification::ZoomChanged { intensity: 120.0 });
        assert_eq!(chrome.zoom_intensity, 120.0);
        assert!(!chrome.hint_visible);
        chrome.apply(Notification::ZoomEnded);
        chrome.apply(Notification::RotateHint { visible: true });
        assert_eq!(chrome.zoom_intensity, 0.0);
        assert!(chrome.hint_visible);
    }

    #[test]
    fn render_places_canvas_at_its_origin() {
        use crate::ui::render::rgb;
        use spin360::engine::Bitmap;

        let files = Arc::new(vec![PathBuf::from("a.png"), PathBuf::from("b.png")]);
        let mut state = ViewerState::new(files, ViewerConfig::default(), Size::new(1024.0, 768.0)).unwrap();
        for index in 1..=2 {
            let frame = Frame::single(Bitmap::solid(600, 400, [200, 40, 40, 255]));
            state.on_frame_loaded(index, Ok(frame));
        }

        let (w, h) = (1024u32, 768u32);
        let mut fb = vec![0u32; (w * h) as usize];
        state.render(&mut fb, w, h);
        // 1024 x 683 canvas centred in the 724 high viewport.
        assert_eq!(fb[(362 * w + 512) as usize], rgb(200, 40, 40));
        assert_eq!(fb[(5 * w + 512) as usize], background());
    }

    #[test]
    fn failed_load_copies_as_source_error() {
        let err: Result<Frame, LoadError> = Err(LoadError::InvalidDimensions { width: 0, height: 0 });
        let path = PathBuf::from("f/01.jpg");
        let copy = duplicate(&err, Some(&path));
        assert!(matches!(copy, Err(LoadError::Source { ref path, .. }) if path == "f/01.jpg"));
    }
}
