use std::time::Instant;

use crate::engine::autoplay::{Scheduler, TaskHandle, TaskKind};
use crate::engine::config::ViewerConfig;
use crate::engine::error::{LoadError, Result};
use crate::engine::frames::{Bitmap, Frame, FrameStore};
use crate::engine::gesture::Mode;
use crate::engine::index::{self, Direction, EdgeControls, FrameIndex, StepOutcome};
use crate::engine::notify::Notification;
use crate::engine::render::{
    self, DrawInstruction, Point, Rect, Size, SurfaceGeometry,
};
use crate::engine::zoom::{ZoomChange, ZoomEngine};

/// Logical edge length of the magnifier lens.
pub const MAGNIFIER_LENS_SIZE: f64 = 150.0;

// ---------------------------------------------------------------------------
// Render surface
// ---------------------------------------------------------------------------

/// Where a viewer draws. Owned by exactly one viewer.
pub trait RenderSurface {
    /// On-screen size, logical units.
    fn set_logical_size(&mut self, size: Size);
    /// Backing buffer size; resizing clears the buffer.
    fn set_pixel_size(&mut self, width: u32, height: u32);
    fn draw_bitmap(&mut self, bitmap: &Bitmap, source: Option<Rect>, dest: Rect);
    /// On-screen position of the surface's top-left corner, logical units.
    fn origin(&self) -> Point;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Interactive,
}

// ---------------------------------------------------------------------------
// Viewer
// ---------------------------------------------------------------------------

/// One spin viewer instance: frames, state machines and the surface they
/// draw on. All mutation happens through `&mut self` on one thread, one
/// event at a time.
pub struct Viewer<S: RenderSurface> {
    pub(super) config: ViewerConfig,
    pub(super) frames: FrameStore,
    pub(super) index: FrameIndex,
    pub(super) zoom: ZoomEngine,
    pub(super) mode: Mode,
    pub(super) scheduler: Scheduler,
    /// The autoplay or hold-to-repeat task this viewer started.
    pub(super) task: Option<TaskHandle>,
    pub(super) surface: S,
    pub(super) geometry: SurfaceGeometry,
    pub(super) phase: Phase,
    /// A press has happened, arming click-to-start wheel zoom.
    pub(super) clicked_to_zoom: bool,
    /// Last known pointer position, client coordinates.
    pub(super) pointer: Option<Point>,
    pub(super) magnifier_open: bool,
    last_draw: Option<DrawInstruction>,
    notifications: Vec<Notification>,
}

impl<S: RenderSurface> Viewer<S> {
    /// A viewer waiting for `frame_count` load callbacks.
    pub fn new(
        config: ViewerConfig,
        frame_count: usize,
        surface: S,
        geometry: SurfaceGeometry,
    ) -> Result<Self> {
        config.validate(frame_count)?;
        let frames = FrameStore::new(frame_count)?;
        Ok(Self::build(config, frames, surface, geometry))
    }

    /// A viewer over an existing store, e.g. a fullscreen instance sharing
    /// the bitmaps of an inline one. Becomes interactive immediately when
    /// the store is complete.
    pub fn with_frames(
        config: ViewerConfig,
        frames: FrameStore,
        surface: S,
        geometry: SurfaceGeometry,
    ) -> Result<Self> {
        config.validate(frames.len())?;
        let mut viewer = Self::build(config, frames, surface, geometry);
        if viewer.frames.is_complete() {
            viewer.finish_loading(Instant::now());
        } else {
            viewer.render();
        }
        Ok(viewer)
    }

    fn build(config: ViewerConfig, frames: FrameStore, surface: S, geometry: SurfaceGeometry) -> Self {
        let index = FrameIndex::new(
            frames.len(),
            config.edge_policy,
            config.spin_reverse,
            config.control_reverse,
        );
        let zoom = ZoomEngine::new(
            config.pointer_zoom_factor,
            config.pinch_zoom_factor,
            config.max_scale,
        );
        Self {
            config,
            frames,
            index,
            zoom,
            mode: Mode::Idle,
            scheduler: Scheduler::new(),
            task: None,
            surface,
            geometry,
            phase: Phase::Loading,
            clicked_to_zoom: false,
            pointer: None,
            magnifier_open: false,
            last_draw: None,
            notifications: Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn frames(&self) -> &FrameStore {
        &self.frames
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_interactive(&self) -> bool {
        self.phase == Phase::Interactive
    }

    pub fn active_index(&self) -> usize {
        self.index.active()
    }

    pub fn frame_count(&self) -> usize {
        self.index.count()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn edge_controls(&self) -> EdgeControls {
        self.index.controls()
    }

    pub fn speed_factor(&self) -> f64 {
        self.index.speed_factor()
    }

    pub fn zoom_intensity(&self) -> f64 {
        self.zoom.intensity()
    }

    pub fn zoom_anchor(&self) -> Option<Point> {
        self.zoom.anchor()
    }

    pub fn is_zoomed(&self) -> bool {
        self.zoom.is_active()
    }

    pub fn max_intensity(&self) -> f64 {
        self.zoom.max_intensity(self.geometry.pixel_width())
    }

    pub fn geometry(&self) -> SurfaceGeometry {
        self.geometry
    }

    pub fn is_autoplaying(&self) -> bool {
        self.scheduler.is_autoplay()
    }

    pub fn is_magnifier_open(&self) -> bool {
        self.magnifier_open
    }

    pub fn last_draw(&self) -> Option<&DrawInstruction> {
        self.last_draw.as_ref()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Next moment [`Viewer::tick`] has work, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.deadline()
    }

    /// Take every notification emitted since the last call, oldest first.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    pub(super) fn emit(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    /// Load callback for 1-based `index`. Failures still count towards
    /// completion; their frame is drawn from a neighbour instead.
    pub fn on_frame_loaded(&mut self, index: usize, result: std::result::Result<Frame, LoadError>) {
        if let Err(e) = &result {
            log::warn!("Frame {} failed to load: {}", index, e);
        }
        if !self.frames.record(index, result) {
            log::debug!("Ignoring load callback for frame {}", index);
            return;
        }
        self.emit(Notification::LoadProgress(self.frames.progress_percent()));

        if self.frames.is_complete() {
            if self.phase == Phase::Loading {
                self.finish_loading(Instant::now());
            }
        } else if index == 1 && self.frames.get(1).is_some() {
            // Preview while the rest arrive.
            self.render();
        }
    }

    fn finish_loading(&mut self, now: Instant) {
        self.phase = Phase::Interactive;

        let container = self.geometry.container;
        let width = if self.config.fullscreen {
            let ratio = self.frames.aspect_ratio().unwrap_or_else(|| container.ratio());
            index::letterboxed_width(container, ratio)
        } else {
            container.width
        };
        self.index.set_speed_factor(index::speed_factor(
            self.config.drag_speed,
            self.frames.len(),
            width,
        ));

        if let Some(start) = self.config.start_frame {
            self.index.jump_to(start);
        }
        if let Some(control) = self.index.reset_controls() {
            self.emit(Notification::EdgeReached(control));
        }

        log::info!(
            "All {} frames settled, speed factor {} px/frame",
            self.frames.len(),
            self.index.speed_factor()
        );
        self.emit(Notification::LoadComplete);

        if self.config.autoplay {
            self.play(now);
        }
        self.render();
    }

    // -----------------------------------------------------------------------
    // Rendering
    // -----------------------------------------------------------------------

    /// New container size or pixel density. Zoom is re-clamped to the new
    /// surface width.
    pub fn set_geometry(&mut self, geometry: SurfaceGeometry) {
        self.geometry = geometry;
        let change = self.zoom.clamp_to(geometry.pixel_width());
        self.emit_zoom(change);
        self.render();
    }

    /// Draw the active frame. Skipped when no frame has loaded yet.
    pub fn render(&mut self) {
        let active = self.index.active();
        let Some((shown, frame)) = self.frames.resolve(active) else {
            return;
        };
        if shown != active {
            log::trace!("Frame {} unavailable, drawing {}", active, shown);
        }
        let instruction = render::plan(
            frame.natural,
            &self.geometry,
            self.zoom.view(),
            self.config.fullscreen,
        );
        self.surface.set_logical_size(instruction.logical_size);
        self.surface
            .set_pixel_size(instruction.pixel_width, instruction.pixel_height);
        self.surface.draw_bitmap(
            frame.bitmap(instruction.variant),
            instruction.source_rect,
            instruction.dest,
        );
        self.last_draw = Some(instruction);
    }

    /// Client coordinates to surface-local logical coordinates.
    pub(super) fn to_local(&self, client: Point) -> Point {
        client.offset_by(self.surface.origin())
    }

    // -----------------------------------------------------------------------
    // Frame stepping
    // -----------------------------------------------------------------------

    pub fn step_up(&mut self, n: usize) -> StepOutcome {
        self.apply_step(Direction::Up, n)
    }

    pub fn step_down(&mut self, n: usize) -> StepOutcome {
        self.apply_step(Direction::Down, n)
    }

    pub(super) fn apply_step(&mut self, direction: Direction, n: usize) -> StepOutcome {
        let outcome = self.index.step(direction, n);
        if outcome.edges_cleared {
            self.emit(Notification::EdgesCleared);
        }
        if let Some(control) = outcome.edge_reached {
            self.emit(Notification::EdgeReached(control));
        }
        if outcome.moved() {
            self.emit(Notification::FrameChanged { index: outcome.to });
            self.emit(Notification::RotateHint { visible: false });
            self.render();
        }
        outcome
    }

    // -----------------------------------------------------------------------
    // Zoom
    // -----------------------------------------------------------------------

    /// Force zoom back to 0 and drop every zoom-session flag.
    pub fn reset_zoom(&mut self) {
        let change = self.zoom.reset();
        self.clicked_to_zoom = false;
        if matches!(self.mode, Mode::WheelZooming | Mode::PinchZooming(_)) {
            self.set_mode(Mode::Idle);
        }
        if change == ZoomChange::Ended {
            self.emit_zoom(change);
            self.render();
        }
    }

    pub(super) fn emit_zoom(&mut self, change: ZoomChange) {
        match change {
            ZoomChange::Unchanged => {}
            ZoomChange::Started(intensity) => {
                log::debug!("Zoom started at {:.1}", intensity);
                self.emit(Notification::ZoomStarted);
                self.emit(Notification::ZoomChanged { intensity });
            }
            ZoomChange::Changed(intensity) => {
                self.emit(Notification::ZoomChanged { intensity });
            }
            ZoomChange::Ended => {
                log::debug!("Zoom ended");
                self.emit(Notification::ZoomChanged { intensity: 0.0 });
                self.emit(Notification::ZoomEnded);
                self.emit(Notification::RotateHint { visible: true });
            }
        }
    }

    // -----------------------------------------------------------------------
    // Autoplay
    // -----------------------------------------------------------------------

    /// Start autoplay, replacing any running task.
    pub fn play(&mut self, now: Instant) -> bool {
        if !self.is_interactive() {
            return false;
        }
        let kind = TaskKind::Autoplay {
            reverse: self.config.autoplay_reverse,
            once: self.config.play_once,
        };
        let interval = self.config.autoplay_interval(self.frames.len());
        self.task = Some(self.scheduler.schedule(kind, interval, now));
        self.set_mode(Mode::Autoplaying);
        log::debug!("Autoplay every {:?}", interval);
        self.emit(Notification::AutoplayStarted);
        self.emit(Notification::RotateHint { visible: false });
        true
    }

    /// Stop autoplay. Held-control repeats are left alone.
    pub fn stop(&mut self) -> bool {
        if !self.scheduler.is_autoplay() {
            return false;
        }
        self.interrupt_automation();
        true
    }

    /// Cancel the running task; gestures always win over it.
    pub(super) fn interrupt_automation(&mut self) {
        let Some(handle) = self.task.take() else {
            return;
        };
        let kind = self.scheduler.current();
        if !self.scheduler.cancel_handle(handle) {
            return;
        }
        if let Some(TaskKind::Autoplay { .. }) = kind {
            if self.mode == Mode::Autoplaying {
                self.set_mode(Mode::Idle);
            }
            log::debug!("Autoplay stopped at frame {}", self.index.active());
            self.emit(Notification::AutoplayStopped);
            let visible = self.zoom.intensity() == 0.0;
            self.emit(Notification::RotateHint { visible });
        }
    }

    /// Run a due autoplay or repeat tick. Returns the next deadline so the
    /// event loop can sleep until then.
    pub fn tick(&mut self, now: Instant) -> Option<Instant> {
        match self.scheduler.poll(now) {
            Some(TaskKind::Autoplay { reverse, once }) => {
                let direction = if reverse { Direction::Down } else { Direction::Up };
                self.apply_step(direction, 1);
                let finished = if reverse {
                    self.index.active() == 1
                } else {
                    self.index.active() == self.index.count()
                };
                if once && finished {
                    self.stop();
                }
            }
            Some(TaskKind::Repeat(control)) => {
                let direction = self.index.direction_of(control);
                self.apply_step(direction, 1);
            }
            None => {}
        }
        self.scheduler.deadline()
    }

    // -----------------------------------------------------------------------
    // Magnifier
    // -----------------------------------------------------------------------

    pub fn open_magnifier(&mut self) -> bool {
        if !self.is_interactive()
            || self.config.magnifier.is_none()
            || self.zoom.is_active()
            || self.magnifier_open
        {
            return false;
        }
        self.magnifier_open = true;
        self.emit(Notification::MagnifierOpened);
        true
    }

    pub fn close_magnifier(&mut self) -> bool {
        if !self.magnifier_open {
            return false;
        }
        self.magnifier_open = false;
        self.emit(Notification::MagnifierClosed);
        true
    }

    /// The lens to draw over the surface while the magnifier is open and the
    /// pointer is over the surface.
    pub fn magnifier_view(&self) -> Option<(&Bitmap, DrawInstruction)> {
        if !self.magnifier_open {
            return None;
        }
        let level = self.config.magnifier?;
        let base = self.last_draw.as_ref()?;
        let local = self.to_local(self.pointer?);
        let surface = base.logical_size;
        if local.x < 0.0 || local.y < 0.0 || local.x > surface.width || local.y > surface.height {
            return None;
        }
        let (_, frame) = self.frames.resolve(self.index.active())?;
        let lens = render::magnifier_lens(
            base,
            frame.natural,
            local,
            self.geometry.device_pixel_scale,
            level,
            MAGNIFIER_LENS_SIZE,
        )?;
        Some((&*frame.full, lens))
    }
}
