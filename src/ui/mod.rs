use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Instant;
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, MouseButton, MouseScrollDelta, Touch, TouchPhase, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow};
use winit::window::{Window, WindowId};
use softbuffer::Surface;

use crate::loader::UserEvent;
use crate::ui::state::ViewerState;

pub mod canvas;
pub mod render;
pub mod state;

// ---------------------------------------------------------------------------
// Application handler (winit 0.30 style)
// ---------------------------------------------------------------------------

pub struct App {
    pub state: ViewerState,
    pub window: Option<Arc<Window>>,
    pub context: Option<softbuffer::Context<Arc<Window>>>,
    pub surface: Option<Surface<Arc<Window>, Arc<Window>>>,
    /// Next autoplay or hold-to-repeat tick.
    pub next_tick: Option<Instant>,
    window_size: LogicalSize<u32>,
    start_fullscreen: bool,
}

impl App {
    pub fn new(state: ViewerState, window_size: LogicalSize<u32>, start_fullscreen: bool) -> Self {
        Self {
            state,
            window: None,
            context: None,
            surface: None,
            next_tick: None,
            window_size,
            start_fullscreen,
        }
    }

    fn request_redraw(&self) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }

    fn resize_surface(&mut self, size: PhysicalSize<u32>) {
        let (Some(w), Some(h)) = (NonZeroU32::new(size.width.max(1)), NonZeroU32::new(size.height.max(1))) else {
            return;
        };
        if let Some(ref mut surface) = self.surface {
            if let Err(e) = surface.resize(w, h) {
                log::warn!("Surface resize failed: {}", e);
            }
        }
        let scale = self.window.as_ref().map(|w| w.scale_factor()).unwrap_or(1.0);
        self.state.resize(w.get(), h.get(), scale);
    }

    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> Result<(), Box<dyn std::error::Error>> {
        let attrs = Window::default_attributes()
            .with_title(format!("spin360 ({} frames)", self.state.files.len()))
            .with_inner_size(self.window_size);
        let window = Arc::new(event_loop.create_window(attrs)?);
        let context = softbuffer::Context::new(Arc::clone(&window))?;
        let surface = Surface::new(&context, Arc::clone(&window))?;

        self.window = Some(window);
        self.context = Some(context);
        self.surface = Some(surface);
        Ok(())
    }
}

impl ApplicationHandler<UserEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.create_window(event_loop) {
            log::error!("Cannot create window: {}", e);
            event_loop.exit();
            return;
        }
        let Some(window) = self.window.clone() else {
            return;
        };
        self.resize_surface(window.inner_size());
        if self.start_fullscreen {
            self.state.toggle_fullscreen(&window);
        }
        window.request_redraw();
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: UserEvent) {
        match event {
            UserEvent::FrameLoaded { index, result } => {
                self.state.on_frame_loaded(index, result);
                // Autoplay may have started with the last frame.
                let (deadline, _) = self.state.tick(Instant::now());
                self.next_tick = deadline;
                self.request_redraw();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                self.resize_surface(size);
                self.request_redraw();
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(size) = self.window.as_ref().map(|w| w.inner_size()) {
                    self.resize_surface(size);
                }
                self.request_redraw();
            }

            WindowEvent::KeyboardInput { event, .. } => {
                let Some(window) = self.window.clone() else {
                    return;
                };
                let pressed = event.state == ElementState::Pressed;
                if self.state.key_event(&event.logical_key, pressed, &window) {
                    event_loop.exit();
                    return;
                }
                self.next_tick = self.state.tick(Instant::now()).0;
                window.request_redraw();
            }

            WindowEvent::MouseInput { state, button: MouseButton::Left, .. } => {
                self.state.mouse_button(state == ElementState::Pressed);
                self.next_tick = self.state.tick(Instant::now()).0;
                self.request_redraw();
            }

            WindowEvent::CursorMoved {
                position: PhysicalPosition { x, y },
                ..
            } => {
                self.state.cursor_moved(x, y);
                self.request_redraw();
            }

            WindowEvent::CursorLeft { .. } => {
                self.state.cursor_left();
                self.request_redraw();
            }

            WindowEvent::MouseWheel { delta, .. } => {
                match delta {
                    MouseScrollDelta::LineDelta(_, y) => self.state.wheel_lines(y as f64),
                    MouseScrollDelta::PixelDelta(PhysicalPosition { y, .. }) => self.state.wheel_pixels(y),
                }
                self.next_tick = self.state.tick(Instant::now()).0;
                self.request_redraw();
            }

            WindowEvent::Touch(Touch { phase, location, id, .. }) => {
                match phase {
                    TouchPhase::Started => self.state.touch_started(id, location.x, location.y),
                    TouchPhase::Moved => self.state.touch_moved(id, location.x, location.y),
                    TouchPhase::Ended | TouchPhase::Cancelled => self.state.touch_ended(id),
                }
                self.next_tick = self.state.tick(Instant::now()).0;
                self.request_redraw();
            }

            WindowEvent::RedrawRequested => {
                let Some(window) = self.window.clone() else {
                    return;
                };
                if let Some(ref mut surface) = self.surface {
                    let size = window.inner_size();
                    let fb_w = size.width.max(1);
                    let fb_h = size.height.max(1);
                    match surface.buffer_mut() {
                        Ok(mut buffer) => {
                            self.state.render(&mut buffer, fb_w, fb_h);
                            if let Err(e) = buffer.present() {
                                log::warn!("Present failed: {}", e);
                            }
                        }
                        Err(e) => log::warn!("No framebuffer: {}", e),
                    }
                }
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(when) = self.next_tick else {
            event_loop.set_control_flow(ControlFlow::Wait);
            return;
        };
        let now = Instant::now();
        if now >= when {
            let (deadline, changed) = self.state.tick(now);
            self.next_tick = deadline;
            if changed {
                self.request_redraw();
            }
        }
        match self.next_tick {
            Some(when) => event_loop.set_control_flow(ControlFlow::WaitUntil(when)),
            None => event_loop.set_control_flow(ControlFlow::Wait),
        }
    }
}
