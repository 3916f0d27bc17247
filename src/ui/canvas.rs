use spin360::engine::{Bitmap, Point, Rect, RenderSurface, Size};

use crate::ui::render::{background, blit_scaled};

/// Off-screen pixel buffer a viewer draws into. The UI copies it into the
/// window framebuffer, centred inside its viewport.
pub struct CanvasSurface {
    logical: Size,
    width: u32,
    height: u32,
    pixels: Vec<u32>,
    /// Logical area the canvas is centred in, window coordinates.
    viewport: Rect,
}

impl CanvasSurface {
    pub fn new(viewport: Rect) -> Self {
        Self {
            logical: Size::default(),
            width: 0,
            height: 0,
            pixels: Vec::new(),
            viewport,
        }
    }

    pub fn set_viewport(&mut self, viewport: Rect) {
        self.viewport = viewport;
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn logical_size(&self) -> Size {
        self.logical
    }

    /// Whether a window point (logical) falls on the canvas.
    pub fn contains(&self, point: Point) -> bool {
        let o = self.origin();
        point.x >= o.x
            && point.y >= o.y
            && point.x < o.x + self.logical.width
            && point.y < o.y + self.logical.height
    }
}

impl RenderSurface for CanvasSurface {
    fn set_logical_size(&mut self, size: Size) {
        self.logical = size;
    }

    fn set_pixel_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        let n = width as usize * height as usize;
        self.pixels.clear();
        self.pixels.resize(n, background());
    }

    fn draw_bitmap(&mut self, bitmap: &Bitmap, source: Option<Rect>, dest: Rect) {
        blit_scaled(&mut self.pixels, self.width, self.height, bitmap, source, dest);
    }

    fn origin(&self) -> Point {
        Point::new(
            self.viewport.x + (self.viewport.width - self.logical.width) / 2.0,
            self.viewport.y + (self.viewport.height - self.logical.height) / 2.0,
        )
    }
}
