#![allow(dead_code)]

use std::sync::Arc;

use spin360::engine::{
    Bitmap, Frame, FrameStore, Notification, Point, Rect, RenderSurface, Size, SurfaceGeometry,
    Viewer, ViewerConfig,
};

/// Width of the display variant of every test frame; the full variant is
/// twice as large.
pub const DISPLAY_WIDTH: u32 = 600;
pub const DISPLAY_HEIGHT: u32 = 400;

/// One recorded `draw_bitmap` call.
#[derive(Debug, Clone, PartialEq)]
pub struct Draw {
    pub bitmap_width: u32,
    pub source: Option<Rect>,
    pub dest: Rect,
}

/// Surface that remembers what it was asked to do.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub logical: Size,
    pub pixel_size: (u32, u32),
    pub draws: Vec<Draw>,
    pub origin: Point,
}

impl RenderSurface for RecordingSurface {
    fn set_logical_size(&mut self, size: Size) {
        self.logical = size;
    }

    fn set_pixel_size(&mut self, width: u32, height: u32) {
        self.pixel_size = (width, height);
    }

    fn draw_bitmap(&mut self, bitmap: &Bitmap, source: Option<Rect>, dest: Rect) {
        self.draws.push(Draw {
            bitmap_width: bitmap.width,
            source,
            dest,
        });
    }

    fn origin(&self) -> Point {
        self.origin
    }
}

/// A frame with a 600x400 display variant and a 1200x800 full variant.
/// Every call shares the same two bitmaps.
pub fn test_frame() -> Frame {
    thread_local! {
        static BITMAPS: (Arc<Bitmap>, Arc<Bitmap>) = (
            Arc::new(Bitmap::solid(DISPLAY_WIDTH, DISPLAY_HEIGHT, [200, 40, 40, 255])),
            Arc::new(Bitmap::solid(DISPLAY_WIDTH * 2, DISPLAY_HEIGHT * 2, [40, 200, 40, 255])),
        );
    }
    BITMAPS.with(|(display, full)| Frame::new(Arc::clone(display), Arc::clone(full)))
}

pub fn store(n: usize) -> FrameStore {
    FrameStore::from_frames((0..n).map(|_| test_frame()).collect()).unwrap()
}

/// Inline layout: a 600 logical px wide container at 1x.
pub fn geometry() -> SurfaceGeometry {
    SurfaceGeometry::new(Size::new(600.0, 400.0), 1.0)
}

/// A fully loaded, interactive viewer with `n` frames.
pub fn loaded_viewer(config: ViewerConfig, n: usize) -> Viewer<RecordingSurface> {
    Viewer::with_frames(config, store(n), RecordingSurface::default(), geometry()).unwrap()
}

/// Same as [`loaded_viewer`] with the start-up notifications drained.
pub fn quiet_viewer(config: ViewerConfig, n: usize) -> Viewer<RecordingSurface> {
    let mut viewer = loaded_viewer(config, n);
    viewer.drain_notifications();
    viewer
}

pub fn count(notifications: &[Notification], wanted: Notification) -> usize {
    notifications.iter().filter(|n| **n == wanted).count()
}

pub fn position(notifications: &[Notification], wanted: Notification) -> Option<usize> {
    notifications.iter().position(|n| *n == wanted)
}
