// Render pipeline: pure geometry that turns the current frame, zoom state and
// surface geometry into one draw instruction. Nothing here touches pixels.

// ---------------------------------------------------------------------------
// Geometry primitives
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }

    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    pub fn offset_by(self, origin: Point) -> Point {
        Point::new(self.x - origin.x, self.y - origin.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Height over width.
    pub fn ratio(&self) -> f64 {
        if self.width > 0.0 { self.height / self.width } else { 0.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        self.x <= other.x
            && self.y <= other.y
            && self.right() >= other.right()
            && self.bottom() >= other.bottom()
    }
}

// ---------------------------------------------------------------------------
// Surface geometry and draw instructions
// ---------------------------------------------------------------------------

/// Layout inputs supplied by the glue layer.
///
/// `container` is the logical size of the element hosting the surface. In
/// fullscreen mode it is the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceGeometry {
    pub container: Size,
    pub device_pixel_scale: f64,
}

impl SurfaceGeometry {
    pub fn new(container: Size, device_pixel_scale: f64) -> Self {
        Self {
            container,
            device_pixel_scale: device_pixel_scale.max(1.0),
        }
    }

    /// Width of the surface's pixel buffer.
    pub fn pixel_width(&self) -> f64 {
        (self.container.width * self.device_pixel_scale).floor()
    }
}

/// Rounds a raw platform scale factor the way browsers report canvas
/// backing density: whole numbers, never below one.
pub fn device_pixel_scale(raw: f64) -> f64 {
    if raw.is_finite() { raw.round().max(1.0) } else { 1.0 }
}

/// Which bitmap of a frame a draw reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Display,
    Full,
}

/// The complete result of one render step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawInstruction {
    /// On-screen size of the surface.
    pub logical_size: Size,
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub variant: Variant,
    /// Sub-rectangle of the bitmap in bitmap pixels; `None` draws all of it.
    pub source_rect: Option<Rect>,
    /// Placement in surface pixels. May extend past the surface when zoomed.
    pub dest: Rect,
}

impl DrawInstruction {
    pub fn surface_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.pixel_width as f64, self.pixel_height as f64)
    }
}

/// Zoom inputs for [`plan`]. `anchor` is in surface-local logical units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomView {
    pub intensity: f64,
    pub anchor: Point,
}

// ---------------------------------------------------------------------------
// Fitting
// ---------------------------------------------------------------------------

/// "Contain" fit: scale the image uniformly so all of it is visible inside
/// the surface, centred, padding only one axis.
pub fn contain(surface_width: f64, surface_height: f64, image_width: f64, image_height: f64) -> Rect {
    if image_width <= 0.0 || image_height <= 0.0 {
        return Rect::new(0.0, 0.0, surface_width, surface_height);
    }
    let scale = (surface_width / image_width).min(surface_height / image_height);
    let width = image_width * scale;
    let height = image_height * scale;
    Rect::new(
        (surface_width - width) / 2.0,
        (surface_height - height) / 2.0,
        width,
        height,
    )
}

/// Destination rectangle of a zoomed draw over a `surface_w` x `surface_h`
/// pixel surface.
///
/// The extra `intensity` pixels are spread over both axes by the surface's
/// own aspect ratio, and the rectangle is shifted so the anchor fraction of
/// the surface stays under the same fraction of the image.
pub fn zoomed_dest(surface_w: f64, surface_h: f64, logical: Size, zoom: ZoomView) -> Rect {
    if surface_w <= 0.0 || surface_h <= 0.0 || logical.is_empty() {
        return Rect::new(0.0, 0.0, surface_w, surface_h);
    }
    let width = surface_w + zoom.intensity * (surface_w / surface_h);
    let height = surface_h + zoom.intensity;

    let fx = (zoom.anchor.x / logical.width).clamp(0.0, 1.0);
    let fy = (zoom.anchor.y / logical.height).clamp(0.0, 1.0);

    Rect::new(
        -(fx * (width - surface_w)),
        -(fy * (height - surface_h)),
        width,
        height,
    )
}

// ---------------------------------------------------------------------------
// Planning
// ---------------------------------------------------------------------------

/// Compute the draw instruction for one frame. Same inputs, same output.
pub fn plan(
    natural: Size,
    geometry: &SurfaceGeometry,
    zoom: Option<ZoomView>,
    fullscreen: bool,
) -> DrawInstruction {
    let dpr = geometry.device_pixel_scale;

    if fullscreen {
        let logical = geometry.container;
        let pixel_width = (logical.width * dpr).floor().max(0.0) as u32;
        let pixel_height = (logical.height * dpr).floor().max(0.0) as u32;
        let dest = contain(
            pixel_width as f64,
            pixel_height as f64,
            natural.width,
            natural.height,
        );
        return DrawInstruction {
            logical_size: logical,
            pixel_width,
            pixel_height,
            variant: Variant::Full,
            source_rect: None,
            dest,
        };
    }

    let width = geometry.container.width.max(0.0);
    let height = if natural.width > 0.0 {
        width / natural.width * natural.height
    } else {
        0.0
    };
    let logical = Size::new(width, height);
    let pixel_width = (width * dpr).floor() as u32;
    let pixel_height = (height * dpr).floor() as u32;
    let (sw, sh) = (pixel_width as f64, pixel_height as f64);

    match zoom {
        Some(view) => DrawInstruction {
            logical_size: logical,
            pixel_width,
            pixel_height,
            variant: Variant::Full,
            source_rect: None,
            dest: zoomed_dest(sw, sh, logical, view),
        },
        None => DrawInstruction {
            logical_size: logical,
            pixel_width,
            pixel_height,
            variant: Variant::Display,
            source_rect: None,
            dest: Rect::new(0.0, 0.0, sw, sh),
        },
    }
}

/// Lens for the magnifier overlay: a `lens_size` logical square centred on
/// `pointer` (surface-local), showing the full-resolution bitmap at `level`
/// times the scale of `base`.
pub fn magnifier_lens(
    base: &DrawInstruction,
    natural: Size,
    pointer: Point,
    device_pixel_scale: f64,
    level: f64,
    lens_size: f64,
) -> Option<DrawInstruction> {
    if natural.is_empty() || base.dest.width <= 0.0 || level <= 0.0 {
        return None;
    }
    let scale = base.dest.width / natural.width;
    let px = pointer.x * device_pixel_scale;
    let py = pointer.y * device_pixel_scale;
    let lens_px = lens_size * device_pixel_scale;

    let nx = (px - base.dest.x) / scale;
    let ny = (py - base.dest.y) / scale;
    let src_size = lens_px / (scale * level);

    Some(DrawInstruction {
        logical_size: Size::new(lens_size, lens_size),
        pixel_width: lens_px.round() as u32,
        pixel_height: lens_px.round() as u32,
        variant: Variant::Full,
        source_rect: Some(Rect::new(
            nx - src_size / 2.0,
            ny - src_size / 2.0,
            src_size,
            src_size,
        )),
        dest: Rect::new(px - lens_px / 2.0, py - lens_px / 2.0, lens_px, lens_px),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inline(width: f64, dpr: f64) -> SurfaceGeometry {
        SurfaceGeometry::new(Size::new(width, 400.0), dpr)
    }

    #[test]
    fn inline_unzoomed_fills_surface_with_display_variant() {
        let d = plan(Size::new(1200.0, 800.0), &inline(600.0, 1.0), None, false);
        assert_eq!(d.variant, Variant::Display);
        assert_eq!((d.pixel_width, d.pixel_height), (600, 400));
        assert_eq!(d.logical_size, Size::new(600.0, 400.0));
        assert_eq!(d.dest, Rect::new(0.0, 0.0, 600.0, 400.0));
    }

    #[test]
    fn pixel_size_scales_with_device_pixels() {
        let d = plan(Size::new(1200.0, 800.0), &inline(600.0, 2.0), None, false);
        assert_eq!((d.pixel_width, d.pixel_height), (1200, 800));
        assert_eq!(d.logical_size, Size::new(600.0, 400.0));
    }

    #[test]
    fn fullscreen_letterboxes_full_variant() {
        let geometry = SurfaceGeometry::new(Size::new(1000.0, 500.0), 1.0);
        let d = plan(Size::new(800.0, 800.0), &geometry, None, true);
        assert_eq!(d.variant, Variant::Full);
        assert_eq!(d.dest, Rect::new(250.0, 0.0, 500.0, 500.0));
    }

    #[test]
    fn zoomed_rect_keeps_anchor_fraction_stationary() {
        let view = ZoomView { intensity: 200.0, anchor: Point::new(150.0, 100.0) };
        let d = plan(Size::new(1200.0, 800.0), &inline(600.0, 1.0), Some(view), false);
        assert_eq!(d.variant, Variant::Full);
        // 600x400 surface grows by 200 * 1.5 and 200.
        assert_eq!(d.dest.width, 900.0);
        assert_eq!(d.dest.height, 600.0);
        assert_eq!(d.dest.x, -0.25 * 300.0);
        assert_eq!(d.dest.y, -0.25 * 200.0);
        // The anchor maps to the same image fraction before and after.
        let fx = (150.0 - d.dest.x) / d.dest.width;
        assert!((fx - 0.25).abs() < 1e-9);
    }

    #[test]
    fn zoomed_rect_covers_surface_for_any_anchor() {
        let natural = Size::new(1200.0, 800.0);
        for ix in 0..=10 {
            for iy in 0..=10 {
                let anchor = Point::new(600.0 * ix as f64 / 10.0, 400.0 * iy as f64 / 10.0);
                for intensity in [0.0, 1.0, 37.5, 600.0] {
                    let d = plan(natural, &inline(600.0, 1.0), Some(ZoomView { intensity, anchor }), false);
                    assert!(d.dest.contains_rect(&d.surface_rect()), "{:?} {:?}", anchor, d.dest);
                }
            }
        }
    }

    #[test]
    fn anchor_outside_surface_is_clamped() {
        let view = ZoomView { intensity: 100.0, anchor: Point::new(-50.0, 9000.0) };
        let d = plan(Size::new(1200.0, 800.0), &inline(600.0, 1.0), Some(view), false);
        assert_eq!(d.dest.x, 0.0);
        assert_eq!(d.dest.bottom(), 400.0);
    }

    #[test]
    fn planning_is_idempotent() {
        let view = Some(ZoomView { intensity: 42.0, anchor: Point::new(10.0, 20.0) });
        let a = plan(Size::new(640.0, 480.0), &inline(333.0, 2.0), view, false);
        let b = plan(Size::new(640.0, 480.0), &inline(333.0, 2.0), view, false);
        assert_eq!(a, b);
    }

    #[test]
    fn rounds_device_pixel_scale() {
        assert_eq!(device_pixel_scale(1.25), 1.0);
        assert_eq!(device_pixel_scale(1.5), 2.0);
        assert_eq!(device_pixel_scale(0.5), 1.0);
        assert_eq!(device_pixel_scale(f64::NAN), 1.0);
    }

    #[test]
    fn lens_is_centred_on_pointer() {
        let base = plan(Size::new(1200.0, 800.0), &inline(600.0, 1.0), None, false);
        let lens = magnifier_lens(&base, Size::new(1200.0, 800.0), Point::new(300.0, 200.0), 1.0, 3.0, 150.0)
            .expect("lens");
        assert_eq!(lens.dest, Rect::new(225.0, 125.0, 150.0, 150.0));
        let src = lens.source_rect.expect("source");
        // Displayed at 0.5x, magnified 3x: 150 px of lens covers 100 natural px.
        assert!((src.width - 100.0).abs() < 1e-9);
        assert!((src.x + src.width / 2.0 - 600.0).abs() < 1e-9);
        assert!((src.y + src.height / 2.0 - 400.0).abs() < 1e-9);
    }
}
