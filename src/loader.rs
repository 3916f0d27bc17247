use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageReader};
use rayon::prelude::*;
use winit::event_loop::EventLoopProxy;

use spin360::engine::{Bitmap, Frame, LoadError};

// ---------------------------------------------------------------------------
// Decoding (CPU side, before the softbuffer blit)
// ---------------------------------------------------------------------------

fn source_error(path: &Path, e: impl std::fmt::Display) -> LoadError {
    LoadError::Source {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

fn to_bitmap(img: &DynamicImage) -> Result<Bitmap, LoadError> {
    let (width, height) = img.dimensions();
    Bitmap::new(width, height, img.to_rgba8().into_raw())
}

/// Decode one photograph into its display and full variants. The display
/// variant is downscaled to at most `display_width` wide and shares the full
/// bitmap when no downscale is needed.
pub fn decode_frame(path: &Path, display_width: u32) -> Result<Frame, LoadError> {
    let img = ImageReader::open(path)
        .map_err(|e| source_error(path, e))?
        .with_guessed_format()
        .map_err(|e| source_error(path, e))?
        .decode()?;

    let full = Arc::new(to_bitmap(&img)?);
    let display = if display_width > 0 && img.width() > display_width {
        let scaled = img.resize(display_width, u32::MAX, FilterType::Triangle);
        Arc::new(to_bitmap(&scaled)?)
    } else {
        Arc::clone(&full)
    };
    Ok(Frame::new(display, full))
}

// ---------------------------------------------------------------------------
// User event for waking the UI from worker threads
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum UserEvent {
    /// Load callback for 1-based `index`.
    FrameLoaded {
        index: usize,
        result: Result<Frame, LoadError>,
    },
}

// ---------------------------------------------------------------------------
// Background decode
// ---------------------------------------------------------------------------

/// Decode every frame off the UI thread. Frame 1 goes first so the viewer
/// can show a preview; the rest are decoded in parallel and delivered in
/// whatever order they finish.
pub fn spawn_frame_decoder(
    files: Arc<Vec<PathBuf>>,
    display_width: u32,
    proxy: EventLoopProxy<UserEvent>,
    num_threads: usize,
) {
    thread::spawn(move || {
        let start_time = Instant::now();
        let Some((first, rest)) = files.split_first() else {
            return;
        };

        let result = decode_frame(first, display_width);
        if proxy.send_event(UserEvent::FrameLoaded { index: 1, result }).is_err() {
            return;
        }

        let decode_rest = || {
            rest.par_iter()
                .enumerate()
                .for_each_with(proxy.clone(), |proxy, (i, path)| {
                    let result = decode_frame(path, display_width);
                    // The event loop is gone once the window closes.
                    let _ = proxy.send_event(UserEvent::FrameLoaded { index: i + 2, result });
                });
        };
        match rayon::ThreadPoolBuilder::new().num_threads(num_threads).build() {
            Ok(pool) => pool.install(decode_rest),
            Err(e) => {
                log::warn!("Decode pool unavailable ({}), using the global pool", e);
                decode_rest();
            }
        }

        log::info!(
            "Decoded {} frames in {:.2}s",
            files.len(),
            start_time.elapsed().as_secs_f64()
        );
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn write_png(name: &str, width: u32, height: u32) -> PathBuf {
        let path = std::env::temp_dir().join(format!("spin360-{}-{}.png", name, std::process::id()));
        RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn wide_frames_get_a_smaller_display_variant() {
        let path = write_png("wide", 400, 200);
        let frame = decode_frame(&path, 100).unwrap();
        assert_eq!((frame.full.width, frame.full.height), (400, 200));
        assert_eq!((frame.display.width, frame.display.height), (100, 50));
        assert_eq!(frame.natural.width, 400.0);
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn narrow_frames_share_one_bitmap() {
        let path = write_png("narrow", 60, 40);
        let frame = decode_frame(&path, 100).unwrap();
        assert!(Arc::ptr_eq(&frame.display, &frame.full));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn missing_file_is_a_source_error() {
        let err = decode_frame(Path::new("/nonexistent/spin360/frame.png"), 100).unwrap_err();
        assert!(matches!(err, LoadError::Source { .. }));
    }
}
