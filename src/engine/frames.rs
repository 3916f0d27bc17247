use std::fmt;
use std::sync::Arc;

use crate::engine::error::{ConfigError, LoadError};
use crate::engine::render::{Size, Variant};

// ---------------------------------------------------------------------------
// Bitmap (decoded RGBA, CPU side)
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl Bitmap {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, LoadError> {
        if width == 0 || height == 0 {
            return Err(LoadError::InvalidDimensions { width, height });
        }
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(LoadError::BufferSize { expected, actual: rgba.len() });
        }
        Ok(Self { width, height, rgba })
    }

    /// A single-colour bitmap.
    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> Self {
        let rgba = color
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self { width, height, rgba }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width as f64, self.height as f64)
    }
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.rgba.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// One photograph of the sequence in both resolutions. The bitmaps are
/// shared so a fullscreen instance can reuse them without copying.
#[derive(Debug, Clone)]
pub struct Frame {
    pub display: Arc<Bitmap>,
    pub full: Arc<Bitmap>,
    /// Size of the full-resolution photograph.
    pub natural: Size,
}

impl Frame {
    pub fn new(display: Arc<Bitmap>, full: Arc<Bitmap>) -> Self {
        let natural = full.size();
        Self { display, full, natural }
    }

    /// A frame whose display variant is the full bitmap itself.
    pub fn single(bitmap: Bitmap) -> Self {
        let bitmap = Arc::new(bitmap);
        Self::new(Arc::clone(&bitmap), bitmap)
    }

    pub fn bitmap(&self, variant: Variant) -> &Bitmap {
        match variant {
            Variant::Display => &self.display,
            Variant::Full => &self.full,
        }
    }
}

// ---------------------------------------------------------------------------
// FrameStore
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Slot {
    Pending,
    Loaded(Frame),
    Failed,
}

/// Fixed-length frame sequence, indexed 1..=N, filled by load callbacks.
///
/// Failed loads count towards completion so a single broken photograph
/// cannot keep the viewer in its loading phase.
#[derive(Debug, Clone)]
pub struct FrameStore {
    slots: Vec<Slot>,
    settled: usize,
}

impl FrameStore {
    pub fn new(count: usize) -> Result<Self, ConfigError> {
        if count == 0 {
            return Err(ConfigError::EmptySequence);
        }
        Ok(Self {
            slots: vec![Slot::Pending; count],
            settled: 0,
        })
    }

    /// A store whose frames are all present already.
    pub fn from_frames(frames: Vec<Frame>) -> Result<Self, ConfigError> {
        if frames.is_empty() {
            return Err(ConfigError::EmptySequence);
        }
        let settled = frames.len();
        Ok(Self {
            slots: frames.into_iter().map(Slot::Loaded).collect(),
            settled,
        })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn settled_count(&self) -> usize {
        self.settled
    }

    pub fn is_complete(&self) -> bool {
        self.settled == self.slots.len()
    }

    pub fn progress_percent(&self) -> u8 {
        (self.settled as f64 / self.slots.len() as f64 * 100.0).round() as u8
    }

    /// Record the outcome for 1-based `index`. Returns false when the index is
    /// out of range or the slot already settled.
    pub fn record(&mut self, index: usize, result: Result<Frame, LoadError>) -> bool {
        let Some(slot) = index.checked_sub(1).and_then(|i| self.slots.get_mut(i)) else {
            return false;
        };
        if !matches!(slot, Slot::Pending) {
            return false;
        }
        *slot = match result {
            Ok(frame) => Slot::Loaded(frame),
            Err(_) => Slot::Failed,
        };
        self.settled += 1;
        true
    }

    pub fn get(&self, index: usize) -> Option<&Frame> {
        match self.slots.get(index.checked_sub(1)?)? {
            Slot::Loaded(frame) => Some(frame),
            _ => None,
        }
    }

    pub fn is_failed(&self, index: usize) -> bool {
        matches!(
            index.checked_sub(1).and_then(|i| self.slots.get(i)),
            Some(Slot::Failed)
        )
    }

    /// The frame to draw for `index`: itself if loaded, else the nearest
    /// loaded frame before it, else the nearest after it.
    pub fn resolve(&self, index: usize) -> Option<(usize, &Frame)> {
        let n = self.slots.len();
        if index == 0 || index > n {
            return None;
        }
        let backward = (1..=index).rev();
        let forward = index + 1..=n;
        backward
            .chain(forward)
            .find_map(|i| self.get(i).map(|frame| (i, frame)))
    }

    /// Height over width of the first loaded frame.
    pub fn aspect_ratio(&self) -> Option<f64> {
        self.resolve(1).map(|(_, frame)| frame.natural.ratio())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(w: u32, h: u32) -> Frame {
        Frame::single(Bitmap::solid(w, h, [255, 0, 0, 255]))
    }

    #[test]
    fn bitmap_rejects_wrong_buffer() {
        assert!(matches!(
            Bitmap::new(2, 2, vec![0; 15]),
            Err(LoadError::BufferSize { expected: 16, actual: 15 })
        ));
        assert!(matches!(
            Bitmap::new(0, 2, vec![]),
            Err(LoadError::InvalidDimensions { width: 0, height: 2 })
        ));
        assert!(Bitmap::new(2, 2, vec![0; 16]).is_ok());
    }

    #[test]
    fn solid_bitmap_fills_every_pixel() {
        let b = Bitmap::solid(3, 2, [1, 2, 3, 4]);
        assert_eq!(b.rgba.len(), 24);
        assert!(b.rgba.chunks_exact(4).all(|px| px == [1, 2, 3, 4]));
    }

    #[test]
    fn empty_store_is_refused() {
        assert!(FrameStore::new(0).is_err());
        assert!(FrameStore::from_frames(Vec::new()).is_err());
    }

    #[test]
    fn failures_count_towards_completion() {
        let mut store = FrameStore::new(2).unwrap();
        assert!(store.record(1, Ok(frame(4, 4))));
        assert_eq!(store.progress_percent(), 50);
        assert!(!store.is_complete());
        assert!(store.record(
            2,
            Err(LoadError::Source { path: "b.png".into(), message: "broken".into() })
        ));
        assert!(store.is_complete());
        assert_eq!(store.progress_percent(), 100);
        assert!(store.is_failed(2));
    }

    #[test]
    fn duplicate_and_out_of_range_records_are_ignored() {
        let mut store = FrameStore::new(2).unwrap();
        assert!(store.record(1, Ok(frame(4, 4))));
        assert!(!store.record(1, Ok(frame(4, 4))));
        assert!(!store.record(0, Ok(frame(4, 4))));
        assert!(!store.record(3, Ok(frame(4, 4))));
        assert_eq!(store.settled_count(), 1);
    }

    #[test]
    fn resolve_falls_back_to_previous_loaded_frame() {
        let mut store = FrameStore::new(4).unwrap();
        store.record(2, Ok(frame(4, 4)));
        store.record(3, Err(LoadError::InvalidDimensions { width: 0, height: 0 }));
        store.record(4, Ok(frame(8, 8)));
        assert_eq!(store.resolve(3).map(|(i, _)| i), Some(2));
        assert_eq!(store.resolve(4).map(|(i, _)| i), Some(4));
        // Nothing before 1: use the next one that loaded.
        assert_eq!(store.resolve(1).map(|(i, _)| i), Some(2));
        assert!(store.resolve(5).is_none());
    }

    #[test]
    fn aspect_ratio_comes_from_first_loaded_frame() {
        let store = FrameStore::from_frames(vec![frame(200, 100), frame(10, 10)]).unwrap();
        assert_eq!(store.aspect_ratio(), Some(0.5));
    }
}
