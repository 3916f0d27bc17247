pub mod autoplay;
pub mod config;
pub mod error;
pub mod frames;
pub mod gesture;
pub mod index;
pub mod notify;
pub mod render;
pub mod viewer;
pub mod zoom;

pub use autoplay::{Scheduler, TaskHandle, TaskKind};
pub use config::{EdgePolicy, ReleasePolicy, ViewerConfig, ZoomStart};
pub use error::{ConfigError, LoadError};
pub use frames::{Bitmap, Frame, FrameStore};
pub use gesture::{InputEvent, Key, Mode};
pub use index::{Control, Direction, EdgeControls};
pub use notify::Notification;
pub use render::{DrawInstruction, Point, Rect, Size, SurfaceGeometry, Variant};
pub use viewer::{MAGNIFIER_LENS_SIZE, Phase, RenderSurface, Viewer};
pub use zoom::WheelDelta;
