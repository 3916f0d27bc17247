use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use spin360::engine::config::{
    DEFAULT_AUTOPLAY_SPEED, DEFAULT_DRAG_SPEED, DEFAULT_MAGNIFIER_LEVEL, DEFAULT_MAX_SCALE,
    EdgePolicy, ReleasePolicy, ViewerConfig, ZoomStart,
};

pub const HELP_KEYS: &str = "\
Key Bindings:
  Esc / q          : Quit
  Left / Right     : Spin one frame
  Drag             : Spin
  Wheel / Pinch    : Zoom in / out at the pointer
  0                : Reset zoom
  p                : Toggle autoplay
  m                : Toggle magnifier (when enabled)
  f                : Toggle fullscreen view
  ?                : Toggle help overlay
";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ZoomStartArg {
    /// The wheel zooms only after the first click on the view
    Click,
    /// The wheel zooms right away
    Scroll,
}

impl From<ZoomStartArg> for ZoomStart {
    fn from(arg: ZoomStartArg) -> Self {
        match arg {
            ZoomStartArg::Click => ZoomStart::ClickToStart,
            ZoomStartArg::Scroll => ZoomStart::ScrollToStart,
        }
    }
}

#[derive(Parser)]
#[command(name = "spin360", about = "A 360 degree product spin viewer", after_help = HELP_KEYS)]
pub struct Cli {
    /// Frame files or directories, in spin order
    #[arg(required_unless_present = "file_list")]
    pub paths: Vec<PathBuf>,

    /// Load frame list from a text file (one path per line)
    #[arg(short = 'L', long, value_name = "FILE")]
    pub file_list: Option<PathBuf>,

    /// Recurse into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Follow symbolic links (default: false)
    #[arg(long)]
    pub follow_links: bool,

    /// Stop at the first and last frame instead of wrapping around
    #[arg(long)]
    pub stop_at_edges: bool,

    /// Reverse the spin direction for drags and keys
    #[arg(long)]
    pub spin_reverse: bool,

    /// Reverse the prev/next controls relative to the spin direction
    #[arg(long)]
    pub control_reverse: bool,

    /// Disable drag rotation
    #[arg(long)]
    pub no_drag: bool,

    /// Drag speed; higher spins faster per pixel dragged
    #[arg(long, default_value_t = DEFAULT_DRAG_SPEED)]
    pub drag_speed: f64,

    /// Disable arrow-key rotation
    #[arg(long)]
    pub no_keys: bool,

    /// Disable mouse wheel zoom
    #[arg(long)]
    pub no_pointer_zoom: bool,

    /// Disable pinch zoom
    #[arg(long)]
    pub no_pinch_zoom: bool,

    /// Zoom intensity per wheel pixel
    #[arg(long, default_value_t = 1.0)]
    pub pointer_zoom_factor: f64,

    /// Multiplier for the pinch zoom step
    #[arg(long, default_value_t = 1.0)]
    pub pinch_zoom_factor: f64,

    /// Maximum zoom as a multiple of the view width
    #[arg(long, default_value_t = DEFAULT_MAX_SCALE)]
    pub max_scale: f64,

    /// When the wheel may start zooming
    #[arg(long, value_enum, default_value_t = ZoomStartArg::Scroll)]
    pub zoom_start: ZoomStartArg,

    /// Reset zoom when the pointer leaves the window
    #[arg(long)]
    pub reset_zoom_on_leave: bool,

    /// Keep zoom when the last finger lifts
    #[arg(long)]
    pub keep_zoom_on_touch_end: bool,

    /// Start spinning as soon as every frame has loaded
    #[arg(short, long)]
    pub autoplay: bool,

    /// Autoplay period in ms for a 36 frame sequence
    #[arg(long, default_value_t = DEFAULT_AUTOPLAY_SPEED)]
    pub autoplay_speed: f64,

    /// Autoplay backwards
    #[arg(long)]
    pub autoplay_reverse: bool,

    /// Stop autoplay after one pass
    #[arg(long)]
    pub play_once: bool,

    /// 1-based frame to show first
    #[arg(long, value_name = "N")]
    pub start_frame: Option<usize>,

    /// Enable the magnifier lens, optionally with a magnification (default: 3)
    #[arg(long, value_name = "LEVEL")]
    pub magnifier: Option<Option<f64>>,

    /// Width the display variant of each frame is downscaled to
    #[arg(long, default_value = "1600")]
    pub display_width: u32,

    /// Initial window width in logical pixels
    #[arg(long, default_value = "1024")]
    pub width: u32,

    /// Initial window height in logical pixels
    #[arg(long, default_value = "768")]
    pub height: u32,

    /// Open straight into the fullscreen view
    #[arg(long)]
    pub fullscreen: bool,

    /// Number of decode threads (default: available cores, 4 to 16)
    #[arg(long)]
    pub threads: Option<usize>,
}

impl Cli {
    /// Options for the inline viewer. The fullscreen view reuses them with
    /// `fullscreen` set.
    pub fn viewer_config(&self) -> ViewerConfig {
        ViewerConfig {
            edge_policy: if self.stop_at_edges { EdgePolicy::Clamp } else { EdgePolicy::Wrap },
            spin_reverse: self.spin_reverse,
            control_reverse: self.control_reverse,
            drag_enabled: !self.no_drag,
            drag_speed: self.drag_speed,
            keys: !self.no_keys,
            pointer_zoom: !self.no_pointer_zoom,
            pinch_zoom: !self.no_pinch_zoom,
            pointer_zoom_factor: self.pointer_zoom_factor,
            pinch_zoom_factor: self.pinch_zoom_factor,
            max_scale: self.max_scale,
            zoom_start: self.zoom_start.into(),
            release: ReleasePolicy {
                reset_on_touch_end: !self.keep_zoom_on_touch_end,
                reset_on_pointer_leave: self.reset_zoom_on_leave,
            },
            autoplay: self.autoplay,
            autoplay_speed: self.autoplay_speed,
            autoplay_reverse: self.autoplay_reverse,
            play_once: self.play_once,
            start_frame: self.start_frame,
            magnifier: self
                .magnifier
                .map(|level| level.unwrap_or(DEFAULT_MAGNIFIER_LEVEL)),
            fullscreen: false,
        }
    }
}
