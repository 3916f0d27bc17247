//! Interaction and render engine for 360° product spin views.
//!
//! A [`engine::Viewer`] owns an ordered sequence of frames photographed at
//! evenly spaced angles, turns pointer/touch/wheel/key input into frame
//! steps or zoom changes, and draws the right bitmap onto a
//! [`engine::RenderSurface`]. Presentation chrome is driven entirely by the
//! [`engine::Notification`] stream.

pub mod engine;

pub use engine::{
    Bitmap, ConfigError, EdgePolicy, Frame, FrameStore, InputEvent, LoadError, Notification,
    RenderSurface, Viewer, ViewerConfig,
};
