mod cli;
mod files;
mod loader;
mod ui;

use clap::Parser;
use std::sync::Arc;
use winit::dpi::LogicalSize;
use winit::event_loop::EventLoop;

use spin360::engine::Size;

use crate::cli::Cli;
use crate::files::collect_frames;
use crate::loader::{spawn_frame_decoder, UserEvent};
use crate::ui::state::ViewerState;
use crate::ui::App;

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let files = collect_frames(&cli.paths, cli.file_list.as_ref(), cli.recursive, cli.follow_links);
    if files.is_empty() {
        log::error!("No image files found.");
        return;
    }
    let files = Arc::new(files);

    let window_size = LogicalSize::new(cli.width.max(64), cli.height.max(64));
    let state = match ViewerState::new(
        Arc::clone(&files),
        cli.viewer_config(),
        Size::new(window_size.width as f64, window_size.height as f64),
    ) {
        Ok(state) => state,
        Err(e) => {
            log::error!("Invalid options: {}", e);
            return;
        }
    };

    let num_threads = cli.threads.unwrap_or_else(|| {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
            .clamp(4, 16)
    });

    let event_loop = EventLoop::<UserEvent>::with_user_event().build().expect("create event loop");
    let proxy = event_loop.create_proxy();

    log::info!("Decoding {} frames on {} threads", files.len(), num_threads);
    spawn_frame_decoder(Arc::clone(&files), cli.display_width, proxy, num_threads);

    let mut app = App::new(state, window_size, cli.fullscreen);

    event_loop.run_app(&mut app).expect("run event loop");
}
