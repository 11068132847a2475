mod app;
mod context;
mod error;
mod geometry;
mod history;
mod input;
mod io;
mod keybindings;
mod render;
mod scene;
mod session;
mod settings;
mod tools;
mod ui;
mod util;
mod workflow;

use app::App;

fn main() {
    env_logger::init();
    log::info!("Starting Roomcraft 3D");

    let event_loop = match winit::event_loop::EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            log::error!("failed to create event loop: {e}");
            std::process::exit(1);
        }
    };
    event_loop.set_control_flow(winit::event_loop::ControlFlow::Poll);

    let mut app = App::new();
    if let Err(e) = event_loop.run_app(&mut app) {
        log::error!("event loop error: {e}");
        std::process::exit(1);
    }
}
