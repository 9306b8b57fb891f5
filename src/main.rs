//! # Voxel Renderer Entry Point
//!
//! Runs the renderer and exits non-zero if it fails to start.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release
//! ```

fn main() {
    if let Err(error) = voxel_renderer::run() {
        log::error!("{}", error);
        std::process::exit(1);
    }
}
