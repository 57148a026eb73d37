//! Application entry point for the L-system tree editor.
//!
//! This binary sets up logging and eframe/egui, then delegates all
//! interactive logic and rendering to [`Editor`] from the `editor` module.

mod editor;
mod picker;
mod preview;

use editor::Editor;
use picker::NativeFilePicker;
use tracing_subscriber::EnvFilter;

/// Starts the native eframe application.
///
/// Log output is filtered by `RUST_LOG`, defaulting to `info`.
///
/// ### Returns
/// - `Ok(())` if the application runs to completion without errors.
/// - `Err` if eframe fails to create the native window or event loop.
fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let options = eframe::NativeOptions::default();

    eframe::run_native(
        "L-System Tree Editor",
        options,
        Box::new(|_cc| Ok(Box::new(Editor::new(Box::new(NativeFilePicker))))),
    )
}
