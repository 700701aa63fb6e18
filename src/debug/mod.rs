//! Debug visualization of detected geometry.

pub mod overlay;

pub use overlay::{build_debug_overlay, render_overlay, DebugOverlay};
