// madrona
//
// A Wayland shell compositor library: shell protocol adapters
// (xdg-shell, legacy wl_shell, gtk_shell1), a unified window registry,
// multi-output view tracking and an OpenGL compositing backend. The
// embedding desktop UI drives the event loop and consumes ShellEvents.

pub mod config;
pub mod core;
pub mod prelude;
pub mod util;

pub use crate::core::compositor::{Compositor, ShellEvent};
pub use crate::core::state::CompositorState;
