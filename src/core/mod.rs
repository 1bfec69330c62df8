pub mod compositor;
pub mod errors;
pub mod render;
pub mod state;
pub mod surface;
pub mod wayland;
pub mod window;

// Re-export key types
pub use compositor::{Compositor, ShellEvent};
pub use errors::CoreError;
pub use state::CompositorState;
