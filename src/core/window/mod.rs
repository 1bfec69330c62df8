//! Window model: the unified window entity, stacking order, placement.

pub mod placement;
pub mod tree;
pub mod window;

#[cfg(test)]
mod tests;

pub use tree::WindowTree;
pub use window::{Window, WindowType, WindowView};
