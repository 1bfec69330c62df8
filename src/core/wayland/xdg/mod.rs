//! xdg-shell adapter: wm_base, surfaces, toplevels, popups, positioners.

pub mod popup;
pub mod positioner;
pub mod surface;
pub mod toplevel;
pub mod wm_base;
