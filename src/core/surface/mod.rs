//! Surface entities and shell roles.

pub mod role;
pub mod surface;

pub use role::SurfaceRole;
pub use surface::{Surface, SurfaceState};
