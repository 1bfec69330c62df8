//! Compositing: scene handoff, draw planning and the OpenGL executor.
//!
//! The protocol thread publishes a [`SceneHandoff`] snapshot (stacking order
//! plus texture handles) under a single mutex; the thread owning the GL
//! context copies it out and renders without ever holding the lock across a
//! GL call.

use std::sync::{Arc, Mutex};

use bitflags::bitflags;

use crate::util::geometry::Rect;

pub mod gl;
pub mod plan;

#[cfg(test)]
mod tests;

bitflags! {
    /// Per-texture draw hints supplied by the scene-graph layer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TextureFlags: u32 {
        /// The surface declared an alpha channel; blend when drawn alone.
        const HAS_ALPHA = 1 << 0;
        /// Drawn after the window's other textures, blended and clipped to
        /// the window content rect (embedded sub-surfaces).
        const STACKS_ON_TOP = 1 << 1;
    }
}

/// A texture handle registered for a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceTexture {
    /// GL texture name, owned by the external scene-graph layer.
    pub id: u32,
    /// Placement in window-local coordinates, top-left origin.
    pub geometry: Rect,
    /// Optional clip in window-local coordinates.
    pub clip: Option<Rect>,
    pub flags: TextureFlags,
}

/// One window as the renderer sees it.
#[derive(Debug, Clone)]
pub struct RenderWindow {
    pub window_id: u32,
    /// Bounding rect in virtual-desktop coordinates.
    pub geometry: Rect,
    /// Content rect in virtual-desktop coordinates.
    pub content: Rect,
    pub opacity: f32,
    pub textures: Vec<SurfaceTexture>,
}

/// Bottom-to-top snapshot of everything visible.
#[derive(Debug, Clone, Default)]
pub struct SceneHandoff {
    pub windows: Vec<RenderWindow>,
}

/// The one cross-thread handle in the system (see concurrency notes above).
pub type SharedScene = Arc<Mutex<SceneHandoff>>;

pub fn shared_scene() -> SharedScene {
    Arc::new(Mutex::new(SceneHandoff::default()))
}
