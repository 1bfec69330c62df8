//! The unified window entity.
//!
//! Every shell protocol (xdg-shell, wl_shell, gtk-shell) resolves to one of
//! these. The window owns geometry in virtual-desktop coordinates, the
//! state flags negotiated through configure/ack, and the per-output view
//! list derived from the current output layout.

use crate::core::render::SurfaceTexture;
use crate::util::geometry::Rect;

/// Window classification. `Unknown` until the first role-defining request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowType {
    #[default]
    Unknown,
    TopLevel,
    Transient,
    Popup,
}

/// Per-output presentation of a window.
///
/// A window spanning two outputs has two views, each holding the window
/// position translated into that output's local coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowView {
    pub output_id: u32,
    /// Window origin in output-local coordinates (window.pos - output.pos).
    pub x: i32,
    pub y: i32,
}

/// A client window.
pub struct Window {
    pub id: u32,
    pub surface_id: u32,
    /// Client process id, 0 when the socket credentials were unavailable.
    pub pid: u32,
    pub app_id: String,
    pub title: String,

    pub window_type: WindowType,
    /// Parent window id for Transient/Popup windows. Weak reference: the
    /// registry owns the parent, this is just its id.
    pub parent: Option<u32>,

    /// Position in virtual-desktop coordinates.
    pub x: i32,
    pub y: i32,
    /// Committed surface size.
    pub width: i32,
    pub height: i32,
    /// Client-reported content rect (may differ from the buffer size when
    /// the client draws its own shadows).
    pub window_geometry: Option<Rect>,
    /// Geometry snapshot taken before maximize/fullscreen, restored on unset.
    pub saved_geometry: Option<Rect>,

    pub active: bool,
    pub minimized: bool,
    pub maximized: bool,
    pub fullscreen: bool,
    /// gtk_surface1 modal hint.
    pub modal: bool,

    /// One view per output the window currently intersects.
    pub views: Vec<WindowView>,

    /// Whole-window opacity multiplier applied to every texture draw.
    pub opacity: f32,
    /// Texture handles registered by the scene-graph layer.
    pub textures: Vec<SurfaceTexture>,
}

impl Window {
    pub fn new(id: u32, surface_id: u32) -> Self {
        Self {
            id,
            surface_id,
            pid: 0,
            app_id: String::new(),
            title: String::new(),
            window_type: WindowType::Unknown,
            parent: None,
            x: 0,
            y: 0,
            width: 0,
            height: 0,
            window_geometry: None,
            saved_geometry: None,
            active: false,
            minimized: false,
            maximized: false,
            fullscreen: false,
            modal: false,
            views: Vec::new(),
            opacity: 1.0,
            textures: Vec::new(),
        }
    }

    /// Bounding rect in virtual-desktop coordinates.
    pub fn geometry(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Content rect in virtual-desktop coordinates: the client-reported
    /// window geometry when present, else the full bounding rect.
    pub fn content_geometry(&self) -> Rect {
        match self.window_geometry {
            Some(g) => g.translated(self.x, self.y),
            None => self.geometry(),
        }
    }

    pub fn view_for_output(&self, output_id: u32) -> Option<&WindowView> {
        self.views.iter().find(|v| v.output_id == output_id)
    }

    /// Snapshot geometry before entering maximize/fullscreen. Only the first
    /// snapshot wins so maximize followed by fullscreen restores to the
    /// original floating geometry.
    pub fn save_geometry(&mut self) {
        if self.saved_geometry.is_none() {
            self.saved_geometry = Some(self.geometry());
        }
    }
}
