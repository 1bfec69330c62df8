//! Global compositor state.
//!
//! `CompositorState` is the dispatch target for every Wayland global and
//! holds the shell "business logic" state: the window registry, the output
//! set, per-protocol bookkeeping and the pending shell events. Protocol
//! handlers mutate it; the embedding UI reads the results through
//! [`crate::core::compositor::Compositor`].

use std::collections::HashMap;

use wayland_server::backend::{ClientData, ClientId, DisconnectReason, ObjectId};
use wayland_server::protocol::wl_callback::WlCallback;
use wayland_server::protocol::wl_output::WlOutput;
use wayland_server::protocol::wl_seat::WlSeat;
use wayland_server::protocol::wl_shell_surface::{self, WlShellSurface};
use wayland_server::Resource;

use wayland_protocols::xdg::shell::server::{xdg_popup, xdg_surface, xdg_toplevel, xdg_wm_base};

use crate::core::compositor::ShellEvent;
use crate::core::render::{shared_scene, RenderWindow, SceneHandoff, SharedScene};
use crate::core::surface::Surface;
use crate::core::wayland::configure::{ConfigureTracker, PendingConfigure, StateSet};
use crate::core::wayland::gtk_shell::protocol::gtk_surface1::GtkSurface1;
use crate::core::window::tree::WindowTree;
use crate::core::window::Window;
use crate::mlog;
use crate::util::geometry::Rect;
use crate::util::logging;

mod outputs;
mod popups;
mod windows;

#[cfg(test)]
mod tests;

pub use outputs::OutputState;

// ============================================================================
// Per-protocol data
// ============================================================================

/// Data stored with each xdg_surface.
#[derive(Debug, Clone)]
pub struct XdgSurfaceData {
    pub surface_id: u32,
    /// Window backing this xdg_surface, set once a role is assigned.
    pub window_id: Option<u32>,
    /// Geometry set via set_window_geometry, applied on commit.
    pub pending_geometry: Option<Rect>,
    pub resource: xdg_surface::XdgSurface,
}

/// Data stored with each xdg_toplevel.
#[derive(Debug)]
pub struct XdgToplevelData {
    pub window_id: u32,
    pub surface_id: u32,
    /// Protocol id of the owning xdg_surface.
    pub xdg_surface_id: u32,
    /// Size constraints, 0 means unconstrained.
    pub min_size: (i32, i32),
    pub max_size: (i32, i32),
    pub tracker: ConfigureTracker,
    pub resource: xdg_toplevel::XdgToplevel,
}

impl XdgToplevelData {
    /// Clamp a proposed size to the client's min/max constraints.
    pub fn clamp_size(&self, width: u32, height: u32) -> (u32, u32) {
        let mut w = width;
        let mut h = height;
        if self.min_size.0 > 0 {
            w = w.max(self.min_size.0 as u32);
        }
        if self.min_size.1 > 0 {
            h = h.max(self.min_size.1 as u32);
        }
        if self.max_size.0 > 0 {
            w = w.min(self.max_size.0 as u32);
        }
        if self.max_size.1 > 0 {
            h = h.min(self.max_size.1 as u32);
        }
        (w, h)
    }
}

/// Data stored with each xdg_popup.
#[derive(Debug)]
pub struct XdgPopupData {
    pub window_id: u32,
    pub surface_id: u32,
    pub xdg_surface_id: u32,
    pub parent_window: Option<u32>,
    pub tracker: ConfigureTracker,
    pub resource: xdg_popup::XdgPopup,
}

/// Data stored with each xdg_positioner.
#[derive(Debug, Clone, Copy, Default)]
pub struct XdgPositionerData {
    pub size: (i32, i32),
    pub anchor_rect: Rect,
    pub anchor: u32,
    pub gravity: u32,
    pub constraint_adjustment: u32,
    pub offset: (i32, i32),
}

impl XdgPositionerData {
    /// Final position in parent-local coordinates, constrained to `bounds`.
    ///
    /// Anchor/gravity bits follow xdg_positioner: top=1, bottom=2, left=4,
    /// right=8. Constraint adjustment implements slide (1/2) and flip (4/8).
    pub fn calculate_position(&self, bounds: Rect) -> (i32, i32) {
        let a = self.anchor_rect;
        let mut x = a.x;
        let mut y = a.y;

        if (self.anchor & 4) != 0 {
            // left edge: x stays
        } else if (self.anchor & 8) != 0 {
            x += a.width;
        } else {
            x += a.width / 2;
        }
        if (self.anchor & 1) != 0 {
            // top edge: y stays
        } else if (self.anchor & 2) != 0 {
            y += a.height;
        } else {
            y += a.height / 2;
        }

        let mut px = x + self.offset.0;
        let mut py = y + self.offset.1;

        if (self.gravity & 4) != 0 {
            px -= self.size.0;
        } else if (self.gravity & 8) != 0 {
            // extends right: px stays
        } else {
            px -= self.size.0 / 2;
        }
        if (self.gravity & 1) != 0 {
            py -= self.size.1;
        } else if (self.gravity & 2) != 0 {
            // extends down: py stays
        } else {
            py -= self.size.1 / 2;
        }

        let right = bounds.x + bounds.width;
        let bottom = bounds.y + bounds.height;

        if px < bounds.x || px + self.size.0 > right {
            if (self.constraint_adjustment & 4) != 0 {
                let flipped = 2 * x - px - self.size.0;
                if flipped >= bounds.x && flipped + self.size.0 <= right {
                    px = flipped;
                }
            }
            if (self.constraint_adjustment & 1) != 0 {
                px = px.max(bounds.x).min(right - self.size.0);
            }
        }
        if py < bounds.y || py + self.size.1 > bottom {
            if (self.constraint_adjustment & 8) != 0 {
                let flipped = 2 * y - py - self.size.1;
                if flipped >= bounds.y && flipped + self.size.1 <= bottom {
                    py = flipped;
                }
            }
            if (self.constraint_adjustment & 2) != 0 {
                py = py.max(bounds.y).min(bottom - self.size.1);
            }
        }

        (px, py)
    }
}

/// XDG shell protocol state, keyed by (client, protocol id).
#[derive(Debug, Default)]
pub struct XdgState {
    pub wm_bases: HashMap<(ClientId, u32), xdg_wm_base::XdgWmBase>,
    pub surfaces: HashMap<(ClientId, u32), XdgSurfaceData>,
    pub toplevels: HashMap<(ClientId, u32), XdgToplevelData>,
    pub popups: HashMap<(ClientId, u32), XdgPopupData>,
    pub positioners: HashMap<(ClientId, u32), XdgPositionerData>,
}

/// Data stored with each wl_shell_surface.
///
/// The legacy protocol has no ack on the wire, so the tracker is fed and
/// acknowledged internally the moment a configure is sent.
#[derive(Debug)]
pub struct WlShellSurfaceData {
    pub window_id: u32,
    pub surface_id: u32,
    pub tracker: ConfigureTracker,
    pub resource: WlShellSurface,
}

#[derive(Debug, Default)]
pub struct WlShellState {
    pub surfaces: HashMap<(ClientId, u32), WlShellSurfaceData>,
}

/// Data stored with each gtk_surface1.
#[derive(Debug)]
pub struct GtkSurfaceData {
    pub surface_id: u32,
    pub resource: GtkSurface1,
}

#[derive(Debug, Default)]
pub struct GtkShellState {
    pub surfaces: HashMap<(ClientId, u32), GtkSurfaceData>,
}

// ============================================================================
// Client state
// ============================================================================

/// Data stored with each Wayland client.
#[derive(Debug, Default)]
pub struct ClientState;

impl ClientData for ClientState {
    fn initialized(&self, client_id: ClientId) {
        tracing::info!("Client initialized: {:?}", client_id);
    }

    fn disconnected(&self, client_id: ClientId, reason: DisconnectReason) {
        let reason_str = match reason {
            DisconnectReason::ConnectionClosed => "connection closed",
            DisconnectReason::ProtocolError(_) => "protocol error",
        };
        tracing::info!("Client disconnected: {:?} ({})", client_id, reason_str);
    }
}

// ============================================================================
// CompositorState
// ============================================================================

pub struct CompositorState {
    /// All live surfaces by internal id.
    pub surfaces: HashMap<u32, Surface>,
    /// All live windows by internal id.
    pub windows: HashMap<u32, Window>,
    pub surface_to_window: HashMap<u32, u32>,
    /// Protocol wl_surface id to internal surface id.
    pub protocol_to_internal_surface: HashMap<(ClientId, u32), u32>,

    /// Stacking order, bottom to top.
    pub window_tree: WindowTree,
    /// At most one window is active at a time.
    pub active_window: Option<u32>,
    /// Application id to the windows carrying it, in registration order.
    pub app_ids: HashMap<String, Vec<u32>>,

    pub outputs: Vec<OutputState>,
    pub primary_output: usize,
    pub output_resources: HashMap<ObjectId, WlOutput>,
    pub output_id_by_resource: HashMap<ObjectId, u32>,
    /// Bounding box of all outputs.
    pub virtual_geometry: Rect,
    /// Per-output cascade step counters.
    pub cascade_steps: HashMap<u32, i32>,

    /// Open popup chain, oldest first.
    pub popup_stack: Vec<u32>,
    /// True when no pointer button was pressed at the moment the chain
    /// opened; the first release then dismisses it.
    pub popup_initial_up: bool,

    pub pointer_position: (f64, f64),
    pub pointer_buttons_pressed: u32,

    /// Pending frame callbacks per internal surface id.
    pub frame_callbacks: HashMap<u32, Vec<WlCallback>>,
    /// Ping serials answered since the last collection pass.
    pub answered_pings: Vec<u32>,

    /// Shell events accumulated during dispatch.
    pub pending_events: Vec<ShellEvent>,

    pub xdg: XdgState,
    pub wl_shell: WlShellState,
    pub gtk: GtkShellState,
    pub seat_resources: Vec<WlSeat>,

    /// Scene snapshot shared with the render thread.
    pub scene: SharedScene,

    next_surface_id: u32,
    next_window_id: u32,
    next_output_id: u32,
    serial: u32,
}

impl Default for CompositorState {
    fn default() -> Self {
        Self::new()
    }
}

impl CompositorState {
    pub fn new() -> Self {
        Self {
            surfaces: HashMap::new(),
            windows: HashMap::new(),
            surface_to_window: HashMap::new(),
            protocol_to_internal_surface: HashMap::new(),
            window_tree: WindowTree::new(),
            active_window: None,
            app_ids: HashMap::new(),
            outputs: Vec::new(),
            primary_output: 0,
            output_resources: HashMap::new(),
            output_id_by_resource: HashMap::new(),
            virtual_geometry: Rect::default(),
            cascade_steps: HashMap::new(),
            popup_stack: Vec::new(),
            popup_initial_up: false,
            pointer_position: (0.0, 0.0),
            pointer_buttons_pressed: 0,
            frame_callbacks: HashMap::new(),
            answered_pings: Vec::new(),
            pending_events: Vec::new(),
            xdg: XdgState::default(),
            wl_shell: WlShellState::default(),
            gtk: GtkShellState::default(),
            seat_resources: Vec::new(),
            scene: shared_scene(),
            next_surface_id: 1,
            next_window_id: 1,
            next_output_id: 1,
            serial: 0,
        }
    }

    // =========================================================================
    // ID generators
    // =========================================================================

    pub fn alloc_surface_id(&mut self) -> u32 {
        let id = self.next_surface_id;
        self.next_surface_id += 1;
        id
    }

    pub fn alloc_window_id(&mut self) -> u32 {
        let id = self.next_window_id;
        self.next_window_id += 1;
        id
    }

    pub fn alloc_output_id(&mut self) -> u32 {
        let id = self.next_output_id;
        self.next_output_id += 1;
        id
    }

    /// Mint a fresh event serial. Strictly increasing across the whole
    /// compositor, never per client.
    pub fn next_serial(&mut self) -> u32 {
        self.serial = self.serial.wrapping_add(1);
        self.serial
    }

    pub fn current_serial(&self) -> u32 {
        self.serial
    }

    // =========================================================================
    // Surface registry
    // =========================================================================

    /// Track a wl_surface under a pre-allocated internal id (the id doubles
    /// as the resource user data, so it is minted before resource init).
    pub fn create_surface(
        &mut self,
        id: u32,
        client_id: ClientId,
        protocol_id: u32,
        resource: wayland_server::protocol::wl_surface::WlSurface,
    ) {
        let surface = Surface::new(id, Some(client_id.clone()), Some(resource));
        self.surfaces.insert(id, surface);
        self.protocol_to_internal_surface
            .insert((client_id, protocol_id), id);
        tracing::debug!("Created surface {}", id);
    }

    pub fn destroy_surface(&mut self, client_id: &ClientId, protocol_id: u32) {
        let Some(id) = self
            .protocol_to_internal_surface
            .remove(&(client_id.clone(), protocol_id))
        else {
            return;
        };
        if let Some(window_id) = self.surface_to_window.get(&id).copied() {
            self.unregister_window(window_id);
        }
        self.frame_callbacks.remove(&id);
        self.surfaces.remove(&id);
        tracing::debug!("Destroyed surface {}", id);
    }

    pub fn surface_id_for(&self, client_id: &ClientId, protocol_id: u32) -> Option<u32> {
        self.protocol_to_internal_surface
            .get(&(client_id.clone(), protocol_id))
            .copied()
    }

    /// Apply a surface commit: double-buffered state flips, the backing
    /// window picks up the new content size, frame callbacks stay queued
    /// until the next presented frame.
    pub fn commit_surface(&mut self, surface_id: u32) {
        let Some(surface) = self.surfaces.get_mut(&surface_id) else {
            mlog!(logging::STATE, "Commit for unknown surface {}", surface_id);
            return;
        };
        let changed = surface.commit();
        let mapped = surface.is_mapped();
        // A commit with a buffer attached is damage even when the handle is
        // unchanged; single-buffer clients redraw into the same buffer.
        if !changed && !mapped {
            return;
        }
        let (w, h) = (surface.current.width, surface.current.height);

        // Window geometry set between commits lands now.
        let committed_geometry = self
            .xdg
            .surfaces
            .values_mut()
            .find(|d| d.surface_id == surface_id)
            .and_then(|d| d.pending_geometry.take());

        if let Some(window_id) = self.surface_to_window.get(&surface_id).copied() {
            if let Some(window) = self.windows.get_mut(&window_id) {
                if mapped && w > 0 && h > 0 {
                    window.width = w;
                    window.height = h;
                }
                if let Some(geometry) = committed_geometry {
                    window.window_geometry = Some(geometry);
                }
            }
            self.compute_views(window_id);
        }
        self.publish_scene();
        self.pending_events.push(ShellEvent::RedrawNeeded);
    }

    /// Fire and drop all frame callbacks queued for surfaces; called by the
    /// render side after a frame was presented.
    pub fn send_frame_callbacks(&mut self, time_ms: u32) {
        for (_, callbacks) in self.frame_callbacks.drain() {
            for callback in callbacks {
                callback.done(time_ms);
            }
        }
    }

    // =========================================================================
    // Configure plumbing
    // =========================================================================

    /// Propose a size/state change through whichever shell protocol owns the
    /// window. Returns the minted serial, or `None` when the window has no
    /// shell surface (popup windows are configured at creation only).
    pub fn send_configure(
        &mut self,
        window_id: u32,
        size: (u32, u32),
        states: StateSet,
        output_id: Option<u32>,
    ) -> Option<u32> {
        let serial = self.next_serial();

        if let Some(toplevel) = self
            .xdg
            .toplevels
            .values_mut()
            .find(|t| t.window_id == window_id)
        {
            let (w, h) = toplevel.clamp_size(size.0, size.1);
            let mut state_bytes = Vec::new();
            let mut push = |s: xdg_toplevel::State| {
                state_bytes.extend_from_slice(&(s as u32).to_ne_bytes());
            };
            if states.contains(StateSet::MAXIMIZED) {
                push(xdg_toplevel::State::Maximized);
            }
            if states.contains(StateSet::FULLSCREEN) {
                push(xdg_toplevel::State::Fullscreen);
            }
            if states.contains(StateSet::ACTIVATED) {
                push(xdg_toplevel::State::Activated);
            }
            if states.contains(StateSet::RESIZING) {
                push(xdg_toplevel::State::Resizing);
            }

            toplevel.tracker.record(PendingConfigure {
                serial,
                states,
                size: (w, h),
                output_id,
            });
            toplevel.resource.configure(w as i32, h as i32, state_bytes);

            let xdg_surface_id = toplevel.xdg_surface_id;
            let client = toplevel.resource.client().map(|c| c.id());
            if let Some(client_id) = client {
                if let Some(xdg_surface) = self.xdg.surfaces.get(&(client_id, xdg_surface_id)) {
                    xdg_surface.resource.configure(serial);
                }
            }
            mlog!(
                logging::SHELL,
                "Configure window {} serial={} size={}x{} states={:?}",
                window_id,
                serial,
                w,
                h,
                states
            );
            return Some(serial);
        }

        if let Some(shell_surface) = self
            .wl_shell
            .surfaces
            .values_mut()
            .find(|s| s.window_id == window_id)
        {
            // No ack on the legacy wire: record and acknowledge in one step.
            shell_surface.tracker.record(PendingConfigure {
                serial,
                states,
                size,
                output_id,
            });
            shell_surface.resource.configure(
                wl_shell_surface::Resize::None,
                size.0 as i32,
                size.1 as i32,
            );
            if let Some(configure) = shell_surface.tracker.ack(serial) {
                self.apply_configure(window_id, configure);
            }
            return Some(serial);
        }

        None
    }

    /// Route an acked serial to the window's tracker; stale serials are
    /// silently dropped.
    pub fn ack_configure(&mut self, window_id: u32, serial: u32) {
        let acked = self
            .xdg
            .toplevels
            .values_mut()
            .find(|t| t.window_id == window_id)
            .and_then(|t| t.tracker.ack(serial))
            .or_else(|| {
                self.xdg
                    .popups
                    .values_mut()
                    .find(|p| p.window_id == window_id)
                    .and_then(|p| p.tracker.ack(serial))
            });
        match acked {
            Some(configure) => self.apply_configure(window_id, configure),
            None => tracing::trace!(
                "Ignoring stale ack serial={} for window {}",
                serial,
                window_id
            ),
        }
    }

    /// Flip window flags and geometry now that the client acknowledged the
    /// proposal carrying them.
    pub fn apply_configure(&mut self, window_id: u32, configure: PendingConfigure) {
        let output_geometry = configure
            .output_id
            .and_then(|id| self.outputs.iter().find(|o| o.id == id))
            .map(|o| (o.geometry(), o.available_geometry()));

        let Some(window) = self.windows.get_mut(&window_id) else {
            mlog!(logging::STATE, "Ack for unknown window {}", window_id);
            return;
        };

        let was_maximized = window.maximized;
        let was_fullscreen = window.fullscreen;
        let fullscreen = configure.states.contains(StateSet::FULLSCREEN);
        // The two flags are mutually exclusive; fullscreen wins
        let maximized = configure.states.contains(StateSet::MAXIMIZED) && !fullscreen;

        if (maximized && !was_maximized) || (fullscreen && !was_fullscreen) {
            window.save_geometry();
        }

        window.maximized = maximized;
        window.fullscreen = fullscreen;

        if fullscreen {
            if let Some((full, _)) = output_geometry {
                window.x = full.x;
                window.y = full.y;
                window.width = full.width;
                window.height = full.height;
            }
        } else if maximized {
            if let Some((_, avail)) = output_geometry {
                window.x = avail.x;
                window.y = avail.y;
                window.width = avail.width;
                window.height = avail.height;
            }
        } else if (was_maximized || was_fullscreen) && !maximized && !fullscreen {
            if let Some(saved) = window.saved_geometry.take() {
                window.x = saved.x;
                window.y = saved.y;
                window.width = saved.width;
                window.height = saved.height;
            }
        } else if configure.size.0 > 0 && configure.size.1 > 0 {
            window.width = configure.size.0 as i32;
            window.height = configure.size.1 as i32;
        }

        if maximized != was_maximized {
            self.pending_events.push(ShellEvent::WindowMaximized {
                window_id,
                maximized,
            });
        }
        if fullscreen != was_fullscreen {
            self.pending_events.push(ShellEvent::WindowFullscreen {
                window_id,
                fullscreen,
            });
        }

        self.compute_views(window_id);
        self.publish_scene();
        self.pending_events.push(ShellEvent::RedrawNeeded);
    }

    // =========================================================================
    // Pings
    // =========================================================================

    /// Send a ping through every xdg_wm_base and wl_shell_surface; returns
    /// one (serial, affected window ids) pair per ping sent, for the
    /// compositor's timeout bookkeeping.
    pub fn ping_all(&mut self) -> Vec<(u32, Vec<u32>)> {
        let mut sent = Vec::new();

        // One ping per wm_base covers all that client's toplevels.
        let wm_bases: Vec<(ClientId, xdg_wm_base::XdgWmBase)> = self
            .xdg
            .wm_bases
            .iter()
            .map(|((client_id, _), res)| (client_id.clone(), res.clone()))
            .collect();
        for (client_id, wm_base) in wm_bases {
            let window_ids: Vec<u32> = self
                .xdg
                .toplevels
                .iter()
                .filter(|((cid, _), _)| *cid == client_id)
                .map(|(_, t)| t.window_id)
                .collect();
            if window_ids.is_empty() {
                continue;
            }
            let serial = self.next_serial();
            wm_base.ping(serial);
            sent.push((serial, window_ids));
        }

        // Legacy shell pings are per surface.
        let shell_surfaces: Vec<(u32, WlShellSurface)> = self
            .wl_shell
            .surfaces
            .values()
            .map(|s| (s.window_id, s.resource.clone()))
            .collect();
        for (window_id, resource) in shell_surfaces {
            let serial = self.next_serial();
            resource.ping(serial);
            sent.push((serial, vec![window_id]));
        }

        sent
    }

    // =========================================================================
    // Scene publication
    // =========================================================================

    /// Rebuild the shared scene snapshot from the stacking order.
    pub fn publish_scene(&self) {
        let mut windows = Vec::new();
        for window_id in self.window_tree.iter_bottom_up() {
            let Some(window) = self.windows.get(&window_id) else {
                continue;
            };
            if window.minimized || window.views.is_empty() {
                continue;
            }
            windows.push(RenderWindow {
                window_id: window.id,
                geometry: window.geometry(),
                content: window.content_geometry(),
                opacity: window.opacity,
                textures: window.textures.clone(),
            });
        }
        *self.scene.lock().unwrap() = SceneHandoff { windows };
    }
}
