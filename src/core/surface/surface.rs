//! The surface entity.
//!
//! A surface is the buffer-producing object the shell protocols attach
//! window semantics to. Buffer contents themselves are out of scope here;
//! the compositor only tracks the committed size and an opaque buffer
//! handle supplied by the device-integration layer.

use wayland_server::backend::ClientId;

use super::role::SurfaceRole;
use crate::core::errors::CoreError;

/// Double-buffered surface state (pending until commit).
#[derive(Debug, Clone, Default)]
pub struct SurfaceState {
    /// Opaque buffer handle, owned by the external buffer layer.
    pub buffer_id: Option<u64>,
    /// Committed buffer size in surface-local pixels.
    pub width: i32,
    pub height: i32,
    /// Whether the client declared the content fully opaque.
    pub opaque: bool,
}

/// A Wayland surface known to the compositor.
pub struct Surface {
    pub id: u32,
    pub client_id: Option<ClientId>,
    pub role: SurfaceRole,

    /// The wl_surface resource, when the surface came in over the wire.
    pub resource: Option<wayland_server::protocol::wl_surface::WlSurface>,

    /// State visible to the compositor.
    pub current: SurfaceState,
    /// State being built by client requests, applied on commit.
    pub pending: SurfaceState,
}

impl Surface {
    pub fn new(
        id: u32,
        client_id: Option<ClientId>,
        resource: Option<wayland_server::protocol::wl_surface::WlSurface>,
    ) -> Self {
        Self {
            id,
            client_id,
            role: SurfaceRole::None,
            resource,
            current: SurfaceState::default(),
            pending: SurfaceState::default(),
        }
    }

    /// Assign a shell role. Re-assigning the same role is allowed (clients
    /// may recreate their role object); changing to a different role is a
    /// protocol violation reported to the caller.
    pub fn set_role(&mut self, role: SurfaceRole) -> crate::core::errors::Result<()> {
        if !self.role.is_none() && self.role != role {
            return Err(CoreError::RoleConflict {
                surface_id: self.id,
                current: self.role.name(),
                requested: role.name(),
            });
        }
        self.role = role;
        Ok(())
    }

    /// Apply the pending state. Returns true when the committed buffer or
    /// size changed, meaning the owning window needs re-evaluation.
    pub fn commit(&mut self) -> bool {
        let changed = self.current.buffer_id != self.pending.buffer_id
            || self.current.width != self.pending.width
            || self.current.height != self.pending.height;
        self.current = self.pending.clone();
        tracing::trace!(
            "Surface {} committed: {}x{}, buffer={:?}",
            self.id,
            self.current.width,
            self.current.height,
            self.current.buffer_id
        );
        changed
    }

    /// Whether a buffer has ever been committed.
    pub fn is_mapped(&self) -> bool {
        self.current.buffer_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_is_sticky() {
        let mut surface = Surface::new(1, None, None);
        assert!(surface.role.is_none());
        surface.set_role(SurfaceRole::Toplevel).unwrap();
        // Same role again is fine
        surface.set_role(SurfaceRole::Toplevel).unwrap();
        // A different role is a conflict
        let err = surface.set_role(SurfaceRole::Popup).unwrap_err();
        match err {
            CoreError::RoleConflict { surface_id, .. } => assert_eq!(surface_id, 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn commit_applies_pending() {
        let mut surface = Surface::new(2, None, None);
        surface.pending.width = 640;
        surface.pending.height = 480;
        surface.pending.buffer_id = Some(7);

        assert!(!surface.is_mapped());
        assert!(surface.commit());
        assert!(surface.is_mapped());
        assert_eq!(surface.current.width, 640);
        assert_eq!(surface.current.height, 480);

        // Nothing changed, commit reports no change
        assert!(!surface.commit());
    }
}
