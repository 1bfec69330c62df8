//! Shell roles a surface can take.
//!
//! A surface gets exactly one role for its lifetime; the three shell
//! protocols all funnel their role assignment through `Surface::set_role`
//! so role conflicts are caught in one place regardless of which protocol
//! the client speaks.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SurfaceRole {
    #[default]
    None,
    Toplevel,
    Transient,
    Popup,
}

impl SurfaceRole {
    pub fn is_none(&self) -> bool {
        matches!(self, SurfaceRole::None)
    }

    pub fn name(&self) -> &'static str {
        match self {
            SurfaceRole::None => "none",
            SurfaceRole::Toplevel => "toplevel",
            SurfaceRole::Transient => "transient",
            SurfaceRole::Popup => "popup",
        }
    }
}
