//! Wayland protocol adapters.
//!
//! Each module binds one protocol surface to the shared registry semantics
//! in [`crate::core::state`]: the shells all funnel into the same window
//! model, only the wire details differ.

use wayland_server::DisplayHandle;

use crate::core::state::CompositorState;
use crate::mlog;
use crate::util::logging;

pub mod compositor;
pub mod configure;
pub mod gtk_shell;
pub mod output;
pub mod seat;
pub mod wl_shell;
pub mod xdg;

/// Register every global the shell offers.
pub fn create_globals(handle: &DisplayHandle, state: &CompositorState) {
    handle.create_global::<CompositorState, wayland_server::protocol::wl_compositor::WlCompositor, ()>(6, ());
    handle.create_global::<CompositorState, wayland_server::protocol::wl_seat::WlSeat, ()>(7, ());
    handle.create_global::<CompositorState, wayland_protocols::xdg::shell::server::xdg_wm_base::XdgWmBase, ()>(3, ());
    handle.create_global::<CompositorState, wayland_server::protocol::wl_shell::WlShell, ()>(1, ());
    handle.create_global::<CompositorState, gtk_shell::protocol::gtk_shell1::GtkShell1, ()>(3, ());

    for output in &state.outputs {
        handle.create_global::<CompositorState, wayland_server::protocol::wl_output::WlOutput, output::OutputGlobal>(
            4,
            output::OutputGlobal::new(output.id),
        );
    }

    mlog!(
        logging::MAIN,
        "Registered globals ({} outputs)",
        state.outputs.len()
    );
}
