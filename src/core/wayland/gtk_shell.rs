//! gtk_shell1 adapter.
//!
//! GTK clients attach a gtk_surface1 to a surface that already carries a
//! shell role; the extension supplies D-Bus identity (which overrides the
//! role protocol's app id), modality hints, focus requests and the system
//! bell. The protocol is not shipped by the wayland-protocols crate, so the
//! server code is generated from the vendored XML.

use wayland_server::{Dispatch, DisplayHandle, GlobalDispatch, Resource};

use crate::core::compositor::ShellEvent;
use crate::core::state::{CompositorState, GtkSurfaceData};
use crate::mlog;
use crate::util::logging;

#[allow(non_upper_case_globals)]
pub mod protocol {
    use wayland_server;

    pub mod __interfaces {
        use wayland_server::protocol::__interfaces::*;
        wayland_scanner::generate_interfaces!("protocols/gtk-shell.xml");
    }
    use self::__interfaces::*;
    use wayland_server::protocol::*;

    wayland_scanner::generate_server_code!("protocols/gtk-shell.xml");
}

use protocol::gtk_shell1::{self, GtkShell1};
use protocol::gtk_surface1::{self, GtkSurface1};

impl GlobalDispatch<GtkShell1, ()> for CompositorState {
    fn bind(
        _state: &mut Self,
        _handle: &DisplayHandle,
        _client: &wayland_server::Client,
        resource: wayland_server::New<GtkShell1>,
        _global_data: &(),
        data_init: &mut wayland_server::DataInit<'_, Self>,
    ) {
        let shell = data_init.init(resource, ());
        // No global menus or desktop icons on offer
        shell.capabilities(0);
        mlog!(logging::SHELL, "Bound gtk_shell1 version {}", shell.version());
    }
}

impl Dispatch<GtkShell1, ()> for CompositorState {
    fn request(
        state: &mut Self,
        client: &wayland_server::Client,
        _resource: &GtkShell1,
        request: gtk_shell1::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        data_init: &mut wayland_server::DataInit<'_, Self>,
    ) {
        match request {
            gtk_shell1::Request::GetGtkSurface {
                gtk_surface,
                surface,
            } => {
                let Some(surface_id) = surface.data::<u32>().copied() else {
                    mlog!(
                        logging::SHELL,
                        "wl_surface {} missing internal id",
                        surface.id().protocol_id()
                    );
                    return;
                };
                let gtk_surface = data_init.init(gtk_surface, surface_id);
                state.gtk.surfaces.insert(
                    (client.id(), gtk_surface.id().protocol_id()),
                    GtkSurfaceData {
                        surface_id,
                        resource: gtk_surface,
                    },
                );
            }
            gtk_shell1::Request::SetStartupId { startup_id } => {
                tracing::debug!("gtk_shell1 startup id {:?}", startup_id);
            }
            gtk_shell1::Request::SystemBell { surface } => {
                let window_id = surface
                    .and_then(|s| s.data::<u32>().copied())
                    .and_then(|surface_id| state.window_for_surface(surface_id));
                state.pending_events.push(ShellEvent::SystemBell { window_id });
            }
            gtk_shell1::Request::NotifyLaunch { startup_id } => {
                tracing::debug!("gtk_shell1 launch notification {:?}", startup_id);
            }
            _ => {}
        }
    }
}

impl Dispatch<GtkSurface1, u32> for CompositorState {
    fn request(
        state: &mut Self,
        _client: &wayland_server::Client,
        _resource: &GtkSurface1,
        request: gtk_surface1::Request,
        data: &u32,
        _dhandle: &DisplayHandle,
        _data_init: &mut wayland_server::DataInit<'_, Self>,
    ) {
        let surface_id = *data;
        // The shell role may be assigned after the gtk_surface; resolve late
        let window_id = state.window_for_surface(surface_id);

        match request {
            gtk_surface1::Request::SetDbusProperties { application_id, .. } => {
                // The D-Bus application id wins over whatever the shell role
                // protocol reported.
                if let (Some(window_id), Some(app_id)) = (window_id, application_id) {
                    if !app_id.is_empty() {
                        state.set_window_app_id(window_id, &app_id);
                    }
                }
            }
            gtk_surface1::Request::SetModal => {
                if let Some(window_id) = window_id {
                    state.set_window_modal(window_id, true);
                }
            }
            gtk_surface1::Request::UnsetModal => {
                if let Some(window_id) = window_id {
                    state.set_window_modal(window_id, false);
                }
            }
            gtk_surface1::Request::Present { time } => {
                tracing::trace!("gtk_surface1 present at {}", time);
                if let Some(window_id) = window_id {
                    state.set_active_window(Some(window_id));
                }
            }
            gtk_surface1::Request::RequestFocus { .. } => {
                if let Some(window_id) = window_id {
                    state.set_active_window(Some(window_id));
                }
            }
            _ => {}
        }
    }

    fn destroyed(
        state: &mut Self,
        _client: wayland_server::backend::ClientId,
        resource: &GtkSurface1,
        _data: &u32,
    ) {
        state
            .gtk
            .surfaces
            .retain(|_, s| s.resource.id() != resource.id());
    }
}
