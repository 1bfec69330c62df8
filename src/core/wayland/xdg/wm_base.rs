//! xdg_wm_base: the xdg-shell entry point.

use wayland_server::{Dispatch, DisplayHandle, GlobalDispatch, Resource};

use wayland_protocols::xdg::shell::server::xdg_wm_base;

use crate::core::state::{CompositorState, XdgPositionerData, XdgSurfaceData};
use crate::mlog;
use crate::util::logging;

impl GlobalDispatch<xdg_wm_base::XdgWmBase, ()> for CompositorState {
    fn bind(
        state: &mut Self,
        _handle: &DisplayHandle,
        client: &wayland_server::Client,
        resource: wayland_server::New<xdg_wm_base::XdgWmBase>,
        _global_data: &(),
        data_init: &mut wayland_server::DataInit<'_, Self>,
    ) {
        let wm_base = data_init.init(resource, ());
        state
            .xdg
            .wm_bases
            .insert((client.id(), wm_base.id().protocol_id()), wm_base.clone());
        mlog!(
            logging::SHELL,
            "Bound xdg_wm_base version {}",
            wm_base.version()
        );
    }
}

impl Dispatch<xdg_wm_base::XdgWmBase, ()> for CompositorState {
    fn request(
        state: &mut Self,
        client: &wayland_server::Client,
        resource: &xdg_wm_base::XdgWmBase,
        request: xdg_wm_base::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        data_init: &mut wayland_server::DataInit<'_, Self>,
    ) {
        let client_id = client.id();
        match request {
            xdg_wm_base::Request::GetXdgSurface { id, surface } => {
                let surface_id = match surface.data::<u32>() {
                    Some(id) => *id,
                    None => {
                        mlog!(
                            logging::SHELL,
                            "wl_surface {} missing internal id",
                            surface.id().protocol_id()
                        );
                        return;
                    }
                };
                let xdg_surface = data_init.init(id, surface_id);
                state.xdg.surfaces.insert(
                    (client_id, xdg_surface.id().protocol_id()),
                    XdgSurfaceData {
                        surface_id,
                        window_id: None,
                        pending_geometry: None,
                        resource: xdg_surface,
                    },
                );
                tracing::debug!("Created xdg_surface for surface {}", surface_id);
            }
            xdg_wm_base::Request::CreatePositioner { id } => {
                let positioner = data_init.init(id, ());
                state.xdg.positioners.insert(
                    (client_id, positioner.id().protocol_id()),
                    XdgPositionerData::default(),
                );
            }
            xdg_wm_base::Request::Pong { serial } => {
                state.answered_pings.push(serial);
                tracing::trace!("xdg_wm_base pong serial={}", serial);
            }
            xdg_wm_base::Request::Destroy => {
                state
                    .xdg
                    .wm_bases
                    .remove(&(client_id, resource.id().protocol_id()));
            }
            _ => {}
        }
    }
}
