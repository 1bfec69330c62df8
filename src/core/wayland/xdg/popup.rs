//! xdg_popup requests.

use wayland_server::{Dispatch, DisplayHandle, Resource};

use wayland_protocols::xdg::shell::server::xdg_popup;

use crate::core::state::CompositorState;
use crate::core::wayland::configure::{PendingConfigure, StateSet};

impl Dispatch<xdg_popup::XdgPopup, u32> for CompositorState {
    fn request(
        state: &mut Self,
        client: &wayland_server::Client,
        resource: &xdg_popup::XdgPopup,
        request: xdg_popup::Request,
        data: &u32,
        _dhandle: &DisplayHandle,
        _data_init: &mut wayland_server::DataInit<'_, Self>,
    ) {
        let window_id = *data;
        let key = (client.id(), resource.id().protocol_id());

        match request {
            xdg_popup::Request::Grab { .. } => {
                // The popup chain already has grab semantics; nothing extra
                // to arm here.
                tracing::trace!("xdg_popup.grab for window {}", window_id);
            }
            xdg_popup::Request::Reposition { positioner, token } => {
                let positioner_data = state
                    .xdg
                    .positioners
                    .get(&(key.0.clone(), positioner.id().protocol_id()))
                    .copied()
                    .unwrap_or_default();

                let parent_geometry = state
                    .xdg
                    .popups
                    .get(&key)
                    .and_then(|p| p.parent_window)
                    .and_then(|id| state.get_window(id))
                    .map(|w| w.geometry())
                    .unwrap_or_default();
                let bounds = state
                    .virtual_geometry
                    .translated(-parent_geometry.x, -parent_geometry.y);
                let (px, py) = positioner_data.calculate_position(bounds);

                if let Some(window) = state.windows.get_mut(&window_id) {
                    window.x = parent_geometry.x + px;
                    window.y = parent_geometry.y + py;
                    window.width = positioner_data.size.0.max(1);
                    window.height = positioner_data.size.1.max(1);
                }

                resource.repositioned(token);
                resource.configure(px, py, positioner_data.size.0, positioner_data.size.1);
                let serial = state.next_serial();
                if let Some(popup_data) = state.xdg.popups.get_mut(&key) {
                    popup_data.tracker.record(PendingConfigure {
                        serial,
                        states: StateSet::empty(),
                        size: (
                            positioner_data.size.0.max(0) as u32,
                            positioner_data.size.1.max(0) as u32,
                        ),
                        output_id: None,
                    });
                }
                let xdg_surface_id = state.xdg.popups.get(&key).map(|p| p.xdg_surface_id);
                if let Some(xdg_surface_id) = xdg_surface_id {
                    if let Some(data) = state.xdg.surfaces.get(&(key.0.clone(), xdg_surface_id)) {
                        data.resource.configure(serial);
                    }
                }
                state.compute_views(window_id);
                state.publish_scene();
            }
            xdg_popup::Request::Destroy => {
                state.xdg.popups.remove(&key);
                state.unregister_window(window_id);
            }
            _ => {}
        }
    }
}
