//! xdg_surface: role assignment and the ack side of configure.

use wayland_server::{Dispatch, DisplayHandle, Resource};

use wayland_protocols::xdg::shell::server::{xdg_surface, xdg_wm_base};

use crate::core::state::{CompositorState, XdgPopupData, XdgToplevelData};
use crate::core::surface::SurfaceRole;
use crate::core::wayland::configure::{PendingConfigure, StateSet};
use crate::core::window::{Window, WindowType};
use crate::mlog;
use crate::util::geometry::Rect;
use crate::util::logging;

impl Dispatch<xdg_surface::XdgSurface, u32> for CompositorState {
    fn request(
        state: &mut Self,
        client: &wayland_server::Client,
        resource: &xdg_surface::XdgSurface,
        request: xdg_surface::Request,
        data: &u32,
        dhandle: &DisplayHandle,
        data_init: &mut wayland_server::DataInit<'_, Self>,
    ) {
        let surface_id = *data;
        let client_id = client.id();
        let xdg_surface_id = resource.id().protocol_id();

        match request {
            xdg_surface::Request::GetToplevel { id } => {
                // Role is sticky; a second role request is fatal to the client.
                if let Some(surface) = state.surfaces.get_mut(&surface_id) {
                    if let Err(e) = surface.set_role(SurfaceRole::Toplevel) {
                        resource.post_error(xdg_wm_base::Error::Role, e.to_string());
                        return;
                    }
                }

                let window_id = state.alloc_window_id();
                let mut window = Window::new(window_id, surface_id);
                window.window_type = WindowType::TopLevel;
                window.pid = client
                    .get_credentials(dhandle)
                    .map(|c| c.pid as u32)
                    .unwrap_or(0);

                let toplevel = data_init.init(id, window_id);
                state.xdg.toplevels.insert(
                    (client_id.clone(), toplevel.id().protocol_id()),
                    XdgToplevelData {
                        window_id,
                        surface_id,
                        xdg_surface_id,
                        min_size: (0, 0),
                        max_size: (0, 0),
                        tracker: Default::default(),
                        resource: toplevel,
                    },
                );
                if let Some(data) = state
                    .xdg
                    .surfaces
                    .get_mut(&(client_id.clone(), xdg_surface_id))
                {
                    data.window_id = Some(window_id);
                }

                state.register_window(window);
                state.place_new_window(window_id);

                // Initial configure: size 0 lets the client pick, activation
                // reflects the registry (a new window is active).
                state.send_configure(window_id, (0, 0), StateSet::ACTIVATED, None);
                mlog!(
                    logging::SHELL,
                    "Created xdg_toplevel window {} for surface {}",
                    window_id,
                    surface_id
                );
            }

            xdg_surface::Request::GetPopup {
                id,
                parent,
                positioner,
            } => {
                let parent_window = parent.as_ref().and_then(|p| {
                    let parent_id = p.id().protocol_id();
                    state
                        .xdg
                        .surfaces
                        .get(&(client_id.clone(), parent_id))
                        .and_then(|d| d.window_id)
                });
                let Some(parent_window) = parent_window else {
                    // Parentless popups need a follow-up reposition we do not
                    // implement, and a dead parent is a client error.
                    resource.post_error(
                        xdg_wm_base::Error::InvalidPopupParent,
                        "popup parent is not a mapped xdg_surface",
                    );
                    return;
                };

                if let Some(surface) = state.surfaces.get_mut(&surface_id) {
                    if let Err(e) = surface.set_role(SurfaceRole::Popup) {
                        resource.post_error(xdg_wm_base::Error::Role, e.to_string());
                        return;
                    }
                }

                let positioner_data = state
                    .xdg
                    .positioners
                    .get(&(client_id.clone(), positioner.id().protocol_id()))
                    .copied()
                    .unwrap_or_default();

                let parent_geometry = state
                    .get_window(parent_window)
                    .map(|w| w.geometry())
                    .unwrap_or_default();
                let bounds = state
                    .output_at(
                        (parent_geometry.x + parent_geometry.width / 2) as f64,
                        (parent_geometry.y + parent_geometry.height / 2) as f64,
                    )
                    .map(|o| o.geometry())
                    .unwrap_or(state.virtual_geometry);
                // Positioner math is parent-local; constrain in that space.
                let local_bounds = bounds.translated(-parent_geometry.x, -parent_geometry.y);
                let (px, py) = positioner_data.calculate_position(local_bounds);

                let window_id = state.alloc_window_id();
                let mut window = Window::new(window_id, surface_id);
                window.window_type = WindowType::Popup;
                window.pid = client
                    .get_credentials(dhandle)
                    .map(|c| c.pid as u32)
                    .unwrap_or(0);
                window.parent = Some(parent_window);
                window.x = parent_geometry.x + px;
                window.y = parent_geometry.y + py;
                window.width = positioner_data.size.0.max(1);
                window.height = positioner_data.size.1.max(1);

                let popup = data_init.init(id, window_id);
                let serial = state.next_serial();
                popup.configure(px, py, positioner_data.size.0, positioner_data.size.1);
                resource.configure(serial);

                state.xdg.popups.insert(
                    (client_id.clone(), popup.id().protocol_id()),
                    XdgPopupData {
                        window_id,
                        surface_id,
                        xdg_surface_id,
                        parent_window: Some(parent_window),
                        tracker: {
                            let mut tracker =
                                crate::core::wayland::configure::ConfigureTracker::new();
                            tracker.record(PendingConfigure {
                                serial,
                                states: StateSet::empty(),
                                size: (
                                    positioner_data.size.0.max(0) as u32,
                                    positioner_data.size.1.max(0) as u32,
                                ),
                                output_id: None,
                            });
                            tracker
                        },
                        resource: popup,
                    },
                );
                if let Some(data) = state
                    .xdg
                    .surfaces
                    .get_mut(&(client_id.clone(), xdg_surface_id))
                {
                    data.window_id = Some(window_id);
                }

                state.register_window(window);
                state.push_popup(window_id);
                mlog!(
                    logging::SHELL,
                    "Created xdg_popup window {} at ({}, {}) under parent {}",
                    window_id,
                    px,
                    py,
                    parent_window
                );
            }

            xdg_surface::Request::SetWindowGeometry {
                x,
                y,
                width,
                height,
            } => {
                // Double-buffered: picked up by the next wl_surface.commit.
                if let Some(data) = state
                    .xdg
                    .surfaces
                    .get_mut(&(client_id.clone(), xdg_surface_id))
                {
                    data.pending_geometry = Some(Rect::new(x, y, width, height));
                }
            }

            xdg_surface::Request::AckConfigure { serial } => {
                let window_id = state
                    .xdg
                    .surfaces
                    .get(&(client_id.clone(), xdg_surface_id))
                    .and_then(|d| d.window_id);
                if let Some(window_id) = window_id {
                    state.ack_configure(window_id, serial);
                }
            }

            xdg_surface::Request::Destroy => {
                state
                    .xdg
                    .surfaces
                    .remove(&(client_id.clone(), xdg_surface_id));
            }
            _ => {}
        }
    }
}
