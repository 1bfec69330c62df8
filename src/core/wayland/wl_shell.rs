//! Legacy wl_shell adapter.
//!
//! The old shell assigns roles with follow-up requests (set_toplevel,
//! set_transient, set_popup) instead of separate objects, and its configure
//! has no acknowledgement. Both quirks are absorbed here: the window is
//! created unclassified at get_shell_surface time and classified later, and
//! every configure is recorded and acked internally in one step so the rest
//! of the compositor sees the same ack-driven state machine as xdg-shell.

use wayland_server::protocol::wl_shell::{self, WlShell};
use wayland_server::protocol::wl_shell_surface::{self, WlShellSurface};
use wayland_server::{Dispatch, DisplayHandle, GlobalDispatch, Resource};

use crate::core::compositor::ShellEvent;
use crate::core::state::{CompositorState, WlShellSurfaceData};
use crate::core::surface::SurfaceRole;
use crate::core::window::{Window, WindowType};
use crate::mlog;
use crate::util::logging;

impl GlobalDispatch<WlShell, ()> for CompositorState {
    fn bind(
        _state: &mut Self,
        _handle: &DisplayHandle,
        _client: &wayland_server::Client,
        resource: wayland_server::New<WlShell>,
        _global_data: &(),
        data_init: &mut wayland_server::DataInit<'_, Self>,
    ) {
        let shell = data_init.init(resource, ());
        mlog!(logging::SHELL, "Bound wl_shell version {}", shell.version());
    }
}

impl Dispatch<WlShell, ()> for CompositorState {
    fn request(
        state: &mut Self,
        client: &wayland_server::Client,
        _resource: &WlShell,
        request: wl_shell::Request,
        _data: &(),
        dhandle: &DisplayHandle,
        data_init: &mut wayland_server::DataInit<'_, Self>,
    ) {
        if let wl_shell::Request::GetShellSurface { id, surface } = request {
            let Some(surface_id) = surface.data::<u32>().copied() else {
                mlog!(
                    logging::SHELL,
                    "wl_surface {} missing internal id",
                    surface.id().protocol_id()
                );
                return;
            };

            // The window exists from here on; its type stays Unknown until
            // the client sends a role request.
            let window_id = state.alloc_window_id();
            let mut window = Window::new(window_id, surface_id);
            window.pid = client
                .get_credentials(dhandle)
                .map(|c| c.pid as u32)
                .unwrap_or(0);
            let shell_surface = data_init.init(id, window_id);
            state.wl_shell.surfaces.insert(
                (client.id(), shell_surface.id().protocol_id()),
                WlShellSurfaceData {
                    window_id,
                    surface_id,
                    tracker: Default::default(),
                    resource: shell_surface,
                },
            );
            state.register_window(window);
            mlog!(
                logging::SHELL,
                "Created wl_shell_surface window {} for surface {}",
                window_id,
                surface_id
            );
        }
    }
}

impl Dispatch<WlShellSurface, u32> for CompositorState {
    fn request(
        state: &mut Self,
        _client: &wayland_server::Client,
        resource: &WlShellSurface,
        request: wl_shell_surface::Request,
        data: &u32,
        _dhandle: &DisplayHandle,
        _data_init: &mut wayland_server::DataInit<'_, Self>,
    ) {
        let window_id = *data;

        match request {
            wl_shell_surface::Request::Pong { serial } => {
                state.answered_pings.push(serial);
            }

            wl_shell_surface::Request::SetToplevel => {
                let surface_id = state.get_window(window_id).map(|w| w.surface_id);
                if let Some(surface_id) = surface_id {
                    if let Some(surface) = state.surfaces.get_mut(&surface_id) {
                        if let Err(e) = surface.set_role(SurfaceRole::Toplevel) {
                            mlog!(logging::SHELL, "{}", e);
                            return;
                        }
                    }
                }
                if let Some(window) = state.windows.get_mut(&window_id) {
                    window.window_type = WindowType::TopLevel;
                    window.parent = None;
                }
                state.place_new_window(window_id);
            }

            wl_shell_surface::Request::SetTransient { parent, x, y, .. } => {
                // A parent that never got a shell surface cannot anchor a
                // transient; treat it as the client mixing up its roles.
                let Some(parent_window) = parent
                    .data::<u32>()
                    .copied()
                    .and_then(|sid| state.window_for_surface(sid))
                else {
                    resource.post_error(
                        wl_shell::Error::Role,
                        "transient parent has no shell surface",
                    );
                    return;
                };
                let surface_id = state.get_window(window_id).map(|w| w.surface_id);
                if let Some(surface_id) = surface_id {
                    if let Some(surface) = state.surfaces.get_mut(&surface_id) {
                        if let Err(e) = surface.set_role(SurfaceRole::Transient) {
                            mlog!(logging::SHELL, "{}", e);
                            return;
                        }
                    }
                }
                let parent_pos = state
                    .get_window(parent_window)
                    .map(|w| (w.x, w.y))
                    .unwrap_or((0, 0));
                if let Some(window) = state.windows.get_mut(&window_id) {
                    window.window_type = WindowType::Transient;
                    window.parent = Some(parent_window);
                    // Transient position is parent-relative on the wire
                    window.x = parent_pos.0 + x;
                    window.y = parent_pos.1 + y;
                }
                state.compute_views(window_id);
                state.publish_scene();
            }

            wl_shell_surface::Request::SetPopup { parent, x, y, .. } => {
                // An unresolvable parent would leave the popup outside every
                // ancestry chain, undismissable.
                let Some(parent_window) = parent
                    .data::<u32>()
                    .copied()
                    .and_then(|sid| state.window_for_surface(sid))
                else {
                    resource.post_error(
                        wl_shell::Error::Role,
                        "popup parent has no shell surface",
                    );
                    return;
                };
                let surface_id = state.get_window(window_id).map(|w| w.surface_id);
                if let Some(surface_id) = surface_id {
                    if let Some(surface) = state.surfaces.get_mut(&surface_id) {
                        if let Err(e) = surface.set_role(SurfaceRole::Popup) {
                            mlog!(logging::SHELL, "{}", e);
                            return;
                        }
                    }
                }
                let parent_pos = state
                    .get_window(parent_window)
                    .map(|w| (w.x, w.y))
                    .unwrap_or((0, 0));
                if let Some(window) = state.windows.get_mut(&window_id) {
                    window.window_type = WindowType::Popup;
                    window.parent = Some(parent_window);
                    window.x = parent_pos.0 + x;
                    window.y = parent_pos.1 + y;
                }
                state.push_popup(window_id);
                state.compute_views(window_id);
                state.publish_scene();
            }

            wl_shell_surface::Request::SetMaximized { .. } => {
                // The output hint is advisory; the window's own views decide
                state.request_maximize(window_id, true);
            }

            wl_shell_surface::Request::SetFullscreen { output, .. } => {
                let output_id = output.and_then(|o| state.output_for_resource(&o));
                state.request_fullscreen(window_id, true, output_id);
            }

            wl_shell_surface::Request::SetTitle { title } => {
                state.set_window_title(window_id, &title);
            }
            wl_shell_surface::Request::SetClass { class_ } => {
                // wl_shell's class is the closest thing to an app id
                state.set_window_app_id(window_id, &class_);
            }

            wl_shell_surface::Request::Move { .. } => {
                state
                    .pending_events
                    .push(ShellEvent::MoveRequested { window_id });
            }
            wl_shell_surface::Request::Resize { edges, .. } => {
                let edges = match edges {
                    wayland_server::WEnum::Value(e) => e.bits(),
                    wayland_server::WEnum::Unknown(v) => v,
                };
                state
                    .pending_events
                    .push(ShellEvent::ResizeRequested { window_id, edges });
            }
            _ => {}
        }
    }

    fn destroyed(
        state: &mut Self,
        _client: wayland_server::backend::ClientId,
        resource: &WlShellSurface,
        data: &u32,
    ) {
        let window_id = *data;
        state
            .wl_shell
            .surfaces
            .retain(|_, s| s.resource.id() != resource.id());
        state.unregister_window(window_id);
        tracing::debug!("wl_shell_surface for window {} destroyed", window_id);
    }
}
