//! xdg_toplevel requests.
//!
//! State changes (maximize, fullscreen) only issue configure proposals
//! here; the flags flip in `ack_configure` once the client commits against
//! the acked serial. Title, app id, parent and the interactive move/resize
//! forwards take effect immediately.

use wayland_server::{Dispatch, DisplayHandle, Resource};

use wayland_protocols::xdg::shell::server::xdg_toplevel;

use crate::core::compositor::ShellEvent;
use crate::core::state::CompositorState;
use crate::core::window::WindowType;

impl Dispatch<xdg_toplevel::XdgToplevel, u32> for CompositorState {
    fn request(
        state: &mut Self,
        client: &wayland_server::Client,
        resource: &xdg_toplevel::XdgToplevel,
        request: xdg_toplevel::Request,
        data: &u32,
        _dhandle: &DisplayHandle,
        _data_init: &mut wayland_server::DataInit<'_, Self>,
    ) {
        let window_id = *data;
        let client_id = client.id();
        let key = (client_id.clone(), resource.id().protocol_id());

        match request {
            xdg_toplevel::Request::SetTitle { title } => {
                state.set_window_title(window_id, &title);
            }
            xdg_toplevel::Request::SetAppId { app_id } => {
                state.set_window_app_id(window_id, &app_id);
            }
            xdg_toplevel::Request::SetParent { parent } => {
                let parent_window = parent.and_then(|p| p.data::<u32>().copied());
                if let Some(window) = state.windows.get_mut(&window_id) {
                    window.parent = parent_window;
                    // A parented toplevel behaves as a transient dialog
                    window.window_type = match parent_window {
                        Some(_) => WindowType::Transient,
                        None => WindowType::TopLevel,
                    };
                }
            }
            xdg_toplevel::Request::SetMinSize { width, height } => {
                if let Some(toplevel) = state.xdg.toplevels.get_mut(&key) {
                    toplevel.min_size = (width, height);
                }
            }
            xdg_toplevel::Request::SetMaxSize { width, height } => {
                if let Some(toplevel) = state.xdg.toplevels.get_mut(&key) {
                    toplevel.max_size = (width, height);
                }
            }
            xdg_toplevel::Request::SetMaximized => {
                state.request_maximize(window_id, true);
            }
            xdg_toplevel::Request::UnsetMaximized => {
                state.request_maximize(window_id, false);
            }
            xdg_toplevel::Request::SetFullscreen { output } => {
                let output_id = output.and_then(|o| state.output_for_resource(&o));
                state.request_fullscreen(window_id, true, output_id);
            }
            xdg_toplevel::Request::UnsetFullscreen => {
                state.request_fullscreen(window_id, false, None);
            }
            xdg_toplevel::Request::SetMinimized => {
                state.minimize_window(window_id);
            }
            xdg_toplevel::Request::Move { .. } => {
                state
                    .pending_events
                    .push(ShellEvent::MoveRequested { window_id });
            }
            xdg_toplevel::Request::Resize { edges, .. } => {
                let edges = match edges {
                    wayland_server::WEnum::Value(e) => e as u32,
                    wayland_server::WEnum::Unknown(v) => v,
                };
                state
                    .pending_events
                    .push(ShellEvent::ResizeRequested { window_id, edges });
            }
            xdg_toplevel::Request::ShowWindowMenu { .. } => {
                tracing::debug!("show_window_menu for window {} ignored", window_id);
            }
            xdg_toplevel::Request::Destroy => {
                state.xdg.toplevels.remove(&key);
                if let Some(data) = state
                    .xdg
                    .surfaces
                    .values_mut()
                    .find(|d| d.window_id == Some(window_id))
                {
                    data.window_id = None;
                }
                state.unregister_window(window_id);
            }
            _ => {}
        }
    }
}
