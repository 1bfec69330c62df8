//! wl_compositor, wl_surface, wl_region and wl_callback handling.
//!
//! Surfaces carry their internal id as resource user data so every later
//! lookup is O(1) and collision-free across clients.

use wayland_server::protocol::{wl_callback, wl_compositor, wl_region, wl_surface};
use wayland_server::{Dispatch, DisplayHandle, GlobalDispatch, Resource};

use crate::core::state::CompositorState;

impl GlobalDispatch<wl_compositor::WlCompositor, ()> for CompositorState {
    fn bind(
        _state: &mut Self,
        _handle: &DisplayHandle,
        _client: &wayland_server::Client,
        resource: wayland_server::New<wl_compositor::WlCompositor>,
        _global_data: &(),
        data_init: &mut wayland_server::DataInit<'_, Self>,
    ) {
        let compositor = data_init.init(resource, ());
        tracing::debug!("Bound wl_compositor version {}", compositor.version());
    }
}

impl Dispatch<wl_compositor::WlCompositor, ()> for CompositorState {
    fn request(
        state: &mut Self,
        client: &wayland_server::Client,
        _resource: &wl_compositor::WlCompositor,
        request: wl_compositor::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        data_init: &mut wayland_server::DataInit<'_, Self>,
    ) {
        match request {
            wl_compositor::Request::CreateSurface { id } => {
                // The internal id becomes the wl_surface user data.
                let internal_id = state.alloc_surface_id();
                let surface = data_init.init(id, internal_id);
                let protocol_id = surface.id().protocol_id();
                state.create_surface(internal_id, client.id(), protocol_id, surface);
            }
            wl_compositor::Request::CreateRegion { id } => {
                // Regions only matter for opaque hints; track nothing per region.
                data_init.init(id, ());
            }
            _ => {}
        }
    }
}

impl Dispatch<wl_surface::WlSurface, u32> for CompositorState {
    fn request(
        state: &mut Self,
        client: &wayland_server::Client,
        resource: &wl_surface::WlSurface,
        request: wl_surface::Request,
        data: &u32,
        _dhandle: &DisplayHandle,
        data_init: &mut wayland_server::DataInit<'_, Self>,
    ) {
        let surface_id = *data;
        match request {
            wl_surface::Request::Attach { buffer, x, y } => {
                if let Some(surface) = state.surfaces.get_mut(&surface_id) {
                    match buffer {
                        Some(buffer) => {
                            surface.pending.buffer_id =
                                Some(buffer.id().protocol_id() as u64);
                            tracing::trace!(
                                "Surface {} attached buffer at ({}, {})",
                                surface_id,
                                x,
                                y
                            );
                        }
                        None => {
                            surface.pending.buffer_id = None;
                            tracing::trace!("Surface {} detached buffer", surface_id);
                        }
                    }
                }
            }
            wl_surface::Request::SetOpaqueRegion { region } => {
                if let Some(surface) = state.surfaces.get_mut(&surface_id) {
                    // A non-empty opaque region lets the renderer skip blending
                    surface.pending.opaque = region.is_some();
                }
            }
            wl_surface::Request::Frame { callback } => {
                let callback: wl_callback::WlCallback = data_init.init(callback, ());
                state
                    .frame_callbacks
                    .entry(surface_id)
                    .or_default()
                    .push(callback);
            }
            wl_surface::Request::Commit => {
                state.commit_surface(surface_id);
            }
            wl_surface::Request::Destroy => {
                let protocol_id = resource.id().protocol_id();
                state.destroy_surface(&client.id(), protocol_id);
            }
            // Damage tracking and buffer transforms are handled by the
            // device-integration layer.
            _ => {}
        }
    }
}

impl Dispatch<wl_region::WlRegion, ()> for CompositorState {
    fn request(
        _state: &mut Self,
        _client: &wayland_server::Client,
        _resource: &wl_region::WlRegion,
        _request: wl_region::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut wayland_server::DataInit<'_, Self>,
    ) {
    }
}

impl Dispatch<wl_callback::WlCallback, ()> for CompositorState {
    fn request(
        _state: &mut Self,
        _client: &wayland_server::Client,
        _resource: &wl_callback::WlCallback,
        _request: wl_callback::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut wayland_server::DataInit<'_, Self>,
    ) {
        // wl_callback has no requests
    }
}
