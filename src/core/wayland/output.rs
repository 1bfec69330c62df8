//! wl_output handling.
//!
//! One global per output; the global data carries the output id so a bind
//! can resolve the right `OutputState` regardless of client.

use wayland_server::protocol::wl_output::{self, Subpixel, Transform, WlOutput};
use wayland_server::{Dispatch, DisplayHandle, GlobalDispatch, Resource};

use crate::core::state::{CompositorState, OutputState};
use crate::mlog;
use crate::util::logging;

/// Global data for a wl_output global.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputGlobal {
    pub output_id: u32,
}

impl OutputGlobal {
    pub fn new(output_id: u32) -> Self {
        Self { output_id }
    }
}

impl GlobalDispatch<WlOutput, OutputGlobal> for CompositorState {
    fn bind(
        state: &mut Self,
        _handle: &DisplayHandle,
        _client: &wayland_server::Client,
        resource: wayland_server::New<WlOutput>,
        global_data: &OutputGlobal,
        data_init: &mut wayland_server::DataInit<'_, Self>,
    ) {
        let output = data_init.init(resource, ());
        let object_id = output.id();
        state.output_resources.insert(object_id.clone(), output.clone());
        state
            .output_id_by_resource
            .insert(object_id, global_data.output_id);

        match state.output(global_data.output_id) {
            Some(output_state) => send_output_info(&output, output_state),
            None => {
                mlog!(
                    logging::OUTPUT,
                    "Bind for unknown output {}",
                    global_data.output_id
                );
            }
        }
    }
}

impl Dispatch<WlOutput, ()> for CompositorState {
    fn request(
        state: &mut Self,
        _client: &wayland_server::Client,
        resource: &WlOutput,
        request: wl_output::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut wayland_server::DataInit<'_, Self>,
    ) {
        if let wl_output::Request::Release = request {
            state.output_resources.remove(&resource.id());
            state.output_id_by_resource.remove(&resource.id());
        }
    }
}

/// Send the full output description to a newly bound resource.
fn send_output_info(output: &WlOutput, state: &OutputState) {
    output.geometry(
        state.x,
        state.y,
        state.physical_width,
        state.physical_height,
        Subpixel::Unknown,
        state.make.clone(),
        state.model.clone(),
        Transform::Normal,
    );
    output.mode(
        wl_output::Mode::Current | wl_output::Mode::Preferred,
        state.width,
        state.height,
        state.refresh,
    );
    if output.version() >= 2 {
        output.scale(state.scale);
    }
    if output.version() >= 4 {
        output.name(state.name.clone());
        output.description(state.description.clone());
    }
    if output.version() >= 2 {
        output.done();
    }
    mlog!(
        logging::OUTPUT,
        "Sent output info: {} {}x{} at ({}, {})",
        state.name,
        state.width,
        state.height,
        state.x,
        state.y
    );
}

/// Re-send geometry and mode to every bound resource after a layout change.
pub fn broadcast_output_changes(state: &CompositorState) {
    for (object_id, resource) in &state.output_resources {
        let Some(output_id) = state.output_id_by_resource.get(object_id) else {
            continue;
        };
        if let Some(output_state) = state.output(*output_id) {
            send_output_info(resource, output_state);
        }
    }
}
