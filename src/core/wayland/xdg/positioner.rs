//! xdg_positioner requests.
//!
//! Anchor and gravity arrive as protocol enums and are stored as edge
//! bitmasks (top=1, bottom=2, left=4, right=8) so the placement math can
//! test edges independently. Constraint adjustment is already a bitfield on
//! the wire.

use wayland_server::{Dispatch, DisplayHandle, Resource, WEnum};

use wayland_protocols::xdg::shell::server::xdg_positioner::{
    self, Anchor, Gravity, XdgPositioner,
};

use crate::core::state::CompositorState;
use crate::util::geometry::Rect;

fn anchor_edges(anchor: Anchor) -> u32 {
    match anchor {
        Anchor::None => 0,
        Anchor::Top => 1,
        Anchor::Bottom => 2,
        Anchor::Left => 4,
        Anchor::Right => 8,
        Anchor::TopLeft => 1 | 4,
        Anchor::BottomLeft => 2 | 4,
        Anchor::TopRight => 1 | 8,
        Anchor::BottomRight => 2 | 8,
        _ => 0,
    }
}

fn gravity_edges(gravity: Gravity) -> u32 {
    match gravity {
        Gravity::None => 0,
        Gravity::Top => 1,
        Gravity::Bottom => 2,
        Gravity::Left => 4,
        Gravity::Right => 8,
        Gravity::TopLeft => 1 | 4,
        Gravity::BottomLeft => 2 | 4,
        Gravity::TopRight => 1 | 8,
        Gravity::BottomRight => 2 | 8,
        _ => 0,
    }
}

impl Dispatch<XdgPositioner, ()> for CompositorState {
    fn request(
        state: &mut Self,
        client: &wayland_server::Client,
        resource: &XdgPositioner,
        request: xdg_positioner::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut wayland_server::DataInit<'_, Self>,
    ) {
        let key = (client.id(), resource.id().protocol_id());
        let Some(positioner) = state.xdg.positioners.get_mut(&key) else {
            return;
        };

        match request {
            xdg_positioner::Request::SetSize { width, height } => {
                positioner.size = (width, height);
            }
            xdg_positioner::Request::SetAnchorRect {
                x,
                y,
                width,
                height,
            } => {
                positioner.anchor_rect = Rect::new(x, y, width, height);
            }
            xdg_positioner::Request::SetAnchor { anchor } => {
                if let WEnum::Value(anchor) = anchor {
                    positioner.anchor = anchor_edges(anchor);
                }
            }
            xdg_positioner::Request::SetGravity { gravity } => {
                if let WEnum::Value(gravity) = gravity {
                    positioner.gravity = gravity_edges(gravity);
                }
            }
            xdg_positioner::Request::SetConstraintAdjustment {
                constraint_adjustment,
            } => {
                positioner.constraint_adjustment = match constraint_adjustment {
                    WEnum::Value(v) => v.bits(),
                    WEnum::Unknown(v) => v,
                };
            }
            xdg_positioner::Request::SetOffset { x, y } => {
                positioner.offset = (x, y);
            }
            xdg_positioner::Request::Destroy => {
                state.xdg.positioners.remove(&key);
            }
            // Reactive repositioning hints change nothing about one-shot
            // placement.
            _ => {}
        }
    }
}
