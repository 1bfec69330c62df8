//! Output set management and per-output window views.
//!
//! Outputs live at fixed positions in virtual-desktop coordinates; their
//! union is the virtual geometry. Every window keeps one view per output it
//! intersects, holding the window origin translated into that output's
//! local space.

use super::*;
use crate::core::window::placement::cascade_position;
use crate::core::window::WindowView;

/// Output (display/monitor) state.
#[derive(Debug, Clone)]
pub struct OutputState {
    pub id: u32,
    pub name: String,
    pub description: String,
    pub make: String,
    pub model: String,
    /// Position in virtual-desktop coordinates.
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    /// Physical size in mm.
    pub physical_width: i32,
    pub physical_height: i32,
    /// Refresh rate in mHz.
    pub refresh: i32,
    pub scale: i32,
    /// Area left for windows after panels and docks claimed their edges,
    /// in output-local coordinates.
    pub usable_area: Rect,
}

impl OutputState {
    pub fn new(id: u32, name: String, x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            id,
            description: format!("Virtual display {}", name),
            make: "madrona".to_string(),
            model: "virtual".to_string(),
            name,
            x,
            y,
            width,
            height,
            // Physical dimensions assume ~96 DPI (3.78 px/mm)
            physical_width: (width as f32 / 3.78) as i32,
            physical_height: (height as f32 / 3.78) as i32,
            refresh: 60000,
            scale: 1,
            usable_area: Rect::new(0, 0, width, height),
        }
    }

    /// Full output rect in virtual-desktop coordinates.
    pub fn geometry(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Usable area translated into virtual-desktop coordinates. New windows
    /// are placed and maximized windows sized against this.
    pub fn available_geometry(&self) -> Rect {
        self.usable_area.translated(self.x, self.y)
    }
}

impl CompositorState {
    // =========================================================================
    // Output set
    // =========================================================================

    /// Create and track an output under a freshly allocated id.
    pub fn add_new_output(&mut self, name: &str, x: i32, y: i32, width: i32, height: i32) -> u32 {
        let id = self.alloc_output_id();
        self.add_output(OutputState::new(id, name.to_string(), x, y, width, height));
        id
    }

    pub fn add_output(&mut self, output: OutputState) {
        mlog!(
            logging::OUTPUT,
            "Output {} ({}) added at ({}, {}) {}x{}",
            output.id,
            output.name,
            output.x,
            output.y,
            output.width,
            output.height
        );
        self.outputs.push(output);
        self.output_layout_changed();
    }

    pub fn remove_output(&mut self, output_id: u32) {
        let Some(pos) = self.outputs.iter().position(|o| o.id == output_id) else {
            mlog!(logging::OUTPUT, "Remove of unknown output {}", output_id);
            return;
        };
        self.outputs.remove(pos);
        if self.primary_output >= self.outputs.len() {
            self.primary_output = 0;
        }
        self.cascade_steps.remove(&output_id);
        self.output_layout_changed();
    }

    /// Apply a new mode or position to an existing output.
    pub fn update_output(&mut self, output_id: u32, geometry: Rect, usable_area: Rect) {
        let Some(output) = self.outputs.iter_mut().find(|o| o.id == output_id) else {
            mlog!(logging::OUTPUT, "Update of unknown output {}", output_id);
            return;
        };
        output.x = geometry.x;
        output.y = geometry.y;
        output.width = geometry.width;
        output.height = geometry.height;
        output.usable_area = usable_area;
        self.output_layout_changed();
    }

    /// Recompute everything derived from the output layout.
    fn output_layout_changed(&mut self) {
        self.recalculate_virtual_geometry();
        let window_ids: Vec<u32> = self.windows.keys().copied().collect();
        for window_id in window_ids {
            self.compute_views(window_id);
        }
        crate::core::wayland::output::broadcast_output_changes(self);
        self.publish_scene();
        self.pending_events.push(ShellEvent::RedrawNeeded);
    }

    pub fn recalculate_virtual_geometry(&mut self) {
        let mut bounds = Rect::default();
        for output in &self.outputs {
            bounds = bounds.union(&output.geometry());
        }
        self.virtual_geometry = bounds;
        tracing::debug!("Virtual geometry is now {:?}", self.virtual_geometry);
    }

    pub fn output(&self, output_id: u32) -> Option<&OutputState> {
        self.outputs.iter().find(|o| o.id == output_id)
    }

    pub fn primary(&self) -> Option<&OutputState> {
        self.outputs.get(self.primary_output)
    }

    /// Move the primary flag to another output. Windows stay where they
    /// are; only the default target for placement and maximize changes.
    pub fn set_primary(&mut self, output_id: u32) {
        let Some(pos) = self.outputs.iter().position(|o| o.id == output_id) else {
            mlog!(logging::OUTPUT, "Set-primary of unknown output {}", output_id);
            return;
        };
        self.primary_output = pos;
        mlog!(logging::OUTPUT, "Output {} is now primary", output_id);
    }

    /// Output containing the given virtual-desktop point.
    pub fn output_at(&self, x: f64, y: f64) -> Option<&OutputState> {
        self.outputs
            .iter()
            .find(|o| o.geometry().contains_point(x as i32, y as i32))
    }

    /// Resolve an output id from a bound wl_output resource.
    pub fn output_for_resource(&self, resource: &WlOutput) -> Option<u32> {
        self.output_id_by_resource.get(&resource.id()).copied()
    }

    // =========================================================================
    // Views
    // =========================================================================

    /// Rebuild the view list of one window against the current output
    /// layout. Idempotent; emits ViewCreated/ViewDestroyed only for actual
    /// changes.
    pub fn compute_views(&mut self, window_id: u32) {
        let Some(window) = self.windows.get(&window_id) else {
            return;
        };
        let geometry = window.geometry();

        let mut new_views = Vec::new();
        for output in &self.outputs {
            if geometry.intersects(&output.geometry()) {
                new_views.push(WindowView {
                    output_id: output.id,
                    x: geometry.x - output.x,
                    y: geometry.y - output.y,
                });
            }
        }

        let window = self.windows.get_mut(&window_id).unwrap();
        let old_views = std::mem::replace(&mut window.views, new_views.clone());

        for old in &old_views {
            if !new_views.iter().any(|v| v.output_id == old.output_id) {
                self.pending_events.push(ShellEvent::ViewDestroyed {
                    window_id,
                    output_id: old.output_id,
                });
            }
        }
        for new in &new_views {
            if !old_views.iter().any(|v| v.output_id == new.output_id) {
                self.pending_events.push(ShellEvent::ViewCreated {
                    window_id,
                    output_id: new.output_id,
                });
            }
        }
    }

    // =========================================================================
    // Placement
    // =========================================================================

    /// Place a new toplevel on the output under the pointer (primary when
    /// the pointer is outside every output), cascading from its previous
    /// placement there.
    pub fn place_new_window(&mut self, window_id: u32) {
        let (px, py) = self.pointer_position;
        let target = self
            .output_at(px, py)
            .or_else(|| self.primary())
            .map(|o| (o.id, o.available_geometry()));
        let Some((output_id, available)) = target else {
            mlog!(logging::WINDOW, "No output to place window {} on", window_id);
            return;
        };

        let Some(window) = self.windows.get_mut(&window_id) else {
            return;
        };
        let size = (window.width.max(1), window.height.max(1));
        let counter = self.cascade_steps.get(&output_id).copied().unwrap_or(0);
        let ((x, y), next) = cascade_position(counter, available, size);
        window.x = x;
        window.y = y;
        self.cascade_steps.insert(output_id, next);

        mlog!(
            logging::WINDOW,
            "Placed window {} at ({}, {}) on output {}",
            window_id,
            x,
            y,
            output_id
        );
        self.compute_views(window_id);
    }
}
