//! Window registry operations.
//!
//! `CompositorState` methods for the window lifecycle: registration,
//! destruction, activation, stacking, application grouping by app id, and
//! the maximize/minimize/fullscreen requests that go through the
//! configure/ack machinery in [`super::CompositorState::send_configure`].

use super::*;
use crate::core::window::WindowType;

impl CompositorState {
    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Register a window: top of the stack, bound to its application group,
    /// and activated.
    pub fn register_window(&mut self, window: Window) -> u32 {
        let window_id = window.id;
        let surface_id = window.surface_id;
        let app_id = window.app_id.clone();
        let is_popup = window.window_type == WindowType::Popup;

        self.windows.insert(window_id, window);
        self.surface_to_window.insert(surface_id, window_id);
        self.window_tree.insert(window_id);

        if !app_id.is_empty() {
            self.bind_app_id(window_id, &app_id);
        }

        mlog!(
            logging::WINDOW,
            "Registered window {} for surface {}",
            window_id,
            surface_id
        );
        if is_popup {
            let parent_id = self
                .windows
                .get(&window_id)
                .and_then(|w| w.parent)
                .unwrap_or(0);
            self.pending_events
                .push(ShellEvent::PopupCreated { window_id, parent_id });
        } else {
            self.pending_events
                .push(ShellEvent::WindowCreated { window_id });
        }

        self.set_active_window(Some(window_id));
        self.compute_views(window_id);
        self.publish_scene();
        window_id
    }

    pub fn get_window(&self, window_id: u32) -> Option<&Window> {
        self.windows.get(&window_id)
    }

    pub fn window_for_surface(&self, surface_id: u32) -> Option<u32> {
        self.surface_to_window.get(&surface_id).copied()
    }

    /// Remove a window and everything hanging off it: popup descendants are
    /// dismissed, the application group shrinks, and focus moves to the
    /// parent (transients) or the topmost remaining window.
    pub fn unregister_window(&mut self, window_id: u32) {
        let Some(window) = self.windows.remove(&window_id) else {
            mlog!(logging::WINDOW, "Unregister of unknown window {}", window_id);
            return;
        };

        self.surface_to_window.remove(&window.surface_id);
        self.window_tree.remove(window_id);
        self.dismiss_popups_descending_from(window_id);

        if !window.app_id.is_empty() {
            self.release_app_id(window_id, &window.app_id, window.pid);
        }

        for view in &window.views {
            self.pending_events.push(ShellEvent::ViewDestroyed {
                window_id,
                output_id: view.output_id,
            });
        }

        let was_popup = window.window_type == WindowType::Popup;
        if was_popup {
            // Descendant popups were dismissed above; drop just this entry
            self.popup_stack.retain(|&id| id != window_id);
            self.pending_events
                .push(ShellEvent::PopupDismissed { window_id });
        } else {
            self.pending_events
                .push(ShellEvent::WindowClosed { window_id });
        }

        if self.active_window == Some(window_id) {
            self.active_window = None;
            // Transients hand focus back to their parent, everything else to
            // the topmost remaining window.
            let next = window
                .parent
                .filter(|p| self.windows.contains_key(p))
                .or_else(|| self.window_tree.topmost());
            self.set_active_window(next);
        }

        mlog!(logging::WINDOW, "Unregistered window {}", window_id);
        self.publish_scene();
        self.pending_events.push(ShellEvent::RedrawNeeded);
    }

    // =========================================================================
    // Application grouping
    // =========================================================================

    fn bind_app_id(&mut self, window_id: u32, app_id: &str) {
        let pid = self.windows.get(&window_id).map(|w| w.pid).unwrap_or(0);
        let entry = self.app_ids.entry(app_id.to_string()).or_default();
        let first = entry.is_empty();
        if !entry.contains(&window_id) {
            entry.push(window_id);
        }
        if first {
            self.pending_events.push(ShellEvent::ApplicationAdded {
                app_id: app_id.to_string(),
                pid,
            });
        }
    }

    fn release_app_id(&mut self, window_id: u32, app_id: &str, pid: u32) {
        let Some(entry) = self.app_ids.get_mut(app_id) else {
            return;
        };
        entry.retain(|&id| id != window_id);
        if entry.is_empty() {
            self.app_ids.remove(app_id);
            self.pending_events.push(ShellEvent::ApplicationRemoved {
                app_id: app_id.to_string(),
                pid,
            });
        }
    }

    /// Change a window's application id, migrating it between groups. A
    /// same-group change produces no application events.
    pub fn set_window_app_id(&mut self, window_id: u32, app_id: &str) {
        let Some(window) = self.windows.get_mut(&window_id) else {
            return;
        };
        let pid = window.pid;
        let old = std::mem::replace(&mut window.app_id, app_id.to_string());
        if old == app_id {
            return;
        }
        if !old.is_empty() {
            self.release_app_id(window_id, &old, pid);
        }
        if !app_id.is_empty() {
            self.bind_app_id(window_id, app_id);
        }
        self.pending_events.push(ShellEvent::WindowAppIdChanged {
            window_id,
            app_id: app_id.to_string(),
        });
    }

    pub fn set_window_title(&mut self, window_id: u32, title: &str) {
        let Some(window) = self.windows.get_mut(&window_id) else {
            return;
        };
        if window.title == title {
            return;
        }
        window.title = title.to_string();
        self.pending_events.push(ShellEvent::WindowTitleChanged {
            window_id,
            title: title.to_string(),
        });
    }

    /// Flip the gtk_surface1 modality hint.
    pub fn set_window_modal(&mut self, window_id: u32, modal: bool) {
        let Some(window) = self.windows.get_mut(&window_id) else {
            return;
        };
        if window.modal == modal {
            return;
        }
        window.modal = modal;
        self.pending_events
            .push(ShellEvent::WindowModalChanged { window_id, modal });
    }

    /// Windows currently carrying the given app id, in registration order.
    pub fn windows_for_app(&self, app_id: &str) -> &[u32] {
        self.app_ids.get(app_id).map(Vec::as_slice).unwrap_or(&[])
    }

    // =========================================================================
    // Activation & stacking
    // =========================================================================

    /// Make a window the single active one. The registry flag flips
    /// immediately; clients learn about it through configure events carrying
    /// the activated state.
    pub fn set_active_window(&mut self, window_id: Option<u32>) {
        if self.active_window == window_id {
            return;
        }
        let previous = self.active_window.take();

        if let Some(prev_id) = previous {
            let deactivated = self.windows.get_mut(&prev_id).map(|prev| {
                prev.active = false;
                ((prev.width as u32, prev.height as u32), Self::states_for(prev))
            });
            if let Some((size, states)) = deactivated {
                self.send_configure(prev_id, size, states, None);
            }
        }

        let Some(new_id) = window_id else {
            return;
        };
        let Some(window) = self.windows.get_mut(&new_id) else {
            mlog!(logging::WINDOW, "Activate of unknown window {}", new_id);
            return;
        };

        window.active = true;
        window.minimized = false;
        self.active_window = Some(new_id);
        let size = (window.width as u32, window.height as u32);
        let states = Self::states_for(window) | StateSet::ACTIVATED;
        let app_id = window.app_id.clone();
        self.send_configure(new_id, size, states, None);

        self.raise_window(new_id);
        if !app_id.is_empty() {
            self.pending_events
                .push(ShellEvent::ApplicationFocused { app_id });
        }
    }

    /// Current non-activation states of a window, for re-sending configures.
    fn states_for(window: &Window) -> StateSet {
        let mut states = StateSet::empty();
        if window.maximized {
            states |= StateSet::MAXIMIZED;
        }
        if window.fullscreen {
            states |= StateSet::FULLSCREEN;
        }
        states
    }

    /// Raise a window together with its ancestor chain so transients and
    /// popups never sink below their parent.
    pub fn raise_window(&mut self, window_id: u32) {
        let mut chain = Vec::new();
        let mut current = Some(window_id);
        while let Some(id) = current {
            if chain.contains(&id) {
                // A parent cycle would otherwise loop forever
                mlog!(logging::WINDOW, "Parent cycle at window {}", id);
                break;
            }
            chain.push(id);
            current = self.windows.get(&id).and_then(|w| w.parent);
        }
        // Ancestors first, the requested window ends up topmost
        for id in chain.into_iter().rev() {
            self.window_tree.raise(id);
        }
        self.publish_scene();
        self.pending_events.push(ShellEvent::RedrawNeeded);
    }

    pub fn lower_window(&mut self, window_id: u32) {
        self.window_tree.lower(window_id);
        self.publish_scene();
        self.pending_events.push(ShellEvent::RedrawNeeded);
    }

    // =========================================================================
    // State change requests
    // =========================================================================

    /// Propose maximizing onto the output holding the window's largest view
    /// (primary when unmapped). Flags flip when the client acks.
    pub fn request_maximize(&mut self, window_id: u32, maximize: bool) {
        let Some(window) = self.windows.get(&window_id) else {
            return;
        };
        let output_id = self
            .output_for_window(window)
            .or_else(|| self.primary().map(|o| o.id));
        let Some(output_id) = output_id else {
            return;
        };

        let mut states = Self::states_for(window) & !StateSet::MAXIMIZED;
        let size = if maximize {
            // A window is never maximized and fullscreen at once
            states -= StateSet::FULLSCREEN;
            states |= StateSet::MAXIMIZED;
            let avail = self
                .output(output_id)
                .map(|o| o.available_geometry())
                .unwrap_or_default();
            (avail.width as u32, avail.height as u32)
        } else {
            let saved = self.windows[&window_id]
                .saved_geometry
                .unwrap_or_else(|| self.windows[&window_id].geometry());
            (saved.width as u32, saved.height as u32)
        };
        if self.active_window == Some(window_id) {
            states |= StateSet::ACTIVATED;
        }
        self.send_configure(window_id, size, states, Some(output_id));
    }

    pub fn request_fullscreen(&mut self, window_id: u32, fullscreen: bool, output: Option<u32>) {
        let Some(window) = self.windows.get(&window_id) else {
            return;
        };
        let output_id = output
            .or_else(|| self.output_for_window(window))
            .or_else(|| self.primary().map(|o| o.id));
        let Some(output_id) = output_id else {
            return;
        };

        let mut states = Self::states_for(window) & !StateSet::FULLSCREEN;
        let size = if fullscreen {
            states -= StateSet::MAXIMIZED;
            states |= StateSet::FULLSCREEN;
            let full = self
                .output(output_id)
                .map(|o| o.geometry())
                .unwrap_or_default();
            (full.width as u32, full.height as u32)
        } else {
            let saved = self.windows[&window_id]
                .saved_geometry
                .unwrap_or_else(|| self.windows[&window_id].geometry());
            (saved.width as u32, saved.height as u32)
        };
        if self.active_window == Some(window_id) {
            states |= StateSet::ACTIVATED;
        }
        self.send_configure(window_id, size, states, Some(output_id));
    }

    /// Minimize is compositor-side only; no protocol round trip. The next
    /// topmost window becomes active.
    pub fn minimize_window(&mut self, window_id: u32) {
        let Some(window) = self.windows.get_mut(&window_id) else {
            return;
        };
        if window.minimized {
            return;
        }
        window.minimized = true;
        self.pending_events
            .push(ShellEvent::WindowMinimized { window_id });

        if self.active_window == Some(window_id) {
            self.active_window = None;
            if let Some(prev) = self.windows.get_mut(&window_id) {
                prev.active = false;
            }
            let next = self
                .window_tree
                .iter_bottom_up()
                .filter(|id| *id != window_id)
                .filter(|id| self.windows.get(id).map(|w| !w.minimized).unwrap_or(false))
                .last();
            self.set_active_window(next);
        }
        self.publish_scene();
        self.pending_events.push(ShellEvent::RedrawNeeded);
    }

    /// Ask the client to close the window. The window itself only goes away
    /// when the client destroys its surface.
    pub fn close_window(&mut self, window_id: u32) {
        if let Some(toplevel) = self
            .xdg
            .toplevels
            .values()
            .find(|t| t.window_id == window_id)
        {
            toplevel.resource.close();
            return;
        }
        if self
            .windows
            .get(&window_id)
            .map(|w| w.window_type == WindowType::Popup)
            .unwrap_or(false)
        {
            self.dismiss_popups_descending_from(window_id);
            self.popup_stack.retain(|&id| id != window_id);
            self.send_popup_done(window_id);
            self.unregister_window(window_id);
            return;
        }
        // wl_shell has no close request on the wire
        mlog!(logging::WINDOW, "Cannot request close of window {}", window_id);
    }

    /// Output hosting the window's first view.
    fn output_for_window(&self, window: &Window) -> Option<u32> {
        window.views.first().map(|v| v.output_id)
    }
}
