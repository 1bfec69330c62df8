//! Popup grab tracking.
//!
//! Open popups form a chain (menu, submenu, ...). The whole chain is
//! dismissed by a press outside it, or by a release when no button was held
//! at the moment the chain opened. A release that merely ends the opening
//! press arms the chain instead, so the next release dismisses it.

use super::*;

impl CompositorState {
    /// Track a newly mapped popup. The chain's release behavior is decided
    /// by the button state at open time.
    pub fn push_popup(&mut self, window_id: u32) {
        let has_parent = self
            .windows
            .get(&window_id)
            .map(|w| w.parent.is_some())
            .unwrap_or(false);
        if !has_parent {
            // An orphan entry could never be dismissed by ancestry
            mlog!(
                logging::SHELL,
                "Refusing to track parentless popup {}",
                window_id
            );
            return;
        }
        if self.popup_stack.is_empty() {
            self.popup_initial_up = self.pointer_buttons_pressed == 0;
        }
        self.popup_stack.push(window_id);
        mlog!(
            logging::SHELL,
            "Popup {} opened (chain depth {}, initial_up={})",
            window_id,
            self.popup_stack.len(),
            self.popup_initial_up
        );
    }

    /// Dismiss every open popup, deepest first.
    pub fn dismiss_all_popups(&mut self) {
        let stack = std::mem::take(&mut self.popup_stack);
        for &window_id in stack.iter().rev() {
            self.send_popup_done(window_id);
            self.unregister_window(window_id);
        }
    }

    /// Dismiss popups whose ancestor chain includes `ancestor_id`, deepest
    /// first. Used when a parent window goes away.
    pub fn dismiss_popups_descending_from(&mut self, ancestor_id: u32) {
        let doomed: Vec<u32> = self
            .popup_stack
            .iter()
            .copied()
            .filter(|&id| self.is_descendant_of(id, ancestor_id))
            .collect();
        for &window_id in doomed.iter().rev() {
            self.popup_stack.retain(|&id| id != window_id);
            self.send_popup_done(window_id);
            self.unregister_window(window_id);
        }
    }

    fn is_descendant_of(&self, window_id: u32, ancestor_id: u32) -> bool {
        let mut current = self.windows.get(&window_id).and_then(|w| w.parent);
        let mut hops = 0;
        while let Some(id) = current {
            if id == ancestor_id {
                return true;
            }
            hops += 1;
            if hops > self.windows.len() {
                break;
            }
            current = self.windows.get(&id).and_then(|w| w.parent);
        }
        false
    }

    /// Record the pointer position in virtual-desktop coordinates. Feeds
    /// new-window placement and popup dismissal; event delivery to clients
    /// stays with the embedding input layer.
    pub fn pointer_motion(&mut self, x: f64, y: f64) {
        self.pointer_position = (x, y);
    }

    /// Apply popup-grab semantics to a pointer button change. Returns true
    /// when the event was consumed by dismissing the chain.
    pub fn handle_pointer_button(&mut self, pressed: bool) -> bool {
        if pressed {
            self.pointer_buttons_pressed += 1;
        } else {
            self.pointer_buttons_pressed = self.pointer_buttons_pressed.saturating_sub(1);
        }

        if self.popup_stack.is_empty() {
            return false;
        }

        if pressed {
            let (px, py) = self.pointer_position;
            let inside_chain = self.popup_stack.iter().any(|id| {
                self.windows
                    .get(id)
                    .map(|w| w.geometry().contains_point(px as i32, py as i32))
                    .unwrap_or(false)
            });
            if !inside_chain {
                self.dismiss_all_popups();
                return true;
            }
            return false;
        }

        // Release: dismiss only once the chain is armed.
        if self.popup_initial_up {
            self.dismiss_all_popups();
            true
        } else {
            self.popup_initial_up = true;
            false
        }
    }

    /// Tell the client its popup is gone.
    pub(super) fn send_popup_done(&mut self, window_id: u32) {
        if let Some(popup) = self
            .xdg
            .popups
            .values()
            .find(|p| p.window_id == window_id)
        {
            popup.resource.popup_done();
            return;
        }
        if let Some(shell_surface) = self
            .wl_shell
            .surfaces
            .values()
            .find(|s| s.window_id == window_id)
        {
            shell_surface.resource.popup_done();
        }
    }
}
