//! Stacking order management.

use std::collections::HashMap;

use crate::core::window::Window;

/// Front-to-back stacking order of windows.
#[derive(Debug, Default)]
pub struct WindowTree {
    /// Back-to-front; the last element is the topmost window.
    pub stacking_order: Vec<u32>,
}

impl WindowTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new window at the top of the stack. No-op if present.
    pub fn insert(&mut self, window_id: u32) {
        if !self.stacking_order.contains(&window_id) {
            self.stacking_order.push(window_id);
        }
    }

    pub fn remove(&mut self, window_id: u32) {
        if let Some(pos) = self.stacking_order.iter().position(|&id| id == window_id) {
            self.stacking_order.remove(pos);
        }
    }

    /// Move a window to the top of the stack.
    pub fn raise(&mut self, window_id: u32) {
        if let Some(pos) = self.stacking_order.iter().position(|&id| id == window_id) {
            let id = self.stacking_order.remove(pos);
            self.stacking_order.push(id);
        }
    }

    /// Move a window to the bottom of the stack.
    pub fn lower(&mut self, window_id: u32) {
        if let Some(pos) = self.stacking_order.iter().position(|&id| id == window_id) {
            let id = self.stacking_order.remove(pos);
            self.stacking_order.insert(0, id);
        }
    }

    pub fn topmost(&self) -> Option<u32> {
        self.stacking_order.last().copied()
    }

    pub fn contains(&self, window_id: u32) -> bool {
        self.stacking_order.contains(&window_id)
    }

    /// Windows bottom to top.
    pub fn iter_bottom_up(&self) -> impl Iterator<Item = u32> + '_ {
        self.stacking_order.iter().copied()
    }

    /// Top-most window under the given point.
    pub fn window_under(&self, x: f64, y: f64, windows: &HashMap<u32, Window>) -> Option<u32> {
        for &window_id in self.stacking_order.iter().rev() {
            if let Some(window) = windows.get(&window_id) {
                if window.minimized {
                    continue;
                }
                if window.geometry().contains_point(x as i32, y as i32) {
                    return Some(window_id);
                }
            }
        }
        None
    }
}
