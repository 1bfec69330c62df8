use super::*;
use crate::core::window::{Window, WindowType};

fn state_with_outputs() -> CompositorState {
    let mut state = CompositorState::new();
    state.add_output(OutputState::new(1, "O1".into(), 0, 0, 1920, 1080));
    state.add_output(OutputState::new(2, "O2".into(), 1920, 0, 1920, 1080));
    state.pending_events.clear();
    state
}

fn toplevel(state: &mut CompositorState, app_id: &str) -> u32 {
    let id = state.alloc_window_id();
    let surface_id = state.alloc_surface_id();
    let mut window = Window::new(id, surface_id);
    window.window_type = WindowType::TopLevel;
    window.app_id = app_id.to_string();
    window.width = 640;
    window.height = 480;
    state.register_window(window)
}

fn popup(state: &mut CompositorState, parent: u32) -> u32 {
    let id = state.alloc_window_id();
    let surface_id = state.alloc_surface_id();
    let mut window = Window::new(id, surface_id);
    window.window_type = WindowType::Popup;
    window.parent = Some(parent);
    window.width = 200;
    window.height = 300;
    let id = state.register_window(window);
    state.push_popup(id);
    id
}

fn count_events(state: &CompositorState, pred: impl Fn(&ShellEvent) -> bool) -> usize {
    state.pending_events.iter().filter(|e| pred(e)).count()
}

#[test]
fn application_group_events_fire_on_first_and_last_window() {
    let mut state = state_with_outputs();

    let w1 = toplevel(&mut state, "org.example.editor");
    assert_eq!(
        count_events(&state, |e| matches!(
            e,
            ShellEvent::ApplicationAdded { app_id, .. } if app_id == "org.example.editor"
        )),
        1
    );

    let w2 = toplevel(&mut state, "org.example.editor");
    // Second window of the same app adds no application event
    assert_eq!(
        count_events(&state, |e| matches!(e, ShellEvent::ApplicationAdded { .. })),
        1
    );
    assert_eq!(state.windows_for_app("org.example.editor"), &[w1, w2]);

    state.unregister_window(w1);
    assert_eq!(
        count_events(&state, |e| matches!(e, ShellEvent::ApplicationRemoved { .. })),
        0
    );

    state.unregister_window(w2);
    assert_eq!(
        count_events(&state, |e| matches!(
            e,
            ShellEvent::ApplicationRemoved { app_id, .. } if app_id == "org.example.editor"
        )),
        1
    );
}

#[test]
fn app_id_change_migrates_between_groups() {
    let mut state = state_with_outputs();
    let w = toplevel(&mut state, "initial.app");
    state.pending_events.clear();

    state.set_window_app_id(w, "renamed.app");
    assert!(state.windows_for_app("initial.app").is_empty());
    assert_eq!(state.windows_for_app("renamed.app"), &[w]);
    assert_eq!(
        count_events(&state, |e| matches!(e, ShellEvent::ApplicationRemoved { .. })),
        1
    );
    assert_eq!(
        count_events(&state, |e| matches!(e, ShellEvent::ApplicationAdded { .. })),
        1
    );

    // Setting the same id again is a no-op
    state.pending_events.clear();
    state.set_window_app_id(w, "renamed.app");
    assert!(state.pending_events.is_empty());
}

#[test]
fn new_windows_cascade_on_the_primary_output() {
    let mut state = state_with_outputs();

    let w1 = toplevel(&mut state, "a");
    state.place_new_window(w1);
    let first = state.get_window(w1).unwrap();
    assert_eq!((first.x, first.y), (24, 48));

    let w2 = toplevel(&mut state, "a");
    state.place_new_window(w2);
    let second = state.get_window(w2).unwrap();
    assert_eq!((second.x, second.y), (48, 96));
}

#[test]
fn placement_uses_the_output_under_the_pointer() {
    let mut state = state_with_outputs();
    state.pointer_position = (2000.0, 500.0);

    let w = toplevel(&mut state, "a");
    state.place_new_window(w);
    let window = state.get_window(w).unwrap();
    assert_eq!((window.x, window.y), (1920 + 24, 48));
}

#[test]
fn spanning_window_has_a_view_per_output() {
    let mut state = state_with_outputs();
    let w = toplevel(&mut state, "a");
    {
        let window = state.windows.get_mut(&w).unwrap();
        window.x = 1800;
        window.y = 0;
        window.width = 200;
        window.height = 100;
    }
    state.compute_views(w);

    let window = state.get_window(w).unwrap();
    assert_eq!(window.views.len(), 2);
    let v1 = window.view_for_output(1).unwrap();
    let v2 = window.view_for_output(2).unwrap();
    assert_eq!((v1.x, v1.y), (1800, 0));
    assert_eq!((v2.x, v2.y), (-120, 0));
}

#[test]
fn compute_views_is_idempotent() {
    let mut state = state_with_outputs();
    let w = toplevel(&mut state, "a");
    state.compute_views(w);
    state.pending_events.clear();

    state.compute_views(w);
    assert_eq!(
        count_events(&state, |e| matches!(
            e,
            ShellEvent::ViewCreated { .. } | ShellEvent::ViewDestroyed { .. }
        )),
        0
    );
}

#[test]
fn only_one_window_is_active() {
    let mut state = state_with_outputs();
    let w1 = toplevel(&mut state, "a");
    assert!(state.get_window(w1).unwrap().active);

    let w2 = toplevel(&mut state, "b");
    assert!(!state.get_window(w1).unwrap().active);
    assert!(state.get_window(w2).unwrap().active);
    assert_eq!(state.active_window, Some(w2));
    // The newly active window is raised
    assert_eq!(state.window_tree.topmost(), Some(w2));
}

#[test]
fn closing_the_active_window_moves_focus_to_the_topmost() {
    let mut state = state_with_outputs();
    let w1 = toplevel(&mut state, "a");
    let w2 = toplevel(&mut state, "b");

    state.unregister_window(w2);
    assert_eq!(state.active_window, Some(w1));
    assert!(state.get_window(w1).unwrap().active);
}

#[test]
fn closing_a_transient_returns_focus_to_its_parent() {
    let mut state = state_with_outputs();
    let parent = toplevel(&mut state, "a");
    let _other = toplevel(&mut state, "b");

    let dialog_id = state.alloc_window_id();
    let surface_id = state.alloc_surface_id();
    let mut dialog = Window::new(dialog_id, surface_id);
    dialog.window_type = WindowType::Transient;
    dialog.parent = Some(parent);
    dialog.width = 300;
    dialog.height = 200;
    let dialog_id = state.register_window(dialog);
    assert_eq!(state.active_window, Some(dialog_id));

    state.unregister_window(dialog_id);
    // Parent, not the other toplevel, despite stacking
    assert_eq!(state.active_window, Some(parent));
}

#[test]
fn maximize_flags_flip_only_when_the_client_acks() {
    let mut state = state_with_outputs();
    let w = toplevel(&mut state, "a");
    {
        let window = state.windows.get_mut(&w).unwrap();
        window.x = 100;
        window.y = 100;
    }
    state.compute_views(w);

    state.request_maximize(w, true);
    // No protocol resource exists, so nothing was sent and nothing applied
    assert!(!state.get_window(w).unwrap().maximized);

    // Simulate the acked proposal
    state.apply_configure(
        w,
        PendingConfigure {
            serial: 1,
            states: StateSet::MAXIMIZED | StateSet::ACTIVATED,
            size: (1920, 1080),
            output_id: Some(1),
        },
    );
    let window = state.get_window(w).unwrap();
    assert!(window.maximized);
    assert_eq!(window.geometry(), Rect::new(0, 0, 1920, 1080));
    assert_eq!(window.saved_geometry, Some(Rect::new(100, 100, 640, 480)));

    // Unmaximize restores the saved floating geometry
    state.apply_configure(
        w,
        PendingConfigure {
            serial: 2,
            states: StateSet::ACTIVATED,
            size: (640, 480),
            output_id: Some(1),
        },
    );
    let window = state.get_window(w).unwrap();
    assert!(!window.maximized);
    assert_eq!(window.geometry(), Rect::new(100, 100, 640, 480));
    assert_eq!(window.saved_geometry, None);
}

#[test]
fn fullscreen_and_maximized_are_mutually_exclusive() {
    let mut state = state_with_outputs();
    let w = toplevel(&mut state, "a");
    state.compute_views(w);

    state.apply_configure(
        w,
        PendingConfigure {
            serial: 1,
            states: StateSet::MAXIMIZED | StateSet::ACTIVATED,
            size: (1920, 1080),
            output_id: Some(1),
        },
    );
    assert!(state.get_window(w).unwrap().maximized);

    // An ack carrying both flags resolves to fullscreen only
    state.apply_configure(
        w,
        PendingConfigure {
            serial: 2,
            states: StateSet::MAXIMIZED | StateSet::FULLSCREEN,
            size: (1920, 1080),
            output_id: Some(1),
        },
    );
    let window = state.get_window(w).unwrap();
    assert!(window.fullscreen);
    assert!(!window.maximized);
}

#[test]
fn minimized_window_leaves_the_scene_and_focus() {
    let mut state = state_with_outputs();
    let w1 = toplevel(&mut state, "a");
    let w2 = toplevel(&mut state, "b");
    state.place_new_window(w1);
    state.place_new_window(w2);

    state.minimize_window(w2);
    assert!(state.get_window(w2).unwrap().minimized);
    assert_eq!(state.active_window, Some(w1));

    let scene = state.scene.lock().unwrap();
    assert!(scene.windows.iter().all(|rw| rw.window_id != w2));
}

#[test]
fn press_outside_the_popup_chain_dismisses_it() {
    let mut state = state_with_outputs();
    let parent = toplevel(&mut state, "a");
    let p1 = popup(&mut state, parent);
    let p2 = popup(&mut state, p1);
    assert_eq!(state.popup_stack, vec![p1, p2]);

    state.pointer_position = (1500.0, 900.0);
    let consumed = state.handle_pointer_button(true);
    assert!(consumed);
    assert!(state.popup_stack.is_empty());
    assert!(state.get_window(p1).is_none());
    assert!(state.get_window(p2).is_none());
    assert_eq!(
        count_events(&state, |e| matches!(e, ShellEvent::PopupDismissed { .. })),
        2
    );
}

#[test]
fn release_arms_then_dismisses_a_popup_opened_mid_press() {
    let mut state = state_with_outputs();
    let parent = toplevel(&mut state, "a");

    // Button goes down on the menu bar, popup opens while held
    state.handle_pointer_button(true);
    let p = popup(&mut state, parent);
    assert!(!state.popup_initial_up);

    // The release ending the opening press arms the chain
    assert!(!state.handle_pointer_button(false));
    assert!(state.popup_initial_up);
    assert!(state.get_window(p).is_some());

    // The next click's release dismisses it
    state.pointer_position = (0.0, 0.0);
    let window_pos = state.get_window(p).unwrap().geometry();
    state.pointer_position = (
        (window_pos.x + 1) as f64,
        (window_pos.y + 1) as f64,
    );
    state.handle_pointer_button(true);
    assert!(state.handle_pointer_button(false));
    assert!(state.get_window(p).is_none());
}

#[test]
fn parentless_popup_is_not_tracked_in_the_chain() {
    let mut state = state_with_outputs();
    let id = state.alloc_window_id();
    let surface_id = state.alloc_surface_id();
    let mut window = Window::new(id, surface_id);
    window.window_type = WindowType::Popup;
    window.width = 100;
    window.height = 100;
    let id = state.register_window(window);

    state.push_popup(id);
    assert!(state.popup_stack.is_empty());
}

#[test]
fn destroying_a_parent_dismisses_its_popup_descendants() {
    let mut state = state_with_outputs();
    let parent = toplevel(&mut state, "a");
    let p1 = popup(&mut state, parent);
    let p2 = popup(&mut state, p1);

    state.unregister_window(parent);
    assert!(state.get_window(p1).is_none());
    assert!(state.get_window(p2).is_none());
    assert!(state.popup_stack.is_empty());
}

#[test]
fn closing_a_popup_dismisses_it_and_its_descendants() {
    let mut state = state_with_outputs();
    let parent = toplevel(&mut state, "a");
    let p1 = popup(&mut state, parent);
    let p2 = popup(&mut state, p1);

    state.close_window(p1);
    assert!(state.get_window(p1).is_none());
    assert!(state.get_window(p2).is_none());
    assert!(state.popup_stack.is_empty());
    assert!(state.get_window(parent).is_some());
}

#[test]
fn modal_change_is_surfaced_once() {
    let mut state = state_with_outputs();
    let w = toplevel(&mut state, "a");
    state.pending_events.clear();

    state.set_window_modal(w, true);
    state.set_window_modal(w, true);
    assert!(state.get_window(w).unwrap().modal);
    assert_eq!(
        count_events(&state, |e| matches!(
            e,
            ShellEvent::WindowModalChanged { modal: true, .. }
        )),
        1
    );
}

#[test]
fn output_removal_drops_views_and_updates_virtual_geometry() {
    let mut state = state_with_outputs();
    assert_eq!(state.virtual_geometry, Rect::new(0, 0, 3840, 1080));

    let w = toplevel(&mut state, "a");
    {
        let window = state.windows.get_mut(&w).unwrap();
        window.x = 2000;
        window.y = 100;
    }
    state.compute_views(w);
    assert_eq!(state.get_window(w).unwrap().views.len(), 1);
    state.pending_events.clear();

    state.remove_output(2);
    assert_eq!(state.virtual_geometry, Rect::new(0, 0, 1920, 1080));
    assert!(state.get_window(w).unwrap().views.is_empty());
    assert_eq!(
        count_events(&state, |e| matches!(
            e,
            ShellEvent::ViewDestroyed { output_id: 2, .. }
        )),
        1
    );
}

#[test]
fn outputs_created_at_startup_get_distinct_ids() {
    let mut state = CompositorState::new();
    let first = state.add_new_output("headless-1", 0, 0, 1920, 1080);
    let second = state.add_new_output("ext-1", 1920, 0, 1280, 720);

    assert_ne!(first, second);
    assert_eq!(state.output(second).map(|o| o.name.as_str()), Some("ext-1"));
}

#[test]
fn changing_the_primary_output_does_not_move_windows() {
    let mut state = state_with_outputs();
    let w = toplevel(&mut state, "a");
    state.place_new_window(w);
    let before = state.get_window(w).unwrap().geometry();

    state.set_primary(2);
    assert_eq!(state.primary().map(|o| o.id), Some(2));
    assert_eq!(state.get_window(w).unwrap().geometry(), before);

    // Placement falls back to the new primary when the pointer is off-screen
    state.pointer_position = (-10.0, -10.0);
    let w2 = toplevel(&mut state, "b");
    state.place_new_window(w2);
    assert_eq!(state.get_window(w2).unwrap().x, 1920 + 24);
}

#[test]
fn commit_maps_the_window_and_publishes_the_scene() {
    let mut state = state_with_outputs();
    let w = toplevel(&mut state, "a");
    let surface_id = state.get_window(w).unwrap().surface_id;
    state
        .surfaces
        .insert(surface_id, Surface::new(surface_id, None, None));

    {
        let surface = state.surfaces.get_mut(&surface_id).unwrap();
        surface.pending.buffer_id = Some(1);
        surface.pending.width = 800;
        surface.pending.height = 600;
    }
    state.pending_events.clear();
    state.commit_surface(surface_id);

    let window = state.get_window(w).unwrap();
    assert_eq!((window.width, window.height), (800, 600));
    assert_eq!(
        count_events(&state, |e| matches!(e, ShellEvent::RedrawNeeded)),
        1
    );
}

#[test]
fn recommitting_the_same_buffer_still_requests_a_redraw() {
    let mut state = state_with_outputs();
    let w = toplevel(&mut state, "a");
    let surface_id = state.get_window(w).unwrap().surface_id;
    state
        .surfaces
        .insert(surface_id, Surface::new(surface_id, None, None));
    {
        let surface = state.surfaces.get_mut(&surface_id).unwrap();
        surface.pending.buffer_id = Some(1);
        surface.pending.width = 800;
        surface.pending.height = 600;
    }
    state.commit_surface(surface_id);
    state.pending_events.clear();

    // Same buffer handle, new content drawn into it
    state.commit_surface(surface_id);
    assert_eq!(
        count_events(&state, |e| matches!(e, ShellEvent::RedrawNeeded)),
        1
    );
}
