use crate::core::window::tree::WindowTree;
use crate::core::window::{Window, WindowType};
use crate::util::geometry::Rect;

#[test]
fn test_window_tree_operations() {
    let mut tree = WindowTree::new();

    tree.insert(1);
    tree.insert(2);
    tree.insert(3);

    // Last inserted is topmost
    assert_eq!(tree.stacking_order, vec![1, 2, 3]);
    assert_eq!(tree.topmost(), Some(3));

    tree.raise(1);
    assert_eq!(tree.stacking_order, vec![2, 3, 1]);
    assert_eq!(tree.topmost(), Some(1));

    tree.lower(1);
    assert_eq!(tree.stacking_order, vec![1, 2, 3]);

    tree.remove(3);
    assert_eq!(tree.stacking_order, vec![1, 2]);

    // Duplicate insert is a no-op
    tree.insert(2);
    assert_eq!(tree.stacking_order, vec![1, 2]);
}

#[test]
fn test_unrelated_churn_preserves_relative_order() {
    let mut tree = WindowTree::new();
    tree.insert(1); // A
    tree.insert(2); // B

    let rel_order = |tree: &WindowTree| {
        let a = tree.stacking_order.iter().position(|&id| id == 1).unwrap();
        let b = tree.stacking_order.iter().position(|&id| id == 2).unwrap();
        a < b
    };
    let before = rel_order(&tree);

    // Register and unregister an unrelated window C
    tree.insert(3);
    tree.raise(3);
    tree.remove(3);

    assert_eq!(rel_order(&tree), before);
}

#[test]
fn test_window_geometry() {
    let mut window = Window::new(1, 10);
    window.x = 100;
    window.y = 50;
    window.width = 640;
    window.height = 480;

    assert_eq!(window.geometry(), Rect::new(100, 50, 640, 480));
    // Without a client-reported geometry the content rect is the full rect
    assert_eq!(window.content_geometry(), window.geometry());

    window.window_geometry = Some(Rect::new(10, 10, 620, 460));
    assert_eq!(window.content_geometry(), Rect::new(110, 60, 620, 460));
}

#[test]
fn test_saved_geometry_first_snapshot_wins() {
    let mut window = Window::new(1, 10);
    window.x = 30;
    window.y = 40;
    window.width = 300;
    window.height = 200;

    window.save_geometry();
    let first = window.saved_geometry;

    // Simulated maximize moved the window; a second save must not clobber
    window.x = 0;
    window.y = 0;
    window.save_geometry();
    assert_eq!(window.saved_geometry, first);
}

#[test]
fn test_default_window_is_unclassified() {
    let window = Window::new(5, 50);
    assert_eq!(window.window_type, WindowType::Unknown);
    assert!(window.parent.is_none());
    assert!(window.views.is_empty());
    assert!(!window.active);
}
