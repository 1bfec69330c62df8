//! Cascading placement for new toplevel windows.
//!
//! New toplevels without a client-requested position are placed on a
//! diagonal cascade inside the available geometry of the target output.
//! The algorithm is a pure function of the previous cascade counter, the
//! output's available geometry and the window size, so placement is fully
//! deterministic and testable.

use crate::util::geometry::Rect;

/// Horizontal advance per cascade step.
const STEP_X: i32 = 24;
/// Vertical advance per cascade step.
const STEP_Y: i32 = 48;

/// Compute the position for a new window and the counter for the next call.
///
/// The cascade wraps back to its first step once the offset would pass half
/// the output's width or height, and the final position is clamped so the
/// window never extends past the available geometry.
pub fn cascade_position(
    counter: i32,
    available: Rect,
    window_size: (i32, i32),
) -> ((i32, i32), i32) {
    let mut step = counter + 1;
    if STEP_X * step > available.width / 2 || STEP_Y * step > available.height / 2 {
        step = 1;
    }

    let (w, h) = window_size;
    let mut x = available.x + STEP_X * step;
    let mut y = available.y + STEP_Y * step;

    // Clamp inside the available geometry
    if x + w > available.right() {
        x = (available.right() - w).max(available.x);
    }
    if y + h > available.bottom() {
        y = (available.bottom() - h).max(available.y);
    }

    ((x, y), step)
}

#[cfg(test)]
mod tests {
    use super::*;

    const AVAILABLE: Rect = Rect {
        x: 0,
        y: 0,
        width: 1920,
        height: 1080,
    };

    #[test]
    fn first_window_lands_on_first_step() {
        let ((x, y), counter) = cascade_position(0, AVAILABLE, (200, 100));
        assert_eq!((x, y), (24, 48));
        assert_eq!(counter, 1);
    }

    #[test]
    fn cascade_is_deterministic() {
        let mut a = 0;
        let mut b = 0;
        for _ in 0..20 {
            let (pa, na) = cascade_position(a, AVAILABLE, (320, 240));
            let (pb, nb) = cascade_position(b, AVAILABLE, (320, 240));
            assert_eq!(pa, pb);
            a = na;
            b = nb;
        }
    }

    #[test]
    fn cascade_wraps_at_half_output() {
        // Step 12 would put the vertical offset at 576 > 1080/2
        let mut counter = 0;
        let mut positions = Vec::new();
        for _ in 0..12 {
            let (pos, next) = cascade_position(counter, AVAILABLE, (100, 100));
            positions.push(pos);
            counter = next;
        }
        // Wrapped back to the first step
        assert_eq!(positions[11], positions[0]);
    }

    #[test]
    fn window_is_clamped_to_available_geometry() {
        let avail = Rect::new(100, 100, 600, 400);
        let ((x, y), _) = cascade_position(0, avail, (590, 390));
        assert!(x + 590 <= avail.right());
        assert!(y + 390 <= avail.bottom());
        assert!(x >= avail.x && y >= avail.y);
    }

    #[test]
    fn offset_output_origin_is_respected() {
        let avail = Rect::new(1920, 0, 1920, 1080);
        let ((x, y), _) = cascade_position(0, avail, (200, 100));
        assert_eq!((x, y), (1920 + 24, 48));
    }
}
