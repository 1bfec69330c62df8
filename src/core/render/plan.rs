//! Draw-call planning.
//!
//! Turning a scene snapshot into an ordered list of [`DrawCommand`]s is pure
//! and fully testable; the GL executor only replays the list. All the
//! blending-mode edge cases live here:
//!
//! - a window with exactly one texture blends iff the surface has alpha;
//! - a window whose trailing textures are flagged `STACKS_ON_TOP` draws the
//!   base textures opaque first, then the stacked ones blended and clipped
//!   to the window content rect;
//! - the per-window opacity uniform is only re-emitted when it changes from
//!   the previous draw.

use crate::util::geometry::Rect;

use super::{SceneHandoff, TextureFlags};

/// One textured-quad blit in output-local coordinates (top-left origin; the
/// executor applies the single GL flip).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCommand {
    pub texture: u32,
    pub dst: Rect,
    pub clip: Option<Rect>,
    pub blend: bool,
    /// Present only when the opacity differs from the previous command.
    pub set_opacity: Option<f32>,
}

/// Plan the draw list for one output pass.
///
/// Windows are visited bottom-to-top. A window with no textures (buffer not
/// committed yet) or no intersection with the output contributes nothing.
pub fn plan_output(scene: &SceneHandoff, output: &Rect) -> Vec<DrawCommand> {
    let mut commands = Vec::new();
    let mut last_opacity: Option<f32> = None;

    for window in &scene.windows {
        if window.textures.is_empty() {
            continue;
        }
        if !window.geometry.intersects(output) {
            continue;
        }

        // Output-local content rect, used to clip stacked textures.
        let content_local = window.content.translated(-output.x, -output.y);

        let stacked_mode = window.textures.len() > 1
            && window
                .textures
                .last()
                .map(|t| t.flags.contains(TextureFlags::STACKS_ON_TOP))
                .unwrap_or(false);

        let mut window_commands = Vec::new();
        let mut emit = |texture: &super::SurfaceTexture, blend: bool, clip: Option<Rect>| {
            let dst = texture
                .geometry
                .translated(window.geometry.x, window.geometry.y)
                .translated(-output.x, -output.y);
            window_commands.push(DrawCommand {
                texture: texture.id,
                dst,
                clip,
                blend,
                set_opacity: None,
            });
        };

        if stacked_mode {
            // Base content is treated as fully opaque, stacked content is
            // blended on top within the window's content rect.
            for texture in window
                .textures
                .iter()
                .filter(|t| !t.flags.contains(TextureFlags::STACKS_ON_TOP))
            {
                emit(texture, false, None);
            }
            for texture in window
                .textures
                .iter()
                .filter(|t| t.flags.contains(TextureFlags::STACKS_ON_TOP))
            {
                let clip = match texture.clip {
                    Some(c) => c
                        .translated(window.geometry.x, window.geometry.y)
                        .translated(-output.x, -output.y)
                        .intersection(&content_local),
                    None => Some(content_local),
                };
                // A stacked texture entirely outside the content rect is
                // fully clipped away.
                match clip {
                    Some(clip) => emit(texture, true, Some(clip)),
                    None => continue,
                }
            }
        } else {
            for texture in &window.textures {
                let blend = texture.flags.contains(TextureFlags::HAS_ALPHA);
                emit(texture, blend, None);
            }
        }

        drop(emit);
        if let Some(first) = window_commands.first_mut() {
            if last_opacity != Some(window.opacity) {
                first.set_opacity = Some(window.opacity);
                last_opacity = Some(window.opacity);
            }
        }
        commands.extend(window_commands);
    }

    commands
}
