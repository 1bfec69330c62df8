use crate::core::render::plan::plan_output;
use crate::core::render::{RenderWindow, SceneHandoff, SurfaceTexture, TextureFlags};
use crate::util::geometry::Rect;

fn texture(id: u32, rect: Rect, flags: TextureFlags) -> SurfaceTexture {
    SurfaceTexture {
        id,
        geometry: rect,
        clip: None,
        flags,
    }
}

fn window(id: u32, rect: Rect, textures: Vec<SurfaceTexture>) -> RenderWindow {
    RenderWindow {
        window_id: id,
        geometry: rect,
        content: rect,
        opacity: 1.0,
        textures,
    }
}

#[test]
fn single_texture_blends_only_with_alpha() {
    let output = Rect::new(0, 0, 1920, 1080);
    let opaque = window(
        1,
        Rect::new(0, 0, 100, 100),
        vec![texture(10, Rect::new(0, 0, 100, 100), TextureFlags::empty())],
    );
    let translucent = window(
        2,
        Rect::new(200, 0, 100, 100),
        vec![texture(20, Rect::new(0, 0, 100, 100), TextureFlags::HAS_ALPHA)],
    );

    let scene = SceneHandoff {
        windows: vec![opaque, translucent],
    };
    let commands = plan_output(&scene, &output);
    assert_eq!(commands.len(), 2);
    assert!(!commands[0].blend);
    assert!(commands[1].blend);
}

#[test]
fn windows_without_textures_are_skipped() {
    let output = Rect::new(0, 0, 1920, 1080);
    let empty = window(1, Rect::new(0, 0, 100, 100), vec![]);
    let scene = SceneHandoff {
        windows: vec![empty],
    };
    assert!(plan_output(&scene, &output).is_empty());
}

#[test]
fn windows_outside_the_output_are_skipped() {
    let output = Rect::new(0, 0, 1920, 1080);
    let offscreen = window(
        1,
        Rect::new(2000, 0, 100, 100),
        vec![texture(10, Rect::new(0, 0, 100, 100), TextureFlags::empty())],
    );
    let scene = SceneHandoff {
        windows: vec![offscreen],
    };
    assert!(plan_output(&scene, &output).is_empty());
}

#[test]
fn spanning_window_draws_on_both_outputs_with_local_coordinates() {
    let o1 = Rect::new(0, 0, 1920, 1080);
    let o2 = Rect::new(1920, 0, 1920, 1080);
    let spanning = window(
        1,
        Rect::new(1800, 0, 200, 100),
        vec![texture(10, Rect::new(0, 0, 200, 100), TextureFlags::empty())],
    );
    let scene = SceneHandoff {
        windows: vec![spanning],
    };

    let on_o1 = plan_output(&scene, &o1);
    let on_o2 = plan_output(&scene, &o2);
    assert_eq!(on_o1.len(), 1);
    assert_eq!(on_o2.len(), 1);
    assert_eq!(on_o1[0].dst.x, 1800);
    assert_eq!(on_o2[0].dst.x, -120);
}

#[test]
fn stacked_textures_draw_after_base_and_are_clipped() {
    let output = Rect::new(0, 0, 1920, 1080);
    let mut win = window(
        1,
        Rect::new(100, 100, 400, 300),
        vec![
            texture(10, Rect::new(0, 0, 400, 300), TextureFlags::HAS_ALPHA),
            texture(11, Rect::new(50, 50, 100, 100), TextureFlags::STACKS_ON_TOP),
        ],
    );
    win.content = Rect::new(110, 110, 380, 280);
    let scene = SceneHandoff { windows: vec![win] };

    let commands = plan_output(&scene, &output);
    assert_eq!(commands.len(), 2);

    // Base texture is drawn first, unblended even though it has alpha
    assert_eq!(commands[0].texture, 10);
    assert!(!commands[0].blend);
    assert_eq!(commands[0].clip, None);

    // Stacked texture blends and is clipped to the content rect
    assert_eq!(commands[1].texture, 11);
    assert!(commands[1].blend);
    let clip = commands[1].clip.expect("stacked texture must be clipped");
    assert_eq!(clip, Rect::new(110, 110, 380, 280));
}

#[test]
fn opacity_is_emitted_only_on_change() {
    let output = Rect::new(0, 0, 1920, 1080);
    let mut a = window(
        1,
        Rect::new(0, 0, 100, 100),
        vec![texture(10, Rect::new(0, 0, 100, 100), TextureFlags::empty())],
    );
    a.opacity = 0.5;
    let mut b = window(
        2,
        Rect::new(100, 0, 100, 100),
        vec![texture(20, Rect::new(0, 0, 100, 100), TextureFlags::empty())],
    );
    b.opacity = 0.5;
    let mut c = window(
        3,
        Rect::new(200, 0, 100, 100),
        vec![texture(30, Rect::new(0, 0, 100, 100), TextureFlags::empty())],
    );
    c.opacity = 1.0;

    let scene = SceneHandoff {
        windows: vec![a, b, c],
    };
    let commands = plan_output(&scene, &output);
    assert_eq!(commands[0].set_opacity, Some(0.5));
    assert_eq!(commands[1].set_opacity, None);
    assert_eq!(commands[2].set_opacity, Some(1.0));
}
