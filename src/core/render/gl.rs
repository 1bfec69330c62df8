//! OpenGL execution of planned draw lists.
//!
//! One composited frame per output: clear, then replay the draw list from
//! [`super::plan::plan_output`] bottom-to-top. Texture contents and the GL
//! context itself belong to the device-integration layer; this module only
//! issues draw calls against whatever framebuffer is currently bound.
//!
//! Coordinate convention: draw commands use top-left origin, the target
//! framebuffer uses GL's bottom-left origin. The flip happens once per blit
//! when the destination rect is converted to normalized device coordinates.

use std::ffi::CString;
use std::ptr;

use crate::core::errors::{CoreError, Result};
use crate::util::geometry::Rect;

use super::plan::{plan_output, DrawCommand};
use super::SceneHandoff;

const VERTEX_SHADER: &str = r#"
    #version 330 core
    layout (location = 0) in vec2 aPos;
    layout (location = 1) in vec2 aTexCoord;

    uniform vec2 uPosition;
    uniform vec2 uSize;

    out vec2 TexCoord;

    void main() {
        vec2 pos = aPos * uSize + uPosition;
        gl_Position = vec4(pos.x, pos.y, 0.0, 1.0);
        TexCoord = aTexCoord;
    }
"#;

const FRAGMENT_SHADER: &str = r#"
    #version 330 core
    out vec4 FragColor;

    in vec2 TexCoord;

    uniform sampler2D uTexture;
    uniform float uOpacity;

    void main() {
        vec4 texColor = texture(uTexture, TexCoord);
        FragColor = vec4(texColor.rgb, texColor.a * uOpacity);
    }
"#;

/// A captured output frame, rows top-down, RGBA8.
pub struct GrabbedFrame {
    pub width: i32,
    pub height: i32,
    pub pixels: Vec<u8>,
}

/// The OpenGL compositor backend.
pub struct GlCompositor {
    program: u32,
    vao: u32,
    vbo: u32,
    u_position: i32,
    u_size: i32,
    u_opacity: i32,
}

impl GlCompositor {
    /// Build shaders and quad geometry. The caller must have made the GL
    /// context current and loaded function pointers via `gl::load_with`.
    pub fn new() -> Result<Self> {
        unsafe {
            let program = create_program()?;

            let mut vao = 0;
            let mut vbo = 0;
            gl::GenVertexArrays(1, &mut vao);
            gl::GenBuffers(1, &mut vbo);

            gl::BindVertexArray(vao);
            gl::BindBuffer(gl::ARRAY_BUFFER, vbo);

            // Unit quad, position + texcoord interleaved. Texcoords sample
            // top-down so the vertical flip lives entirely in uPosition/uSize.
            let vertices: [f32; 24] = [
                0.0, 0.0, 0.0, 1.0, //
                1.0, 0.0, 1.0, 1.0, //
                1.0, 1.0, 1.0, 0.0, //
                0.0, 0.0, 0.0, 1.0, //
                1.0, 1.0, 1.0, 0.0, //
                0.0, 1.0, 0.0, 0.0,
            ];
            gl::BufferData(
                gl::ARRAY_BUFFER,
                std::mem::size_of_val(&vertices) as isize,
                vertices.as_ptr() as *const _,
                gl::STATIC_DRAW,
            );

            let stride = (4 * std::mem::size_of::<f32>()) as i32;
            gl::VertexAttribPointer(0, 2, gl::FLOAT, gl::FALSE, stride, ptr::null());
            gl::EnableVertexAttribArray(0);
            gl::VertexAttribPointer(
                1,
                2,
                gl::FLOAT,
                gl::FALSE,
                stride,
                (2 * std::mem::size_of::<f32>()) as *const _,
            );
            gl::EnableVertexAttribArray(1);
            gl::BindVertexArray(0);

            let u_position = uniform_location(program, "uPosition");
            let u_size = uniform_location(program, "uSize");
            let u_opacity = uniform_location(program, "uOpacity");

            tracing::info!("GL compositor initialized");
            Ok(Self {
                program,
                vao,
                vbo,
                u_position,
                u_size,
                u_opacity,
            })
        }
    }

    /// Composite one frame for `output` into the currently bound framebuffer.
    pub fn render(&mut self, output: &Rect, scene: &SceneHandoff) -> Result<()> {
        let commands = plan_output(scene, output);
        unsafe {
            gl::Viewport(0, 0, output.width, output.height);
            gl::ClearColor(0.0, 0.0, 0.0, 1.0);
            gl::Clear(gl::COLOR_BUFFER_BIT);

            gl::UseProgram(self.program);
            gl::BindVertexArray(self.vao);
            gl::ActiveTexture(gl::TEXTURE0);
            // Re-assert the opacity for the first frame after creation
            gl::Uniform1f(self.u_opacity, 1.0);

            for command in &commands {
                self.execute(output, command);
            }

            gl::Disable(gl::SCISSOR_TEST);
            gl::BindVertexArray(0);
        }
        tracing::trace!(
            "Rendered output at ({}, {}): {} draw calls",
            output.x,
            output.y,
            commands.len()
        );
        Ok(())
    }

    /// Off-screen variant of `render` for screenshots/screencasts: draws
    /// into a temporary FBO and reads the pixels back.
    pub fn grab(&mut self, output: &Rect, scene: &SceneHandoff) -> Result<GrabbedFrame> {
        unsafe {
            let mut fbo = 0;
            let mut color = 0;
            gl::GenFramebuffers(1, &mut fbo);
            gl::GenTextures(1, &mut color);

            gl::BindTexture(gl::TEXTURE_2D, color);
            gl::TexImage2D(
                gl::TEXTURE_2D,
                0,
                gl::RGBA8 as i32,
                output.width,
                output.height,
                0,
                gl::RGBA,
                gl::UNSIGNED_BYTE,
                ptr::null(),
            );
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, gl::NEAREST as i32);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, gl::NEAREST as i32);

            gl::BindFramebuffer(gl::FRAMEBUFFER, fbo);
            gl::FramebufferTexture2D(
                gl::FRAMEBUFFER,
                gl::COLOR_ATTACHMENT0,
                gl::TEXTURE_2D,
                color,
                0,
            );

            if gl::CheckFramebufferStatus(gl::FRAMEBUFFER) != gl::FRAMEBUFFER_COMPLETE {
                gl::BindFramebuffer(gl::FRAMEBUFFER, 0);
                gl::DeleteFramebuffers(1, &fbo);
                gl::DeleteTextures(1, &color);
                return Err(CoreError::Render("incomplete grab framebuffer".into()));
            }

            let render_result = self.render(output, scene);

            let mut pixels = vec![0u8; (output.width * output.height * 4) as usize];
            if render_result.is_ok() {
                gl::ReadPixels(
                    0,
                    0,
                    output.width,
                    output.height,
                    gl::RGBA,
                    gl::UNSIGNED_BYTE,
                    pixels.as_mut_ptr() as *mut _,
                );
            }

            gl::BindFramebuffer(gl::FRAMEBUFFER, 0);
            gl::DeleteFramebuffers(1, &fbo);
            gl::DeleteTextures(1, &color);
            render_result?;

            // ReadPixels returns rows bottom-up; callers expect top-down.
            let row = (output.width * 4) as usize;
            let half = (output.height / 2) as usize;
            for y in 0..half {
                let (top, bottom) = pixels.split_at_mut((output.height as usize - y - 1) * row);
                top[y * row..y * row + row].swap_with_slice(&mut bottom[..row]);
            }

            Ok(GrabbedFrame {
                width: output.width,
                height: output.height,
                pixels,
            })
        }
    }

    unsafe fn execute(&self, output: &Rect, command: &DrawCommand) {
        if let Some(opacity) = command.set_opacity {
            gl::Uniform1f(self.u_opacity, opacity);
        }

        if command.blend {
            gl::Enable(gl::BLEND);
            gl::BlendFunc(gl::SRC_ALPHA, gl::ONE_MINUS_SRC_ALPHA);
        } else {
            gl::Disable(gl::BLEND);
        }

        match command.clip {
            Some(clip) => {
                gl::Enable(gl::SCISSOR_TEST);
                // Scissor is in framebuffer coordinates, bottom-left origin
                gl::Scissor(
                    clip.x,
                    output.height - clip.y - clip.height,
                    clip.width.max(0),
                    clip.height.max(0),
                );
            }
            None => gl::Disable(gl::SCISSOR_TEST),
        }

        // Top-left rect -> NDC, flipping vertically exactly once here
        let dst = command.dst;
        let ndc_x = 2.0 * dst.x as f32 / output.width as f32 - 1.0;
        let ndc_y = 1.0 - 2.0 * (dst.y + dst.height) as f32 / output.height as f32;
        let ndc_w = 2.0 * dst.width as f32 / output.width as f32;
        let ndc_h = 2.0 * dst.height as f32 / output.height as f32;

        gl::Uniform2f(self.u_position, ndc_x, ndc_y);
        gl::Uniform2f(self.u_size, ndc_w, ndc_h);
        gl::BindTexture(gl::TEXTURE_2D, command.texture);
        gl::DrawArrays(gl::TRIANGLES, 0, 6);
    }
}

impl Drop for GlCompositor {
    fn drop(&mut self) {
        unsafe {
            gl::DeleteBuffers(1, &self.vbo);
            gl::DeleteVertexArrays(1, &self.vao);
            gl::DeleteProgram(self.program);
        }
    }
}

unsafe fn uniform_location(program: u32, name: &str) -> i32 {
    let cname = CString::new(name).unwrap();
    gl::GetUniformLocation(program, cname.as_ptr())
}

unsafe fn create_program() -> Result<u32> {
    let vs = compile_shader(VERTEX_SHADER, gl::VERTEX_SHADER)?;
    let fs = compile_shader(FRAGMENT_SHADER, gl::FRAGMENT_SHADER)?;

    let program = gl::CreateProgram();
    gl::AttachShader(program, vs);
    gl::AttachShader(program, fs);
    gl::LinkProgram(program);

    let mut success = 0;
    gl::GetProgramiv(program, gl::LINK_STATUS, &mut success);
    gl::DeleteShader(vs);
    gl::DeleteShader(fs);

    if success == 0 {
        let mut log = vec![0u8; 512];
        let mut len = 0;
        gl::GetProgramInfoLog(program, log.len() as i32, &mut len, log.as_mut_ptr() as *mut _);
        log.truncate(len.max(0) as usize);
        gl::DeleteProgram(program);
        return Err(CoreError::Render(format!(
            "shader link failed: {}",
            String::from_utf8_lossy(&log)
        )));
    }
    Ok(program)
}

unsafe fn compile_shader(source: &str, kind: u32) -> Result<u32> {
    let shader = gl::CreateShader(kind);
    let csource = CString::new(source).unwrap();
    gl::ShaderSource(shader, 1, &csource.as_ptr(), ptr::null());
    gl::CompileShader(shader);

    let mut success = 0;
    gl::GetShaderiv(shader, gl::COMPILE_STATUS, &mut success);
    if success == 0 {
        let mut log = vec![0u8; 512];
        let mut len = 0;
        gl::GetShaderInfoLog(shader, log.len() as i32, &mut len, log.as_mut_ptr() as *mut _);
        log.truncate(len.max(0) as usize);
        gl::DeleteShader(shader);
        return Err(CoreError::Render(format!(
            "shader compile failed: {}",
            String::from_utf8_lossy(&log)
        )));
    }
    Ok(shader)
}
