//! ### English
//! Full-surface textured-quad drawer.
//!
//! The drawer holds the compiled shader program and quad vertex state; it
//! must be constructed, used, and released with a current context on the
//! render thread. Any GL error it observes is fatal for the context.
//!
//! ### 中文
//! 全屏纹理四边形绘制器。
//!
//! 绘制器持有已编译的着色器程序与四边形顶点状态；其构造、使用与释放都必须在
//! 渲染线程、且上下文 current 时进行。它观察到的任何 GL 错误对上下文都是致命的。

use std::num::NonZeroU32;
use std::sync::Arc;

use glow::{HasContext as _, PixelUnpackData};

/// ### English
/// Desktop GL vertex shader: pass-through quad with a 4×4 texture transform.
///
/// ### 中文
/// 桌面 GL 顶点着色器：直通四边形，叠加 4×4 纹理变换。
const VERTEX_SRC_GL: &str = r"#version 140

in vec2 in_position;
in vec2 in_tex_coord;

uniform mat4 u_tex_matrix;

out vec2 v_tex_coord;

void main() {
    gl_Position = vec4(in_position, 0.0, 1.0);
    v_tex_coord = (u_tex_matrix * vec4(in_tex_coord, 0.0, 1.0)).xy;
}
";

/// ### English
/// Desktop GL fragment shader: sample the input texture.
///
/// ### 中文
/// 桌面 GL 片段着色器：采样输入纹理。
const FRAGMENT_SRC_GL: &str = r"#version 140

uniform sampler2D u_texture;

in vec2 v_tex_coord;

out vec4 frag_color;

void main() {
    frag_color = texture(u_texture, v_tex_coord);
}
";

/// ### English
/// GLES vertex shader (same body as the desktop variant).
///
/// ### 中文
/// GLES 顶点着色器（与桌面变体同体）。
const VERTEX_SRC_GLES: &str = r"#version 300 es

in vec2 in_position;
in vec2 in_tex_coord;

uniform mat4 u_tex_matrix;

out vec2 v_tex_coord;

void main() {
    gl_Position = vec4(in_position, 0.0, 1.0);
    v_tex_coord = (u_tex_matrix * vec4(in_tex_coord, 0.0, 1.0)).xy;
}
";

/// ### English
/// GLES fragment shader.
///
/// ### 中文
/// GLES 片段着色器。
const FRAGMENT_SRC_GLES: &str = r"#version 300 es
precision mediump float;

uniform sampler2D u_texture;

in vec2 v_tex_coord;

out vec4 frag_color;

void main() {
    frag_color = texture(u_texture, v_tex_coord);
}
";

/// ### English
/// Interleaved quad vertices: `(x, y, s, t)` per vertex, triangle strip.
///
/// ### 中文
/// 交错的四边形顶点：每顶点 `(x, y, s, t)`，按 triangle strip 排列。
#[rustfmt::skip]
const QUAD_VERTICES: [f32; 16] = [
    -1.0, -1.0, 0.0, 0.0,
     1.0, -1.0, 1.0, 0.0,
    -1.0,  1.0, 0.0, 1.0,
     1.0,  1.0, 1.0, 1.0,
];

/// ### English
/// Drawer contract used by the render thread. Custom implementations may be
/// injected at `init`; all methods run on the render thread with a current
/// context.
///
/// ### 中文
/// 渲染线程使用的绘制器契约。可在 `init` 时注入自定义实现；
/// 所有方法都在渲染线程、上下文 current 时执行。
pub trait FrameDrawer {
    /// ### English
    /// Draws a full-surface quad sampling `texture_id` through `transform`.
    ///
    /// #### Parameters
    /// - `texture_id`: GL texture to sample.
    /// - `transform`: Column-major 4×4 texture transform.
    /// - `first_vertex`: First vertex offset into the quad strip.
    ///
    /// ### 中文
    /// 绘制全屏四边形，经 `transform` 采样 `texture_id`。
    ///
    /// #### 参数
    /// - `texture_id`：要采样的 GL 纹理。
    /// - `transform`：列主序 4×4 纹理变换。
    /// - `first_vertex`：四边形顶点带内的起始顶点偏移。
    fn draw(&mut self, texture_id: u32, transform: &[f32; 16], first_vertex: i32)
    -> Result<(), String>;

    /// ### English
    /// Allocates a new drawer-owned GL texture and returns its id.
    ///
    /// ### 中文
    /// 分配一个由绘制器持有的新 GL 纹理并返回其 id。
    fn init_tex(&mut self) -> Result<u32, String>;

    /// ### English
    /// Frees a texture previously returned by [`Self::init_tex`].
    ///
    /// #### Parameters
    /// - `texture_id`: Texture to free.
    ///
    /// ### 中文
    /// 释放之前由 [`Self::init_tex`] 返回的纹理。
    ///
    /// #### 参数
    /// - `texture_id`：要释放的纹理。
    fn delete_tex(&mut self, texture_id: u32);

    /// ### English
    /// Deletes shader and buffer state. No further calls are valid afterwards.
    ///
    /// ### 中文
    /// 删除着色器与缓冲状态。此后任何调用都不再合法。
    fn release(&mut self);
}

/// ### English
/// Factory for injecting a custom drawer at `init`; invoked on the render
/// thread once the context is current. Receives the GL API and whether it is
/// OpenGL ES.
///
/// ### 中文
/// 在 `init` 注入自定义绘制器的工厂；当上下文 current 后在渲染线程调用一次。
/// 参数为 GL API 与是否为 OpenGL ES。
pub type DrawerFactory =
    Box<dyn FnOnce(Arc<glow::Context>, bool) -> Result<Box<dyn FrameDrawer>, String> + Send>;

/// ### English
/// Default drawer: one program, one interleaved quad buffer.
///
/// ### 中文
/// 默认绘制器：一个着色器程序，一个交错的四边形缓冲。
pub struct GlDrawer {
    /// ### English
    /// GL API this drawer issues commands through.
    ///
    /// ### 中文
    /// 绘制器使用的 GL API。
    gl: Arc<glow::Context>,
    /// ### English
    /// Compiled and linked quad program.
    ///
    /// ### 中文
    /// 已编译链接的四边形程序。
    program: glow::Program,
    /// ### English
    /// Vertex array capturing the quad attribute layout.
    ///
    /// ### 中文
    /// 记录四边形属性布局的 vertex array。
    vao: glow::VertexArray,
    /// ### English
    /// Interleaved quad vertex buffer.
    ///
    /// ### 中文
    /// 交错的四边形顶点缓冲。
    vbo: glow::Buffer,
    /// ### English
    /// Location of the `u_tex_matrix` uniform.
    ///
    /// ### 中文
    /// `u_tex_matrix` uniform 的位置。
    u_tex_matrix: glow::UniformLocation,
    /// ### English
    /// Guard against use after `release`.
    ///
    /// ### 中文
    /// 防止 `release` 后继续使用的保护标记。
    released: bool,
}

impl GlDrawer {
    /// ### English
    /// Compiles the quad program and uploads the vertex buffer. Requires a
    /// current context on the render thread.
    ///
    /// #### Parameters
    /// - `gl`: GL API to build against.
    /// - `gles`: Whether the platform API is OpenGL ES.
    ///
    /// ### 中文
    /// 编译四边形程序并上传顶点缓冲。要求渲染线程上有 current 的上下文。
    ///
    /// #### 参数
    /// - `gl`：构建所用的 GL API。
    /// - `gles`：平台 API 是否为 OpenGL ES。
    pub fn new(gl: Arc<glow::Context>, gles: bool) -> Result<Self, String> {
        let (vertex_src, fragment_src) = if gles {
            (VERTEX_SRC_GLES, FRAGMENT_SRC_GLES)
        } else {
            (VERTEX_SRC_GL, FRAGMENT_SRC_GL)
        };
        let program = unsafe { link_program(&gl, vertex_src, fragment_src)? };

        let (vao, vbo) = unsafe {
            let vao = gl
                .create_vertex_array()
                .map_err(|err| format!("Failed to create vertex array: {err}"))?;
            let vbo = gl
                .create_buffer()
                .map_err(|err| format!("Failed to create vertex buffer: {err}"))?;
            gl.bind_vertex_array(Some(vao));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            let bytes = std::slice::from_raw_parts(
                QUAD_VERTICES.as_ptr().cast::<u8>(),
                std::mem::size_of_val(&QUAD_VERTICES),
            );
            gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, bytes, glow::STATIC_DRAW);
            gl.enable_vertex_attrib_array(0);
            gl.vertex_attrib_pointer_f32(0, 2, glow::FLOAT, false, 16, 0);
            gl.enable_vertex_attrib_array(1);
            gl.vertex_attrib_pointer_f32(1, 2, glow::FLOAT, false, 16, 8);
            gl.bind_buffer(glow::ARRAY_BUFFER, None);
            gl.bind_vertex_array(None);
            (vao, vbo)
        };

        let u_tex_matrix = unsafe {
            gl.get_uniform_location(program, "u_tex_matrix")
                .ok_or("Missing uniform u_tex_matrix")?
        };
        unsafe {
            gl.use_program(Some(program));
            if let Some(u_texture) = gl.get_uniform_location(program, "u_texture") {
                gl.uniform_1_i32(Some(&u_texture), 0);
            }
            gl.use_program(None);
        }
        check_gl_error(&gl, "drawer init")?;

        Ok(Self {
            gl,
            program,
            vao,
            vbo,
            u_tex_matrix,
            released: false,
        })
    }
}

impl FrameDrawer for GlDrawer {
    fn draw(
        &mut self,
        texture_id: u32,
        transform: &[f32; 16],
        first_vertex: i32,
    ) -> Result<(), String> {
        if self.released {
            return Err("Drawer used after release".to_string());
        }
        let texture = NonZeroU32::new(texture_id)
            .map(glow::NativeTexture)
            .ok_or("Invalid texture id 0")?;
        unsafe {
            self.gl.use_program(Some(self.program));
            self.gl.bind_vertex_array(Some(self.vao));
            self.gl.active_texture(glow::TEXTURE0);
            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            self.gl
                .uniform_matrix_4_f32_slice(Some(&self.u_tex_matrix), false, transform);
            self.gl
                .draw_arrays(glow::TRIANGLE_STRIP, first_vertex, 4);
            self.gl.bind_texture(glow::TEXTURE_2D, None);
            self.gl.bind_vertex_array(None);
            self.gl.use_program(None);
        }
        check_gl_error(&self.gl, "draw")
    }

    fn init_tex(&mut self) -> Result<u32, String> {
        if self.released {
            return Err("Drawer used after release".to_string());
        }
        let texture = unsafe {
            let texture = self
                .gl
                .create_texture()
                .map_err(|err| format!("Failed to create texture: {err}"))?;
            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MIN_FILTER,
                glow::LINEAR as i32,
            );
            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MAG_FILTER,
                glow::LINEAR as i32,
            );
            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_WRAP_S,
                glow::CLAMP_TO_EDGE as i32,
            );
            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_WRAP_T,
                glow::CLAMP_TO_EDGE as i32,
            );
            self.gl.bind_texture(glow::TEXTURE_2D, None);
            texture
        };
        check_gl_error(&self.gl, "init_tex")?;
        Ok(texture.0.get())
    }

    fn delete_tex(&mut self, texture_id: u32) {
        if self.released {
            return;
        }
        if let Some(texture) = NonZeroU32::new(texture_id).map(glow::NativeTexture) {
            unsafe {
                self.gl.delete_texture(texture);
            }
        }
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        unsafe {
            self.gl.delete_program(self.program);
            self.gl.delete_vertex_array(self.vao);
            self.gl.delete_buffer(self.vbo);
        }
    }
}

/// ### English
/// Uploads an RGBA frame into a drawer texture.
///
/// #### Parameters
/// - `gl`: GL API to upload through.
/// - `texture_id`: Target texture id.
/// - `width`: Frame width in pixels.
/// - `height`: Frame height in pixels.
/// - `pixels`: Tightly packed RGBA bytes.
///
/// ### 中文
/// 把一个 RGBA 帧上传到绘制器纹理。
///
/// #### 参数
/// - `gl`：上传所用的 GL API。
/// - `texture_id`：目标纹理 id。
/// - `width`：帧宽度（像素）。
/// - `height`：帧高度（像素）。
/// - `pixels`：紧密排列的 RGBA 字节。
pub(crate) fn upload_rgba(
    gl: &glow::Context,
    texture_id: u32,
    width: u32,
    height: u32,
    pixels: &[u8],
) -> Result<(), String> {
    let texture = NonZeroU32::new(texture_id)
        .map(glow::NativeTexture)
        .ok_or("Invalid texture id 0")?;
    unsafe {
        gl.bind_texture(glow::TEXTURE_2D, Some(texture));
        gl.tex_image_2d(
            glow::TEXTURE_2D,
            0,
            glow::RGBA as i32,
            width as i32,
            height as i32,
            0,
            glow::RGBA,
            glow::UNSIGNED_BYTE,
            PixelUnpackData::Slice(Some(pixels)),
        );
        gl.bind_texture(glow::TEXTURE_2D, None);
    }
    check_gl_error(gl, "frame upload")
}

/// ### English
/// Deletes a texture directly, bypassing the drawer. Used during teardown
/// after the drawer itself has been released.
///
/// #### Parameters
/// - `gl`: GL API to delete through.
/// - `texture_id`: Texture to delete.
///
/// ### 中文
/// 绕过绘制器直接删除纹理。用于绘制器自身已释放之后的销毁流程。
///
/// #### 参数
/// - `gl`：删除所用的 GL API。
/// - `texture_id`：要删除的纹理。
pub(crate) fn delete_texture(gl: &glow::Context, texture_id: u32) {
    if let Some(texture) = NonZeroU32::new(texture_id).map(glow::NativeTexture) {
        unsafe {
            gl.delete_texture(texture);
        }
    }
}

/// ### English
/// Maps a pending GL error to a fatal `Err`.
///
/// #### Parameters
/// - `gl`: GL API to query.
/// - `stage`: Label naming the failed stage.
///
/// ### 中文
/// 把待处理的 GL 错误映射为致命 `Err`。
///
/// #### 参数
/// - `gl`：要查询的 GL API。
/// - `stage`：失败阶段的标签。
pub(crate) fn check_gl_error(gl: &glow::Context, stage: &str) -> Result<(), String> {
    let error = unsafe { gl.get_error() };
    if error == glow::NO_ERROR {
        Ok(())
    } else {
        Err(format!("GL error {error:#06x} during {stage}"))
    }
}

/// ### English
/// Compiles and links one vertex/fragment shader pair with fixed attribute
/// locations.
///
/// #### Parameters
/// - `gl`: GL API to build against.
/// - `vertex_src`: Vertex shader source.
/// - `fragment_src`: Fragment shader source.
///
/// ### 中文
/// 编译并链接一对顶点/片段着色器，并固定属性位置。
///
/// #### 参数
/// - `gl`：构建所用的 GL API。
/// - `vertex_src`：顶点着色器源码。
/// - `fragment_src`：片段着色器源码。
unsafe fn link_program(
    gl: &glow::Context,
    vertex_src: &str,
    fragment_src: &str,
) -> Result<glow::Program, String> {
    unsafe {
        let program = gl
            .create_program()
            .map_err(|err| format!("Failed to create program: {err}"))?;
        let vertex = compile_shader(gl, glow::VERTEX_SHADER, vertex_src)?;
        let fragment = compile_shader(gl, glow::FRAGMENT_SHADER, fragment_src)?;
        gl.attach_shader(program, vertex);
        gl.attach_shader(program, fragment);
        gl.bind_attrib_location(program, 0, "in_position");
        gl.bind_attrib_location(program, 1, "in_tex_coord");
        gl.link_program(program);
        gl.detach_shader(program, vertex);
        gl.detach_shader(program, fragment);
        gl.delete_shader(vertex);
        gl.delete_shader(fragment);
        if !gl.get_program_link_status(program) {
            let log = gl.get_program_info_log(program);
            gl.delete_program(program);
            return Err(format!("Failed to link program: {log}"));
        }
        Ok(program)
    }
}

/// ### English
/// Compiles one shader stage.
///
/// #### Parameters
/// - `gl`: GL API to build against.
/// - `stage`: `glow::VERTEX_SHADER` or `glow::FRAGMENT_SHADER`.
/// - `source`: Shader source.
///
/// ### 中文
/// 编译单个着色器阶段。
///
/// #### 参数
/// - `gl`：构建所用的 GL API。
/// - `stage`：`glow::VERTEX_SHADER` 或 `glow::FRAGMENT_SHADER`。
/// - `source`：着色器源码。
unsafe fn compile_shader(
    gl: &glow::Context,
    stage: u32,
    source: &str,
) -> Result<glow::Shader, String> {
    unsafe {
        let shader = gl
            .create_shader(stage)
            .map_err(|err| format!("Failed to create shader: {err}"))?;
        gl.shader_source(shader, source);
        gl.compile_shader(shader);
        if !gl.get_shader_compile_status(shader) {
            let log = gl.get_shader_info_log(shader);
            gl.delete_shader(shader);
            return Err(format!("Failed to compile shader: {log}"));
        }
        Ok(shader)
    }
}
