//! ### English
//! Video encoder binding contract.
//!
//! The renderer only drives an encoder's frame-available notification and its
//! one-time sharing-context setup; the encoder implementation itself lives in
//! the host application.
//!
//! ### 中文
//! 视频编码器绑定契约。
//!
//! 渲染器只负责驱动编码器的帧可用通知以及一次性的共享上下文设置；
//! 编码器实现本身位于宿主应用中。

/// ### English
/// Opaque token identifying the render thread's GPU context. Stable for the
/// lifetime of the context; an encoder passes it back to the platform GL
/// stack to create a sharing context on its own thread.
///
/// ### 中文
/// 标识渲染线程 GPU 上下文的不透明令牌。在上下文生命周期内保持稳定；
/// 编码器将其交还给平台 GL 栈，以便在自己的线程上创建共享上下文。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderContextHandle(pub(crate) usize);

impl RenderContextHandle {
    /// ### English
    /// Raw pointer-sized token value.
    ///
    /// ### 中文
    /// 指针大小的原始令牌值。
    #[inline]
    pub fn as_raw(self) -> usize {
        self.0
    }
}

/// ### English
/// Encoder that only needs to be told a frame is about to be available.
///
/// ### 中文
/// 只需被告知“即将有帧可用”的编码器。
pub trait GenericVideoEncoder: Send {
    /// ### English
    /// Called on the render thread once per drawn frame, before the
    /// on-screen swap.
    ///
    /// ### 中文
    /// 每绘制一帧，在上屏 swap 之前于渲染线程调用一次。
    fn frame_available_soon(&self);
}

/// ### English
/// Hardware video encoder that samples the renderer's input texture through
/// a sharing GPU context.
///
/// ### 中文
/// 通过共享 GPU 上下文采样渲染器输入纹理的硬件视频编码器。
pub trait HardwareVideoEncoder: Send {
    /// ### English
    /// Receives the render context handle and the input texture id, exactly
    /// once per binding and before the first `frame_available_soon`.
    ///
    /// #### Parameters
    /// - `context`: Opaque render context token.
    /// - `texture_id`: Input texture id the encoder may sample.
    ///
    /// ### 中文
    /// 接收渲染上下文令牌与输入纹理 id；每次绑定恰好一次，
    /// 且先于第一次 `frame_available_soon`。
    ///
    /// #### 参数
    /// - `context`：不透明的渲染上下文令牌。
    /// - `texture_id`：编码器可采样的输入纹理 id。
    fn set_gl_context(&self, context: RenderContextHandle, texture_id: u32);

    /// ### English
    /// Called on the render thread once per drawn frame with the same-frame
    /// texture transform, before the on-screen swap.
    ///
    /// #### Parameters
    /// - `transform`: Column-major 4×4 texture transform of this frame.
    ///
    /// ### 中文
    /// 每绘制一帧，携带该帧的纹理变换，在上屏 swap 之前于渲染线程调用一次。
    ///
    /// #### 参数
    /// - `transform`：该帧的列主序 4×4 纹理变换。
    fn frame_available_soon(&self, transform: &[f32; 16]);
}

/// ### English
/// Tagged encoder variant the render thread dispatches on at frame time.
///
/// ### 中文
/// 渲染线程在帧时刻据以分派的编码器变体标签。
pub enum VideoEncoder {
    /// ### English
    /// Generic encoder: parameterless notification only.
    ///
    /// ### 中文
    /// 通用编码器：仅无参数通知。
    Generic(Box<dyn GenericVideoEncoder>),
    /// ### English
    /// Hardware video encoder: context/texture handoff plus per-frame
    /// transform notification.
    ///
    /// ### 中文
    /// 硬件视频编码器：上下文/纹理交接，外加携带变换的逐帧通知。
    HardwareVideo(Box<dyn HardwareVideoEncoder>),
}
