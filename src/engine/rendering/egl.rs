//! ### English
//! GPU context and window surface ownership.
//!
//! `EglContext` wraps the platform GL stack behind surfman: one context per
//! render thread, bound to at most one on-screen window surface. The type is
//! deliberately `!Send`; every call must happen on the render thread.
//!
//! ### 中文
//! GPU 上下文与 window surface 的持有。
//!
//! `EglContext` 通过 surfman 封装平台 GL 栈：每个渲染线程一个上下文，
//! 至多绑定一个上屏 window surface。该类型刻意设计为 `!Send`；
//! 所有调用都必须发生在渲染线程。

use std::ffi::c_void;
use std::marker::PhantomData;
use std::sync::Arc;

use dpi::PhysicalSize;
use euclid::default::Size2D;
use glow::HasContext as _;
use surfman::{
    Connection, Context, ContextAttributeFlags, ContextAttributes, Device, GLApi, GLVersion,
    SurfaceAccess, SurfaceType,
};

use crate::engine::encoder::RenderContextHandle;

/// ### English
/// Requested context configuration, mirroring the platform EGL config hints.
/// The default (`PLAIN`) is RGB without alpha and no recordable hint.
///
/// ### 中文
/// 请求的上下文配置，对应平台 EGL config 提示。
/// 默认值（`PLAIN`）为不带 alpha 的 RGB，且无 recordable 提示。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConfigAttributes {
    /// ### English
    /// Request an alpha channel in the color buffer.
    ///
    /// ### 中文
    /// 请求颜色缓冲带 alpha 通道。
    pub alpha: bool,
    /// ### English
    /// Hint that the surface feeds a video recorder.
    ///
    /// ### 中文
    /// 提示该 surface 会供给视频录制器。
    pub recordable: bool,
    /// ### English
    /// Hint that a wide-gamut color space is wanted.
    ///
    /// ### 中文
    /// 提示需要广色域色彩空间。
    pub wide_gamut: bool,
}

impl ConfigAttributes {
    /// ### English
    /// RGB without alpha, no extra hints.
    ///
    /// ### 中文
    /// 不带 alpha 的 RGB，无额外提示。
    pub const PLAIN: Self = Self {
        alpha: false,
        recordable: false,
        wide_gamut: false,
    };
}

/// ### English
/// Failure modes of a buffer swap.
///
/// ### 中文
/// 缓冲 swap 的失败类型。
pub(crate) enum SwapError {
    /// ### English
    /// The window went away underneath us. Not fatal: the surface has been
    /// torn down and rendering pauses until a new window is bound.
    ///
    /// ### 中文
    /// 窗口在我们之下消失。非致命：surface 已被销毁，渲染暂停直至绑定新窗口。
    SurfaceLost,
    /// ### English
    /// Unrecoverable context failure; the render thread must tear down.
    ///
    /// ### 中文
    /// 不可恢复的上下文失败；渲染线程必须销毁退出。
    Fatal(String),
}

/// ### English
/// Owner of the GPU context and the optional window surface bound to it.
///
/// ### 中文
/// GPU 上下文及其可选绑定的 window surface 的持有者。
pub(crate) struct EglContext {
    /// ### English
    /// Display connection; also mints native widgets from raw window handles.
    ///
    /// ### 中文
    /// 显示连接；同时负责从原始窗口句柄构造 native widget。
    connection: Connection,
    /// ### English
    /// GPU device the context was created on.
    ///
    /// ### 中文
    /// 创建该上下文的 GPU 设备。
    device: Device,
    /// ### English
    /// The GL context, boxed so the context-handle token stays stable.
    /// `None` only after `release`.
    ///
    /// ### 中文
    /// GL 上下文；装箱以保证 context-handle 令牌地址稳定。
    /// 仅在 `release` 之后为 `None`。
    context: Option<Box<Context>>,
    /// ### English
    /// GL API loaded from this context's proc loader.
    ///
    /// ### 中文
    /// 从该上下文的函数加载器加载的 GL API。
    glow: Arc<glow::Context>,
    /// ### English
    /// Whether the platform API is OpenGL ES.
    ///
    /// ### 中文
    /// 平台 API 是否为 OpenGL ES。
    gles: bool,
    /// ### English
    /// Size of the bound window surface; `None` while no window is attached.
    ///
    /// ### 中文
    /// 已绑定 window surface 的尺寸；未绑定窗口时为 `None`。
    surface_size: Option<PhysicalSize<u32>>,
    /// ### English
    /// Pins the context to its creating thread.
    ///
    /// ### 中文
    /// 把上下文固定在创建它的线程上。
    _thread_confined: PhantomData<*const ()>,
}

impl EglContext {
    /// ### English
    /// Creates a GPU context on the calling thread and makes it current
    /// (surfaceless until a window is bound).
    ///
    /// A foreign share context may be supplied for encoder interop; object
    /// namespace sharing is driven from the encoder side via
    /// [`Self::context_handle`], so the token is only recorded here.
    ///
    /// #### Parameters
    /// - `attributes`: Requested context configuration.
    /// - `shared`: Optional foreign context token.
    ///
    /// ### 中文
    /// 在调用线程上创建 GPU 上下文并使其 current（绑定窗口前为 surfaceless）。
    ///
    /// 可传入外部共享上下文用于编码器互通；对象命名空间共享由编码器侧通过
    /// [`Self::context_handle`] 驱动，这里只记录该令牌。
    ///
    /// #### 参数
    /// - `attributes`：请求的上下文配置。
    /// - `shared`：可选的外部上下文令牌。
    pub(crate) fn create(
        attributes: &ConfigAttributes,
        shared: Option<RenderContextHandle>,
    ) -> Result<Self, String> {
        let connection = Connection::new()
            .map_err(|err| format!("Failed to open display connection: {err:?}"))?;
        let adapter = connection
            .create_adapter()
            .map_err(|err| format!("Failed to create GPU adapter: {err:?}"))?;
        let mut device = connection
            .create_device(&adapter)
            .map_err(|err| format!("Failed to open GPU device: {err:?}"))?;

        let gles = matches!(device.gl_api(), GLApi::GLES);
        let version = if gles {
            GLVersion::new(3, 0)
        } else {
            GLVersion::new(3, 2)
        };
        let mut flags = ContextAttributeFlags::empty();
        if attributes.alpha {
            flags |= ContextAttributeFlags::ALPHA;
        }
        if attributes.recordable || attributes.wide_gamut {
            log::debug!(
                "Config hints recordable={} wide_gamut={} have no portable attribute here",
                attributes.recordable,
                attributes.wide_gamut
            );
        }
        if let Some(shared) = shared {
            log::debug!(
                "Share context {:#x} noted; namespace sharing is encoder-driven",
                shared.as_raw()
            );
        }

        let descriptor = device
            .create_context_descriptor(&ContextAttributes { version, flags })
            .map_err(|err| format!("Failed to create context descriptor: {err:?}"))?;
        let mut context = device
            .create_context(&descriptor, None)
            .map(Box::new)
            .map_err(|err| format!("Failed to create GL context: {err:?}"))?;
        if let Err(err) = device.make_context_current(&context) {
            let _ = device.destroy_context(&mut context);
            return Err(format!("Failed to make GL context current: {err:?}"));
        }

        let glow = unsafe {
            glow::Context::from_loader_function(|symbol| device.get_proc_address(&context, symbol))
        };

        Ok(Self {
            connection,
            device,
            context: Some(context),
            glow: Arc::new(glow),
            gles,
            surface_size: None,
            _thread_confined: PhantomData,
        })
    }

    /// ### English
    /// Binds the context to a platform window, replacing any previous window
    /// surface.
    ///
    /// #### Parameters
    /// - `window`: Raw native window handle.
    /// - `size`: Window size in physical pixels.
    ///
    /// ### 中文
    /// 把上下文绑定到平台窗口，并替换掉之前的 window surface。
    ///
    /// #### 参数
    /// - `window`：原始 native 窗口句柄。
    /// - `size`：窗口物理像素尺寸。
    pub(crate) fn bind_window(
        &mut self,
        window: usize,
        size: PhysicalSize<u32>,
    ) -> Result<(), String> {
        self.unbind_window()?;
        let context = self
            .context
            .as_deref_mut()
            .ok_or("Context already released")?;

        let widget_size = Size2D::new(size.width.max(1) as i32, size.height.max(1) as i32);
        let native_widget = unsafe {
            self.connection
                .create_native_widget_from_ptr(window as *mut c_void, widget_size)
        };
        let surface = self
            .device
            .create_surface(
                context,
                SurfaceAccess::GPUOnly,
                SurfaceType::Widget { native_widget },
            )
            .map_err(|err| format!("Failed to create window surface: {err:?}"))?;
        if let Err((err, mut surface)) = self.device.bind_surface_to_context(context, surface) {
            let _ = self.device.destroy_surface(context, &mut surface);
            return Err(format!("Failed to bind window surface: {err:?}"));
        }
        self.surface_size = Some(size);
        Ok(())
    }

    /// ### English
    /// Destroys the bound window surface, if any. Rendering pauses until a
    /// new window is bound.
    ///
    /// ### 中文
    /// 销毁已绑定的 window surface（若有）。渲染暂停，直至绑定新窗口。
    pub(crate) fn unbind_window(&mut self) -> Result<(), String> {
        let Some(context) = self.context.as_deref_mut() else {
            return Ok(());
        };
        match self.device.unbind_surface_from_context(context) {
            Ok(Some(mut surface)) => {
                let _ = self.device.destroy_surface(context, &mut surface);
            }
            Ok(None) => {}
            Err(err) => return Err(format!("Failed to unbind window surface: {err:?}")),
        }
        self.surface_size = None;
        Ok(())
    }

    /// ### English
    /// Makes the context (and bound surface) current on the calling thread.
    /// Must be the render thread.
    ///
    /// ### 中文
    /// 使上下文（及已绑定的 surface）在调用线程上 current。必须是渲染线程。
    pub(crate) fn make_current(&self) -> Result<(), String> {
        let context = self.context.as_deref().ok_or("Context already released")?;
        self.device
            .make_context_current(context)
            .map_err(|err| format!("Failed to make GL context current: {err:?}"))
    }

    /// ### English
    /// Binds the window surface's framebuffer and viewport for drawing.
    /// Returns the surface size.
    ///
    /// ### 中文
    /// 绑定 window surface 的 framebuffer 与 viewport 以供绘制。
    /// 返回 surface 尺寸。
    pub(crate) fn bind_draw_target(&mut self) -> Result<PhysicalSize<u32>, String> {
        let context = self
            .context
            .as_deref_mut()
            .ok_or("Context already released")?;
        let info = self
            .device
            .context_surface_info(context)
            .map_err(|err| format!("Failed to query surface info: {err:?}"))?
            .ok_or("No window surface bound")?;
        let framebuffer = info.framebuffer_object;
        unsafe {
            self.glow.bind_framebuffer(glow::FRAMEBUFFER, framebuffer);
            self.glow.viewport(0, 0, info.size.width, info.size.height);
        }
        Ok(PhysicalSize::new(
            info.size.width.max(0) as u32,
            info.size.height.max(0) as u32,
        ))
    }

    /// ### English
    /// Presents the back buffer.
    ///
    /// On present failure the window surface is torn down and
    /// [`SwapError::SurfaceLost`] is returned; the caller pauses rendering
    /// and awaits a new window handle.
    ///
    /// ### 中文
    /// 呈现后备缓冲。
    ///
    /// 呈现失败时销毁 window surface 并返回 [`SwapError::SurfaceLost`]；
    /// 调用方暂停渲染，等待新的窗口句柄。
    pub(crate) fn swap(&mut self) -> Result<(), SwapError> {
        let context = self
            .context
            .as_deref_mut()
            .ok_or_else(|| SwapError::Fatal("Context already released".to_string()))?;
        let mut surface = match self.device.unbind_surface_from_context(context) {
            Ok(Some(surface)) => surface,
            Ok(None) => return Err(SwapError::SurfaceLost),
            Err(err) => {
                return Err(SwapError::Fatal(format!(
                    "Failed to unbind window surface for present: {err:?}"
                )));
            }
        };
        match self.device.present_surface(context, &mut surface) {
            Ok(()) => {
                if let Err((err, mut surface)) =
                    self.device.bind_surface_to_context(context, surface)
                {
                    let _ = self.device.destroy_surface(context, &mut surface);
                    self.surface_size = None;
                    return Err(SwapError::Fatal(format!(
                        "Failed to re-bind window surface: {err:?}"
                    )));
                }
                Ok(())
            }
            Err(err) => {
                let _ = self.device.destroy_surface(context, &mut surface);
                self.surface_size = None;
                log::warn!("Present failed ({err:?}); window surface torn down");
                Err(SwapError::SurfaceLost)
            }
        }
    }

    /// ### English
    /// Whether a window surface is currently bound.
    ///
    /// ### 中文
    /// 当前是否绑定了 window surface。
    #[inline]
    pub(crate) fn has_window(&self) -> bool {
        self.surface_size.is_some()
    }

    /// ### English
    /// GL API handle (cheap clone of an `Arc`).
    ///
    /// ### 中文
    /// GL API 句柄（`Arc` 的低成本 clone）。
    #[inline]
    pub(crate) fn gl(&self) -> Arc<glow::Context> {
        self.glow.clone()
    }

    /// ### English
    /// Whether the platform API is OpenGL ES.
    ///
    /// ### 中文
    /// 平台 API 是否为 OpenGL ES。
    #[inline]
    pub(crate) fn is_gles(&self) -> bool {
        self.gles
    }

    /// ### English
    /// Opaque token identifying this context, passed to hardware video
    /// encoders. Stable until `release`.
    ///
    /// ### 中文
    /// 标识该上下文的不透明令牌，会传给硬件视频编码器。在 `release` 前保持稳定。
    pub(crate) fn context_handle(&self) -> RenderContextHandle {
        RenderContextHandle(
            self.context
                .as_deref()
                .map_or(0, |context| context as *const Context as usize),
        )
    }

    /// ### English
    /// Destroys the window surface and then the context. Idempotent.
    ///
    /// ### 中文
    /// 先销毁 window surface，再销毁上下文。幂等。
    pub(crate) fn release(&mut self) {
        let _ = self.unbind_window();
        if let Some(mut context) = self.context.take() {
            let _ = self.device.destroy_context(&mut context);
        }
    }
}

impl Drop for EglContext {
    /// ### English
    /// Ensures GPU resources are destroyed even on abnormal teardown.
    ///
    /// ### 中文
    /// 确保异常销毁路径下 GPU 资源也被释放。
    fn drop(&mut self) {
        self.release();
    }
}
