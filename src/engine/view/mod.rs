//! ### English
//! View renderer: integrates the render thread with the host window system.
//!
//! The host calls the surface hooks (`surface_created` / `surface_changed` /
//! `surface_destroyed`) and the layout hooks (`on_measure` / `on_layout`) on
//! its main thread; frame producers call `on_frame` from any thread. The
//! renderer owns one render thread per `init`/`release` cycle.
//!
//! ### 中文
//! view 渲染器：把渲染线程接入宿主窗口系统。
//!
//! 宿主在主线程调用 surface 钩子（`surface_created` / `surface_changed` /
//! `surface_destroyed`）与布局钩子（`on_measure` / `on_layout`）；
//! 帧生产者可在任意线程调用 `on_frame`。每个 `init`/`release` 周期
//! 渲染器持有一个渲染线程。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};

use dpi::PhysicalSize;
use image::RgbaImage;

use crate::engine::encoder::{RenderContextHandle, VideoEncoder};
use crate::engine::events::RendererEvents;
use crate::engine::fps::FpsCounter;
use crate::engine::frame::{FrameRotation, VideoFrame};
use crate::engine::lockfree::PendingResolution;
use crate::engine::rendering::drawer::DrawerFactory;
use crate::engine::rendering::egl::ConfigAttributes;
use crate::engine::rendering::input::PreviewSurface;
use crate::engine::runtime::handle::{RenderHandle, RenderHandleLaunch};

pub mod layout;

use layout::{MeasureSpec, VideoLayoutMeasure};

/// ### English
/// Window capability the host supplies: surface-size requests and layout
/// invalidation flow back through it. Called only on the main thread.
///
/// ### 中文
/// 宿主提供的窗口能力：surface 尺寸请求与布局失效经由它回流。
/// 仅在主线程调用。
pub trait WindowHost: Send + Sync {
    /// ### English
    /// Requests a fixed-size display surface from the window.
    ///
    /// #### Parameters
    /// - `size`: Requested surface size in physical pixels.
    ///
    /// ### 中文
    /// 向窗口请求固定尺寸的显示 surface。
    ///
    /// #### 参数
    /// - `size`：请求的 surface 物理像素尺寸。
    fn set_fixed_size(&self, size: PhysicalSize<u32>);

    /// ### English
    /// Requests that the display surface track the layout size.
    ///
    /// ### 中文
    /// 请求显示 surface 跟随布局尺寸。
    fn set_size_from_layout(&self);

    /// ### English
    /// Requests a new measure/layout pass.
    ///
    /// ### 中文
    /// 请求新一轮 measure/layout。
    fn request_layout(&self);
}

/// ### English
/// Initialization parameters for one `init` cycle.
///
/// ### 中文
/// 单个 `init` 周期的初始化参数。
pub struct InitConfig {
    /// ### English
    /// Optional foreign share-context token for encoder interop.
    ///
    /// ### 中文
    /// 可选的外部共享上下文令牌，用于编码器互通。
    pub shared_context: Option<RenderContextHandle>,
    /// ### English
    /// Optional events listener; read-only after `init`.
    ///
    /// ### 中文
    /// 可选的事件监听器；`init` 之后只读。
    pub events: Option<Arc<dyn RendererEvents>>,
    /// ### English
    /// Requested context configuration.
    ///
    /// ### 中文
    /// 请求的上下文配置。
    pub config_attributes: ConfigAttributes,
    /// ### English
    /// Optional custom drawer factory.
    ///
    /// ### 中文
    /// 可选的自定义绘制器工厂。
    pub drawer: Option<DrawerFactory>,
}

impl Default for InitConfig {
    /// ### English
    /// Plain config, no listener, default drawer.
    ///
    /// ### 中文
    /// 普通配置、无监听器、默认绘制器。
    fn default() -> Self {
        Self {
            shared_context: None,
            events: None,
            config_attributes: ConfigAttributes::PLAIN,
            drawer: None,
        }
    }
}

/// ### English
/// Display-side renderer component. One render thread per `init`/`release`
/// cycle; layout state lives on the main thread and crosses into the render
/// thread only as command payloads.
///
/// ### 中文
/// 显示侧渲染组件。每个 `init`/`release` 周期一个渲染线程；布局状态归属
/// 主线程，仅以命令载荷的形式进入渲染线程。
pub struct ViewRenderer {
    /// ### English
    /// Host window capability.
    ///
    /// ### 中文
    /// 宿主窗口能力。
    window_host: Arc<dyn WindowHost>,
    /// ### English
    /// Scaling-policy calculator driving `on_measure`.
    ///
    /// ### 中文
    /// 驱动 `on_measure` 的缩放策略计算器。
    layout_measure: VideoLayoutMeasure,
    /// ### English
    /// Handle to the render thread of the current init cycle.
    ///
    /// ### 中文
    /// 当前 init 周期渲染线程的句柄。
    handle: Option<RenderHandle>,
    /// ### English
    /// Slot holding the live producer handle (written by the render thread).
    ///
    /// ### 中文
    /// 存放存活生产者句柄的槽位（由渲染线程写入）。
    input_slot: Arc<Mutex<Option<PreviewSurface>>>,
    /// ### English
    /// Latest-wins resolution cell written by the render thread.
    ///
    /// ### 中文
    /// 渲染线程写入的 latest-wins 分辨率单元。
    pending_resolution: Arc<PendingResolution>,
    /// ### English
    /// Set after the first successful swap of the current cycle.
    ///
    /// ### 中文
    /// 当前周期首次成功 swap 后置位。
    first_frame_rendered: Arc<AtomicBool>,
    /// ### English
    /// Derived state: true iff a window surface is currently bound.
    ///
    /// ### 中文
    /// 派生状态：当且仅当绑定了 window surface 时为 true。
    has_surface_flag: Arc<AtomicBool>,
    /// ### English
    /// Thread that created this renderer; main-thread-only entry points
    /// assert against it in debug builds.
    ///
    /// ### 中文
    /// 创建该渲染器的线程；主线程专属入口在 debug 构建下据此断言。
    main_thread: ThreadId,
    /// ### English
    /// Frame width after rotation; mutated only on the main thread.
    ///
    /// ### 中文
    /// 旋转后的帧宽度；仅主线程修改。
    rotated_frame_width: u32,
    /// ### English
    /// Frame height after rotation; mutated only on the main thread.
    ///
    /// ### 中文
    /// 旋转后的帧高度；仅主线程修改。
    rotated_frame_height: u32,
    /// ### English
    /// Most recent frame rotation.
    ///
    /// ### 中文
    /// 最近一次的帧旋转。
    frame_rotation: FrameRotation,
    /// ### English
    /// Fixed-size display-surface mode (hardware scaler).
    ///
    /// ### 中文
    /// 固定尺寸显示 surface 模式（硬件缩放）。
    enable_fixed_size: bool,
    /// ### English
    /// Last fixed-size request pushed to the window (0 when size-from-layout).
    ///
    /// ### 中文
    /// 最近向窗口推送的固定尺寸请求（size-from-layout 时为 0）。
    surface_width: u32,
    /// ### English
    /// See `surface_width`.
    ///
    /// ### 中文
    /// 见 `surface_width`。
    surface_height: u32,
    /// ### English
    /// Current layout width from `on_layout`.
    ///
    /// ### 中文
    /// 来自 `on_layout` 的当前布局宽度。
    view_width: u32,
    /// ### English
    /// Current layout height from `on_layout`.
    ///
    /// ### 中文
    /// 来自 `on_layout` 的当前布局高度。
    view_height: u32,
    /// ### English
    /// Native window handle delivered by `surface_created`.
    ///
    /// ### 中文
    /// `surface_created` 交付的 native 窗口句柄。
    window: Option<usize>,
}

impl ViewRenderer {
    /// ### English
    /// Creates a renderer bound to the host window capability. Call `init`
    /// before rendering anything.
    ///
    /// #### Parameters
    /// - `window_host`: Host window capability.
    ///
    /// ### 中文
    /// 创建绑定宿主窗口能力的渲染器。渲染前必须先调用 `init`。
    ///
    /// #### 参数
    /// - `window_host`：宿主窗口能力。
    pub fn new(window_host: Arc<dyn WindowHost>) -> Self {
        Self {
            window_host,
            layout_measure: VideoLayoutMeasure::default(),
            handle: None,
            input_slot: Arc::new(Mutex::new(None)),
            pending_resolution: Arc::new(PendingResolution::default()),
            first_frame_rendered: Arc::new(AtomicBool::new(false)),
            has_surface_flag: Arc::new(AtomicBool::new(false)),
            main_thread: thread::current().id(),
            rotated_frame_width: 0,
            rotated_frame_height: 0,
            frame_rotation: FrameRotation::Deg0,
            enable_fixed_size: false,
            surface_width: 0,
            surface_height: 0,
            view_width: 0,
            view_height: 0,
            window: None,
        }
    }

    /// ### English
    /// Initializes the renderer with default configuration. Main thread
    /// only; may be called again after a prior `release`.
    ///
    /// #### Parameters
    /// - `shared_context`: Optional foreign share-context token.
    /// - `events`: Optional events listener.
    ///
    /// ### 中文
    /// 以默认配置初始化渲染器。仅限主线程；在先前 `release` 之后可再次调用。
    ///
    /// #### 参数
    /// - `shared_context`：可选的外部共享上下文令牌。
    /// - `events`：可选的事件监听器。
    pub fn init(
        &mut self,
        shared_context: Option<RenderContextHandle>,
        events: Option<Arc<dyn RendererEvents>>,
    ) -> Result<(), String> {
        self.init_with_config(InitConfig {
            shared_context,
            events,
            ..InitConfig::default()
        })
    }

    /// ### English
    /// Initializes the renderer with explicit configuration. Main thread
    /// only. Resets the rotated frame dimensions to zero and spawns the
    /// render thread.
    ///
    /// #### Parameters
    /// - `config`: Initialization parameters.
    ///
    /// ### 中文
    /// 以显式配置初始化渲染器。仅限主线程。把旋转后的帧尺寸清零并启动
    /// 渲染线程。
    ///
    /// #### 参数
    /// - `config`：初始化参数。
    pub fn init_with_config(&mut self, config: InitConfig) -> Result<(), String> {
        self.assert_main_thread();
        if self.handle.is_some() {
            return Err("Renderer already initialized".to_string());
        }

        self.rotated_frame_width = 0;
        self.rotated_frame_height = 0;
        self.frame_rotation = FrameRotation::Deg0;
        let _ = self.pending_resolution.take();
        self.first_frame_rendered.store(false, Ordering::Release);

        let handle = RenderHandle::spawn(RenderHandleLaunch {
            shared_context: config.shared_context,
            config_attributes: config.config_attributes,
            drawer_factory: config.drawer,
            events: config.events,
            fps: Arc::new(FpsCounter::default()),
            pending_resolution: self.pending_resolution.clone(),
            input_slot: self.input_slot.clone(),
            has_surface: self.has_surface_flag.clone(),
            first_frame_rendered: self.first_frame_rendered.clone(),
            initial_size: PhysicalSize::new(self.view_width.max(1), self.view_height.max(1)),
        })?;

        /// ### English
        /// Re-attach the window if the host surface already exists.
        ///
        /// ### 中文
        /// 若宿主 surface 已存在，则重新挂接窗口。
        if let Some(window) = self.window
            && self.view_width > 0
            && self.view_height > 0
        {
            handle.bind_window(window, PhysicalSize::new(self.view_width, self.view_height));
        }
        self.handle = Some(handle);
        log::debug!("Renderer initialized");
        Ok(())
    }

    /// ### English
    /// Blocks until pending frames are dropped and all GPU resources are
    /// freed. Main thread only. The renderer may be re-initialized afterwards.
    ///
    /// ### 中文
    /// 阻塞直到待处理帧被丢弃、全部 GPU 资源被释放。仅限主线程。
    /// 之后渲染器可重新初始化。
    pub fn release(&mut self) {
        self.assert_main_thread();
        if let Some(mut handle) = self.handle.take() {
            handle.release();
        }
        log::debug!("Renderer released");
    }

    /// ### English
    /// Sets horizontal mirroring for subsequent draws.
    ///
    /// #### Parameters
    /// - `mirror`: Mirror the image horizontally.
    ///
    /// ### 中文
    /// 设置后续绘制的水平镜像。
    ///
    /// #### 参数
    /// - `mirror`：是否水平镜像。
    pub fn set_mirror(&self, mirror: bool) {
        if let Some(handle) = &self.handle {
            handle.set_mirror(mirror);
        }
    }

    /// ### English
    /// Caps the render rate at `fps` frames per second.
    ///
    /// #### Parameters
    /// - `fps`: Maximum frame rate; `f32::INFINITY` disables the cap.
    ///
    /// ### 中文
    /// 把渲染速率限制在每秒 `fps` 帧。
    ///
    /// #### 参数
    /// - `fps`：最大帧率；`f32::INFINITY` 解除限制。
    pub fn set_fps_reduction(&self, fps: f32) {
        if let Some(handle) = &self.handle {
            handle.set_fps_reduction(fps);
        }
    }

    /// ### English
    /// Lifts the frame-rate cap.
    ///
    /// ### 中文
    /// 解除帧率上限。
    pub fn disable_fps_reduction(&self) {
        self.set_fps_reduction(f32::INFINITY);
    }

    /// ### English
    /// Drops every incoming frame until fps reduction is re-configured.
    ///
    /// ### 中文
    /// 丢弃所有到来的帧，直至重新配置 fps reduction。
    pub fn pause_video(&self) {
        self.set_fps_reduction(0.0);
    }

    /// ### English
    /// Clears the display surface to transparent black.
    ///
    /// ### 中文
    /// 把显示 surface 清为透明黑。
    pub fn clear_image(&self) {
        if let Some(handle) = &self.handle {
            handle.clear_image();
        }
    }

    /// ### English
    /// Toggles fixed-size display-surface mode. Main thread only.
    ///
    /// #### Parameters
    /// - `enabled`: Enable the fixed-size mode.
    ///
    /// ### 中文
    /// 切换固定尺寸显示 surface 模式。仅限主线程。
    ///
    /// #### 参数
    /// - `enabled`：是否启用固定尺寸模式。
    pub fn set_enable_hardware_scaler(&mut self, enabled: bool) {
        self.assert_main_thread();
        self.apply_pending_resolution();
        self.enable_fixed_size = enabled;
        self.update_surface_size();
    }

    /// ### English
    /// Applies one scaling policy to all frames and triggers re-layout.
    /// Main thread only.
    ///
    /// #### Parameters
    /// - `scaling`: Policy for all frames.
    ///
    /// ### 中文
    /// 对所有帧应用同一缩放策略并触发重新布局。仅限主线程。
    ///
    /// #### 参数
    /// - `scaling`：对所有帧生效的策略。
    pub fn set_scaling_type(&mut self, scaling: layout::ScalingType) {
        self.assert_main_thread();
        self.apply_pending_resolution();
        self.layout_measure.set_scaling_type(scaling);
        self.window_host.request_layout();
    }

    /// ### English
    /// Applies distinct scaling policies for matching and mismatching
    /// orientations and triggers re-layout. Main thread only.
    ///
    /// #### Parameters
    /// - `match_orientation`: Policy when frame and layout orientations match.
    /// - `mismatch_orientation`: Policy when they differ.
    ///
    /// ### 中文
    /// 为方向一致与不一致分别应用缩放策略并触发重新布局。仅限主线程。
    ///
    /// #### 参数
    /// - `match_orientation`：方向一致时的策略。
    /// - `mismatch_orientation`：方向不一致时的策略。
    pub fn set_scaling_types(
        &mut self,
        match_orientation: layout::ScalingType,
        mismatch_orientation: layout::ScalingType,
    ) {
        self.assert_main_thread();
        self.apply_pending_resolution();
        self.layout_measure
            .set_scaling_types(match_orientation, mismatch_orientation);
        self.window_host.request_layout();
    }

    /// ### English
    /// Producer entry point: forwards a frame to the render thread. Safe to
    /// call from any thread; never blocks. Frames arriving while the
    /// renderer is not initialized are dropped.
    ///
    /// #### Parameters
    /// - `frame`: Produced video frame.
    ///
    /// ### 中文
    /// 生产者入口：把帧转交渲染线程。可在任意线程调用；永不阻塞。
    /// 渲染器未初始化时到达的帧会被丢弃。
    ///
    /// #### 参数
    /// - `frame`：生产的视频帧。
    pub fn on_frame(&self, frame: VideoFrame) {
        let surface = lock(&self.input_slot).clone();
        if let Some(surface) = surface {
            surface.queue_frame(frame);
        }
    }

    /// ### English
    /// Blocks until the next drawn frame produces a bitmap of the requested
    /// size. Fails fast before the first rendered frame, and unblocks with an
    /// error if the renderer is released mid-wait.
    ///
    /// #### Parameters
    /// - `width`: Requested bitmap width.
    /// - `height`: Requested bitmap height.
    ///
    /// ### 中文
    /// 阻塞直到下一帧绘制产出请求尺寸的位图。首帧渲染前快速失败；
    /// 等待途中渲染器被释放则以错误解除阻塞。
    ///
    /// #### 参数
    /// - `width`：请求的位图宽度。
    /// - `height`：请求的位图高度。
    pub fn capture_still_image(&self, width: u32, height: u32) -> Result<RgbaImage, String> {
        let Some(handle) = &self.handle else {
            return Err("Renderer is not initialized".to_string());
        };
        if width == 0 || height == 0 {
            return Err(format!("Invalid capture size {width}x{height}"));
        }
        if !self.first_frame_rendered.load(Ordering::Acquire) {
            return Err("No frame rendered yet".to_string());
        }
        handle.capture_still(PhysicalSize::new(width, height))
    }

    /// ### English
    /// Binds or unbinds the video encoder. Takes effect before the next
    /// frame drawn after it in queue order.
    ///
    /// #### Parameters
    /// - `encoder`: Encoder to bind, or `None` to unbind.
    ///
    /// ### 中文
    /// 绑定或解绑视频编码器。对队列序中其后绘制的下一帧生效。
    ///
    /// #### 参数
    /// - `encoder`：要绑定的编码器；`None` 表示解绑。
    pub fn set_video_encoder(&self, encoder: Option<VideoEncoder>) {
        if let Some(handle) = &self.handle {
            handle.set_encoder(encoder);
        }
    }

    /// ### English
    /// Returns the producer-facing input surface, creating it through the
    /// rendezvous if needed. `None` when the renderer is not active.
    ///
    /// ### 中文
    /// 返回面向生产者的输入 surface；必要时经会合创建。
    /// 渲染器未激活时返回 `None`。
    pub fn get_surface_texture(&self) -> Option<PreviewSurface> {
        let handle = self.handle.as_ref()?;
        if !handle.is_active() {
            return None;
        }
        if let Some(surface) = lock(&self.input_slot).clone() {
            return Some(surface);
        }
        handle.create_surface()
    }

    /// ### English
    /// Alias of [`Self::get_surface_texture`].
    ///
    /// ### 中文
    /// [`Self::get_surface_texture`] 的别名。
    #[inline]
    pub fn get_surface(&self) -> Option<PreviewSurface> {
        self.get_surface_texture()
    }

    /// ### English
    /// Rendezvous: re-creates the input surface with a new default buffer
    /// size and waits for completion.
    ///
    /// #### Parameters
    /// - `width`: New default buffer width.
    /// - `height`: New default buffer height.
    ///
    /// ### 中文
    /// 会合：以新的默认缓冲尺寸重建输入 surface 并等待完成。
    ///
    /// #### 参数
    /// - `width`：新的默认缓冲宽度。
    /// - `height`：新的默认缓冲高度。
    pub fn resize(&self, width: u32, height: u32) {
        if let Some(handle) = &self.handle {
            handle.resize(PhysicalSize::new(width, height));
        }
    }

    /// ### English
    /// True iff a window surface is currently bound.
    ///
    /// ### 中文
    /// 当且仅当绑定了 window surface 时为 true。
    pub fn has_surface(&self) -> bool {
        self.has_surface_flag.load(Ordering::Acquire)
    }

    /// ### English
    /// Measures the view under the host's constraints. Main thread only;
    /// the host applies the returned dimensions.
    ///
    /// #### Parameters
    /// - `width_spec`: Horizontal constraint.
    /// - `height_spec`: Vertical constraint.
    ///
    /// ### 中文
    /// 在宿主约束下测量 view。仅限主线程；返回的尺寸由宿主应用。
    ///
    /// #### 参数
    /// - `width_spec`：水平约束。
    /// - `height_spec`：垂直约束。
    pub fn on_measure(
        &mut self,
        width_spec: MeasureSpec,
        height_spec: MeasureSpec,
    ) -> PhysicalSize<u32> {
        self.assert_main_thread();
        self.apply_pending_resolution();
        let size = self.layout_measure.measure(
            width_spec,
            height_spec,
            self.rotated_frame_width,
            self.rotated_frame_height,
        );
        log::debug!("onMeasure: new size {}x{}", size.width, size.height);
        size
    }

    /// ### English
    /// Layout hook: records the view bounds, pushes the layout aspect ratio
    /// to the render thread, and re-evaluates the surface size. Main thread
    /// only.
    ///
    /// #### Parameters
    /// - `left`: Left edge in the parent's coordinates.
    /// - `top`: Top edge.
    /// - `right`: Right edge.
    /// - `bottom`: Bottom edge.
    ///
    /// ### 中文
    /// 布局钩子：记录 view 边界，把布局宽高比推送到渲染线程，
    /// 并重新评估 surface 尺寸。仅限主线程。
    ///
    /// #### 参数
    /// - `left`：父坐标系中的左边界。
    /// - `top`：上边界。
    /// - `right`：右边界。
    /// - `bottom`：下边界。
    pub fn on_layout(&mut self, left: i32, top: i32, right: i32, bottom: i32) {
        self.assert_main_thread();
        self.apply_pending_resolution();
        self.view_width = (right - left).max(0) as u32;
        self.view_height = (bottom - top).max(0) as u32;
        let aspect = if bottom > top {
            (right - left) as f32 / (bottom - top) as f32
        } else {
            0.0
        };
        if let Some(handle) = &self.handle {
            handle.set_layout_aspect_ratio(aspect);
        }
        self.update_surface_size();
    }

    /// ### English
    /// Host surface hook: a native window now exists. Main thread only.
    /// The surface is bound once `surface_changed` reports its size.
    ///
    /// #### Parameters
    /// - `window`: Raw native window handle.
    ///
    /// ### 中文
    /// 宿主 surface 钩子：native 窗口已存在。仅限主线程。
    /// 待 `surface_changed` 报告尺寸后绑定 surface。
    ///
    /// #### 参数
    /// - `window`：原始 native 窗口句柄。
    pub fn surface_created(&mut self, window: usize) {
        self.assert_main_thread();
        self.apply_pending_resolution();
        self.window = Some(window);
        self.surface_width = 0;
        self.surface_height = 0;
        self.update_surface_size();
    }

    /// ### English
    /// Host surface hook: the window surface has a (new) size. Main thread
    /// only.
    ///
    /// #### Parameters
    /// - `width`: Surface width in physical pixels.
    /// - `height`: Surface height in physical pixels.
    ///
    /// ### 中文
    /// 宿主 surface 钩子：window surface 具有（新的）尺寸。仅限主线程。
    ///
    /// #### 参数
    /// - `width`：surface 物理像素宽度。
    /// - `height`：surface 物理像素高度。
    pub fn surface_changed(&mut self, width: u32, height: u32) {
        self.assert_main_thread();
        self.apply_pending_resolution();
        if let (Some(window), Some(handle)) = (self.window, &self.handle) {
            handle.bind_window(window, PhysicalSize::new(width, height));
            /// ### English
            /// The input surface tracks the view size: re-create it (via the
            /// rendezvous) when the dimensions changed.
            ///
            /// ### 中文
            /// 输入 surface 跟随 view 尺寸：尺寸变化时经会合重建。
            handle.resize(PhysicalSize::new(width, height));
        }
    }

    /// ### English
    /// Host surface hook: the window is going away. Blocks until the render
    /// thread has torn the window surface down. Main thread only.
    ///
    /// ### 中文
    /// 宿主 surface 钩子：窗口即将消失。阻塞直到渲染线程销毁 window surface。
    /// 仅限主线程。
    pub fn surface_destroyed(&mut self) {
        self.assert_main_thread();
        self.window = None;
        if let Some(handle) = &self.handle {
            handle.unbind_window();
        }
    }

    /// ### English
    /// Rotated frame size as currently known to layout.
    ///
    /// ### 中文
    /// 布局当前已知的旋转后帧尺寸。
    pub fn rotated_frame_size(&self) -> PhysicalSize<u32> {
        PhysicalSize::new(self.rotated_frame_width, self.rotated_frame_height)
    }

    /// ### English
    /// Most recent frame rotation known to layout.
    ///
    /// ### 中文
    /// 布局已知的最近帧旋转。
    pub fn frame_rotation(&self) -> FrameRotation {
        self.frame_rotation
    }

    /// ### English
    /// Drains the pending resolution from the render thread and applies the
    /// rotation-dimension law. Runs at the start of every main-thread entry
    /// point, so an update posted from the render thread lands at the next
    /// main-thread call, and an update observed on the main thread applies
    /// inline.
    ///
    /// ### 中文
    /// drain 渲染线程发布的分辨率，并应用旋转-尺寸法则。在每个主线程入口
    /// 开头执行：渲染线程发布的更新在下一次主线程调用时落地，
    /// 主线程观察到的更新则就地生效。
    fn apply_pending_resolution(&mut self) {
        let Some((width, height, rotation)) = self.pending_resolution.take() else {
            return;
        };
        if rotation.swaps_dimensions() {
            self.rotated_frame_width = height;
            self.rotated_frame_height = width;
        } else {
            self.rotated_frame_width = width;
            self.rotated_frame_height = height;
        }
        self.frame_rotation = rotation;
        self.update_surface_size();
        self.window_host.request_layout();
    }

    /// ### English
    /// Re-evaluates the display-surface size request.
    ///
    /// In fixed-size mode with known frame and view sizes, computes the
    /// drawn-frame size that preserves aspect ratio, clamps it to the view,
    /// and pushes a fixed-size request only when it changed. Otherwise the
    /// surface tracks the layout.
    ///
    /// ### 中文
    /// 重新评估显示 surface 的尺寸请求。
    ///
    /// 固定尺寸模式下，若帧与 view 尺寸均已知，则计算保持宽高比的绘制帧
    /// 尺寸并钳制到 view，仅在发生变化时推送固定尺寸请求。
    /// 否则 surface 跟随布局。
    fn update_surface_size(&mut self) {
        self.assert_main_thread();
        if self.enable_fixed_size
            && self.rotated_frame_width != 0
            && self.rotated_frame_height != 0
            && self.view_width != 0
            && self.view_height != 0
        {
            let layout_aspect = self.view_width as f32 / self.view_height as f32;
            let frame_aspect = self.rotated_frame_width as f32 / self.rotated_frame_height as f32;
            let (drawn_width, drawn_height) = if frame_aspect > layout_aspect {
                (
                    (self.rotated_frame_height as f32 * layout_aspect) as u32,
                    self.rotated_frame_height,
                )
            } else {
                (
                    self.rotated_frame_width,
                    (self.rotated_frame_width as f32 / layout_aspect) as u32,
                )
            };
            let width = self.view_width.min(drawn_width);
            let height = self.view_height.min(drawn_height);
            log::debug!(
                "updateSurfaceSize: layout {}x{}, frame {}x{}, requested {}x{}, old {}x{}",
                self.view_width,
                self.view_height,
                self.rotated_frame_width,
                self.rotated_frame_height,
                width,
                height,
                self.surface_width,
                self.surface_height,
            );
            if width != self.surface_width || height != self.surface_height {
                self.surface_width = width;
                self.surface_height = height;
                self.window_host
                    .set_fixed_size(PhysicalSize::new(width, height));
            }
        } else {
            self.surface_width = 0;
            self.surface_height = 0;
            self.window_host.set_size_from_layout();
        }
    }

    /// ### English
    /// Debug assertion that the caller is on the renderer's main thread.
    ///
    /// ### 中文
    /// debug 断言：调用方处于渲染器的主线程。
    fn assert_main_thread(&self) {
        debug_assert_eq!(
            thread::current().id(),
            self.main_thread,
            "must be called on the renderer's main thread",
        );
    }
}

impl Drop for ViewRenderer {
    /// ### English
    /// Ensures the render thread is torn down with the renderer.
    ///
    /// ### 中文
    /// 确保渲染线程随渲染器一并销毁。
    fn drop(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            handle.release();
        }
    }
}

/// ### English
/// Locks a mutex, recovering the guard from a poisoned lock.
///
/// ### 中文
/// 加锁 mutex；若锁已 poison 则恢复 guard。
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    /// Recording window host used to observe surface-size requests.
    #[derive(Default)]
    struct RecordingHost {
        fixed_size_requests: StdMutex<Vec<PhysicalSize<u32>>>,
        size_from_layout_requests: StdMutex<u32>,
        layout_requests: StdMutex<u32>,
    }

    impl WindowHost for RecordingHost {
        fn set_fixed_size(&self, size: PhysicalSize<u32>) {
            self.fixed_size_requests.lock().unwrap().push(size);
        }

        fn set_size_from_layout(&self) {
            *self.size_from_layout_requests.lock().unwrap() += 1;
        }

        fn request_layout(&self) {
            *self.layout_requests.lock().unwrap() += 1;
        }
    }

    fn renderer_with_host() -> (ViewRenderer, Arc<RecordingHost>) {
        let host = Arc::new(RecordingHost::default());
        (ViewRenderer::new(host.clone()), host)
    }

    #[test]
    fn rotation_swaps_dimensions_in_layout_state() {
        let (mut renderer, host) = renderer_with_host();
        renderer.pending_resolution.set(640, 480, FrameRotation::Deg90);
        renderer.on_measure(MeasureSpec::AtMost(1280), MeasureSpec::AtMost(720));
        assert_eq!(renderer.rotated_frame_size(), PhysicalSize::new(480, 640));
        assert_eq!(renderer.frame_rotation(), FrameRotation::Deg90);
        assert!(*host.layout_requests.lock().unwrap() >= 1);
    }

    #[test]
    fn later_resolution_never_loses_to_earlier_one() {
        let (mut renderer, _host) = renderer_with_host();
        renderer.pending_resolution.set(640, 480, FrameRotation::Deg0);
        renderer.pending_resolution.set(800, 600, FrameRotation::Deg0);
        renderer.on_layout(0, 0, 1280, 720);
        assert_eq!(renderer.rotated_frame_size(), PhysicalSize::new(800, 600));
    }

    #[test]
    fn fixed_size_request_is_issued_once_for_identical_inputs() {
        let (mut renderer, host) = renderer_with_host();
        renderer.on_layout(0, 0, 1280, 720);
        renderer.pending_resolution.set(640, 480, FrameRotation::Deg0);
        renderer.set_enable_hardware_scaler(true);

        // The requested surface keeps the view's aspect ratio at the frame's
        // resolution scale: 640 wide, 640 / (1280/720) = 360 tall.
        let requests = host.fixed_size_requests.lock().unwrap().clone();
        assert_eq!(requests, vec![PhysicalSize::new(640, 360)]);

        // Identical inputs must not produce a second request.
        renderer.set_enable_hardware_scaler(true);
        renderer.on_layout(0, 0, 1280, 720);
        let requests = host.fixed_size_requests.lock().unwrap().clone();
        assert_eq!(requests.len(), 1);
    }

    #[test]
    fn disabled_scaler_tracks_layout() {
        let (mut renderer, host) = renderer_with_host();
        renderer.on_layout(0, 0, 1280, 720);
        assert!(host.fixed_size_requests.lock().unwrap().is_empty());
        assert!(*host.size_from_layout_requests.lock().unwrap() >= 1);
    }

    #[test]
    fn frame_before_init_is_dropped() {
        let (renderer, _host) = renderer_with_host();
        let buffer = Arc::new(crate::engine::frame::FrameBuffer::new(2, 2, vec![0u8; 16]).unwrap());
        // Must not panic or block; there is no input surface yet.
        renderer.on_frame(VideoFrame::new(buffer, FrameRotation::Deg0, 0));
        assert!(renderer.get_surface_texture().is_none());
        assert!(!renderer.has_surface());
    }

    #[test]
    fn capture_before_init_fails_fast() {
        let (renderer, _host) = renderer_with_host();
        assert!(renderer.capture_still_image(320, 240).is_err());
    }

    #[test]
    fn measure_uses_rotated_dimensions() {
        let (mut renderer, _host) = renderer_with_host();
        renderer.set_scaling_type(layout::ScalingType::AspectFit);
        renderer.pending_resolution.set(640, 480, FrameRotation::Deg90);
        // Rotated 480×640 frame in a 720×1280 portrait box fits at 720×960.
        let size = renderer.on_measure(MeasureSpec::AtMost(720), MeasureSpec::AtMost(1280));
        assert_eq!(size, PhysicalSize::new(720, 960));
    }
}
