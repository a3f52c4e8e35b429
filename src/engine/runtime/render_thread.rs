//! ### English
//! Dedicated render thread: owns the GL context, the drawer, the input
//! surface, and the encoder binding, and services the command queue.
//!
//! ### 中文
//! 独立渲染线程：持有 GL 上下文、绘制器、输入 surface 与编码器绑定，
//! 并服务命令队列。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use dpi::PhysicalSize;
use glow::HasContext as _;
use image::RgbaImage;
use image::imageops::{self, FilterType};

use crate::engine::encoder::{RenderContextHandle, VideoEncoder};
use crate::engine::events::{self, RendererEvents};
use crate::engine::fps::FpsCounter;
use crate::engine::frame::FrameRotation;
use crate::engine::lockfree::{OneShot, PendingResolution};
use crate::engine::matrix;
use crate::engine::rendering::drawer::{self, DrawerFactory, FrameDrawer, GlDrawer};
use crate::engine::rendering::egl::{ConfigAttributes, EglContext, SwapError};
use crate::engine::rendering::input::{InputSurface, PreviewSurface};
use crate::engine::runtime::command::Command;
use crate::engine::runtime::queue::CommandQueue;

/// ### English
/// Interval between frame-rate diagnostics log lines.
///
/// ### 中文
/// 帧率诊断日志的输出间隔。
const FPS_LOG_INTERVAL: Duration = Duration::from_secs(4);

/// ### English
/// Everything the render thread needs at startup. All fields cross the
/// thread boundary exactly once, at spawn.
///
/// ### 中文
/// 渲染线程启动所需的全部内容。所有字段仅在 spawn 时跨线程一次。
pub(crate) struct RenderThreadLaunch {
    /// ### English
    /// Optional foreign share-context token recorded for encoder interop.
    ///
    /// ### 中文
    /// 可选的外部共享上下文令牌，为编码器互通记录。
    pub(crate) shared_context: Option<RenderContextHandle>,
    /// ### English
    /// Requested context configuration.
    ///
    /// ### 中文
    /// 请求的上下文配置。
    pub(crate) config_attributes: ConfigAttributes,
    /// ### English
    /// Optional custom drawer factory; the default quad drawer is used when
    /// absent.
    ///
    /// ### 中文
    /// 可选的自定义绘制器工厂；缺省时使用默认四边形绘制器。
    pub(crate) drawer_factory: Option<DrawerFactory>,
    /// ### English
    /// Optional events listener.
    ///
    /// ### 中文
    /// 可选的事件监听器。
    pub(crate) events: Option<Arc<dyn RendererEvents>>,
    /// ### English
    /// Command queue this thread drains.
    ///
    /// ### 中文
    /// 该线程 drain 的命令队列。
    pub(crate) queue: Arc<CommandQueue>,
    /// ### English
    /// Frame-available diagnostics counter.
    ///
    /// ### 中文
    /// frame-available 诊断计数器。
    pub(crate) fps: Arc<FpsCounter>,
    /// ### English
    /// Latest-wins resolution cell drained by the main thread.
    ///
    /// ### 中文
    /// 由主线程 drain 的 latest-wins 分辨率单元。
    pub(crate) pending_resolution: Arc<PendingResolution>,
    /// ### English
    /// Slot holding the live producer handle; updated whenever the input
    /// surface is (re)created, cleared at release.
    ///
    /// ### 中文
    /// 存放存活生产者句柄的槽位；输入 surface（重新）创建时更新，
    /// release 时清空。
    pub(crate) input_slot: Arc<Mutex<Option<PreviewSurface>>>,
    /// ### English
    /// Derived state: true iff a window surface is currently bound.
    ///
    /// ### 中文
    /// 派生状态：当且仅当绑定了 window surface 时为 true。
    pub(crate) has_surface: Arc<AtomicBool>,
    /// ### English
    /// Set after the first successful swap of this init cycle.
    ///
    /// ### 中文
    /// 本 init 周期首次成功 swap 后置位。
    pub(crate) first_frame_rendered: Arc<AtomicBool>,
    /// ### English
    /// Initial default buffer size for the input surface (the view size).
    ///
    /// ### 中文
    /// 输入 surface 的初始默认缓冲尺寸（view 尺寸）。
    pub(crate) initial_size: PhysicalSize<u32>,
    /// ### English
    /// Startup rendezvous completed once init succeeds or fails.
    ///
    /// ### 中文
    /// 启动会合：init 成功或失败后完成。
    pub(crate) init_signal: Arc<OneShot<Result<(), String>>>,
}

/// ### English
/// Render thread entry function. Runs init, signals the spawner, services
/// the message loop, then tears everything down in order.
///
/// ### 中文
/// 渲染线程入口函数。执行 init、通知 spawn 方、服务消息循环，
/// 最后按序销毁全部资源。
pub(crate) fn run_render_thread(launch: RenderThreadLaunch) {
    let init_signal = launch.init_signal.clone();
    let queue = launch.queue.clone();

    let mut state = match RenderState::init(launch) {
        Ok(state) => state,
        Err(err) => {
            let _ = init_signal.send(Err(err));
            queue.close();
            return;
        }
    };

    let _ = init_signal.send(Ok(()));
    log::debug!("Render thread started");

    state.run();

    state.release();
    /// ### English
    /// Closing the queue completes any rendezvous that arrived too late to
    /// be serviced, so no caller stays blocked on a dead thread.
    ///
    /// ### 中文
    /// 关闭队列会补完所有来不及服务的会合，确保没有调用方阻塞在已退出的
    /// 线程上。
    queue.close();
    log::debug!("Render thread finished");
}

/// ### English
/// Pending still-capture request (single slot, cleared at each rendezvous).
///
/// ### 中文
/// 待处理的静态截图请求（单槽位，每次会合后清空）。
struct CaptureRequest {
    /// ### English
    /// Requested bitmap dimensions.
    ///
    /// ### 中文
    /// 请求的位图尺寸。
    size: PhysicalSize<u32>,
    /// ### English
    /// Rendezvous slot the caller waits on.
    ///
    /// ### 中文
    /// 调用方等待的会合槽位。
    response: Arc<OneShot<Result<RgbaImage, String>>>,
}

/// ### English
/// Encoder binding plus the once-per-binding context push state.
///
/// ### 中文
/// 编码器绑定，以及“每次绑定推送一次上下文”的状态。
struct EncoderBinding {
    /// ### English
    /// The bound encoder variant.
    ///
    /// ### 中文
    /// 绑定的编码器变体。
    encoder: VideoEncoder,
    /// ### English
    /// Whether the hardware variant already received `(context, texture)`.
    ///
    /// ### 中文
    /// 硬件变体是否已收到 `(context, texture)`。
    context_pushed: bool,
}

/// ### English
/// Frame-rate cap applied on the render thread.
///
/// ### 中文
/// 渲染线程侧应用的帧率上限。
enum FpsPolicy {
    /// ### English
    /// Draw every frame.
    ///
    /// ### 中文
    /// 每帧都绘制。
    Unlimited,
    /// ### English
    /// Drop every frame (video paused).
    ///
    /// ### 中文
    /// 丢弃所有帧（视频暂停）。
    DropAll,
    /// ### English
    /// Draw at most once per `min_period`.
    ///
    /// ### 中文
    /// 每 `min_period` 至多绘制一次。
    Limited {
        /// ### English
        /// Minimum period between draws.
        ///
        /// ### 中文
        /// 两次绘制的最小间隔。
        min_period: Duration,
        /// ### English
        /// Earliest instant the next draw may happen.
        ///
        /// ### 中文
        /// 下一次绘制允许的最早时刻。
        next_render: Instant,
    },
}

/// ### English
/// State owned exclusively by the render thread.
///
/// ### 中文
/// 渲染线程独占持有的状态。
struct RenderState {
    egl: EglContext,
    drawer: Box<dyn FrameDrawer>,
    input: Option<InputSurface>,
    encoder: Option<EncoderBinding>,
    mirror: bool,
    layout_aspect_ratio: f32,
    fps_policy: FpsPolicy,
    pending_capture: Option<CaptureRequest>,
    view_size: PhysicalSize<u32>,
    last_resolution: Option<(u32, u32, FrameRotation)>,
    first_frame_rendered: bool,
    fps_log_at: Instant,
    events: Option<Arc<dyn RendererEvents>>,
    queue: Arc<CommandQueue>,
    fps: Arc<FpsCounter>,
    pending_resolution: Arc<PendingResolution>,
    input_slot: Arc<Mutex<Option<PreviewSurface>>>,
    has_surface: Arc<AtomicBool>,
    first_frame_flag: Arc<AtomicBool>,
}

impl RenderState {
    /// ### English
    /// Creates the context, makes it current, constructs the drawer, and
    /// creates the initial input texture/surface pair.
    ///
    /// #### Parameters
    /// - `launch`: Startup bundle from the spawner.
    ///
    /// ### 中文
    /// 创建上下文并使其 current，构造绘制器，创建初始的输入纹理/surface 组合。
    ///
    /// #### 参数
    /// - `launch`：spawn 方提供的启动参数包。
    fn init(launch: RenderThreadLaunch) -> Result<Self, String> {
        let egl = EglContext::create(&launch.config_attributes, launch.shared_context)?;
        egl.make_current()?;
        let drawer: Box<dyn FrameDrawer> = match launch.drawer_factory {
            Some(factory) => factory(egl.gl(), egl.is_gles())?,
            None => Box::new(GlDrawer::new(egl.gl(), egl.is_gles())?),
        };

        let mut state = Self {
            egl,
            drawer,
            input: None,
            encoder: None,
            mirror: false,
            layout_aspect_ratio: 0.0,
            fps_policy: FpsPolicy::Unlimited,
            pending_capture: None,
            view_size: PhysicalSize::new(
                launch.initial_size.width.max(1),
                launch.initial_size.height.max(1),
            ),
            last_resolution: None,
            first_frame_rendered: false,
            fps_log_at: Instant::now(),
            events: launch.events,
            queue: launch.queue,
            fps: launch.fps,
            pending_resolution: launch.pending_resolution,
            input_slot: launch.input_slot,
            has_surface: launch.has_surface,
            first_frame_flag: launch.first_frame_rendered,
        };
        state.update_input_surface()?;
        Ok(state)
    }

    /// ### English
    /// Message loop. Returns on `Terminate`, queue closure, or fatal error.
    ///
    /// ### 中文
    /// 消息循环。在 `Terminate`、队列关闭或致命错误时返回。
    fn run(&mut self) {
        loop {
            let Some(command) = self.queue.pop() else {
                break;
            };
            let result = match command {
                Command::Render => self.on_draw_frame(),
                Command::SetEncoder(encoder) => {
                    self.encoder = encoder.map(|encoder| EncoderBinding {
                        encoder,
                        context_pushed: false,
                    });
                    Ok(())
                }
                Command::CreateSurface { response } => match self.update_input_surface() {
                    Ok(()) => {
                        let handle = self.input.as_ref().map(InputSurface::handle);
                        let _ = response
                            .send(handle.ok_or_else(|| "No input surface".to_string()));
                        Ok(())
                    }
                    Err(err) => {
                        let _ = response.send(Err(err.clone()));
                        Err(err)
                    }
                },
                Command::Resize { size, response } => {
                    let result = self.resize(size);
                    let _ = response.send(());
                    result
                }
                Command::SetMirror(mirror) => {
                    self.mirror = mirror;
                    Ok(())
                }
                Command::SetFpsReduction(fps) => {
                    self.set_fps_reduction(fps);
                    Ok(())
                }
                Command::SetLayoutAspectRatio(aspect) => {
                    self.layout_aspect_ratio = aspect;
                    Ok(())
                }
                Command::ClearImage => self.clear_image(),
                Command::CaptureStill { size, response } => {
                    /// ### English
                    /// Single capture slot: a superseded request is completed
                    /// with an error rather than silently dropped.
                    ///
                    /// ### 中文
                    /// 单一截图槽位：被替换的请求以错误完成，而不是被静默丢弃。
                    if let Some(previous) = self.pending_capture.take() {
                        let _ = previous
                            .response
                            .send(Err("Capture superseded by a newer request".to_string()));
                    }
                    self.pending_capture = Some(CaptureRequest { size, response });
                    Ok(())
                }
                Command::BindWindow { window, size } => self.bind_window(window, size),
                Command::UnbindWindow { response } => {
                    let result = self.unbind_window();
                    let _ = response.send(());
                    result
                }
                Command::Terminate => break,
            };
            if let Err(err) = result {
                self.report_fatal(&err);
                break;
            }
        }
    }

    /// ### English
    /// Draw protocol for one frame.
    ///
    /// ### 中文
    /// 单帧的绘制协议。
    fn on_draw_frame(&mut self) -> Result<(), String> {
        self.log_fps();
        /// ### English
        /// Transient surface loss: rendering pauses until a window arrives.
        ///
        /// ### 中文
        /// 瞬态 surface 丢失：渲染暂停，直到窗口到来。
        if !self.egl.has_window() {
            return Ok(());
        }
        if !self.fps_allows_draw() {
            return Ok(());
        }

        /// ### English
        /// 1) Bind context and surface to this thread.
        ///
        /// ### 中文
        /// 1) 把上下文与 surface 绑定到本线程。
        self.egl.make_current()?;
        let Some(input) = self.input.as_mut() else {
            return Ok(());
        };

        /// ### English
        /// 2) Pull the most recent camera frame into the texture.
        ///
        /// ### 中文
        /// 2) 把最新的摄像头帧拉入纹理。
        let gl = self.egl.gl();
        input.update_tex_image(&gl)?;

        /// ### English
        /// 3) Snapshot the same-frame transform and fold in mirroring and
        /// layout cropping.
        ///
        /// ### 中文
        /// 3) 快照同帧变换，并叠加镜像与布局裁剪。
        let resolution = input.resolution();
        let texture_id = input.texture_id();
        let frame_transform = input.transform();
        let frame_aspect = resolution.map_or(0.0, |(width, height, rotation)| {
            let (w, h) = if rotation.swaps_dimensions() {
                (height, width)
            } else {
                (width, height)
            };
            if h == 0 { 0.0 } else { w as f32 / h as f32 }
        });
        let transform = matrix::multiply(
            &frame_transform,
            &matrix::layout(self.mirror, frame_aspect, self.layout_aspect_ratio),
        );

        if resolution.is_none() {
            /// ### English
            /// Nothing was ever produced; there is no frame to draw.
            ///
            /// ### 中文
            /// 尚未生产任何帧；没有可绘制的内容。
            return Ok(());
        }
        self.publish_resolution_change(resolution);

        /// ### English
        /// 4) Notify the encoder before the on-screen draw/swap.
        ///
        /// ### 中文
        /// 4) 在上屏绘制/swap 之前通知编码器。
        if let Some(binding) = self.encoder.as_mut() {
            match &binding.encoder {
                VideoEncoder::HardwareVideo(encoder) => {
                    if !binding.context_pushed {
                        encoder.set_gl_context(self.egl.context_handle(), texture_id);
                        binding.context_pushed = true;
                    }
                    encoder.frame_available_soon(&transform);
                }
                VideoEncoder::Generic(encoder) => encoder.frame_available_soon(),
            }
        }

        /// ### English
        /// 5) Draw the quad onto the window surface.
        ///
        /// ### 中文
        /// 5) 把四边形绘制到 window surface。
        self.egl.bind_draw_target()?;
        self.drawer.draw(texture_id, &transform, 0)?;

        /// ### English
        /// Readback happens while the drawn buffer is still the back buffer;
        /// the waiter is only resumed after the swap below.
        ///
        /// ### 中文
        /// 读回发生在绘制内容仍是后备缓冲时；等待方在下面的 swap 之后才被唤醒。
        let capture = match self.pending_capture.take() {
            Some(request) => {
                let bitmap = self.read_back(request.size);
                Some((request, bitmap))
            }
            None => None,
        };

        /// ### English
        /// 6) Present.
        ///
        /// ### 中文
        /// 6) 呈现。
        match self.egl.swap() {
            Ok(()) => {
                if !self.first_frame_rendered {
                    self.first_frame_rendered = true;
                    self.first_frame_flag.store(true, Ordering::Release);
                    if let Some(events) = &self.events {
                        let events = events.clone();
                        events::dispatch("on_first_frame_rendered", move || {
                            events.on_first_frame_rendered();
                        });
                    }
                }
            }
            Err(SwapError::SurfaceLost) => {
                self.has_surface.store(false, Ordering::Release);
            }
            Err(SwapError::Fatal(err)) => {
                if let Some((request, _)) = capture {
                    let _ = request.response.send(Err("Renderer is released".to_string()));
                }
                return Err(err);
            }
        }

        /// ### English
        /// 7) Fulfil a pending still-capture rendezvous.
        ///
        /// ### 中文
        /// 7) 完成待处理的静态截图会合。
        if let Some((request, bitmap)) = capture {
            let _ = request.response.send(bitmap);
        }
        Ok(())
    }

    /// ### English
    /// Publishes `(width, height, rotation)` to the main thread and the
    /// events listener when it differs from the last observation.
    ///
    /// #### Parameters
    /// - `resolution`: Resolution of the frame just uploaded.
    ///
    /// ### 中文
    /// 当与上次观察不同时，把 `(width, height, rotation)` 发布给主线程与
    /// 事件监听器。
    ///
    /// #### 参数
    /// - `resolution`：刚上传帧的分辨率。
    fn publish_resolution_change(&mut self, resolution: Option<(u32, u32, FrameRotation)>) {
        let Some((width, height, rotation)) = resolution else {
            return;
        };
        if self.last_resolution == Some((width, height, rotation)) {
            return;
        }
        self.last_resolution = Some((width, height, rotation));
        self.pending_resolution.set(width, height, rotation);
        if let Some(events) = &self.events {
            let events = events.clone();
            events::dispatch("on_frame_resolution_changed", move || {
                events.on_frame_resolution_changed(width, height, rotation);
            });
        }
    }

    /// ### English
    /// Applies the frame-rate cap; returns whether this frame may be drawn.
    ///
    /// ### 中文
    /// 应用帧率上限；返回本帧是否允许绘制。
    fn fps_allows_draw(&mut self) -> bool {
        match &mut self.fps_policy {
            FpsPolicy::Unlimited => true,
            FpsPolicy::DropAll => false,
            FpsPolicy::Limited {
                min_period,
                next_render,
            } => {
                let now = Instant::now();
                if now < *next_render {
                    return false;
                }
                *next_render = now + *min_period;
                true
            }
        }
    }

    /// ### English
    /// Maps an fps value onto the cap policy (`0` pauses, infinity lifts the
    /// cap).
    ///
    /// #### Parameters
    /// - `fps`: Requested maximum frame rate.
    ///
    /// ### 中文
    /// 把 fps 值映射到上限策略（`0` 暂停，无穷大解除上限）。
    ///
    /// #### 参数
    /// - `fps`：请求的最大帧率。
    fn set_fps_reduction(&mut self, fps: f32) {
        self.fps_policy = if fps <= 0.0 {
            log::debug!("Video paused (fps reduction 0)");
            FpsPolicy::DropAll
        } else if fps.is_finite() {
            FpsPolicy::Limited {
                min_period: Duration::from_secs_f32(1.0 / fps),
                next_render: Instant::now(),
            }
        } else {
            FpsPolicy::Unlimited
        };
    }

    /// ### English
    /// (Re)creates the input texture and surface together, publishing the
    /// new producer handle. The previous pair is explicitly released first.
    ///
    /// ### 中文
    /// 一并（重新）创建输入纹理与 surface，并发布新的生产者句柄。
    /// 旧的组合会先被显式释放。
    fn update_input_surface(&mut self) -> Result<(), String> {
        self.egl.make_current()?;
        if let Some(old) = self.input.take() {
            old.detach();
            self.drawer.delete_tex(old.texture_id());
        }
        let texture_id = self.drawer.init_tex()?;
        log::debug!("Input surface created, texture id {texture_id}");
        let input = InputSurface::new(
            texture_id,
            self.view_size,
            self.queue.clone(),
            self.fps.clone(),
        );
        let handle = input.handle();
        self.input = Some(input);
        *lock(&self.input_slot) = Some(handle);
        Ok(())
    }

    /// ### English
    /// Re-runs the input-surface creation with a new default buffer size if
    /// the dimensions actually changed.
    ///
    /// #### Parameters
    /// - `size`: Requested default buffer size.
    ///
    /// ### 中文
    /// 若尺寸确实变化，则以新的默认缓冲尺寸重建输入 surface。
    ///
    /// #### 参数
    /// - `size`：请求的默认缓冲尺寸。
    fn resize(&mut self, size: PhysicalSize<u32>) -> Result<(), String> {
        if size.width > 0 && size.height > 0 && size != self.view_size {
            self.view_size = size;
            self.update_input_surface()
        } else {
            Ok(())
        }
    }

    /// ### English
    /// Binds (or re-binds after a size change) the on-screen window.
    ///
    /// #### Parameters
    /// - `window`: Raw native window handle.
    /// - `size`: Window size in physical pixels.
    ///
    /// ### 中文
    /// 绑定上屏窗口（或在尺寸变化后重新绑定）。
    ///
    /// #### 参数
    /// - `window`：原始 native 窗口句柄。
    /// - `size`：窗口物理像素尺寸。
    fn bind_window(&mut self, window: usize, size: PhysicalSize<u32>) -> Result<(), String> {
        self.egl.bind_window(window, size)?;
        self.has_surface.store(true, Ordering::Release);
        log::debug!("Window surface bound at {}x{}", size.width, size.height);
        Ok(())
    }

    /// ### English
    /// Tears the window surface down; rendering pauses.
    ///
    /// ### 中文
    /// 销毁 window surface；渲染暂停。
    fn unbind_window(&mut self) -> Result<(), String> {
        self.egl.unbind_window()?;
        self.has_surface.store(false, Ordering::Release);
        Ok(())
    }

    /// ### English
    /// Clears the on-screen surface to transparent black and presents.
    ///
    /// ### 中文
    /// 把上屏 surface 清为透明黑并呈现。
    fn clear_image(&mut self) -> Result<(), String> {
        if !self.egl.has_window() {
            return Ok(());
        }
        self.egl.make_current()?;
        self.egl.bind_draw_target()?;
        let gl = self.egl.gl();
        unsafe {
            gl.clear_color(0.0, 0.0, 0.0, 0.0);
            gl.clear(glow::COLOR_BUFFER_BIT);
        }
        match self.egl.swap() {
            Ok(()) => Ok(()),
            Err(SwapError::SurfaceLost) => {
                self.has_surface.store(false, Ordering::Release);
                Ok(())
            }
            Err(SwapError::Fatal(err)) => Err(err),
        }
    }

    /// ### English
    /// Reads the drawn surface back into a bitmap of the requested size
    /// (vertically flipped to top-down row order, scaled if necessary).
    ///
    /// #### Parameters
    /// - `target`: Requested bitmap dimensions.
    ///
    /// ### 中文
    /// 把已绘制的 surface 读回为请求尺寸的位图（垂直翻转为自上而下的行序，
    /// 必要时缩放）。
    ///
    /// #### 参数
    /// - `target`：请求的位图尺寸。
    fn read_back(&mut self, target: PhysicalSize<u32>) -> Result<RgbaImage, String> {
        let surface_size = self.egl.bind_draw_target()?;
        let (width, height) = (surface_size.width, surface_size.height);
        if width == 0 || height == 0 {
            return Err("Window surface has no pixels to read".to_string());
        }
        let gl = self.egl.gl();
        let mut pixels = vec![0u8; width as usize * height as usize * 4];
        unsafe {
            gl.read_pixels(
                0,
                0,
                width as i32,
                height as i32,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelPackData::Slice(Some(&mut pixels)),
            );
        }
        drawer::check_gl_error(&gl, "capture readback")?;

        /// ### English
        /// GL reads bottom-up; swap rows into top-down order.
        ///
        /// ### 中文
        /// GL 自下而上读取；把行交换为自上而下的顺序。
        let stride = width as usize * 4;
        let rows = height as usize;
        for y in 0..rows / 2 {
            let top_start = y * stride;
            let bottom_start = (rows - y - 1) * stride;
            let (head, tail) = pixels.split_at_mut(bottom_start);
            let top = &mut head[top_start..top_start + stride];
            let bottom = &mut tail[..stride];
            top.swap_with_slice(bottom);
        }

        let image = RgbaImage::from_raw(width, height, pixels)
            .ok_or("Failed to assemble capture bitmap")?;
        if (width, height) == (target.width, target.height) {
            Ok(image)
        } else {
            Ok(imageops::resize(
                &image,
                target.width,
                target.height,
                FilterType::Triangle,
            ))
        }
    }

    /// ### English
    /// Logs the measured frame-available rate at a fixed interval.
    ///
    /// ### 中文
    /// 按固定间隔记录实测的帧到达速率。
    fn log_fps(&mut self) {
        let elapsed = self.fps_log_at.elapsed();
        if elapsed < FPS_LOG_INTERVAL {
            return;
        }
        let frames = self.fps.take_frames();
        log::debug!("Input rate {:.1} fps", FpsCounter::rate(frames, elapsed));
        self.fps_log_at = Instant::now();
    }

    /// ### English
    /// Reports a fatal error through the events listener's error channel.
    ///
    /// #### Parameters
    /// - `message`: Failure description.
    ///
    /// ### 中文
    /// 通过事件监听器的错误通道上报致命错误。
    ///
    /// #### 参数
    /// - `message`：失败描述。
    fn report_fatal(&self, message: &str) {
        log::error!("Fatal render error: {message}");
        if let Some(events) = &self.events {
            let events = events.clone();
            let message = message.to_string();
            events::dispatch("on_render_error", move || {
                events.on_render_error(&message);
            });
        }
    }

    /// ### English
    /// Ordered teardown: capture waiter, drawer, input surface, input
    /// texture, window surface, context.
    ///
    /// ### 中文
    /// 有序销毁：截图等待方、绘制器、输入 surface、输入纹理、window surface、
    /// 上下文。
    fn release(mut self) {
        if let Some(request) = self.pending_capture.take() {
            let _ = request
                .response
                .send(Err("Renderer is released".to_string()));
        }
        let _ = self.egl.make_current();
        let gl = self.egl.gl();

        self.drawer.release();
        let input = self.input.take();
        if let Some(input) = &input {
            input.detach();
        }
        lock(&self.input_slot).take();
        if let Some(input) = input {
            drawer::delete_texture(&gl, input.texture_id());
        }
        self.egl.release();
        self.has_surface.store(false, Ordering::Release);
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
