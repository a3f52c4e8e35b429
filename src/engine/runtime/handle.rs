//! ### English
//! Cross-thread handle that spawns and drives the render thread.
//!
//! ### 中文
//! 创建并驱动渲染线程的跨线程句柄。

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use dpi::PhysicalSize;
use image::RgbaImage;

use crate::engine::encoder::{RenderContextHandle, VideoEncoder};
use crate::engine::events::RendererEvents;
use crate::engine::fps::FpsCounter;
use crate::engine::lockfree::{OneShot, PendingResolution};
use crate::engine::rendering::drawer::DrawerFactory;
use crate::engine::rendering::egl::ConfigAttributes;
use crate::engine::rendering::input::PreviewSurface;
use crate::engine::runtime::command::Command;
use crate::engine::runtime::queue::CommandQueue;
use crate::engine::runtime::render_thread::{self, RenderThreadLaunch};

/// ### English
/// Bound on how long startup may take before the spawner gives up.
///
/// ### 中文
/// 启动允许的最长等待时间，超时后 spawn 方放弃。
const INIT_TIMEOUT: Duration = Duration::from_secs(30);

/// ### English
/// Shared state the view renderer and the render thread both touch.
///
/// ### 中文
/// view 渲染器与渲染线程都会触及的共享状态。
pub(crate) struct RenderHandleLaunch {
    /// ### English
    /// Optional foreign share-context token.
    ///
    /// ### 中文
    /// 可选的外部共享上下文令牌。
    pub(crate) shared_context: Option<RenderContextHandle>,
    /// ### English
    /// Requested context configuration.
    ///
    /// ### 中文
    /// 请求的上下文配置。
    pub(crate) config_attributes: ConfigAttributes,
    /// ### English
    /// Optional custom drawer factory.
    ///
    /// ### 中文
    /// 可选的自定义绘制器工厂。
    pub(crate) drawer_factory: Option<DrawerFactory>,
    /// ### English
    /// Optional events listener.
    ///
    /// ### 中文
    /// 可选的事件监听器。
    pub(crate) events: Option<Arc<dyn RendererEvents>>,
    /// ### English
    /// Frame-available diagnostics counter.
    ///
    /// ### 中文
    /// frame-available 诊断计数器。
    pub(crate) fps: Arc<FpsCounter>,
    /// ### English
    /// Latest-wins resolution cell drained on the main thread.
    ///
    /// ### 中文
    /// 主线程 drain 的 latest-wins 分辨率单元。
    pub(crate) pending_resolution: Arc<PendingResolution>,
    /// ### English
    /// Slot holding the live producer handle.
    ///
    /// ### 中文
    /// 存放存活生产者句柄的槽位。
    pub(crate) input_slot: Arc<Mutex<Option<PreviewSurface>>>,
    /// ### English
    /// Derived has-surface state.
    ///
    /// ### 中文
    /// 派生的 has-surface 状态。
    pub(crate) has_surface: Arc<AtomicBool>,
    /// ### English
    /// First-frame flag of this init cycle.
    ///
    /// ### 中文
    /// 本 init 周期的首帧标记。
    pub(crate) first_frame_rendered: Arc<AtomicBool>,
    /// ### English
    /// Initial default buffer size for the input surface.
    ///
    /// ### 中文
    /// 输入 surface 的初始默认缓冲尺寸。
    pub(crate) initial_size: PhysicalSize<u32>,
}

/// ### English
/// Owner of the render thread. All rendezvous waits happen through this
/// handle; `release` blocks until the thread has freed every GPU resource.
///
/// ### 中文
/// 渲染线程的持有者。所有会合等待都经由该句柄；`release` 会阻塞直到线程
/// 释放全部 GPU 资源。
pub(crate) struct RenderHandle {
    /// ### English
    /// Command queue into the render thread.
    ///
    /// ### 中文
    /// 通往渲染线程的命令队列。
    queue: Arc<CommandQueue>,
    /// ### English
    /// Join handle for the render thread (owned by this handle).
    ///
    /// ### 中文
    /// 渲染线程的 join handle（由本句柄持有）。
    thread: Option<thread::JoinHandle<()>>,
    /// ### English
    /// Cleared by `release`; inactive handles refuse new work.
    ///
    /// ### 中文
    /// 由 `release` 清除；失活的句柄拒绝新工作。
    active: bool,
}

impl RenderHandle {
    /// ### English
    /// Spawns the render thread and blocks until its startup rendezvous
    /// completes (or times out).
    ///
    /// #### Parameters
    /// - `launch`: Startup bundle shared with the thread.
    ///
    /// ### 中文
    /// 启动渲染线程，并阻塞等待其启动会合完成（或超时）。
    ///
    /// #### 参数
    /// - `launch`：与线程共享的启动参数包。
    pub(crate) fn spawn(launch: RenderHandleLaunch) -> Result<Self, String> {
        let queue = Arc::new(CommandQueue::new());
        let init = Arc::new(OneShot::new());

        let thread_launch = RenderThreadLaunch {
            shared_context: launch.shared_context,
            config_attributes: launch.config_attributes,
            drawer_factory: launch.drawer_factory,
            events: launch.events,
            queue: queue.clone(),
            fps: launch.fps,
            pending_resolution: launch.pending_resolution,
            input_slot: launch.input_slot,
            has_surface: launch.has_surface,
            first_frame_rendered: launch.first_frame_rendered,
            initial_size: launch.initial_size,
            init_signal: init.clone(),
        };
        let thread = thread::Builder::new()
            .name("preview-render".to_string())
            .spawn(move || render_thread::run_render_thread(thread_launch))
            .map_err(|err| format!("Failed to spawn render thread: {err}"))?;

        match init.recv_timeout(INIT_TIMEOUT) {
            Some(Ok(())) => Ok(Self {
                queue,
                thread: Some(thread),
                active: true,
            }),
            Some(Err(err)) => {
                let _ = thread.join();
                Err(err)
            }
            None => {
                queue.push(Command::Terminate);
                let _ = thread.join();
                Err("Timed out initializing render thread".to_string())
            }
        }
    }

    /// ### English
    /// Whether this handle still accepts work.
    ///
    /// ### 中文
    /// 该句柄是否仍接受工作。
    #[inline]
    pub(crate) fn is_active(&self) -> bool {
        self.active
    }

    /// ### English
    /// Binds or unbinds the video encoder.
    ///
    /// #### Parameters
    /// - `encoder`: Encoder to bind, or `None` to unbind.
    ///
    /// ### 中文
    /// 绑定或解绑视频编码器。
    ///
    /// #### 参数
    /// - `encoder`：要绑定的编码器；`None` 表示解绑。
    pub(crate) fn set_encoder(&self, encoder: Option<VideoEncoder>) {
        if self.active {
            self.queue.push(Command::SetEncoder(encoder));
        }
    }

    /// ### English
    /// Rendezvous: (re)creates the input surface and returns the producer
    /// handle. `None` when the renderer is inactive or released mid-wait.
    ///
    /// ### 中文
    /// 会合：（重新）创建输入 surface 并返回生产者句柄。
    /// 渲染器失活或等待中被释放时返回 `None`。
    pub(crate) fn create_surface(&self) -> Option<PreviewSurface> {
        if !self.active {
            return None;
        }
        let response = Arc::new(OneShot::new());
        if !self.queue.try_push(Command::CreateSurface {
            response: response.clone(),
        }) {
            return None;
        }
        response.recv().ok()
    }

    /// ### English
    /// Rendezvous: requests a new default buffer size and waits until the
    /// render thread has acted on it.
    ///
    /// #### Parameters
    /// - `size`: Requested default buffer size.
    ///
    /// ### 中文
    /// 会合：请求新的默认缓冲尺寸，并等待渲染线程处理完毕。
    ///
    /// #### 参数
    /// - `size`：请求的默认缓冲尺寸。
    pub(crate) fn resize(&self, size: PhysicalSize<u32>) {
        if !self.active {
            return;
        }
        let response = Arc::new(OneShot::new());
        if self.queue.try_push(Command::Resize {
            size,
            response: response.clone(),
        }) {
            response.recv();
        }
    }

    /// ### English
    /// Updates the mirror flag.
    ///
    /// #### Parameters
    /// - `mirror`: Mirror the image horizontally.
    ///
    /// ### 中文
    /// 更新镜像标记。
    ///
    /// #### 参数
    /// - `mirror`：是否水平镜像。
    pub(crate) fn set_mirror(&self, mirror: bool) {
        if self.active {
            self.queue.push(Command::SetMirror(mirror));
        }
    }

    /// ### English
    /// Updates the frame-rate cap.
    ///
    /// #### Parameters
    /// - `fps`: Maximum frame rate (`0` pauses, infinity lifts the cap).
    ///
    /// ### 中文
    /// 更新帧率上限。
    ///
    /// #### 参数
    /// - `fps`：最大帧率（`0` 暂停，无穷大解除上限）。
    pub(crate) fn set_fps_reduction(&self, fps: f32) {
        if self.active {
            self.queue.push(Command::SetFpsReduction(fps));
        }
    }

    /// ### English
    /// Pushes the layout aspect ratio for drawer-side letterboxing.
    ///
    /// #### Parameters
    /// - `aspect`: Layout aspect ratio (width / height).
    ///
    /// ### 中文
    /// 推送布局宽高比，用于绘制侧 letterbox。
    ///
    /// #### 参数
    /// - `aspect`：布局宽高比（宽 / 高）。
    pub(crate) fn set_layout_aspect_ratio(&self, aspect: f32) {
        if self.active {
            self.queue.push(Command::SetLayoutAspectRatio(aspect));
        }
    }

    /// ### English
    /// Clears the on-screen surface to transparent black.
    ///
    /// ### 中文
    /// 把上屏 surface 清为透明黑。
    pub(crate) fn clear_image(&self) {
        if self.active {
            self.queue.push(Command::ClearImage);
        }
    }

    /// ### English
    /// Binds the on-screen window (or re-binds it at a new size).
    ///
    /// #### Parameters
    /// - `window`: Raw native window handle.
    /// - `size`: Window size in physical pixels.
    ///
    /// ### 中文
    /// 绑定上屏窗口（或以新尺寸重新绑定）。
    ///
    /// #### 参数
    /// - `window`：原始 native 窗口句柄。
    /// - `size`：窗口物理像素尺寸。
    pub(crate) fn bind_window(&self, window: usize, size: PhysicalSize<u32>) {
        if self.active {
            self.queue.push(Command::BindWindow { window, size });
        }
    }

    /// ### English
    /// Rendezvous: tears the window surface down and waits until it is gone,
    /// so the host may safely destroy the native window afterwards.
    ///
    /// ### 中文
    /// 会合：销毁 window surface 并等待其释放完成，宿主随后才能安全销毁
    /// native 窗口。
    pub(crate) fn unbind_window(&self) {
        if !self.active {
            return;
        }
        let response = Arc::new(OneShot::new());
        if self.queue.try_push(Command::UnbindWindow {
            response: response.clone(),
        }) {
            response.recv();
        }
    }

    /// ### English
    /// Rendezvous: blocks until the next drawn frame produces the requested
    /// bitmap, or until release unblocks the wait with an error.
    ///
    /// #### Parameters
    /// - `size`: Requested bitmap dimensions.
    ///
    /// ### 中文
    /// 会合：阻塞直到下一帧绘制产出请求的位图，或 release 以错误解除等待。
    ///
    /// #### 参数
    /// - `size`：请求的位图尺寸。
    pub(crate) fn capture_still(&self, size: PhysicalSize<u32>) -> Result<RgbaImage, String> {
        if !self.active {
            return Err("Renderer is released".to_string());
        }
        let response = Arc::new(OneShot::new());
        if !self.queue.try_push(Command::CaptureStill {
            size,
            response: response.clone(),
        }) {
            return Err("Renderer is released".to_string());
        }
        response.recv()
    }

    /// ### English
    /// Removes pending draw work, terminates the thread, and blocks until
    /// every GPU resource is freed. Idempotent.
    ///
    /// ### 中文
    /// 移除待绘制工作、终止线程，并阻塞直到全部 GPU 资源释放完毕。幂等。
    pub(crate) fn release(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        self.queue.begin_discard();
        self.queue.push(Command::Terminate);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
        self.queue.close();
    }
}

impl Drop for RenderHandle {
    /// ### English
    /// Ensures the render thread is torn down when the handle is dropped.
    ///
    /// ### 中文
    /// 确保句柄 drop 时渲染线程被销毁。
    fn drop(&mut self) {
        self.release();
    }
}
