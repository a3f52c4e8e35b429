//! ### English
//! Internal command protocol between the main/producer threads and the
//! dedicated render thread.
//!
//! ### 中文
//! 主线程/生产者线程与独立渲染线程之间的内部命令协议。

use std::sync::Arc;

use dpi::PhysicalSize;
use image::RgbaImage;

use crate::engine::encoder::VideoEncoder;
use crate::engine::lockfree::OneShot;
use crate::engine::rendering::input::PreviewSurface;

/// ### English
/// Commands drained serially by the render thread. Main-thread state the
/// render thread needs (mirroring, layout aspect, fps policy) always arrives
/// as a payload, never through shared memory.
///
/// ### 中文
/// 渲染线程串行 drain 的命令。渲染线程需要的主线程状态（镜像、布局宽高比、
/// fps 策略）一律作为载荷到达，从不经由共享内存读取。
pub(crate) enum Command {
    /// ### English
    /// Draw one frame. Enqueued by the frame-available signal; duplicates
    /// are harmless.
    ///
    /// ### 中文
    /// 绘制一帧。由 frame-available 信号入队；重复入队无害。
    Render,
    /// ### English
    /// Binds (`Some`) or unbinds (`None`) the video encoder. Takes effect
    /// before the next `Render` behind it in queue order.
    ///
    /// ### 中文
    /// 绑定（`Some`）或解绑（`None`）视频编码器。对队列中其后的下一个
    /// `Render` 生效。
    SetEncoder(Option<VideoEncoder>),
    /// ### English
    /// (Re)creates the input texture/surface pair and hands the producer
    /// handle back through the rendezvous slot.
    ///
    /// ### 中文
    /// （重新）创建输入纹理/surface 组合，并经会合槽位交回生产者句柄。
    CreateSurface {
        /// ### English
        /// Rendezvous slot the caller waits on.
        ///
        /// ### 中文
        /// 调用方等待的会合槽位。
        response: Arc<OneShot<Result<PreviewSurface, String>>>,
    },
    /// ### English
    /// Re-creates the input surface with a new default buffer size if the
    /// dimensions changed; always signals the rendezvous.
    ///
    /// ### 中文
    /// 若尺寸变化则以新的默认缓冲尺寸重建输入 surface；无论如何都会发出
    /// 会合信号。
    Resize {
        /// ### English
        /// Requested default buffer size.
        ///
        /// ### 中文
        /// 请求的默认缓冲尺寸。
        size: PhysicalSize<u32>,
        /// ### English
        /// Rendezvous slot the caller waits on.
        ///
        /// ### 中文
        /// 调用方等待的会合槽位。
        response: Arc<OneShot<()>>,
    },
    /// ### English
    /// Updates the mirror flag used for subsequent draws.
    ///
    /// ### 中文
    /// 更新后续绘制使用的镜像标记。
    SetMirror(bool),
    /// ### English
    /// Updates the frame-rate cap: `0` drops every frame (pause), infinity
    /// disables the cap.
    ///
    /// ### 中文
    /// 更新帧率上限：`0` 丢弃所有帧（暂停），无穷大表示不设上限。
    SetFpsReduction(f32),
    /// ### English
    /// Updates the layout aspect ratio used for drawer-side letterboxing.
    ///
    /// ### 中文
    /// 更新绘制侧 letterbox 所用的布局宽高比。
    SetLayoutAspectRatio(f32),
    /// ### English
    /// Clears the on-screen surface to transparent black and presents.
    ///
    /// ### 中文
    /// 把上屏 surface 清为透明黑并呈现。
    ClearImage,
    /// ### English
    /// Registers a still-capture request; fulfilled after the next drawn
    /// frame's swap.
    ///
    /// ### 中文
    /// 登记一次静态截图请求；在下一帧绘制的 swap 之后完成。
    CaptureStill {
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
    },
    /// ### English
    /// Binds the context to a platform window (or re-binds after a size
    /// change).
    ///
    /// ### 中文
    /// 把上下文绑定到平台窗口（或在尺寸变化后重新绑定）。
    BindWindow {
        /// ### English
        /// Raw native window handle.
        ///
        /// ### 中文
        /// 原始 native 窗口句柄。
        window: usize,
        /// ### English
        /// Window size in physical pixels.
        ///
        /// ### 中文
        /// 窗口物理像素尺寸。
        size: PhysicalSize<u32>,
    },
    /// ### English
    /// Tears the window surface down (window destroyed); rendering pauses
    /// until a new window is bound. The rendezvous lets the host free the
    /// window only after the surface is gone.
    ///
    /// ### 中文
    /// 销毁 window surface（窗口已销毁）；渲染暂停直至绑定新窗口。
    /// 会合保证宿主在 surface 释放后才回收窗口。
    UnbindWindow {
        /// ### English
        /// Rendezvous slot the caller waits on.
        ///
        /// ### 中文
        /// 调用方等待的会合槽位。
        response: Arc<OneShot<()>>,
    },
    /// ### English
    /// Breaks the message loop; ordered teardown runs after loop exit.
    ///
    /// ### 中文
    /// 跳出消息循环；循环退出后执行有序销毁。
    Terminate,
}
