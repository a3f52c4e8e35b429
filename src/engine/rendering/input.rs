//! ### English
//! Camera input surface: the surface-texture pair owned by the render thread.
//!
//! `InputSurface` couples one GL texture with a latest-wins frame slot.
//! Producers hold a [`PreviewSurface`] handle and publish frames without
//! blocking; each publish signals frame-available by enqueueing a render
//! command. `update_tex_image` on the render thread pulls the newest frame
//! into the texture and snapshots the matching transform matrix.
//!
//! ### 中文
//! 摄像头输入 surface：渲染线程持有的 surface-texture 组合。
//!
//! `InputSurface` 将一个 GL 纹理与一个 latest-wins 帧槽位配对。
//! 生产者持有 [`PreviewSurface`] 句柄并无阻塞地发布帧；每次发布都通过入队
//! 渲染命令来发出 frame-available 信号。渲染线程的 `update_tex_image` 把最新
//! 帧拉入纹理，并快照对应的变换矩阵。

use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use dpi::PhysicalSize;

use crate::engine::fps::FpsCounter;
use crate::engine::frame::{FrameRotation, VideoFrame};
use crate::engine::lockfree::PendingFrame;
use crate::engine::matrix::{self, Mat4};
use crate::engine::rendering::drawer;
use crate::engine::runtime::command::Command;
use crate::engine::runtime::queue::CommandQueue;

/// ### English
/// State shared between producer handles and the render-thread side.
///
/// ### 中文
/// 生产者句柄与渲染线程侧共享的状态。
struct InputSurfaceShared {
    /// ### English
    /// Latest-wins slot holding the newest undelivered frame.
    ///
    /// ### 中文
    /// 保存最新未投递帧的 latest-wins 槽位。
    slot: PendingFrame,
    /// ### English
    /// Cleared when this input surface is replaced or released; stale
    /// producer handles then drop their frames.
    ///
    /// ### 中文
    /// 当该输入 surface 被替换或释放时清零；过期的生产者句柄随即丢弃帧。
    active: AtomicBool,
    /// ### English
    /// Default buffer size producers should target (the view size at
    /// creation time).
    ///
    /// ### 中文
    /// 生产者应采用的默认缓冲尺寸（创建时的 view 尺寸）。
    default_size: PhysicalSize<u32>,
    /// ### English
    /// Command queue used to signal frame-available.
    ///
    /// ### 中文
    /// 用于发出 frame-available 信号的命令队列。
    queue: Arc<CommandQueue>,
    /// ### English
    /// Diagnostics counter bumped once per produced frame.
    ///
    /// ### 中文
    /// 每生产一帧递增一次的诊断计数器。
    fps: Arc<FpsCounter>,
}

/// ### English
/// Producer-facing handle to the input surface. Cloneable and usable from
/// any thread; publishing never blocks.
///
/// ### 中文
/// 面向生产者的输入 surface 句柄。可 clone、可在任意线程使用；发布永不阻塞。
#[derive(Clone)]
pub struct PreviewSurface {
    /// ### English
    /// Shared slot and signalling state.
    ///
    /// ### 中文
    /// 共享的槽位与信号状态。
    shared: Arc<InputSurfaceShared>,
}

impl PreviewSurface {
    /// ### English
    /// Publishes a frame (latest-wins) and signals frame-available.
    /// Returns `false` if this surface has been replaced or released.
    ///
    /// #### Parameters
    /// - `frame`: Newest produced frame.
    ///
    /// ### 中文
    /// 发布一帧（latest-wins）并发出 frame-available 信号。
    /// 若该 surface 已被替换或释放，返回 `false`。
    ///
    /// #### 参数
    /// - `frame`：最新生产的帧。
    pub fn queue_frame(&self, frame: VideoFrame) -> bool {
        if !self.shared.active.load(Ordering::Acquire) {
            return false;
        }
        self.shared.fps.count();
        self.shared.slot.set(frame);
        self.shared.queue.try_push(Command::Render)
    }

    /// ### English
    /// Default buffer size producers should target.
    ///
    /// ### 中文
    /// 生产者应采用的默认缓冲尺寸。
    #[inline]
    pub fn default_buffer_size(&self) -> PhysicalSize<u32> {
        self.shared.default_size
    }

    /// ### English
    /// Whether this handle still feeds the live input surface.
    ///
    /// ### 中文
    /// 该句柄是否仍连接着存活的输入 surface。
    #[inline]
    pub fn is_active(&self) -> bool {
        self.shared.active.load(Ordering::Acquire)
    }
}

/// ### English
/// Render-thread side of the input surface: the texture, the transform
/// snapshot of the last uploaded frame, and the shared slot.
///
/// ### 中文
/// 输入 surface 的渲染线程侧：纹理、最近上传帧的变换快照、共享槽位。
pub(crate) struct InputSurface {
    /// ### English
    /// Drawer-owned GL texture this surface updates.
    ///
    /// ### 中文
    /// 该 surface 更新的、由绘制器持有的 GL 纹理。
    texture_id: u32,
    /// ### English
    /// Shared slot and signalling state.
    ///
    /// ### 中文
    /// 共享的槽位与信号状态。
    shared: Arc<InputSurfaceShared>,
    /// ### English
    /// Transform of the most recently uploaded frame (valid between
    /// `update_tex_image` calls).
    ///
    /// ### 中文
    /// 最近上传帧的变换（在两次 `update_tex_image` 之间有效）。
    transform: Mat4,
    /// ### English
    /// Physical size and rotation of the most recently uploaded frame.
    ///
    /// ### 中文
    /// 最近上传帧的物理尺寸与旋转。
    resolution: Option<(u32, u32, FrameRotation)>,
    /// ### English
    /// Pins this half to the render thread.
    ///
    /// ### 中文
    /// 把该半部固定在渲染线程。
    _thread_confined: PhantomData<*const ()>,
}

impl InputSurface {
    /// ### English
    /// Creates the render-thread side around a freshly allocated texture.
    ///
    /// #### Parameters
    /// - `texture_id`: Texture allocated by the drawer for this surface.
    /// - `default_size`: Default buffer size (current view size).
    /// - `queue`: Command queue for frame-available signalling.
    /// - `fps`: Diagnostics counter.
    ///
    /// ### 中文
    /// 围绕新分配的纹理创建渲染线程侧。
    ///
    /// #### 参数
    /// - `texture_id`：绘制器为该 surface 分配的纹理。
    /// - `default_size`：默认缓冲尺寸（当前 view 尺寸）。
    /// - `queue`：用于 frame-available 信号的命令队列。
    /// - `fps`：诊断计数器。
    pub(crate) fn new(
        texture_id: u32,
        default_size: PhysicalSize<u32>,
        queue: Arc<CommandQueue>,
        fps: Arc<FpsCounter>,
    ) -> Self {
        Self {
            texture_id,
            shared: Arc::new(InputSurfaceShared {
                slot: PendingFrame::default(),
                active: AtomicBool::new(true),
                default_size,
                queue,
                fps,
            }),
            transform: matrix::IDENTITY,
            resolution: None,
            _thread_confined: PhantomData,
        }
    }

    /// ### English
    /// Mints a producer handle for this surface.
    ///
    /// ### 中文
    /// 为该 surface 生成一个生产者句柄。
    pub(crate) fn handle(&self) -> PreviewSurface {
        PreviewSurface {
            shared: self.shared.clone(),
        }
    }

    /// ### English
    /// Id of the paired texture.
    ///
    /// ### 中文
    /// 配对纹理的 id。
    #[inline]
    pub(crate) fn texture_id(&self) -> u32 {
        self.texture_id
    }

    /// ### English
    /// Pulls the most recently produced frame into the texture and snapshots
    /// its transform. A no-op when no new frame arrived.
    ///
    /// #### Parameters
    /// - `gl`: GL API of the current context.
    ///
    /// ### 中文
    /// 把最新生产的帧拉入纹理并快照其变换。若没有新帧则为空操作。
    ///
    /// #### 参数
    /// - `gl`：当前上下文的 GL API。
    pub(crate) fn update_tex_image(&mut self, gl: &glow::Context) -> Result<(), String> {
        let Some(frame) = self.shared.slot.take() else {
            return Ok(());
        };
        drawer::upload_rgba(
            gl,
            self.texture_id,
            frame.width(),
            frame.height(),
            frame.buffer().data(),
        )?;
        self.transform = matrix::multiply(
            &matrix::rotation(frame.rotation()),
            &matrix::vertical_flip(),
        );
        self.resolution = Some((frame.width(), frame.height(), frame.rotation()));
        Ok(())
    }

    /// ### English
    /// Transform matrix of the frame uploaded by the last `update_tex_image`.
    ///
    /// ### 中文
    /// 上一次 `update_tex_image` 所上传帧的变换矩阵。
    #[inline]
    pub(crate) fn transform(&self) -> Mat4 {
        self.transform
    }

    /// ### English
    /// Physical size and rotation of the last uploaded frame.
    ///
    /// ### 中文
    /// 最近上传帧的物理尺寸与旋转。
    #[inline]
    pub(crate) fn resolution(&self) -> Option<(u32, u32, FrameRotation)> {
        self.resolution
    }

    /// ### English
    /// Detaches producer handles before this surface (and its texture) are
    /// destroyed. Frames published afterwards are dropped at the handle.
    ///
    /// ### 中文
    /// 在该 surface（及其纹理）销毁前使生产者句柄失效。
    /// 之后发布的帧会在句柄处被丢弃。
    pub(crate) fn detach(&self) {
        self.shared.active.store(false, Ordering::Release);
    }
}
