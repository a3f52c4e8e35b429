//! ### English
//! Renderer event listener contract.
//!
//! ### 中文
//! 渲染器事件监听契约。

use std::panic::{self, AssertUnwindSafe};

use crate::engine::frame::FrameRotation;

/// ### English
/// Callbacks reported by the renderer. Set once before `init` completes and
/// treated as read-only afterwards; callbacks may arrive on the render
/// thread and must be lightweight.
///
/// ### 中文
/// 渲染器上报的回调。在 `init` 完成前设置一次，之后视为只读；
/// 回调可能在渲染线程触发，必须保持轻量。
pub trait RendererEvents: Send + Sync {
    /// ### English
    /// Fired once per `init`/`release` cycle, after the first successful
    /// buffer swap.
    ///
    /// ### 中文
    /// 每个 `init`/`release` 周期触发一次，发生在首次成功 swap 之后。
    fn on_first_frame_rendered(&self) {}

    /// ### English
    /// Fired whenever the incoming frame width, height, or rotation changes.
    ///
    /// #### Parameters
    /// - `width`: Physical frame width.
    /// - `height`: Physical frame height.
    /// - `rotation`: Frame rotation.
    ///
    /// ### 中文
    /// 当输入帧的宽、高或旋转发生变化时触发。
    ///
    /// #### 参数
    /// - `width`：物理帧宽度。
    /// - `height`：物理帧高度。
    /// - `rotation`：帧旋转。
    fn on_frame_resolution_changed(&self, width: u32, height: u32, rotation: FrameRotation) {
        let _ = (width, height, rotation);
    }

    /// ### English
    /// Fired when the render thread hits a fatal GL/context error and tears
    /// itself down.
    ///
    /// #### Parameters
    /// - `message`: Human-readable failure description.
    ///
    /// ### 中文
    /// 当渲染线程遇到致命 GL/上下文错误并自行销毁时触发。
    ///
    /// #### 参数
    /// - `message`：可读的失败描述。
    fn on_render_error(&self, message: &str) {
        let _ = message;
    }
}

/// ### English
/// Invokes a listener callback, swallowing and logging any panic so listener
/// failures never propagate back into the render thread.
///
/// #### Parameters
/// - `label`: Callback name for the log line.
/// - `callback`: The listener invocation.
///
/// ### 中文
/// 调用监听回调，吞掉并记录任何 panic，确保监听方的失败不会传播回渲染线程。
///
/// #### 参数
/// - `label`：用于日志的回调名称。
/// - `callback`：监听回调调用。
pub(crate) fn dispatch(label: &str, callback: impl FnOnce()) {
    if panic::catch_unwind(AssertUnwindSafe(callback)).is_err() {
        log::warn!("Renderer events listener panicked in {label}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_swallows_listener_panic() {
        dispatch("test", || panic!("listener bug"));
        // Reaching this point is the assertion: the panic did not propagate.
    }

    #[test]
    fn dispatch_runs_callback() {
        let mut ran = false;
        dispatch("test", || ran = true);
        assert!(ran);
    }
}
