//! ### English
//! Frame-available rate counter used for render diagnostics.
//!
//! ### 中文
//! 用于渲染诊断的帧到达速率计数器。

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// ### English
/// Counts frame-available events from producer threads; the render thread
/// samples and resets the count to log the measured rate.
///
/// ### 中文
/// 统计来自生产者线程的帧到达事件；渲染线程定期取样并清零，用于记录实测速率。
#[derive(Default)]
pub(crate) struct FpsCounter {
    /// ### English
    /// Frames counted since the last sample.
    ///
    /// ### 中文
    /// 自上次取样以来累计的帧数。
    frames: AtomicU32,
}

impl FpsCounter {
    /// ### English
    /// Records one frame-available event.
    ///
    /// ### 中文
    /// 记录一次帧到达事件。
    #[inline]
    pub(crate) fn count(&self) {
        self.frames.fetch_add(1, Ordering::Relaxed);
    }

    /// ### English
    /// Takes the accumulated count and resets it.
    ///
    /// ### 中文
    /// 取出累计帧数并清零。
    #[inline]
    pub(crate) fn take_frames(&self) -> u32 {
        self.frames.swap(0, Ordering::Relaxed)
    }

    /// ### English
    /// Converts a sampled count over `elapsed` into frames per second.
    ///
    /// #### Parameters
    /// - `frames`: Sampled frame count.
    /// - `elapsed`: Sampling window.
    ///
    /// ### 中文
    /// 把 `elapsed` 窗口内取样的帧数换算为每秒帧数。
    ///
    /// #### 参数
    /// - `frames`：取样的帧数。
    /// - `elapsed`：取样窗口时长。
    pub(crate) fn rate(frames: u32, elapsed: Duration) -> f32 {
        let seconds = elapsed.as_secs_f32();
        if seconds <= 0.0 {
            return 0.0;
        }
        frames as f32 / seconds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_resets_count() {
        let counter = FpsCounter::default();
        counter.count();
        counter.count();
        counter.count();
        assert_eq!(counter.take_frames(), 3);
        assert_eq!(counter.take_frames(), 0);
    }

    #[test]
    fn rate_is_frames_over_seconds() {
        assert_eq!(FpsCounter::rate(60, Duration::from_secs(2)), 30.0);
        assert_eq!(FpsCounter::rate(5, Duration::ZERO), 0.0);
    }
}
