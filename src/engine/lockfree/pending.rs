//! ### English
//! Latest-wins pending state (coalesced handoff cells).
//!
//! Producers only ever need the newest value to survive: an unconsumed frame
//! or resolution is overwritten, never queued.
//!
//! ### 中文
//! latest-wins 的待处理状态（合并式传递单元）。
//!
//! 生产侧只需要最新值存活：未被消费的帧或分辨率会被覆盖，而不是排队。

use std::sync::Mutex;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};

use crate::engine::frame::{FrameRotation, VideoFrame};

/// ### English
/// Latest-wins frame slot between producer threads and the render thread.
/// Keeps only the most recent frame until the render thread drains it.
///
/// ### 中文
/// 生产者线程与渲染线程之间的 latest-wins 帧槽位。只保留最新一帧，
/// 等待渲染线程 drain。
#[derive(Default)]
pub(crate) struct PendingFrame {
    /// ### English
    /// Slot holding the newest undelivered frame.
    ///
    /// ### 中文
    /// 存放最新未投递帧的槽位。
    slot: Mutex<Option<VideoFrame>>,
}

impl PendingFrame {
    /// ### English
    /// Stores the latest frame, replacing any undelivered one.
    /// Returns `true` if this call transitions from "empty" to "pending".
    ///
    /// #### Parameters
    /// - `frame`: Newest produced frame.
    ///
    /// ### 中文
    /// 写入最新帧，覆盖未投递的旧帧。
    /// 若本次调用把槽位从“空”切换为“pending”，则返回 `true`。
    ///
    /// #### 参数
    /// - `frame`：最新生产的帧。
    pub(crate) fn set(&self, frame: VideoFrame) -> bool {
        let mut slot = self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        slot.replace(frame).is_none()
    }

    /// ### English
    /// Takes the pending frame, if any.
    ///
    /// ### 中文
    /// 取出待处理帧（若有）。
    pub(crate) fn take(&self) -> Option<VideoFrame> {
        let mut slot = self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        slot.take()
    }
}

/// ### English
/// Latest-wins frame-resolution cell written by the render thread and drained
/// on the main thread. A later resolution never loses to an earlier one.
///
/// ### 中文
/// latest-wins 的帧分辨率单元：渲染线程写入、主线程 drain。
/// 较新的分辨率不会被较旧的覆盖。
#[derive(Default)]
pub(crate) struct PendingResolution {
    /// ### English
    /// Pending flag (`0` = nothing pending, `1` = pending).
    ///
    /// ### 中文
    /// pending 标记（`0` = 无待处理，`1` = 有待处理）。
    pending: AtomicU8,
    /// ### English
    /// Rotation index lane (`degrees / 90`).
    ///
    /// ### 中文
    /// 旋转索引通道（`degrees / 90`）。
    rotation: AtomicU8,
    /// ### English
    /// Packed `(width, height)` as two `u32` lanes.
    ///
    /// ### 中文
    /// 将 `(width, height)` 以两个 `u32` 通道打包到一个 `u64` 中。
    packed_size: AtomicU64,
}

impl PendingResolution {
    /// ### English
    /// Stores the latest resolution and marks it pending.
    ///
    /// #### Parameters
    /// - `width`: Physical frame width.
    /// - `height`: Physical frame height.
    /// - `rotation`: Frame rotation.
    ///
    /// ### 中文
    /// 写入最新分辨率并标记为 pending。
    ///
    /// #### 参数
    /// - `width`：物理帧宽度。
    /// - `height`：物理帧高度。
    /// - `rotation`：帧旋转。
    pub(crate) fn set(&self, width: u32, height: u32, rotation: FrameRotation) {
        self.packed_size
            .store(pack_u32x2(width, height), Ordering::Relaxed);
        self.rotation.store(rotation.to_index(), Ordering::Relaxed);
        self.pending.store(1, Ordering::Release);
    }

    /// ### English
    /// Takes the latest resolution if pending.
    ///
    /// ### 中文
    /// 若处于 pending，则取出最新分辨率。
    pub(crate) fn take(&self) -> Option<(u32, u32, FrameRotation)> {
        if self.pending.swap(0, Ordering::Acquire) == 0 {
            return None;
        }
        let (width, height) = unpack_u32x2(self.packed_size.load(Ordering::Relaxed));
        let rotation = FrameRotation::from_index(self.rotation.load(Ordering::Relaxed));
        Some((width, height, rotation))
    }
}

#[inline]
/// ### English
/// Packs two `u32` values into a single `u64` (low/high 32-bit lanes).
///
/// ### 中文
/// 将两个 `u32` 打包为一个 `u64`（低/高 32 位通道）。
fn pack_u32x2(width: u32, height: u32) -> u64 {
    (width as u64) | ((height as u64) << 32)
}

#[inline]
/// ### English
/// Unpacks a `u64` produced by `pack_u32x2` back into two `u32` values.
///
/// ### 中文
/// 将 `pack_u32x2` 产生的 `u64` 解包为两个 `u32`。
fn unpack_u32x2(packed: u64) -> (u32, u32) {
    (packed as u32, (packed >> 32) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::frame::FrameBuffer;
    use std::sync::Arc;

    fn frame(timestamp_us: i64) -> VideoFrame {
        let buffer = Arc::new(FrameBuffer::new(2, 2, vec![0u8; 16]).unwrap());
        VideoFrame::new(buffer, FrameRotation::Deg0, timestamp_us)
    }

    #[test]
    fn pending_frame_keeps_only_latest() {
        let cell = PendingFrame::default();
        assert!(cell.set(frame(1)));
        assert!(!cell.set(frame(2)));
        assert_eq!(cell.take().map(|f| f.timestamp_us()), Some(2));
        assert_eq!(cell.take().map(|f| f.timestamp_us()), None);
        assert!(cell.set(frame(3)));
    }

    #[test]
    fn pending_resolution_round_trip() {
        let cell = PendingResolution::default();
        assert!(cell.take().is_none());
        cell.set(640, 480, FrameRotation::Deg90);
        cell.set(800, 600, FrameRotation::Deg180);
        assert_eq!(cell.take(), Some((800, 600, FrameRotation::Deg180)));
        assert!(cell.take().is_none());
    }
}
