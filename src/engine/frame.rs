//! ### English
//! Video frame model shared by producers and the render thread.
//!
//! ### 中文
//! 生产者与渲染线程共享的视频帧模型。

use std::sync::Arc;

/// ### English
/// Frame rotation in degrees, clockwise.
///
/// ### 中文
/// 帧旋转角度（顺时针）。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FrameRotation {
    /// ### English
    /// No rotation.
    ///
    /// ### 中文
    /// 无旋转。
    #[default]
    Deg0,
    /// ### English
    /// 90° clockwise.
    ///
    /// ### 中文
    /// 顺时针 90°。
    Deg90,
    /// ### English
    /// 180°.
    ///
    /// ### 中文
    /// 180°。
    Deg180,
    /// ### English
    /// 270° clockwise.
    ///
    /// ### 中文
    /// 顺时针 270°。
    Deg270,
}

impl FrameRotation {
    /// ### English
    /// Parses a rotation from degrees; only `0`, `90`, `180`, `270` are valid.
    ///
    /// #### Parameters
    /// - `degrees`: Rotation in degrees.
    ///
    /// ### 中文
    /// 从角度解析旋转；仅接受 `0`、`90`、`180`、`270`。
    ///
    /// #### 参数
    /// - `degrees`：旋转角度。
    pub fn from_degrees(degrees: i32) -> Option<Self> {
        match degrees {
            0 => Some(Self::Deg0),
            90 => Some(Self::Deg90),
            180 => Some(Self::Deg180),
            270 => Some(Self::Deg270),
            _ => None,
        }
    }

    /// ### English
    /// Returns the rotation in degrees.
    ///
    /// ### 中文
    /// 返回旋转角度。
    pub fn degrees(self) -> i32 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }

    /// ### English
    /// Whether this rotation swaps the frame's width and height.
    ///
    /// ### 中文
    /// 该旋转是否交换帧的宽与高。
    #[inline]
    pub fn swaps_dimensions(self) -> bool {
        matches!(self, Self::Deg90 | Self::Deg270)
    }

    /// ### English
    /// Compact index used when crossing threads in packed atomics
    /// (`degrees / 90`).
    ///
    /// ### 中文
    /// 跨线程打包到原子变量时使用的紧凑索引（`degrees / 90`）。
    #[inline]
    pub(crate) fn to_index(self) -> u8 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 1,
            Self::Deg180 => 2,
            Self::Deg270 => 3,
        }
    }

    /// ### English
    /// Inverse of [`Self::to_index`]; out-of-range values fall back to 0°.
    ///
    /// ### 中文
    /// [`Self::to_index`] 的逆操作；越界值回退为 0°。
    #[inline]
    pub(crate) fn from_index(index: u8) -> Self {
        match index {
            1 => Self::Deg90,
            2 => Self::Deg180,
            3 => Self::Deg270,
            _ => Self::Deg0,
        }
    }
}

/// ### English
/// Tightly packed RGBA8 pixel buffer, rows top-down.
///
/// ### 中文
/// 紧密排列的 RGBA8 像素缓冲，按自上而下的行序存储。
pub struct FrameBuffer {
    /// ### English
    /// Width in pixels.
    ///
    /// ### 中文
    /// 宽度（像素）。
    width: u32,
    /// ### English
    /// Height in pixels.
    ///
    /// ### 中文
    /// 高度（像素）。
    height: u32,
    /// ### English
    /// RGBA bytes, exactly `width * height * 4` long.
    ///
    /// ### 中文
    /// RGBA 字节，长度恰为 `width * height * 4`。
    data: Vec<u8>,
}

impl FrameBuffer {
    /// ### English
    /// Creates a buffer after validating dimensions against the byte length.
    ///
    /// #### Parameters
    /// - `width`: Width in pixels (non-zero).
    /// - `height`: Height in pixels (non-zero).
    /// - `data`: RGBA bytes.
    ///
    /// ### 中文
    /// 校验尺寸与字节长度后创建缓冲。
    ///
    /// #### 参数
    /// - `width`：宽度（像素，非 0）。
    /// - `height`：高度（像素，非 0）。
    /// - `data`：RGBA 字节。
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, String> {
        if width == 0 || height == 0 {
            return Err(format!("Invalid frame buffer dimensions {width}x{height}"));
        }
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(format!(
                "Frame buffer length {} does not match {width}x{height} RGBA ({expected})",
                data.len()
            ));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// ### English
    /// Width in pixels.
    ///
    /// ### 中文
    /// 宽度（像素）。
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// ### English
    /// Height in pixels.
    ///
    /// ### 中文
    /// 高度（像素）。
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// ### English
    /// Raw RGBA bytes.
    ///
    /// ### 中文
    /// 原始 RGBA 字节。
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// ### English
/// One video frame: a shared pixel buffer plus rotation and capture
/// timestamp. Cloning is cheap (the buffer is reference-counted).
///
/// ### 中文
/// 一个视频帧：共享的像素缓冲，外加旋转与采集时间戳。clone 很廉价
/// （缓冲是引用计数的）。
#[derive(Clone)]
pub struct VideoFrame {
    /// ### English
    /// Shared pixel storage.
    ///
    /// ### 中文
    /// 共享的像素存储。
    buffer: Arc<FrameBuffer>,
    /// ### English
    /// Rotation that must be applied for upright display.
    ///
    /// ### 中文
    /// 正立显示所需的旋转。
    rotation: FrameRotation,
    /// ### English
    /// Capture timestamp in microseconds.
    ///
    /// ### 中文
    /// 采集时间戳（微秒）。
    timestamp_us: i64,
}

impl VideoFrame {
    /// ### English
    /// Creates a frame from a shared buffer.
    ///
    /// #### Parameters
    /// - `buffer`: Shared pixel storage.
    /// - `rotation`: Rotation for upright display.
    /// - `timestamp_us`: Capture timestamp in microseconds.
    ///
    /// ### 中文
    /// 基于共享缓冲创建帧。
    ///
    /// #### 参数
    /// - `buffer`：共享的像素存储。
    /// - `rotation`：正立显示所需的旋转。
    /// - `timestamp_us`：采集时间戳（微秒）。
    pub fn new(buffer: Arc<FrameBuffer>, rotation: FrameRotation, timestamp_us: i64) -> Self {
        Self {
            buffer,
            rotation,
            timestamp_us,
        }
    }

    /// ### English
    /// Physical (unrotated) frame width.
    ///
    /// ### 中文
    /// 物理（未旋转）帧宽度。
    #[inline]
    pub fn width(&self) -> u32 {
        self.buffer.width
    }

    /// ### English
    /// Physical (unrotated) frame height.
    ///
    /// ### 中文
    /// 物理（未旋转）帧高度。
    #[inline]
    pub fn height(&self) -> u32 {
        self.buffer.height
    }

    /// ### English
    /// Width after rotation is applied (swapped for 90°/270°).
    ///
    /// ### 中文
    /// 应用旋转后的宽度（90°/270° 时与高度交换）。
    #[inline]
    pub fn rotated_width(&self) -> u32 {
        if self.rotation.swaps_dimensions() {
            self.buffer.height
        } else {
            self.buffer.width
        }
    }

    /// ### English
    /// Height after rotation is applied (swapped for 90°/270°).
    ///
    /// ### 中文
    /// 应用旋转后的高度（90°/270° 时与宽度交换）。
    #[inline]
    pub fn rotated_height(&self) -> u32 {
        if self.rotation.swaps_dimensions() {
            self.buffer.width
        } else {
            self.buffer.height
        }
    }

    /// ### English
    /// Frame rotation.
    ///
    /// ### 中文
    /// 帧旋转。
    #[inline]
    pub fn rotation(&self) -> FrameRotation {
        self.rotation
    }

    /// ### English
    /// Capture timestamp in microseconds.
    ///
    /// ### 中文
    /// 采集时间戳（微秒）。
    #[inline]
    pub fn timestamp_us(&self) -> i64 {
        self.timestamp_us
    }

    /// ### English
    /// Shared pixel storage.
    ///
    /// ### 中文
    /// 共享的像素存储。
    #[inline]
    pub fn buffer(&self) -> &Arc<FrameBuffer> {
        &self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(width: u32, height: u32, rotation: FrameRotation) -> VideoFrame {
        let data = vec![0u8; width as usize * height as usize * 4];
        let buffer = Arc::new(FrameBuffer::new(width, height, data).unwrap());
        VideoFrame::new(buffer, rotation, 0)
    }

    #[test]
    fn rotated_dimensions_follow_rotation_law() {
        for (rotation, expected_w, expected_h) in [
            (FrameRotation::Deg0, 640, 480),
            (FrameRotation::Deg90, 480, 640),
            (FrameRotation::Deg180, 640, 480),
            (FrameRotation::Deg270, 480, 640),
        ] {
            let frame = frame(640, 480, rotation);
            assert_eq!(frame.rotated_width(), expected_w, "{rotation:?}");
            assert_eq!(frame.rotated_height(), expected_h, "{rotation:?}");
        }
    }

    #[test]
    fn buffer_rejects_mismatched_length() {
        assert!(FrameBuffer::new(2, 2, vec![0u8; 15]).is_err());
        assert!(FrameBuffer::new(0, 2, vec![]).is_err());
        assert!(FrameBuffer::new(2, 2, vec![0u8; 16]).is_ok());
    }

    #[test]
    fn rotation_degree_round_trip() {
        for degrees in [0, 90, 180, 270] {
            let rotation = FrameRotation::from_degrees(degrees).unwrap();
            assert_eq!(rotation.degrees(), degrees);
            assert_eq!(FrameRotation::from_index(rotation.to_index()), rotation);
        }
        assert!(FrameRotation::from_degrees(45).is_none());
    }
}
