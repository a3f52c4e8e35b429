//! ### English
//! Column-major 4×4 texture-transform helpers.
//!
//! The transform contract follows the surface-texture convention: a matrix
//! applied to `(s, t, 0, 1)` texture coordinates, stored as 16 `f32` values
//! in column-major order.
//!
//! ### 中文
//! 列主序 4×4 纹理变换矩阵工具。
//!
//! 变换约定沿用 surface-texture 惯例：矩阵作用于 `(s, t, 0, 1)` 纹理坐标，
//! 以 16 个 `f32` 按列主序存储。

use crate::engine::frame::FrameRotation;

/// ### English
/// Column-major 4×4 matrix.
///
/// ### 中文
/// 列主序 4×4 矩阵。
pub(crate) type Mat4 = [f32; 16];

/// ### English
/// The identity transform.
///
/// ### 中文
/// 单位变换。
#[rustfmt::skip]
pub(crate) const IDENTITY: Mat4 = [
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 1.0, 0.0,
    0.0, 0.0, 0.0, 1.0,
];

/// ### English
/// Multiplies two column-major matrices (`a * b`).
///
/// #### Parameters
/// - `a`: Left operand.
/// - `b`: Right operand.
///
/// ### 中文
/// 两个列主序矩阵相乘（`a * b`）。
///
/// #### 参数
/// - `a`：左操作数。
/// - `b`：右操作数。
pub(crate) fn multiply(a: &Mat4, b: &Mat4) -> Mat4 {
    let mut out = [0.0f32; 16];
    for col in 0..4 {
        for row in 0..4 {
            let mut sum = 0.0;
            for k in 0..4 {
                sum += a[k * 4 + row] * b[col * 4 + k];
            }
            out[col * 4 + row] = sum;
        }
    }
    out
}

/// ### English
/// Wraps `inner` so it is applied about the texture center `(0.5, 0.5)`
/// instead of the origin.
///
/// ### 中文
/// 把 `inner` 包装为绕纹理中心 `(0.5, 0.5)` 而非原点作用的变换。
fn about_center(inner: &Mat4) -> Mat4 {
    let mut to_center = IDENTITY;
    to_center[12] = 0.5;
    to_center[13] = 0.5;
    let mut from_center = IDENTITY;
    from_center[12] = -0.5;
    from_center[13] = -0.5;
    multiply(&multiply(&to_center, inner), &from_center)
}

/// ### English
/// Rotation of texture coordinates about the center, matching the frame's
/// rotation metadata.
///
/// #### Parameters
/// - `rotation`: Frame rotation to compensate for.
///
/// ### 中文
/// 绕中心旋转纹理坐标，与帧的旋转元数据一致。
///
/// #### 参数
/// - `rotation`：需要补偿的帧旋转。
pub(crate) fn rotation(rotation: FrameRotation) -> Mat4 {
    let (cos, sin) = match rotation {
        FrameRotation::Deg0 => (1.0, 0.0),
        FrameRotation::Deg90 => (0.0, 1.0),
        FrameRotation::Deg180 => (-1.0, 0.0),
        FrameRotation::Deg270 => (0.0, -1.0),
    };
    let mut rotate = IDENTITY;
    rotate[0] = cos;
    rotate[1] = sin;
    rotate[4] = -sin;
    rotate[5] = cos;
    about_center(&rotate)
}

/// ### English
/// Flips the vertical texture axis about the center.
///
/// Frame buffers are stored top-down while GL samples bottom-up, so the base
/// transform of every uploaded frame includes one vertical flip.
///
/// ### 中文
/// 绕中心翻转纹理的垂直轴。
///
/// 帧缓冲按自上而下存储，而 GL 采样自下而上，因此每个上传帧的基础变换都包含
/// 一次垂直翻转。
pub(crate) fn vertical_flip() -> Mat4 {
    let mut flip = IDENTITY;
    flip[5] = -1.0;
    about_center(&flip)
}

/// ### English
/// Layout matrix applied on top of the frame transform: crops texture
/// coordinates about the center so the frame fills the layout without
/// distortion, and optionally mirrors horizontally.
///
/// When the layout is wider than the frame the vertical span is cropped;
/// otherwise the horizontal span is.
///
/// #### Parameters
/// - `mirror`: Mirror the image horizontally.
/// - `frame_aspect`: Rotated frame aspect ratio (width / height).
/// - `layout_aspect`: Layout aspect ratio (width / height); `0` disables
///   cropping.
///
/// ### 中文
/// 叠加在帧变换之上的布局矩阵：绕中心裁剪纹理坐标，使帧不变形地铺满布局，
/// 并可选做水平镜像。
///
/// #### 参数
/// - `mirror`：是否水平镜像。
/// - `frame_aspect`：旋转后的帧宽高比（宽 / 高）。
/// - `layout_aspect`：布局宽高比（宽 / 高）；为 `0` 时不裁剪。
pub(crate) fn layout(mirror: bool, frame_aspect: f32, layout_aspect: f32) -> Mat4 {
    let mut scale_x = 1.0f32;
    let mut scale_y = 1.0f32;
    if frame_aspect > 0.0 && layout_aspect > 0.0 {
        if layout_aspect > frame_aspect {
            scale_y = frame_aspect / layout_aspect;
        } else {
            scale_x = layout_aspect / frame_aspect;
        }
    }
    if mirror {
        scale_x = -scale_x;
    }
    let mut scale = IDENTITY;
    scale[0] = scale_x;
    scale[5] = scale_y;
    about_center(&scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Applies `m` to the point `(s, t)` and returns the transformed pair.
    fn apply(m: &Mat4, s: f32, t: f32) -> (f32, f32) {
        (
            m[0] * s + m[4] * t + m[12],
            m[1] * s + m[5] * t + m[13],
        )
    }

    fn assert_close(actual: (f32, f32), expected: (f32, f32)) {
        assert!(
            (actual.0 - expected.0).abs() < 1e-5 && (actual.1 - expected.1).abs() < 1e-5,
            "expected {expected:?}, got {actual:?}",
        );
    }

    #[test]
    fn identity_multiply_is_noop() {
        let m = layout(false, 4.0 / 3.0, 16.0 / 9.0);
        assert_eq!(multiply(&IDENTITY, &m), m);
        assert_eq!(multiply(&m, &IDENTITY), m);
    }

    #[test]
    fn rotation_0_keeps_corners() {
        let m = rotation(FrameRotation::Deg0);
        assert_close(apply(&m, 0.0, 0.0), (0.0, 0.0));
        assert_close(apply(&m, 1.0, 1.0), (1.0, 1.0));
    }

    #[test]
    fn rotation_90_maps_origin_to_bottom_left() {
        let m = rotation(FrameRotation::Deg90);
        assert_close(apply(&m, 0.0, 0.0), (1.0, 0.0));
        assert_close(apply(&m, 1.0, 0.0), (1.0, 1.0));
    }

    #[test]
    fn rotation_180_swaps_diagonal() {
        let m = rotation(FrameRotation::Deg180);
        assert_close(apply(&m, 0.0, 0.0), (1.0, 1.0));
        assert_close(apply(&m, 1.0, 1.0), (0.0, 0.0));
    }

    #[test]
    fn vertical_flip_mirrors_t_axis() {
        let m = vertical_flip();
        assert_close(apply(&m, 0.25, 0.0), (0.25, 1.0));
        assert_close(apply(&m, 0.25, 1.0), (0.25, 0.0));
    }

    #[test]
    fn layout_crops_narrower_axis() {
        // Wide layout over a narrow frame crops vertically.
        let m = layout(false, 1.0, 2.0);
        assert_close(apply(&m, 0.5, 0.0), (0.5, 0.25));
        assert_close(apply(&m, 0.5, 1.0), (0.5, 0.75));

        // Narrow layout over a wide frame crops horizontally.
        let m = layout(false, 2.0, 1.0);
        assert_close(apply(&m, 0.0, 0.5), (0.25, 0.5));
        assert_close(apply(&m, 1.0, 0.5), (0.75, 0.5));
    }

    #[test]
    fn layout_mirror_reflects_s_axis() {
        let m = layout(true, 1.0, 1.0);
        assert_close(apply(&m, 0.0, 0.5), (1.0, 0.5));
        assert_close(apply(&m, 1.0, 0.5), (0.0, 0.5));
    }

    #[test]
    fn layout_zero_aspect_is_identity() {
        assert_eq!(layout(false, 0.0, 1.0), IDENTITY);
        assert_eq!(layout(false, 1.0, 0.0), IDENTITY);
    }
}
