//! ### English
//! Scaling-policy layout calculator for the view renderer.
//!
//! ### 中文
//! view 渲染器的缩放策略布局计算器。

use dpi::PhysicalSize;

/// ### English
/// How the video fills the layout area it was given.
///
/// ### 中文
/// 视频如何填充分配到的布局区域。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScalingType {
    /// ### English
    /// The whole frame stays visible; the layout may letterbox.
    ///
    /// ### 中文
    /// 整帧保持可见；布局可能出现黑边。
    AspectFit,
    /// ### English
    /// The frame fills the layout; edges may be cropped away.
    ///
    /// ### 中文
    /// 帧铺满布局；边缘可能被裁掉。
    AspectFill,
    /// ### English
    /// Compromise between fit and fill: a fixed minimum fraction of the
    /// frame stays visible.
    ///
    /// ### 中文
    /// fit 与 fill 的折中：保证帧的固定最小比例可见。
    AspectBalanced,
}

/// ### English
/// Minimum visible fraction for [`ScalingType::AspectBalanced`].
///
/// ### 中文
/// [`ScalingType::AspectBalanced`] 的最小可见比例。
const BALANCED_VISIBLE_FRACTION: f32 = 0.5625;

impl ScalingType {
    /// ### English
    /// The minimum fraction of the frame that must remain visible under this
    /// policy (`0` means cropping is unbounded).
    ///
    /// ### 中文
    /// 该策略下必须保持可见的最小帧比例（`0` 表示裁剪不受限）。
    fn visible_fraction(self) -> f32 {
        match self {
            Self::AspectFit => 1.0,
            Self::AspectFill => 0.0,
            Self::AspectBalanced => BALANCED_VISIBLE_FRACTION,
        }
    }
}

/// ### English
/// One axis of a layout measurement request, mirroring the host view
/// system's measure-spec convention.
///
/// ### 中文
/// 布局测量请求的单个轴，对应宿主 view 系统的 measure-spec 约定。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeasureSpec {
    /// ### English
    /// The host demands exactly this size.
    ///
    /// ### 中文
    /// 宿主要求恰好为该尺寸。
    Exactly(u32),
    /// ### English
    /// The host allows at most this size.
    ///
    /// ### 中文
    /// 宿主允许的最大尺寸。
    AtMost(u32),
    /// ### English
    /// The host imposes no constraint.
    ///
    /// ### 中文
    /// 宿主不施加约束。
    Unspecified,
}

impl MeasureSpec {
    /// ### English
    /// Size to report when the frame size is still unknown: the spec minima
    /// (`Exactly` keeps its size, the rest collapse to zero).
    ///
    /// ### 中文
    /// 帧尺寸未知时上报的尺寸：spec 的下限（`Exactly` 保留其尺寸，
    /// 其余坍缩为 0）。
    fn collapsed_size(self) -> u32 {
        match self {
            Self::Exactly(size) => size,
            Self::AtMost(_) | Self::Unspecified => 0,
        }
    }

    /// ### English
    /// Upper bound for display-size calculation; `Unspecified` falls back to
    /// the frame's own axis (natural size).
    ///
    /// #### Parameters
    /// - `natural`: Frame size along this axis.
    ///
    /// ### 中文
    /// 显示尺寸计算的上界；`Unspecified` 回退为帧自身在该轴的尺寸
    /// （自然尺寸）。
    ///
    /// #### 参数
    /// - `natural`：帧在该轴的尺寸。
    fn max_size(self, natural: u32) -> u32 {
        match self {
            Self::Exactly(size) | Self::AtMost(size) => size,
            Self::Unspecified => natural,
        }
    }
}

/// ### English
/// Computes measured view dimensions from the scaling policy and the rotated
/// frame size. Distinct policies may apply depending on whether the frame and
/// layout orientations match.
///
/// ### 中文
/// 根据缩放策略与旋转后的帧尺寸计算测量出的 view 尺寸。帧与布局方向是否一致
/// 可应用不同的策略。
#[derive(Clone, Copy, Debug)]
pub struct VideoLayoutMeasure {
    /// ### English
    /// Policy when frame and layout orientations match.
    ///
    /// ### 中文
    /// 帧与布局方向一致时的策略。
    match_orientation: ScalingType,
    /// ### English
    /// Policy when frame and layout orientations differ.
    ///
    /// ### 中文
    /// 帧与布局方向不一致时的策略。
    mismatch_orientation: ScalingType,
}

impl Default for VideoLayoutMeasure {
    /// ### English
    /// Balanced scaling for both orientation cases.
    ///
    /// ### 中文
    /// 两种方向情况均采用 balanced 缩放。
    fn default() -> Self {
        Self {
            match_orientation: ScalingType::AspectBalanced,
            mismatch_orientation: ScalingType::AspectBalanced,
        }
    }
}

impl VideoLayoutMeasure {
    /// ### English
    /// Applies one policy to both orientation cases.
    ///
    /// #### Parameters
    /// - `scaling`: Policy for all frames.
    ///
    /// ### 中文
    /// 对两种方向情况应用同一策略。
    ///
    /// #### 参数
    /// - `scaling`：对所有帧生效的策略。
    pub fn set_scaling_type(&mut self, scaling: ScalingType) {
        self.match_orientation = scaling;
        self.mismatch_orientation = scaling;
    }

    /// ### English
    /// Applies distinct policies for matching and mismatching orientations.
    ///
    /// #### Parameters
    /// - `match_orientation`: Policy when frame and layout orientations match.
    /// - `mismatch_orientation`: Policy when they differ.
    ///
    /// ### 中文
    /// 为方向一致与不一致分别应用策略。
    ///
    /// #### 参数
    /// - `match_orientation`：方向一致时的策略。
    /// - `mismatch_orientation`：方向不一致时的策略。
    pub fn set_scaling_types(
        &mut self,
        match_orientation: ScalingType,
        mismatch_orientation: ScalingType,
    ) {
        self.match_orientation = match_orientation;
        self.mismatch_orientation = mismatch_orientation;
    }

    /// ### English
    /// Measures the view for the given constraints and rotated frame size.
    ///
    /// With an unknown frame size the result collapses to the spec minima.
    /// Otherwise the selected policy bounds the display size, and `Exactly`
    /// constraints override the corresponding axis.
    ///
    /// #### Parameters
    /// - `width_spec`: Horizontal constraint.
    /// - `height_spec`: Vertical constraint.
    /// - `frame_width`: Rotated frame width (0 when unknown).
    /// - `frame_height`: Rotated frame height (0 when unknown).
    ///
    /// ### 中文
    /// 根据约束与旋转后的帧尺寸测量 view。
    ///
    /// 帧尺寸未知时结果坍缩为 spec 下限；否则由所选策略约束显示尺寸，
    /// `Exactly` 约束覆盖对应轴。
    ///
    /// #### 参数
    /// - `width_spec`：水平约束。
    /// - `height_spec`：垂直约束。
    /// - `frame_width`：旋转后的帧宽度（未知时为 0）。
    /// - `frame_height`：旋转后的帧高度（未知时为 0）。
    pub fn measure(
        &self,
        width_spec: MeasureSpec,
        height_spec: MeasureSpec,
        frame_width: u32,
        frame_height: u32,
    ) -> PhysicalSize<u32> {
        if frame_width == 0 || frame_height == 0 {
            return PhysicalSize::new(width_spec.collapsed_size(), height_spec.collapsed_size());
        }

        let max_width = width_spec.max_size(frame_width);
        let max_height = height_spec.max_size(frame_height);
        if max_width == 0 || max_height == 0 {
            return PhysicalSize::new(max_width, max_height);
        }

        let frame_aspect = frame_width as f32 / frame_height as f32;
        let display_aspect = max_width as f32 / max_height as f32;
        let scaling = if (frame_aspect > 1.0) == (display_aspect > 1.0) {
            self.match_orientation
        } else {
            self.mismatch_orientation
        };

        let mut size = display_size(scaling.visible_fraction(), frame_aspect, max_width, max_height);
        if let MeasureSpec::Exactly(width) = width_spec {
            size.width = width;
        }
        if let MeasureSpec::Exactly(height) = height_spec {
            size.height = height;
        }
        size
    }
}

/// ### English
/// Largest display size that keeps at least `min_visible_fraction` of the
/// frame visible within the given bounds.
///
/// #### Parameters
/// - `min_visible_fraction`: Fraction of the frame that must stay visible.
/// - `frame_aspect`: Frame aspect ratio (width / height).
/// - `max_width`: Horizontal bound.
/// - `max_height`: Vertical bound.
///
/// ### 中文
/// 在给定边界内、保证帧至少 `min_visible_fraction` 可见的最大显示尺寸。
///
/// #### 参数
/// - `min_visible_fraction`：必须保持可见的帧比例。
/// - `frame_aspect`：帧宽高比（宽 / 高）。
/// - `max_width`：水平边界。
/// - `max_height`：垂直边界。
fn display_size(
    min_visible_fraction: f32,
    frame_aspect: f32,
    max_width: u32,
    max_height: u32,
) -> PhysicalSize<u32> {
    if min_visible_fraction == 0.0 || frame_aspect == 0.0 {
        return PhysicalSize::new(max_width, max_height);
    }
    let width = max_width.min(
        (max_height as f32 / min_visible_fraction * frame_aspect).round() as u32,
    );
    let height = max_height.min(
        (max_width as f32 / min_visible_fraction / frame_aspect).round() as u32,
    );
    PhysicalSize::new(width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_frame_collapses_to_spec_minima() {
        let measure = VideoLayoutMeasure::default();
        let size = measure.measure(MeasureSpec::AtMost(1280), MeasureSpec::Unspecified, 0, 0);
        assert_eq!(size, PhysicalSize::new(0, 0));

        let size = measure.measure(MeasureSpec::Exactly(1280), MeasureSpec::Exactly(720), 0, 480);
        assert_eq!(size, PhysicalSize::new(1280, 720));
    }

    #[test]
    fn exact_specs_override_both_axes() {
        let mut measure = VideoLayoutMeasure::default();
        measure.set_scaling_type(ScalingType::AspectFit);
        let size = measure.measure(
            MeasureSpec::Exactly(1280),
            MeasureSpec::Exactly(720),
            640,
            480,
        );
        assert_eq!(size, PhysicalSize::new(1280, 720));
    }

    #[test]
    fn fit_shrinks_the_unconstrained_axis() {
        let mut measure = VideoLayoutMeasure::default();
        measure.set_scaling_type(ScalingType::AspectFit);
        // 4:3 frame inside a 1280×720 box: width is the limiting axis.
        let size = measure.measure(
            MeasureSpec::AtMost(1280),
            MeasureSpec::AtMost(720),
            640,
            480,
        );
        assert_eq!(size, PhysicalSize::new(960, 720));
    }

    #[test]
    fn fill_uses_the_whole_box() {
        let mut measure = VideoLayoutMeasure::default();
        measure.set_scaling_type(ScalingType::AspectFill);
        let size = measure.measure(
            MeasureSpec::AtMost(1280),
            MeasureSpec::AtMost(720),
            640,
            480,
        );
        assert_eq!(size, PhysicalSize::new(1280, 720));
    }

    #[test]
    fn orientation_mismatch_selects_second_policy() {
        let mut measure = VideoLayoutMeasure::default();
        measure.set_scaling_types(ScalingType::AspectFill, ScalingType::AspectFit);
        // Portrait frame in a landscape box triggers the mismatch policy (fit).
        let size = measure.measure(
            MeasureSpec::AtMost(1280),
            MeasureSpec::AtMost(720),
            480,
            640,
        );
        assert_eq!(size, PhysicalSize::new(540, 720));
    }

    #[test]
    fn unspecified_axes_use_natural_frame_size() {
        let mut measure = VideoLayoutMeasure::default();
        measure.set_scaling_type(ScalingType::AspectFit);
        let size = measure.measure(MeasureSpec::Unspecified, MeasureSpec::Unspecified, 640, 480);
        assert_eq!(size, PhysicalSize::new(640, 480));
    }
}
