//! ### English
//! `webrtc_preview_engine` crate root.
//! Preview rendering core for a WebRTC capture pipeline: camera frames are
//! handed to a dedicated render thread that owns the GPU context, composites
//! onto an on-screen window surface, and can fork the same texture into a
//! hardware video encoder. The public API is re-exported here; the
//! implementation lives under `engine`.
//!
//! ### 中文
//! `webrtc_preview_engine` 的 crate 根。
//! WebRTC 采集管线的预览渲染核心：摄像头帧交给持有 GPU 上下文的独立渲染线程，
//! 合成到屏幕 window surface，并可把同一纹理转发给硬件视频编码器。
//! 对外 API 在此 re-export；具体实现位于 `engine` 模块。

mod engine;

pub use engine::encoder::{
    GenericVideoEncoder, HardwareVideoEncoder, RenderContextHandle, VideoEncoder,
};
pub use engine::events::RendererEvents;
pub use engine::frame::{FrameBuffer, FrameRotation, VideoFrame};
pub use engine::rendering::drawer::{DrawerFactory, FrameDrawer, GlDrawer};
pub use engine::rendering::egl::ConfigAttributes;
pub use engine::rendering::input::PreviewSurface;
pub use engine::view::layout::{MeasureSpec, ScalingType, VideoLayoutMeasure};
pub use engine::view::{InitConfig, ViewRenderer, WindowHost};
