//! ### English
//! Lock-free handoff primitives used between the main thread, producer
//! threads, and the render thread.
//!
//! ### 中文
//! 主线程、生产者线程与渲染线程之间使用的无锁传递原语。

mod oneshot;
mod pending;

pub(crate) use oneshot::OneShot;
pub(crate) use pending::{PendingFrame, PendingResolution};
