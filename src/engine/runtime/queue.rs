//! ### English
//! Command queue feeding the render thread.
//!
//! ### 中文
//! 供给渲染线程的命令队列。

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;

use crossbeam_channel as channel;

use super::command::Command;

/// ### English
/// Single-consumer command queue used by the main and producer threads to
/// send work to the render thread.
///
/// Release semantics: `begin_discard` makes the consumer skip already-queued
/// `Render`/`SetEncoder` messages, and `close` rejects new producers and
/// completes the rendezvous of any leftover commands so no waiter hangs.
///
/// ### 中文
/// 主线程与生产者线程向渲染线程提交工作的单消费者命令队列。
///
/// release 语义：`begin_discard` 使消费端跳过已入队的 `Render`/`SetEncoder`
/// 消息；`close` 拒绝新的生产者，并补完遗留命令的会合，确保没有等待方被挂起。
pub(crate) struct CommandQueue {
    /// ### English
    /// Producer side of the underlying unbounded channel.
    ///
    /// ### 中文
    /// 底层无界 channel 的生产端。
    sender: channel::Sender<Command>,
    /// ### English
    /// Consumer side, drained only by the render thread (and by `close`).
    ///
    /// ### 中文
    /// 消费端：仅由渲染线程（以及 `close`）drain。
    receiver: channel::Receiver<Command>,
    /// ### English
    /// Number of producers currently publishing into the queue.
    ///
    /// ### 中文
    /// 当前正在向队列发布的生产者数量。
    in_flight: AtomicUsize,
    /// ### English
    /// Close flag used to reject new commands during shutdown.
    ///
    /// ### 中文
    /// 关闭标记：用于在 shutdown 期间拒绝新命令。
    closed: AtomicBool,
    /// ### English
    /// Once set, queued `Render`/`SetEncoder` messages are skipped by the
    /// consumer (release removes pending draw work).
    ///
    /// ### 中文
    /// 置位后，消费端跳过已入队的 `Render`/`SetEncoder` 消息
    /// （release 会移除待绘制工作）。
    discard_draw_work: AtomicBool,
}

impl CommandQueue {
    /// ### English
    /// Creates a new open command queue.
    ///
    /// ### 中文
    /// 创建一个处于 open 状态的新命令队列。
    pub(crate) fn new() -> Self {
        let (sender, receiver) = channel::unbounded();
        Self {
            sender,
            receiver,
            in_flight: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
            discard_draw_work: AtomicBool::new(false),
        }
    }

    /// ### English
    /// Enqueues one command, dropping it if the queue is closing. Use
    /// [`Self::try_push`] when the caller must observe success/failure.
    ///
    /// #### Parameters
    /// - `command`: Command to push.
    ///
    /// ### 中文
    /// push 一个命令；队列关闭中时直接丢弃。若调用方需要感知成功/失败，
    /// 请使用 [`Self::try_push`]。
    ///
    /// #### 参数
    /// - `command`：要 push 的命令。
    pub(crate) fn push(&self, command: Command) {
        let _ = self.try_push(command);
    }

    /// ### English
    /// Tries to push one command; returns `false` if the queue is closed.
    ///
    /// #### Parameters
    /// - `command`: Command to push.
    ///
    /// ### 中文
    /// 尝试 push 一个命令；若队列已关闭则返回 `false`。
    ///
    /// #### 参数
    /// - `command`：要 push 的命令。
    pub(crate) fn try_push(&self, command: Command) -> bool {
        if self.closed.load(Ordering::Acquire) {
            return false;
        }
        self.in_flight.fetch_add(1, Ordering::Relaxed);
        if self.closed.load(Ordering::Acquire) {
            self.in_flight.fetch_sub(1, Ordering::Release);
            return false;
        }

        let sent = self.sender.send(command).is_ok();
        self.in_flight.fetch_sub(1, Ordering::Release);
        sent
    }

    /// ### English
    /// Blocks for the next command, skipping draw work while discarding.
    /// Returns `None` once the queue is closed and drained.
    ///
    /// ### 中文
    /// 阻塞等待下一个命令；处于 discard 状态时跳过绘制工作。
    /// 队列关闭且 drain 完毕后返回 `None`。
    pub(crate) fn pop(&self) -> Option<Command> {
        loop {
            let command = self.receiver.recv().ok()?;
            if self.discard_draw_work.load(Ordering::Acquire)
                && matches!(command, Command::Render | Command::SetEncoder(_))
            {
                continue;
            }
            return Some(command);
        }
    }

    /// ### English
    /// Makes the consumer skip queued `Render`/`SetEncoder` messages from
    /// now on. Called when release begins.
    ///
    /// ### 中文
    /// 使消费端从现在起跳过已入队的 `Render`/`SetEncoder` 消息。
    /// 在 release 开始时调用。
    pub(crate) fn begin_discard(&self) {
        self.discard_draw_work.store(true, Ordering::Release);
    }

    /// ### English
    /// Closes the queue and drains any remaining commands (idempotent).
    ///
    /// Waits for in-flight producers to finish publishing, then completes
    /// every leftover rendezvous so blocked callers observe the
    /// released-renderer signal instead of hanging.
    ///
    /// ### 中文
    /// 关闭队列并 drain 所有剩余命令（幂等）。
    ///
    /// 先等待进行中的生产者完成发布，再补完所有遗留会合，让被阻塞的调用方
    /// 收到“渲染器已释放”的信号而不是被挂起。
    pub(crate) fn close(&self) {
        self.closed.store(true, Ordering::Release);
        while self.in_flight.load(Ordering::Acquire) != 0 {
            thread::yield_now();
        }
        while let Ok(command) = self.receiver.try_recv() {
            match command {
                Command::CreateSurface { response } => {
                    let _ = response.send(Err("Renderer is released".to_string()));
                }
                Command::CaptureStill { response, .. } => {
                    let _ = response.send(Err("Renderer is released".to_string()));
                }
                Command::Resize { response, .. } => {
                    let _ = response.send(());
                }
                Command::UnbindWindow { response } => {
                    let _ = response.send(());
                }
                Command::Render
                | Command::SetEncoder(_)
                | Command::SetMirror(_)
                | Command::SetFpsReduction(_)
                | Command::SetLayoutAspectRatio(_)
                | Command::ClearImage
                | Command::BindWindow { .. }
                | Command::Terminate => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::lockfree::OneShot;
    use std::sync::Arc;

    #[test]
    fn discard_skips_draw_work_but_keeps_control_messages() {
        let queue = CommandQueue::new();
        queue.push(Command::Render);
        queue.push(Command::SetEncoder(None));
        queue.push(Command::SetMirror(true));
        queue.push(Command::Terminate);

        queue.begin_discard();
        assert!(matches!(queue.pop(), Some(Command::SetMirror(true))));
        assert!(matches!(queue.pop(), Some(Command::Terminate)));
    }

    #[test]
    fn close_rejects_new_commands() {
        let queue = CommandQueue::new();
        queue.close();
        assert!(!queue.try_push(Command::Render));
    }

    #[test]
    fn close_completes_leftover_rendezvous() {
        let queue = CommandQueue::new();
        let create = Arc::new(OneShot::new());
        let resize = Arc::new(OneShot::new());
        queue.push(Command::CreateSurface {
            response: create.clone(),
        });
        queue.push(Command::Resize {
            size: dpi::PhysicalSize::new(800, 600),
            response: resize.clone(),
        });

        queue.close();
        assert!(matches!(create.try_recv(), Some(Err(_))));
        assert_eq!(resize.try_recv(), Some(()));
        // A second close over the drained queue is a no-op.
        queue.close();
    }
}
