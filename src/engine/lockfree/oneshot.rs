//! ### English
//! One-shot rendezvous: a single-slot, single-producer single-consumer value
//! handoff built on park/unpark.
//!
//! This is the rendezvous primitive behind render-thread startup,
//! `CreateSurface`/`Resize` acknowledgements, still-image capture, and
//! surface teardown. The typed payload doubles as the spurious-wakeup guard:
//! a woken receiver re-checks the slot state and parks again if the value has
//! not actually been published.
//!
//! ### 中文
//! 一次性会合原语：基于 park/unpark 的单槽位、单生产者/单消费者值传递。
//!
//! 渲染线程启动、`CreateSurface`/`Resize` 应答、静态截图与 surface 销毁都经由
//! 它会合。类型化载荷同时充当虚假唤醒保护：被唤醒的接收方会复查槽位状态，
//! 若值尚未发布则继续 park。

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicU8, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// ### English
/// Slot is empty; no value has been sent.
///
/// ### 中文
/// 槽位为空；尚未发送值。
const EMPTY: u8 = 0;
/// ### English
/// Sender is writing the payload.
///
/// ### 中文
/// 发送方正在写入载荷。
const WRITING: u8 = 1;
/// ### English
/// Payload is published and may be taken.
///
/// ### 中文
/// 载荷已发布，可被取走。
const READY: u8 = 2;
/// ### English
/// Payload was taken by the receiver.
///
/// ### 中文
/// 载荷已被接收方取走。
const TAKEN: u8 = 3;

/// ### English
/// Single-use value handoff. The receiver thread is captured at construction
/// so the sender can `unpark()` it after publishing.
///
/// ### 中文
/// 一次性的值传递。构造时记录接收方线程，发送方发布后据此 `unpark()` 唤醒。
pub(crate) struct OneShot<T> {
    /// ### English
    /// Slot state machine (`EMPTY → WRITING → READY → TAKEN`).
    ///
    /// ### 中文
    /// 槽位状态机（`EMPTY → WRITING → READY → TAKEN`）。
    state: AtomicU8,
    /// ### English
    /// Payload storage written by the sender, read by the receiver.
    ///
    /// ### 中文
    /// 载荷存储区：由发送方写入、由接收方读取。
    value: UnsafeCell<MaybeUninit<T>>,
    /// ### English
    /// Receiver thread to `unpark()` on publish.
    ///
    /// ### 中文
    /// 发布后需要 `unpark()` 的接收方线程。
    waiter: thread::Thread,
}

unsafe impl<T: Send> Send for OneShot<T> {}
unsafe impl<T: Send> Sync for OneShot<T> {}

impl<T> OneShot<T> {
    /// ### English
    /// Creates a slot whose receiver is the calling thread.
    ///
    /// ### 中文
    /// 创建一个以当前线程为接收方的槽位。
    pub(crate) fn new() -> Self {
        Self {
            state: AtomicU8::new(EMPTY),
            value: UnsafeCell::new(MaybeUninit::uninit()),
            waiter: thread::current(),
        }
    }

    /// ### English
    /// Publishes the value and wakes the receiver. Returns `false` if a value
    /// was already sent.
    ///
    /// #### Parameters
    /// - `value`: Payload to publish.
    ///
    /// ### 中文
    /// 发布值并唤醒接收方；若已发送过则返回 `false`。
    ///
    /// #### 参数
    /// - `value`：要发布的载荷。
    pub(crate) fn send(&self, value: T) -> bool {
        if self
            .state
            .compare_exchange(EMPTY, WRITING, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return false;
        }

        unsafe {
            (*self.value.get()).write(value);
        }
        self.state.store(READY, Ordering::Release);
        self.waiter.unpark();
        true
    }

    /// ### English
    /// Takes the value if it has been published (non-blocking).
    ///
    /// ### 中文
    /// 若值已发布则取走（非阻塞）。
    pub(crate) fn try_recv(&self) -> Option<T> {
        self.state
            .compare_exchange(READY, TAKEN, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| unsafe { (*self.value.get()).assume_init_read() })
    }

    /// ### English
    /// Blocks until the value is published.
    ///
    /// There is no cancellation here: waiters that must not hang forever are
    /// unblocked by the sender completing the slot with an error payload
    /// during teardown.
    ///
    /// ### 中文
    /// 阻塞等待值被发布。
    ///
    /// 本方法不支持取消：不允许无限等待的场景，由发送方在销毁流程中用错误
    /// 载荷完成槽位来解除阻塞。
    pub(crate) fn recv(&self) -> T {
        loop {
            if let Some(value) = self.try_recv() {
                return value;
            }
            thread::park();
        }
    }

    /// ### English
    /// Waits for the value up to `timeout`; returns `None` on expiry.
    ///
    /// #### Parameters
    /// - `timeout`: Maximum wait duration.
    ///
    /// ### 中文
    /// 在 `timeout` 内等待值；超时返回 `None`。
    ///
    /// #### 参数
    /// - `timeout`：最长等待时间。
    pub(crate) fn recv_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(value) = self.try_recv() {
                return Some(value);
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            thread::park_timeout(deadline - now);
        }
    }
}

impl<T> Drop for OneShot<T> {
    fn drop(&mut self) {
        if self.state.load(Ordering::Acquire) == READY {
            unsafe {
                drop((*self.value.get()).assume_init_read());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn send_then_recv_delivers_value() {
        let slot = Arc::new(OneShot::new());
        let sender = slot.clone();
        let join = thread::spawn(move || {
            assert!(sender.send(42u32));
        });
        assert_eq!(slot.recv(), 42);
        join.join().unwrap();
    }

    #[test]
    fn second_send_is_rejected() {
        let slot = OneShot::new();
        assert!(slot.send(1));
        assert!(!slot.send(2));
        assert_eq!(slot.try_recv(), Some(1));
        assert_eq!(slot.try_recv(), None);
    }

    #[test]
    fn recv_timeout_expires_without_sender() {
        let slot: OneShot<u32> = OneShot::new();
        assert_eq!(slot.recv_timeout(Duration::from_millis(20)), None);
    }

    #[test]
    fn unrelated_unpark_does_not_fabricate_value() {
        let slot: Arc<OneShot<u32>> = Arc::new(OneShot::new());
        let waiter = thread::current();
        let poker = thread::spawn(move || {
            // Wake the receiver without publishing; it must keep waiting.
            for _ in 0..4 {
                waiter.unpark();
                thread::sleep(Duration::from_millis(1));
            }
        });
        assert_eq!(slot.recv_timeout(Duration::from_millis(30)), None);
        poker.join().unwrap();
    }
}
