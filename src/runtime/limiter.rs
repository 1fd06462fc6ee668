use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::time::{sleep, Instant};
use tracing::debug;

pub type Action = Box<dyn FnOnce() + Send + 'static>;

struct LimiterState {
    queue: VecDeque<Action>,
    window_start: Option<Instant>,
    count: u32,
}

/// 滑动窗口限流器
///
/// 每 `per` 时间窗口内最多执行 `to` 个动作，超出的动作按 FIFO 排队延后执行，不会丢弃。
/// 注意：被延后的检查同样会累加 `count`，积压时实际吞吐可能低于 `to`。
#[derive(Clone)]
pub struct RateLimiter {
    state: Arc<Mutex<LimiterState>>,
    to: u32,
    per: Duration,
    handle: Handle,
}

impl RateLimiter {
    pub fn new(to: u32, per: Duration, handle: Handle) -> Self {
        Self {
            state: Arc::new(Mutex::new(LimiterState {
                queue: VecDeque::new(),
                window_start: None,
                count: 0,
            })),
            to: to.max(1),
            per,
            handle,
        }
    }

    pub fn enqueue(&self, action: Action) {
        self.admit(Some(action));
    }

    /// 队列中尚未执行的动作数
    pub fn pending(&self) -> usize {
        self.lock().queue.len()
    }

    /// 当前窗口内的尝试次数（含被延后的检查）
    pub fn attempts_in_window(&self) -> u32 {
        self.lock().count
    }

    fn admit(&self, action: Option<Action>) {
        let ready = {
            let mut state = self.lock();
            if let Some(action) = action {
                state.queue.push_back(action);
            }

            let now = Instant::now();
            let mut remaining = match state.window_start {
                Some(start) => self.per.saturating_sub(now.duration_since(start)),
                None => Duration::ZERO,
            };
            if remaining.is_zero() {
                state.window_start = Some(now);
                state.count = 0;
                remaining = self.per;
            }

            state.count = state.count.saturating_add(1);
            if state.count <= self.to {
                state.queue.pop_front()
            } else {
                debug!(
                    "[Limiter] Window full ({} attempts), re-check in {:?}",
                    state.count, remaining
                );
                let limiter = self.clone();
                self.handle.spawn(async move {
                    sleep(remaining).await;
                    limiter.admit(None);
                });
                None
            }
        };

        if let Some(action) = ready {
            action();
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LimiterState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
