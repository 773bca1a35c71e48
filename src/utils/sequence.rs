use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// 发起请求时领取的序号
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

impl Ticket {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// 单调递增的请求序号，用于丢弃过期的异步响应。
///
/// 每次发请求前调用 [`RequestSequence::issue`]，响应到达后只有序号仍是
/// 最新的才会被应用。克隆共享同一个计数器。
#[derive(Debug, Clone, Default)]
pub struct RequestSequence {
    latest: Arc<AtomicU64>,
}

impl RequestSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// 序号过期时返回 None
    pub fn apply<T>(&self, ticket: Ticket, value: T) -> Option<T> {
        if self.is_current(ticket) {
            Some(value)
        } else {
            tracing::debug!(
                ticket = ticket.0,
                latest = self.latest.load(Ordering::SeqCst),
                "dropping stale response"
            );
            None
        }
    }
}
