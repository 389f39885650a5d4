use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// 一次测速中所有并发下载共享的字节计数器
///
/// `add` 只做一次原子加法，不会因为采样而等待；
/// `sample_delta` 在一个很短的临界区内推进 `last_sampled`，
/// 保证 `last_sampled <= total` 且各次采样的差值之和不重不漏。
#[derive(Debug, Default)]
pub struct ByteCounter {
    total: AtomicU64,
    last_sampled: Mutex<u64>,
}

impl ByteCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 累加收到的字节数
    pub fn add(&self, n: u64) {
        self.total.fetch_add(n, Ordering::AcqRel);
    }

    /// 返回自上次采样以来新增的字节数，并把采样点推进到当前总量
    pub fn sample_delta(&self) -> u64 {
        // 锁中毒只可能来自采样方 panic，计数本身仍然有效
        let mut last = self
            .last_sampled
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let total = self.total.load(Ordering::Acquire);
        let delta = total - *last;
        *last = total;
        delta
    }

    /// 当前总字节数，不影响采样点
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Acquire)
    }
}
