use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 一个待下载的测速地址
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadTarget {
    pub url: String,
}

impl DownloadTarget {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl From<&str> for DownloadTarget {
    fn from(url: &str) -> Self {
        Self::new(url)
    }
}

impl From<String> for DownloadTarget {
    fn from(url: String) -> Self {
        Self { url }
    }
}

/// 一个采样周期内的瞬时速率
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RateSample {
    pub interval_bytes: u64,
    pub bits_per_second: f64,
}

impl RateSample {
    /// 按实际采样周期换算：bytes * 8 / 周期秒数
    pub fn from_interval(interval_bytes: u64, interval: Duration) -> Self {
        Self {
            interval_bytes,
            bits_per_second: bits_per_second(interval_bytes, interval),
        }
    }
}

/// 单个地址的失败记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetFailure {
    pub url: String,
    pub error: String,
}

/// 一次完整测速的结果
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub total_bytes: u64,
    pub elapsed: Duration,
    pub average_bits_per_second: f64,
    pub failures: Vec<TargetFailure>,
}

impl RunResult {
    pub fn new(total_bytes: u64, elapsed: Duration, failures: Vec<TargetFailure>) -> Self {
        Self {
            total_bytes,
            elapsed,
            average_bits_per_second: bits_per_second(total_bytes, elapsed),
            failures,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// 耗时为零时速率定义为 0
pub fn bits_per_second(bytes: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return 0.0;
    }
    bytes as f64 * 8.0 / secs
}
