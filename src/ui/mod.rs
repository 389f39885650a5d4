mod progress;

use std::fmt;
use crate::core::model::RunResult;
pub use progress::{report, SpeedDisplay};

pub fn print_success(message: &str) {
    println!("✓ {}", message);
}

pub fn print_error(message: &str) {
    eprintln!("✗ {}", message);
}

/// 最终结果的文字摘要
pub struct RunSummary<'a>(pub &'a RunResult);

impl fmt::Display for RunSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.0;
        writeln!(f, "\n测速摘要:")?;
        writeln!(f, "总下载量: {}", format_size(result.total_bytes))?;
        writeln!(f, "耗时: {:.2}秒", result.elapsed.as_secs_f64())?;
        writeln!(f, "平均速率: {}", format_rate(result.average_bits_per_second))?;
        if !result.failures.is_empty() {
            writeln!(f, "失败: {}", result.failures.len())?;
            for failure in &result.failures {
                writeln!(f, "  - {}: {}", failure.url, failure.error)?;
            }
        }
        Ok(())
    }
}

const PREFIXES: [&str; 7] = ["", "K", "M", "G", "T", "P", "E"];

/// 以 1024 为进制换算，返回 (数值, 前缀)
fn scale(value: f64) -> (f64, &'static str) {
    let mut value = value;
    let mut index = 0;
    while value.abs() >= 1024.0 && index < PREFIXES.len() - 1 {
        value /= 1024.0;
        index += 1;
    }
    (value, PREFIXES[index])
}

pub fn format_size(bytes: u64) -> String {
    let (value, prefix) = scale(bytes as f64);
    format!("{:.2} {}B", value, prefix)
}

pub fn format_rate(bits_per_second: f64) -> String {
    let (value, prefix) = scale(bits_per_second);
    format!("{:.1} {}bps", value, prefix)
}
