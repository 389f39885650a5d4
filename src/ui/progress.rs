use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::core::events::{EventReceiver, MeasureEvent};
use crate::core::model::RunResult;
use super::format_rate;

// 结构体：SpeedDisplay
// 用一个 spinner 显示最近一次的瞬时速率
pub struct SpeedDisplay {
    bar: ProgressBar,
}

impl SpeedDisplay {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} [{elapsed_precise}] {prefix} {msg}") {
            bar.set_style(style);
        }
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }

    /// 不输出到终端，用于 JSON 模式和测试
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.bar.is_hidden()
    }

    pub fn message(&self) -> String {
        self.bar.message()
    }

    pub fn set_targets(&self, targets: usize, active: usize) {
        self.bar.set_prefix(format!("{}/{}", active, targets));
    }

    pub fn update_speed(&self, bits_per_second: f64) {
        self.bar.set_message(format!("当前速度: {}", format_rate(bits_per_second)));
    }

    pub fn println(&self, line: String) {
        self.bar.println(line);
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for SpeedDisplay {
    fn default() -> Self {
        Self::new()
    }
}

/// 消费事件直到通道关闭，返回收到的最终结果
pub async fn report(mut events: EventReceiver, display: SpeedDisplay) -> Option<RunResult> {
    let mut targets = 0;
    let mut active = 0;
    let mut finished = None;

    while let Some(event) = events.recv().await {
        match event {
            MeasureEvent::RunStarted { targets: n } => {
                targets = n;
                display.set_targets(targets, active);
            }
            MeasureEvent::TargetStarted { url } => {
                active += 1;
                display.set_targets(targets, active);
                log::debug!("连接: {}", url);
            }
            MeasureEvent::TargetFinished { .. } => {
                active = active.saturating_sub(1);
                display.set_targets(targets, active);
            }
            MeasureEvent::TargetFailed { url, error } => {
                active = active.saturating_sub(1);
                display.set_targets(targets, active);
                display.println(format!("✗ {}: {}", url, error));
            }
            MeasureEvent::Sample(sample) => {
                // 没有终端可画时退回到逐条日志
                if display.is_hidden() {
                    log::info!("速度 {}", format_rate(sample.bits_per_second));
                }
                display.update_speed(sample.bits_per_second);
            }
            MeasureEvent::RunFinished(result) => finished = Some(result),
        }
    }

    display.finish();
    finished
}
