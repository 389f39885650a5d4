use tokio::sync::mpsc;

use super::model::{RateSample, RunResult};

/// 测速过程中对外发布的事件
#[derive(Debug, Clone)]
pub enum MeasureEvent {
    RunStarted { targets: usize },
    TargetStarted { url: String },
    TargetFinished { url: String, bytes: u64 },
    TargetFailed { url: String, error: String },
    Sample(RateSample),
    RunFinished(RunResult),
}

pub type EventSender = mpsc::UnboundedSender<MeasureEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<MeasureEvent>;

pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// 接收端已关闭时静默丢弃
pub fn emit(tx: &EventSender, event: MeasureEvent) {
    let _ = tx.send(event);
}
