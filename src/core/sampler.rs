use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use super::counter::ByteCounter;
use super::error::{MeasureError, MeasureResult};
use super::events::{emit, EventSender, MeasureEvent};
use super::model::RateSample;

enum State {
    Idle,
    Running {
        stop_tx: oneshot::Sender<()>,
        handle: JoinHandle<()>,
    },
    Stopped,
}

/// 周期性采样计数器增量并发布瞬时速率
///
/// 状态只会 `Idle -> Running -> Stopped` 单向推进。
/// `stop` 返回后不会再有新的采样事件。
pub struct RateSampler {
    interval: Duration,
    state: State,
}

impl RateSampler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            state: State::Idle,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, State::Running { .. })
    }

    pub fn start(&mut self, counter: Arc<ByteCounter>, events: EventSender) -> MeasureResult<()> {
        if !matches!(self.state, State::Idle) {
            return Err(MeasureError::SamplerState("采样器只能启动一次"));
        }
        if self.interval.is_zero() {
            return Err(MeasureError::SamplerState("采样周期必须大于0"));
        }

        let (stop_tx, stop_rx) = oneshot::channel();
        let handle = tokio::spawn(sample_loop(counter, self.interval, events, stop_rx));
        self.state = State::Running { stop_tx, handle };
        log::debug!("速率采样器已启动, 周期 {:?}", self.interval);
        Ok(())
    }

    /// 停止采样并等待后台任务退出，可重复调用
    pub async fn stop(&mut self) {
        match std::mem::replace(&mut self.state, State::Stopped) {
            State::Running { stop_tx, handle } => {
                let _ = stop_tx.send(());
                if let Err(e) = handle.await {
                    log::warn!("速率采样任务异常退出: {}", e);
                }
                log::debug!("速率采样器已停止");
            }
            State::Idle | State::Stopped => {}
        }
    }
}

impl Drop for RateSampler {
    fn drop(&mut self) {
        if let State::Running { handle, .. } = &self.state {
            handle.abort();
        }
    }
}

async fn sample_loop(
    counter: Arc<ByteCounter>,
    period: Duration,
    events: EventSender,
    mut stop_rx: oneshot::Receiver<()>,
) {
    // 第一次采样在一个完整周期之后
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            // 发送端被丢弃同样视为停止
            _ = &mut stop_rx => break,

            _ = ticker.tick() => {
                let delta = counter.sample_delta();
                let sample = RateSample::from_interval(delta, period);
                log::debug!("瞬时速率: {:.0} bps ({} 字节)", sample.bits_per_second, delta);
                emit(&events, MeasureEvent::Sample(sample));
            }
        }
    }
}
