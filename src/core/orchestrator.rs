use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;

use super::counter::ByteCounter;
use super::downloader::Downloader;
use super::error::{MeasureError, MeasureResult};
use super::events::{emit, EventSender, MeasureEvent};
use super::fetch::BodyFetcher;
use super::model::{DownloadTarget, RunResult, TargetFailure};
use super::sampler::RateSampler;

/// 单个下载失败时整个测速的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// 第一个失败即中止其余下载并返回错误
    #[default]
    Abort,
    /// 其余下载继续，失败记录随结果返回
    Continue,
}

#[derive(Debug, Clone)]
pub struct MeasureOptions {
    pub sample_interval: Duration,
    pub failure_policy: FailurePolicy,
}

impl Default for MeasureOptions {
    fn default() -> Self {
        Self {
            sample_interval: Duration::from_millis(500),
            failure_policy: FailurePolicy::Abort,
        }
    }
}

/// 并发下载所有地址并统计整体速率
pub struct Orchestrator {
    fetcher: Arc<dyn BodyFetcher>,
    options: MeasureOptions,
    events: EventSender,
}

impl Orchestrator {
    pub fn new(fetcher: Arc<dyn BodyFetcher>, options: MeasureOptions, events: EventSender) -> Self {
        Self {
            fetcher,
            options,
            events,
        }
    }

    pub fn options(&self) -> &MeasureOptions {
        &self.options
    }

    pub async fn run(&self, targets: Vec<DownloadTarget>) -> MeasureResult<RunResult> {
        log::info!("开始测速, 共 {} 个地址", targets.len());
        emit(&self.events, MeasureEvent::RunStarted { targets: targets.len() });

        let counter = Arc::new(ByteCounter::new());
        let mut sampler = RateSampler::new(self.options.sample_interval);
        sampler.start(Arc::clone(&counter), self.events.clone())?;

        let start = Instant::now();
        let downloader = Downloader::new(Arc::clone(&self.fetcher), self.events.clone());
        let mut tasks = JoinSet::new();
        for target in targets {
            let downloader = downloader.clone();
            let counter = Arc::clone(&counter);
            tasks.spawn(async move {
                let result = downloader.run(&target, &counter).await;
                (target, result)
            });
        }

        let outcome = self.wait_all(&mut tasks).await;
        sampler.stop().await;
        let failures = outcome?;

        let elapsed = start.elapsed();
        let result = RunResult::new(counter.total(), elapsed, failures);
        log::info!(
            "测速结束: {} 字节, 耗时 {:.2} 秒, 平均 {:.0} bps, 失败 {} 个",
            result.total_bytes,
            result.elapsed.as_secs_f64(),
            result.average_bits_per_second,
            result.failures.len()
        );
        emit(&self.events, MeasureEvent::RunFinished(result.clone()));
        Ok(result)
    }

    /// 等待所有下载结束；中止策略下遇到失败会先取消并回收其余任务再返回
    async fn wait_all(
        &self,
        tasks: &mut JoinSet<(DownloadTarget, MeasureResult<u64>)>,
    ) -> MeasureResult<Vec<TargetFailure>> {
        let mut failures = Vec::new();

        while let Some(joined) = tasks.join_next().await {
            let (target, result) = match joined {
                Ok(pair) => pair,
                Err(e) => {
                    log::error!("下载任务异常退出: {}", e);
                    abort_and_drain(tasks).await;
                    return Err(MeasureError::TaskPanicked(e.to_string()));
                }
            };

            let Err(error) = result else { continue };
            log::error!("下载失败: {} - {}", target.url, error);
            emit(
                &self.events,
                MeasureEvent::TargetFailed {
                    url: target.url.clone(),
                    error: error.to_string(),
                },
            );

            match self.options.failure_policy {
                FailurePolicy::Abort => {
                    abort_and_drain(tasks).await;
                    return Err(MeasureError::target_failed(target.url, error));
                }
                FailurePolicy::Continue => failures.push(TargetFailure {
                    url: target.url,
                    error: error.to_string(),
                }),
            }
        }

        Ok(failures)
    }
}

async fn abort_and_drain<T: 'static>(tasks: &mut JoinSet<T>) {
    tasks.abort_all();
    // 等到任务真正被回收，连接随之释放
    while tasks.join_next().await.is_some() {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::downloader::testing::{Script, ScriptedFetcher};
    use crate::core::events::{self, EventReceiver};

    fn orchestrator(fetcher: ScriptedFetcher, policy: FailurePolicy) -> (Orchestrator, EventReceiver) {
        let (tx, rx) = events::channel();
        let options = MeasureOptions {
            sample_interval: Duration::from_millis(50),
            failure_policy: policy,
        };
        (Orchestrator::new(Arc::new(fetcher), options, tx), rx)
    }

    #[tokio::test]
    async fn test_empty_targets() {
        let (orchestrator, _rx) = orchestrator(ScriptedFetcher::default(), FailurePolicy::Abort);

        let result = orchestrator.run(Vec::new()).await.unwrap();

        assert_eq!(result.total_bytes, 0);
        assert_eq!(result.average_bits_per_second, 0.0);
        assert!(result.failures.is_empty());
    }

    #[tokio::test]
    async fn test_single_target_mebibyte() {
        // 1 MiB，块大小不规则
        let chunks = vec![1, 65_535, 300_000, 16_384, 666_656];
        assert_eq!(chunks.iter().sum::<usize>(), 1_048_576);
        let fetcher = ScriptedFetcher::default()
            .with("mem://one", Script::chunks(chunks).with_delay(Duration::from_millis(2)));
        let (orchestrator, _rx) = orchestrator(fetcher, FailurePolicy::Abort);

        let result = orchestrator.run(vec![DownloadTarget::new("mem://one")]).await.unwrap();

        assert_eq!(result.total_bytes, 1_048_576);
        assert!(result.elapsed > Duration::ZERO);
        let expected = 1_048_576.0 * 8.0 / result.elapsed.as_secs_f64();
        assert!((result.average_bits_per_second - expected).abs() < 1e-6 * expected);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_fan_out_five_targets() {
        let mut fetcher = ScriptedFetcher::default();
        let mut targets = Vec::new();
        for i in 0..5u64 {
            let url = format!("mem://t{}", i);
            // 每个地址 1_000_000 字节，速度和分块各不相同
            let chunk = 10_000 * (i as usize + 1);
            let mut chunks = vec![chunk; 1_000_000 / chunk];
            chunks.push(1_000_000 - chunks.iter().sum::<usize>());
            let script = Script::chunks(chunks).with_delay(Duration::from_micros(200 * (5 - i)));
            fetcher = fetcher.with(&url, script);
            targets.push(DownloadTarget::new(url));
        }
        let (orchestrator, _rx) = orchestrator(fetcher, FailurePolicy::Abort);

        let result = orchestrator.run(targets).await.unwrap();

        assert_eq!(result.total_bytes, 5_000_000);
        assert!(result.is_complete());
    }

    #[tokio::test]
    async fn test_abort_policy_returns_first_failure() {
        let fetcher = ScriptedFetcher::default()
            .with("mem://ok", Script::chunks(vec![1_000; 1_000]).with_delay(Duration::from_millis(5)))
            .with("mem://bad", Script::chunks(vec![100, 100]).failing_after(1));
        let (orchestrator, mut rx) = orchestrator(fetcher, FailurePolicy::Abort);

        let err = orchestrator
            .run(vec![DownloadTarget::new("mem://ok"), DownloadTarget::new("mem://bad")])
            .await
            .unwrap_err();

        match err {
            MeasureError::TargetFailed { url, source } => {
                assert_eq!(url, "mem://bad");
                assert!(source.is_transport());
            }
            other => panic!("unexpected error: {:?}", other),
        }

        // 中止后不再有 RunFinished
        drop(orchestrator);
        let mut saw_failed = false;
        while let Some(event) = rx.recv().await {
            match event {
                MeasureEvent::TargetFailed { url, .. } => {
                    assert_eq!(url, "mem://bad");
                    saw_failed = true;
                }
                MeasureEvent::RunFinished(_) => panic!("aborted run must not finish"),
                _ => {}
            }
        }
        assert!(saw_failed);
    }

    #[tokio::test]
    async fn test_continue_policy_collects_failures() {
        let fetcher = ScriptedFetcher::default()
            .with("mem://a", Script::chunks(vec![400, 600]))
            .with("mem://b", Script::refused())
            .with("mem://c", Script::chunks(vec![500, 500, 500]).failing_after(2));
        let (orchestrator, _rx) = orchestrator(fetcher, FailurePolicy::Continue);

        let result = orchestrator
            .run(vec![
                DownloadTarget::new("mem://a"),
                DownloadTarget::new("mem://b"),
                DownloadTarget::new("mem://c"),
            ])
            .await
            .unwrap();

        // 失败地址已收到的完整数据块仍然计入
        assert_eq!(result.total_bytes, 2_000);
        let mut failed: Vec<_> = result.failures.iter().map(|f| f.url.as_str()).collect();
        failed.sort();
        assert_eq!(failed, vec!["mem://b", "mem://c"]);
        assert!(!result.is_complete());
    }

    #[tokio::test(start_paused = true)]
    async fn test_samples_never_exceed_total() {
        let fetcher = ScriptedFetcher::default()
            .with("mem://slow", Script::chunks(vec![2_048; 40]).with_delay(Duration::from_millis(10)));
        let (orchestrator, mut rx) = orchestrator(fetcher, FailurePolicy::Abort);

        let result = orchestrator.run(vec![DownloadTarget::new("mem://slow")]).await.unwrap();
        drop(orchestrator);

        let mut sampled = 0u64;
        let mut samples = 0;
        let mut finished = None;
        while let Some(event) = rx.recv().await {
            match event {
                MeasureEvent::Sample(sample) => {
                    sampled += sample.interval_bytes;
                    samples += 1;
                }
                MeasureEvent::RunFinished(r) => finished = Some(r),
                _ => {}
            }
        }

        assert!(samples >= 7);
        assert!(sampled <= result.total_bytes);
        assert_eq!(result.total_bytes, 81_920);
        assert_eq!(finished.map(|r| r.total_bytes), Some(81_920));
    }
}
