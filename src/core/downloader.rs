use futures::StreamExt;
use std::sync::Arc;

use super::counter::ByteCounter;
use super::error::MeasureResult;
use super::events::{emit, EventSender, MeasureEvent};
use super::fetch::BodyFetcher;
use super::model::DownloadTarget;

/// 单个地址的计量下载
///
/// 数据只用于计数，不落盘。每收到一个完整的数据块才计入计数器，
/// 出错的读取不会产生任何累加。
#[derive(Clone)]
pub struct Downloader {
    fetcher: Arc<dyn BodyFetcher>,
    events: EventSender,
}

impl Downloader {
    pub fn new(fetcher: Arc<dyn BodyFetcher>, events: EventSender) -> Self {
        Self { fetcher, events }
    }

    /// 下载直到数据流结束或出错，返回本地址收到的字节数
    pub async fn run(&self, target: &DownloadTarget, counter: &ByteCounter) -> MeasureResult<u64> {
        log::info!("开始下载: {}", target.url);
        emit(&self.events, MeasureEvent::TargetStarted { url: target.url.clone() });

        let mut stream = self.fetcher.open(&target.url).await?;
        let mut received = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            let len = chunk.len() as u64;
            counter.add(len);
            received += len;
        }

        log::info!("下载完成: {} ({} 字节)", target.url, received);
        emit(
            &self.events,
            MeasureEvent::TargetFinished {
                url: target.url.clone(),
                bytes: received,
            },
        );
        Ok(received)
    }
}
