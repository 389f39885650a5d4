use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use reqwest::Client;
use std::time::Duration;

use crate::config::Config;
use super::error::{MeasureError, MeasureResult};

/// 响应体数据流
pub type BodyStream = BoxStream<'static, MeasureResult<Bytes>>;

/// 打开一个地址并以数据块流的形式返回响应体
#[async_trait]
pub trait BodyFetcher: Send + Sync {
    async fn open(&self, url: &str) -> MeasureResult<BodyStream>;
}

/// 按配置构建共享的 HTTP 客户端
pub fn build_client(config: &Config) -> MeasureResult<Client> {
    let client = Client::builder()
        .connect_timeout(Duration::from_secs(config.connect_timeout))
        .user_agent(&config.user_agent)
        .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
        .build()?;
    Ok(client)
}

/// 基于 reqwest 的 HTTP(S) GET 实现
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_config(config: &Config) -> MeasureResult<Self> {
        Ok(Self::new(build_client(config)?))
    }
}

#[async_trait]
impl BodyFetcher for HttpFetcher {
    async fn open(&self, url: &str) -> MeasureResult<BodyStream> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(MeasureError::HttpStatus {
                url: url.to_string(),
                status,
            });
        }
        log::debug!("{} 已连接, content-length: {:?}", url, response.content_length());

        Ok(response.bytes_stream().map_err(MeasureError::from).boxed())
    }
}
