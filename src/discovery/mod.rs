//! 测速地址来源
//!
//! - `StaticUrls`: 用户直接给出的地址
//! - `FastComSupplier`: 从 fast.com 页面脚本中取得 token，再向其 API 请求测速地址

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;

use crate::core::error::{MeasureError, MeasureResult};
use crate::core::model::DownloadTarget;
use crate::utils::validator;

pub const FAST_COM_SITE: &str = "https://fast.com";
pub const FAST_COM_API: &str = "https://api.fast.com";

/// 按顺序提供测速地址
#[async_trait]
pub trait UrlSupplier: Send + Sync {
    async fn targets(&self) -> MeasureResult<Vec<DownloadTarget>>;
}

/// 固定地址列表
#[derive(Debug, Clone)]
pub struct StaticUrls {
    urls: Vec<String>,
}

impl StaticUrls {
    pub fn new(urls: Vec<String>) -> Self {
        Self { urls }
    }
}

#[async_trait]
impl UrlSupplier for StaticUrls {
    async fn targets(&self) -> MeasureResult<Vec<DownloadTarget>> {
        validator::validate_urls(&self.urls)?;
        Ok(self.urls.iter().cloned().map(DownloadTarget::from).collect())
    }
}

/// API 旧版本直接返回数组，新版本包在 `targets` 字段里
#[derive(Deserialize)]
#[serde(untagged)]
enum SpeedtestResponse {
    List(Vec<DownloadTarget>),
    Wrapped { targets: Vec<DownloadTarget> },
}

impl SpeedtestResponse {
    fn into_targets(self) -> Vec<DownloadTarget> {
        match self {
            SpeedtestResponse::List(targets) => targets,
            SpeedtestResponse::Wrapped { targets } => targets,
        }
    }
}

pub struct FastComSupplier {
    client: Client,
    site_base: String,
    api_base: String,
    url_count: usize,
    script_re: Regex,
    token_re: Regex,
}

impl FastComSupplier {
    pub fn new(client: Client, url_count: usize) -> MeasureResult<Self> {
        Self::with_endpoints(client, FAST_COM_SITE, FAST_COM_API, url_count)
    }

    pub fn with_endpoints(
        client: Client,
        site_base: &str,
        api_base: &str,
        url_count: usize,
    ) -> MeasureResult<Self> {
        Ok(Self {
            client,
            site_base: site_base.trim_end_matches('/').to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
            url_count,
            script_re: Regex::new(r#"src="/app-(.*?)\.js""#)?,
            token_re: Regex::new(r#"token:"(.*?)""#)?,
        })
    }

    async fn fetch_text(&self, url: &str) -> MeasureResult<String> {
        log::debug!("请求: {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(MeasureError::HttpStatus {
                url: url.to_string(),
                status,
            });
        }
        Ok(response.text().await?)
    }

    fn capture(re: &Regex, text: &str) -> Option<String> {
        re.captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .filter(|s| !s.is_empty())
    }

    fn script_id(&self, html: &str) -> MeasureResult<String> {
        Self::capture(&self.script_re, html)
            .ok_or_else(|| MeasureError::discovery("页面中未找到 app-*.js 脚本，页面结构可能已变化"))
    }

    fn token(&self, script: &str) -> MeasureResult<String> {
        Self::capture(&self.token_re, script)
            .ok_or_else(|| MeasureError::discovery("脚本中未找到 token，字段可能已改名"))
    }

    fn parse_targets(body: &str) -> MeasureResult<Vec<DownloadTarget>> {
        let response: SpeedtestResponse = serde_json::from_str(body)
            .map_err(|e| MeasureError::discovery(format!("无法解析测速地址列表: {}", e)))?;
        Ok(response.into_targets())
    }
}

#[async_trait]
impl UrlSupplier for FastComSupplier {
    async fn targets(&self) -> MeasureResult<Vec<DownloadTarget>> {
        let html = self.fetch_text(&self.site_base).await?;
        let script_id = self.script_id(&html)?;

        let script_url = format!("{}/app-{}.js", self.site_base, script_id);
        let script = self.fetch_text(&script_url).await?;
        let token = self.token(&script)?;
        log::debug!("取得 token, 脚本: {}", script_url);

        let api_url = format!(
            "{}/netflix/speedtest?https=true&token={}&urlCount={}",
            self.api_base, token, self.url_count
        );
        let body = self.fetch_text(&api_url).await?;
        let targets = Self::parse_targets(&body)?;

        if targets.is_empty() {
            return Err(MeasureError::discovery("测速地址列表为空"));
        }
        log::info!("获取到 {} 个测速地址", targets.len());
        Ok(targets)
    }
}
