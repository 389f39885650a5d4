use thiserror::Error;
use std::io;

/// 测速过程中的错误
#[derive(Error, Debug)]
pub enum MeasureError {
    #[error("网络错误: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO错误: {0}")]
    Io(#[from] io::Error),

    #[error("无效的URL: {0}")]
    InvalidUrl(String),

    #[error("服务器返回 {status}: {url}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("数据流错误: {0}")]
    Stream(String),

    #[error("获取下载地址失败: {0}")]
    Discovery(String),

    #[error("正则表达式错误: {0}")]
    Regex(#[from] regex::Error),

    #[error("配置错误: {0}")]
    Config(String),

    #[error("采样器状态错误: {0}")]
    SamplerState(&'static str),

    #[error("下载任务异常退出: {0}")]
    TaskPanicked(String),

    #[error("下载 {url} 失败: {source}")]
    TargetFailed {
        url: String,
        #[source]
        source: Box<MeasureError>,
    },
}

impl MeasureError {
    /// 连接、读流或 HTTP 状态引起的错误
    pub fn is_transport(&self) -> bool {
        match self {
            MeasureError::Network(_)
            | MeasureError::HttpStatus { .. }
            | MeasureError::Stream(_) => true,
            MeasureError::TargetFailed { source, .. } => source.is_transport(),
            _ => false,
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        MeasureError::Config(msg.into())
    }

    pub fn discovery(msg: impl Into<String>) -> Self {
        MeasureError::Discovery(msg.into())
    }

    pub fn target_failed(url: impl Into<String>, source: MeasureError) -> Self {
        MeasureError::TargetFailed {
            url: url.into(),
            source: Box::new(source),
        }
    }
}

pub type MeasureResult<T> = Result<T, MeasureError>;
