//! fastspeed: 并发下载测速
//!
//! 从若干测速地址并发下载，共享一个字节计数器，
//! 周期性采样得到瞬时速率，全部下载结束后给出总量和平均速率。

pub mod cli;
pub mod config;
pub mod core;
pub mod discovery;
pub mod ui;
pub mod utils;

pub use crate::core::{
    ByteCounter, DownloadTarget, FailurePolicy, MeasureError, MeasureEvent, MeasureOptions,
    Orchestrator, RateSample, RateSampler, RunResult,
};
