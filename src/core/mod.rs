//! Core: 并发计量下载、速率采样和整体调度

pub mod counter;
pub mod downloader;
pub mod error;
pub mod events;
pub mod fetch;
pub mod model;
pub mod orchestrator;
pub mod sampler;

pub use counter::ByteCounter;
pub use downloader::Downloader;
pub use error::{MeasureError, MeasureResult};
pub use events::{EventReceiver, EventSender, MeasureEvent};
pub use fetch::{BodyFetcher, BodyStream, HttpFetcher};
pub use model::{DownloadTarget, RateSample, RunResult, TargetFailure};
pub use orchestrator::{FailurePolicy, MeasureOptions, Orchestrator};
pub use sampler::RateSampler;
