use anyhow::{Context, Result};
use fastspeed::cli;
use fastspeed::config::Config;
use fastspeed::core::events;
use fastspeed::core::fetch::{build_client, HttpFetcher};
use fastspeed::core::{DownloadTarget, Orchestrator};
use fastspeed::discovery::{FastComSupplier, StaticUrls, UrlSupplier};
use fastspeed::ui::{self, RunSummary, SpeedDisplay};
use fastspeed::utils::logger;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        ui::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // 解析参数和配置
    let (args, config) = cli::Args::parse_args().context("参数解析失败")?;
    logger::init_logger(&config.log_level, &config.log_file)?;
    log::info!("程序启动");
    log::debug!("配置文件路径: {}", args.config);
    log::debug!("{}", config.get_summary());

    let client = build_client(&config)?;
    let targets = resolve_targets(&args, &config, client.clone()).await?;
    for target in &targets {
        log::info!("测速地址: {}", target.url);
    }
    if !args.json {
        ui::print_success(&format!("获取到 {} 个测速地址", targets.len()));
    }

    let (tx, rx) = events::channel();
    let display = if args.json { SpeedDisplay::hidden() } else { SpeedDisplay::new() };
    let reporter = tokio::spawn(ui::report(rx, display));

    let orchestrator = Orchestrator::new(
        Arc::new(HttpFetcher::new(client)),
        config.measure_options(),
        tx,
    );
    let outcome = orchestrator.run(targets).await;
    // 释放发送端，报告任务随之结束
    drop(orchestrator);
    if let Err(e) = reporter.await {
        log::warn!("报告任务异常退出: {}", e);
    }

    let result = outcome.context("测速失败")?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", RunSummary(&result));
    }

    log::info!(
        "测速完成 - 总量: {} 字节, 平均: {}",
        result.total_bytes,
        ui::format_rate(result.average_bits_per_second)
    );
    Ok(())
}

/// 有显式地址时直接使用，否则通过 fast.com 获取
async fn resolve_targets(
    args: &cli::Args,
    config: &Config,
    client: reqwest::Client,
) -> Result<Vec<DownloadTarget>> {
    let supplier: Box<dyn UrlSupplier> = if args.has_explicit_urls() {
        Box::new(StaticUrls::new(args.get_urls()?))
    } else {
        log::info!("未指定地址，通过 fast.com 获取测速地址");
        Box::new(FastComSupplier::new(client, config.url_count)?)
    };

    supplier.targets().await.context("获取测速地址失败")
}
