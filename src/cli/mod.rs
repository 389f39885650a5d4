//! CLI: 命令行接口和参数解析模块
//!
//! ## 支持的命令
//!
//! - 自动测速：`fastspeed`（通过 fast.com 获取测速地址）
//! - 指定地址：`fastspeed <url>...`
//! - 批量地址：`fastspeed -f urls.txt`
//! - 编辑配置：`fastspeed -e`
//! - 指定配置：`fastspeed -c config.conf`
//!
//! ## 平台支持
//!
//! - Windows: `%APPDATA%/fastspeed/fastspeed.conf`
//! - macOS: `~/Library/Application Support/fastspeed/fastspeed.conf`
//! - Linux: `~/.config/fastspeed/fastspeed.conf`

use clap::Parser;
use std::env;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use crate::config::Config;
use crate::core::error::MeasureError;
use crate::utils::validator;

/// 版本号附带 vergen 生成的构建信息
fn long_version() -> &'static str {
    static VERSION: OnceLock<String> = OnceLock::new();
    VERSION.get_or_init(|| {
        format!(
            "{} ({}, built {})",
            env!("CARGO_PKG_VERSION"),
            option_env!("VERGEN_GIT_SHA").unwrap_or("unknown"),
            option_env!("VERGEN_BUILD_TIMESTAMP").unwrap_or("unknown"),
        )
    })
}

/// 获取平台默认配置文件路径
pub fn default_config_path() -> String {
    #[cfg(target_os = "windows")]
    {
        let appdata = env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
        format!("{}/fastspeed/fastspeed.conf", appdata)
    }
    #[cfg(target_os = "macos")]
    {
        let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
        format!("{}/Library/Application Support/fastspeed/fastspeed.conf", home)
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
        format!("{}/.config/fastspeed/fastspeed.conf", home)
    }
}

/// 打开配置文件编辑器
pub fn open_config_in_editor(config_path: &str) {
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("notepad").arg(config_path).status().ok();
    }
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg("-e").arg(config_path).status().ok();
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        // 优先 xdg-open，否则 nano
        if std::process::Command::new("xdg-open").arg(config_path).status().is_err() {
            let _ = std::process::Command::new("nano").arg(config_path).status();
        }
    }
}

/// FastSpeed 命令行参数
///
/// 示例用法：
///   fastspeed
///   fastspeed -n 3 -i 1000
///   fastspeed https://example.com/big.bin
///   fastspeed -f urls.txt -k
#[derive(Parser, Debug, Clone)]
#[command(
    name = "fastspeed",
    author = "panzhifu",
    version = env!("CARGO_PKG_VERSION"),
    long_version = long_version(),
    about = "一个用 Rust 编写的并发下载测速工具",
    long_about = "并发下载多个测速地址，实时输出瞬时速率，结束后输出总下载量和平均速率。\n未指定地址时通过 fast.com 获取测速地址。\n\n示例：\n  fastspeed\n  fastspeed -n 3 -i 1000\n  fastspeed https://example.com/big.bin\n  fastspeed -f urls.txt -k\n"
)]
pub struct Args {
    /// 要测速的URL列表（可同时指定多个）
    #[arg(required = false, help = "要测速的URL列表，不指定时通过 fast.com 获取。")]
    pub urls: Vec<String>,

    /// 包含URL列表的文件路径
    #[arg(short, long, help = "包含URL列表的文件路径，每行一个URL，# 开头为注释。")]
    pub file: Option<String>,

    /// 配置文件路径，默认为平台推荐路径
    #[arg(short = 'c', long, default_value_t = default_config_path(), help = "配置文件路径，默认为平台推荐路径。")]
    pub config: String,

    /// 编辑配置文件（-e 或 --edit）
    #[arg(short = 'e', long = "edit", help = "用系统默认编辑器打开配置文件并退出。")]
    pub edit_config: bool,

    /// 采样周期（毫秒）
    #[arg(short = 'i', long = "interval-ms", help = "瞬时速率采样周期（毫秒），覆盖配置文件中的设置。")]
    pub interval_ms: Option<u64>,

    /// fast.com 测速地址数量
    #[arg(short = 'n', long = "url-count", help = "向 fast.com 请求的测速地址数量，覆盖配置文件中的设置。")]
    pub url_count: Option<usize>,

    /// 单个地址失败时继续其余地址
    #[arg(short = 'k', long = "keep-going", help = "单个地址下载失败时继续其余地址，最后汇总失败列表。")]
    pub keep_going: bool,

    /// 以 JSON 输出最终结果
    #[arg(long, help = "以 JSON 格式输出最终结果。")]
    pub json: bool,

    /// 输出调试日志
    #[arg(short = 'v', long, help = "输出调试日志。")]
    pub verbose: bool,
}

impl Args {
    pub fn parse_args() -> Result<(Self, Config), MeasureError> {
        let args = Args::parse();

        // --edit 逻辑
        if args.edit_config {
            if !Path::new(&args.config).exists() {
                Config::default().save_with_tutorial(&args.config)?;
            }
            open_config_in_editor(&args.config);
            std::process::exit(0);
        }

        let config = args.load_config()?;
        Ok((args, config))
    }

    /// 加载（或创建）配置文件，合并命令行参数并校验
    pub fn load_config(&self) -> Result<Config, MeasureError> {
        let mut config = Config::load(&self.config)
            .map_err(|e| MeasureError::config(format!("无法读取配置文件 {}: {}", self.config, e)))?;

        config.merge_from_args(self);
        config.validate()?;
        Ok(config)
    }

    /// 是否由用户直接提供了测速地址
    pub fn has_explicit_urls(&self) -> bool {
        !self.urls.is_empty() || self.file.is_some()
    }

    /// 汇总命令行和文件中的URL
    pub fn get_urls(&self) -> Result<Vec<String>, MeasureError> {
        let mut urls = Vec::new();
        urls.extend_from_slice(&self.urls);

        if let Some(file_path) = &self.file {
            let content = fs::read_to_string(file_path)
                .map_err(|e| MeasureError::config(format!("无法读取URL文件 {}: {}", file_path, e)))?;

            // 按行读取URL，忽略空行和注释
            for line in content.lines() {
                let line = line.trim();
                if !line.is_empty() && !line.starts_with('#') {
                    urls.push(line.to_string());
                }
            }
        }

        validator::validate_urls(&urls)?;
        Ok(urls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parsing() {
        let args = Args::try_parse_from(["fastspeed"]).unwrap();
        assert!(args.urls.is_empty());
        assert!(!args.has_explicit_urls());
        assert!(!args.keep_going);

        let args = Args::try_parse_from(["fastspeed", "https://example.com/file.bin", "--json"]).unwrap();
        assert!(args.has_explicit_urls());
        assert!(args.json);
    }

    #[test]
    fn test_config_loading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fastspeed.conf");
        let path = path.to_str().unwrap();

        let args = Args::try_parse_from(["fastspeed", "-c", path, "-i", "250"]).unwrap();
        let config = args.load_config().unwrap();

        assert_eq!(config.sample_interval_ms, 250);
        assert!(Path::new(path).exists());
    }

    #[test]
    fn test_invalid_override_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fastspeed.conf");

        let args = Args::try_parse_from(["fastspeed", "-c", path.to_str().unwrap(), "-i", "0"]).unwrap();
        assert!(args.load_config().is_err());
    }

    #[test]
    fn test_url_file_parsing() {
        let dir = tempfile::tempdir().unwrap();
        let url_file = dir.path().join("urls.txt");
        fs::write(
            &url_file,
            "# 这是一个注释\nhttps://example.com/file1.bin\n\n  https://example.com/file2.bin  \n",
        )
        .unwrap();

        let args = Args::try_parse_from([
            "fastspeed",
            "https://example.com/file0.bin",
            "-f",
            url_file.to_str().unwrap(),
        ])
        .unwrap();
        let urls = args.get_urls().unwrap();

        assert_eq!(
            urls,
            vec![
                "https://example.com/file0.bin",
                "https://example.com/file1.bin",
                "https://example.com/file2.bin",
            ]
        );
    }

    #[test]
    fn test_invalid_url_in_file() {
        let dir = tempfile::tempdir().unwrap();
        let url_file = dir.path().join("urls.txt");
        fs::write(&url_file, "ftp://example.com/file.bin\n").unwrap();

        let args = Args::try_parse_from(["fastspeed", "-f", url_file.to_str().unwrap()]).unwrap();
        assert!(matches!(args.get_urls(), Err(MeasureError::InvalidUrl(_))));
    }

    #[test]
    fn test_missing_url_file() {
        let args = Args::try_parse_from(["fastspeed", "-f", "/nonexistent/urls.txt"]).unwrap();
        assert!(args.get_urls().is_err());
    }
}
