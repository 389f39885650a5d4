use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use crate::core::error::MeasureError;
use crate::core::orchestrator::{FailurePolicy, MeasureOptions};

const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

/// 配置结构体
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// 瞬时速率采样周期（毫秒）
    pub sample_interval_ms: u64,
    /// 向 fast.com 请求的测速地址数量
    pub url_count: usize,
    /// 连接超时时间（秒）
    pub connect_timeout: u64,
    /// User-Agent
    pub user_agent: String,
    /// 最大重定向次数
    pub max_redirects: usize,
    /// 任一地址下载失败即中止整个测速
    pub fail_fast: bool,
    /// 日志级别
    pub log_level: String,
    /// 日志文件路径，为空时输出到 stderr
    pub log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sample_interval_ms: 500,
            url_count: 5,
            connect_timeout: 10,
            user_agent: "FastSpeed/1.0".to_string(),
            max_redirects: 10,
            fail_fast: true,
            log_level: "info".to_string(),
            log_file: String::new(),
        }
    }
}

impl Config {
    /// 加载配置文件，不存在时写出默认配置
    pub fn load(path: &str) -> Result<Self, MeasureError> {
        if Path::new(path).exists() {
            let content = fs::read_to_string(path)?;
            // 尝试解析TOML
            match toml::from_str(&content) {
                Ok(config) => Ok(config),
                Err(e) => {
                    log::warn!("配置文件格式错误: {}，将使用默认配置", e);
                    eprintln!("配置文件格式错误: {}，将使用默认配置", e);
                    Ok(Config::default())
                }
            }
        } else {
            let config = Config::default();
            config.save_with_tutorial(path)?;
            Ok(config)
        }
    }

    /// 保存带教程的配置文件（唯一写入方法）
    pub fn save_with_tutorial(&self, path: &str) -> Result<(), MeasureError> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let config_content = toml::to_string_pretty(self)
            .map_err(|e| MeasureError::config(format!("无法序列化配置: {}", e)))?;
        let full_content = format!("{}\n{}", Config::tutorial_content(), config_content);
        fs::write(path, full_content)?;
        Ok(())
    }

    fn tutorial_content() -> &'static str {
        r#"# FastSpeed 配置文件
# ====================
#
# TOML 格式。命令行参数会覆盖这里的设置，优先级：命令行 > 配置文件 > 默认值
#
# 配置文件位置：
# - Windows: %APPDATA%/fastspeed/fastspeed.conf
# - macOS: ~/Library/Application Support/fastspeed/fastspeed.conf
# - Linux: ~/.config/fastspeed/fastspeed.conf
#
# 使用示例：
#   fastspeed                                   # 通过 fast.com 获取测速地址
#   fastspeed -n 3                              # 只使用 3 个测速地址
#   fastspeed -i 1000                           # 每秒输出一次瞬时速率
#   fastspeed https://example.com/big.bin       # 对指定地址测速
#   fastspeed -f urls.txt -k                    # 从文件读取地址，单个失败不影响其他地址
#
# ==================== 配置项说明 ====================
#
# sample_interval_ms  瞬时速率采样周期（毫秒），默认 500
# url_count           向 fast.com 请求的测速地址数量，默认 5
# connect_timeout     连接超时（秒）。只限制建立连接，不限制下载时长
# user_agent          请求使用的 User-Agent
# max_redirects       最大重定向次数
# fail_fast           true：任一地址失败即中止测速；false：其余地址继续，最后汇总失败
# log_level           off / error / warn / info / debug / trace，RUST_LOG 优先
# log_file            日志文件路径，留空输出到 stderr
"#
    }

    /// 校验配置合法性
    pub fn validate(&self) -> Result<(), MeasureError> {
        if self.sample_interval_ms == 0 {
            return Err(MeasureError::config("采样周期必须大于0"));
        }

        if self.url_count == 0 {
            return Err(MeasureError::config("测速地址数量必须大于0"));
        }

        if self.connect_timeout == 0 {
            return Err(MeasureError::config("连接超时时间必须大于0"));
        }

        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(MeasureError::config(format!("未知的日志级别: {}", self.log_level)));
        }

        Ok(())
    }

    /// 合并命令行参数到配置
    pub fn merge_from_args(&mut self, args: &crate::cli::Args) {
        if let Some(interval) = args.interval_ms {
            self.sample_interval_ms = interval;
        }

        if let Some(count) = args.url_count {
            self.url_count = count;
        }

        if args.keep_going {
            self.fail_fast = false;
        }

        if args.verbose {
            self.log_level = "debug".to_string();
        }
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    pub fn measure_options(&self) -> MeasureOptions {
        MeasureOptions {
            sample_interval: self.sample_interval(),
            failure_policy: if self.fail_fast {
                FailurePolicy::Abort
            } else {
                FailurePolicy::Continue
            },
        }
    }

    /// 获取配置摘要信息
    pub fn get_summary(&self) -> String {
        format!(
            "配置摘要:\n\
            - 采样周期: {} 毫秒\n\
            - 测速地址数: {}\n\
            - 连接超时: {} 秒\n\
            - 失败处理: {}\n\
            - 日志级别: {}\n\
            - 日志输出: {}",
            self.sample_interval_ms,
            self.url_count,
            self.connect_timeout,
            if self.fail_fast { "立即中止" } else { "继续其余地址" },
            self.log_level,
            if self.log_file.is_empty() { "stderr" } else { self.log_file.as_str() }
        )
    }
}
