use chrono::{DateTime, Local};
use env_logger::{Builder, Env, Target};
use std::fmt::Arguments;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use crate::core::error::MeasureError;

/// 日志行格式：`2024-01-01 12:00:00 [INFO] - 消息`
pub fn format_line(now: DateTime<Local>, level: log::Level, message: &Arguments<'_>) -> String {
    format!("{} [{}] - {}", now.format("%Y-%m-%d %H:%M:%S"), level, message)
}

/// 初始化全局日志
///
/// `RUST_LOG` 设置时优先于配置中的级别。`log_file` 为空时写 stderr，
/// 否则追加写入该文件。重复初始化会返回错误。
pub fn init_logger(level: &str, log_file: &str) -> Result<(), MeasureError> {
    let mut builder = Builder::from_env(Env::default().default_filter_or(level));
    builder.format(|buf, record| {
        writeln!(buf, "{}", format_line(Local::now(), record.level(), record.args()))
    });

    if !log_file.is_empty() {
        // 确保日志目录存在
        if let Some(parent) = Path::new(log_file).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(log_file)?;
        builder.target(Target::Pipe(Box::new(file)));
    }

    builder
        .try_init()
        .map_err(|e| MeasureError::config(format!("日志初始化失败: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_line() {
        let now = Local.with_ymd_and_hms(2024, 3, 9, 8, 5, 7).unwrap();
        let line = format_line(now, log::Level::Warn, &format_args!("速度 {} bps", 42));
        assert_eq!(line, "2024-03-09 08:05:07 [WARN] - 速度 42 bps");
    }

    #[test]
    fn test_init_logger_writes_file_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("fastspeed.log");
        let path = path.to_str().unwrap();

        assert!(init_logger("info", path).is_ok());
        assert!(Path::new(path).exists());
        // 全局日志只能安装一次
        assert!(init_logger("info", "").is_err());
    }
}
