use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::config::Config;

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            enable_file_logs: false,
            log_dir: "./logs".to_string(),
        }
    }
}

impl From<&Config> for LogConfig {
    fn from(config: &Config) -> Self {
        Self {
            log_level: config.log_level.clone(),
            enable_file_logs: config.enable_file_logs,
            log_dir: config.log_dir.clone(),
        }
    }
}

/// 初始化全局 subscriber；重复调用是安全的
pub fn init_tracing(config: &LogConfig) -> Result<(), String> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let stdout_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_writer(std::io::stderr);

    let registry = Registry::default().with(env_filter).with(stdout_layer);

    let result = if config.enable_file_logs {
        let file_appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix("stress-scan")
            .filename_suffix("log")
            .max_log_files(14)
            .build(&config.log_dir)
            .map_err(|e| format!("failed to create rolling file appender: {e}"))?;
        let file_layer = fmt::layer()
            .with_writer(file_appender)
            .with_ansi(false)
            .json();
        registry.with(file_layer).try_init()
    } else {
        registry.try_init()
    };

    // 全局 subscriber 已设置（如测试环境）不算失败
    match result {
        Err(e) if !e.to_string().contains("already been set") => {
            Err(format!("failed to initialize tracing: {e}"))
        }
        _ => Ok(()),
    }
}
