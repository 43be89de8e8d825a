use std::env;
use std::fmt;
use std::str::FromStr;

use crate::scan::config::{BlinkThresholds, ScanConfig};

/// 运行环境，决定使用哪一组眨眼阈值
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Desktop,
    Handheld,
}

impl Platform {
    pub fn blink_thresholds(self) -> BlinkThresholds {
        match self {
            Self::Desktop => BlinkThresholds::desktop(),
            Self::Handheld => BlinkThresholds::handheld(),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Desktop => f.write_str("desktop"),
            Self::Handheld => f.write_str("handheld"),
        }
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "desktop" | "webcam" => Ok(Self::Desktop),
            "handheld" | "mobile" => Ok(Self::Handheld),
            other => Err(format!("unknown platform: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
    pub scan: ScanEnvConfig,
    pub sim: SimConfig,
}

#[derive(Debug, Clone)]
pub struct ScanEnvConfig {
    pub platform: Platform,
    pub duration_secs: u64,
    pub tick_ms: u64,
}

/// 内置合成信号源的参数
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub blinks_per_min: f64,
    pub heart_rate_bpm: f64,
    pub seed: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            log_level: env_or("RUST_LOG", "info"),
            enable_file_logs: env_or_bool("ENABLE_FILE_LOGS", false),
            log_dir: env_or("LOG_DIR", "./logs"),
            scan: ScanEnvConfig {
                platform: env_or_parse("SCAN_PLATFORM", Platform::Desktop),
                duration_secs: env_or_parse("SCAN_DURATION_SECS", 60_u64),
                tick_ms: env_or_parse("SCAN_TICK_MS", 33_u64),
            },
            sim: SimConfig {
                blinks_per_min: env_or_parse("SIM_BLINKS_PER_MIN", 18.0_f64),
                heart_rate_bpm: env_or_parse("SIM_HEART_RATE_BPM", 72.0_f64),
                seed: env_or_parse("SIM_SEED", 7_u64),
            },
        }
    }

    /// 由环境配置构造扫描配置，其余参数使用默认值
    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            scan_duration_ms: self.scan.duration_secs.saturating_mul(1_000),
            tick_interval_ms: self.scan.tick_ms,
            blink: self.scan.platform.blink_thresholds(),
            ..ScanConfig::default()
        }
    }
}

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_or_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match env::var(key) {
        Ok(raw) => match raw.parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(
                    key,
                    value = %raw,
                    "Failed to parse env var, using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}

pub fn env_or_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Mutex, OnceLock};

    use super::*;

    fn env_lock() -> &'static Mutex<()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
    }

    fn managed_keys() -> &'static [&'static str] {
        &[
            "RUST_LOG",
            "ENABLE_FILE_LOGS",
            "SCAN_PLATFORM",
            "SCAN_DURATION_SECS",
            "SCAN_TICK_MS",
            "SIM_BLINKS_PER_MIN",
            "SIM_HEART_RATE_BPM",
        ]
    }

    fn clear_keys(keys: &[&str]) {
        for key in keys {
            env::remove_var(key);
        }
    }

    #[test]
    fn loads_defaults_when_missing() {
        let _guard = env_lock().lock().expect("env lock");
        clear_keys(managed_keys());

        let cfg = Config::from_env();
        assert_eq!(cfg.log_level, "info");
        assert!(!cfg.enable_file_logs);
        assert_eq!(cfg.scan.platform, Platform::Desktop);
        assert_eq!(cfg.scan.duration_secs, 60);
        assert_eq!(cfg.sim.heart_rate_bpm, 72.0);

        let scan = cfg.scan_config();
        assert_eq!(scan.scan_duration_ms, 60_000);
        assert_eq!(scan.tick_interval_ms, 33);
        assert!(scan.validate().is_ok());
    }

    #[test]
    fn parses_numeric_values() {
        let _guard = env_lock().lock().expect("env lock");
        clear_keys(managed_keys());

        env::set_var("SCAN_DURATION_SECS", "10");
        env::set_var("SCAN_TICK_MS", "50");
        env::set_var("SIM_BLINKS_PER_MIN", "30.5");

        let cfg = Config::from_env();
        assert_eq!(cfg.scan_config().scan_duration_ms, 10_000);
        assert_eq!(cfg.scan.tick_ms, 50);
        assert_eq!(cfg.sim.blinks_per_min, 30.5);
    }

    #[test]
    fn invalid_values_fall_back() {
        let _guard = env_lock().lock().expect("env lock");
        clear_keys(managed_keys());

        env::set_var("SCAN_TICK_MS", "fast");
        env::set_var("SCAN_PLATFORM", "tablet");
        env::set_var("ENABLE_FILE_LOGS", "maybe");

        let cfg = Config::from_env();
        assert_eq!(cfg.scan.tick_ms, 33);
        assert_eq!(cfg.scan.platform, Platform::Desktop);
        assert!(!cfg.enable_file_logs);
    }

    #[test]
    fn handheld_platform_selects_handheld_thresholds() {
        let _guard = env_lock().lock().expect("env lock");
        clear_keys(managed_keys());

        env::set_var("SCAN_PLATFORM", "Mobile");

        let cfg = Config::from_env();
        assert_eq!(cfg.scan.platform, Platform::Handheld);
        assert_eq!(cfg.scan_config().blink, BlinkThresholds::handheld());
    }
}
