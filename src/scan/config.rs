use serde::{Deserialize, Serialize};

use crate::constants::*;

/// 眨眼检测阈值，单次会话内固定不变
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlinkThresholds {
    /// 上一帧 EAR 高于此值才视为睁眼
    pub open: f64,
    /// 当前帧 EAR 不高于此值视为闭眼
    pub close: f64,
    /// 两次眨眼之间的最短间隔（毫秒）
    pub debounce_ms: u64,
}

impl BlinkThresholds {
    /// 固定摄像头（笔记本/台式机）
    pub fn desktop() -> Self {
        Self {
            open: 0.24,
            close: 0.20,
            debounce_ms: 150,
        }
    }

    /// 手持设备：距离更近、抖动更大，阈值略低且去抖更长
    pub fn handheld() -> Self {
        Self {
            open: 0.22,
            close: 0.18,
            debounce_ms: 200,
        }
    }
}

impl Default for BlinkThresholds {
    fn default() -> Self {
        Self::desktop()
    }
}

/// 感兴趣区域，按帧尺寸比例定义
///
/// 默认值在 640×480 的帧上得到一个 80×80 的方框，水平居中，上边缘位于高度的 1/4 处
/// （额头区域）。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoiSpec {
    pub width_frac: f64,
    pub height_frac: f64,
    pub center_x_frac: f64,
    pub top_frac: f64,
}

impl Default for RoiSpec {
    fn default() -> Self {
        Self {
            width_frac: 80.0 / 640.0,
            height_frac: 80.0 / 480.0,
            center_x_frac: 0.5,
            top_frac: 0.25,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RppgConfig {
    pub roi: RoiSpec,
    pub green_window_capacity: usize,
    pub peak_sub_window: usize,
    pub peak_threshold_k: f64,
    pub refractory_ms: u64,
    pub rr_min_ms: u64,
    pub rr_max_ms: u64,
    pub rr_window_capacity: usize,
    pub min_rr_for_stats: usize,
    pub min_rr_for_report: usize,
    pub min_report_elapsed_ms: u64,
}

impl Default for RppgConfig {
    fn default() -> Self {
        Self {
            roi: RoiSpec::default(),
            green_window_capacity: GREEN_WINDOW_CAPACITY,
            peak_sub_window: PEAK_SUB_WINDOW,
            peak_threshold_k: PEAK_THRESHOLD_K,
            refractory_ms: PEAK_REFRACTORY_MS,
            rr_min_ms: RR_MIN_MS,
            rr_max_ms: RR_MAX_MS,
            rr_window_capacity: RR_WINDOW_CAPACITY,
            min_rr_for_stats: RR_MIN_FOR_STATS,
            min_rr_for_report: RR_MIN_FOR_REPORT,
            min_report_elapsed_ms: HRV_MIN_ELAPSED_MS,
        }
    }
}

/// 无人脸提示的帧数阈值
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HintConfig {
    pub reposition_after_frames: u32,
    pub low_light_after_frames: u32,
}

impl Default for HintConfig {
    fn default() -> Self {
        Self {
            reposition_after_frames: REPOSITION_AFTER_FRAMES,
            low_light_after_frames: LOW_LIGHT_AFTER_FRAMES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanConfig {
    pub scan_duration_ms: u64,
    pub tick_interval_ms: u64,
    #[serde(default)]
    pub blink: BlinkThresholds,
    #[serde(default)]
    pub rppg: RppgConfig,
    #[serde(default)]
    pub hints: HintConfig,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            scan_duration_ms: SCAN_DURATION_MS,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            blink: BlinkThresholds::default(),
            rppg: RppgConfig::default(),
            hints: HintConfig::default(),
        }
    }
}

impl ScanConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.scan_duration_ms == 0 {
            return Err("scanDurationMs must be > 0".to_string());
        }
        if self.tick_interval_ms == 0 || self.tick_interval_ms >= self.scan_duration_ms {
            return Err("tickIntervalMs must be > 0 and shorter than the scan".to_string());
        }

        let blink = &self.blink;
        if !blink.open.is_finite() || !blink.close.is_finite() {
            return Err("blink thresholds must be finite".to_string());
        }
        if blink.close <= 0.0 || blink.close > blink.open {
            return Err("blink.close must be in (0, blink.open]".to_string());
        }

        let rppg = &self.rppg;
        let roi = &rppg.roi;
        if !(0.0..=1.0).contains(&roi.width_frac)
            || !(0.0..=1.0).contains(&roi.height_frac)
            || !(0.0..=1.0).contains(&roi.center_x_frac)
            || !(0.0..=1.0).contains(&roi.top_frac)
            || roi.width_frac == 0.0
            || roi.height_frac == 0.0
        {
            return Err("rppg.roi fractions must be in (0,1]".to_string());
        }
        if rppg.peak_sub_window < 2 {
            return Err("rppg.peakSubWindow must be >= 2".to_string());
        }
        if rppg.green_window_capacity <= rppg.peak_sub_window {
            return Err("rppg.greenWindowCapacity must exceed peakSubWindow".to_string());
        }
        if !rppg.peak_threshold_k.is_finite() || rppg.peak_threshold_k < 0.0 {
            return Err("rppg.peakThresholdK must be >= 0".to_string());
        }
        if rppg.rr_min_ms == 0 || rppg.rr_min_ms >= rppg.rr_max_ms {
            return Err("rppg.rrMinMs must be > 0 and below rrMaxMs".to_string());
        }
        if rppg.min_rr_for_stats < 2 || rppg.min_rr_for_stats > rppg.rr_window_capacity {
            return Err("rppg.minRrForStats must be in [2, rrWindowCapacity]".to_string());
        }
        if rppg.min_rr_for_report < rppg.min_rr_for_stats
            || rppg.min_rr_for_report > rppg.rr_window_capacity
        {
            return Err(
                "rppg.minRrForReport must be in [minRrForStats, rrWindowCapacity]".to_string(),
            );
        }

        if self.hints.reposition_after_frames == 0
            || self.hints.low_light_after_frames <= self.hints.reposition_after_frames
        {
            return Err("hints.lowLightAfterFrames must exceed repositionAfterFrames".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(ScanConfig::default().validate().is_ok());
    }

    #[test]
    fn handheld_preset_is_valid() {
        let cfg = ScanConfig {
            blink: BlinkThresholds::handheld(),
            ..ScanConfig::default()
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn close_above_open_is_rejected() {
        let mut cfg = ScanConfig::default();
        cfg.blink.close = 0.3;
        cfg.blink.open = 0.2;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn report_minimum_below_stats_minimum_is_rejected() {
        let mut cfg = ScanConfig::default();
        cfg.rppg.min_rr_for_report = 5;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn partial_json_uses_defaults() {
        let cfg: ScanConfig =
            serde_json::from_str(r#"{"scanDurationMs": 30000, "tickIntervalMs": 50}"#)
                .expect("parse config");
        assert_eq!(cfg.scan_duration_ms, 30_000);
        assert_eq!(cfg.blink, BlinkThresholds::desktop());
        assert_eq!(cfg.rppg.rr_window_capacity, RR_WINDOW_CAPACITY);
    }
}
