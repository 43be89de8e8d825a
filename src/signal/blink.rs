//! 眨眼检测模块
//!
//! 只保留上一帧的 EAR：当上一帧高于睁眼阈值、当前帧不高于闭眼阈值，
//! 且距上次眨眼超过去抖间隔时，记一次眨眼。EAR 持续处于低位不会重复触发，
//! 必须先回到睁眼阈值以上。
//!
//! 正常眨眼频率为 15-20 次/分钟。

use serde::Serialize;

use crate::constants::{EAR_OPEN_SENTINEL, MILLIS_PER_MINUTE};
use crate::scan::config::BlinkThresholds;

/// 眨眼检测的会话内状态，由会话控制器持有
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlinkState {
    pub last_ear: f64,
    pub last_blink_ms: Option<u64>,
    pub blink_count: u32,
}

impl Default for BlinkState {
    fn default() -> Self {
        Self {
            last_ear: EAR_OPEN_SENTINEL,
            last_blink_ms: None,
            blink_count: 0,
        }
    }
}

impl BlinkState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 输入一帧 EAR，返回本帧是否记为一次眨眼
pub fn update_blink(
    state: &mut BlinkState,
    thresholds: &BlinkThresholds,
    current_ear: f64,
    now_ms: u64,
) -> bool {
    let debounced = match state.last_blink_ms {
        Some(last) => now_ms.saturating_sub(last) > thresholds.debounce_ms,
        None => true,
    };

    let blink = state.last_ear > thresholds.open && current_ear <= thresholds.close && debounced;
    if blink {
        state.blink_count += 1;
        state.last_blink_ms = Some(now_ms);
    }

    state.last_ear = current_ear;
    blink
}

/// 眨眼率（次/分钟）；elapsed 为 0 时返回 0
pub fn blink_rate(blink_count: u32, elapsed_ms: u64) -> f64 {
    if elapsed_ms == 0 {
        return 0.0;
    }
    blink_count as f64 / (elapsed_ms as f64 / MILLIS_PER_MINUTE)
}

/// 显示用：保留一位小数
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
