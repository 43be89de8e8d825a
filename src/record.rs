//! 扫描记录
//!
//! 扫描完成后交给持久化层的数据形状。持久化本身由外部协作者负责，
//! 这里只负责构造与入库前的校验。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::MAX_REPORTED_HRV_MS;
use crate::scan::types::StressResult;
use crate::signal::stress::StressLevel;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRecord {
    pub blink_rate: f64,
    pub stress_level: StressLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hrv_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<f64>,
    pub recorded_at: DateTime<Utc>,
}

impl ScanRecord {
    pub fn from_result(result: &StressResult, recorded_at: DateTime<Utc>) -> Self {
        Self {
            blink_rate: result.blink_rate,
            stress_level: result.stress_level,
            hrv_ms: result.hrv,
            heart_rate: result.heart_rate,
            recorded_at,
        }
    }

    #[cfg(feature = "runtime")]
    pub fn now(result: &StressResult) -> Self {
        Self::from_result(result, Utc::now())
    }

    /// 入库前校验：眨眼率非负且有限，HRV 在 0-200ms 之间
    pub fn validate(&self) -> Result<(), &'static str> {
        if !self.blink_rate.is_finite() || self.blink_rate < 0.0 {
            return Err("眨眼率必须是非负有限数");
        }
        if let Some(hrv) = self.hrv_ms {
            if !hrv.is_finite() || !(0.0..=MAX_REPORTED_HRV_MS).contains(&hrv) {
                return Err("HRV 必须在 0-200ms 之间");
            }
        }
        if let Some(hr) = self.heart_rate {
            if !hr.is_finite() || hr <= 0.0 {
                return Err("心率必须是正数");
            }
        }
        Ok(())
    }
}
