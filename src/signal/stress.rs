//! 压力等级分类
//!
//! 规则：
//! - 眨眼率 < 15 次/分钟: low
//! - 15 - 25 次/分钟（含边界）: moderate
//! - > 25 次/分钟: high
//!
//! 交叉验证：HRV 可用且 < 30ms，同时眨眼率 > 25 时强制判定为 high。
//! 这是一条简单的与规则（两个独立信号同时指向急性压力），不是加权融合模型。

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{BLINK_RATE_LOW_MAX, BLINK_RATE_MODERATE_MAX, HRV_ACUTE_STRESS_MS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StressLevel {
    Low,
    Moderate,
    High,
}

impl StressLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
        }
    }

    /// 扫描结束后展示给用户的结论
    pub fn headline(self) -> &'static str {
        match self {
            Self::Low => "Focus optimized, productivity is high",
            Self::Moderate => "Normal attention, plan short breaks to avoid burnout",
            Self::High => "Stress alert, prioritize rebalancing",
        }
    }

    /// 对应的即时建议
    pub fn recommendation(self) -> &'static str {
        match self {
            Self::Low => "Anchor a memory of success to keep your performance high.",
            Self::Moderate => "Practice 4-7-8 breathing for a quick rebalance.",
            Self::High => "Pause now: 2 minutes of deep breathing plus a mental reframe.",
        }
    }
}

impl fmt::Display for StressLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StressLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "moderate" => Ok(Self::Moderate),
            "high" => Ok(Self::High),
            other => Err(format!("unknown stress level: {other}")),
        }
    }
}

pub fn classify(blink_rate: f64, hrv_ms: Option<f64>) -> StressLevel {
    if let Some(hrv) = hrv_ms {
        if hrv < HRV_ACUTE_STRESS_MS && blink_rate > BLINK_RATE_MODERATE_MAX {
            return StressLevel::High;
        }
    }

    if blink_rate < BLINK_RATE_LOW_MAX {
        StressLevel::Low
    } else if blink_rate <= BLINK_RATE_MODERATE_MAX {
        StressLevel::Moderate
    } else {
        StressLevel::High
    }
}
