//! rPPG 脉搏提取模块
//!
//! 流程：
//! 1. 在额头区域取固定比例的 ROI，对通过肤色判定的像素求绿色通道均值
//! 2. 样本进入有界 FIFO 窗口
//! 3. 以最近 N 个样本的 mean + k * stddev 作为自适应阈值检测收缩期峰值
//! 4. 相邻峰值的时间差即 RR 间期，交给 `RrWindow` 过滤并计算 HR/HRV

use std::collections::VecDeque;

use crate::frame::FrameView;
use crate::scan::config::{RoiSpec, RppgConfig};
use crate::signal::hrv::{RrOutcome, RrWindow};

/// 肤色像素判定策略
pub trait SkinPredicate {
    fn is_skin(&self, r: u8, g: u8, b: u8) -> bool;
}

impl<F> SkinPredicate for F
where
    F: Fn(u8, u8, u8) -> bool,
{
    fn is_skin(&self, r: u8, g: u8, b: u8) -> bool {
        self(r, g, b)
    }
}

/// 基于通道阈值与通道大小关系的简单肤色判定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelThresholdSkin {
    pub min_r: u8,
    pub min_g: u8,
    pub min_b: u8,
    /// 要求红色通道同时大于绿色和蓝色
    pub red_dominant: bool,
}

impl Default for ChannelThresholdSkin {
    fn default() -> Self {
        Self {
            min_r: 60,
            min_g: 40,
            min_b: 20,
            red_dominant: true,
        }
    }
}

impl SkinPredicate for ChannelThresholdSkin {
    fn is_skin(&self, r: u8, g: u8, b: u8) -> bool {
        r > self.min_r
            && g > self.min_g
            && b > self.min_b
            && (!self.red_dominant || (r > g && r > b))
    }
}

/// 像素坐标下的矩形
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// 把比例 ROI 换算成帧内像素矩形，超出部分被裁掉
pub fn resolve_roi(spec: &RoiSpec, frame_width: u32, frame_height: u32) -> Option<PixelRect> {
    let fw = frame_width as f64;
    let fh = frame_height as f64;
    let w = (spec.width_frac * fw).round().max(1.0);
    let h = (spec.height_frac * fh).round().max(1.0);
    let x0 = (spec.center_x_frac * fw - w / 2.0).max(0.0);
    let y0 = (spec.top_frac * fh).max(0.0);
    let x1 = (x0 + w).min(fw);
    let y1 = (y0 + h).min(fh);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some(PixelRect {
        x: x0 as u32,
        y: y0 as u32,
        width: (x1 - x0) as u32,
        height: (y1 - y0) as u32,
    })
}

/// 单帧绿色通道样本
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GreenSample {
    pub mean_green: f64,
    pub skin_pixels: usize,
}

/// 对一帧取样；没有像素通过肤色判定时返回 None，该帧不产生任何贡献
pub fn sample_frame(
    frame: &FrameView<'_>,
    roi: &RoiSpec,
    skin: &dyn SkinPredicate,
) -> Option<GreenSample> {
    let rect = resolve_roi(roi, frame.width, frame.height)?;

    let mut green_sum: u64 = 0;
    let mut skin_pixels: usize = 0;
    for y in rect.y..rect.y + rect.height {
        for x in rect.x..rect.x + rect.width {
            let Some((r, g, b)) = frame.rgb_at(x, y) else {
                continue;
            };
            if skin.is_skin(r, g, b) {
                green_sum += g as u64;
                skin_pixels += 1;
            }
        }
    }

    if skin_pixels == 0 {
        return None;
    }
    Some(GreenSample {
        mean_green: green_sum as f64 / skin_pixels as f64,
        skin_pixels,
    })
}

/// 有界 FIFO 样本窗口，满后淘汰最旧的样本
#[derive(Debug, Clone)]
pub struct GreenWindow {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl GreenWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, value: f64) {
        self.samples.push_back(value);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 最近 n 个样本的均值与总体标准差
    pub fn recent_mean_std(&self, n: usize) -> Option<(f64, f64)> {
        let n = n.min(self.samples.len());
        if n == 0 {
            return None;
        }
        let recent = self.samples.iter().skip(self.samples.len() - n);
        let mean = recent.clone().sum::<f64>() / n as f64;
        let variance = recent.map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
        Some((mean, variance.sqrt()))
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

/// 峰值检测的会话内状态
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PulseState {
    pub last_peak_ms: Option<u64>,
    pub peak_count: u32,
}

/// 单次峰值事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeakEvent {
    pub timestamp_ms: u64,
    /// 与上一个峰值的间隔及其是否被 RR 窗口接受
    pub rr: Option<(u64, RrOutcome)>,
}

/// 处于不应期内视为"仍在同一次脉搏中"
pub fn in_refractory(state: &PulseState, now_ms: u64, refractory_ms: u64) -> bool {
    state
        .last_peak_ms
        .is_some_and(|last| now_ms.saturating_sub(last) < refractory_ms)
}

/// 推入一个绿色样本并尝试检测峰值
///
/// 窗口样本数超过 `peak_sub_window` 后才开始检测。阈值基于包含当前样本在内的
/// 最近 `peak_sub_window` 个样本。
pub fn push_sample(
    window: &mut GreenWindow,
    pulse: &mut PulseState,
    rr_window: &mut RrWindow,
    config: &RppgConfig,
    value: f64,
    now_ms: u64,
) -> Option<PeakEvent> {
    window.push(value);

    if window.len() <= config.peak_sub_window {
        return None;
    }
    let (mean, std) = window.recent_mean_std(config.peak_sub_window)?;
    let threshold = mean + config.peak_threshold_k * std;

    if value <= threshold || in_refractory(pulse, now_ms, config.refractory_ms) {
        return None;
    }

    let rr = pulse.last_peak_ms.map(|last| {
        let interval = now_ms.saturating_sub(last);
        (interval, rr_window.push_interval(interval))
    });
    pulse.last_peak_ms = Some(now_ms);
    pulse.peak_count += 1;

    Some(PeakEvent {
        timestamp_ms: now_ms,
        rr,
    })
}
