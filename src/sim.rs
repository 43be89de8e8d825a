//! 合成信号源
//!
//! 不依赖真实摄像头与人脸模型即可跑通整条流水线：
//! - `SyntheticCamera` 生成肤色帧，绿色通道在每个心跳时刻出现一个高斯脉冲；
//! - `SyntheticFace` 按时间表输出睁眼/闭眼的关键点集。
//!
//! CLI 与集成测试都使用这里的实现。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{CameraError, FrameError};
use crate::frame::{Camera, PixelFormat, VideoFrame};
use crate::landmarks::{EyeLandmarkIndices, LandmarkProvider, LandmarkSet, Point3};
use crate::scan::clock::Clock;

/// 睁眼时的 EAR
pub const OPEN_EAR: f64 = 0.30;
/// 闭眼时的 EAR
pub const CLOSED_EAR: f64 = 0.10;
/// 单次眨眼持续时长（毫秒）
pub const BLINK_DURATION_MS: u64 = 100;

const PULSE_SIGMA_MS: f64 = 40.0;
const SKIN_RGB: [u8; 3] = [180, 120, 100];

pub struct SyntheticCamera<K: Clock> {
    clock: K,
    width: u32,
    height: u32,
    heart_rate_bpm: f64,
    pulse_amplitude: f64,
    noise: Option<(StdRng, f64)>,
    deny: bool,
    revoke_after: Option<u32>,
    read_failures: Option<(u32, u32)>,
    captures: u32,
    open: Arc<AtomicBool>,
    open_count: u32,
    stop_count: u32,
}

impl<K: Clock> SyntheticCamera<K> {
    pub fn new(clock: K, heart_rate_bpm: f64) -> Self {
        Self {
            clock,
            width: 160,
            height: 120,
            heart_rate_bpm,
            pulse_amplitude: 10.0,
            noise: None,
            deny: false,
            revoke_after: None,
            read_failures: None,
            captures: 0,
            open: Arc::new(AtomicBool::new(false)),
            open_count: 0,
            stop_count: 0,
        }
    }

    /// 打开时总是返回权限被拒
    pub fn denied(clock: K) -> Self {
        Self {
            deny: true,
            ..Self::new(clock, 0.0)
        }
    }

    /// 成功读取 `frames` 帧后权限被撤销
    pub fn with_revoked_after(mut self, frames: u32) -> Self {
        self.revoke_after = Some(frames);
        self
    }

    /// 第 [from, to) 次读取返回 `ReadFailed`（从 0 计数）
    pub fn with_read_failures(mut self, from: u32, to: u32) -> Self {
        self.read_failures = Some((from, to));
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_pulse_amplitude(mut self, amplitude: f64) -> Self {
        self.pulse_amplitude = amplitude;
        self
    }

    /// 给绿色通道叠加均匀分布噪声，种子固定时结果可复现
    pub fn with_noise(mut self, seed: u64, amplitude: f64) -> Self {
        self.noise = Some((StdRng::seed_from_u64(seed), amplitude.abs()));
        self
    }

    /// 共享的"摄像头是否打开"标记，可在事件接收方中观察
    pub fn open_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.open)
    }

    pub fn open_count(&self) -> u32 {
        self.open_count
    }

    pub fn stop_count(&self) -> u32 {
        self.stop_count
    }

    /// 给定时刻的绿色通道偏移量
    pub fn pulse_offset(&self, now_ms: u64) -> f64 {
        if self.heart_rate_bpm <= 0.0 {
            return 0.0;
        }
        let period = 60_000.0 / self.heart_rate_bpm;
        let phase = (now_ms as f64) % period;
        let distance = phase.min(period - phase);
        let spread = 2.0 * PULSE_SIGMA_MS * PULSE_SIGMA_MS;
        self.pulse_amplitude * (-(distance * distance) / spread).exp()
    }
}

impl<K: Clock> Camera for SyntheticCamera<K> {
    fn open(&mut self) -> Result<(), CameraError> {
        if self.deny {
            return Err(CameraError::PermissionDenied);
        }
        self.open.store(true, Ordering::SeqCst);
        self.open_count += 1;
        Ok(())
    }

    fn capture(&mut self) -> Result<Option<VideoFrame>, CameraError> {
        if !self.open.load(Ordering::SeqCst) {
            return Err(CameraError::ReadFailed("camera is not open".to_string()));
        }
        let index = self.captures;
        self.captures += 1;
        if self.revoke_after.is_some_and(|n| index >= n) {
            return Err(CameraError::PermissionDenied);
        }
        if self
            .read_failures
            .is_some_and(|(from, to)| (from..to).contains(&index))
        {
            return Err(CameraError::ReadFailed("synthetic read timeout".to_string()));
        }

        let mut green = SKIN_RGB[1] as f64 + self.pulse_offset(self.clock.now_ms());
        if let Some((rng, amplitude)) = self.noise.as_mut() {
            if *amplitude > 0.0 {
                green += rng.gen_range(-*amplitude..=*amplitude);
            }
        }
        let green = green.round().clamp(0.0, 255.0) as u8;

        Ok(Some(VideoFrame::filled(
            self.width,
            self.height,
            PixelFormat::Rgb,
            [SKIN_RGB[0], green, SKIN_RGB[2]],
        )))
    }

    fn stop(&mut self) {
        if self.open.swap(false, Ordering::SeqCst) {
            self.stop_count += 1;
        }
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    from_ms: u64,
    to_ms: u64,
}

impl Span {
    fn contains(&self, t: u64) -> bool {
        t >= self.from_ms && t < self.to_ms
    }
}

/// 按时间表眨眼的合成人脸
///
/// 所有时间均相对于第一次 `detect` 调用的时间戳。
#[derive(Debug, Clone)]
pub struct SyntheticFace {
    indices: EyeLandmarkIndices,
    blink_starts: Vec<u64>,
    no_face: Vec<Span>,
    failures: Vec<Span>,
    origin_ms: Option<u64>,
}

impl SyntheticFace {
    /// 始终睁眼
    pub fn steady() -> Self {
        Self::with_blinks_at(Vec::new())
    }

    /// 在 `over_ms` 内均匀安排 `blinks` 次眨眼，第 i 次开始于 `spacing/2 + i*spacing`
    pub fn evenly_spaced(blinks: u32, over_ms: u64) -> Self {
        if blinks == 0 {
            return Self::steady();
        }
        let spacing = over_ms / blinks as u64;
        let starts = (0..blinks as u64)
            .map(|i| spacing / 2 + i * spacing)
            .collect();
        Self::with_blinks_at(starts)
    }

    pub fn with_blinks_at(mut starts: Vec<u64>) -> Self {
        starts.sort_unstable();
        Self {
            indices: EyeLandmarkIndices::default(),
            blink_starts: starts,
            no_face: Vec::new(),
            failures: Vec::new(),
            origin_ms: None,
        }
    }

    pub fn with_indices(mut self, indices: EyeLandmarkIndices) -> Self {
        self.indices = indices;
        self
    }

    /// `[from_ms, to_ms)` 内没有人脸
    pub fn with_no_face(mut self, from_ms: u64, to_ms: u64) -> Self {
        self.no_face.push(Span { from_ms, to_ms });
        self
    }

    /// `[from_ms, to_ms)` 内推理失败
    pub fn with_failures(mut self, from_ms: u64, to_ms: u64) -> Self {
        self.failures.push(Span { from_ms, to_ms });
        self
    }

    pub fn ear_at(&self, offset_ms: u64) -> f64 {
        let closed = self
            .blink_starts
            .iter()
            .any(|&s| offset_ms >= s && offset_ms < s + BLINK_DURATION_MS);
        if closed {
            CLOSED_EAR
        } else {
            OPEN_EAR
        }
    }

    /// 构造一组双眼 EAR 都等于 `ear` 的关键点
    pub fn landmarks_for_ear(&self, ear: f64) -> LandmarkSet {
        landmarks_for_ear(&self.indices, ear)
    }
}

impl LandmarkProvider for SyntheticFace {
    fn detect(
        &mut self,
        _frame: &VideoFrame,
        timestamp_ms: u64,
    ) -> Result<Option<LandmarkSet>, FrameError> {
        let origin = *self.origin_ms.get_or_insert(timestamp_ms);
        let offset = timestamp_ms.saturating_sub(origin);

        if self.failures.iter().any(|s| s.contains(offset)) {
            return Err(FrameError::InferenceFailure(
                "synthetic inference failure".to_string(),
            ));
        }
        if self.no_face.iter().any(|s| s.contains(offset)) {
            return Ok(None);
        }
        Ok(Some(self.landmarks_for_ear(self.ear_at(offset))))
    }
}

/// 在 `indices` 指定的位置放置两只 EAR 为 `ear` 的眼睛，其余点位于画面中心
pub fn landmarks_for_ear(indices: &EyeLandmarkIndices, ear: f64) -> LandmarkSet {
    let len = indices.required_len().max(468);
    let mut points = vec![Point3::xy(0.5, 0.5); len];

    for (slots, center_x) in [(&indices.left, 0.35), (&indices.right, 0.65)] {
        for (&slot, point) in slots.iter().zip(eye_contour_points(center_x, 0.4, ear)) {
            points[slot] = point;
        }
    }
    LandmarkSet::new(points)
}

/// p1..p6 顺序的眼部轮廓，宽度固定为 0.1
fn eye_contour_points(cx: f64, cy: f64, ear: f64) -> [Point3; 6] {
    let w = 0.1;
    let h = ear * w;
    [
        Point3::xy(cx - w / 2.0, cy),
        Point3::xy(cx - w / 6.0, cy - h / 2.0),
        Point3::xy(cx + w / 6.0, cy - h / 2.0),
        Point3::xy(cx + w / 2.0, cy),
        Point3::xy(cx + w / 6.0, cy + h / 2.0),
        Point3::xy(cx - w / 6.0, cy + h / 2.0),
    ]
}
