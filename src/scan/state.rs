//! 单次扫描会话的可变状态
//!
//! 所有累加器（眨眼计数、上一帧 EAR、绿色通道窗口、RR 窗口、无人脸计数）都集中在
//! `SessionState` 中，由会话控制器独占持有，并以 `&mut` 传入各个检测函数。

use crate::error::FrameError;
use crate::frame::{FrameView, VideoFrame};
use crate::landmarks::{EyeLandmarkIndices, LandmarkProvider, LandmarkSet};
use crate::scan::config::{HintConfig, RppgConfig, ScanConfig};
use crate::scan::types::{HrvReading, LiveTelemetry, ScanHint, StressResult};
use crate::signal::blink::{self, BlinkState};
use crate::signal::ear::compute_ear;
use crate::signal::hrv::{HrvStats, RrOutcome, RrWindow};
use crate::signal::rppg::{self, GreenWindow, PeakEvent, PulseState, SkinPredicate};
use crate::signal::stress;

/// 关键点路径的单帧结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LandmarkOutcome {
    pub face_detected: bool,
    pub blink: bool,
    pub hint: Option<ScanHint>,
    /// 推理失败或关键点无效
    pub dropped: bool,
}

/// 单帧处理结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    pub face_detected: bool,
    pub blink: bool,
    pub peak: Option<PeakEvent>,
    pub hint: Option<ScanHint>,
    /// 本帧新产生的可报告 HRV 读数
    pub hrv_reading: Option<HrvReading>,
    /// 关键点路径被丢弃（推理失败或关键点无效）
    pub landmarks_dropped: bool,
}

#[derive(Debug, Clone)]
pub struct SessionState {
    pub started_at_ms: u64,
    pub elapsed_ms: u64,
    pub blink: BlinkState,
    pub green: GreenWindow,
    pub pulse: PulseState,
    pub rr: RrWindow,
    pub no_face_streak: u32,
    pub frames_processed: u64,
    pub frames_dropped: u64,
    pub last_face_detected: bool,
}

impl SessionState {
    pub fn new(config: &ScanConfig, started_at_ms: u64) -> Self {
        let rppg = &config.rppg;
        Self {
            started_at_ms,
            elapsed_ms: 0,
            blink: BlinkState::default(),
            green: GreenWindow::new(rppg.green_window_capacity),
            pulse: PulseState::default(),
            rr: RrWindow::new(
                rppg.rr_window_capacity,
                rppg.rr_min_ms,
                rppg.rr_max_ms,
                rppg.min_rr_for_stats,
            ),
            no_face_streak: 0,
            frames_processed: 0,
            frames_dropped: 0,
            last_face_detected: false,
        }
    }

    pub fn advance_to(&mut self, now_ms: u64) {
        self.elapsed_ms = now_ms.saturating_sub(self.started_at_ms);
    }

    /// 摄像头本次没有给出图像
    pub fn drop_frame(&mut self) {
        self.frames_dropped += 1;
        self.last_face_detected = false;
    }

    /// 处理一帧：关键点路径与 rPPG 路径互相独立，任何一条路径失败都不影响另一条
    pub fn process_frame<L>(
        &mut self,
        config: &ScanConfig,
        indices: &EyeLandmarkIndices,
        skin: &dyn SkinPredicate,
        provider: &mut L,
        frame: &VideoFrame,
        now_ms: u64,
    ) -> FrameReport
    where
        L: LandmarkProvider + ?Sized,
    {
        self.frames_processed += 1;

        let detected = provider.detect(frame, now_ms);
        let landmarks = self.observe_landmarks(config, indices, detected, now_ms);
        let peak = self.observe_pixels(&config.rppg, skin, frame.view(), now_ms);
        let hrv_reading = self.new_hrv_reading(&config.rppg, peak.as_ref());

        FrameReport {
            face_detected: landmarks.face_detected,
            blink: landmarks.blink,
            peak,
            hint: landmarks.hint,
            hrv_reading,
            landmarks_dropped: landmarks.dropped,
        }
    }

    /// 关键点路径：EAR → 眨眼；`Ok(None)` 计入无人脸连续帧数
    pub fn observe_landmarks(
        &mut self,
        config: &ScanConfig,
        indices: &EyeLandmarkIndices,
        detected: Result<Option<LandmarkSet>, FrameError>,
        now_ms: u64,
    ) -> LandmarkOutcome {
        let mut outcome = LandmarkOutcome::default();

        let ear = detected.and_then(|found| found.map(|set| compute_ear(&set, indices)).transpose());
        match ear {
            Ok(Some(ear)) => {
                outcome.face_detected = true;
                outcome.hint = self.on_face(&config.hints);
                outcome.blink = blink::update_blink(&mut self.blink, &config.blink, ear, now_ms);
                if outcome.blink {
                    tracing::debug!(
                        blink_count = self.blink.blink_count,
                        ear,
                        elapsed_ms = self.elapsed_ms,
                        "Blink detected"
                    );
                }
            }
            Ok(None) => {
                outcome.hint = self.on_no_face(&config.hints);
            }
            Err(e) => {
                self.frames_dropped += 1;
                outcome.dropped = true;
                match &e {
                    FrameError::InferenceFailure(_) => {
                        tracing::warn!(error = %e, "Landmark inference failed, frame dropped")
                    }
                    _ => tracing::debug!(error = %e, "Frame skipped"),
                }
            }
        }
        self.last_face_detected = outcome.face_detected;
        outcome
    }

    /// rPPG 路径：ROI 肤色像素 → 绿色均值 → 峰值 → RR
    pub fn observe_pixels(
        &mut self,
        config: &RppgConfig,
        skin: &dyn SkinPredicate,
        frame: FrameView<'_>,
        now_ms: u64,
    ) -> Option<PeakEvent> {
        if let Err(e) = frame.validate() {
            tracing::debug!(error = %e, "rPPG sample skipped");
            return None;
        }
        let sample = rppg::sample_frame(&frame, &config.roi, skin)?;
        self.observe_green(config, sample.mean_green, now_ms)
    }

    /// 只有本帧有新 RR 被接受时才产生读数
    pub fn new_hrv_reading(
        &self,
        config: &RppgConfig,
        peak: Option<&PeakEvent>,
    ) -> Option<HrvReading> {
        match peak {
            Some(PeakEvent {
                rr: Some((_, RrOutcome::Accepted)),
                ..
            }) => self.reportable_hrv(config),
            _ => None,
        }
    }

    pub fn observe_green(
        &mut self,
        config: &RppgConfig,
        mean_green: f64,
        now_ms: u64,
    ) -> Option<PeakEvent> {
        rppg::push_sample(
            &mut self.green,
            &mut self.pulse,
            &mut self.rr,
            config,
            mean_green,
            now_ms,
        )
    }

    /// 无人脸计数，分别在达到两个阈值时各提示一次
    fn on_no_face(&mut self, hints: &HintConfig) -> Option<ScanHint> {
        self.no_face_streak = self.no_face_streak.saturating_add(1);
        if self.no_face_streak == hints.low_light_after_frames {
            Some(ScanHint::LowLight)
        } else if self.no_face_streak == hints.reposition_after_frames {
            Some(ScanHint::Reposition)
        } else {
            None
        }
    }

    fn on_face(&mut self, hints: &HintConfig) -> Option<ScanHint> {
        let was_hinted = self.no_face_streak >= hints.reposition_after_frames;
        self.no_face_streak = 0;
        was_hinted.then_some(ScanHint::FaceReacquired)
    }

    /// 用于展示的实时 HR/HRV（RR 数量达到统计下限即可）
    pub fn live_stats(&self) -> Option<HrvStats> {
        self.rr.stats()
    }

    /// 满足最短时长与最少 RR 数两个条件后才可报告
    pub fn reportable_hrv(&self, config: &RppgConfig) -> Option<HrvReading> {
        if self.elapsed_ms < config.min_report_elapsed_ms || self.rr.len() < config.min_rr_for_report
        {
            return None;
        }
        self.rr.stats().map(|s| HrvReading {
            heart_rate: s.heart_rate,
            hrv_ms: s.sdnn_ms,
            rr_count: s.count,
        })
    }

    pub fn blink_rate(&self) -> f64 {
        blink::blink_rate(self.blink.blink_count, self.elapsed_ms)
    }

    /// 会话结束时的最终计算：眨眼率、可报告 HRV 与压力等级
    pub fn finalize(&self, config: &ScanConfig) -> StressResult {
        let blink_rate = self.blink_rate();
        let reading = self.reportable_hrv(&config.rppg);
        let hrv = reading.map(|r| r.hrv_ms);
        StressResult {
            blink_rate,
            blink_count: self.blink.blink_count,
            hrv,
            heart_rate: reading.map(|r| r.heart_rate),
            stress_level: stress::classify(blink_rate, hrv),
            duration_ms: self.elapsed_ms,
        }
    }

    pub fn telemetry(&self, config: &ScanConfig, pulse: bool) -> LiveTelemetry {
        let stats = self.live_stats();
        let progress =
            (self.elapsed_ms as f64 / config.scan_duration_ms as f64 * 100.0).clamp(0.0, 100.0);
        LiveTelemetry {
            elapsed_ms: self.elapsed_ms,
            progress_percent: progress,
            face_detected: self.last_face_detected,
            blink_count: self.blink.blink_count,
            blink_rate: blink::round_one_decimal(self.blink_rate()),
            heart_rate: stats.map(|s| s.heart_rate.round()),
            hrv_ms: stats.map(|s| s.sdnn_ms.round()),
            hrv_reportable: self.reportable_hrv(&config.rppg).is_some(),
            pulse,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::PixelFormat;
    use crate::signal::rppg::ChannelThresholdSkin;

    struct Scripted(Vec<Result<Option<LandmarkSet>, FrameError>>);

    impl LandmarkProvider for Scripted {
        fn detect(
            &mut self,
            _frame: &VideoFrame,
            _ts: u64,
        ) -> Result<Option<LandmarkSet>, FrameError> {
            if self.0.is_empty() {
                Ok(None)
            } else {
                self.0.remove(0)
            }
        }
    }

    fn frame() -> VideoFrame {
        VideoFrame::filled(64, 48, PixelFormat::Rgb, [180, 120, 100])
    }

    #[test]
    fn inference_failure_drops_landmarks_but_keeps_rppg() {
        let config = ScanConfig::default();
        let mut state = SessionState::new(&config, 0);
        let mut provider = Scripted(vec![Err(FrameError::InferenceFailure("gpu lost".into()))]);

        let report = state.process_frame(
            &config,
            &EyeLandmarkIndices::default(),
            &ChannelThresholdSkin::default(),
            &mut provider,
            &frame(),
            33,
        );
        assert!(report.landmarks_dropped);
        assert_eq!(state.frames_dropped, 1);
        assert_eq!(state.green.len(), 1);
    }

    #[test]
    fn short_landmark_set_is_skipped() {
        let config = ScanConfig::default();
        let mut state = SessionState::new(&config, 0);
        let mut provider = Scripted(vec![Ok(Some(LandmarkSet::from_flat_xy(&[0.5; 24])))]);

        let report = state.process_frame(
            &config,
            &EyeLandmarkIndices::MEDIAPIPE_FACE_MESH,
            &ChannelThresholdSkin::default(),
            &mut provider,
            &frame(),
            33,
        );
        assert!(report.landmarks_dropped);
        assert!(!report.face_detected);
        assert_eq!(state.blink.blink_count, 0);
    }

    #[test]
    fn no_face_hints_escalate_once_per_streak() {
        let mut config = ScanConfig::default();
        config.hints = HintConfig {
            reposition_after_frames: 3,
            low_light_after_frames: 5,
        };
        let mut state = SessionState::new(&config, 0);
        let hints: Vec<Option<ScanHint>> = (0..8).map(|_| state.on_no_face(&config.hints)).collect();
        assert_eq!(
            hints,
            vec![
                None,
                None,
                Some(ScanHint::Reposition),
                None,
                Some(ScanHint::LowLight),
                None,
                None,
                None
            ]
        );
        assert_eq!(state.on_face(&config.hints), Some(ScanHint::FaceReacquired));
        assert_eq!(state.on_face(&config.hints), None);
    }

    #[test]
    fn hrv_withheld_before_minimum_elapsed() {
        let config = ScanConfig::default();
        let mut state = SessionState::new(&config, 0);
        for _ in 0..20 {
            state.rr.push_interval(800);
        }
        state.advance_to(10_000);
        assert!(state.live_stats().is_some());
        assert!(state.reportable_hrv(&config.rppg).is_none());

        state.advance_to(25_000);
        let reading = state.reportable_hrv(&config.rppg).expect("reportable");
        assert_eq!(reading.heart_rate, 75.0);
        assert_eq!(reading.rr_count, 20);
    }

    #[test]
    fn dropped_camera_frame_clears_face_flag() {
        let config = ScanConfig::default();
        let indices = EyeLandmarkIndices::MEDIAPIPE_FACE_MESH;
        let mut provider = Scripted(vec![Ok(Some(crate::sim::landmarks_for_ear(
            &indices,
            crate::sim::OPEN_EAR,
        )))]);
        let mut state = SessionState::new(&config, 0);
        let skin = ChannelThresholdSkin::default();

        let report = state.process_frame(&config, &indices, &skin, &mut provider, &frame(), 33);
        assert!(report.face_detected);
        assert!(state.telemetry(&config, false).face_detected);

        state.drop_frame();
        assert_eq!(state.frames_dropped, 1);
        assert!(!state.telemetry(&config, false).face_detected);
    }

    #[test]
    fn telemetry_progress_is_clamped() {
        let config = ScanConfig::default();
        let mut state = SessionState::new(&config, 1_000);
        state.advance_to(31_000);
        assert_eq!(state.telemetry(&config, false).progress_percent, 50.0);
        state.advance_to(100_000);
        assert_eq!(state.telemetry(&config, false).progress_percent, 100.0);
    }

    #[test]
    fn finalize_uses_unrounded_rate_and_reportable_hrv() {
        let config = ScanConfig::default();
        let mut state = SessionState::new(&config, 0);
        state.blink.blink_count = 26;
        for rr in [700, 720, 700, 720, 700, 720, 700, 720, 700, 720, 700, 720, 700, 720, 700, 720] {
            state.rr.push_interval(rr);
        }
        state.advance_to(60_000);

        let result = state.finalize(&config);
        assert_eq!(result.blink_rate, 26.0);
        assert_eq!(result.duration_ms, 60_000);
        assert_eq!(result.hrv, Some(10.0));
        assert_eq!(result.heart_rate, Some(60_000.0 / 710.0));
        assert_eq!(result.stress_level, crate::signal::stress::StressLevel::High);
    }
}
