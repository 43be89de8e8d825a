//! 浏览器端扫描器
//!
//! 摄像头与人脸关键点模型由 JavaScript 侧持有，每帧分别推送关键点与额头像素。
//! 扫描时长由宿主决定：到时调用 `finish` 取得结果。

use stress_scan::landmarks::{EyeLandmarkIndices, LandmarkSet};
use stress_scan::scan::{ScanConfig, ScanHint, ScanPhase, SessionState};
use stress_scan::signal::blink::round_one_decimal;
use stress_scan::signal::rppg::ChannelThresholdSkin;
use stress_scan::{FrameView, PixelFormat, ScanError, StressResult};
use wasm_bindgen::prelude::*;

/// 与 JS 无关的扫描逻辑，便于在原生目标上测试
pub(crate) struct ScannerCore {
    config: ScanConfig,
    indices: EyeLandmarkIndices,
    skin: ChannelThresholdSkin,
    phase: ScanPhase,
    session: Option<SessionState>,
    last_result: Option<StressResult>,
}

impl ScannerCore {
    pub(crate) fn new(config: ScanConfig, indices: EyeLandmarkIndices) -> Self {
        Self {
            config,
            indices,
            skin: ChannelThresholdSkin::default(),
            phase: ScanPhase::Idle,
            session: None,
            last_result: None,
        }
    }

    pub(crate) fn start(&mut self, now_ms: u64) -> Result<(), ScanError> {
        if self.phase == ScanPhase::Scanning {
            return Err(ScanError::AlreadyScanning);
        }
        self.session = Some(SessionState::new(&self.config, now_ms));
        self.phase = ScanPhase::Scanning;
        Ok(())
    }

    pub(crate) fn push_landmarks(&mut self, flat_xy: &[f64], now_ms: u64) -> bool {
        let (config, indices) = (&self.config, &self.indices);
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        session.advance_to(now_ms);
        let set = LandmarkSet::from_flat_xy(flat_xy);
        session
            .observe_landmarks(config, indices, Ok(Some(set)), now_ms)
            .blink
    }

    pub(crate) fn no_face(&mut self, now_ms: u64) -> Option<ScanHint> {
        let (config, indices) = (&self.config, &self.indices);
        let session = self.session.as_mut()?;
        session.advance_to(now_ms);
        session.observe_landmarks(config, indices, Ok(None), now_ms).hint
    }

    pub(crate) fn push_pixels(&mut self, rgba: &[u8], width: u32, height: u32, now_ms: u64) -> bool {
        let (rppg, skin) = (&self.config.rppg, &self.skin);
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        session.advance_to(now_ms);
        let Ok(frame) = FrameView::new(width, height, PixelFormat::Rgba, rgba) else {
            return false;
        };
        session.observe_pixels(rppg, skin, frame, now_ms).is_some()
    }

    pub(crate) fn finish(&mut self, now_ms: u64) -> Option<StressResult> {
        let mut session = self.session.take()?;
        session.advance_to(now_ms);
        let result = session.finalize(&self.config);
        self.phase = ScanPhase::Completed;
        self.last_result = Some(result.clone());
        Some(result)
    }

    pub(crate) fn abort(&mut self) {
        self.session = None;
        if self.phase == ScanPhase::Scanning {
            self.phase = ScanPhase::Idle;
        }
    }
}

fn ms_from_js(now_ms: f64) -> u64 {
    if now_ms.is_finite() && now_ms > 0.0 {
        now_ms as u64
    } else {
        0
    }
}

fn hint_name(hint: ScanHint) -> &'static str {
    match hint {
        ScanHint::Reposition => "reposition",
        ScanHint::LowLight => "lowLight",
        ScanHint::FaceReacquired => "faceReacquired",
    }
}

/// 压力扫描器
#[wasm_bindgen]
pub struct StressScanner {
    core: ScannerCore,
}

#[wasm_bindgen]
impl StressScanner {
    /// `handheld` 为 true 时使用手持设备的眨眼阈值
    #[wasm_bindgen(constructor)]
    pub fn new(handheld: bool) -> Self {
        let mut config = ScanConfig::default();
        if handheld {
            config.blink = stress_scan::scan::BlinkThresholds::handheld();
        }
        Self {
            core: ScannerCore::new(config, EyeLandmarkIndices::MEDIAPIPE_FACE_MESH),
        }
    }

    pub fn start(&mut self, now_ms: f64) -> Result<(), JsValue> {
        self.core
            .start(ms_from_js(now_ms))
            .map_err(|e| js_sys::Error::new(&e.to_string()).into())
    }

    /// 推送一帧关键点（x0, y0, x1, y1, ...），返回本帧是否检测到眨眼
    #[wasm_bindgen(js_name = "pushLandmarks")]
    pub fn push_landmarks(&mut self, flat_xy: &[f64], now_ms: f64) -> bool {
        self.core.push_landmarks(flat_xy, ms_from_js(now_ms))
    }

    /// 本帧没有检测到人脸；需要提示用户时返回提示名
    #[wasm_bindgen(js_name = "noFace")]
    pub fn no_face(&mut self, now_ms: f64) -> Option<String> {
        self.core
            .no_face(ms_from_js(now_ms))
            .map(|h| hint_name(h).to_string())
    }

    /// 推送一帧 RGBA 像素，返回本帧是否检测到脉搏峰值
    #[wasm_bindgen(js_name = "pushPixels")]
    pub fn push_pixels(&mut self, rgba: &[u8], width: u32, height: u32, now_ms: f64) -> bool {
        self.core.push_pixels(rgba, width, height, ms_from_js(now_ms))
    }

    /// 结束扫描并返回结果对象；没有进行中的扫描时返回 null
    pub fn finish(&mut self, now_ms: f64) -> JsValue {
        match self.core.finish(ms_from_js(now_ms)) {
            Some(result) => serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL),
            None => JsValue::NULL,
        }
    }

    pub fn abort(&mut self) {
        self.core.abort();
    }

    #[wasm_bindgen(getter, js_name = "isScanning")]
    pub fn is_scanning(&self) -> bool {
        self.core.phase == ScanPhase::Scanning
    }

    #[wasm_bindgen(getter, js_name = "blinkCount")]
    pub fn blink_count(&self) -> u32 {
        self.core
            .session
            .as_ref()
            .map_or(0, |s| s.blink.blink_count)
    }

    #[wasm_bindgen(getter, js_name = "blinkRate")]
    pub fn blink_rate(&self) -> f64 {
        self.core
            .session
            .as_ref()
            .map_or(0.0, |s| round_one_decimal(s.blink_rate()))
    }

    #[wasm_bindgen(getter, js_name = "heartRate")]
    pub fn heart_rate(&self) -> Option<f64> {
        let stats = self.core.session.as_ref()?.live_stats()?;
        Some(stats.heart_rate.round())
    }

    #[wasm_bindgen(getter)]
    pub fn hrv(&self) -> Option<f64> {
        let stats = self.core.session.as_ref()?.live_stats()?;
        Some(stats.sdnn_ms.round())
    }

    #[wasm_bindgen(getter, js_name = "lastResult")]
    pub fn last_result(&self) -> JsValue {
        self.core
            .last_result
            .as_ref()
            .and_then(|r| serde_wasm_bindgen::to_value(r).ok())
            .unwrap_or(JsValue::NULL)
    }
}
