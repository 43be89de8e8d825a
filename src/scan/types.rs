use serde::{Deserialize, Serialize};

use crate::signal::stress::StressLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScanPhase {
    Idle,
    Scanning,
    Completed,
}

/// 扫描结果，每个完成的会话只产生一次
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StressResult {
    /// 眨眼率（次/分钟）
    pub blink_rate: f64,
    pub blink_count: u32,
    /// SDNN（毫秒），信号不足时为空
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hrv: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<f64>,
    pub stress_level: StressLevel,
    pub duration_ms: u64,
}

/// 可对外报告的 HR/HRV 读数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HrvReading {
    pub heart_rate: f64,
    pub hrv_ms: f64,
    pub rr_count: usize,
}

/// 每帧的实时遥测，仅供界面展示
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveTelemetry {
    pub elapsed_ms: u64,
    /// 0-100
    pub progress_percent: f64,
    pub face_detected: bool,
    pub blink_count: u32,
    /// 保留一位小数
    pub blink_rate: f64,
    pub heart_rate: Option<f64>,
    pub hrv_ms: Option<f64>,
    pub hrv_reportable: bool,
    /// 本帧检测到脉搏峰值
    pub pulse: bool,
}

/// 无人脸时逐级升级的用户提示
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScanHint {
    Reposition,
    LowLight,
    FaceReacquired,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ScanEvent {
    Started {
        #[serde(rename = "startedAtMs")]
        started_at_ms: u64,
    },
    Telemetry(LiveTelemetry),
    Hint(ScanHint),
    HrvReading(HrvReading),
    Completed(StressResult),
    Aborted,
    CameraAccessDenied(String),
}

/// 单次 tick 的结果
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// 当前没有进行中的扫描
    Idle,
    Scanning(LiveTelemetry),
    Completed(StressResult),
}

/// 扫描事件的接收方（界面、持久化、教练模块等外部协作者）
pub trait EventSink {
    fn emit(&mut self, event: ScanEvent);
}

impl EventSink for Vec<ScanEvent> {
    fn emit(&mut self, event: ScanEvent) {
        self.push(event);
    }
}

impl EventSink for () {
    fn emit(&mut self, _event: ScanEvent) {}
}

impl<F> EventSink for F
where
    F: FnMut(ScanEvent),
{
    fn emit(&mut self, event: ScanEvent) {
        self(event)
    }
}

#[cfg(feature = "runtime")]
impl EventSink for tokio::sync::mpsc::UnboundedSender<ScanEvent> {
    fn emit(&mut self, event: ScanEvent) {
        if self.send(event).is_err() {
            tracing::debug!("Scan event receiver dropped");
        }
    }
}
