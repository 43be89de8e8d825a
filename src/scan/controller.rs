//! 扫描会话控制器
//!
//! 状态机：`Idle → Scanning → Completed`，扫描中可通过 `abort` 回到 `Idle`。
//! 控制器独占摄像头与关键点推理端口，每次 `tick` 同步处理恰好一帧。

use crate::error::{CameraError, ScanError};
use crate::frame::Camera;
use crate::landmarks::{EyeLandmarkIndices, LandmarkProvider};
use crate::scan::clock::Clock;
use crate::scan::config::ScanConfig;
use crate::scan::state::SessionState;
use crate::scan::types::{EventSink, ScanEvent, ScanPhase, StressResult, TickOutcome};
use crate::signal::rppg::{ChannelThresholdSkin, SkinPredicate};

pub struct ScanController<C, L, K, E>
where
    C: Camera,
    L: LandmarkProvider,
    K: Clock,
    E: EventSink,
{
    config: ScanConfig,
    indices: EyeLandmarkIndices,
    skin: Box<dyn SkinPredicate + Send>,
    camera: C,
    landmarks: L,
    clock: K,
    sink: E,
    phase: ScanPhase,
    session: Option<SessionState>,
    last_result: Option<StressResult>,
}

impl<C, L, K, E> ScanController<C, L, K, E>
where
    C: Camera,
    L: LandmarkProvider,
    K: Clock,
    E: EventSink,
{
    pub fn new(
        config: ScanConfig,
        camera: C,
        landmarks: L,
        clock: K,
        sink: E,
    ) -> Result<Self, ScanError> {
        config.validate().map_err(ScanError::InvalidConfig)?;
        Ok(Self {
            config,
            indices: EyeLandmarkIndices::default(),
            skin: Box::new(ChannelThresholdSkin::default()),
            camera,
            landmarks,
            clock,
            sink,
            phase: ScanPhase::Idle,
            session: None,
            last_result: None,
        })
    }

    pub fn with_indices(mut self, indices: EyeLandmarkIndices) -> Self {
        self.indices = indices;
        self
    }

    pub fn with_skin_predicate<S>(mut self, skin: S) -> Self
    where
        S: SkinPredicate + Send + 'static,
    {
        self.skin = Box::new(skin);
        self
    }

    /// 打开摄像头并开始新的会话
    ///
    /// 摄像头打开失败时只发出一次 `CameraAccessDenied` 事件，控制器状态保持不变。
    pub fn start(&mut self) -> Result<(), ScanError> {
        if self.phase == ScanPhase::Scanning {
            return Err(ScanError::AlreadyScanning);
        }

        if let Err(e) = self.camera.open() {
            tracing::warn!(error = %e, "Camera access denied, scan not started");
            let message = e.to_string();
            self.sink.emit(ScanEvent::CameraAccessDenied(message.clone()));
            return Err(ScanError::CameraAccessDenied(message));
        }

        let started_at_ms = self.clock.now_ms();
        self.session = Some(SessionState::new(&self.config, started_at_ms));
        self.phase = ScanPhase::Scanning;
        tracing::info!(
            started_at_ms,
            duration_ms = self.config.scan_duration_ms,
            "Scan started"
        );
        self.sink.emit(ScanEvent::Started { started_at_ms });
        Ok(())
    }

    /// 处理一帧；达到扫描时长后完成会话
    pub fn tick(&mut self) -> TickOutcome {
        if self.phase != ScanPhase::Scanning {
            return TickOutcome::Idle;
        }
        let now_ms = self.clock.now_ms();
        let captured = match self.camera.capture() {
            Err(e) if e.revokes_access() => {
                self.lose_camera(e);
                return TickOutcome::Idle;
            }
            other => other,
        };
        let Some(session) = self.session.as_mut() else {
            return TickOutcome::Idle;
        };
        session.advance_to(now_ms);

        let mut pulse = false;
        match captured {
            Ok(Some(frame)) => {
                let report = session.process_frame(
                    &self.config,
                    &self.indices,
                    self.skin.as_ref(),
                    &mut self.landmarks,
                    &frame,
                    now_ms,
                );
                pulse = report.peak.is_some();
                if let Some(hint) = report.hint {
                    tracing::info!(?hint, elapsed_ms = session.elapsed_ms, "Scan hint");
                    self.sink.emit(ScanEvent::Hint(hint));
                }
                if let Some(reading) = report.hrv_reading {
                    self.sink.emit(ScanEvent::HrvReading(reading));
                }
            }
            Ok(None) => {
                session.drop_frame();
                tracing::debug!(elapsed_ms = session.elapsed_ms, "Camera not ready, frame dropped");
            }
            Err(e) => {
                session.drop_frame();
                tracing::debug!(
                    error = %e,
                    elapsed_ms = session.elapsed_ms,
                    "Camera read failed, frame dropped"
                );
            }
        }

        let telemetry = session.telemetry(&self.config, pulse);
        self.sink.emit(ScanEvent::Telemetry(telemetry.clone()));

        if session.elapsed_ms >= self.config.scan_duration_ms {
            if let Some(finished) = self.session.take() {
                return TickOutcome::Completed(self.complete(finished));
            }
        }
        TickOutcome::Scanning(telemetry)
    }

    /// 结束会话：先释放摄像头，再发出结果
    fn complete(&mut self, session: SessionState) -> StressResult {
        let result = session.finalize(&self.config);

        self.camera.stop();
        self.phase = ScanPhase::Completed;
        tracing::info!(
            blink_count = result.blink_count,
            blink_rate = result.blink_rate,
            hrv_ms = ?result.hrv,
            heart_rate = ?result.heart_rate,
            stress_level = %result.stress_level,
            frames_processed = session.frames_processed,
            frames_dropped = session.frames_dropped,
            "Scan completed"
        );

        self.last_result = Some(result.clone());
        self.sink.emit(ScanEvent::Completed(result.clone()));
        result
    }

    /// 扫描中途失去摄像头：不产生结果，告知原因后按中止处理
    fn lose_camera(&mut self, error: CameraError) {
        tracing::warn!(
            error = %error,
            elapsed_ms = self.session.as_ref().map(|s| s.elapsed_ms),
            "Camera access lost during scan"
        );
        self.sink.emit(ScanEvent::CameraAccessDenied(error.to_string()));
        self.abort();
    }

    /// 中止进行中的扫描；不在扫描中时返回 false
    pub fn abort(&mut self) -> bool {
        if self.phase != ScanPhase::Scanning {
            return false;
        }
        self.camera.stop();
        let elapsed_ms = self.session.take().map(|s| s.elapsed_ms).unwrap_or(0);
        self.phase = ScanPhase::Idle;
        tracing::info!(elapsed_ms, "Scan aborted");
        self.sink.emit(ScanEvent::Aborted);
        true
    }

    pub fn phase(&self) -> ScanPhase {
        self.phase
    }

    pub fn last_result(&self) -> Option<&StressResult> {
        self.last_result.as_ref()
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn session(&self) -> Option<&SessionState> {
        self.session.as_ref()
    }

    pub fn camera(&self) -> &C {
        &self.camera
    }

    pub fn sink(&self) -> &E {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut E {
        &mut self.sink
    }

    pub fn into_sink(mut self) -> E
    where
        E: Default,
    {
        std::mem::take(&mut self.sink)
    }
}

impl<C, L, K, E> Drop for ScanController<C, L, K, E>
where
    C: Camera,
    L: LandmarkProvider,
    K: Clock,
    E: EventSink,
{
    fn drop(&mut self) {
        if self.camera.is_open() {
            self.camera.stop();
        }
    }
}
