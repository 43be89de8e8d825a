//! 基于 tokio 定时器的扫描驱动
//!
//! 控制器本身是同步的；这里在当前任务上按 `tick_interval_ms` 周期调用 `tick`。
//! 单帧处理超时导致错过的 tick 直接跳过，不会排队补帧。

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{Instant, MissedTickBehavior};

use crate::error::ScanError;
use crate::frame::Camera;
use crate::landmarks::LandmarkProvider;
use crate::scan::clock::Clock;
use crate::scan::controller::ScanController;
use crate::scan::types::{EventSink, StressResult, TickOutcome};

/// 启动扫描并驱动到完成
///
/// 收到关闭信号（或发送端全部被丢弃）时中止扫描并返回 `ScanError::Aborted`。
pub async fn run_scan<C, L, K, E>(
    controller: &mut ScanController<C, L, K, E>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<StressResult, ScanError>
where
    C: Camera,
    L: LandmarkProvider,
    K: Clock,
    E: EventSink,
{
    controller.start()?;

    let tick_every = Duration::from_millis(controller.config().tick_interval_ms);
    let mut interval = tokio::time::interval(tick_every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let began = Instant::now();
                let outcome = controller.tick();
                let took = began.elapsed();
                if took > tick_every {
                    tracing::warn!(
                        took_ms = took.as_millis() as u64,
                        tick_ms = tick_every.as_millis() as u64,
                        "Frame processing overran tick interval, next tick skipped"
                    );
                }

                match outcome {
                    TickOutcome::Completed(result) => return Ok(result),
                    TickOutcome::Scanning(_) => {}
                    TickOutcome::Idle => return Err(ScanError::Aborted),
                }
            }
            _ = shutdown_rx.recv() => {
                tracing::info!("Shutdown signal received, aborting scan");
                controller.abort();
                return Err(ScanError::Aborted);
            }
        }
    }
}
