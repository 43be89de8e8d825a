use stress_scan::scan::{ManualClock, ScanConfig, ScanController, ScanEvent, TickOutcome};
use stress_scan::sim::{SyntheticCamera, SyntheticFace};
use stress_scan::StressResult;

/// 集成测试统一使用 50ms 一帧，60s 恰好 1200 帧
pub const TICK_MS: u64 = 50;

pub type SimController =
    ScanController<SyntheticCamera<ManualClock>, SyntheticFace, ManualClock, Vec<ScanEvent>>;

pub fn scan_config(duration_ms: u64) -> ScanConfig {
    ScanConfig {
        scan_duration_ms: duration_ms,
        tick_interval_ms: TICK_MS,
        ..ScanConfig::default()
    }
}

pub fn sim_controller(
    duration_ms: u64,
    face: SyntheticFace,
    heart_rate_bpm: f64,
) -> (SimController, ManualClock) {
    sim_controller_with(duration_ms, face, |clock| {
        SyntheticCamera::new(clock, heart_rate_bpm)
    })
}

/// 自定义合成摄像头（例如中途失败）
pub fn sim_controller_with<F>(
    duration_ms: u64,
    face: SyntheticFace,
    camera: F,
) -> (SimController, ManualClock)
where
    F: FnOnce(ManualClock) -> SyntheticCamera<ManualClock>,
{
    let clock = ManualClock::new(0);
    let camera = camera(clock.clone());
    let controller = ScanController::new(
        scan_config(duration_ms),
        camera,
        face,
        clock.clone(),
        Vec::new(),
    )
    .expect("valid scan config");
    (controller, clock)
}

/// 每次先推进时钟再 tick，直到完成或超过 `max_ticks`
pub fn drive<C, L, E>(
    controller: &mut ScanController<C, L, ManualClock, E>,
    clock: &ManualClock,
    max_ticks: usize,
) -> Option<StressResult>
where
    C: stress_scan::Camera,
    L: stress_scan::LandmarkProvider,
    E: stress_scan::scan::EventSink,
{
    for _ in 0..max_ticks {
        clock.advance(TICK_MS);
        match controller.tick() {
            TickOutcome::Completed(result) => return Some(result),
            TickOutcome::Scanning(_) => {}
            TickOutcome::Idle => return None,
        }
    }
    None
}

pub fn count<F>(events: &[ScanEvent], pred: F) -> usize
where
    F: Fn(&ScanEvent) -> bool,
{
    events.iter().filter(|e| pred(e)).count()
}
