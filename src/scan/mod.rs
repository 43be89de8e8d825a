//! 扫描会话：配置、时钟、会话状态、控制器与异步调度

pub mod clock;
pub mod config;
pub mod controller;
#[cfg(feature = "runtime")]
pub mod scheduler;
pub mod state;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
#[cfg(feature = "runtime")]
pub use clock::TokioClock;
pub use config::{BlinkThresholds, HintConfig, RoiSpec, RppgConfig, ScanConfig};
pub use controller::ScanController;
#[cfg(feature = "runtime")]
pub use scheduler::run_scan;
pub use state::{FrameReport, LandmarkOutcome, SessionState};
pub use types::{
    EventSink, HrvReading, LiveTelemetry, ScanEvent, ScanHint, ScanPhase, StressResult,
    TickOutcome,
};
