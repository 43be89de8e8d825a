//! 基于摄像头的压力评估信号流水线
//!
//! 一次 60 秒扫描同时采集两路生理信号：
//! - 人脸关键点 → 眼睛纵横比 (EAR) → 眨眼计数与眨眼率；
//! - 额头 ROI 绿色通道均值 (rPPG) → 脉搏峰值 → RR 间期 → 心率与 HRV (SDNN)。
//!
//! 扫描结束时由眨眼率（以及可用时的 HRV）得出低/中/高三档压力等级。

pub mod config;
pub mod constants;
pub mod error;
pub mod frame;
pub mod landmarks;
#[cfg(feature = "runtime")]
pub mod logging;
pub mod record;
pub mod scan;
pub mod signal;
pub mod sim;

pub use error::{CameraError, FrameError, ScanError};
pub use frame::{Camera, FrameView, PixelFormat, VideoFrame};
pub use landmarks::{EyeLandmarkIndices, LandmarkProvider, LandmarkSet, Point3};
pub use record::ScanRecord;
pub use scan::{ScanConfig, ScanController, ScanEvent, ScanPhase, StressResult};
pub use signal::stress::{classify, StressLevel};
