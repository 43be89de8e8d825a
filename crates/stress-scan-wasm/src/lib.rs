//! 压力扫描 WASM 库
//!
//! 把 `stress-scan` 的信号流水线编译为 WebAssembly，供浏览器端直接使用。
//! 摄像头与人脸关键点模型留在 JavaScript 侧，这里只做信号处理与分类。
//!
//! ## 导出
//! - `StressScanner`: 单次扫描的状态机（推送关键点、像素，结束时取结果）
//! - `classifyStress`: 无状态的压力分类函数

pub mod scanner;

use wasm_bindgen::prelude::*;

pub use scanner::StressScanner;

/// 由眨眼率与可选的 HRV 计算压力等级（"low" | "moderate" | "high"）
#[wasm_bindgen(js_name = "classifyStress")]
pub fn classify_stress(blink_rate: f64, hrv: Option<f64>) -> String {
    stress_scan::classify(blink_rate, hrv).as_str().to_string()
}
