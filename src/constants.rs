/// 一次扫描的固定时长（毫秒）
pub const SCAN_DURATION_MS: u64 = 60_000;

/// 帧处理定时器默认周期（毫秒），约 30 fps
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 33;

/// 会话开始时 last_ear 的"睁眼"哨兵值
pub const EAR_OPEN_SENTINEL: f64 = 1.0;

/// 眼角水平距离低于此值视为退化的关键点集
pub const MIN_EYE_WIDTH: f64 = 1e-6;

/// 绿色通道窗口容量：15 秒 × 30 fps
pub const GREEN_WINDOW_CAPACITY: usize = 450;

/// 自适应峰值阈值使用的最近样本数
pub const PEAK_SUB_WINDOW: usize = 30;

/// threshold = mean + k * stddev 中的 k
pub const PEAK_THRESHOLD_K: f64 = 0.5;

/// 峰值触发后的不应期（毫秒）
pub const PEAK_REFRACTORY_MS: u64 = 150;

/// 生理上合理的 RR 间期下限（毫秒），对应 200 bpm
pub const RR_MIN_MS: u64 = 300;

/// 生理上合理的 RR 间期上限（毫秒），对应 40 bpm
pub const RR_MAX_MS: u64 = 1500;

/// RR 窗口容量
pub const RR_WINDOW_CAPACITY: usize = 30;

/// 开始计算 HR/HRV 所需的最少 RR 间期数
pub const RR_MIN_FOR_STATS: usize = 10;

/// 对外报告 HRV 所需的最少 RR 间期数
pub const RR_MIN_FOR_REPORT: usize = 15;

/// 对外报告 HRV 所需的最短扫描时长（毫秒）
pub const HRV_MIN_ELAPSED_MS: u64 = 25_000;

/// 眨眼率低于此值为低压力（次/分钟）
pub const BLINK_RATE_LOW_MAX: f64 = 15.0;

/// 眨眼率高于此值为高压力（次/分钟）
pub const BLINK_RATE_MODERATE_MAX: f64 = 25.0;

/// 交叉验证：HRV 低于此值（毫秒）且眨眼率偏高时强制判定为高压力
pub const HRV_ACUTE_STRESS_MS: f64 = 30.0;

/// 连续无人脸帧数达到此值时提示调整位置
pub const REPOSITION_AFTER_FRAMES: u32 = 30;

/// 连续无人脸帧数达到此值时提示光线不足
pub const LOW_LIGHT_AFTER_FRAMES: u32 = 90;

/// 下游教练接口接受的 HRV 上限（毫秒）
pub const MAX_REPORTED_HRV_MS: f64 = 200.0;

/// 每分钟毫秒数
pub const MILLIS_PER_MINUTE: f64 = 60_000.0;
