//! 面部关键点契约
//!
//! 关键点推理（MediaPipe Face Mesh 等）由外部提供，核心只消费 `LandmarkSet`。
//! 模型相关的下标集中在 `EyeLandmarkIndices` 中，更换关键点模型时只需替换这里。

use serde::{Deserialize, Serialize};

use crate::error::FrameError;
use crate::frame::VideoFrame;

/// 归一化坐标下的关键点
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Point3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn xy(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// 二维欧氏距离（忽略 z）
    pub fn distance(&self, other: &Point3) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// 单帧关键点集合，仅在产生它的帧内有效
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LandmarkSet {
    pub points: Vec<Point3>,
}

impl LandmarkSet {
    pub fn new(points: Vec<Point3>) -> Self {
        Self { points }
    }

    /// 从扁平的 [x0, y0, x1, y1, ...] 数组构造
    pub fn from_flat_xy(flat: &[f64]) -> Self {
        let points = flat
            .chunks_exact(2)
            .map(|c| Point3::xy(c[0], c[1]))
            .collect();
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<Point3, FrameError> {
        let point = self.points.get(index).copied().ok_or_else(|| {
            FrameError::InvalidLandmarkSet(format!(
                "index {index} out of range ({} points)",
                self.points.len()
            ))
        })?;
        if !point.is_finite() {
            return Err(FrameError::InvalidLandmarkSet(format!(
                "non-finite coordinate at index {index}"
            )));
        }
        Ok(point)
    }
}

/// 单眼的六个轮廓点
///
/// - p1, p4: 眼角（水平方向）
/// - p2, p3: 上眼睑
/// - p6, p5: 与 p2、p3 相对的下眼睑
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeContour {
    pub p1: Point3,
    pub p2: Point3,
    pub p3: Point3,
    pub p4: Point3,
    pub p5: Point3,
    pub p6: Point3,
}

/// 眼部轮廓点在关键点模型输出中的下标，顺序为 p1..p6
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EyeLandmarkIndices {
    pub left: [usize; 6],
    pub right: [usize; 6],
}

impl EyeLandmarkIndices {
    /// MediaPipe Face Mesh（468/478 点）
    pub const MEDIAPIPE_FACE_MESH: Self = Self {
        left: [33, 160, 158, 133, 153, 144],
        right: [362, 385, 387, 263, 373, 380],
    };

    /// 仅包含 12 个眼部点的紧凑布局（左眼 0-5，右眼 6-11）
    pub const COMPACT: Self = Self {
        left: [0, 1, 2, 3, 4, 5],
        right: [6, 7, 8, 9, 10, 11],
    };

    pub fn left_eye_contour(&self, set: &LandmarkSet) -> Result<EyeContour, FrameError> {
        Self::contour(&self.left, set)
    }

    pub fn right_eye_contour(&self, set: &LandmarkSet) -> Result<EyeContour, FrameError> {
        Self::contour(&self.right, set)
    }

    /// 关键点集至少需要的点数
    pub fn required_len(&self) -> usize {
        self.left
            .iter()
            .chain(self.right.iter())
            .copied()
            .max()
            .map_or(0, |m| m + 1)
    }

    fn contour(idx: &[usize; 6], set: &LandmarkSet) -> Result<EyeContour, FrameError> {
        Ok(EyeContour {
            p1: set.get(idx[0])?,
            p2: set.get(idx[1])?,
            p3: set.get(idx[2])?,
            p4: set.get(idx[3])?,
            p5: set.get(idx[4])?,
            p6: set.get(idx[5])?,
        })
    }
}

impl Default for EyeLandmarkIndices {
    fn default() -> Self {
        Self::MEDIAPIPE_FACE_MESH
    }
}

/// 关键点推理端口
///
/// `Ok(None)` 表示本帧没有检测到人脸，这是正常状态而不是错误。
/// 推理引擎内部的异常应以 `FrameError::InferenceFailure` 返回。
pub trait LandmarkProvider {
    fn detect(
        &mut self,
        frame: &VideoFrame,
        timestamp_ms: u64,
    ) -> Result<Option<LandmarkSet>, FrameError>;
}
