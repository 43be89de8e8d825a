//! EAR (Eye Aspect Ratio) 计算模块
//!
//! 标准6点公式: EAR = (|p2-p6| + |p3-p5|) / (2 * |p1-p4|)
//! 对左右眼分别计算后取平均。睁眼时约 0.25-0.35，闭眼时迅速降到 0.15 以下。

use crate::constants::MIN_EYE_WIDTH;
use crate::error::FrameError;
use crate::landmarks::{EyeContour, EyeLandmarkIndices, LandmarkSet};

/// 单眼 EAR
///
/// 水平距离过小说明关键点退化（侧脸、遮挡），返回 `InvalidLandmarkSet`。
pub fn eye_aspect_ratio(eye: &EyeContour) -> Result<f64, FrameError> {
    let horizontal = eye.p1.distance(&eye.p4);
    if horizontal < MIN_EYE_WIDTH {
        return Err(FrameError::InvalidLandmarkSet(format!(
            "degenerate eye width {horizontal:e}"
        )));
    }

    let vertical1 = eye.p2.distance(&eye.p6);
    let vertical2 = eye.p3.distance(&eye.p5);
    Ok((vertical1 + vertical2) / (2.0 * horizontal))
}

/// 双眼平均 EAR
pub fn compute_ear(
    landmarks: &LandmarkSet,
    indices: &EyeLandmarkIndices,
) -> Result<f64, FrameError> {
    let left = eye_aspect_ratio(&indices.left_eye_contour(landmarks)?)?;
    let right = eye_aspect_ratio(&indices.right_eye_contour(landmarks)?)?;
    Ok((left + right) / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::Point3;

    /// 宽 0.1、高 ear*0.1 的理想眼睛
    fn eye_points(cx: f64, cy: f64, ear: f64) -> [Point3; 6] {
        let w = 0.1;
        let h = ear * w;
        [
            Point3::xy(cx - w / 2.0, cy),
            Point3::xy(cx - w / 6.0, cy - h / 2.0),
            Point3::xy(cx + w / 6.0, cy - h / 2.0),
            Point3::xy(cx + w / 2.0, cy),
            Point3::xy(cx + w / 6.0, cy + h / 2.0),
            Point3::xy(cx - w / 6.0, cy + h / 2.0),
        ]
    }

    fn compact_set(left: f64, right: f64) -> LandmarkSet {
        let mut points = eye_points(0.35, 0.4, left).to_vec();
        points.extend_from_slice(&eye_points(0.65, 0.4, right));
        LandmarkSet::new(points)
    }

    #[test]
    fn open_eyes_give_expected_ratio() {
        let ear = compute_ear(&compact_set(0.3, 0.3), &EyeLandmarkIndices::COMPACT).unwrap();
        assert!((ear - 0.3).abs() < 1e-9);
    }

    #[test]
    fn result_is_mean_of_both_eyes() {
        let ear = compute_ear(&compact_set(0.3, 0.1), &EyeLandmarkIndices::COMPACT).unwrap();
        assert!((ear - 0.2).abs() < 1e-9);
    }

    #[test]
    fn degenerate_eye_is_rejected() {
        let set = LandmarkSet::new(vec![Point3::xy(0.5, 0.5); 12]);
        let err = compute_ear(&set, &EyeLandmarkIndices::COMPACT).unwrap_err();
        assert!(matches!(err, FrameError::InvalidLandmarkSet(_)));
    }

    #[test]
    fn short_landmark_set_is_rejected() {
        let set = compact_set(0.3, 0.3);
        let err = compute_ear(&set, &EyeLandmarkIndices::MEDIAPIPE_FACE_MESH).unwrap_err();
        assert!(matches!(err, FrameError::InvalidLandmarkSet(_)));
    }
}
