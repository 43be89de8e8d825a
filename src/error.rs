use thiserror::Error;

/// 会话级错误：只有这类错误会传播到调用方
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("camera access denied: {0}")]
    CameraAccessDenied(String),
    #[error("a scan is already running")]
    AlreadyScanning,
    #[error("scan aborted")]
    Aborted,
    #[error("invalid scan config: {0}")]
    InvalidConfig(String),
}

/// 单帧错误：在帧边界内被捕获，只记录日志并丢弃该帧
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("invalid landmark set: {0}")]
    InvalidLandmarkSet(String),
    #[error("landmark inference failed: {0}")]
    InferenceFailure(String),
    #[error("malformed frame: {0}")]
    MalformedFrame(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraError {
    #[error("camera permission denied")]
    PermissionDenied,
    #[error("camera unavailable: {0}")]
    Unavailable(String),
    #[error("camera read failed: {0}")]
    ReadFailed(String),
}

impl CameraError {
    /// 权限被撤销或设备消失：本次会话不可能再拿到帧
    pub fn revokes_access(&self) -> bool {
        matches!(self, CameraError::PermissionDenied | CameraError::Unavailable(_))
    }
}

impl From<CameraError> for ScanError {
    fn from(err: CameraError) -> Self {
        ScanError::CameraAccessDenied(err.to_string())
    }
}
