//! 视频帧与摄像头端口
//!
//! 摄像头本身由外部提供（浏览器 getUserMedia、V4L2 等），核心只依赖这里的契约：
//! 打开、逐帧读取、停止。

use crate::error::{CameraError, FrameError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgb,
    Rgba,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb => 3,
            PixelFormat::Rgba => 4,
        }
    }
}

/// 一帧 RGB/RGBA 像素缓冲，行优先存储
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub data: Vec<u8>,
}

impl VideoFrame {
    pub fn new(
        width: u32,
        height: u32,
        format: PixelFormat,
        data: Vec<u8>,
    ) -> Result<Self, FrameError> {
        let frame = Self {
            width,
            height,
            format,
            data,
        };
        frame.validate()?;
        Ok(frame)
    }

    /// 单色帧，主要用于测试和合成数据源
    pub fn filled(width: u32, height: u32, format: PixelFormat, rgb: [u8; 3]) -> Self {
        let bpp = format.bytes_per_pixel();
        let mut data = Vec::with_capacity(width as usize * height as usize * bpp);
        for _ in 0..(width as usize * height as usize) {
            data.extend_from_slice(&rgb);
            if bpp == 4 {
                data.push(255);
            }
        }
        Self {
            width,
            height,
            format,
            data,
        }
    }

    pub fn validate(&self) -> Result<(), FrameError> {
        self.view().validate()
    }

    /// 读取 (x, y) 处像素的 RGB 值，越界返回 None
    #[inline]
    pub fn rgb_at(&self, x: u32, y: u32) -> Option<(u8, u8, u8)> {
        self.view().rgb_at(x, y)
    }

    pub fn view(&self) -> FrameView<'_> {
        FrameView {
            width: self.width,
            height: self.height,
            format: self.format,
            data: &self.data,
        }
    }
}

/// 借用的像素缓冲，调用方持有数据时免去整帧拷贝
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameView<'a> {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub data: &'a [u8],
}

impl<'a> FrameView<'a> {
    pub fn new(
        width: u32,
        height: u32,
        format: PixelFormat,
        data: &'a [u8],
    ) -> Result<Self, FrameError> {
        let view = Self {
            width,
            height,
            format,
            data,
        };
        view.validate()?;
        Ok(view)
    }

    pub fn validate(&self) -> Result<(), FrameError> {
        if self.width == 0 || self.height == 0 {
            return Err(FrameError::MalformedFrame(format!(
                "empty frame {}x{}",
                self.width, self.height
            )));
        }
        let expected =
            self.width as usize * self.height as usize * self.format.bytes_per_pixel();
        if self.data.len() != expected {
            return Err(FrameError::MalformedFrame(format!(
                "expected {expected} bytes for {}x{} {:?}, got {}",
                self.width,
                self.height,
                self.format,
                self.data.len()
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn rgb_at(&self, x: u32, y: u32) -> Option<(u8, u8, u8)> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let bpp = self.format.bytes_per_pixel();
        let idx = (y as usize * self.width as usize + x as usize) * bpp;
        let px = self.data.get(idx..idx + 3)?;
        Some((px[0], px[1], px[2]))
    }
}

/// 摄像头端口
///
/// 会话控制器在整个会话期间独占持有摄像头；`stop` 必须同步释放底层资源。
pub trait Camera {
    fn open(&mut self) -> Result<(), CameraError>;

    /// 读取最新一帧；`Ok(None)` 表示摄像头尚未就绪
    fn capture(&mut self) -> Result<Option<VideoFrame>, CameraError>;

    fn stop(&mut self);

    fn is_open(&self) -> bool;
}
