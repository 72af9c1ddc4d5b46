//! # 事务服务（PixelBridge）
//!
//! ## 设计思路
//!
//! 所有像素操作共用一个事务：
//!
//! ```text
//! 宿主图像 ──转换──▶ RGBA 缓冲 ──from_raw_pixels──▶ 句柄
//!                                                   │
//!                                 Transform::invoke ▼
//! 宿主图像 ◀──转换── RGBA 缓冲 ◀──────回读────────── 句柄 ──▶ image_free
//! ```
//!
//! 顺序固定为 创建 < 变换 < 回读 < 释放。句柄是 `OwnedHandle`，
//! 任何一步以 `?` 提前返回时，`Drop` 同样会释放它，且只释放一次。
//!
//! ## 实现思路
//!
//! - 内部每一步都返回 `Result<_, BridgeError>`，便于记录具体失败原因
//! - 对上层只给出 `Option<DynamicImage>` / `bool`，句柄、绑定与结果码都不外泄；
//!   带类型错误的 `transaction` / `try_load` / `try_save` 仅 crate 内可见
//! - 无效宿主图像在跨界之前就被拒绝，不会产生任何引擎调用

use std::path::Path;
use std::slice;
use std::time::Instant;

use image::DynamicImage;

use super::buffer::{PixelBuffer, buffer_to_host_image, host_image_to_buffer};
use super::filter::ResampleFilter;
use super::transform::Transform;
use crate::engine::{EngineBinding, OwnedHandle};
use crate::error::BridgeError;

/// 宿主图像与原生引擎之间的唯一编排点。
#[derive(Debug, Clone, Copy)]
pub struct PixelBridge<'e> {
    binding: &'e EngineBinding,
}

impl PixelBridge<'static> {
    /// 使用进程级引擎绑定；引擎不可用时 panic。
    pub fn global() -> Self {
        Self::new(EngineBinding::global())
    }
}

impl<'e> PixelBridge<'e> {
    pub fn new(binding: &'e EngineBinding) -> Self {
        Self { binding }
    }

    // ========================================================================
    // 对上接口
    // ========================================================================

    /// 通过引擎解码文件。句柄在转换完成后立即释放。
    pub fn load(&self, path: impl AsRef<Path>) -> Option<DynamicImage> {
        let path = path.as_ref();
        match self.try_load(path) {
            Ok(image) => {
                log::debug!(
                    "📂 已加载 {} ({}x{})",
                    path.display(),
                    image.width(),
                    image.height()
                );
                Some(image)
            }
            Err(err) => {
                log::warn!("⚠️ 加载失败 {}: {err}", path.display());
                None
            }
        }
    }

    /// 通过引擎编码保存。句柄无论成败都会释放。
    pub fn save(&self, image: &DynamicImage, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        match self.try_save(image, path) {
            Ok(()) => {
                log::debug!("💾 已保存 {}", path.display());
                true
            }
            Err(err) => {
                Self::log_failure("保存", &err);
                false
            }
        }
    }

    /// 规范事务：转换 → 创建句柄 → 变换 → 回读 → 释放。
    pub fn run_transform(&self, image: &DynamicImage, transform: Transform) -> Option<DynamicImage> {
        let started = Instant::now();
        match self.transaction(image, transform) {
            Ok(result) => {
                log::debug!(
                    "✅ {transform} 完成：{}x{} → {}x{}，耗时 {}ms",
                    image.width(),
                    image.height(),
                    result.width(),
                    result.height(),
                    started.elapsed().as_millis()
                );
                Some(result)
            }
            Err(err) => {
                Self::log_failure(&transform.to_string(), &err);
                None
            }
        }
    }

    pub fn rotate_right(&self, image: &DynamicImage) -> Option<DynamicImage> {
        self.run_transform(image, Transform::RotateRight)
    }

    pub fn rotate_left(&self, image: &DynamicImage) -> Option<DynamicImage> {
        self.run_transform(image, Transform::RotateLeft)
    }

    pub fn rotate_180(&self, image: &DynamicImage) -> Option<DynamicImage> {
        self.run_transform(image, Transform::Rotate180)
    }

    pub fn flip_horizontal(&self, image: &DynamicImage) -> Option<DynamicImage> {
        self.run_transform(image, Transform::FlipHorizontal)
    }

    pub fn flip_vertical(&self, image: &DynamicImage) -> Option<DynamicImage> {
        self.run_transform(image, Transform::FlipVertical)
    }

    /// 保持宽高比缩放到 `width x height` 框内。
    pub fn resize_with_filter(
        &self,
        image: &DynamicImage,
        width: u32,
        height: u32,
        filter: ResampleFilter,
    ) -> Option<DynamicImage> {
        self.run_transform(
            image,
            Transform::Resize {
                width,
                height,
                filter,
            },
        )
    }

    /// 亮度增量，范围 [-100, 100]。
    pub fn adjust_brightness(&self, image: &DynamicImage, delta: i32) -> Option<DynamicImage> {
        self.run_transform(image, Transform::Brightness(delta))
    }

    pub fn adjust_contrast(&self, image: &DynamicImage, factor: f32) -> Option<DynamicImage> {
        self.run_transform(image, Transform::Contrast(factor))
    }

    pub fn blur(&self, image: &DynamicImage, sigma: f32) -> Option<DynamicImage> {
        self.run_transform(image, Transform::Blur(sigma))
    }

    pub fn grayscale(&self, image: &DynamicImage) -> Option<DynamicImage> {
        self.run_transform(image, Transform::Grayscale)
    }

    pub fn invert(&self, image: &DynamicImage) -> Option<DynamicImage> {
        self.run_transform(image, Transform::Invert)
    }

    // ========================================================================
    // 带类型错误的内部实现
    // ========================================================================

    /// 与 `run_transform` 相同，但保留具体失败原因；结果码只在 crate 内可见。
    pub(crate) fn transaction(
        &self,
        image: &DynamicImage,
        transform: Transform,
    ) -> Result<DynamicImage, BridgeError> {
        transform.validate()?;
        let buffer = host_image_to_buffer(image)?;
        let handle = self.acquire(&buffer)?;

        let code = transform.invoke(self.binding, &handle);
        if !code.is_success() {
            return Err(BridgeError::Engine(code));
        }

        let result = self.read_back(&handle)?;
        self.binding.free(handle);
        buffer_to_host_image(result)
    }

    pub(crate) fn try_load(&self, path: &Path) -> Result<DynamicImage, BridgeError> {
        if path.as_os_str().is_empty() {
            return Err(BridgeError::invalid_argument("路径为空"));
        }
        let handle = self.binding.load(path);
        if !handle.is_valid() {
            return Err(BridgeError::NullHandle);
        }

        let buffer = self.read_back(&handle)?;
        self.binding.free(handle);
        buffer_to_host_image(buffer)
    }

    pub(crate) fn try_save(&self, image: &DynamicImage, path: &Path) -> Result<(), BridgeError> {
        if path.as_os_str().is_empty() {
            return Err(BridgeError::invalid_argument("路径为空"));
        }
        let buffer = host_image_to_buffer(image)?;
        let handle = self.acquire(&buffer)?;

        let code = self.binding.save(&handle, path);
        self.binding.free(handle);
        if code.is_success() {
            Ok(())
        } else {
            Err(BridgeError::Engine(code))
        }
    }

    fn acquire(&self, buffer: &PixelBuffer) -> Result<OwnedHandle<'e>, BridgeError> {
        let (width, height) = buffer.ffi_dimensions()?;
        let handle = self.binding.from_raw_pixels(buffer.data(), width, height);
        if handle.is_valid() {
            Ok(handle)
        } else {
            Err(BridgeError::NullHandle)
        }
    }

    /// 从引擎拷出当前像素。拷贝在句柄仍被借用期间完成，引擎指针不会逃逸。
    fn read_back(&self, handle: &OwnedHandle<'e>) -> Result<PixelBuffer, BridgeError> {
        let width = self.binding.width(handle);
        let height = self.binding.height(handle);
        let len = self.binding.data_length(handle);
        let data = self.binding.data_pointer(handle);

        if data.is_null() {
            return Err(BridgeError::readback("引擎返回空数据指针"));
        }
        if len <= 0 {
            return Err(BridgeError::readback(format!("引擎返回的数据长度非正：{len}")));
        }
        if width <= 0 || height <= 0 {
            return Err(BridgeError::readback(format!("引擎返回的尺寸非正：{width}x{height}")));
        }

        let (width, height) = (width as u32, height as u32);
        let expected = PixelBuffer::expected_len(width, height)
            .ok_or_else(|| BridgeError::readback(format!("尺寸溢出：{width}x{height}")))?;
        let len = usize::try_from(len)
            .map_err(|_| BridgeError::readback(format!("数据长度超出地址空间：{len}")))?;
        if len != expected {
            return Err(BridgeError::BufferSize {
                expected,
                actual: len,
            });
        }

        // SAFETY: 引擎保证 data 指向 len 字节、在下一次变换或释放前有效；
        // handle 在此期间被借用，两者都不会发生。
        let bytes = unsafe { slice::from_raw_parts(data, len) }.to_vec();
        PixelBuffer::new(width, height, bytes)
    }

    fn log_failure(stage: &str, err: &BridgeError) {
        if err.is_contract_violation() {
            log::debug!("🚫 {stage} 被拒绝：{err}");
        } else {
            log::warn!("⚠️ {stage} 失败：{err}");
        }
    }
}
