//! # 编辑会话模块（session）
//!
//! ## 设计思路
//!
//! 查看器窗口的状态去掉界面部分后剩下的就是 `EditSession`：
//! 当前图、原图、缩放比例、重采样滤镜、当前文件路径与同目录图片列表。
//!
//! - 变换作用在当前图上，成功后当前图与原图一起替换，缩放回到 100%
//! - 缩放总是从原图重新采样，避免多次缩放的累积失真
//! - 只有手动缩放（放大 / 缩小 / 指定比例）受上下限约束，适应窗口按实际比例计算
//! - 所有像素操作经由 `PixelBridge`，会话本身不接触句柄
//!
//! ## 实现思路
//!
//! 失败时会话状态保持不变，错误以 `SessionError` 返回给调用方展示。

mod folder;

use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::bridge::{PixelBridge, ResampleFilter, Transform};
use crate::config::BridgeConfig;

pub use folder::{FolderImages, IMAGE_EXTENSIONS, is_image_file};

/// 会话层错误
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("没有已加载的图片")]
    NoImage,

    #[error("无法加载图片：{}", .0.display())]
    LoadFailed(PathBuf),

    #[error("无法保存图片：{}", .0.display())]
    SaveFailed(PathBuf),

    #[error("当前图片没有关联的文件路径")]
    NoPath,

    #[error("变换失败：{0}")]
    TransformFailed(Transform),

    #[error("缩放后的图片小于 1 像素（{0:.0}%）")]
    TooSmall(f32),

    #[error("已经是第一张图片")]
    NoPrevious,

    #[error("已经是最后一张图片")]
    NoNext,
}

/// 无界面的图片编辑会话。
#[derive(Debug)]
pub struct EditSession<'e> {
    bridge: PixelBridge<'e>,
    config: BridgeConfig,
    current: Option<DynamicImage>,
    original: Option<DynamicImage>,
    path: Option<PathBuf>,
    zoom: f32,
    filter: ResampleFilter,
    folder: FolderImages,
}

impl<'e> EditSession<'e> {
    pub fn new(bridge: PixelBridge<'e>, config: BridgeConfig) -> Self {
        let filter = config.default_filter;
        Self {
            bridge,
            config,
            current: None,
            original: None,
            path: None,
            zoom: 1.0,
            filter,
            folder: FolderImages::default(),
        }
    }

    // ------------------------------------------------------------------
    // 状态查询
    // ------------------------------------------------------------------

    pub fn current(&self) -> Option<&DynamicImage> {
        self.current.as_ref()
    }

    pub fn original(&self) -> Option<&DynamicImage> {
        self.original.as_ref()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn filter(&self) -> ResampleFilter {
        self.filter
    }

    pub fn folder(&self) -> &FolderImages {
        &self.folder
    }

    /// 状态栏文本，例如 `photo.png 800x600 100%`。
    pub fn status(&self) -> String {
        let Some(image) = self.current.as_ref() else {
            return "No image loaded".to_string();
        };
        let name = self
            .path
            .as_deref()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "untitled".to_string());
        format!(
            "{name} {}x{} {:.0}%",
            image.width(),
            image.height(),
            self.zoom * 100.0
        )
    }

    // ------------------------------------------------------------------
    // 文件
    // ------------------------------------------------------------------

    /// 加载图片；成功后缩放复位并刷新同目录列表。
    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<(), SessionError> {
        let path = path.as_ref();
        let image = self
            .bridge
            .load(path)
            .ok_or_else(|| SessionError::LoadFailed(path.to_path_buf()))?;

        log::info!(
            "🖼️ 打开 {} ({}x{})",
            path.display(),
            image.width(),
            image.height()
        );
        self.original = Some(image.clone());
        self.current = Some(image);
        self.zoom = 1.0;
        self.path = Some(path.to_path_buf());
        self.folder = FolderImages::scan(path);
        Ok(())
    }

    /// 保存到当前路径。
    pub fn save(&self) -> Result<(), SessionError> {
        let path = self.path.as_deref().ok_or(SessionError::NoPath)?;
        self.write_current(path)
    }

    /// 另存为；成功后当前路径切换为新路径。
    pub fn save_as(&mut self, path: impl AsRef<Path>) -> Result<(), SessionError> {
        let path = path.as_ref();
        self.write_current(path)?;
        self.path = Some(path.to_path_buf());
        Ok(())
    }

    fn write_current(&self, path: &Path) -> Result<(), SessionError> {
        let image = self.current.as_ref().ok_or(SessionError::NoImage)?;
        if self.bridge.save(image, path) {
            log::info!("💾 已保存 {}", path.display());
            Ok(())
        } else {
            Err(SessionError::SaveFailed(path.to_path_buf()))
        }
    }

    // ------------------------------------------------------------------
    // 编辑
    // ------------------------------------------------------------------

    /// 对当前图执行变换；结果同时成为新的原图。
    pub fn apply(&mut self, transform: Transform) -> Result<(), SessionError> {
        let image = self.current.as_ref().ok_or(SessionError::NoImage)?;
        let result = self
            .bridge
            .run_transform(image, transform)
            .ok_or(SessionError::TransformFailed(transform))?;

        self.original = Some(result.clone());
        self.current = Some(result);
        self.zoom = 1.0;
        Ok(())
    }

    // ------------------------------------------------------------------
    // 缩放
    // ------------------------------------------------------------------

    pub fn zoom_in(&mut self) -> Result<(), SessionError> {
        self.set_zoom(self.zoom + self.config.zoom_step)
    }

    pub fn zoom_out(&mut self) -> Result<(), SessionError> {
        self.set_zoom(self.zoom - self.config.zoom_step)
    }

    pub fn actual_size(&mut self) -> Result<(), SessionError> {
        self.apply_zoom(1.0)
    }

    /// 手动缩放，比例限制在配置的上下限内。
    pub fn set_zoom(&mut self, zoom: f32) -> Result<(), SessionError> {
        if self.original.is_none() {
            return Err(SessionError::NoImage);
        }
        self.apply_zoom(self.config.clamp_zoom(zoom))
    }

    /// 按比例从原图重新采样，不做上下限约束（适应窗口、原始大小）。
    fn apply_zoom(&mut self, zoom: f32) -> Result<(), SessionError> {
        let original = self.original.as_ref().ok_or(SessionError::NoImage)?;

        let width = (original.width() as f64 * zoom as f64) as u32;
        let height = (original.height() as f64 * zoom as f64) as u32;
        if width < 1 || height < 1 {
            return Err(SessionError::TooSmall(zoom * 100.0));
        }

        let resized = if width == original.width() && height == original.height() {
            original.clone()
        } else {
            let transform = Transform::Resize {
                width,
                height,
                filter: self.filter,
            };
            self.bridge
                .run_transform(original, transform)
                .ok_or(SessionError::TransformFailed(transform))?
        };

        log::debug!("🔍 缩放 {:.0}% → {}x{}", zoom * 100.0, resized.width(), resized.height());
        self.current = Some(resized);
        self.zoom = zoom;
        Ok(())
    }

    /// 计算让原图完整放入 `width x height` 区域的比例并应用；该比例不受缩放上下限约束。
    pub fn fit_to(&mut self, width: u32, height: u32) -> Result<(), SessionError> {
        let original = self.original.as_ref().ok_or(SessionError::NoImage)?;
        if width == 0 || height == 0 {
            return Err(SessionError::TooSmall(0.0));
        }
        let zoom_x = width as f32 / original.width() as f32;
        let zoom_y = height as f32 / original.height() as f32;
        self.apply_zoom(zoom_x.min(zoom_y))
    }

    /// 切换滤镜；已有图片时按新滤镜重新应用当前缩放。
    pub fn set_filter(&mut self, filter: ResampleFilter) -> Result<(), SessionError> {
        self.filter = filter;
        if self.original.is_some() {
            self.apply_zoom(self.zoom)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // 同目录切换
    // ------------------------------------------------------------------

    pub fn next_image(&mut self) -> Result<(), SessionError> {
        if self.current.is_none() {
            return Err(SessionError::NoImage);
        }
        let next = self
            .folder
            .peek_next()
            .map(Path::to_path_buf)
            .ok_or(SessionError::NoNext)?;
        self.open(next)
    }

    pub fn previous_image(&mut self) -> Result<(), SessionError> {
        if self.current.is_none() {
            return Err(SessionError::NoImage);
        }
        let previous = self
            .folder
            .peek_previous()
            .map(Path::to_path_buf)
            .ok_or(SessionError::NoPrevious)?;
        self.open(previous)
    }
}
