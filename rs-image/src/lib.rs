//! # rs_image 原生图像引擎
//!
//! ## 设计思路
//!
//! 引擎以 `cdylib` 形式独立编译，对外只暴露一组固定签名的 C ABI 入口。
//! 宿主侧（`pixel-bridge`）永远不解引用句柄，只把它原样传回。
//!
//! - 句柄：`Box<EngineImage>` 转成的裸指针，空指针即无效句柄
//! - 像素：始终以 RGBA8、行优先、无填充的方式保存
//! - 结果码：固定的 `i32` 值（见 [`ImageResult`]），宿主侧按值映射
//!
//! ## 实现思路
//!
//! 所有像素算法（解码、编码、旋转、重采样、卷积）都委托给 `image` crate。
//! 变换类入口统一走 `transform_in_place`：取出像素 → 变换 → 写回同一句柄。
//! 每个入口在解引用前都先做空指针检查，保证“无效句柄”不会触发未定义行为。

use std::ffi::{CStr, c_char, c_void};
use std::ptr;

use image::imageops::FilterType;
use image::{DynamicImage, ImageError, ImageFormat, ImageReader, RgbaImage};

/// 引擎操作结果码，取值与宿主侧约定一致，不可改动。
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageResult {
    Success = 0,
    ErrorInvalidPath = 1,
    ErrorInvalidHandle = 2,
    ErrorLoadFailed = 3,
    ErrorSaveFailed = 4,
    ErrorAllocation = 5,
    ErrorUnsupportedFormat = 6,
}

impl ImageResult {
    fn code(self) -> i32 {
        self as i32
    }
}

// ============================================================================
// 句柄背后的引擎状态
// ============================================================================

/// 句柄指向的真实对象。
///
/// 不变量：`pixels.len() == width * height * 4`。
struct EngineImage {
    width: u32,
    height: u32,
    pixels: Box<[u8]>,
}

impl EngineImage {
    fn from_dynamic(image: DynamicImage) -> Self {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self {
            width,
            height,
            pixels: rgba.into_raw().into_boxed_slice(),
        }
    }

    fn into_handle(self) -> *mut c_void {
        Box::into_raw(Box::new(self)).cast()
    }

    /// 复制一份当前像素（保存时使用，不改变句柄状态）。
    fn snapshot(&self) -> Option<DynamicImage> {
        RgbaImage::from_raw(self.width, self.height, self.pixels.to_vec())
            .map(DynamicImage::ImageRgba8)
    }

    /// 取走像素做原地变换，避免多一次整图复制。
    fn take_dynamic(&mut self) -> Option<DynamicImage> {
        let pixels = std::mem::take(&mut self.pixels).into_vec();
        let (width, height) = (self.width, self.height);
        self.width = 0;
        self.height = 0;
        RgbaImage::from_raw(width, height, pixels).map(DynamicImage::ImageRgba8)
    }

    fn replace_with(&mut self, image: DynamicImage) {
        *self = Self::from_dynamic(image);
    }
}

unsafe fn image_ref<'a>(handle: *const c_void) -> Option<&'a EngineImage> {
    unsafe { handle.cast::<EngineImage>().as_ref() }
}

unsafe fn image_mut<'a>(handle: *mut c_void) -> Option<&'a mut EngineImage> {
    unsafe { handle.cast::<EngineImage>().as_mut() }
}

/// 读取以 NUL 结尾的 UTF-8 路径；空指针、空串、非法 UTF-8 均视为无效。
unsafe fn c_path<'a>(path: *const c_char) -> Option<&'a str> {
    if path.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(path) }
        .to_str()
        .ok()
        .filter(|s| !s.is_empty())
}

unsafe fn transform_in_place<F>(handle: *mut c_void, transform: F) -> i32
where
    F: FnOnce(DynamicImage) -> DynamicImage,
{
    let Some(state) = (unsafe { image_mut(handle) }) else {
        return ImageResult::ErrorInvalidHandle.code();
    };
    let Some(image) = state.take_dynamic() else {
        return ImageResult::ErrorInvalidHandle.code();
    };

    state.replace_with(transform(image));
    ImageResult::Success.code()
}

fn filter_from_code(code: i32) -> FilterType {
    match code {
        1 => FilterType::Triangle,
        2 => FilterType::CatmullRom,
        3 => FilterType::Gaussian,
        4 => FilterType::Lanczos3,
        _ => FilterType::Nearest,
    }
}

// ============================================================================
// 构造 / 销毁
// ============================================================================

/// 从文件解码图像；失败返回空句柄。
///
/// # Safety
/// `path` 必须为空指针或指向以 NUL 结尾的字符串。
#[unsafe(no_mangle)]
pub unsafe extern "C" fn image_load(path: *const c_char) -> *mut c_void {
    let Some(path) = (unsafe { c_path(path) }) else {
        return ptr::null_mut();
    };

    let decoded = ImageReader::open(path)
        .map_err(ImageError::IoError)
        .and_then(|reader| reader.with_guessed_format().map_err(ImageError::IoError))
        .and_then(|reader| reader.decode());

    match decoded {
        Ok(image) => EngineImage::from_dynamic(image).into_handle(),
        Err(_) => ptr::null_mut(),
    }
}

/// 从 RGBA8 原始像素构造图像；参数非法返回空句柄。
///
/// # Safety
/// `data` 必须为空指针或指向至少 `width * height * 4` 个可读字节。
#[unsafe(no_mangle)]
pub unsafe extern "C" fn image_from_rgba(data: *const u8, width: i32, height: i32) -> *mut c_void {
    if data.is_null() || width <= 0 || height <= 0 {
        return ptr::null_mut();
    }
    let (width, height) = (width as u32, height as u32);
    let Some(len) = (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(4))
    else {
        return ptr::null_mut();
    };

    let pixels = unsafe { std::slice::from_raw_parts(data, len) }.to_vec();
    EngineImage {
        width,
        height,
        pixels: pixels.into_boxed_slice(),
    }
    .into_handle()
}

/// 释放句柄；空句柄为空操作。
///
/// # Safety
/// `handle` 必须为空指针或尚未释放的、由本引擎创建的句柄。
#[unsafe(no_mangle)]
pub unsafe extern "C" fn image_free(handle: *mut c_void) {
    if handle.is_null() {
        return;
    }
    drop(unsafe { Box::from_raw(handle.cast::<EngineImage>()) });
}

/// 按扩展名推断格式并编码到 `path`。
///
/// # Safety
/// 同 [`image_free`] 与 [`image_load`] 的指针约定。
#[unsafe(no_mangle)]
pub unsafe extern "C" fn image_save(handle: *mut c_void, path: *const c_char) -> i32 {
    let Some(state) = (unsafe { image_ref(handle) }) else {
        return ImageResult::ErrorInvalidHandle.code();
    };
    let Some(path) = (unsafe { c_path(path) }) else {
        return ImageResult::ErrorInvalidPath.code();
    };
    let Ok(format) = ImageFormat::from_path(path) else {
        return ImageResult::ErrorUnsupportedFormat.code();
    };
    let Some(image) = state.snapshot() else {
        return ImageResult::ErrorInvalidHandle.code();
    };

    // JPEG 等格式不支持 alpha，先降为 RGB
    let image = if format == ImageFormat::Jpeg {
        DynamicImage::ImageRgb8(image.to_rgb8())
    } else {
        image
    };

    match image.save_with_format(path, format) {
        Ok(()) => ImageResult::Success.code(),
        Err(ImageError::Unsupported(_)) => ImageResult::ErrorUnsupportedFormat.code(),
        Err(_) => ImageResult::ErrorSaveFailed.code(),
    }
}

// ============================================================================
// 原地变换
// ============================================================================

/// 顺时针旋转 90°。
///
/// # Safety
/// `handle` 必须为空指针或有效句柄。
#[unsafe(no_mangle)]
pub unsafe extern "C" fn image_rotate_90(handle: *mut c_void) -> i32 {
    unsafe { transform_in_place(handle, |img| img.rotate90()) }
}

/// 旋转 180°。
///
/// # Safety
/// `handle` 必须为空指针或有效句柄。
#[unsafe(no_mangle)]
pub unsafe extern "C" fn image_rotate_180(handle: *mut c_void) -> i32 {
    unsafe { transform_in_place(handle, |img| img.rotate180()) }
}

/// 顺时针旋转 270°（即逆时针 90°）。
///
/// # Safety
/// `handle` 必须为空指针或有效句柄。
#[unsafe(no_mangle)]
pub unsafe extern "C" fn image_rotate_270(handle: *mut c_void) -> i32 {
    unsafe { transform_in_place(handle, |img| img.rotate270()) }
}

/// # Safety
/// `handle` 必须为空指针或有效句柄。
#[unsafe(no_mangle)]
pub unsafe extern "C" fn image_flip_horizontal(handle: *mut c_void) -> i32 {
    unsafe { transform_in_place(handle, |img| img.fliph()) }
}

/// # Safety
/// `handle` 必须为空指针或有效句柄。
#[unsafe(no_mangle)]
pub unsafe extern "C" fn image_flip_vertical(handle: *mut c_void) -> i32 {
    unsafe { transform_in_place(handle, |img| img.flipv()) }
}

/// 保持宽高比缩放到 `width x height` 框内；未知滤镜码回退为 Nearest。
///
/// 结果码中没有“参数非法”，非正尺寸沿用 `ERROR_UNSUPPORTED_FORMAT`。
///
/// # Safety
/// `handle` 必须为空指针或有效句柄。
#[unsafe(no_mangle)]
pub unsafe extern "C" fn image_resize_with_filter(
    handle: *mut c_void,
    width: i32,
    height: i32,
    filter: i32,
) -> i32 {
    if handle.is_null() {
        return ImageResult::ErrorInvalidHandle.code();
    }
    if width <= 0 || height <= 0 {
        return ImageResult::ErrorUnsupportedFormat.code();
    }
    let filter = filter_from_code(filter);
    unsafe {
        transform_in_place(handle, |img| {
            img.resize(width as u32, height as u32, filter)
        })
    }
}

/// 亮度调整，`value` 约定在 [-100, 100]。
///
/// # Safety
/// `handle` 必须为空指针或有效句柄。
#[unsafe(no_mangle)]
pub unsafe extern "C" fn image_adjust_brightness(handle: *mut c_void, value: i32) -> i32 {
    unsafe { transform_in_place(handle, |img| img.brighten(value)) }
}

/// 对比度调整。结果码中没有“参数非法”，非有限系数沿用 `ERROR_UNSUPPORTED_FORMAT`。
///
/// # Safety
/// `handle` 必须为空指针或有效句柄。
#[unsafe(no_mangle)]
pub unsafe extern "C" fn image_adjust_contrast(handle: *mut c_void, contrast: f32) -> i32 {
    if handle.is_null() {
        return ImageResult::ErrorInvalidHandle.code();
    }
    if !contrast.is_finite() {
        return ImageResult::ErrorUnsupportedFormat.code();
    }
    unsafe { transform_in_place(handle, |img| img.adjust_contrast(contrast)) }
}

/// 高斯模糊，`sigma` 必须为正的有限值，否则同样返回 `ERROR_UNSUPPORTED_FORMAT`。
///
/// # Safety
/// `handle` 必须为空指针或有效句柄。
#[unsafe(no_mangle)]
pub unsafe extern "C" fn image_blur(handle: *mut c_void, sigma: f32) -> i32 {
    if handle.is_null() {
        return ImageResult::ErrorInvalidHandle.code();
    }
    if !(sigma.is_finite() && sigma > 0.0) {
        return ImageResult::ErrorUnsupportedFormat.code();
    }
    unsafe { transform_in_place(handle, |img| img.blur(sigma)) }
}

/// 灰度化；结果像素不透明。
///
/// # Safety
/// `handle` 必须为空指针或有效句柄。
#[unsafe(no_mangle)]
pub unsafe extern "C" fn image_grayscale(handle: *mut c_void) -> i32 {
    unsafe { transform_in_place(handle, |img| DynamicImage::ImageLuma8(img.to_luma8())) }
}

/// # Safety
/// `handle` 必须为空指针或有效句柄。
#[unsafe(no_mangle)]
pub unsafe extern "C" fn image_invert(handle: *mut c_void) -> i32 {
    unsafe {
        transform_in_place(handle, |mut img| {
            img.invert();
            img
        })
    }
}

// ============================================================================
// 只读访问
// ============================================================================

/// # Safety
/// `handle` 必须为空指针或有效句柄。
#[unsafe(no_mangle)]
pub unsafe extern "C" fn image_get_width(handle: *mut c_void) -> i32 {
    unsafe { image_ref(handle) }.map_or(0, |state| state.width as i32)
}

/// # Safety
/// `handle` 必须为空指针或有效句柄。
#[unsafe(no_mangle)]
pub unsafe extern "C" fn image_get_height(handle: *mut c_void) -> i32 {
    unsafe { image_ref(handle) }.map_or(0, |state| state.height as i32)
}

/// 像素首地址；在下一次变换或释放前有效。
///
/// # Safety
/// `handle` 必须为空指针或有效句柄。
#[unsafe(no_mangle)]
pub unsafe extern "C" fn image_get_data(handle: *mut c_void) -> *const u8 {
    match unsafe { image_ref(handle) } {
        Some(state) if !state.pixels.is_empty() => state.pixels.as_ptr(),
        _ => ptr::null(),
    }
}

/// # Safety
/// `handle` 必须为空指针或有效句柄。
#[unsafe(no_mangle)]
pub unsafe extern "C" fn image_get_data_len(handle: *mut c_void) -> i64 {
    unsafe { image_ref(handle) }.map_or(0, |state| state.pixels.len() as i64)
}
