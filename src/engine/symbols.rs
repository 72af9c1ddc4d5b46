//! 入口函数表
//!
//! # 设计思路
//!
//! 每个原生入口在解析时就固定参数 / 返回的原始类型，之后只读、不再重新解析。
//! 函数表本身是普通的 `extern "C"` 函数指针集合，既可以从动态库解析，
//! 也可以由进程内函数直接组装（静态链接引擎、测试桩）。

use std::ffi::{c_char, c_void};

use libloading::Library;

use crate::error::BridgeError;

/// 引擎句柄在 ABI 上的表示：地址宽度的不透明指针。
pub type RawHandle = *mut c_void;

/// 原地变换类入口的统一签名。
pub type TransformFn = unsafe extern "C" fn(RawHandle) -> i32;

/// 固定签名的原生入口表。
#[derive(Clone, Copy)]
pub struct EntryPoints {
    pub image_load: unsafe extern "C" fn(*const c_char) -> RawHandle,
    pub image_from_rgba: unsafe extern "C" fn(*const u8, i32, i32) -> RawHandle,
    pub image_save: unsafe extern "C" fn(RawHandle, *const c_char) -> i32,
    pub image_free: unsafe extern "C" fn(RawHandle),
    pub image_rotate_90: TransformFn,
    pub image_rotate_180: TransformFn,
    pub image_rotate_270: TransformFn,
    pub image_flip_horizontal: TransformFn,
    pub image_flip_vertical: TransformFn,
    pub image_resize_with_filter: unsafe extern "C" fn(RawHandle, i32, i32, i32) -> i32,
    pub image_adjust_brightness: unsafe extern "C" fn(RawHandle, i32) -> i32,
    pub image_adjust_contrast: unsafe extern "C" fn(RawHandle, f32) -> i32,
    pub image_blur: unsafe extern "C" fn(RawHandle, f32) -> i32,
    pub image_grayscale: TransformFn,
    pub image_invert: TransformFn,
    pub image_get_width: unsafe extern "C" fn(RawHandle) -> i32,
    pub image_get_height: unsafe extern "C" fn(RawHandle) -> i32,
    pub image_get_data: unsafe extern "C" fn(RawHandle) -> *const u8,
    pub image_get_data_len: unsafe extern "C" fn(RawHandle) -> i64,
}

/// 解析单个符号并复制出函数指针。
///
/// # Safety
/// `T` 必须与库中该符号的真实签名一致。
unsafe fn symbol<T: Copy>(library: &Library, name: &'static str) -> Result<T, BridgeError> {
    let resolved = unsafe { library.get::<T>(name.as_bytes()) };
    resolved
        .map(|sym| *sym)
        .map_err(|source| BridgeError::Symbol { name, source })
}

impl EntryPoints {
    /// 从已打开的动态库解析全部入口；任一缺失即失败。
    ///
    /// 返回的函数指针只在 `library` 存活期间有效，调用方需要一并持有库。
    ///
    /// # Safety
    /// `library` 必须是按本模块约定的签名导出入口的 rs_image 引擎。
    pub(crate) unsafe fn resolve(library: &Library) -> Result<Self, BridgeError> {
        unsafe {
            Ok(Self {
                image_load: symbol(library, "image_load")?,
                image_from_rgba: symbol(library, "image_from_rgba")?,
                image_save: symbol(library, "image_save")?,
                image_free: symbol(library, "image_free")?,
                image_rotate_90: symbol(library, "image_rotate_90")?,
                image_rotate_180: symbol(library, "image_rotate_180")?,
                image_rotate_270: symbol(library, "image_rotate_270")?,
                image_flip_horizontal: symbol(library, "image_flip_horizontal")?,
                image_flip_vertical: symbol(library, "image_flip_vertical")?,
                image_resize_with_filter: symbol(library, "image_resize_with_filter")?,
                image_adjust_brightness: symbol(library, "image_adjust_brightness")?,
                image_adjust_contrast: symbol(library, "image_adjust_contrast")?,
                image_blur: symbol(library, "image_blur")?,
                image_grayscale: symbol(library, "image_grayscale")?,
                image_invert: symbol(library, "image_invert")?,
                image_get_width: symbol(library, "image_get_width")?,
                image_get_height: symbol(library, "image_get_height")?,
                image_get_data: symbol(library, "image_get_data")?,
                image_get_data_len: symbol(library, "image_get_data_len")?,
            })
        }
    }
}
