//! # 引擎调用面（EngineBinding）
//!
//! ## 设计思路
//!
//! 每个原生入口对应一个方法，方法内只做两件事：
//! 1. 跨界前校验（无效句柄、空路径、缓冲长度），不合法直接返回哨兵值
//! 2. 恰好一次跨界调用，并把整数结果映射为 `ResultCode`
//!
//! 进程级实例通过 `OnceCell` 惰性初始化一次，之后只读，直到进程退出。
//!
//! ## 失败语义
//!
//! - 动态库打不开 / 缺少入口：`open` / `init` 返回 `BridgeError`，`global()` 直接 panic。
//!   这属于部署缺陷，不会被转换成 `ResultCode`，也不会重试。
//! - 调用期：入口是 `extern "C"` 函数指针，不存在“分派失败”；
//!   原生侧的崩溃无法在宿主侧恢复，进程随之终止。

use std::ffi::CString;
use std::path::Path;
use std::ptr;

use libloading::Library;
use once_cell::sync::OnceCell;

use super::handle::{NativeHandle, OwnedHandle};
use super::result_code::ResultCode;
use super::symbols::{EntryPoints, RawHandle};
use crate::config::BridgeConfig;
use crate::error::BridgeError;

static ENGINE: OnceCell<EngineBinding> = OnceCell::new();

/// 原生引擎的类型化调用面。
pub struct EngineBinding {
    entry: EntryPoints,
    origin: String,
    // 必须晚于 entry 释放：函数指针依赖库映射仍然存在
    _library: Option<Library>,
}

impl EngineBinding {
    /// 打开动态库并解析全部入口。
    ///
    /// # Safety
    /// `path` 指向的库必须是导出约定 ABI 的 rs_image 引擎；
    /// 加载时会执行库的初始化代码。
    pub unsafe fn open(path: impl AsRef<Path>) -> Result<Self, BridgeError> {
        let path = path.as_ref();
        let library = unsafe { Library::new(path) }.map_err(|source| BridgeError::Library {
            path: path.to_path_buf(),
            source,
        })?;
        let entry = unsafe { EntryPoints::resolve(&library) }?;

        log::info!("🔗 已加载原生图像引擎: {}", path.display());

        Ok(Self {
            entry,
            origin: path.display().to_string(),
            _library: Some(library),
        })
    }

    /// 使用进程内已有的入口函数构造绑定（静态链接引擎或测试桩）。
    ///
    /// # Safety
    /// 表中每个函数都必须遵守 rs_image 的 ABI 约定（空句柄返回哨兵值、
    /// 返回的数据指针在下一次变换或释放前有效）。
    pub unsafe fn from_entry_points(entry: EntryPoints) -> Self {
        Self {
            entry,
            origin: "<in-process>".to_string(),
            _library: None,
        }
    }

    /// 按配置初始化进程级实例；重复调用返回同一实例。
    pub fn init(config: &BridgeConfig) -> Result<&'static Self, BridgeError> {
        ENGINE.get_or_try_init(|| {
            let path = config.resolve_library_path();
            // SAFETY: 配置指向的库即约定的 rs_image 引擎
            unsafe { Self::open(path) }
        })
    }

    /// 安装一个现成的绑定作为进程级实例；已初始化时原样退回。
    pub fn install(binding: Self) -> Result<&'static Self, Self> {
        ENGINE.try_insert(binding).map_err(|(_, rejected)| rejected)
    }

    /// 进程级实例；尚未初始化时按默认配置加载，失败即 panic。
    pub fn global() -> &'static Self {
        match Self::init(&BridgeConfig::default()) {
            Ok(binding) => binding,
            Err(err) => {
                log::error!("❌ 原生图像引擎不可用: {err}");
                panic!("原生图像引擎不可用: {err}");
            }
        }
    }

    /// 绑定来源（库路径或 `<in-process>`），用于日志与诊断。
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// 无效句柄；释放时不跨界。
    pub fn invalid_handle(&self) -> OwnedHandle<'_> {
        OwnedHandle::new(self, NativeHandle::INVALID)
    }

    fn adopt(&self, raw: RawHandle) -> OwnedHandle<'_> {
        OwnedHandle::new(self, NativeHandle::from_raw(raw))
    }

    fn cross<T>(&self, entry: &'static str, call: impl FnOnce(&EntryPoints) -> T) -> T {
        log::trace!("↔ {entry}");
        call(&self.entry)
    }

    // ========================================================================
    // 构造 / 保存 / 释放
    // ========================================================================

    /// 从文件解码。空路径直接返回无效句柄；解码失败时引擎同样返回无效句柄。
    pub fn load(&self, path: impl AsRef<Path>) -> OwnedHandle<'_> {
        let path = path.as_ref();
        let Some(c_path) = to_c_path(path) else {
            log::debug!("🚫 拒绝加载：路径为空或无法转换为 C 字符串 ({})", path.display());
            return self.invalid_handle();
        };

        let raw = self.cross("image_load", |e| unsafe { (e.image_load)(c_path.as_ptr()) });
        self.adopt(raw)
    }

    /// 从 RGBA8 原始像素构造。尺寸或长度不符属于调用方契约违规，不跨界。
    pub fn from_raw_pixels(&self, bytes: &[u8], width: i32, height: i32) -> OwnedHandle<'_> {
        if width <= 0 || height <= 0 {
            log::debug!("🚫 拒绝构造：尺寸非正 {width}x{height}");
            return self.invalid_handle();
        }
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(4));
        if expected != Some(bytes.len()) {
            log::debug!(
                "🚫 拒绝构造：缓冲长度 {} 与 {width}x{height}x4 不符",
                bytes.len()
            );
            return self.invalid_handle();
        }

        let raw = self.cross("image_from_rgba", |e| unsafe {
            (e.image_from_rgba)(bytes.as_ptr(), width, height)
        });
        self.adopt(raw)
    }

    /// 编码保存到 `path`。
    pub fn save(&self, handle: &OwnedHandle<'_>, path: impl AsRef<Path>) -> ResultCode {
        if !handle.is_valid() {
            return ResultCode::ErrorInvalidHandle;
        }
        let Some(c_path) = to_c_path(path.as_ref()) else {
            return ResultCode::ErrorInvalidPath;
        };

        let raw = handle.handle().as_raw();
        let code = self.cross("image_save", |e| unsafe { (e.image_save)(raw, c_path.as_ptr()) });
        ResultCode::from_code(code)
    }

    /// 显式释放；等价于丢弃 `OwnedHandle`。
    pub fn free(&self, handle: OwnedHandle<'_>) {
        drop(handle);
    }

    /// 仅由 `OwnedHandle::drop` 调用，保证每个句柄恰好进入一次。
    pub(super) fn release(&self, handle: NativeHandle) {
        if !handle.is_valid() {
            return;
        }
        self.cross("image_free", |e| unsafe { (e.image_free)(handle.as_raw()) });
    }

    // ========================================================================
    // 原地变换
    // ========================================================================

    fn transform(
        &self,
        entry: &'static str,
        handle: &OwnedHandle<'_>,
        call: impl FnOnce(&EntryPoints, RawHandle) -> i32,
    ) -> ResultCode {
        if !handle.is_valid() {
            return ResultCode::ErrorInvalidHandle;
        }
        let raw = handle.handle().as_raw();
        ResultCode::from_code(self.cross(entry, |e| call(e, raw)))
    }

    /// 顺时针旋转 90°。
    pub fn rotate_90(&self, handle: &OwnedHandle<'_>) -> ResultCode {
        self.transform("image_rotate_90", handle, |e, raw| unsafe {
            (e.image_rotate_90)(raw)
        })
    }

    pub fn rotate_180(&self, handle: &OwnedHandle<'_>) -> ResultCode {
        self.transform("image_rotate_180", handle, |e, raw| unsafe {
            (e.image_rotate_180)(raw)
        })
    }

    /// 顺时针旋转 270°（逆时针 90°）。
    pub fn rotate_270(&self, handle: &OwnedHandle<'_>) -> ResultCode {
        self.transform("image_rotate_270", handle, |e, raw| unsafe {
            (e.image_rotate_270)(raw)
        })
    }

    pub fn flip_horizontal(&self, handle: &OwnedHandle<'_>) -> ResultCode {
        self.transform("image_flip_horizontal", handle, |e, raw| unsafe {
            (e.image_flip_horizontal)(raw)
        })
    }

    pub fn flip_vertical(&self, handle: &OwnedHandle<'_>) -> ResultCode {
        self.transform("image_flip_vertical", handle, |e, raw| unsafe {
            (e.image_flip_vertical)(raw)
        })
    }

    /// 保持宽高比缩放到 `width x height` 框内，`filter` 为引擎滤镜码。
    pub fn resize_with_filter(
        &self,
        handle: &OwnedHandle<'_>,
        width: i32,
        height: i32,
        filter: i32,
    ) -> ResultCode {
        self.transform("image_resize_with_filter", handle, |e, raw| unsafe {
            (e.image_resize_with_filter)(raw, width, height, filter)
        })
    }

    pub fn adjust_brightness(&self, handle: &OwnedHandle<'_>, delta: i32) -> ResultCode {
        self.transform("image_adjust_brightness", handle, |e, raw| unsafe {
            (e.image_adjust_brightness)(raw, delta)
        })
    }

    pub fn adjust_contrast(&self, handle: &OwnedHandle<'_>, factor: f32) -> ResultCode {
        self.transform("image_adjust_contrast", handle, |e, raw| unsafe {
            (e.image_adjust_contrast)(raw, factor)
        })
    }

    pub fn blur(&self, handle: &OwnedHandle<'_>, sigma: f32) -> ResultCode {
        self.transform("image_blur", handle, |e, raw| unsafe { (e.image_blur)(raw, sigma) })
    }

    pub fn grayscale(&self, handle: &OwnedHandle<'_>) -> ResultCode {
        self.transform("image_grayscale", handle, |e, raw| unsafe {
            (e.image_grayscale)(raw)
        })
    }

    pub fn invert(&self, handle: &OwnedHandle<'_>) -> ResultCode {
        self.transform("image_invert", handle, |e, raw| unsafe { (e.image_invert)(raw) })
    }

    // ========================================================================
    // 只读访问（无效句柄返回零 / 空哨兵，不跨界）
    // ========================================================================

    pub fn width(&self, handle: &OwnedHandle<'_>) -> i32 {
        if !handle.is_valid() {
            return 0;
        }
        let raw = handle.handle().as_raw();
        self.cross("image_get_width", |e| unsafe { (e.image_get_width)(raw) })
    }

    pub fn height(&self, handle: &OwnedHandle<'_>) -> i32 {
        if !handle.is_valid() {
            return 0;
        }
        let raw = handle.handle().as_raw();
        self.cross("image_get_height", |e| unsafe { (e.image_get_height)(raw) })
    }

    /// 引擎持有的像素首地址；在句柄释放或下一次变换前有效。
    pub fn data_pointer(&self, handle: &OwnedHandle<'_>) -> *const u8 {
        if !handle.is_valid() {
            return ptr::null();
        }
        let raw = handle.handle().as_raw();
        self.cross("image_get_data", |e| unsafe { (e.image_get_data)(raw) })
    }

    pub fn data_length(&self, handle: &OwnedHandle<'_>) -> i64 {
        if !handle.is_valid() {
            return 0;
        }
        let raw = handle.handle().as_raw();
        self.cross("image_get_data_len", |e| unsafe { (e.image_get_data_len)(raw) })
    }
}

impl std::fmt::Debug for EngineBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineBinding")
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

/// 路径 → C 字符串；空路径、非 UTF-8、内含 NUL 均返回 `None`。
fn to_c_path(path: &Path) -> Option<CString> {
    let path = path.to_str()?;
    if path.is_empty() {
        return None;
    }
    CString::new(path).ok()
}
