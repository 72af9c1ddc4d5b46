//! 集成测试共用工具：进程内链接的引擎、计数桩引擎、测试图片与临时目录。
#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::ffi::{c_char, c_void};
use std::path::PathBuf;
use std::ptr;
use std::time::{SystemTime, UNIX_EPOCH};

use image::{DynamicImage, Rgba, RgbaImage};
use once_cell::sync::Lazy;
use pixel_bridge::{EngineBinding, EntryPoints};

pub fn linked_entry_points() -> EntryPoints {
    EntryPoints {
        image_load: rs_image::image_load,
        image_from_rgba: rs_image::image_from_rgba,
        image_save: rs_image::image_save,
        image_free: rs_image::image_free,
        image_rotate_90: rs_image::image_rotate_90,
        image_rotate_180: rs_image::image_rotate_180,
        image_rotate_270: rs_image::image_rotate_270,
        image_flip_horizontal: rs_image::image_flip_horizontal,
        image_flip_vertical: rs_image::image_flip_vertical,
        image_resize_with_filter: rs_image::image_resize_with_filter,
        image_adjust_brightness: rs_image::image_adjust_brightness,
        image_adjust_contrast: rs_image::image_adjust_contrast,
        image_blur: rs_image::image_blur,
        image_grayscale: rs_image::image_grayscale,
        image_invert: rs_image::image_invert,
        image_get_width: rs_image::image_get_width,
        image_get_height: rs_image::image_get_height,
        image_get_data: rs_image::image_get_data,
        image_get_data_len: rs_image::image_get_data_len,
    }
}

/// 直接链接 rs_image 的引擎绑定。
pub static LINKED: Lazy<EngineBinding> =
    Lazy::new(|| unsafe { EngineBinding::from_entry_points(linked_entry_points()) });

// ============================================================================
// 计数桩：转发给 rs_image，同时记录每次跨界调用
// ============================================================================

thread_local! {
    static CALLS: RefCell<Vec<&'static str>> = const { RefCell::new(Vec::new()) };
    static CREATED: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
    static FREED: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
    static NEXT_RESULT: Cell<Option<i32>> = const { Cell::new(None) };
    static NULL_DATA: Cell<bool> = const { Cell::new(false) };
}

fn record(name: &'static str) {
    CALLS.with(|calls| calls.borrow_mut().push(name));
}

fn remember(handle: *mut c_void) -> *mut c_void {
    if !handle.is_null() {
        CREATED.with(|created| created.borrow_mut().push(handle.addr()));
    }
    handle
}

/// 若设置了强制结果码则返回它（只生效一次），否则执行真实变换。
fn forced_or(real: impl FnOnce() -> i32) -> i32 {
    match NEXT_RESULT.with(|next| next.take()) {
        Some(code) => code,
        None => real(),
    }
}

/// 清空当前线程的记录与开关。
pub fn reset_stub() {
    CALLS.with(|calls| calls.borrow_mut().clear());
    CREATED.with(|created| created.borrow_mut().clear());
    FREED.with(|freed| freed.borrow_mut().clear());
    NEXT_RESULT.with(|next| next.set(None));
    NULL_DATA.with(|flag| flag.set(false));
}

pub fn calls() -> Vec<&'static str> {
    CALLS.with(|calls| calls.borrow().clone())
}

pub fn call_count(name: &str) -> usize {
    CALLS.with(|calls| calls.borrow().iter().filter(|c| **c == name).count())
}

/// 引擎创建出的句柄地址（含加载），按创建顺序。
pub fn created() -> Vec<usize> {
    CREATED.with(|created| created.borrow().clone())
}

pub fn freed() -> Vec<usize> {
    FREED.with(|freed| freed.borrow().clone())
}

/// 让下一次变换类调用返回 `code` 而不执行真实变换。
pub fn force_next_result(code: i32) {
    NEXT_RESULT.with(|next| next.set(Some(code)));
}

/// 让 `image_get_data` 返回空指针，模拟回读失败。
pub fn force_null_data(enabled: bool) {
    NULL_DATA.with(|flag| flag.set(enabled));
}

unsafe extern "C" fn stub_load(path: *const c_char) -> *mut c_void {
    record("image_load");
    remember(unsafe { rs_image::image_load(path) })
}

unsafe extern "C" fn stub_from_rgba(data: *const u8, width: i32, height: i32) -> *mut c_void {
    record("image_from_rgba");
    remember(unsafe { rs_image::image_from_rgba(data, width, height) })
}

unsafe extern "C" fn stub_save(handle: *mut c_void, path: *const c_char) -> i32 {
    record("image_save");
    forced_or(|| unsafe { rs_image::image_save(handle, path) })
}

unsafe extern "C" fn stub_free(handle: *mut c_void) {
    record("image_free");
    FREED.with(|freed| freed.borrow_mut().push(handle.addr()));
    unsafe { rs_image::image_free(handle) }
}

unsafe extern "C" fn stub_rotate_90(handle: *mut c_void) -> i32 {
    record("image_rotate_90");
    forced_or(|| unsafe { rs_image::image_rotate_90(handle) })
}

unsafe extern "C" fn stub_rotate_180(handle: *mut c_void) -> i32 {
    record("image_rotate_180");
    forced_or(|| unsafe { rs_image::image_rotate_180(handle) })
}

unsafe extern "C" fn stub_rotate_270(handle: *mut c_void) -> i32 {
    record("image_rotate_270");
    forced_or(|| unsafe { rs_image::image_rotate_270(handle) })
}

unsafe extern "C" fn stub_flip_horizontal(handle: *mut c_void) -> i32 {
    record("image_flip_horizontal");
    forced_or(|| unsafe { rs_image::image_flip_horizontal(handle) })
}

unsafe extern "C" fn stub_flip_vertical(handle: *mut c_void) -> i32 {
    record("image_flip_vertical");
    forced_or(|| unsafe { rs_image::image_flip_vertical(handle) })
}

unsafe extern "C" fn stub_resize_with_filter(
    handle: *mut c_void,
    width: i32,
    height: i32,
    filter: i32,
) -> i32 {
    record("image_resize_with_filter");
    forced_or(|| unsafe { rs_image::image_resize_with_filter(handle, width, height, filter) })
}

unsafe extern "C" fn stub_adjust_brightness(handle: *mut c_void, value: i32) -> i32 {
    record("image_adjust_brightness");
    forced_or(|| unsafe { rs_image::image_adjust_brightness(handle, value) })
}

unsafe extern "C" fn stub_adjust_contrast(handle: *mut c_void, factor: f32) -> i32 {
    record("image_adjust_contrast");
    forced_or(|| unsafe { rs_image::image_adjust_contrast(handle, factor) })
}

unsafe extern "C" fn stub_blur(handle: *mut c_void, sigma: f32) -> i32 {
    record("image_blur");
    forced_or(|| unsafe { rs_image::image_blur(handle, sigma) })
}

unsafe extern "C" fn stub_grayscale(handle: *mut c_void) -> i32 {
    record("image_grayscale");
    forced_or(|| unsafe { rs_image::image_grayscale(handle) })
}

unsafe extern "C" fn stub_invert(handle: *mut c_void) -> i32 {
    record("image_invert");
    forced_or(|| unsafe { rs_image::image_invert(handle) })
}

unsafe extern "C" fn stub_get_width(handle: *mut c_void) -> i32 {
    record("image_get_width");
    unsafe { rs_image::image_get_width(handle) }
}

unsafe extern "C" fn stub_get_height(handle: *mut c_void) -> i32 {
    record("image_get_height");
    unsafe { rs_image::image_get_height(handle) }
}

unsafe extern "C" fn stub_get_data(handle: *mut c_void) -> *const u8 {
    record("image_get_data");
    if NULL_DATA.with(Cell::get) {
        return ptr::null();
    }
    unsafe { rs_image::image_get_data(handle) }
}

unsafe extern "C" fn stub_get_data_len(handle: *mut c_void) -> i64 {
    record("image_get_data_len");
    unsafe { rs_image::image_get_data_len(handle) }
}

/// 记录每次跨界调用的桩引擎。记录按线程隔离，测试之间互不干扰。
pub static STUB: Lazy<EngineBinding> = Lazy::new(|| unsafe {
    EngineBinding::from_entry_points(EntryPoints {
        image_load: stub_load,
        image_from_rgba: stub_from_rgba,
        image_save: stub_save,
        image_free: stub_free,
        image_rotate_90: stub_rotate_90,
        image_rotate_180: stub_rotate_180,
        image_rotate_270: stub_rotate_270,
        image_flip_horizontal: stub_flip_horizontal,
        image_flip_vertical: stub_flip_vertical,
        image_resize_with_filter: stub_resize_with_filter,
        image_adjust_brightness: stub_adjust_brightness,
        image_adjust_contrast: stub_adjust_contrast,
        image_blur: stub_blur,
        image_grayscale: stub_grayscale,
        image_invert: stub_invert,
        image_get_width: stub_get_width,
        image_get_height: stub_get_height,
        image_get_data: stub_get_data,
        image_get_data_len: stub_get_data_len,
    })
});

// ============================================================================
// 测试图片与临时目录
// ============================================================================

pub fn solid(width: u32, height: u32, color: [u8; 4]) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba(color)))
}

/// 每个像素颜色都不同的图片，便于检查几何变换。
pub fn gradient(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 17 % 256) as u8, (y * 29 % 256) as u8, ((x + y) % 256) as u8, 255])
    }))
}

pub fn unique_temp_dir(label: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock error")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "pixel-bridge-{label}-{}-{nanos}",
        std::process::id()
    ));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}
