//! 不透明句柄与 RAII 所有者
//!
//! # 设计思路
//!
//! - `NativeHandle`：与机器地址等宽的令牌，宿主从不解引用，只原样传回引擎；
//!   零值（空指针）是唯一的“无效句柄”哨兵，相等即地址相等。
//! - `OwnedHandle`：句柄的唯一所有者，与 `EngineBinding` 生命周期绑定。
//!   构造于工厂调用，`Drop` 时释放一次；无效句柄的释放是空操作、不跨界。
//!
//! `OwnedHandle` 不实现 `Clone`，内部裸指针又使其不满足 `Send`，
//! 因此句柄既不会被释放两次，也不会离开创建它的线程。

use std::fmt;
use std::ptr;

use super::binding::EngineBinding;
use super::symbols::RawHandle;

/// 引擎侧图像状态的不透明令牌。
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeHandle(RawHandle);

impl NativeHandle {
    pub const INVALID: Self = Self(ptr::null_mut());

    pub(crate) fn from_raw(raw: RawHandle) -> Self {
        Self(raw)
    }

    pub(crate) fn as_raw(self) -> RawHandle {
        self.0
    }

    pub fn is_valid(self) -> bool {
        !self.0.is_null()
    }

    pub fn address(self) -> usize {
        self.0.addr()
    }
}

impl fmt::Debug for NativeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeHandle({:#x})", self.address())
    }
}

/// 句柄的作用域所有者。
///
/// # 示例
/// ```rust,no_run
/// use pixel_bridge::EngineBinding;
///
/// let binding = EngineBinding::global();
/// let handle = binding.load("photo.png");
/// if handle.is_valid() {
///     println!("{}x{}", binding.width(&handle), binding.height(&handle));
/// }
/// // handle 离开作用域时自动调用 image_free
/// ```
pub struct OwnedHandle<'e> {
    binding: &'e EngineBinding,
    handle: NativeHandle,
}

impl<'e> OwnedHandle<'e> {
    pub(crate) fn new(binding: &'e EngineBinding, handle: NativeHandle) -> Self {
        Self { binding, handle }
    }

    pub fn handle(&self) -> NativeHandle {
        self.handle
    }

    pub fn is_valid(&self) -> bool {
        self.handle.is_valid()
    }

    /// 立即释放；等价于 `drop(handle)`。
    pub fn release(self) {
        drop(self);
    }
}

impl fmt::Debug for OwnedHandle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("OwnedHandle").field(&self.handle).finish()
    }
}

impl Drop for OwnedHandle<'_> {
    fn drop(&mut self) {
        self.binding.release(self.handle);
    }
}
