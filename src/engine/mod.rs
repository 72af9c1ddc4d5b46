//! # 原生引擎绑定模块（engine）
//!
//! ## 设计思路
//!
//! 把“跨 ABI 边界”这件事收敛到一个模块里：
//!
//! - `result_code`：引擎结果码与 `ResultCode` 的固定映射
//! - `handle`：不透明句柄 `NativeHandle` 与其唯一所有者 `OwnedHandle`
//! - `symbols`：固定签名的入口函数表 `EntryPoints`，启动时解析一次
//! - `binding`：`EngineBinding`，每个入口一个方法，跨界前先校验句柄
//!
//! ## 实现思路
//!
//! 句柄只能由两个工厂（`load` / `from_raw_pixels`）产生，并且只以
//! `OwnedHandle` 的形式交给调用方。`OwnedHandle` 不可复制、不可跨线程，
//! `Drop` 时调用一次 `image_free`，因此任何退出路径（含 `?` 提前返回）
//! 都恰好释放一次，不会泄漏也不会重复释放。

mod binding;
mod handle;
mod result_code;
mod symbols;

pub use binding::EngineBinding;
pub use handle::{NativeHandle, OwnedHandle};
pub use result_code::ResultCode;
pub use symbols::{EntryPoints, RawHandle, TransformFn};
