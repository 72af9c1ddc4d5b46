//! # pixel-bridge — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │           调用方（查看器 / CLI / EditSession）             │
//! │                                                          │
//! │   load(path) ── save(image, path) ── rotate/flip/...     │
//! │       ↕  只交换 DynamicImage，不暴露句柄与结果码          │
//! └───────┼──────────────────────────────────────────────────┘
//!         ↕
//! ┌───────┼──────────────────────────────────────────────────┐
//! │  bridge ── PixelBridge（唯一的事务编排点）                │
//! │   ├─ buffer     DynamicImage ⇄ RGBA8 平铺缓冲             │
//! │   ├─ transform  Transform 枚举（单一 match 分派）         │
//! │   └─ filter     ResampleFilter（与引擎滤镜码一一对应）     │
//! │                                                          │
//! │  engine ── EngineBinding（每个入口一次校验 + 一次跨界）    │
//! │   ├─ symbols    EntryPoints 函数指针表（libloading 解析）  │
//! │   ├─ handle     NativeHandle / OwnedHandle（RAII 释放）   │
//! │   └─ result_code ResultCode（0~6 固定映射）               │
//! └───────┼──────────────────────────────────────────────────┘
//!         ↕ C ABI（image_load / image_from_rgba / ...）
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↕        rs_image 原生引擎（cdylib）                │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `BridgeError` |
//! | [`engine`] | 原生库加载、入口解析、句柄生命周期、结果码映射 |
//! | [`bridge`] | 像素缓冲转换与 `加载句柄 → 执行 → 回读 → 释放` 事务 |
//! | [`config`] | 引擎库位置、默认滤镜、缩放策略（JSON 持久化） |
//! | [`session`] | 无界面的编辑会话：当前图、缩放、同目录切图 |

pub mod bridge;
pub mod config;
pub mod engine;
pub mod error;
pub mod session;

pub use bridge::{PixelBridge, PixelBuffer, ResampleFilter, Transform};
pub use config::BridgeConfig;
pub use engine::{EngineBinding, EntryPoints, NativeHandle, OwnedHandle, ResultCode};
pub use error::BridgeError;
pub use session::{EditSession, FolderImages, SessionError};
