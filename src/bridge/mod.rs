//! # 像素桥接模块（bridge）
//!
//! ## 设计思路
//!
//! 调用方只和 `PixelBridge` 打交道，交换的永远是宿主图像 `DynamicImage`：
//!
//! - `buffer`：`DynamicImage` ⇄ RGBA8 平铺缓冲
//! - `filter`：`ResampleFilter`，与引擎滤镜码一一对应
//! - `transform`：`Transform` 描述符与参数约束
//! - `service`：`PixelBridge`，唯一的事务实现
//!
//! 句柄、结果码、原始指针都停留在本模块与 `engine` 之间。

mod buffer;
mod filter;
mod service;
mod transform;

pub use buffer::{PixelBuffer, buffer_to_host_image, host_image_to_buffer, is_valid_host_image};
pub use filter::ResampleFilter;
pub use service::PixelBridge;
pub use transform::{BRIGHTNESS_RANGE, Transform};
