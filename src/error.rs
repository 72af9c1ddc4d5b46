//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 桥接层内部所有失败都落到 `BridgeError` 上，按来源分三类：
//! - **调用方契约违规**：无效宿主图像、缓冲长度不符、参数越界，跨界之前即拒绝
//! - **引擎报告的失败**：非零 `ResultCode`、空句柄、回读失败
//! - **绑定失败**：动态库或入口符号无法解析，属于部署缺陷
//!
//! 对上层（查看器 / 会话）只暴露“有结果 / 无结果”，具体错误仅用于日志。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `std::io::Error` / `serde_json::Error` 提供 `From` 转换，配置读写可直接 `?`。

use std::path::PathBuf;

use crate::engine::ResultCode;

/// 桥接层统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// 动态库无法打开
    #[error("无法加载原生引擎库 {}: {source}", .path.display())]
    Library {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    /// 动态库缺少约定的入口
    #[error("原生引擎缺少入口 `{name}`: {source}")]
    Symbol {
        name: &'static str,
        #[source]
        source: libloading::Error,
    },

    /// 宿主图像已释放或尺寸为零
    #[error("宿主图像无效（已释放或尺寸为零）")]
    InvalidImage,

    /// 像素缓冲长度与 `width * height * 4` 不一致
    #[error("像素缓冲长度不匹配：期望 {expected} 字节，实际 {actual} 字节")]
    BufferSize { expected: usize, actual: usize },

    /// 变换参数或尺寸超出约定范围
    #[error("参数不合法：{0}")]
    InvalidArgument(String),

    /// 引擎返回了空句柄
    #[error("原生引擎未能创建图像句柄")]
    NullHandle,

    /// 引擎返回非成功结果码
    #[error("原生引擎返回错误：{0}")]
    Engine(ResultCode),

    /// 引擎回读的指针 / 长度 / 尺寸不可用
    #[error("回读像素失败：{0}")]
    Readback(String),

    /// 配置文件解析或校验失败
    #[error("配置错误：{0}")]
    Config(String),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    /// 配置 JSON 序列化 / 反序列化错误
    #[error("JSON 错误: {0}")]
    Json(#[from] serde_json::Error),
}

impl BridgeError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn readback(msg: impl Into<String>) -> Self {
        Self::Readback(msg.into())
    }

    /// 是否属于“跨界之前即拒绝”的调用方契约违规。
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::InvalidImage | Self::BufferSize { .. } | Self::InvalidArgument(_)
        )
    }
}
