//! 变换描述符
//!
//! # 设计思路
//!
//! 每种像素操作一个变体，携带各自的标量参数。事务只有一份，
//! 具体调用哪个入口由 `invoke` 里唯一的 `match` 决定，新增变换只改这里。
//!
//! 参数约束在跨界前由 `validate` 检查：
//! - 亮度增量 ∈ [-100, 100]
//! - 对比度系数有限且 ≥ 0
//! - 模糊 sigma 有限且 > 0
//! - 缩放目标宽高 > 0 且可表示为 `i32`
//!
//! 命令行使用文本形式（`rotate-right`、`resize=800x600:lanczos3`、`brightness=20`）。

use std::fmt;
use std::str::FromStr;

use super::filter::ResampleFilter;
use crate::engine::{EngineBinding, OwnedHandle, ResultCode};
use crate::error::BridgeError;

pub const BRIGHTNESS_RANGE: std::ops::RangeInclusive<i32> = -100..=100;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transform {
    /// 顺时针 90°
    RotateRight,
    /// 逆时针 90°
    RotateLeft,
    Rotate180,
    FlipHorizontal,
    FlipVertical,
    /// 保持宽高比缩放到框内
    Resize {
        width: u32,
        height: u32,
        filter: ResampleFilter,
    },
    Brightness(i32),
    Contrast(f32),
    Blur(f32),
    Grayscale,
    Invert,
}

impl Transform {
    /// 检查参数约束；违反即为调用方契约违规。
    pub fn validate(&self) -> Result<(), BridgeError> {
        match *self {
            Self::Resize { width, height, .. } => {
                if width == 0 || height == 0 {
                    return Err(BridgeError::invalid_argument(format!(
                        "缩放尺寸必须为正：{width}x{height}"
                    )));
                }
                if i32::try_from(width).is_err() || i32::try_from(height).is_err() {
                    return Err(BridgeError::invalid_argument(format!(
                        "缩放尺寸超出 i32：{width}x{height}"
                    )));
                }
            }
            Self::Brightness(delta) if !BRIGHTNESS_RANGE.contains(&delta) => {
                return Err(BridgeError::invalid_argument(format!(
                    "亮度增量超出 [-100, 100]：{delta}"
                )));
            }
            Self::Contrast(factor) if !factor.is_finite() || factor < 0.0 => {
                return Err(BridgeError::invalid_argument(format!(
                    "对比度系数必须有限且非负：{factor}"
                )));
            }
            Self::Blur(sigma) if !sigma.is_finite() || sigma <= 0.0 => {
                return Err(BridgeError::invalid_argument(format!(
                    "模糊半径必须有限且为正：{sigma}"
                )));
            }
            _ => {}
        }
        Ok(())
    }

    /// 对有效句柄执行一次对应的引擎调用。
    pub(crate) fn invoke(&self, binding: &EngineBinding, handle: &OwnedHandle<'_>) -> ResultCode {
        match *self {
            Self::RotateRight => binding.rotate_90(handle),
            Self::RotateLeft => binding.rotate_270(handle),
            Self::Rotate180 => binding.rotate_180(handle),
            Self::FlipHorizontal => binding.flip_horizontal(handle),
            Self::FlipVertical => binding.flip_vertical(handle),
            Self::Resize {
                width,
                height,
                filter,
            } => binding.resize_with_filter(handle, width as i32, height as i32, filter.code()),
            Self::Brightness(delta) => binding.adjust_brightness(handle, delta),
            Self::Contrast(factor) => binding.adjust_contrast(handle, factor),
            Self::Blur(sigma) => binding.blur(handle, sigma),
            Self::Grayscale => binding.grayscale(handle),
            Self::Invert => binding.invert(handle),
        }
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RotateRight => f.write_str("rotate-right"),
            Self::RotateLeft => f.write_str("rotate-left"),
            Self::Rotate180 => f.write_str("rotate-180"),
            Self::FlipHorizontal => f.write_str("flip-horizontal"),
            Self::FlipVertical => f.write_str("flip-vertical"),
            Self::Resize {
                width,
                height,
                filter,
            } => write!(f, "resize={width}x{height}:{filter}"),
            Self::Brightness(delta) => write!(f, "brightness={delta}"),
            Self::Contrast(factor) => write!(f, "contrast={factor}"),
            Self::Blur(sigma) => write!(f, "blur={sigma}"),
            Self::Grayscale => f.write_str("grayscale"),
            Self::Invert => f.write_str("invert"),
        }
    }
}

impl FromStr for Transform {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (name, arg) = match s.split_once('=') {
            Some((name, arg)) => (name.trim(), Some(arg.trim())),
            None => (s, None),
        };
        let name = name.to_ascii_lowercase();

        let require = || {
            arg.filter(|a| !a.is_empty())
                .ok_or_else(|| BridgeError::invalid_argument(format!("`{name}` 需要参数")))
        };
        let bad = |arg: &str| BridgeError::invalid_argument(format!("无法解析 `{name}` 的参数：{arg}"));

        let transform = match name.as_str() {
            "rotate-right" | "rotate-cw" | "rotate-90" => Self::RotateRight,
            "rotate-left" | "rotate-ccw" | "rotate-270" => Self::RotateLeft,
            "rotate-180" => Self::Rotate180,
            "flip-horizontal" | "flip-h" => Self::FlipHorizontal,
            "flip-vertical" | "flip-v" => Self::FlipVertical,
            "grayscale" | "greyscale" => Self::Grayscale,
            "invert" => Self::Invert,
            "brightness" => {
                let arg = require()?;
                Self::Brightness(arg.parse().map_err(|_| bad(arg))?)
            }
            "contrast" => {
                let arg = require()?;
                Self::Contrast(arg.parse().map_err(|_| bad(arg))?)
            }
            "blur" => {
                let arg = require()?;
                Self::Blur(arg.parse().map_err(|_| bad(arg))?)
            }
            "resize" => {
                let arg = require()?;
                let (size, filter) = match arg.split_once(':') {
                    Some((size, filter)) => (size, filter.parse()?),
                    None => (arg, ResampleFilter::default()),
                };
                let (w, h) = size
                    .split_once(['x', 'X'])
                    .ok_or_else(|| bad(arg))?;
                Self::Resize {
                    width: w.trim().parse().map_err(|_| bad(arg))?,
                    height: h.trim().parse().map_err(|_| bad(arg))?,
                    filter,
                }
            }
            _ => return Err(BridgeError::invalid_argument(format!("未知的变换：{s}"))),
        };

        transform.validate()?;
        Ok(transform)
    }
}
