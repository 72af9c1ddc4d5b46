//! 重采样滤镜
//!
//! 枚举值即引擎的滤镜码（0~4），顺序只用于展示。配置文件与命令行使用
//! 稳定的小写名称；`FromStr` 同时接受别名与数字码。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BridgeError;

#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResampleFilter {
    Nearest = 0,
    #[default]
    Triangle = 1,
    CatmullRom = 2,
    Gaussian = 3,
    Lanczos3 = 4,
}

impl ResampleFilter {
    pub const ALL: [ResampleFilter; 5] = [
        Self::Nearest,
        Self::Triangle,
        Self::CatmullRom,
        Self::Gaussian,
        Self::Lanczos3,
    ];

    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|filter| filter.code() == code)
    }

    /// 展示名称（菜单 / 状态栏）。
    pub fn label(self) -> &'static str {
        match self {
            Self::Nearest => "Nearest (Fast)",
            Self::Triangle => "Bilinear",
            Self::CatmullRom => "Bicubic",
            Self::Gaussian => "Gaussian",
            Self::Lanczos3 => "Lanczos3 (Best)",
        }
    }

    /// 配置与命令行使用的稳定名称。
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Nearest => "nearest",
            Self::Triangle => "triangle",
            Self::CatmullRom => "catmull_rom",
            Self::Gaussian => "gaussian",
            Self::Lanczos3 => "lanczos3",
        }
    }
}

impl fmt::Display for ResampleFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResampleFilter {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        let filter = match normalized.as_str() {
            "nearest" | "0" => Self::Nearest,
            "triangle" | "bilinear" | "1" => Self::Triangle,
            "catmull_rom" | "catmullrom" | "bicubic" | "2" => Self::CatmullRom,
            "gaussian" | "3" => Self::Gaussian,
            "lanczos3" | "lanczos" | "4" => Self::Lanczos3,
            _ => return Err(BridgeError::invalid_argument(format!("未知的重采样滤镜：{s}"))),
        };
        Ok(filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_engine_wire_values() {
        assert_eq!(ResampleFilter::Nearest.code(), 0);
        assert_eq!(ResampleFilter::Lanczos3.code(), 4);
        for filter in ResampleFilter::ALL {
            assert_eq!(ResampleFilter::from_code(filter.code()), Some(filter));
        }
        assert_eq!(ResampleFilter::from_code(5), None);
    }

    #[test]
    fn default_is_bilinear() {
        assert_eq!(ResampleFilter::default(), ResampleFilter::Triangle);
        assert_eq!(ResampleFilter::default().label(), "Bilinear");
    }

    #[test]
    fn parses_aliases_and_codes() {
        assert_eq!("bicubic".parse::<ResampleFilter>().ok(), Some(ResampleFilter::CatmullRom));
        assert_eq!("Catmull-Rom".parse::<ResampleFilter>().ok(), Some(ResampleFilter::CatmullRom));
        assert_eq!("4".parse::<ResampleFilter>().ok(), Some(ResampleFilter::Lanczos3));
        assert!("box".parse::<ResampleFilter>().is_err());
    }

    #[test]
    fn serde_uses_snake_case_names() {
        let json = serde_json::to_string(&ResampleFilter::CatmullRom).expect("serialize");
        assert_eq!(json, "\"catmull_rom\"");
        let back: ResampleFilter = serde_json::from_str("\"gaussian\"").expect("deserialize");
        assert_eq!(back, ResampleFilter::Gaussian);
    }
}
