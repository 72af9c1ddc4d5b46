//! 引擎结果码
//!
//! 线上取值固定为 0~6，未知值一律按 `ErrorInvalidHandle` 处理（显式兜底，
//! 不引入新的种类）。只有 `Success` 表示成功。

use std::fmt;

#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultCode {
    Success = 0,
    ErrorInvalidPath = 1,
    ErrorInvalidHandle = 2,
    ErrorLoadFailed = 3,
    ErrorSaveFailed = 4,
    ErrorAllocation = 5,
    ErrorUnsupportedFormat = 6,
}

impl ResultCode {
    pub const ALL: [ResultCode; 7] = [
        Self::Success,
        Self::ErrorInvalidPath,
        Self::ErrorInvalidHandle,
        Self::ErrorLoadFailed,
        Self::ErrorSaveFailed,
        Self::ErrorAllocation,
        Self::ErrorUnsupportedFormat,
    ];

    /// 将引擎返回的整数映射为结果码，永不失败。
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Success,
            1 => Self::ErrorInvalidPath,
            2 => Self::ErrorInvalidHandle,
            3 => Self::ErrorLoadFailed,
            4 => Self::ErrorSaveFailed,
            5 => Self::ErrorAllocation,
            6 => Self::ErrorUnsupportedFormat,
            _ => Self::ErrorInvalidHandle,
        }
    }

    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        self == Self::Success
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::ErrorInvalidPath => "ERROR_INVALID_PATH",
            Self::ErrorInvalidHandle => "ERROR_INVALID_HANDLE",
            Self::ErrorLoadFailed => "ERROR_LOAD_FAILED",
            Self::ErrorSaveFailed => "ERROR_SAVE_FAILED",
            Self::ErrorAllocation => "ERROR_ALLOCATION",
            Self::ErrorUnsupportedFormat => "ERROR_UNSUPPORTED_FORMAT",
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.as_str(), self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn wire_values_round_trip() {
        for code in ResultCode::ALL {
            assert_eq!(ResultCode::from_code(code.code()), code);
        }
        assert_eq!(ResultCode::ErrorUnsupportedFormat.code(), 6);
    }

    #[test]
    fn unknown_codes_fall_back_to_invalid_handle() {
        assert_eq!(ResultCode::from_code(7), ResultCode::ErrorInvalidHandle);
        assert_eq!(ResultCode::from_code(-1), ResultCode::ErrorInvalidHandle);
        assert_eq!(ResultCode::from_code(i32::MAX), ResultCode::ErrorInvalidHandle);
    }

    #[test]
    fn display_includes_name_and_code() {
        assert_eq!(ResultCode::ErrorLoadFailed.to_string(), "ERROR_LOAD_FAILED (3)");
    }

    proptest! {
        #[test]
        fn success_iff_zero(code in any::<i32>()) {
            prop_assert_eq!(ResultCode::from_code(code).is_success(), code == 0);
        }

        #[test]
        fn out_of_range_is_invalid_handle(code in any::<i32>().prop_filter("outside 0..=6", |c| !(0..=6).contains(c))) {
            prop_assert_eq!(ResultCode::from_code(code), ResultCode::ErrorInvalidHandle);
        }
    }
}
