//! 像素缓冲与宿主图像互转
//!
//! # 设计思路
//!
//! 引擎只认识一种布局：RGBA8、行优先、无行填充、非预乘 alpha。
//! 宿主侧的 `DynamicImage` 有多种颜色模型，这里负责在两者间逐像素搬运：
//!
//! - 8 位 Luma / LumaA / Rgb / Rgba 直接展开，缺少 alpha 的模型补 `0xFF`
//! - 16 位与浮点模型交给 `image` 自带的 RGBA8 转换
//!
//! 回程只生成 `ImageRgba8`，第 4 字节即真实 alpha。

use image::{DynamicImage, RgbaImage};

use crate::error::BridgeError;

/// 引擎格式的平铺像素缓冲。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// 校验尺寸与长度后构造；`data.len()` 必须等于 `width * height * 4`。
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, BridgeError> {
        if width == 0 || height == 0 {
            return Err(BridgeError::InvalidImage);
        }
        let expected = Self::expected_len(width, height)
            .ok_or_else(|| BridgeError::invalid_argument(format!("尺寸溢出：{width}x{height}")))?;
        if data.len() != expected {
            return Err(BridgeError::BufferSize {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// `width * height * 4`，溢出返回 `None`。
    pub fn expected_len(width: u32, height: u32) -> Option<usize> {
        (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(4))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// ABI 上的尺寸表示；超出 `i32` 的尺寸无法交给引擎。
    pub fn ffi_dimensions(&self) -> Result<(i32, i32), BridgeError> {
        let width = i32::try_from(self.width)
            .map_err(|_| BridgeError::invalid_argument(format!("宽度超出 i32：{}", self.width)))?;
        let height = i32::try_from(self.height)
            .map_err(|_| BridgeError::invalid_argument(format!("高度超出 i32：{}", self.height)))?;
        Ok((width, height))
    }
}

/// 宽高均非零的宿主图像才可交给引擎。
pub fn is_valid_host_image(image: &DynamicImage) -> bool {
    image.width() > 0 && image.height() > 0
}

/// 宿主图像 → RGBA8 平铺缓冲，每个像素恰好访问一次。
pub fn host_image_to_buffer(image: &DynamicImage) -> Result<PixelBuffer, BridgeError> {
    if !is_valid_host_image(image) {
        return Err(BridgeError::InvalidImage);
    }
    let (width, height) = (image.width(), image.height());
    let len = PixelBuffer::expected_len(width, height)
        .ok_or_else(|| BridgeError::invalid_argument(format!("尺寸溢出：{width}x{height}")))?;

    let data = match image {
        DynamicImage::ImageRgba8(rgba) => rgba.as_raw().clone(),
        DynamicImage::ImageRgb8(rgb) => {
            let mut data = Vec::with_capacity(len);
            for pixel in rgb.pixels() {
                data.extend_from_slice(&[pixel[0], pixel[1], pixel[2], 0xFF]);
            }
            data
        }
        DynamicImage::ImageLuma8(gray) => {
            let mut data = Vec::with_capacity(len);
            for pixel in gray.pixels() {
                let v = pixel[0];
                data.extend_from_slice(&[v, v, v, 0xFF]);
            }
            data
        }
        DynamicImage::ImageLumaA8(gray) => {
            let mut data = Vec::with_capacity(len);
            for pixel in gray.pixels() {
                let v = pixel[0];
                data.extend_from_slice(&[v, v, v, pixel[1]]);
            }
            data
        }
        other => other.to_rgba8().into_raw(),
    };

    PixelBuffer::new(width, height, data)
}

/// RGBA8 平铺缓冲 → 宿主图像（`ImageRgba8`）。
pub fn buffer_to_host_image(buffer: PixelBuffer) -> Result<DynamicImage, BridgeError> {
    let PixelBuffer {
        width,
        height,
        data,
    } = buffer;
    let actual = data.len();
    RgbaImage::from_raw(width, height, data)
        .map(DynamicImage::ImageRgba8)
        .ok_or(BridgeError::BufferSize {
            expected: PixelBuffer::expected_len(width, height).unwrap_or(usize::MAX),
            actual,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, GrayAlphaImage, GrayImage, Rgb, RgbImage, Rgba};
    use proptest::prelude::*;

    #[test]
    fn rejects_zero_dimension_and_wrong_length() {
        assert!(matches!(
            PixelBuffer::new(0, 4, vec![]),
            Err(BridgeError::InvalidImage)
        ));
        assert!(matches!(
            PixelBuffer::new(2, 2, vec![0; 15]),
            Err(BridgeError::BufferSize {
                expected: 16,
                actual: 15
            })
        ));
    }

    #[test]
    fn empty_host_image_is_invalid() {
        let empty = DynamicImage::new_rgba8(0, 0);
        assert!(!is_valid_host_image(&empty));
        assert!(matches!(
            host_image_to_buffer(&empty),
            Err(BridgeError::InvalidImage)
        ));
    }

    #[test]
    fn rgb_gets_opaque_alpha() {
        let rgb = RgbImage::from_pixel(3, 2, Rgb([10, 20, 30]));
        let buffer = host_image_to_buffer(&DynamicImage::ImageRgb8(rgb)).expect("valid image");
        assert_eq!(buffer.data().len(), 3 * 2 * 4);
        assert!(buffer.data().chunks_exact(4).all(|p| p == [10, 20, 30, 255]));
    }

    #[test]
    fn gray_models_expand_to_rgba() {
        let gray = GrayImage::from_pixel(2, 2, image::Luma([77]));
        let buffer = host_image_to_buffer(&DynamicImage::ImageLuma8(gray)).expect("valid image");
        assert!(buffer.data().chunks_exact(4).all(|p| p == [77, 77, 77, 255]));

        let gray_alpha = GrayAlphaImage::from_pixel(1, 3, image::LumaA([5, 128]));
        let buffer =
            host_image_to_buffer(&DynamicImage::ImageLumaA8(gray_alpha)).expect("valid image");
        assert!(buffer.data().chunks_exact(4).all(|p| p == [5, 5, 5, 128]));
    }

    #[test]
    fn sixteen_bit_goes_through_rgba8_conversion() {
        let deep = DynamicImage::new_rgb16(4, 4);
        let buffer = host_image_to_buffer(&deep).expect("valid image");
        assert!(buffer.data().chunks_exact(4).all(|p| p == [0, 0, 0, 255]));
    }

    #[test]
    fn ffi_dimensions_reject_oversized() {
        let buffer = PixelBuffer {
            width: u32::MAX,
            height: 1,
            data: Vec::new(),
        };
        assert!(buffer.ffi_dimensions().is_err());
    }

    proptest! {
        #[test]
        fn rgba_round_trip_preserves_pixels(
            (width, height, data) in (1u32..12, 1u32..12).prop_flat_map(|(w, h)| {
                (Just(w), Just(h), proptest::collection::vec(any::<u8>(), (w * h * 4) as usize))
            })
        ) {
            let image = DynamicImage::ImageRgba8(
                RgbaImage::from_raw(width, height, data.clone()).expect("sized buffer"),
            );
            let buffer = host_image_to_buffer(&image).expect("valid image");
            let back = buffer_to_host_image(buffer).expect("valid buffer");

            prop_assert_eq!(back.dimensions(), (width, height));
            prop_assert_eq!(back.to_rgba8().into_raw(), data);
        }

        #[test]
        fn opaque_rgb_round_trip_has_full_alpha(r in any::<u8>(), g in any::<u8>(), b in any::<u8>()) {
            let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(5, 3, Rgb([r, g, b])));
            let back = buffer_to_host_image(host_image_to_buffer(&image).expect("valid image"))
                .expect("valid buffer");
            prop_assert!(back.to_rgba8().pixels().all(|p| *p == Rgba([r, g, b, 255])));
        }
    }
}
