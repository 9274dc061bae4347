//! Grayscale pixel grids and raster decoding (JPEG 2000, PNG).

use image::DynamicImage;

use crate::WriteError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PixelData {
    Gray8(Vec<u8>),
    Gray16(Vec<u16>),
}

impl PixelData {
    fn len(&self) -> usize {
        match self {
            PixelData::Gray8(v) => v.len(),
            PixelData::Gray16(v) => v.len(),
        }
    }
}

/// Row-major grayscale image, first row at index 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    data: PixelData,
}

impl PixelBuffer {
    pub fn new(width: usize, height: usize, data: PixelData) -> Result<Self, WriteError> {
        let expected = width
            .checked_mul(height)
            .ok_or_else(|| WriteError::Pixels(format!("{width}x{height} overflows")))?;
        if data.len() != expected {
            return Err(WriteError::Pixels(format!(
                "{width}x{height} needs {expected} pixels, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn data(&self) -> &PixelData {
        &self.data
    }

    /// Reverse row order in place (numpy `flipud`).
    pub fn flip_vertical(&mut self) {
        let (w, h) = (self.width, self.height);
        match &mut self.data {
            PixelData::Gray8(v) => flip_rows(v, w, h),
            PixelData::Gray16(v) => flip_rows(v, w, h),
        }
    }
}

fn flip_rows<T>(v: &mut [T], width: usize, height: usize) {
    if width == 0 {
        return;
    }
    for top in 0..height / 2 {
        let bottom = height - 1 - top;
        let (head, tail) = v.split_at_mut(bottom * width);
        head[top * width..(top + 1) * width].swap_with_slice(&mut tail[..width]);
    }
}

/// Decode a JPEG 2000 file or codestream into grayscale from its first component.
pub fn decode_jp2_gray(bytes: &[u8]) -> Result<PixelBuffer, WriteError> {
    let img = jpeg2k::Image::from_bytes(bytes).map_err(|e| WriteError::Decode(e.to_string()))?;
    let comp = img
        .components()
        .first()
        .ok_or_else(|| WriteError::Decode("jp2 has no image components".into()))?;
    if img.components().len() > 1 {
        tracing::debug!(
            components = img.components().len(),
            "jp2 has several components, keeping the first"
        );
    }
    gray_from_samples(
        comp.width() as usize,
        comp.height() as usize,
        comp.precision(),
        comp.is_signed(),
        comp.data(),
    )
}

/// Map decoded integer samples onto Gray8 (precision <= 8) or Gray16 (<= 16).
/// Signed samples are shifted up by half the range; anything outside is clamped.
fn gray_from_samples(
    width: usize,
    height: usize,
    precision: u32,
    signed: bool,
    samples: &[i32],
) -> Result<PixelBuffer, WriteError> {
    if precision == 0 || precision > 16 {
        return Err(WriteError::Decode(format!(
            "jp2 precision {precision} not supported"
        )));
    }
    let offset: i64 = if signed { 1 << (precision - 1) } else { 0 };
    let shifted = samples.iter().map(|&v| i64::from(v) + offset);
    let data = if precision <= 8 {
        PixelData::Gray8(shifted.map(|v| v.clamp(0, 255) as u8).collect())
    } else {
        PixelData::Gray16(shifted.map(|v| v.clamp(0, 65_535) as u16).collect())
    };
    PixelBuffer::new(width, height, data)
}

/// Decode a PNG into grayscale, keeping 16-bit depth when the source has it.
pub fn decode_png_gray(bytes: &[u8]) -> Result<PixelBuffer, WriteError> {
    let img = image::load_from_memory_with_format(bytes, image::ImageFormat::Png)
        .map_err(|e| WriteError::Decode(e.to_string()))?;

    let width = img.width() as usize;
    let height = img.height() as usize;
    let wide = matches!(
        img,
        DynamicImage::ImageLuma16(_)
            | DynamicImage::ImageLumaA16(_)
            | DynamicImage::ImageRgb16(_)
            | DynamicImage::ImageRgba16(_)
    );

    let data = if wide {
        PixelData::Gray16(img.to_luma16().into_raw())
    } else {
        PixelData::Gray8(img.to_luma8().into_raw())
    };
    PixelBuffer::new(width, height, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, ImageBuffer, Luma};
    use std::io::Cursor;

    fn encode_png(img: DynamicImage) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn rejects_mismatched_dimensions() {
        let err = PixelBuffer::new(2, 2, PixelData::Gray8(vec![0; 3])).unwrap_err();
        assert!(matches!(err, WriteError::Pixels(_)));
    }

    #[test]
    fn flip_vertical_reverses_rows() {
        let mut p = PixelBuffer::new(2, 3, PixelData::Gray8(vec![1, 2, 3, 4, 5, 6])).unwrap();
        p.flip_vertical();
        assert_eq!(p.data(), &PixelData::Gray8(vec![5, 6, 3, 4, 1, 2]));

        let mut q = PixelBuffer::new(1, 2, PixelData::Gray16(vec![10, 20])).unwrap();
        q.flip_vertical();
        assert_eq!(q.data(), &PixelData::Gray16(vec![20, 10]));
    }

    #[test]
    fn decodes_8bit_png() {
        let img = GrayImage::from_raw(2, 2, vec![0, 64, 128, 255]).unwrap();
        let p = decode_png_gray(&encode_png(DynamicImage::ImageLuma8(img))).unwrap();
        assert_eq!((p.width(), p.height()), (2, 2));
        assert_eq!(p.data(), &PixelData::Gray8(vec![0, 64, 128, 255]));
    }

    #[test]
    fn decodes_16bit_png_without_losing_depth() {
        let img: ImageBuffer<Luma<u16>, Vec<u16>> =
            ImageBuffer::from_raw(3, 1, vec![0, 1000, 65535]).unwrap();
        let p = decode_png_gray(&encode_png(DynamicImage::ImageLuma16(img))).unwrap();
        assert_eq!(p.data(), &PixelData::Gray16(vec![0, 1000, 65535]));
    }

    #[test]
    fn eight_bit_jp2_samples_become_gray8() {
        let p = gray_from_samples(2, 1, 8, false, &[0, 255]).unwrap();
        assert_eq!(p.data(), &PixelData::Gray8(vec![0, 255]));
    }

    #[test]
    fn twelve_bit_jp2_samples_keep_depth() {
        let p = gray_from_samples(3, 1, 12, false, &[0, 2048, 4095]).unwrap();
        assert_eq!(p.data(), &PixelData::Gray16(vec![0, 2048, 4095]));
    }

    #[test]
    fn signed_jp2_samples_are_shifted_and_clamped() {
        let p = gray_from_samples(3, 1, 8, true, &[-128, 0, 500]).unwrap();
        assert_eq!(p.data(), &PixelData::Gray8(vec![0, 128, 255]));
    }

    #[test]
    fn jp2_precision_limits() {
        assert!(matches!(
            gray_from_samples(1, 1, 24, false, &[0]),
            Err(WriteError::Decode(_))
        ));
        assert!(matches!(
            gray_from_samples(2, 2, 8, false, &[0]),
            Err(WriteError::Pixels(_))
        ));
    }

    #[test]
    fn garbage_jp2_is_decode_error() {
        assert!(matches!(
            decode_jp2_gray(b"not a jp2"),
            Err(WriteError::Decode(_))
        ));
    }

    #[test]
    fn garbage_is_decode_error() {
        assert!(matches!(
            decode_png_gray(b"not a png"),
            Err(WriteError::Decode(_))
        ));
    }
}
