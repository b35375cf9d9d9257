//! Bitmap representation for generic region decoding.
//!
//! "The variable whose value is the result of this decoding procedure is shown
//! in Table 3." (6.2.3)
//!
//! "GBREG - The decoded region bitmap." (Table 3)

use alloc::vec::Vec;

use crate::error::{RegionError, Result, bail};

/// The largest number of pixels a region may contain.
///
/// Regions exceeding this are not decoded at all, see
/// [`Bitmap::is_valid_size`].
pub const MAX_IMAGE_PIXELS: u32 = i32::MAX as u32 - 31;

/// A bi-level bitmap with byte-packed rows.
///
/// Each row occupies [`stride`](Bitmap::stride) bytes, the leftmost pixel of a
/// row being the most significant bit of its first byte. A set bit means
/// black. Bits past the width in the last byte of a row are always zero.
///
/// A bitmap may be *empty*: it has dimensions but no pixel storage. Reading an
/// empty bitmap yields white pixels and writing to it does nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    stride: usize,
    data: Vec<u8>,
}

impl Bitmap {
    /// Whether a region of the given size is decoded at all.
    ///
    /// Both sides must be non-zero, and neither a side nor the total pixel
    /// count may exceed [`MAX_IMAGE_PIXELS`].
    pub fn is_valid_size(width: u32, height: u32) -> bool {
        width > 0
            && height > 0
            && width <= MAX_IMAGE_PIXELS
            && height <= MAX_IMAGE_PIXELS
            && width as u64 * height as u64 <= MAX_IMAGE_PIXELS as u64
    }

    /// Create a bitmap with the given dimensions but without any pixel storage.
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            stride: width.div_ceil(8) as usize,
            data: Vec::new(),
        }
    }

    /// Create a new bitmap filled with white pixels.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if !Self::is_valid_size(width, height) {
            bail!(RegionError::InvalidDimension);
        }

        let stride = width.div_ceil(8) as usize;
        let len = stride
            .checked_mul(height as usize)
            .ok_or(RegionError::AllocationFailed)?;

        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| RegionError::AllocationFailed)?;
        data.resize(len, 0);

        Ok(Self {
            width,
            height,
            stride,
            data,
        })
    }

    /// Create a bitmap from packed row data.
    ///
    /// `data` must hold exactly `stride * height` bytes. Padding bits at the
    /// end of each row are cleared.
    pub fn from_data(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        if !Self::is_valid_size(width, height) {
            bail!(RegionError::InvalidDimension);
        }

        let stride = width.div_ceil(8) as usize;
        if Some(data.len()) != stride.checked_mul(height as usize) {
            bail!(RegionError::DataLengthMismatch);
        }

        let mut bitmap = Self {
            width,
            height,
            stride,
            data,
        };
        bitmap.clear_padding();

        Ok(bitmap)
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of bytes per row.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Whether the bitmap has pixel storage.
    #[inline]
    pub fn has_data(&self) -> bool {
        !self.data.is_empty()
    }

    /// The packed pixel data, `stride * height` bytes (or none if empty).
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// The packed bytes of row `y`.
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.height || !self.has_data() {
            return None;
        }

        let start = y as usize * self.stride;
        self.data.get(start..start + self.stride)
    }

    /// Get the pixel value at (x, y), as 0 or 1.
    ///
    /// "All pixels lying outside the bounds of the actual bitmap have the
    /// value 0." (6.2.5.2)
    #[inline]
    pub fn get_pixel(&self, x: i32, y: i32) -> u32 {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return 0;
        }

        let idx = y as usize * self.stride + (x as usize >> 3);
        self.data
            .get(idx)
            .map_or(0, |byte| ((byte >> (7 - (x & 7))) & 1) as u32)
    }

    /// Set the pixel at (x, y). Out-of-bounds writes are ignored.
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, value: bool) {
        if x >= self.width || y >= self.height {
            return;
        }

        let idx = y as usize * self.stride + (x as usize >> 3);
        let mask = 0x80 >> (x & 7);

        if let Some(byte) = self.data.get_mut(idx) {
            if value {
                *byte |= mask;
            } else {
                *byte &= !mask;
            }
        }
    }

    /// Copy row `from` into row `to`.
    ///
    /// If `from` lies outside the bitmap, row `to` is cleared instead.
    pub fn copy_line(&mut self, to: u32, from: i32) {
        if to >= self.height || !self.has_data() {
            return;
        }

        let dst = to as usize * self.stride;

        if from < 0 || from as u32 >= self.height {
            self.data[dst..dst + self.stride].fill(0);
        } else {
            let src = from as usize * self.stride;
            self.data.copy_within(src..src + self.stride, dst);
        }
    }

    /// Set every pixel to the given value.
    pub fn fill(&mut self, value: bool) {
        self.data.fill(if value { 0xFF } else { 0 });

        if value {
            self.clear_padding();
        }
    }

    fn clear_padding(&mut self) {
        let used_bits = self.width % 8;
        if used_bits == 0 || self.stride == 0 {
            return;
        }

        let mask = 0xFF_u8 << (8 - used_bits);
        for row in self.data.chunks_exact_mut(self.stride) {
            row[self.stride - 1] &= mask;
        }
    }
}

#[cfg(feature = "image")]
impl From<&Bitmap> for image::GrayImage {
    /// Convert to an 8-bit grayscale image, black pixels becoming 0 and white
    /// pixels 255.
    fn from(bitmap: &Bitmap) -> Self {
        Self::from_fn(bitmap.width, bitmap.height, |x, y| {
            let black = bitmap.get_pixel(x as i32, y as i32) != 0;
            image::Luma([if black { 0 } else { 255 }])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn stride_rounds_up() {
        assert_eq!(Bitmap::new(1, 1).unwrap().stride(), 1);
        assert_eq!(Bitmap::new(8, 1).unwrap().stride(), 1);
        assert_eq!(Bitmap::new(9, 1).unwrap().stride(), 2);
        assert_eq!(Bitmap::new(17, 3).unwrap().data().len(), 9);
    }

    #[test]
    fn out_of_bounds_reads_are_white() {
        let mut bitmap = Bitmap::new(3, 2).unwrap();
        bitmap.fill(true);

        assert_eq!(bitmap.get_pixel(0, 0), 1);
        assert_eq!(bitmap.get_pixel(2, 1), 1);
        assert_eq!(bitmap.get_pixel(-1, 0), 0);
        assert_eq!(bitmap.get_pixel(0, -1), 0);
        assert_eq!(bitmap.get_pixel(3, 0), 0);
        assert_eq!(bitmap.get_pixel(0, 2), 0);
        // Padding bits inside the last byte count as outside.
        assert_eq!(bitmap.get_pixel(5, 0), 0);
    }

    #[test]
    fn set_and_clear_pixels() {
        let mut bitmap = Bitmap::new(10, 2).unwrap();
        bitmap.set_pixel(0, 0, true);
        bitmap.set_pixel(9, 1, true);
        bitmap.set_pixel(10, 1, true);

        assert_eq!(bitmap.data(), &[0x80, 0x00, 0x00, 0x40]);

        bitmap.set_pixel(0, 0, false);
        assert_eq!(bitmap.get_pixel(0, 0), 0);
        assert_eq!(bitmap.get_pixel(9, 1), 1);
    }

    #[test]
    fn fill_keeps_padding_clear() {
        let mut bitmap = Bitmap::new(10, 2).unwrap();
        bitmap.fill(true);
        assert_eq!(bitmap.data(), &[0xFF, 0xC0, 0xFF, 0xC0]);

        bitmap.fill(false);
        assert_eq!(bitmap.data(), &[0, 0, 0, 0]);
    }

    #[test]
    fn copy_line_from_outside_clears() {
        let mut bitmap = Bitmap::from_data(8, 3, vec![0xA5, 0x3C, 0xFF]).unwrap();

        bitmap.copy_line(2, 0);
        assert_eq!(bitmap.row(2), Some(&[0xA5][..]));

        bitmap.copy_line(0, -1);
        assert_eq!(bitmap.row(0), Some(&[0x00][..]));

        bitmap.copy_line(1, 3);
        assert_eq!(bitmap.row(1), Some(&[0x00][..]));
    }

    #[test]
    fn from_data_validates_length_and_masks_padding() {
        assert_eq!(
            Bitmap::from_data(9, 2, vec![0; 3]),
            Err(RegionError::DataLengthMismatch.into())
        );
        assert_eq!(
            Bitmap::from_data(0, 2, vec![]),
            Err(RegionError::InvalidDimension.into())
        );

        let bitmap = Bitmap::from_data(9, 1, vec![0xFF, 0xFF]).unwrap();
        assert_eq!(bitmap.data(), &[0xFF, 0x80]);
    }

    #[test]
    fn size_guard() {
        assert!(Bitmap::is_valid_size(1, 1));
        assert!(Bitmap::is_valid_size(MAX_IMAGE_PIXELS, 1));
        assert!(!Bitmap::is_valid_size(0, 5));
        assert!(!Bitmap::is_valid_size(5, 0));
        assert!(!Bitmap::is_valid_size(MAX_IMAGE_PIXELS + 1, 1));
        assert!(!Bitmap::is_valid_size(65536, 65536));
        assert_eq!(
            Bitmap::new(65536, 65536),
            Err(RegionError::InvalidDimension.into())
        );
    }

    #[test]
    fn empty_bitmap_has_no_pixels() {
        let mut bitmap = Bitmap::empty(100, 100);
        bitmap.set_pixel(3, 3, true);
        bitmap.copy_line(1, 0);
        bitmap.fill(true);

        assert!(!bitmap.has_data());
        assert_eq!(bitmap.width(), 100);
        assert_eq!(bitmap.height(), 100);
        assert_eq!(bitmap.get_pixel(3, 3), 0);
        assert_eq!(bitmap.row(0), None);
    }

    #[cfg(feature = "image")]
    #[test]
    fn converts_to_gray_image() {
        let bitmap = Bitmap::from_data(3, 1, vec![0b1010_0000]).unwrap();
        let image = image::GrayImage::from(&bitmap);

        assert_eq!(image.dimensions(), (3, 1));
        assert_eq!(image.as_raw(), &vec![0, 255, 0]);
    }
}
