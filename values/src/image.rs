//! Interleaved 8-bit images.

use crate::error::{ValueError, ValueResult};

/// Channel counts an image may carry: grayscale, RGB or RGBA.
pub const SUPPORTED_CHANNELS: [usize; 3] = [1, 3, 4];

/// Interleaved 8-bit pixel buffer.
///
/// Rows are stored bottom-up, which is the layout the native engine expects.
/// Callers holding top-down pixels go through [`Image::from_top_down`].
///
/// Invariants: `channels` is 1, 3 or 4 and
/// `data.len() == width * height * channels`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    data: Vec<u8>,
    width: usize,
    height: usize,
    channels: usize,
}

impl Image {
    /// Wrap bottom-up pixel rows.
    pub fn new(data: Vec<u8>, width: usize, height: usize, channels: usize) -> ValueResult<Self> {
        if !SUPPORTED_CHANNELS.contains(&channels) {
            return Err(ValueError::InvalidImage {
                message: format!("unsupported channel count {}", channels),
            });
        }
        let expected = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(channels))
            .ok_or_else(|| ValueError::InvalidImage {
                message: format!("{}x{}x{} overflows", width, height, channels),
            })?;
        if data.len() != expected {
            return Err(ValueError::InvalidImage {
                message: format!(
                    "{}x{}x{} needs {} bytes, got {}",
                    width, height, channels, expected, data.len()
                ),
            });
        }
        Ok(Image { data, width, height, channels })
    }

    /// Wrap top-down pixel rows, flipping them into engine order.
    pub fn from_top_down(data: Vec<u8>, width: usize, height: usize, channels: usize) -> ValueResult<Self> {
        let image = Image::new(data, width, height, channels)?;
        let flipped = flip_rows(&image.data, image.width * image.channels);
        Ok(Image { data: flipped, ..image })
    }

    /// Pixel rows in top-down order.
    pub fn to_top_down(&self) -> Vec<u8> {
        flip_rows(&self.data, self.width * self.channels)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Engine shape: `[height, width, channels]`.
    pub fn shape(&self) -> [usize; 3] {
        [self.height, self.width, self.channels]
    }
}

/// Reverse the order of fixed-width rows.
pub fn flip_rows(data: &[u8], row_len: usize) -> Vec<u8> {
    if row_len == 0 {
        return data.to_vec();
    }
    data.chunks(row_len).rev().flatten().copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_channel_count() {
        assert!(matches!(
            Image::new(vec![0; 8], 2, 2, 2),
            Err(ValueError::InvalidImage { .. })
        ));
    }

    #[test]
    fn test_rejects_length_mismatch() {
        assert!(Image::new(vec![0; 11], 2, 2, 3).is_err());
        assert!(Image::new(vec![0; 12], 2, 2, 3).is_ok());
    }

    #[test]
    fn test_top_down_rows_are_flipped() {
        // Two rows of one RGB pixel each.
        let top_down = vec![1, 2, 3, 4, 5, 6];
        let image = Image::from_top_down(top_down.clone(), 1, 2, 3).unwrap();
        assert_eq!(image.data(), &[4, 5, 6, 1, 2, 3]);
        assert_eq!(image.to_top_down(), top_down);
        assert_eq!(image.shape(), [2, 1, 3]);
    }

    #[test]
    fn test_empty_image_is_valid() {
        let image = Image::new(Vec::new(), 0, 0, 4).unwrap();
        assert!(image.to_top_down().is_empty());
    }
}
