//! RGB24 camera frames and face regions

use std::borrow::Cow;
use std::io::Cursor;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, ImageResult};
use serde::{Deserialize, Serialize};

/// Face bounding box in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Region {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// Intersect with a `width` x `height` frame, `None` if nothing is left
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<Region> {
        if self.x >= width || self.y >= height || self.w == 0 || self.h == 0 {
            return None;
        }
        Some(Region {
            x: self.x,
            y: self.y,
            w: self.w.min(width - self.x),
            h: self.h.min(height - self.y),
        })
    }

    /// Shift by an origin, e.g. to map a box found in a crop back onto the frame
    pub fn offset(&self, dx: u32, dy: u32) -> Region {
        Region {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
            ..*self
        }
    }
}

/// A captured frame, tightly packed RGB24
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Frame {
    /// Wrap raw RGB24 bytes; `None` when the length doesn't match the size
    pub fn from_rgb(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(3)?;
        (data.len() == expected).then_some(Self {
            width,
            height,
            data,
        })
    }

    #[cfg(test)]
    /// Frame of a single colour
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 3)
            .collect();
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn full_region(&self) -> Region {
        Region::new(0, 0, self.width, self.height)
    }

    /// Cut out `region`, clamped to the frame. Borrows when it spans the frame.
    pub fn crop(&self, region: &Region) -> Option<Cow<'_, Frame>> {
        let r = region.clamp_to(self.width, self.height)?;
        if r == self.full_region() {
            return Some(Cow::Borrowed(self));
        }

        let row_len = r.w as usize * 3;
        let mut data = Vec::with_capacity(row_len * r.h as usize);
        for y in r.y..r.y + r.h {
            let start = self.index(r.x, y);
            data.extend_from_slice(&self.data[start..start + row_len]);
        }

        Some(Cow::Owned(Frame {
            width: r.w,
            height: r.h,
            data,
        }))
    }

    /// Draw a rectangle outline, clipped to the frame
    pub fn draw_box(&mut self, region: &Region, rgb: [u8; 3], thickness: u32) {
        let Some(r) = region.clamp_to(self.width, self.height) else {
            return;
        };
        let t = thickness.max(1);

        for y in r.y..r.y + r.h {
            for x in r.x..r.x + r.w {
                let on_edge = x < r.x + t
                    || y < r.y + t
                    || x + t >= r.x + r.w
                    || y + t >= r.y + r.h;
                if on_edge {
                    let i = self.index(x, y);
                    self.data[i..i + 3].copy_from_slice(&rgb);
                }
            }
        }
    }

    pub fn encode_jpeg(&self, quality: u8) -> ImageResult<Vec<u8>> {
        let mut buf = Cursor::new(Vec::new());
        JpegEncoder::new_with_quality(&mut buf, quality).encode(
            &self.data,
            self.width,
            self.height,
            ColorType::Rgb8,
        )?;
        Ok(buf.into_inner())
    }

    pub fn save_png(&self, path: &Path) -> ImageResult<()> {
        image::save_buffer_with_format(
            path,
            &self.data,
            self.width,
            self.height,
            ColorType::Rgb8,
            image::ImageFormat::Png,
        )
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel(frame: &Frame, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= frame.width() || y >= frame.height() {
            return None;
        }
        let i = frame.index(x, y);
        Some([frame.data[i], frame.data[i + 1], frame.data[i + 2]])
    }

    fn gradient(width: u32, height: u32) -> Frame {
        let mut data = Vec::new();
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&[x as u8, y as u8, 0]);
            }
        }
        Frame::from_rgb(width, height, data).unwrap()
    }

    #[test]
    fn test_from_rgb_checks_length() {
        assert!(Frame::from_rgb(2, 2, vec![0; 12]).is_some());
        assert!(Frame::from_rgb(2, 2, vec![0; 11]).is_none());
    }

    #[test]
    fn test_crop_full_region_borrows() {
        let frame = gradient(4, 3);
        let crop = frame.crop(&frame.full_region()).unwrap();
        assert!(matches!(crop, Cow::Borrowed(_)));
    }

    #[test]
    fn test_crop_is_clamped() {
        let frame = gradient(4, 4);
        let crop = frame.crop(&Region::new(2, 1, 10, 2)).unwrap();
        assert_eq!((crop.width(), crop.height()), (2, 2));
        assert_eq!(pixel(&crop, 0, 0), Some([2, 1, 0]));
        assert_eq!(pixel(&crop, 1, 1), Some([3, 2, 0]));

        assert!(frame.crop(&Region::new(4, 0, 1, 1)).is_none());
        assert!(frame.crop(&Region::new(0, 0, 0, 3)).is_none());
    }

    #[test]
    fn test_draw_box_outline() {
        let mut frame = Frame::filled(5, 5, [0, 0, 0]);
        frame.draw_box(&Region::new(1, 1, 3, 3), [0, 255, 0], 1);

        assert_eq!(pixel(&frame, 1, 1), Some([0, 255, 0]));
        assert_eq!(pixel(&frame, 3, 2), Some([0, 255, 0]));
        assert_eq!(pixel(&frame, 2, 2), Some([0, 0, 0]));
        assert_eq!(pixel(&frame, 0, 0), Some([0, 0, 0]));
    }

    #[test]
    fn test_region_offset() {
        assert_eq!(Region::new(1, 2, 3, 4).offset(10, 20), Region::new(11, 22, 3, 4));
    }

    #[test]
    fn test_encode_jpeg() {
        let bytes = Frame::filled(8, 8, [200, 10, 10]).encode_jpeg(80).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }
}
