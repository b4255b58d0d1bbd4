//! Conversions between frames and decoded images

use std::path::Path;

use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};

use super::{FrameError, PixelFrame};
use crate::color::{Color, Rgb};

impl PixelFrame {
    /// Convert a decoded image, keeping its alpha channel as the blend weight
    pub fn from_image(image: &DynamicImage) -> Self {
        Self::from_rgba_image(&image.to_rgba8())
    }

    pub(crate) fn from_rgba_image(image: &RgbaImage) -> Self {
        let mut frame = Self::new(image.width() as usize, image.height() as usize, Color::BLACK);

        for (x, y, pixel) in image.enumerate_pixels() {
            let [red, green, blue, alpha] = pixel.0;
            frame.set(x as i32, y as i32, Rgb::new(red, green, blue).with_alpha(alpha));
        }

        frame
    }

    /// Decode an encoded still image (PNG, GIF)
    pub fn decode(bytes: &[u8]) -> Result<Self, FrameError> {
        Ok(Self::from_image(&image::load_from_memory(bytes)?))
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, FrameError> {
        Ok(Self::from_image(&image::open(path)?))
    }

    pub fn to_rgb_image(&self) -> RgbImage {
        RgbImage::from_fn(self.width() as u32, self.height() as u32, |x, y| {
            let c = self.get(x as i32, y as i32).to_rgb();
            image::Rgb([c.red, c.green, c.blue])
        })
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<(), FrameError> {
        Ok(self
            .to_rgb_image()
            .save_with_format(path, ImageFormat::Png)?)
    }
}
