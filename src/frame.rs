//! Two-dimensional pixel grids and their geometric operations

use std::{fmt, time::Duration};

use serde_derive::{Deserialize, Serialize};
use strum_macros::{EnumString, IntoStaticStr};
use thiserror::Error;

use crate::color::{BlendMode, Color, ColorError, NormalizeMode};

mod draw;

mod bitmap;

mod text;
pub use text::TextRasterizer;

/// Delay of a frame played on its own
pub const DEFAULT_FRAME_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame geometry mismatch: {expected:?} vs {found:?}")]
    GeometryMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },
    #[error(transparent)]
    Color(#[from] ColorError),
    #[error("image error: {0}")]
    Image(#[from] ::image::ImageError),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Quarter-turn applied to a frame
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Rotation {
    None,
    Left,
    Right,
    Full,
}

impl Rotation {
    /// Rotation undoing this one
    pub fn inverse(self) -> Self {
        match self {
            Rotation::None => Rotation::None,
            Rotation::Left => Rotation::Right,
            Rotation::Right => Rotation::Left,
            Rotation::Full => Rotation::Full,
        }
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Self::None
    }
}

/// A `width` x `height` grid of colors
///
/// Reads outside of the grid return black and writes outside of it are ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelFrame {
    width: usize,
    height: usize,
    /// Row-major storage, `y * width + x`
    pixels: Vec<Color>,
    frame_delay: Duration,
}

impl PixelFrame {
    pub fn new(width: usize, height: usize, fill: impl Into<Color>) -> Self {
        Self {
            width,
            height,
            pixels: vec![fill.into(); width * height],
            frame_delay: DEFAULT_FRAME_DELAY,
        }
    }

    /// Concatenate frames left to right, padding shorter ones with black at the bottom
    pub fn join<'a>(frames: impl IntoIterator<Item = &'a PixelFrame>) -> Self {
        let mut frames = frames.into_iter();
        let mut joined = match frames.next() {
            Some(first) => first.clone(),
            None => return Self::new(0, 0, Color::BLACK),
        };

        for frame in frames {
            joined.append_right(frame);
        }

        joined
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn frame_delay(&self) -> Duration {
        self.frame_delay
    }

    pub fn set_frame_delay(&mut self, frame_delay: Duration) {
        self.frame_delay = frame_delay;
    }

    pub fn with_frame_delay(mut self, frame_delay: Duration) -> Self {
        self.frame_delay = frame_delay;
        self
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    fn index(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            None
        } else {
            Some(y as usize * self.width + x as usize)
        }
    }

    pub fn get(&self, x: i32, y: i32) -> Color {
        self.index(x.into(), y.into())
            .map(|i| self.pixels[i])
            .unwrap_or(Color::BLACK)
    }

    pub fn set(&mut self, x: i32, y: i32, color: impl Into<Color>) {
        if let Some(i) = self.index(x.into(), y.into()) {
            self.pixels[i] = color.into();
        }
    }

    /// Paint every pixel with `color`
    pub fn fill(&mut self, color: impl Into<Color>) {
        let color = color.into();
        self.pixels.iter_mut().for_each(|p| *p = color);
    }

    /// Copy the `width` x `height` area starting at the given offset
    ///
    /// The result always has the requested size. Parts of the area lying outside of this frame
    /// are black.
    pub fn sub_frame(&self, offset_x: i32, offset_y: i32, width: usize, height: usize) -> Self {
        let mut sub = Self::new(width, height, Color::BLACK).with_frame_delay(self.frame_delay);

        for y in 0..height as i32 {
            for x in 0..width as i32 {
                sub.set(x, y, self.get(x + offset_x, y + offset_y));
            }
        }

        sub
    }

    /// Composite `sub` into this frame at the given offset, clipped to this frame
    ///
    /// `Replace` writes the incoming pixels as is, other modes blend them over the existing
    /// pixels using the incoming alpha.
    pub fn replace_sub_frame(
        &mut self,
        sub: &PixelFrame,
        offset_x: i32,
        offset_y: i32,
        mode: BlendMode,
    ) -> Result<(), ColorError> {
        let (ox, oy) = (i64::from(offset_x), i64::from(offset_y));
        let x_range = (-ox).max(0)..(sub.width as i64).min(self.width as i64 - ox);
        let y_range = (-oy).max(0)..(sub.height as i64).min(self.height as i64 - oy);

        for y in y_range {
            for x in x_range.clone() {
                let incoming = sub.pixels[y as usize * sub.width + x as usize];
                // Both indices are in range thanks to the clipping above
                let i = (y + oy) as usize * self.width + (x + ox) as usize;

                self.pixels[i] = match mode {
                    BlendMode::Replace => incoming,
                    mode => self.pixels[i].blend(&incoming, mode)?,
                };
            }
        }

        Ok(())
    }

    /// Copy of this frame on a `width` x `height` canvas, shifted by `(dx, dy)`
    fn placed(&self, width: usize, height: usize, dx: usize, dy: usize, fill: Color) -> Self {
        let mut placed = Self::new(width, height, fill).with_frame_delay(self.frame_delay);
        placed.paste(self, dx, dy);
        placed
    }

    fn paste(&mut self, other: &PixelFrame, dx: usize, dy: usize) {
        for y in 0..other.height {
            for x in 0..other.width {
                if let Some(i) = self.index((x + dx) as i64, (y + dy) as i64) {
                    self.pixels[i] = other.pixels[y * other.width + x];
                }
            }
        }
    }

    pub fn expand_left(&mut self, columns: usize, fill: impl Into<Color>) -> &mut Self {
        *self = self.placed(self.width + columns, self.height, columns, 0, fill.into());
        self
    }

    pub fn expand_right(&mut self, columns: usize, fill: impl Into<Color>) -> &mut Self {
        *self = self.placed(self.width + columns, self.height, 0, 0, fill.into());
        self
    }

    pub fn expand_top(&mut self, rows: usize, fill: impl Into<Color>) -> &mut Self {
        *self = self.placed(self.width, self.height + rows, 0, rows, fill.into());
        self
    }

    pub fn expand_bottom(&mut self, rows: usize, fill: impl Into<Color>) -> &mut Self {
        *self = self.placed(self.width, self.height + rows, 0, 0, fill.into());
        self
    }

    /// Attach `other` to the right edge of this frame
    pub fn append_right(&mut self, other: &PixelFrame) -> &mut Self {
        let width = self.width;
        *self = self.placed(
            width + other.width,
            self.height.max(other.height),
            0,
            0,
            Color::BLACK,
        );
        self.paste(other, width, 0);
        self
    }

    pub fn append_left(&mut self, other: &PixelFrame) -> &mut Self {
        *self = self.placed(
            self.width + other.width,
            self.height.max(other.height),
            other.width,
            0,
            Color::BLACK,
        );
        self.paste(other, 0, 0);
        self
    }

    pub fn append_top(&mut self, other: &PixelFrame) -> &mut Self {
        *self = self.placed(
            self.width.max(other.width),
            self.height + other.height,
            0,
            other.height,
            Color::BLACK,
        );
        self.paste(other, 0, 0);
        self
    }

    pub fn append_bottom(&mut self, other: &PixelFrame) -> &mut Self {
        let height = self.height;
        *self = self.placed(
            self.width.max(other.width),
            height + other.height,
            0,
            0,
            Color::BLACK,
        );
        self.paste(other, 0, height);
        self
    }

    /// Build a frame of the given size where `(x, y)` of `self` lands on `map(x, y)`
    fn remapped(
        &self,
        width: usize,
        height: usize,
        map: impl Fn(usize, usize) -> (usize, usize),
    ) -> Self {
        let mut rotated = Self::new(width, height, Color::BLACK).with_frame_delay(self.frame_delay);

        for y in 0..self.height {
            for x in 0..self.width {
                let (nx, ny) = map(x, y);
                rotated.pixels[ny * width + nx] = self.pixels[y * self.width + x];
            }
        }

        rotated
    }

    /// Quarter-turn counter-clockwise
    pub fn rotate_left(&self) -> Self {
        let w = self.width;
        self.remapped(self.height, self.width, |x, y| (y, w - 1 - x))
    }

    /// Quarter-turn clockwise
    pub fn rotate_right(&self) -> Self {
        let h = self.height;
        self.remapped(self.height, self.width, |x, y| (h - 1 - y, x))
    }

    pub fn rotate_180(&self) -> Self {
        let (w, h) = (self.width, self.height);
        self.remapped(w, h, |x, y| (w - 1 - x, h - 1 - y))
    }

    pub fn rotate(&self, rotation: Rotation) -> Self {
        match rotation {
            Rotation::None => self.clone(),
            Rotation::Left => self.rotate_left(),
            Rotation::Right => self.rotate_right(),
            Rotation::Full => self.rotate_180(),
        }
    }

    /// Serialize to the wire pixel format, x outer and y inner
    pub fn to_byte_array(&self, bytes_per_led: usize) -> Vec<u8> {
        self.to_byte_array_normalized(bytes_per_led, NormalizeMode::None)
    }

    /// Serialize to the wire pixel format, deriving the white channel with `mode`
    pub fn to_byte_array_normalized(&self, bytes_per_led: usize, mode: NormalizeMode) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len() * bytes_per_led);

        for x in 0..self.width {
            for y in 0..self.height {
                self.pixels[y * self.width + x].write_led_bytes(bytes_per_led, mode, &mut out);
            }
        }

        out
    }

    /// Fade every pixel towards the matching pixel of `other`
    pub fn fade(
        &self,
        other: &PixelFrame,
        factor: f64,
        mode: BlendMode,
    ) -> Result<PixelFrame, FrameError> {
        if self.dimensions() != other.dimensions() {
            return Err(FrameError::GeometryMismatch {
                expected: self.dimensions(),
                found: other.dimensions(),
            });
        }

        let pixels = self
            .pixels
            .iter()
            .zip(other.pixels.iter())
            .map(|(a, b)| a.fade(b, factor, mode))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            pixels,
            ..self.clone()
        })
    }
}

impl fmt::Display for PixelFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.pixels.chunks(self.width.max(1)) {
            for pixel in row {
                f.write_str(&pixel.ansi())?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}
