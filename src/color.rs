//! Color model for LED fixtures with optional white and amber channels

use std::fmt;

use serde_derive::{Deserialize, Serialize};
use strum_macros::{EnumDiscriminants, EnumIter, EnumString, IntoStaticStr};
use thiserror::Error;

mod hsv;
pub use hsv::Hsv;

mod rgb;
pub use rgb::Rgb;

mod rgba;
pub use rgba::Rgba;

mod rgbw;
pub use rgbw::Rgbw;

mod rgbwa;
pub use rgbwa::Rgbwa;

pub(crate) mod utils;

/// Ratio between the green and the red contribution of an amber LED
pub const AMBER_FACTOR: f64 = 191.0 / 255.0;

#[derive(Debug, Error)]
pub enum ColorError {
    #[error("cannot combine a {found:?} color with a {expected:?} color")]
    VariantMismatch { expected: ColorKind, found: ColorKind },
    #[error("invalid hex color: {0}")]
    InvalidHex(#[from] std::num::ParseIntError),
    #[error("expected {expected} hex digits, got {found}")]
    HexLength { expected: usize, found: usize },
}

/// Policy for combining two colors of the same kind
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BlendMode {
    Add,
    Subtract,
    Average,
    Replace,
}

/// Policy for deriving a white or amber channel from RGB
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NormalizeMode {
    None,
    Standard,
    FullOnly,
}

impl Default for NormalizeMode {
    fn default() -> Self {
        Self::None
    }
}

/// Fading and blending between two colors of the same type
pub trait Blend: Copy {
    fn alpha(&self) -> u8;

    /// Move from `self` towards `other` by `factor` in `[0, 1]`
    ///
    /// The result keeps the alpha of `self`, except in `Replace` mode which returns `other`.
    fn fade(&self, other: &Self, factor: f64, mode: BlendMode) -> Self;

    /// Fade towards `other` using its alpha as the factor
    fn blend(&self, other: &Self, mode: BlendMode) -> Self {
        self.fade(other, f64::from(other.alpha()) / 255.0, mode)
    }
}

/// A color in any of the supported channel layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumDiscriminants)]
#[strum_discriminants(name(ColorKind), derive(Hash, IntoStaticStr))]
pub enum Color {
    Rgb(Rgb),
    Rgbw(Rgbw),
    Rgba(Rgba),
    Rgbwa(Rgbwa),
    Hsv(Hsv),
}

impl Color {
    pub const BLACK: Color = Color::Rgb(Rgb::BLACK);

    pub fn kind(&self) -> ColorKind {
        self.into()
    }

    pub fn alpha(&self) -> u8 {
        match self {
            Color::Rgb(c) => c.alpha,
            Color::Rgbw(c) => c.alpha,
            Color::Rgba(c) => c.alpha,
            Color::Rgbwa(c) => c.alpha,
            Color::Hsv(c) => c.alpha,
        }
    }

    pub fn to_rgb(&self) -> Rgb {
        match self {
            Color::Rgb(c) => *c,
            Color::Rgbw(c) => c.to_rgb(),
            Color::Rgba(c) => c.to_rgb(),
            Color::Rgbwa(c) => c.to_rgb(),
            Color::Hsv(c) => c.to_rgb(),
        }
    }

    pub fn to_rgbw(&self, mode: NormalizeMode) -> Rgbw {
        match self {
            Color::Rgb(c) => c.to_rgbw(mode),
            Color::Rgbw(c) => *c,
            Color::Rgba(c) => c.to_rgbw(mode),
            Color::Rgbwa(c) => c.to_rgbw(mode),
            Color::Hsv(c) => c.to_rgbw(mode),
        }
    }

    pub fn to_rgba(&self, mode: NormalizeMode) -> Rgba {
        match self {
            Color::Rgb(c) => c.to_rgba(mode),
            Color::Rgbw(c) => c.to_rgba(mode),
            Color::Rgba(c) => *c,
            Color::Rgbwa(c) => c.to_rgba(mode),
            Color::Hsv(c) => c.to_rgba(mode),
        }
    }

    pub fn to_rgbwa(&self, mode: NormalizeMode) -> Rgbwa {
        match self {
            Color::Rgb(c) => c.to_rgbwa(mode),
            Color::Rgbw(c) => c.to_rgbwa(mode),
            Color::Rgba(c) => c.to_rgbwa(mode),
            Color::Rgbwa(c) => *c,
            Color::Hsv(c) => c.to_rgbwa(mode),
        }
    }

    pub fn to_hsv(&self) -> Hsv {
        match self {
            Color::Rgb(c) => c.to_hsv(),
            Color::Rgbw(c) => c.to_hsv(),
            Color::Rgba(c) => c.to_hsv(),
            Color::Rgbwa(c) => c.to_hsv(),
            Color::Hsv(c) => *c,
        }
    }

    /// Canonical packed integer of this color
    pub fn value(&self) -> u64 {
        match self {
            Color::Rgb(c) => c.value(),
            Color::Rgbw(c) => c.value(),
            Color::Rgba(c) => c.value(),
            Color::Rgbwa(c) => c.value(),
            Color::Hsv(c) => c.value(),
        }
    }

    pub fn hex(&self) -> String {
        match self {
            Color::Rgb(c) => c.hex(),
            Color::Rgbw(c) => c.hex(),
            Color::Rgba(c) => c.hex(),
            Color::Rgbwa(c) => c.hex(),
            Color::Hsv(c) => c.hex(),
        }
    }

    pub fn web(&self) -> String {
        format!("#{}", self.hex())
    }

    pub fn is_black(&self) -> bool {
        match self {
            Color::Rgb(c) => c.is_black(),
            Color::Rgbw(c) => c.is_black(),
            Color::Rgba(c) => c.is_black(),
            Color::Rgbwa(c) => c.is_black(),
            Color::Hsv(c) => c.is_black(),
        }
    }

    pub fn multiply(&self, factor: f64) -> Color {
        match self {
            Color::Rgb(c) => Color::Rgb(c.multiply(factor)),
            Color::Rgbw(c) => Color::Rgbw(c.multiply(factor)),
            Color::Rgba(c) => Color::Rgba(c.multiply(factor)),
            Color::Rgbwa(c) => Color::Rgbwa(c.multiply(factor)),
            Color::Hsv(c) => Color::Hsv(c.multiply(factor)),
        }
    }

    /// Fade towards a color of the same kind
    ///
    /// Colors of different kinds must be converted by the caller first.
    pub fn fade(&self, other: &Color, factor: f64, mode: BlendMode) -> Result<Color, ColorError> {
        Ok(match (self, other) {
            (Color::Rgb(a), Color::Rgb(b)) => Color::Rgb(a.fade(b, factor, mode)),
            (Color::Rgbw(a), Color::Rgbw(b)) => Color::Rgbw(a.fade(b, factor, mode)),
            (Color::Rgba(a), Color::Rgba(b)) => Color::Rgba(a.fade(b, factor, mode)),
            (Color::Rgbwa(a), Color::Rgbwa(b)) => Color::Rgbwa(a.fade(b, factor, mode)),
            (Color::Hsv(a), Color::Hsv(b)) => Color::Hsv(a.fade(b, factor, mode)),
            _ => {
                return Err(ColorError::VariantMismatch {
                    expected: self.kind(),
                    found: other.kind(),
                })
            }
        })
    }

    pub fn blend(&self, other: &Color, mode: BlendMode) -> Result<Color, ColorError> {
        self.fade(other, f64::from(other.alpha()) / 255.0, mode)
    }

    /// Append the wire encoding of this color to `out`
    ///
    /// Three bytes per LED are sent as R, G, B and four bytes as W, R, G, B. Kinds without an
    /// encoding for the requested size append nothing.
    pub fn write_led_bytes(&self, bytes_per_led: usize, mode: NormalizeMode, out: &mut Vec<u8>) {
        match self {
            Color::Rgb(_) | Color::Rgbw(_) | Color::Hsv(_) => match bytes_per_led {
                3 => {
                    let c = self.to_rgb();
                    out.extend_from_slice(&[c.red, c.green, c.blue]);
                }
                4 => {
                    let c = self.to_rgbw(mode);
                    out.extend_from_slice(&[c.white, c.red, c.green, c.blue]);
                }
                _ => {}
            },
            Color::Rgba(_) | Color::Rgbwa(_) => {}
        }
    }

    /// Two terminal cells painted with this color as a truecolor background
    pub fn ansi(&self) -> String {
        let c = self.to_rgb();
        format!("\x1B[48;2;{};{};{}m  \x1B[0m", c.red, c.green, c.blue)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.web())
    }
}

impl From<Rgb> for Color {
    fn from(c: Rgb) -> Self {
        Color::Rgb(c)
    }
}

impl From<Rgbw> for Color {
    fn from(c: Rgbw) -> Self {
        Color::Rgbw(c)
    }
}

impl From<Rgba> for Color {
    fn from(c: Rgba) -> Self {
        Color::Rgba(c)
    }
}

impl From<Rgbwa> for Color {
    fn from(c: Rgbwa) -> Self {
        Color::Rgbwa(c)
    }
}

impl From<Hsv> for Color {
    fn from(c: Hsv) -> Self {
        Color::Hsv(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    lazy_static::lazy_static! {
        static ref SAMPLES: [Color; 5] = [
            Color::Rgb(Rgb::new(12, 200, 99)),
            Color::Rgbw(Rgbw::new(1, 2, 3, 4)),
            Color::Rgba(Rgba::new(200, 100, 0, 50)),
            Color::Rgbwa(Rgbwa::new(9, 8, 7, 6, 5)),
            Color::Hsv(Hsv::new(200, 50, 80)),
        ];
    }

    #[test]
    fn test_fade_identity_and_replace() {
        for color in SAMPLES.iter() {
            let other = color.multiply(0.5);

            assert_eq!(color.fade(&other, 0.0, BlendMode::Average).unwrap(), *color);
            for &factor in &[0.0, 0.25, 1.0] {
                assert_eq!(
                    color.fade(&other, factor, BlendMode::Replace).unwrap(),
                    other
                );
            }
        }
    }

    #[test]
    fn test_fade_to_end_reaches_other() {
        for color in SAMPLES.iter() {
            let other = color.multiply(0.5);
            assert_eq!(color.fade(&other, 1.0, BlendMode::Average).unwrap(), other);
        }
    }

    #[test]
    fn test_mismatch_is_an_error() {
        let rgb = Color::from(Rgb::WHITE);
        let rgbw = Color::from(Rgbw::new(0, 0, 0, 255));

        match rgb.blend(&rgbw, BlendMode::Average) {
            Err(ColorError::VariantMismatch { expected, found }) => {
                assert_eq!(expected, ColorKind::Rgb);
                assert_eq!(found, ColorKind::Rgbw);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_led_bytes() {
        let mut out = Vec::new();
        Color::from(Rgb::new(1, 2, 3)).write_led_bytes(3, NormalizeMode::None, &mut out);
        Color::from(Rgb::new(10, 20, 30)).write_led_bytes(4, NormalizeMode::Standard, &mut out);
        Color::from(Rgbw::new(5, 6, 7, 8)).write_led_bytes(4, NormalizeMode::None, &mut out);
        Color::from(Rgba::new(5, 6, 7, 8)).write_led_bytes(3, NormalizeMode::None, &mut out);
        Color::from(Rgb::new(5, 6, 7)).write_led_bytes(5, NormalizeMode::None, &mut out);

        assert_eq!(out, vec![1, 2, 3, 10, 0, 10, 20, 8, 5, 6, 7]);
    }

    #[test]
    fn test_multiply_clamps() {
        assert_eq!(
            Color::from(Rgb::new(100, 200, 0)).multiply(2.0),
            Color::from(Rgb::new(200, 255, 0))
        );
        assert_eq!(
            Color::from(Rgb::new(100, 200, 0)).multiply(-1.0),
            Color::BLACK
        );
    }
}
