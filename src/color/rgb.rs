use std::{fmt, str::FromStr};

use super::{
    utils::{amber_green, byte_at, clamp_channel, fade_channel, multiply_channel, parse_hex},
    Blend, BlendMode, ColorError, Hsv, NormalizeMode, Rgba, Rgbw, Rgbwa, AMBER_FACTOR,
};

/// Plain red, green and blue color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    /// Blend weight used when compositing, never sent to devices
    pub alpha: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red,
            green,
            blue,
            alpha: 255,
        }
    }

    pub const fn with_alpha(self, alpha: u8) -> Self {
        Self { alpha, ..self }
    }

    /// Build a color from out-of-range components, clamping each one to `[0, 255]`
    pub fn clamped(red: i32, green: i32, blue: i32) -> Self {
        let clamp = |c: i32| c.max(0).min(255) as u8;
        Self::new(clamp(red), clamp(green), clamp(blue))
    }

    /// Unpack a `0xRRGGBB` value
    pub fn from_value(value: u64) -> Self {
        Self::new(byte_at(value, 16), byte_at(value, 8), byte_at(value, 0))
    }

    pub fn value(&self) -> u64 {
        u64::from(self.red) << 16 | u64::from(self.green) << 8 | u64::from(self.blue)
    }

    pub fn hex(&self) -> String {
        format!("{:06x}", self.value())
    }

    pub fn web(&self) -> String {
        format!("#{}", self.hex())
    }

    pub fn is_black(&self) -> bool {
        self.red == 0 && self.green == 0 && self.blue == 0
    }

    pub fn multiply(&self, factor: f64) -> Self {
        Self {
            red: multiply_channel(self.red, factor),
            green: multiply_channel(self.green, factor),
            blue: multiply_channel(self.blue, factor),
            alpha: self.alpha,
        }
    }

    /// Derive a white channel from this color
    ///
    /// `Standard` moves the common part of the three channels to white. `FullOnly` only
    /// switches to the white LED for full white, which then replaces the color LEDs.
    pub fn to_rgbw(&self, mode: NormalizeMode) -> Rgbw {
        let white = match mode {
            NormalizeMode::None => 0,
            NormalizeMode::Standard => self.red.min(self.green).min(self.blue),
            NormalizeMode::FullOnly if self.is_full() => 255,
            NormalizeMode::FullOnly => 0,
        };

        Rgbw {
            red: self.red - white,
            green: self.green - white,
            blue: self.blue - white,
            white,
            alpha: self.alpha,
        }
    }

    /// Derive an amber channel from this color
    ///
    /// `Standard` moves as much of the red/green mix as possible to amber. `FullOnly` drives
    /// the amber LED at full scale on top of the unchanged color LEDs for full white.
    pub fn to_rgba(&self, mode: NormalizeMode) -> Rgba {
        match mode {
            NormalizeMode::None => Rgba {
                red: self.red,
                green: self.green,
                blue: self.blue,
                amber: 0,
                alpha: self.alpha,
            },
            NormalizeMode::Standard => {
                let max_from_green = (f64::from(self.green) / AMBER_FACTOR).floor() as u32;
                let amber = u32::from(self.red).min(max_from_green).min(255) as u8;

                Rgba {
                    red: self.red - amber,
                    green: self.green - amber_green(amber),
                    blue: self.blue,
                    amber,
                    alpha: self.alpha,
                }
            }
            NormalizeMode::FullOnly => Rgba {
                red: self.red,
                green: self.green,
                blue: self.blue,
                amber: if self.is_full() { 255 } else { 0 },
                alpha: self.alpha,
            },
        }
    }

    /// Derive white first, then amber from what remains
    pub fn to_rgbwa(&self, mode: NormalizeMode) -> Rgbwa {
        let rgbw = self.to_rgbw(mode);
        let rest = Rgb::new(rgbw.red, rgbw.green, rgbw.blue).to_rgba(match mode {
            NormalizeMode::FullOnly => NormalizeMode::None,
            other => other,
        });

        Rgbwa {
            red: rest.red,
            green: rest.green,
            blue: rest.blue,
            white: rgbw.white,
            amber: rest.amber,
            alpha: self.alpha,
        }
    }

    pub fn to_hsv(&self) -> Hsv {
        use palette::FromColor;

        let rgb = palette::Srgb::new(
            f32::from(self.red) / 255.0,
            f32::from(self.green) / 255.0,
            f32::from(self.blue) / 255.0,
        );
        let hsv: palette::Hsv = palette::Hsv::from_color(rgb);

        let saturation = clamp_channel(f64::from(hsv.saturation) * 100.0);
        let hue = if saturation == 0 {
            0
        } else {
            (f64::from(hsv.hue.into_positive_degrees()).round() as u16) % 360
        };

        Hsv {
            hue,
            saturation,
            value: clamp_channel(f64::from(hsv.value) * 100.0),
            alpha: self.alpha,
        }
    }

    fn is_full(&self) -> bool {
        self.red == 255 && self.green == 255 && self.blue == 255
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::BLACK
    }
}

impl Blend for Rgb {
    fn alpha(&self) -> u8 {
        self.alpha
    }

    fn fade(&self, other: &Self, factor: f64, mode: BlendMode) -> Self {
        if mode == BlendMode::Replace {
            return *other;
        }

        Self {
            red: fade_channel(self.red, other.red, factor, mode),
            green: fade_channel(self.green, other.green, factor, mode),
            blue: fade_channel(self.blue, other.blue, factor, mode),
            alpha: self.alpha,
        }
    }
}

impl FromStr for Rgb {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_value(parse_hex(s, 6)?))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.web())
    }
}
