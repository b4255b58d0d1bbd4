use std::str::FromStr;

use super::{
    utils::{amber_green, byte_at, fade_channel, multiply_channel, parse_hex},
    Blend, BlendMode, ColorError, Hsv, NormalizeMode, Rgb, Rgbw, Rgbwa,
};

/// Color for fixtures with a dedicated amber LED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgba {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub amber: u8,
    pub alpha: u8,
}

impl Rgba {
    pub const fn new(red: u8, green: u8, blue: u8, amber: u8) -> Self {
        Self {
            red,
            green,
            blue,
            amber,
            alpha: 255,
        }
    }

    pub const fn with_alpha(self, alpha: u8) -> Self {
        Self { alpha, ..self }
    }

    /// Unpack a `0xRRGGBBAA` value, the last byte being amber
    pub fn from_value(value: u64) -> Self {
        Self::new(
            byte_at(value, 24),
            byte_at(value, 16),
            byte_at(value, 8),
            byte_at(value, 0),
        )
    }

    pub fn value(&self) -> u64 {
        u64::from(self.red) << 24
            | u64::from(self.green) << 16
            | u64::from(self.blue) << 8
            | u64::from(self.amber)
    }

    pub fn hex(&self) -> String {
        format!("{:08x}", self.value())
    }

    pub fn web(&self) -> String {
        format!("#{}", self.hex())
    }

    pub fn is_black(&self) -> bool {
        self.red == 0 && self.green == 0 && self.blue == 0 && self.amber == 0
    }

    pub fn multiply(&self, factor: f64) -> Self {
        Self {
            red: multiply_channel(self.red, factor),
            green: multiply_channel(self.green, factor),
            blue: multiply_channel(self.blue, factor),
            amber: multiply_channel(self.amber, factor),
            alpha: self.alpha,
        }
    }

    /// Mix the amber LED back into red and green
    pub fn to_rgb(&self) -> Rgb {
        Rgb {
            red: self.red.saturating_add(self.amber),
            green: self.green.saturating_add(amber_green(self.amber)),
            blue: self.blue,
            alpha: self.alpha,
        }
    }

    pub fn to_rgbw(&self, mode: NormalizeMode) -> Rgbw {
        self.to_rgb().to_rgbw(mode)
    }

    /// Keep the amber channel and derive white from the color channels
    pub fn to_rgbwa(&self, mode: NormalizeMode) -> Rgbwa {
        let white = Rgb::new(self.red, self.green, self.blue).to_rgbw(mode);

        Rgbwa {
            red: white.red,
            green: white.green,
            blue: white.blue,
            white: white.white,
            amber: self.amber,
            alpha: self.alpha,
        }
    }

    pub fn to_hsv(&self) -> Hsv {
        self.to_rgb().to_hsv()
    }
}

impl Blend for Rgba {
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
            amber: fade_channel(self.amber, other.amber, factor, mode),
            alpha: self.alpha,
        }
    }
}

impl FromStr for Rgba {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_value(parse_hex(s, 8)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_rgb_uses_amber_ratio() {
        assert_eq!(Rgba::new(0, 0, 0, 255).to_rgb(), Rgb::new(255, 191, 0));
        assert_eq!(Rgba::new(0, 0, 7, 100).to_rgb(), Rgb::new(100, 75, 7));
    }

    #[test]
    fn test_packing() {
        let color = Rgba::new(1, 2, 3, 4);
        assert_eq!(color.value(), 0x01020304);
        assert_eq!(color.web(), "#01020304");
    }
}
