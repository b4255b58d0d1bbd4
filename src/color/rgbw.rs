use std::str::FromStr;

use super::{
    utils::{byte_at, fade_channel, multiply_channel, parse_hex},
    Blend, BlendMode, ColorError, Hsv, NormalizeMode, Rgb, Rgba, Rgbwa,
};

/// Color for fixtures with a dedicated white LED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgbw {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub white: u8,
    pub alpha: u8,
}

impl Rgbw {
    pub const fn new(red: u8, green: u8, blue: u8, white: u8) -> Self {
        Self {
            red,
            green,
            blue,
            white,
            alpha: 255,
        }
    }

    pub const fn with_alpha(self, alpha: u8) -> Self {
        Self { alpha, ..self }
    }

    /// Unpack a `0xRRGGBBWW` value
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
            | u64::from(self.white)
    }

    pub fn hex(&self) -> String {
        format!("{:08x}", self.value())
    }

    pub fn web(&self) -> String {
        format!("#{}", self.hex())
    }

    pub fn is_black(&self) -> bool {
        self.red == 0 && self.green == 0 && self.blue == 0 && self.white == 0
    }

    pub fn multiply(&self, factor: f64) -> Self {
        Self {
            red: multiply_channel(self.red, factor),
            green: multiply_channel(self.green, factor),
            blue: multiply_channel(self.blue, factor),
            white: multiply_channel(self.white, factor),
            alpha: self.alpha,
        }
    }

    /// Mix the white LED back into the color channels
    pub fn to_rgb(&self) -> Rgb {
        Rgb {
            red: self.red.saturating_add(self.white),
            green: self.green.saturating_add(self.white),
            blue: self.blue.saturating_add(self.white),
            alpha: self.alpha,
        }
    }

    pub fn to_rgba(&self, mode: NormalizeMode) -> Rgba {
        self.to_rgb().to_rgba(mode)
    }

    /// Keep the white channel and derive amber from the color channels
    pub fn to_rgbwa(&self, mode: NormalizeMode) -> Rgbwa {
        let amber = Rgb::new(self.red, self.green, self.blue).to_rgba(mode);

        Rgbwa {
            red: amber.red,
            green: amber.green,
            blue: amber.blue,
            white: self.white,
            amber: amber.amber,
            alpha: self.alpha,
        }
    }

    pub fn to_hsv(&self) -> Hsv {
        self.to_rgb().to_hsv()
    }
}

impl Blend for Rgbw {
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
            white: fade_channel(self.white, other.white, factor, mode),
            alpha: self.alpha,
        }
    }
}

impl FromStr for Rgbw {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_value(parse_hex(s, 8)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packing() {
        let color = Rgbw::new(0x11, 0x22, 0x33, 0x44);
        assert_eq!(color.value(), 0x11223344);
        assert_eq!(color.hex(), "11223344");
        assert_eq!("#11223344".parse::<Rgbw>().unwrap(), color);
        assert_eq!(Rgbw::new(0, 0, 0, 1).hex(), "00000001");
    }

    #[test]
    fn test_to_rgb_saturates() {
        assert_eq!(Rgbw::new(250, 0, 10, 20).to_rgb(), Rgb::new(255, 20, 30));
    }

    #[test]
    fn test_fade_modes() {
        let a = Rgbw::new(100, 100, 100, 100);
        let b = Rgbw::new(200, 0, 50, 255);

        assert_eq!(a.fade(&b, 0.0, BlendMode::Average), a);
        assert_eq!(a.fade(&b, 1.0, BlendMode::Average), b);
        assert_eq!(
            a.fade(&b, 0.5, BlendMode::Add),
            Rgbw::new(200, 100, 125, 228)
        );
        assert_eq!(
            a.fade(&b, 1.0, BlendMode::Subtract),
            Rgbw::new(0, 100, 50, 0)
        );
    }
}
