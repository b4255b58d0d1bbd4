use super::{
    utils::{amber_green, fade_channel, multiply_channel},
    Blend, BlendMode, Hsv, NormalizeMode, Rgb, Rgba, Rgbw,
};

/// Color for fixtures with both white and amber LEDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgbwa {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub white: u8,
    pub amber: u8,
    pub alpha: u8,
}

impl Rgbwa {
    pub const fn new(red: u8, green: u8, blue: u8, white: u8, amber: u8) -> Self {
        Self {
            red,
            green,
            blue,
            white,
            amber,
            alpha: 255,
        }
    }

    pub const fn with_alpha(self, alpha: u8) -> Self {
        Self { alpha, ..self }
    }

    pub fn value(&self) -> u64 {
        u64::from(self.red) << 32
            | u64::from(self.green) << 24
            | u64::from(self.blue) << 16
            | u64::from(self.white) << 8
            | u64::from(self.amber)
    }

    pub fn hex(&self) -> String {
        format!("{:010x}", self.value())
    }

    pub fn web(&self) -> String {
        format!("#{}", self.hex())
    }

    pub fn is_black(&self) -> bool {
        self.red == 0 && self.green == 0 && self.blue == 0 && self.white == 0 && self.amber == 0
    }

    pub fn multiply(&self, factor: f64) -> Self {
        Self {
            red: multiply_channel(self.red, factor),
            green: multiply_channel(self.green, factor),
            blue: multiply_channel(self.blue, factor),
            white: multiply_channel(self.white, factor),
            amber: multiply_channel(self.amber, factor),
            alpha: self.alpha,
        }
    }

    pub fn to_rgb(&self) -> Rgb {
        Rgb {
            red: self.red.saturating_add(self.white).saturating_add(self.amber),
            green: self
                .green
                .saturating_add(self.white)
                .saturating_add(amber_green(self.amber)),
            blue: self.blue.saturating_add(self.white),
            alpha: self.alpha,
        }
    }

    /// Fold amber into the color channels, keeping white
    pub fn to_rgbw(&self, _mode: NormalizeMode) -> Rgbw {
        let rgb = Rgba::new(self.red, self.green, self.blue, self.amber).to_rgb();

        Rgbw {
            red: rgb.red,
            green: rgb.green,
            blue: rgb.blue,
            white: self.white,
            alpha: self.alpha,
        }
    }

    /// Fold white into the color channels, keeping amber
    pub fn to_rgba(&self, _mode: NormalizeMode) -> Rgba {
        let rgb = Rgbw::new(self.red, self.green, self.blue, self.white).to_rgb();

        Rgba {
            red: rgb.red,
            green: rgb.green,
            blue: rgb.blue,
            amber: self.amber,
            alpha: self.alpha,
        }
    }

    pub fn to_hsv(&self) -> Hsv {
        self.to_rgb().to_hsv()
    }
}

impl Blend for Rgbwa {
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
            amber: fade_channel(self.amber, other.amber, factor, mode),
            alpha: self.alpha,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_is_ten_digits() {
        assert_eq!(Rgbwa::new(0, 0, 0, 0, 1).hex(), "0000000001");
        assert_eq!(Rgbwa::new(1, 2, 3, 4, 5).value(), 0x0102030405);
    }

    #[test]
    fn test_round_trip_through_rgb() {
        let color = Rgb::new(255, 255, 200);
        let rgbwa = color.to_rgbwa(NormalizeMode::Standard);
        assert_eq!(rgbwa.white, 200);
        assert_eq!(rgbwa.to_rgb(), color);
    }
}
