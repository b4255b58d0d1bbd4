use super::{utils::clamp_channel, Blend, BlendMode, NormalizeMode, Rgb, Rgba, Rgbw, Rgbwa};

/// Hue in degrees, saturation and value in percent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Hsv {
    pub hue: u16,
    pub saturation: u8,
    pub value: u8,
    pub alpha: u8,
}

impl Hsv {
    /// Create a color, wrapping the hue to `[0, 360)` and clamping the percentages
    pub fn new(hue: u16, saturation: u8, value: u8) -> Self {
        Self {
            hue: hue % 360,
            saturation: saturation.min(100),
            value: value.min(100),
            alpha: 255,
        }
    }

    pub const fn with_alpha(self, alpha: u8) -> Self {
        Self { alpha, ..self }
    }

    /// Packed value of the equivalent RGB color
    pub fn value(&self) -> u64 {
        self.to_rgb().value()
    }

    pub fn hex(&self) -> String {
        self.to_rgb().hex()
    }

    pub fn web(&self) -> String {
        self.to_rgb().web()
    }

    pub fn is_black(&self) -> bool {
        self.value == 0
    }

    pub fn multiply(&self, factor: f64) -> Self {
        Self {
            value: clamp_channel(f64::from(self.value) * factor).min(100),
            ..*self
        }
    }

    pub fn to_rgb(&self) -> Rgb {
        use palette::FromColor;

        let hsv: palette::Hsv = palette::Hsv::new(
            f32::from(self.hue),
            f32::from(self.saturation) / 100.0,
            f32::from(self.value) / 100.0,
        );
        let rgb: palette::Srgb = palette::Srgb::from_color(hsv);

        Rgb {
            red: clamp_channel(f64::from(rgb.red) * 255.0),
            green: clamp_channel(f64::from(rgb.green) * 255.0),
            blue: clamp_channel(f64::from(rgb.blue) * 255.0),
            alpha: self.alpha,
        }
    }

    pub fn to_rgbw(&self, mode: NormalizeMode) -> Rgbw {
        self.to_rgb().to_rgbw(mode)
    }

    pub fn to_rgba(&self, mode: NormalizeMode) -> Rgba {
        self.to_rgb().to_rgba(mode)
    }

    pub fn to_rgbwa(&self, mode: NormalizeMode) -> Rgbwa {
        self.to_rgb().to_rgbwa(mode)
    }
}

impl Blend for Hsv {
    fn alpha(&self) -> u8 {
        self.alpha
    }

    fn fade(&self, other: &Self, factor: f64, mode: BlendMode) -> Self {
        if mode == BlendMode::Replace {
            return *other;
        }

        Self {
            hue: fade_component(self.hue, other.hue, factor, mode, 359),
            saturation: fade_component(
                self.saturation.into(),
                other.saturation.into(),
                factor,
                mode,
                100,
            ) as u8,
            value: fade_component(self.value.into(), other.value.into(), factor, mode, 100) as u8,
            alpha: self.alpha,
        }
    }
}

fn fade_component(current: u16, other: u16, factor: f64, mode: BlendMode, max: u16) -> u16 {
    let (c, o) = (f64::from(current), f64::from(other));
    let faded = match mode {
        BlendMode::Replace => o,
        BlendMode::Average => c + factor * (o - c),
        BlendMode::Add => c + factor * o,
        BlendMode::Subtract => c - factor * o,
    };

    faded.round().max(0.0).min(f64::from(max)) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primaries() {
        assert_eq!(Hsv::new(0, 100, 100).to_rgb(), Rgb::new(255, 0, 0));
        assert_eq!(Hsv::new(120, 100, 100).to_rgb(), Rgb::new(0, 255, 0));
        assert_eq!(Hsv::new(240, 100, 100).to_rgb(), Rgb::new(0, 0, 255));
        assert_eq!(Hsv::new(77, 0, 100).to_rgb(), Rgb::WHITE);
        assert_eq!(Rgb::new(0, 0, 255).to_hsv(), Hsv::new(240, 100, 100));
    }

    #[test]
    fn test_new_clamps() {
        let hsv = Hsv::new(370, 150, 120);
        assert_eq!((hsv.hue, hsv.saturation, hsv.value), (10, 100, 100));
    }

    #[test]
    fn test_fade_stays_in_range() {
        let a = Hsv::new(300, 80, 90);
        let b = Hsv::new(200, 60, 70);
        assert_eq!(a.fade(&b, 1.0, BlendMode::Add), Hsv::new(359, 100, 100));
        assert_eq!(a.fade(&b, 0.5, BlendMode::Average), Hsv::new(250, 70, 80));
    }

    #[test]
    fn test_grey_has_no_hue() {
        let hsv = Rgb::new(128, 128, 128).to_hsv();
        assert_eq!(hsv.hue, 0);
        assert_eq!(hsv.saturation, 0);
    }
}
