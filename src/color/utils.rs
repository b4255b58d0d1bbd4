//! Channel arithmetic shared by the color variants

use super::{BlendMode, ColorError, AMBER_FACTOR};

/// Round and clamp a floating point channel value to the `[0, 255]` range
pub fn clamp_channel(value: f64) -> u8 {
    value.round().max(0.0).min(255.0) as u8
}

/// Combine one channel of two colors
///
/// # Parameters
///
/// * `current`: channel value of the color being faded
/// * `other`: channel value of the color faded towards
/// * `factor`: progress of the fade, in `[0, 1]`
/// * `mode`: combination policy
pub fn fade_channel(current: u8, other: u8, factor: f64, mode: BlendMode) -> u8 {
    let (c, o) = (f64::from(current), f64::from(other));

    match mode {
        BlendMode::Replace => other,
        BlendMode::Average => clamp_channel(c + factor * (o - c)),
        BlendMode::Add => clamp_channel(c + factor * o),
        BlendMode::Subtract => clamp_channel(c - factor * o),
    }
}

pub fn multiply_channel(channel: u8, factor: f64) -> u8 {
    clamp_channel(f64::from(channel) * factor)
}

/// Green contribution of an amber LED driven at `amber`
pub fn amber_green(amber: u8) -> u8 {
    clamp_channel(f64::from(amber) * AMBER_FACTOR)
}

/// Parse a hexadecimal color literal with exactly `digits` digits
///
/// Accepts an optional `#` or `0x` prefix.
pub fn parse_hex(s: &str, digits: usize) -> Result<u64, ColorError> {
    let trimmed = s.trim();
    let hex = trimmed
        .strip_prefix('#')
        .or_else(|| trimmed.strip_prefix("0x"))
        .unwrap_or(trimmed);

    if hex.len() != digits {
        return Err(ColorError::HexLength {
            expected: digits,
            found: hex.len(),
        });
    }

    Ok(u64::from_str_radix(hex, 16)?)
}

/// Extract the byte at `shift` bits of a packed color value
pub fn byte_at(value: u64, shift: u32) -> u8 {
    ((value >> shift) & 0xff) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fade_channel_bounds() {
        assert_eq!(fade_channel(200, 100, 1.0, BlendMode::Add), 255);
        assert_eq!(fade_channel(50, 100, 1.0, BlendMode::Subtract), 0);
        assert_eq!(fade_channel(0, 255, 0.5, BlendMode::Average), 128);
        assert_eq!(fade_channel(17, 42, 0.3, BlendMode::Replace), 42);
    }

    #[test]
    fn test_parse_hex_prefixes() {
        assert_eq!(parse_hex("#ff8000", 6).unwrap(), 0xff8000);
        assert_eq!(parse_hex("0xff8000", 6).unwrap(), 0xff8000);
        assert_eq!(parse_hex("ff8000", 6).unwrap(), 0xff8000);
        assert!(matches!(
            parse_hex("#fff", 6),
            Err(ColorError::HexLength {
                expected: 6,
                found: 3
            })
        ));
        assert!(matches!(parse_hex("zzzzzz", 6), Err(ColorError::InvalidHex(_))));
    }
}
