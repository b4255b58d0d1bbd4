//! Payloads exchanged with the device HTTP API

use std::str::FromStr;

use regex::Regex;
use serde_derive::{Deserialize, Serialize};
use strum_macros::{EnumString, IntoStaticStr};

/// Result code found in every device response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "u32")]
pub enum ResponseCode {
    Ok,
    Error,
    InvalidArgumentValue,
    Error2,
    ValueTooLong,
    MalformedJson,
    InvalidArgumentKey,
    Ok2,
    Ok3,
    UpdateErrorSha,
    Unknown(u32),
}

impl ResponseCode {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok | Self::Ok2 | Self::Ok3)
    }
}

impl Default for ResponseCode {
    fn default() -> Self {
        Self::Unknown(0)
    }
}

impl From<u32> for ResponseCode {
    fn from(code: u32) -> Self {
        match code {
            1000 => Self::Ok,
            1001 => Self::Error,
            1101 => Self::InvalidArgumentValue,
            1102 => Self::Error2,
            1103 => Self::ValueTooLong,
            1104 => Self::MalformedJson,
            1105 => Self::InvalidArgumentKey,
            1107 => Self::Ok2,
            1108 => Self::Ok3,
            1205 => Self::UpdateErrorSha,
            other => Self::Unknown(other),
        }
    }
}

/// Response carrying only a result code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub code: ResponseCode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub authentication_token: String,
    /// Token lifetime in seconds
    pub authentication_token_expires_in: u64,
    #[serde(rename = "challenge-response")]
    pub challenge_response: String,
    #[serde(default)]
    pub code: ResponseCode,
}

/// Device descriptor returned by `gestalt`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeviceInfo {
    pub product_name: String,
    pub product_code: String,
    pub hardware_version: String,
    pub device_name: String,
    pub fw_family: Option<String>,
    pub bytes_per_led: Option<usize>,
    pub number_of_led: usize,
    pub led_profile: String,
    pub led_type: u32,
    pub max_supported_led: usize,
    pub frame_rate: f64,
    pub movie_capacity: u32,
    pub mac: String,
    pub uuid: String,
    pub uptime: String,
    pub code: ResponseCode,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FirmwareVersionResponse {
    pub version: String,
    pub code: ResponseCode,
}

/// Dotted firmware version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, derive_more::Display)]
#[display("{major}.{minor}.{patch}")]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid firmware version: {0}")]
pub struct ParseVersionError(String);

impl FromStr for Version {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lazy_static::lazy_static! {
            static ref VERSION_REGEX: Regex = Regex::new(r"^\s*(\d+)(?:\.(\d+))?(?:\.(\d+))?").unwrap();
        }

        let captures = VERSION_REGEX
            .captures(s)
            .ok_or_else(|| ParseVersionError(s.to_owned()))?;
        let part = |i: usize| -> Result<u32, ParseVersionError> {
            captures
                .get(i)
                .map(|m| m.as_str().parse().map_err(|_| ParseVersionError(s.to_owned())))
                .unwrap_or(Ok(0))
        };

        Ok(Self::new(part(1)?, part(2)?, part(3)?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct LedCoordinate {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LedLayout {
    pub source: String,
    pub synthesized: bool,
    pub coordinates: Vec<LedCoordinate>,
    pub code: ResponseCode,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MovieSync {
    pub mode: String,
    pub master_id: String,
    pub slave_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MovieConfig {
    pub frame_delay: u32,
    pub leds_number: u32,
    pub loop_type: u32,
    pub frames_number: u32,
    pub sync: Option<MovieSync>,
    pub code: ResponseCode,
}

impl MovieConfig {
    pub fn is_sync_master(&self) -> bool {
        self.sync.as_ref().map(|s| s.mode == "master").unwrap_or(false)
    }
}

/// Operating mode of the LED output
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LedMode {
    Movie,
    Playlist,
    /// Real-time streaming over UDP
    Rt,
    Demo,
    Effect,
    Color,
    Off,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LedModeResponse {
    pub mode: String,
    pub code: ResponseCode,
}

/// Brightness or saturation level, in percent
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputLevel {
    pub mode: String,
    pub value: i32,
    pub code: ResponseCode,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LedColorResponse {
    pub hue: u16,
    pub saturation: u8,
    pub value: u8,
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub white: Option<u8>,
    pub code: ResponseCode,
}

/// Timer settings, as seconds after midnight UTC, `-1` disabling a switch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Timer {
    pub time_now: i32,
    pub time_on: i32,
    pub time_off: i32,
    #[serde(skip_serializing)]
    pub tz: String,
    #[serde(skip_serializing)]
    pub code: ResponseCode,
}
