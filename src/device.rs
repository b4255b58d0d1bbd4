//! Control and real-time streaming of Twinkly-class LED devices

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::{color::Color, frame::PixelFrame, sequence::FrameSequence};

mod array;
pub use array::*;

mod client;
pub use client::*;

pub mod datagram;
pub use datagram::DeviceGeneration;

mod discovery;
pub use discovery::*;

#[cfg(test)]
pub(crate) mod fake;

mod response;
pub use response::*;

mod session;
pub use session::Session;

mod transport;
pub use transport::*;

/// UDP port receiving real-time frames
pub const STREAMING_PORT: u16 = 7777;
/// UDP port answering discovery broadcasts
pub const DISCOVERY_PORT: u16 = 5555;
/// UDP port of the music sync feature
pub const MUSIC_PORT: u16 = 5556;
/// Request header carrying the session token
pub const AUTH_HEADER: &str = "X-Auth-Token";
pub const DEFAULT_API_ROOT: &str = "xled/v1";
pub const HTTP_TIMEOUT: Duration = Duration::from_millis(5000);

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("request rejected by device: {0:?}")]
    Rejected(ResponseCode),
}

/// Capabilities shared by a single device and by a grid of devices
///
/// Failures are logged and reported as `None` or `false`, they never interrupt the caller.
#[async_trait]
pub trait Xled: Send {
    /// Width of the addressable surface, in pixels
    fn width(&self) -> usize;

    /// Height of the addressable surface, in pixels
    fn height(&self) -> usize;

    /// Whether this device leads the firmware-level synchronization group
    fn is_sync_master(&self) -> bool {
        false
    }

    async fn login(&mut self) -> bool;

    fn is_logged_in(&self) -> bool;

    async fn logout(&mut self);

    async fn status(&mut self) -> Option<Response>;

    async fn led_mode(&mut self) -> Option<LedMode>;

    async fn set_led_mode(&mut self, mode: LedMode) -> Option<Response>;

    /// Switch the LEDs on, using the first stored content the device accepts
    async fn power_on(&mut self) -> Option<Response> {
        for &mode in &[LedMode::Playlist, LedMode::Movie, LedMode::Effect] {
            match self.set_led_mode(mode).await {
                Some(response) if response.code.is_ok() => return Some(response),
                _ => {}
            }
        }

        None
    }

    async fn power_off(&mut self) -> Option<Response> {
        self.set_led_mode(LedMode::Off).await
    }

    /// Brightness in `[0, 1]`
    async fn brightness(&mut self) -> Option<f64>;

    async fn set_brightness(&mut self, brightness: f64) -> Option<Response>;

    /// Saturation in `[0, 1]`
    async fn saturation(&mut self) -> Option<f64>;

    async fn set_saturation(&mut self, saturation: f64) -> Option<Response>;

    /// Color shown in `Color` mode
    async fn color(&mut self) -> Option<Color>;

    async fn set_color(&mut self, color: Color) -> Option<Response>;

    /// Send one frame to the real-time endpoint
    async fn show_real_time_frame(&mut self, frame: &PixelFrame);

    /// Stream the frames of `sequence` with its frame delay, `-1` loops forever
    async fn show_real_time_sequence(&mut self, sequence: &FrameSequence, loop_count: i32) {
        if sequence.frames().next().is_none() {
            return;
        }

        let mut remaining = loop_count;
        while remaining == -1 || remaining > 0 {
            for frame in sequence.frames() {
                self.show_real_time_frame(frame).await;
                tokio::time::sleep(sequence.frame_delay()).await;
            }

            if remaining > 0 {
                remaining -= 1;
            }
        }
    }
}
