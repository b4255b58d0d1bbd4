//! HTTP and real-time client for a single device

use std::{borrow::Cow, net::IpAddr, net::SocketAddr, sync::Arc, time::Duration};

use async_trait::async_trait;
use base64::prelude::*;
use chrono::{NaiveTime, Timelike, Utc};
use rand::Rng;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::{
    datagram::{frame_datagrams, MAX_CHUNK_SIZE},
    DatagramSink, DeviceError, DeviceGeneration, DeviceInfo, FirmwareVersionResponse,
    HttpTransport, LedColorResponse, LedLayout, LedMode, LedModeResponse, LoginResponse,
    MovieConfig, OutputLevel, ReqwestTransport, Response, Session, Timer, UdpSink, Version, Xled,
};
use crate::{
    color::{Color, NormalizeMode, Rgb, Rgbw},
    frame::PixelFrame,
    models,
};

/// Pixel mapping applied to every frame before it is streamed
pub type FrameTransform = Box<dyn Fn(&PixelFrame) -> PixelFrame + Send + Sync>;

/// Bytes per LED assumed when the device does not report it
pub const DEFAULT_BYTES_PER_LED: usize = 3;

/// Properties of a device read at connection time
#[derive(Debug, Clone)]
pub struct DeviceDescriptor {
    pub info: DeviceInfo,
    pub firmware: Option<Version>,
    pub generation: DeviceGeneration,
    pub bytes_per_led: usize,
    pub layout: Option<LedLayout>,
    pub movie_config: Option<MovieConfig>,
}

pub struct DeviceClient {
    name: String,
    address: IpAddr,
    base_url: String,
    width: usize,
    height: usize,
    normalize: NormalizeMode,
    chunk_size: usize,
    transport: Arc<dyn HttpTransport>,
    sink: Box<dyn DatagramSink>,
    transform: Option<FrameTransform>,
    session: Session,
    descriptor: Option<DeviceDescriptor>,
    notified_missing_descriptor: bool,
}

impl DeviceClient {
    /// Create a client talking to a device over HTTP and UDP
    pub fn from_config(
        name: &str,
        device: &models::Device,
        config: &models::Config,
    ) -> Result<Self, DeviceError> {
        let transport = Arc::new(ReqwestTransport::new(Duration::from_millis(
            config.http.timeout_ms,
        ))?);
        let port = device.streaming_port.unwrap_or(config.streaming.port);
        let sink = Box::new(UdpSink::new(SocketAddr::new(device.address, port)));

        Ok(Self::with_io(
            name,
            device,
            config.streaming.chunk_size,
            transport,
            sink,
        ))
    }

    /// Create a client on top of the given I/O endpoints
    pub fn with_io(
        name: &str,
        device: &models::Device,
        chunk_size: usize,
        transport: Arc<dyn HttpTransport>,
        sink: Box<dyn DatagramSink>,
    ) -> Self {
        Self {
            name: name.to_owned(),
            address: device.address,
            base_url: format!("http://{}/{}", device.address, device.api_root),
            width: device.width,
            height: device.height,
            normalize: device.normalize,
            chunk_size: chunk_size.max(1).min(MAX_CHUNK_SIZE),
            transport,
            sink,
            transform: None,
            session: Session::new(),
            descriptor: None,
            notified_missing_descriptor: false,
        }
    }

    pub fn with_transform(mut self, transform: FrameTransform) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> IpAddr {
        self.address
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn descriptor(&self) -> Option<&DeviceDescriptor> {
        self.descriptor.as_ref()
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    /// Log in and load the device descriptor
    ///
    /// Returns `false` if the device could not be reached. Real-time frames are still
    /// streamed with default settings, and the descriptor is loaded again on the next
    /// successful login.
    #[instrument(skip(self), fields(device = %self.name))]
    pub async fn connect(&mut self) -> bool {
        self.login().await && self.load_descriptor().await
    }

    async fn load_descriptor(&mut self) -> bool {
        let info = match self.device_info().await {
            Some(info) => info,
            None => return false,
        };

        let firmware = self.firmware_version().await.and_then(|response| {
            response
                .version
                .parse::<Version>()
                .map_err(|error| warn!(%error, "unknown firmware version"))
                .ok()
        });

        let layout = self.led_layout().await;
        let movie_config = self.movie_config().await;

        let descriptor = DeviceDescriptor {
            generation: DeviceGeneration::from_firmware(
                info.fw_family.as_deref(),
                firmware.as_ref(),
            ),
            bytes_per_led: info.bytes_per_led.unwrap_or(DEFAULT_BYTES_PER_LED),
            info,
            firmware,
            layout,
            movie_config,
        };

        info!(
            product = %descriptor.info.product_name,
            firmware = ?descriptor.firmware.map(|v| v.to_string()),
            generation = ?descriptor.generation,
            leds = descriptor.info.number_of_led,
            "connected"
        );

        self.descriptor = Some(descriptor);
        true
    }

    async fn do_login(&mut self) -> Result<(), DeviceError> {
        let mut challenge = [0u8; 32];
        rand::rng().fill(&mut challenge);

        let body = json!({ "challenge": BASE64_STANDARD.encode(challenge) });
        let response: LoginResponse =
            serde_json::from_value(self.transport.post(&self.url("login"), None, &body).await?)?;

        self.session.begin(
            response.authentication_token,
            response.authentication_token_expires_in,
            Utc::now(),
        );
        debug!(expires_at = ?self.session.expires_at(), "received token");

        let body = json!({ "challenge_response": response.challenge_response });
        let verify: Response = serde_json::from_value(
            self.transport
                .post(&self.url("verify"), self.session.token(), &body)
                .await?,
        )?;

        if !verify.code.is_ok() {
            return Err(DeviceError::Rejected(verify.code));
        }

        self.session.confirm();
        Ok(())
    }

    /// Log in again when the token is missing or about to expire
    pub async fn refresh_token_if_needed(&mut self) -> bool {
        if self.session.needs_login(Utc::now()) {
            self.session.clear();
            self.login().await
        } else {
            true
        }
    }

    async fn get<T: DeserializeOwned>(&mut self, endpoint: &str) -> Option<T> {
        self.refresh_token_if_needed().await;

        let result = match self
            .transport
            .get(&self.url(endpoint), self.session.token())
            .await
        {
            Ok(value) => serde_json::from_value(value).map_err(DeviceError::from),
            Err(error) => Err(error),
        };

        result
            .map_err(|error| warn!(device = %self.name, %endpoint, %error, "GET failed"))
            .ok()
    }

    async fn post<T: DeserializeOwned>(&mut self, endpoint: &str, body: Value) -> Option<T> {
        self.refresh_token_if_needed().await;

        let result = match self
            .transport
            .post(&self.url(endpoint), self.session.token(), &body)
            .await
        {
            Ok(value) => serde_json::from_value(value).map_err(DeviceError::from),
            Err(error) => Err(error),
        };

        result
            .map_err(|error| warn!(device = %self.name, %endpoint, %error, "POST failed"))
            .ok()
    }

    pub async fn device_info(&mut self) -> Option<DeviceInfo> {
        self.get("gestalt").await
    }

    pub async fn firmware_version(&mut self) -> Option<FirmwareVersionResponse> {
        self.get("fw/version").await
    }

    pub async fn led_layout(&mut self) -> Option<LedLayout> {
        self.get("led/layout/full").await
    }

    pub async fn movie_config(&mut self) -> Option<MovieConfig> {
        self.get("led/movie/config").await
    }

    pub async fn network_status(&mut self) -> Option<Value> {
        self.get("network/status").await
    }

    pub async fn timer(&mut self) -> Option<Timer> {
        self.get("timer").await
    }

    /// Program the daily on and off times, in UTC
    pub async fn set_timer(
        &mut self,
        time_on: Option<NaiveTime>,
        time_off: Option<NaiveTime>,
    ) -> Option<Response> {
        let seconds = |time: Option<NaiveTime>| {
            time.map(|t| t.num_seconds_from_midnight() as i32)
                .unwrap_or(-1)
        };

        let timer = Timer {
            time_now: Utc::now().time().num_seconds_from_midnight() as i32,
            time_on: seconds(time_on),
            time_off: seconds(time_off),
            ..Default::default()
        };

        match serde_json::to_value(&timer) {
            Ok(body) => self.post("timer", body).await,
            Err(error) => {
                warn!(%error, "invalid timer");
                None
            }
        }
    }

    pub async fn reset(&mut self) -> Option<Response> {
        self.get("led/reset").await
    }
}

#[async_trait]
impl Xled for DeviceClient {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn is_sync_master(&self) -> bool {
        self.descriptor
            .as_ref()
            .and_then(|d| d.movie_config.as_ref())
            .map(MovieConfig::is_sync_master)
            .unwrap_or(false)
    }

    #[instrument(skip(self), fields(device = %self.name))]
    async fn login(&mut self) -> bool {
        if self.session.is_logged_in() {
            return true;
        }

        match self.do_login().await {
            Ok(()) => {
                debug!("logged in");
                true
            }
            Err(error) => {
                self.session.clear();
                warn!(%error, "login failed");
                false
            }
        }
    }

    fn is_logged_in(&self) -> bool {
        self.session.is_logged_in()
    }

    async fn logout(&mut self) {
        let _: Option<Response> = self.post("logout", json!({})).await;
        self.session.clear();
    }

    async fn status(&mut self) -> Option<Response> {
        self.get("status").await
    }

    async fn led_mode(&mut self) -> Option<LedMode> {
        let response: LedModeResponse = self.get("led/mode").await?;

        response
            .mode
            .parse()
            .map_err(|_| warn!(device = %self.name, mode = %response.mode, "unknown led mode"))
            .ok()
    }

    async fn set_led_mode(&mut self, mode: LedMode) -> Option<Response> {
        let mode: &'static str = mode.into();
        self.post("led/mode", json!({ "mode": mode })).await
    }

    async fn brightness(&mut self) -> Option<f64> {
        let level: OutputLevel = self.get("led/out/brightness").await?;
        Some(f64::from(level.value) / 100.0)
    }

    async fn set_brightness(&mut self, brightness: f64) -> Option<Response> {
        let value = (brightness.max(0.0).min(1.0) * 100.0).round() as i32;
        self.post(
            "led/out/brightness",
            json!({ "mode": "enabled", "type": "A", "value": value }),
        )
        .await
    }

    async fn saturation(&mut self) -> Option<f64> {
        let level: OutputLevel = self.get("led/out/saturation").await?;
        Some(f64::from(level.value) / 100.0)
    }

    async fn set_saturation(&mut self, saturation: f64) -> Option<Response> {
        let value = (saturation.max(0.0).min(1.0) * 100.0).round() as i32;
        self.post(
            "led/out/saturation",
            json!({ "mode": "enabled", "type": "A", "value": value }),
        )
        .await
    }

    async fn color(&mut self) -> Option<Color> {
        let response: LedColorResponse = self.get("led/color").await?;

        Some(match response.white {
            Some(white) => Rgbw::new(response.red, response.green, response.blue, white).into(),
            None => Rgb::new(response.red, response.green, response.blue).into(),
        })
    }

    async fn set_color(&mut self, color: Color) -> Option<Response> {
        let body = match color {
            Color::Rgb(c) => json!({ "red": c.red, "green": c.green, "blue": c.blue }),
            Color::Rgbw(c) => {
                json!({ "red": c.red, "green": c.green, "blue": c.blue, "white": c.white })
            }
            Color::Hsv(c) => json!({
                "hue": c.hue,
                "saturation": (f64::from(c.saturation) * 255.0 / 100.0).round() as u8,
                "value": (f64::from(c.value) * 255.0 / 100.0).round() as u8,
            }),
            other => {
                warn!(device = %self.name, kind = ?other.kind(), "color sent as RGB");
                let c = other.to_rgb();
                json!({ "red": c.red, "green": c.green, "blue": c.blue })
            }
        };

        self.post("led/color", body).await
    }

    async fn show_real_time_frame(&mut self, frame: &PixelFrame) {
        let relogin = self.session.needs_login(Utc::now());
        self.refresh_token_if_needed().await;

        if self.descriptor.is_none()
            && self.session.is_logged_in()
            && (relogin || !self.notified_missing_descriptor)
        {
            self.load_descriptor().await;
        }

        let (generation, bytes_per_led) = match &self.descriptor {
            Some(descriptor) => (descriptor.generation, descriptor.bytes_per_led),
            None => {
                if !self.notified_missing_descriptor {
                    warn!(device = %self.name, "device descriptor unavailable, using defaults");
                    self.notified_missing_descriptor = true;
                }

                (
                    DeviceGeneration::from_firmware(None, None),
                    DEFAULT_BYTES_PER_LED,
                )
            }
        };

        let frame = match &self.transform {
            Some(transform) => Cow::Owned(transform(frame)),
            None => Cow::Borrowed(frame),
        };

        let payload = frame.to_byte_array_normalized(bytes_per_led, self.normalize);
        let datagrams = frame_datagrams(
            generation,
            &self.session.token_bytes(),
            &payload,
            self.chunk_size,
        );

        for datagram in datagrams {
            if let Err(error) = self.sink.send(&datagram).await {
                warn!(device = %self.name, %error, "failed to send frame");
            }
        }
    }
}
