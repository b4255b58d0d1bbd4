//! In-memory [Xled] implementation recording what it is asked to do

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::time::Instant;

use super::{LedMode, Response, ResponseCode, Xled};
use crate::{color::Color, frame::PixelFrame};

#[derive(Debug, Default)]
pub struct FakeState {
    pub frames: Vec<(Instant, PixelFrame)>,
    pub modes: Vec<(Instant, LedMode)>,
    pub brightness: f64,
    pub color: Option<Color>,
    pub logged_in: bool,
    /// Make every control-plane call fail
    pub offline: bool,
}

#[derive(Clone)]
pub struct FakeXled {
    width: usize,
    height: usize,
    master: bool,
    pub state: Arc<Mutex<FakeState>>,
}

impl FakeXled {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            master: false,
            state: Default::default(),
        }
    }

    pub fn master(mut self) -> Self {
        self.master = true;
        self
    }

    pub fn frames(&self) -> Vec<PixelFrame> {
        self.state
            .lock()
            .unwrap()
            .frames
            .iter()
            .map(|(_, frame)| frame.clone())
            .collect()
    }

    pub fn modes(&self) -> Vec<LedMode> {
        self.state
            .lock()
            .unwrap()
            .modes
            .iter()
            .map(|(_, mode)| *mode)
            .collect()
    }

    fn respond(&self) -> Option<Response> {
        if self.state.lock().unwrap().offline {
            None
        } else {
            Some(Response {
                code: ResponseCode::Ok,
            })
        }
    }
}

#[async_trait]
impl Xled for FakeXled {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn is_sync_master(&self) -> bool {
        self.master
    }

    async fn login(&mut self) -> bool {
        let mut state = self.state.lock().unwrap();
        state.logged_in = !state.offline;
        state.logged_in
    }

    fn is_logged_in(&self) -> bool {
        self.state.lock().unwrap().logged_in
    }

    async fn logout(&mut self) {
        self.state.lock().unwrap().logged_in = false;
    }

    async fn status(&mut self) -> Option<Response> {
        self.respond()
    }

    async fn led_mode(&mut self) -> Option<LedMode> {
        self.respond()?;
        self.state.lock().unwrap().modes.last().map(|(_, mode)| *mode)
    }

    async fn set_led_mode(&mut self, mode: LedMode) -> Option<Response> {
        let response = self.respond()?;
        self.state
            .lock()
            .unwrap()
            .modes
            .push((Instant::now(), mode));
        Some(response)
    }

    async fn brightness(&mut self) -> Option<f64> {
        self.respond()?;
        Some(self.state.lock().unwrap().brightness)
    }

    async fn set_brightness(&mut self, brightness: f64) -> Option<Response> {
        let response = self.respond()?;
        self.state.lock().unwrap().brightness = brightness;
        Some(response)
    }

    async fn saturation(&mut self) -> Option<f64> {
        self.respond()?;
        Some(1.0)
    }

    async fn set_saturation(&mut self, _saturation: f64) -> Option<Response> {
        self.respond()
    }

    async fn color(&mut self) -> Option<Color> {
        self.respond()?;
        self.state.lock().unwrap().color
    }

    async fn set_color(&mut self, color: Color) -> Option<Response> {
        let response = self.respond()?;
        self.state.lock().unwrap().color = Some(color);
        Some(response)
    }

    async fn show_real_time_frame(&mut self, frame: &PixelFrame) {
        self.state
            .lock()
            .unwrap()
            .frames
            .push((Instant::now(), frame.clone()));
    }
}
