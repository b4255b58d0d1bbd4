//! Real-time playback of sequences on a device

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use rand::{seq::IndexedRandom, Rng};
use strum::IntoEnumIterator;
use tokio::{
    task::{JoinError, JoinHandle},
    time::Instant,
};

use super::{FrameSequence, Playable, TransitionDirection, TransitionType, DEFAULT_TRANSITION_DELAY};
use crate::{
    color::BlendMode,
    device::{LedMode, Xled},
    frame::{PixelFrame, Rotation},
};

/// Devices leave real-time mode after this long without being told to stay in it
pub const REAL_TIME_KEEPALIVE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayOptions {
    /// Number of passes over the sequence, `-1` to loop until stopped
    pub loop_count: i32,
    /// Play entries in random order, never repeating the previous one
    pub random: bool,
    pub transition: TransitionType,
    /// Transition direction, random among the supported ones if `None`
    pub direction: Option<TransitionDirection>,
    /// Transition blend mode, random if `None`
    pub blend_mode: Option<BlendMode>,
    pub transition_duration: Duration,
}

impl Default for PlayOptions {
    fn default() -> Self {
        Self {
            loop_count: 1,
            random: false,
            transition: TransitionType::Straight,
            direction: Some(TransitionDirection::LeftRight),
            blend_mode: Some(BlendMode::Replace),
            transition_duration: Duration::from_secs(2),
        }
    }
}

/// Cooperative stop flag of a playback
#[derive(Debug, Clone)]
pub struct PlaybackHandle {
    running: Arc<AtomicBool>,
}

impl PlaybackHandle {
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Ask the playback to stop after the frame being shown
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Default for PlaybackHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Playback running on its own task
pub struct PlaybackTask<X> {
    pub handle: PlaybackHandle,
    /// Resolves to the target once playback is over
    pub join: JoinHandle<X>,
}

impl<X> PlaybackTask<X> {
    pub async fn stop(self) -> Result<X, JoinError> {
        self.handle.stop();
        self.join.await
    }
}

/// Index of the next entry, different from `previous` when possible
fn random_index(len: usize, previous: Option<usize>) -> usize {
    let mut rng = rand::rng();

    loop {
        let index = rng.random_range(0..len);
        if len == 1 || Some(index) != previous {
            return index;
        }
    }
}

fn random_blend_mode() -> BlendMode {
    let modes: Vec<_> = BlendMode::iter().collect();
    *modes.choose(&mut rand::rng()).unwrap_or(&BlendMode::Replace)
}

struct Player<'a, X: ?Sized> {
    target: &'a mut X,
    options: &'a PlayOptions,
    handle: &'a PlaybackHandle,
    last_keepalive: Instant,
}

impl<'a, X: Xled + ?Sized> Player<'a, X> {
    async fn enter_real_time(&mut self) {
        if self.target.set_led_mode(LedMode::Rt).await.is_none() {
            warn!("failed to enter real-time mode");
        }

        self.last_keepalive = Instant::now();
    }

    async fn keepalive(&mut self) {
        if self.last_keepalive.elapsed() >= REAL_TIME_KEEPALIVE {
            self.enter_real_time().await;
        }
    }

    /// Rotate `frame` for the target, `None` if it does not fit
    fn prepare(&self, frame: &PixelFrame, rotation: Rotation) -> Option<PixelFrame> {
        let frame = frame.rotate(rotation);
        let expected = (self.target.width(), self.target.height());

        if frame.dimensions() != expected {
            warn!(
                found = ?frame.dimensions(),
                ?expected,
                "skipping frame that does not fit the target"
            );
            return None;
        }

        Some(frame)
    }

    async fn run(&mut self, sequence: &FrameSequence) {
        self.enter_real_time().await;

        if sequence.is_empty() {
            return;
        }

        let mut remaining = self.options.loop_count;
        let mut previous: Option<usize> = None;

        while self.handle.is_running() && (remaining == -1 || remaining > 0) {
            for position in 0..sequence.len() {
                if !self.handle.is_running() {
                    break;
                }

                let index = if self.options.random {
                    random_index(sequence.len(), previous)
                } else {
                    position
                };
                let entry = &sequence.entries()[index];

                if let Some(previous) = previous {
                    if self.options.transition != TransitionType::Straight {
                        self.show_transition(sequence, &sequence.entries()[previous], entry)
                            .await;
                    }
                }

                self.show_entry(sequence, entry).await;
                previous = Some(index);
            }

            if remaining > 0 {
                remaining -= 1;
            }
        }
    }

    async fn show_transition(&mut self, sequence: &FrameSequence, from: &Playable, to: &Playable) {
        let transition = self.options.transition;
        let direction = self
            .options
            .direction
            .unwrap_or_else(|| transition.random_direction());
        let blend_mode = self.options.blend_mode.unwrap_or_else(random_blend_mode);

        let frames = match transition.transition_sequence(
            from,
            to,
            direction,
            blend_mode,
            DEFAULT_TRANSITION_DELAY,
            self.options.transition_duration,
        ) {
            Ok(frames) => frames,
            Err(error) => {
                warn!(%error, "skipping transition");
                return;
            }
        };

        for frame in frames.frames() {
            if !self.handle.is_running() {
                break;
            }

            if let Some(frame) = self.prepare(frame, sequence.rotation()) {
                self.keepalive().await;
                self.target.show_real_time_frame(&frame).await;
            }

            tokio::time::sleep(frames.frame_delay()).await;
        }
    }

    async fn show_entry(&mut self, sequence: &FrameSequence, entry: &Playable) {
        match entry {
            Playable::Frame(frame) => {
                let frame = match self.prepare(frame, sequence.rotation()) {
                    Some(frame) => frame,
                    None => return,
                };

                let frame_delay = frame.frame_delay().max(Duration::from_millis(1));
                let repetitions =
                    (sequence.frame_delay().as_millis() / frame_delay.as_millis()).max(1);

                for _ in 0..repetitions {
                    if !self.handle.is_running() {
                        break;
                    }

                    self.show_frame_for(&frame, frame_delay).await;
                }
            }
            Playable::Sequence(nested) => {
                if nested.is_empty() {
                    return;
                }

                let pass = nested.frame_delay().as_millis() * nested.len() as u128;
                let loop_count = (sequence.frame_delay().as_millis() / pass.max(1)).max(1);

                self.keepalive().await;
                self.target
                    .show_real_time_sequence(nested, loop_count.min(i32::MAX as u128) as i32)
                    .await;
            }
        }
    }

    /// Keep `frame` on the target for `duration`, re-sending it between keepalives
    async fn show_frame_for(&mut self, frame: &PixelFrame, duration: Duration) {
        let mut remaining = duration;

        loop {
            self.keepalive().await;
            self.target.show_real_time_frame(frame).await;

            let slice = remaining.min(REAL_TIME_KEEPALIVE);
            tokio::time::sleep(slice).await;
            remaining -= slice;

            if remaining == Duration::from_secs(0) || !self.handle.is_running() {
                break;
            }
        }
    }
}

impl FrameSequence {
    /// Stream this sequence to `target` until done or stopped through `handle`
    #[instrument(skip_all, fields(entries = self.len()))]
    pub async fn play<X: Xled + ?Sized>(
        &self,
        target: &mut X,
        options: &PlayOptions,
        handle: &PlaybackHandle,
    ) {
        let mut player = Player {
            target,
            options,
            handle,
            last_keepalive: Instant::now(),
        };

        player.run(self).await;
        debug!("playback finished");
    }

    /// Play on a new task, the target is handed back when it ends
    pub fn play_async<X: Xled + 'static>(self, mut target: X, options: PlayOptions) -> PlaybackTask<X> {
        let handle = PlaybackHandle::new();
        let task_handle = handle.clone();

        let join = tokio::spawn(async move {
            self.play(&mut target, &options, &task_handle).await;
            target
        });

        PlaybackTask { handle, join }
    }
}

impl Playable {
    fn into_sequence(self) -> FrameSequence {
        match self {
            Playable::Frame(frame) => {
                let mut sequence = FrameSequence::new(frame.frame_delay());
                sequence.push(frame);
                sequence
            }
            Playable::Sequence(sequence) => sequence,
        }
    }

    pub async fn play<X: Xled + ?Sized>(
        &self,
        target: &mut X,
        options: &PlayOptions,
        handle: &PlaybackHandle,
    ) {
        match self {
            Playable::Frame(_) => {
                self.clone()
                    .into_sequence()
                    .play(target, options, handle)
                    .await
            }
            Playable::Sequence(sequence) => sequence.play(target, options, handle).await,
        }
    }

    pub fn play_async<X: Xled + 'static>(self, target: X, options: PlayOptions) -> PlaybackTask<X> {
        self.into_sequence().play_async(target, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{color::Rgb, device::fake::FakeXled};

    fn frame(red: u8, delay_ms: u64) -> PixelFrame {
        PixelFrame::new(2, 2, Rgb::new(red, 0, 0)).with_frame_delay(Duration::from_millis(delay_ms))
    }

    fn reds(target: &FakeXled) -> Vec<u8> {
        target
            .frames()
            .iter()
            .map(|f| f.get(0, 0).to_rgb().red)
            .collect()
    }

    fn sequence(delay_ms: u64, frames: &[PixelFrame]) -> FrameSequence {
        let mut sequence = FrameSequence::new(Duration::from_millis(delay_ms));
        for frame in frames {
            sequence.push(frame.clone());
        }
        sequence
    }

    fn close_to(actual: Duration, expected: Duration) -> bool {
        actual >= expected && actual < expected + Duration::from_millis(10)
    }

    async fn play(sequence: &FrameSequence, target: &mut FakeXled, options: PlayOptions) {
        sequence
            .play(target, &options, &PlaybackHandle::new())
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequential_loops() {
        let mut target = FakeXled::new(2, 2);
        let sequence = sequence(100, &[frame(1, 100), frame(2, 100), frame(3, 100)]);

        play(
            &sequence,
            &mut target,
            PlayOptions {
                loop_count: 2,
                ..Default::default()
            },
        )
        .await;

        assert_eq!(target.modes(), vec![LedMode::Rt]);
        assert_eq!(reds(&target), vec![1, 2, 3, 1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repetitions() {
        let mut target = FakeXled::new(2, 2);
        let sequence = sequence(300, &[frame(1, 100), frame(2, 200)]);

        let start = Instant::now();
        play(&sequence, &mut target, PlayOptions::default()).await;

        assert_eq!(reds(&target), vec![1, 1, 1, 2]);
        assert!(close_to(start.elapsed(), Duration::from_millis(500)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_keepalive_on_long_frames() {
        let mut target = FakeXled::new(2, 2);
        let sequence = sequence(100, &[frame(1, 12_000)]);

        play(&sequence, &mut target, PlayOptions::default()).await;

        assert_eq!(reds(&target), vec![1, 1, 1]);
        assert_eq!(target.modes(), vec![LedMode::Rt; 3]);

        let state = target.state.lock().unwrap();
        let times: Vec<_> = state.frames.iter().map(|(t, _)| *t).collect();
        assert!(close_to(times[1] - times[0], REAL_TIME_KEEPALIVE));
        assert!(close_to(times[2] - times[1], REAL_TIME_KEEPALIVE));
    }

    #[tokio::test(start_paused = true)]
    async fn test_skips_mismatched_frames() {
        let mut target = FakeXled::new(2, 2);
        let mut sequence = sequence(100, &[frame(1, 100)]);
        sequence.push(PixelFrame::new(3, 3, Rgb::WHITE));
        sequence.push(frame(2, 100));

        play(&sequence, &mut target, PlayOptions::default()).await;

        assert_eq!(reds(&target), vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rotation() {
        let mut target = FakeXled::new(3, 2);
        let mut tall = PixelFrame::new(2, 3, Rgb::BLACK);
        tall.set(0, 0, Rgb::WHITE);
        let mut sequence = FrameSequence::new(Duration::from_millis(100)).with_rotation(Rotation::Left);
        sequence.push(tall.clone());

        play(&sequence, &mut target, PlayOptions::default()).await;

        assert_eq!(target.frames(), vec![tall.rotate_left()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_random_never_repeats() {
        let mut target = FakeXled::new(2, 2);
        let sequence = sequence(100, &[frame(1, 100), frame(2, 100), frame(3, 100)]);

        play(
            &sequence,
            &mut target,
            PlayOptions {
                loop_count: 10,
                random: true,
                ..Default::default()
            },
        )
        .await;

        let reds = reds(&target);
        assert_eq!(reds.len(), 30);
        assert!(reds.windows(2).all(|w| w[0] != w[1]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transition_between_entries() {
        let mut target = FakeXled::new(2, 2);
        let sequence = sequence(100, &[frame(255, 100), frame(0, 100)]);

        play(
            &sequence,
            &mut target,
            PlayOptions {
                transition: TransitionType::Fade,
                transition_duration: Duration::from_secs(1),
                ..Default::default()
            },
        )
        .await;

        // Factors 0, 25, ..., 250
        let reds = reds(&target);
        assert_eq!(reds.len(), 1 + 11 + 1);
        assert_eq!(reds[0], 255);
        assert_eq!(reds[1], 255);
        assert!(reds[1..12].windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(reds[12], 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_nested_sequence() {
        let mut target = FakeXled::new(2, 2);
        let mut outer = FrameSequence::new(Duration::from_millis(1000));
        outer.push(sequence(100, &[frame(1, 100), frame(2, 100)]));

        play(&outer, &mut target, PlayOptions::default()).await;

        assert_eq!(reds(&target), [1u8, 2].repeat(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_frame() {
        let mut target = FakeXled::new(2, 2);
        Playable::from(frame(7, 100))
            .play(&mut target, &PlayOptions::default(), &PlaybackHandle::new())
            .await;

        assert_eq!(reds(&target), vec![7]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_async_playback() {
        let target = FakeXled::new(2, 2);
        let sequence = sequence(100, &[frame(1, 100), frame(2, 100)]);

        let task = sequence.play_async(
            target.clone(),
            PlayOptions {
                loop_count: -1,
                ..Default::default()
            },
        );
        assert!(task.handle.is_running());

        tokio::time::sleep(Duration::from_millis(1050)).await;
        task.stop().await.unwrap();

        let shown = target.frames().len();
        assert!(shown >= 10 && shown <= 12, "{} frames shown", shown);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(target.frames().len(), shown);
    }
}
