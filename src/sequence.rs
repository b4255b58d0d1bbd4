//! Ordered, nestable collections of frames and their playback

use std::{fmt, io::BufRead, io::Seek, path::Path, time::Duration};

use image::{codecs::gif::GifDecoder, AnimationDecoder};

use crate::{
    color::{BlendMode, Color},
    frame::{FrameError, PixelFrame, Rotation},
};

mod player;
pub use player::*;

mod transition;
pub use transition::*;

/// Delay between the frames of a new sequence
pub const DEFAULT_SEQUENCE_DELAY: Duration = Duration::from_millis(100);

/// Something that can be shown on a device
#[derive(Debug, Clone, PartialEq)]
pub enum Playable {
    Frame(PixelFrame),
    Sequence(FrameSequence),
}

impl Playable {
    pub fn frame_delay(&self) -> Duration {
        match self {
            Playable::Frame(frame) => frame.frame_delay(),
            Playable::Sequence(sequence) => sequence.frame_delay(),
        }
    }

    /// First frame, looking into nested sequences
    pub fn first_frame(&self) -> Option<&PixelFrame> {
        match self {
            Playable::Frame(frame) => Some(frame),
            Playable::Sequence(sequence) => sequence.first_frame(),
        }
    }

    /// Last frame, looking into nested sequences
    pub fn last_frame(&self) -> Option<&PixelFrame> {
        match self {
            Playable::Frame(frame) => Some(frame),
            Playable::Sequence(sequence) => sequence.last_frame(),
        }
    }

    pub fn to_byte_array(&self, bytes_per_led: usize) -> Vec<u8> {
        match self {
            Playable::Frame(frame) => frame.to_byte_array(bytes_per_led),
            Playable::Sequence(sequence) => sequence.to_byte_array(bytes_per_led),
        }
    }
}

impl From<PixelFrame> for Playable {
    fn from(frame: PixelFrame) -> Self {
        Self::Frame(frame)
    }
}

impl From<FrameSequence> for Playable {
    fn from(sequence: FrameSequence) -> Self {
        Self::Sequence(sequence)
    }
}

/// Frames and nested sequences shown one after the other
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSequence {
    frame_delay: Duration,
    rotation: Rotation,
    entries: Vec<Playable>,
}

impl FrameSequence {
    pub fn new(frame_delay: Duration) -> Self {
        Self {
            frame_delay,
            rotation: Rotation::None,
            entries: Vec::new(),
        }
    }

    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn frame_delay(&self) -> Duration {
        self.frame_delay
    }

    pub fn set_frame_delay(&mut self, frame_delay: Duration) {
        self.frame_delay = frame_delay;
    }

    /// Rotation applied to every frame when played
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn entries(&self) -> &[Playable] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, entry: impl Into<Playable>) -> &mut Self {
        self.entries.push(entry.into());
        self
    }

    /// Move the entries of `other` to the end of this sequence
    pub fn append(&mut self, other: FrameSequence) -> &mut Self {
        self.entries.extend(other.entries);
        self
    }

    /// Frames directly contained in this sequence, nested sequences excluded
    pub fn frames(&self) -> impl Iterator<Item = &PixelFrame> {
        self.entries.iter().filter_map(|entry| match entry {
            Playable::Frame(frame) => Some(frame),
            Playable::Sequence(_) => None,
        })
    }

    pub fn first_frame(&self) -> Option<&PixelFrame> {
        self.entries.first()?.first_frame()
    }

    pub fn last_frame(&self) -> Option<&PixelFrame> {
        self.entries.last()?.last_frame()
    }

    /// Concatenated wire bytes of every frame
    pub fn to_byte_array(&self, bytes_per_led: usize) -> Vec<u8> {
        self.entries
            .iter()
            .flat_map(|entry| entry.to_byte_array(bytes_per_led))
            .collect()
    }

    /// Add the frames of `banner` moving in from the right, scrolling through a
    /// `width` x `height` window and moving out to the left
    pub fn add_scrolling_banner(
        &mut self,
        banner: &PixelFrame,
        width: usize,
        height: usize,
    ) -> &mut Self {
        let visible_height = banner.height().min(height);
        let frame_delay = self.frame_delay;
        let mut window = |sub: PixelFrame, offset_x: usize| {
            let mut canvas =
                PixelFrame::new(width, height, Color::BLACK).with_frame_delay(frame_delay);
            // Replace never blends, so it cannot fail
            let _ = canvas.replace_sub_frame(&sub, offset_x as i32, 0, BlendMode::Replace);
            self.entries.push(Playable::Frame(canvas));
        };

        for x in 0..width.saturating_sub(1) {
            window(banner.sub_frame(0, 0, x, visible_height), width - 1 - x);
        }

        for x in 0..banner.width().saturating_sub(width) {
            window(banner.sub_frame(x as i32, 0, width, visible_height), 0);
        }

        for x in (0..width).rev() {
            window(
                banner.sub_frame((banner.width() as i32) - (x as i32), 0, x, visible_height),
                0,
            );
        }

        self
    }

    /// Add the frames of an animated GIF, at most `max_frames` of them
    pub fn add_animated_gif(
        &mut self,
        reader: impl BufRead + Seek,
        max_frames: usize,
    ) -> Result<&mut Self, FrameError> {
        let decoder = GifDecoder::new(reader)?;

        for frame in decoder.into_frames().take(max_frames) {
            let frame = frame?;
            let (numerator, denominator) = frame.delay().numer_denom_ms();
            let delay = match numerator / denominator.max(1) {
                0 => self.frame_delay,
                ms => Duration::from_millis(u64::from(ms)),
            };

            self.entries.push(Playable::Frame(
                PixelFrame::from_rgba_image(frame.buffer()).with_frame_delay(delay),
            ));
        }

        Ok(self)
    }

    /// Add every PNG image of `directory`, sorted by file name
    pub fn add_images_from_directory(
        &mut self,
        directory: impl AsRef<Path>,
    ) -> Result<&mut Self, FrameError> {
        let mut paths = std::fs::read_dir(directory)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<Vec<_>, _>>()?;

        paths.retain(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| e.eq_ignore_ascii_case("png"))
                    .unwrap_or(false)
        });
        paths.sort();

        for path in paths {
            debug!(path = %path.display(), "loading frame");
            self.entries.push(Playable::Frame(
                PixelFrame::open(&path)?.with_frame_delay(self.frame_delay),
            ));
        }

        Ok(self)
    }
}

impl Default for FrameSequence {
    fn default() -> Self {
        Self::new(DEFAULT_SEQUENCE_DELAY)
    }
}

impl fmt::Display for FrameSequence {
    /// Entries side by side, nested sequences shown by their first frame
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let rendered: Vec<Vec<String>> = self
            .entries
            .iter()
            .filter_map(Playable::first_frame)
            .map(|frame| frame.to_string().lines().map(str::to_owned).collect())
            .collect();

        let rows = rendered.iter().map(Vec::len).max().unwrap_or(0);
        for y in 0..rows {
            let line: Vec<&str> = rendered
                .iter()
                .map(|lines| lines.get(y).map(String::as_str).unwrap_or(""))
                .collect();
            writeln!(f, "{}", line.join(" "))?;
        }

        Ok(())
    }
}
