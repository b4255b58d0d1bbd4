//! Animated transitions between two frames

use std::time::Duration;

use rand::seq::IndexedRandom;
use serde_derive::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{EnumIter, EnumString, IntoStaticStr};

use super::{FrameSequence, Playable};
use crate::{
    color::BlendMode,
    frame::{FrameError, PixelFrame},
};

/// Delay between the frames of a transition
pub const DEFAULT_TRANSITION_DELAY: Duration = Duration::from_millis(100);

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TransitionType {
    /// No transition
    Straight,
    Fade,
    Wipe,
    CurtainOpen,
    CurtainClose,
    Disc,
    /// A concrete transition picked at random
    Random,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TransitionDirection {
    LeftRight,
    RightLeft,
    UpDown,
    DownUp,
    DiagonalFromTopLeft,
    DiagonalFromTopRight,
    DiagonalFromBottomLeft,
    DiagonalFromBottomRight,
    OutIn,
    InOut,
    Horizontal,
    Vertical,
}

impl TransitionType {
    pub fn supported_directions(self) -> Vec<TransitionDirection> {
        use TransitionDirection::*;

        match self {
            Self::Wipe => vec![
                LeftRight,
                RightLeft,
                UpDown,
                DownUp,
                DiagonalFromTopLeft,
                DiagonalFromTopRight,
                DiagonalFromBottomLeft,
                DiagonalFromBottomRight,
            ],
            Self::CurtainOpen | Self::CurtainClose => vec![Horizontal, Vertical],
            Self::Disc => vec![InOut, OutIn],
            Self::Straight | Self::Fade | Self::Random => TransitionDirection::iter().collect(),
        }
    }

    pub fn supports(self, direction: TransitionDirection) -> bool {
        self.supported_directions().contains(&direction)
    }

    /// Pick a transition other than `Straight`, possibly `Random`
    pub fn random() -> Self {
        Self::choose(&[
            Self::Fade,
            Self::Wipe,
            Self::CurtainOpen,
            Self::CurtainClose,
            Self::Disc,
            Self::Random,
        ])
    }

    fn choose(candidates: &[Self]) -> Self {
        *candidates.choose(&mut rand::rng()).unwrap_or(&Self::Fade)
    }

    /// Pick a supported direction at random
    pub fn random_direction(self) -> TransitionDirection {
        *self
            .supported_directions()
            .choose(&mut rand::rng())
            .unwrap_or(&TransitionDirection::LeftRight)
    }

    /// Resolve `Random` into a concrete transition, direction and blend mode
    pub fn resolve(
        self,
        direction: TransitionDirection,
        blend_mode: BlendMode,
    ) -> (Self, TransitionDirection, BlendMode) {
        if self != Self::Random {
            return (self, direction, blend_mode);
        }

        let transition = Self::choose(&[
            Self::Fade,
            Self::Wipe,
            Self::CurtainOpen,
            Self::CurtainClose,
            Self::Disc,
        ]);
        let modes: Vec<_> = BlendMode::iter().collect();
        let blend_mode = *modes.choose(&mut rand::rng()).unwrap_or(&BlendMode::Replace);

        (transition, transition.random_direction(), blend_mode)
    }

    /// Delay between the frames of this transition
    pub fn frame_delay(self, frame_delay: Duration) -> Duration {
        match self {
            Self::CurtainOpen | Self::CurtainClose => frame_delay * 2,
            _ => frame_delay,
        }
    }

    /// Frame shown at `factor` in `[0, 1]` of the way from `source` to `target`
    ///
    /// Pixels covered by the transition at this point are faded towards `target`, the
    /// others are left as in `source`.
    pub fn next_frame(
        self,
        source: &PixelFrame,
        target: &PixelFrame,
        direction: TransitionDirection,
        blend_mode: BlendMode,
        factor: f64,
    ) -> Result<PixelFrame, FrameError> {
        match self {
            Self::Straight => Ok(source.clone()),
            Self::Random => Ok(target.clone()),
            Self::Fade => Ok(source.fade(target, factor, BlendMode::Average)?),
            _ => {
                if source.dimensions() != target.dimensions() {
                    return Err(FrameError::GeometryMismatch {
                        expected: source.dimensions(),
                        found: target.dimensions(),
                    });
                }

                let covered = coverage(self, direction, source.width(), source.height(), factor);
                let mut frame = source.clone();

                for y in 0..source.height() as i32 {
                    for x in 0..source.width() as i32 {
                        if covered(x, y) {
                            let color =
                                source
                                    .get(x, y)
                                    .fade(&target.get(x, y), factor, blend_mode)?;
                            frame.set(x, y, color);
                        }
                    }
                }

                Ok(frame)
            }
        }
    }

    /// Build the frames leading from the last frame of `source` to the first frame of
    /// `target` within `duration`
    ///
    /// The result is empty for `Straight`, for unsupported directions and when either side
    /// has no frame.
    pub fn transition_sequence(
        self,
        source: &Playable,
        target: &Playable,
        direction: TransitionDirection,
        blend_mode: BlendMode,
        frame_delay: Duration,
        duration: Duration,
    ) -> Result<FrameSequence, FrameError> {
        let (transition, direction, blend_mode) = self.resolve(direction, blend_mode);
        let frame_delay = transition.frame_delay(frame_delay);
        let mut sequence = FrameSequence::new(frame_delay);

        if transition == Self::Straight || !transition.supports(direction) {
            return Ok(sequence);
        }

        let (source, target) = match (source.last_frame(), target.first_frame()) {
            (Some(source), Some(target)) => (source, target),
            _ => return Ok(sequence),
        };

        debug!(?transition, ?direction, ?blend_mode, "building transition");

        let steps = (duration.as_millis() / frame_delay.as_millis().max(1)).max(1) as usize;
        let step = (255 / steps).max(1);

        for i in (0..=255usize).step_by(step) {
            sequence.push(
                transition
                    .next_frame(source, target, direction, blend_mode, i as f64 / 255.0)?
                    .with_frame_delay(frame_delay),
            );
        }

        Ok(sequence)
    }
}

impl Default for TransitionType {
    fn default() -> Self {
        Self::Straight
    }
}

impl Default for TransitionDirection {
    fn default() -> Self {
        Self::LeftRight
    }
}

/// Predicate telling which pixels a transition covers at `factor`
fn coverage(
    transition: TransitionType,
    direction: TransitionDirection,
    width: usize,
    height: usize,
    factor: f64,
) -> Box<dyn Fn(i32, i32) -> bool> {
    use TransitionDirection::*;

    let (w, h) = (width as i32, height as i32);
    let scaled = |length: i32| (f64::from(length) * factor).round() as i32;

    match (transition, direction) {
        (TransitionType::Wipe, LeftRight) => {
            let n = scaled(w);
            Box::new(move |x, _| x < n)
        }
        (TransitionType::Wipe, RightLeft) => {
            let n = scaled(w);
            Box::new(move |x, _| x >= w - n)
        }
        (TransitionType::Wipe, UpDown) => {
            let n = scaled(h);
            Box::new(move |_, y| y < n)
        }
        (TransitionType::Wipe, DownUp) => {
            let n = scaled(h);
            Box::new(move |_, y| y >= h - n)
        }
        (TransitionType::Wipe, DiagonalFromTopLeft) => {
            let n = scaled(w + h - 1);
            Box::new(move |x, y| x + y < n)
        }
        (TransitionType::Wipe, DiagonalFromTopRight) => {
            let n = scaled(w + h - 1);
            Box::new(move |x, y| (w - 1 - x) + y < n)
        }
        (TransitionType::Wipe, DiagonalFromBottomLeft) => {
            let n = scaled(w + h - 1);
            Box::new(move |x, y| x + (h - 1 - y) < n)
        }
        (TransitionType::Wipe, DiagonalFromBottomRight) => {
            let n = scaled(w + h - 1);
            Box::new(move |x, y| (w - 1 - x) + (h - 1 - y) < n)
        }
        (TransitionType::CurtainOpen, Horizontal) => {
            let n = scaled((w + 1) / 2);
            Box::new(move |x, _| (2 * x + 1 - w).abs() < 2 * n)
        }
        (TransitionType::CurtainOpen, Vertical) => {
            let n = scaled((h + 1) / 2);
            Box::new(move |_, y| (2 * y + 1 - h).abs() < 2 * n)
        }
        (TransitionType::CurtainClose, Horizontal) => {
            let n = scaled((w + 1) / 2);
            Box::new(move |x, _| x < n || w - 1 - x < n)
        }
        (TransitionType::CurtainClose, Vertical) => {
            let n = scaled((h + 1) / 2);
            Box::new(move |_, y| y < n || h - 1 - y < n)
        }
        (TransitionType::Disc, InOut) | (TransitionType::Disc, OutIn) => {
            let (cx, cy) = (f64::from(w) / 2.0, f64::from(h) / 2.0);
            let radius = cx.hypot(cy);
            let inward = direction == OutIn;

            Box::new(move |x, y| {
                let distance = (f64::from(x) + 0.5 - cx).hypot(f64::from(y) + 0.5 - cy);
                if inward {
                    distance >= (1.0 - factor) * radius
                } else {
                    distance <= factor * radius
                }
            })
        }
        _ => Box::new(|_, _| false),
    }
}
