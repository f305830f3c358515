//! Episode data model.
//!
//! [`Episode`] and [`Dataset`] validate their invariants on construction and
//! are immutable afterwards; neither holds any reference to a simulator.

use crate::error::DatagenError;
use glam::Vec3;
use render::{DepthImage, RgbImage};
use serde::{Deserialize, Serialize};

/// Joint angles in radians, one per actuated joint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JointConfiguration(Vec<f32>);

impl JointConfiguration {
    #[must_use]
    pub fn new(angles: Vec<f32>) -> Self {
        Self(angles)
    }

    /// `joints` copies of the same angle.
    #[must_use]
    pub fn uniform(joints: usize, angle: f32) -> Self {
        Self(vec![angle; joints])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn expect_len(&self, expected: usize) -> Result<(), DatagenError> {
        if self.0.len() == expected {
            Ok(())
        } else {
            Err(DatagenError::ShapeMismatch { expected, actual: self.0.len() })
        }
    }

    /// Euclidean distance in joint space.
    pub fn distance(&self, other: &Self) -> Result<f32, DatagenError> {
        other.expect_len(self.len())?;
        Ok(self.0.iter().zip(&other.0).map(|(a, b)| (a - b) * (a - b)).sum::<f32>().sqrt())
    }
}

impl From<Vec<f32>> for JointConfiguration {
    fn from(angles: Vec<f32>) -> Self {
        Self(angles)
    }
}

/// Where the end effector should go. Orientation is left free.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TargetPose {
    pub position: Vec3,
}

/// One synchronized observation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub rgb: RgbImage,
    pub depth: Option<DepthImage>,
    pub angles: JointConfiguration,
}

impl Frame {
    #[must_use]
    pub fn has_depth(&self) -> bool {
        self.depth.is_some()
    }

    #[must_use]
    pub fn resolution(&self) -> u32 {
        self.rgb.resolution()
    }
}

/// One reaching attempt: the interpolated approach followed by
/// `settle_frames` verbatim copies of the last approach frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawEpisode")]
pub struct Episode {
    target: TargetPose,
    frames: Vec<Frame>,
    settle_frames: usize,
}

#[derive(Deserialize)]
struct RawEpisode {
    target: TargetPose,
    frames: Vec<Frame>,
    settle_frames: usize,
}

impl TryFrom<RawEpisode> for Episode {
    type Error = DatagenError;

    fn try_from(raw: RawEpisode) -> Result<Self, Self::Error> {
        Self::new(raw.target, raw.frames, raw.settle_frames)
    }
}

impl Episode {
    /// # Errors
    ///
    /// [`DatagenError::EmptyEpisode`] without frames,
    /// [`DatagenError::ResolutionMismatch`] / [`DatagenError::ModalityMismatch`]
    /// / [`DatagenError::ShapeMismatch`] when frames disagree with the first
    /// one, and [`DatagenError::InvalidConfig`] when the settle tail is longer
    /// than the episode.
    pub fn new(target: TargetPose, frames: Vec<Frame>, settle_frames: usize) -> Result<Self, DatagenError> {
        let first = frames.first().ok_or(DatagenError::EmptyEpisode)?;
        let (resolution, depth, joints) = (first.resolution(), first.has_depth(), first.angles.len());
        for frame in &frames[1..] {
            if frame.resolution() != resolution {
                return Err(DatagenError::ResolutionMismatch { expected: resolution, actual: frame.resolution() });
            }
            if let Some(d) = &frame.depth {
                if d.resolution() != resolution {
                    return Err(DatagenError::ResolutionMismatch { expected: resolution, actual: d.resolution() });
                }
            }
            if frame.has_depth() != depth {
                return Err(DatagenError::ModalityMismatch { expected: depth, actual: frame.has_depth() });
            }
            frame.angles.expect_len(joints)?;
        }
        if settle_frames >= frames.len() {
            return Err(DatagenError::InvalidConfig(format!(
                "settle tail of {settle_frames} frames leaves no approach in a {}-frame episode",
                frames.len()
            )));
        }
        Ok(Self { target, frames, settle_frames })
    }

    #[must_use]
    pub fn target(&self) -> TargetPose {
        self.target
    }

    #[must_use]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    #[must_use]
    pub fn settle_frames(&self) -> usize {
        self.settle_frames
    }

    /// Number of interpolated frames before the settle tail.
    #[must_use]
    pub fn approach_len(&self) -> usize {
        self.frames.len() - self.settle_frames
    }

    #[must_use]
    pub fn resolution(&self) -> u32 {
        self.frames[0].resolution()
    }

    #[must_use]
    pub fn has_depth(&self) -> bool {
        self.frames[0].has_depth()
    }

    #[must_use]
    pub fn joint_count(&self) -> usize {
        self.frames[0].angles.len()
    }
}

/// Unordered pool of episodes sharing the same modalities.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDataset")]
pub struct Dataset {
    episodes: Vec<Episode>,
}

#[derive(Deserialize)]
struct RawDataset {
    episodes: Vec<Episode>,
}

impl TryFrom<RawDataset> for Dataset {
    type Error = DatagenError;

    fn try_from(raw: RawDataset) -> Result<Self, Self::Error> {
        Self::from_episodes(raw.episodes)
    }
}

impl Dataset {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_episodes(episodes: impl IntoIterator<Item = Episode>) -> Result<Self, DatagenError> {
        let mut dataset = Self::new();
        for episode in episodes {
            dataset.push(episode)?;
        }
        Ok(dataset)
    }

    /// # Errors
    ///
    /// [`DatagenError::ModalityMismatch`] when `episode` has depth and the
    /// dataset does not, or the other way round.
    pub fn push(&mut self, episode: Episode) -> Result<(), DatagenError> {
        if let Some(first) = self.episodes.first() {
            if first.has_depth() != episode.has_depth() {
                return Err(DatagenError::ModalityMismatch { expected: first.has_depth(), actual: episode.has_depth() });
            }
        }
        self.episodes.push(episode);
        Ok(())
    }

    #[must_use]
    pub fn episodes(&self) -> &[Episode] {
        &self.episodes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.episodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }

    /// `None` for an empty dataset.
    #[must_use]
    pub fn has_depth(&self) -> Option<bool> {
        self.episodes.first().map(Episode::has_depth)
    }

    #[must_use]
    pub fn total_frames(&self) -> usize {
        self.episodes.iter().map(Episode::len).sum()
    }
}
