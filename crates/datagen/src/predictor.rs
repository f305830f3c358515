//! # Sequence Predictors
//!
//! The [`SequencePredictor`] contract is what the feedback rollout needs from
//! a trained model: observations go in one at a time, predicted future
//! observations come out. The trait keeps the rollout independent of any
//! particular learning framework.
//!
//! [`NearestNeighborPropagator`] is a model-free implementation backed by a
//! recorded [`Dataset`]: it finds the stretch of recorded motion that best
//! matches the recent context and replays what happened next.

use crate::error::DatagenError;
use crate::types::{Dataset, Frame, JointConfiguration};
use std::collections::VecDeque;
use tracing::trace;

pub trait SequencePredictor {
    /// Append one observation to the rolling context.
    fn feed(&mut self, observation: &Frame) -> Result<(), DatagenError>;

    /// Predict the next `horizon` observations after the fed context.
    ///
    /// # Errors
    ///
    /// [`DatagenError::NoObservation`] before the first `feed`.
    fn predict(&mut self, horizon: usize) -> Result<Vec<Frame>, DatagenError>;
}

pub struct NearestNeighborPropagator {
    dataset: Dataset,
    context: VecDeque<JointConfiguration>,
    context_len: usize,
    joints: usize,
}

impl NearestNeighborPropagator {
    /// # Errors
    ///
    /// [`DatagenError::EmptyDataset`] for a dataset without episodes and
    /// [`DatagenError::InvalidConfig`] for a zero-length context.
    pub fn new(dataset: Dataset, context_len: usize) -> Result<Self, DatagenError> {
        let joints = dataset.episodes().first().ok_or(DatagenError::EmptyDataset)?.joint_count();
        if context_len == 0 {
            return Err(DatagenError::InvalidConfig("predictor context must hold at least one frame".into()));
        }
        Ok(Self { dataset, context: VecDeque::with_capacity(context_len), context_len, joints })
    }

    #[must_use]
    pub fn joint_count(&self) -> usize {
        self.joints
    }

    /// Observations currently held in the rolling context.
    #[must_use]
    pub fn fed(&self) -> usize {
        self.context.len()
    }

    /// Drop the fed context, starting a new rollout.
    pub fn reset(&mut self) {
        self.context.clear();
    }

    /// Mean joint distance between the newest `window` context entries and
    /// the recorded frames ending at `end`.
    fn window_cost(&self, frames: &[Frame], end: usize, window: usize) -> Result<f32, DatagenError> {
        let recent = self.context.iter().skip(self.context.len() - window);
        let total = frames[end + 1 - window..=end]
            .iter()
            .zip(recent)
            .map(|(frame, seen)| frame.angles.distance(seen))
            .sum::<Result<f32, DatagenError>>()?;
        Ok(total / window as f32)
    }

    /// (episode, frame) whose preceding window best matches the context.
    fn best_match(&self) -> Result<(usize, usize), DatagenError> {
        let mut best: Option<(f32, usize, usize)> = None;
        for (e, episode) in self.dataset.episodes().iter().enumerate() {
            let frames = episode.frames();
            // Episodes shorter than the context are matched on what they have.
            let window = self.context.len().min(frames.len());
            for end in window - 1..frames.len() {
                let cost = self.window_cost(frames, end, window)?;
                if best.map_or(true, |(c, _, _)| cost < c) {
                    best = Some((cost, e, end));
                }
            }
        }
        let (cost, episode, frame) = best.ok_or(DatagenError::EmptyDataset)?;
        trace!(episode, frame, cost, "nearest recorded window");
        Ok((episode, frame))
    }
}

impl SequencePredictor for NearestNeighborPropagator {
    fn feed(&mut self, observation: &Frame) -> Result<(), DatagenError> {
        observation.angles.expect_len(self.joints)?;
        if self.context.len() == self.context_len {
            self.context.pop_front();
        }
        self.context.push_back(observation.angles.clone());
        Ok(())
    }

    fn predict(&mut self, horizon: usize) -> Result<Vec<Frame>, DatagenError> {
        if self.context.is_empty() {
            return Err(DatagenError::NoObservation);
        }
        let (episode, frame) = self.best_match()?;
        let frames = self.dataset.episodes()[episode].frames();
        let last = frames.len() - 1;
        Ok((1..=horizon).map(|k| frames[(frame + k).min(last)].clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::tests::frame;
    use crate::types::{Episode, TargetPose};
    use glam::Vec3;

    /// One episode ramping joint 0 from 0 to 0.9 in steps of 0.1, another
    /// ramping it down from 0.9 to 0.
    fn dataset() -> Dataset {
        let up: Vec<Frame> = (0..10).map(|i| frame(2, false, &[i as f32 * 0.1, 0.0])).collect();
        let down: Vec<Frame> = (0..10).map(|i| frame(2, false, &[0.9 - i as f32 * 0.1, 0.0])).collect();
        let target = TargetPose { position: Vec3::ZERO };
        Dataset::from_episodes([Episode::new(target, up, 0).unwrap(), Episode::new(target, down, 0).unwrap()]).unwrap()
    }

    fn angle(f: &Frame) -> f32 {
        f.angles.as_slice()[0]
    }

    #[test]
    fn predicts_the_frames_that_followed() {
        let mut p = NearestNeighborPropagator::new(dataset(), 1).unwrap();
        p.feed(&frame(2, false, &[0.31, 0.0])).unwrap();
        let next = p.predict(2).unwrap();
        assert_eq!(next.len(), 2);
        assert!((angle(&next[0]) - 0.4).abs() < 1e-5 || (angle(&next[0]) - 0.2).abs() < 1e-5);
    }

    #[test]
    fn context_disambiguates_direction() {
        let mut p = NearestNeighborPropagator::new(dataset(), 3).unwrap();
        for a in [0.7, 0.6, 0.5] {
            p.feed(&frame(2, false, &[a, 0.0])).unwrap();
        }
        assert!((angle(&p.predict(1).unwrap()[0]) - 0.4).abs() < 1e-5);

        p.reset();
        for a in [0.3, 0.4, 0.5] {
            p.feed(&frame(2, false, &[a, 0.0])).unwrap();
        }
        assert!((angle(&p.predict(1).unwrap()[0]) - 0.6).abs() < 1e-5);
    }

    #[test]
    fn horizon_is_clamped_at_episode_end() {
        let mut p = NearestNeighborPropagator::new(dataset(), 2).unwrap();
        p.feed(&frame(2, false, &[0.8, 0.0])).unwrap();
        p.feed(&frame(2, false, &[0.9, 0.0])).unwrap();
        let next = p.predict(3).unwrap();
        assert_eq!(next.len(), 3);
        assert!(next.iter().all(|f| (angle(f) - 0.9).abs() < 1e-5));
    }

    #[test]
    fn context_is_bounded() {
        let mut p = NearestNeighborPropagator::new(dataset(), 2).unwrap();
        for a in [0.0, 0.1, 0.2, 0.3] {
            p.feed(&frame(2, false, &[a, 0.0])).unwrap();
        }
        assert_eq!(p.fed(), 2);
    }

    #[test]
    fn misuse_is_reported() {
        assert!(matches!(NearestNeighborPropagator::new(Dataset::new(), 1), Err(DatagenError::EmptyDataset)));
        let mut p = NearestNeighborPropagator::new(dataset(), 1).unwrap();
        assert!(matches!(p.predict(1), Err(DatagenError::NoObservation)));
        let err = p.feed(&frame(2, false, &[0.0])).unwrap_err();
        assert!(matches!(err, DatagenError::ShapeMismatch { expected: 2, actual: 1 }));
    }
}
