//! Fixed-horizon rollout driven by a [`SequencePredictor`].

use crate::error::DatagenError;
use crate::predictor::SequencePredictor;
use crate::recorder::EpisodeRecorder;
use crate::scene::SceneController;
use crate::types::{Episode, TargetPose};
use tracing::{debug, info};

pub struct FeedbackDriver {
    pub steps: usize,
    pub recorder: EpisodeRecorder,
}

impl FeedbackDriver {
    /// Run `steps` iterations of capture, feed, predict one step and apply.
    ///
    /// There is no goal check; the rollout always runs the full horizon and
    /// the returned episode has one frame per step and no settle tail.
    pub fn run<S, P>(&self, scene: &mut S, predictor: &mut P, target: TargetPose) -> Result<Episode, DatagenError>
    where
        S: SceneController + ?Sized,
        P: SequencePredictor + ?Sized,
    {
        if self.steps == 0 {
            return Err(DatagenError::InvalidConfig("feedback rollout needs at least one step".into()));
        }
        let mut frames = Vec::with_capacity(self.steps);
        for step in 0..self.steps {
            let frame = self.recorder.capture_frame(scene)?;
            predictor.feed(&frame)?;
            let next = predictor.predict(1)?.into_iter().next().ok_or(DatagenError::NoObservation)?;
            scene.set_joint_configuration(&next.angles)?;
            debug!(step, "applied predicted configuration");
            frames.push(frame);
        }
        info!(steps = self.steps, "feedback rollout finished");
        Episode::new(target, frames, 0)
    }
}
