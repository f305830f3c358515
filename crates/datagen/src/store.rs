//! # Project Persistence
//!
//! A project is a directory under the data root named after the project.
//! It holds the bincode-encoded dataset, a JSON manifest describing it, and
//! whatever media the caller exports next to them (sample GIFs).

use crate::error::DatagenError;
use crate::types::Dataset;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;
use tracing::debug;

const DATASET_FILE: &str = "dataset.bin";
const MANIFEST_FILE: &str = "manifest.json";
const DATA_ROOT_ENV: &str = "REACHER_DATA_ROOT";

/// Summary written next to every saved dataset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub project: String,
    pub episodes: usize,
    pub total_frames: usize,
    pub resolution: Option<u32>,
    pub with_depth: Option<bool>,
    pub joint_count: Option<usize>,
    pub saved_at: DateTime<Utc>,
}

impl Manifest {
    #[must_use]
    pub fn describe(project: &str, dataset: &Dataset) -> Self {
        let first = dataset.episodes().first();
        Self {
            project: project.to_owned(),
            episodes: dataset.len(),
            total_frames: dataset.total_frames(),
            resolution: first.map(crate::types::Episode::resolution),
            with_depth: dataset.has_depth(),
            joint_count: first.map(crate::types::Episode::joint_count),
            saved_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ProjectStore {
    root: PathBuf,
}

impl ProjectStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `$REACHER_DATA_ROOT`, else `$HOME/.reacher`, else `./.reacher`.
    #[must_use]
    pub fn from_env() -> Self {
        if let Some(root) = std::env::var_os(DATA_ROOT_ENV) {
            return Self::new(root);
        }
        let home = std::env::var_os("HOME").map_or_else(|| PathBuf::from("."), PathBuf::from);
        Self::new(home.join(".reacher"))
    }

    #[must_use]
    pub fn project_dir(&self, project: &str) -> PathBuf {
        self.root.join(project)
    }

    /// Persist `dataset` under `project`, replacing any previous save.
    ///
    /// The dataset is written to a temporary sibling and renamed into place,
    /// so a crash mid-write leaves the previous checkpoint intact.
    pub fn save(&self, dataset: &Dataset, project: &str) -> Result<PathBuf, DatagenError> {
        let dir = self.project_dir(project);
        fs::create_dir_all(&dir)?;
        let path = dir.join(DATASET_FILE);
        let staging = dir.join(format!("{DATASET_FILE}.partial"));
        {
            let mut writer = BufWriter::new(File::create(&staging)?);
            bincode::serialize_into(&mut writer, dataset)?;
            writer.flush()?;
        }
        fs::rename(&staging, &path)?;

        let manifest = Manifest::describe(project, dataset);
        fs::write(dir.join(MANIFEST_FILE), serde_json::to_string_pretty(&manifest)?)?;
        debug!(project, episodes = dataset.len(), path = %path.display(), "dataset saved");
        Ok(path)
    }

    pub fn load(&self, project: &str) -> Result<Dataset, DatagenError> {
        let path = self.project_dir(project).join(DATASET_FILE);
        if !path.is_file() {
            return Err(DatagenError::ProjectNotFound(path));
        }
        let reader = BufReader::new(File::open(&path)?);
        Ok(bincode::deserialize_from(reader)?)
    }

    pub fn load_manifest(&self, project: &str) -> Result<Manifest, DatagenError> {
        let path = self.project_dir(project).join(MANIFEST_FILE);
        if !path.is_file() {
            return Err(DatagenError::ProjectNotFound(path));
        }
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::tests::frame;
    use crate::types::{Episode, TargetPose};
    use glam::Vec3;

    fn dataset(episodes: usize) -> Dataset {
        Dataset::from_episodes((0..episodes).map(|i| {
            let frames = (0..3).map(|k| frame(4, true, &[i as f32, k as f32])).collect();
            Episode::new(TargetPose { position: Vec3::splat(i as f32) }, frames, 1).unwrap()
        }))
        .unwrap()
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProjectStore::new(dir.path());
        let original = dataset(3);
        let path = store.save(&original, "kuka").unwrap();
        assert_eq!(path, dir.path().join("kuka").join(DATASET_FILE));
        assert_eq!(store.load("kuka").unwrap(), original);

        let manifest = store.load_manifest("kuka").unwrap();
        assert_eq!(manifest.episodes, 3);
        assert_eq!(manifest.total_frames, 9);
        assert_eq!(manifest.resolution, Some(4));
        assert_eq!(manifest.with_depth, Some(true));
        assert_eq!(manifest.joint_count, Some(2));
    }

    #[test]
    fn later_saves_replace_earlier_ones() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProjectStore::new(dir.path());
        store.save(&dataset(1), "p").unwrap();
        store.save(&dataset(2), "p").unwrap();
        assert_eq!(store.load("p").unwrap().len(), 2);
        assert!(!dir.path().join("p").join("dataset.bin.partial").exists());
    }

    #[test]
    fn load_rejects_mixed_modalities() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProjectStore::new(dir.path());
        let target = TargetPose { position: Vec3::ZERO };
        let with_depth = Episode::new(target, vec![frame(4, true, &[0.0])], 0).unwrap();
        let without = Episode::new(target, vec![frame(4, false, &[0.0])], 0).unwrap();
        let project = store.project_dir("mixed");
        fs::create_dir_all(&project).unwrap();
        fs::write(project.join(DATASET_FILE), bincode::serialize(&vec![with_depth, without]).unwrap()).unwrap();

        assert!(matches!(store.load("mixed"), Err(DatagenError::Serialization(_))));
    }

    #[test]
    fn missing_project_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = ProjectStore::new(dir.path()).load("nope").unwrap_err();
        assert!(matches!(err, DatagenError::ProjectNotFound(_)));
    }
}
