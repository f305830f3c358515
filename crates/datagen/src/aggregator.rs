//! # Dataset Aggregation
//!
//! Two ways of producing a [`Dataset`]:
//!
//! -   [`generate_sequential`] runs one generator in the calling thread and
//!     hands the growing dataset to a checkpoint callback after every
//!     episode, so a crash never loses completed work.
//! -   [`generate_parallel`] splits the episode count across a pool of
//!     workers. Each worker builds its own scene and IK adapter, writes each
//!     finished episode to its own file in a scratch directory, and returns a
//!     [`WorkerReport`]. The coordinator reads the files back in
//!     (worker, index) order once every worker has returned. The scratch
//!     directory is removed when the call returns, on success or failure.
//!
//! Workers are threads in one process. A panic is contained to its worker,
//! but an abort, a stack overflow or running out of memory still ends every
//! worker and the coordinator with it.

use crate::config::GenerationConfig;
use crate::error::DatagenError;
use crate::kinematics::KinematicsAdapter;
use crate::recorder::EpisodeGenerator;
use crate::scene::SceneController;
use crate::types::{Dataset, Episode};
use rayon::prelude::*;
use std::any::Any;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

const EPISODE_EXTENSION: &str = "episode";
const STAGING_EXTENSION: &str = "partial";

/// Generate `count` episodes one after another in `scene`.
///
/// `checkpoint` receives the dataset after every appended episode; an error
/// from it aborts the run.
pub fn generate_sequential<S, K, F>(
    generator: &mut EpisodeGenerator<K>,
    scene: &mut S,
    count: usize,
    mut checkpoint: F,
) -> Result<Dataset, DatagenError>
where
    S: SceneController + ?Sized,
    K: KinematicsAdapter,
    F: FnMut(&Dataset) -> Result<(), DatagenError>,
{
    let mut dataset = Dataset::new();
    for i in 0..count {
        let episode = generator.generate(scene)?;
        dataset.push(episode)?;
        checkpoint(&dataset)?;
        debug!(completed = i + 1, count, "checkpoint written");
    }
    Ok(dataset)
}

/// Split `total` into `workers` shares differing by at most one.
#[must_use]
pub fn partition(total: usize, workers: usize) -> Vec<usize> {
    let workers = workers.max(1);
    let (base, extra) = (total / workers, total % workers);
    (0..workers).map(|w| base + usize::from(w < extra)).collect()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkerOutcome {
    Completed,
    Failed(String),
}

/// What one worker did with its share.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerReport {
    pub worker: usize,
    pub requested: usize,
    /// Episodes written to scratch before the worker stopped.
    pub written: usize,
    pub outcome: WorkerOutcome,
}

impl WorkerReport {
    #[must_use]
    pub fn lost(&self) -> usize {
        self.requested.saturating_sub(self.written)
    }

    #[must_use]
    pub fn failed(&self) -> bool {
        matches!(self.outcome, WorkerOutcome::Failed(_))
    }
}

#[derive(Debug)]
pub struct GenerationSummary {
    pub dataset: Dataset,
    pub reports: Vec<WorkerReport>,
    /// Scratch files that were written but could not be read back.
    pub unreadable: usize,
}

impl GenerationSummary {
    pub fn failures(&self) -> impl Iterator<Item = &WorkerReport> {
        self.reports.iter().filter(|r| r.failed())
    }

    #[must_use]
    pub fn lost_episodes(&self) -> usize {
        self.reports.iter().map(WorkerReport::lost).sum::<usize>() + self.unreadable
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures().next().is_none() && self.unreadable == 0
    }
}

/// Generate `total` episodes on `workers` threads.
///
/// `make_worker(id)` is called once inside each worker to build the scene and
/// IK adapter it will own. Each worker gets its own seed derived from
/// `config.seed` and `id`, so a run is reproducible for a fixed seed and
/// worker count.
///
/// A failing or panicking worker does not abort the run; its lost episodes
/// are reported in the returned summary. So are scratch files that cannot be
/// decoded.
///
/// # Errors
///
/// Invalid configuration, failure to create the pool or scratch directory,
/// and failure to list the scratch directory.
pub fn generate_parallel<F, S, K>(
    config: &GenerationConfig,
    total: usize,
    workers: usize,
    make_worker: F,
) -> Result<GenerationSummary, DatagenError>
where
    F: Fn(usize) -> Result<(S, K), DatagenError> + Sync,
    S: SceneController,
    K: KinematicsAdapter,
{
    config.validate()?;
    let shares = partition(total, workers);
    let scratch = tempfile::Builder::new().prefix("reacher-").tempdir()?;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(shares.len())
        .thread_name(|i| format!("reacher-worker-{i}"))
        .build()
        .map_err(|e| DatagenError::WorkerPool(e.to_string()))?;
    info!(total, workers = shares.len(), scratch = %scratch.path().display(), "starting parallel generation");

    let reports: Vec<WorkerReport> = pool.install(|| {
        shares
            .par_iter()
            .enumerate()
            .map(|(worker, &requested)| run_worker(config, worker, requested, scratch.path(), &make_worker))
            .collect()
    });

    let (dataset, unreadable) = consolidate(scratch.path())?;
    let summary = GenerationSummary { dataset, reports, unreadable };
    if summary.is_complete() {
        info!(episodes = summary.dataset.len(), "parallel generation complete");
    } else {
        warn!(
            episodes = summary.dataset.len(),
            lost = summary.lost_episodes(),
            failed_workers = summary.failures().count(),
            unreadable = summary.unreadable,
            "parallel generation finished with failures"
        );
    }
    Ok(summary)
}

fn run_worker<F, S, K>(
    config: &GenerationConfig,
    worker: usize,
    requested: usize,
    scratch: &Path,
    make_worker: &F,
) -> WorkerReport
where
    F: Fn(usize) -> Result<(S, K), DatagenError>,
    S: SceneController,
    K: KinematicsAdapter,
{
    info!(worker, requested, "worker started");
    let mut written = 0;
    let result = panic::catch_unwind(AssertUnwindSafe(|| -> Result<(), DatagenError> {
        let (mut scene, ik) = make_worker(worker)?;
        let mut generator = EpisodeGenerator::new(config.for_worker(worker), ik)?;
        for index in 0..requested {
            let episode = generator.generate(&mut scene)?;
            write_episode(scratch, worker, index, &episode)?;
            written += 1;
        }
        Ok(())
    }));

    let outcome = match result {
        Ok(Ok(())) => {
            info!(worker, written, "worker finished");
            WorkerOutcome::Completed
        }
        Ok(Err(e)) => {
            error!(worker, written, requested, "worker failed: {e}");
            WorkerOutcome::Failed(e.to_string())
        }
        Err(payload) => {
            let reason = panic_message(payload.as_ref());
            error!(worker, written, requested, "worker panicked: {reason}");
            WorkerOutcome::Failed(format!("panic: {reason}"))
        }
    };
    WorkerReport { worker, requested, written, outcome }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}

fn episode_file_name(worker: usize, index: usize) -> String {
    format!("w{worker:04}-e{index:06}-{}.{EPISODE_EXTENSION}", Uuid::new_v4())
}

/// Episodes are written under a staging name and renamed into place, so a
/// worker killed mid-write never leaves a truncated `.episode` file.
fn write_episode(dir: &Path, worker: usize, index: usize, episode: &Episode) -> Result<(), DatagenError> {
    let path = dir.join(episode_file_name(worker, index));
    let staging = path.with_extension(STAGING_EXTENSION);
    if let Err(e) = stage_and_rename(&staging, &path, episode) {
        let _ = fs::remove_file(&staging);
        return Err(e);
    }
    debug!(worker, index, path = %path.display(), "episode written to scratch");
    Ok(())
}

fn stage_and_rename(staging: &Path, path: &Path, episode: &Episode) -> Result<(), DatagenError> {
    let mut writer = BufWriter::new(File::create(staging)?);
    bincode::serialize_into(&mut writer, episode)?;
    writer.flush()?;
    drop(writer);
    fs::rename(staging, path)?;
    Ok(())
}

fn read_episode(path: &Path) -> Result<Episode, DatagenError> {
    Ok(bincode::deserialize_from(BufReader::new(File::open(path)?))?)
}

/// Read every episode file in `dir`, in file-name order.
///
/// A file that cannot be decoded or does not fit the dataset is skipped and
/// counted instead of discarding everything else.
fn consolidate(dir: &Path) -> Result<(Dataset, usize), DatagenError> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == EPISODE_EXTENSION))
        .collect();
    paths.sort();

    let mut dataset = Dataset::new();
    let mut unreadable = 0;
    for path in paths {
        if let Err(e) = read_episode(&path).and_then(|episode| dataset.push(episode)) {
            warn!(path = %path.display(), "skipping unreadable episode: {e}");
            unreadable += 1;
        }
    }
    Ok((dataset, unreadable))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::tests::{EchoIk, FakeScene};
    use crate::trajectory::TrajectoryConfig;

    fn config() -> GenerationConfig {
        GenerationConfig {
            resolution: 2,
            home: vec![0.1; 3],
            trajectory: TrajectoryConfig { base_steps: 3, step_jitter: 3, settle_frames: 2 },
            ..GenerationConfig::default()
        }
    }

    #[test]
    fn partition_is_even() {
        assert_eq!(partition(4, 2), vec![2, 2]);
        assert_eq!(partition(7, 3), vec![3, 2, 2]);
        assert_eq!(partition(2, 4), vec![1, 1, 0, 0]);
        assert_eq!(partition(5, 0), vec![5]);
        assert_eq!(partition(10, 4).iter().sum::<usize>(), 10);
    }

    #[test]
    fn file_names_sort_by_worker_then_index() {
        let mut names = vec![episode_file_name(1, 0), episode_file_name(0, 10), episode_file_name(0, 2)];
        names.sort();
        assert!(names[0].starts_with("w0000-e000002"));
        assert!(names[1].starts_with("w0000-e000010"));
        assert!(names[2].starts_with("w0001-e000000"));
        assert_ne!(episode_file_name(0, 0), episode_file_name(0, 0));
    }

    #[test]
    fn sequential_checkpoints_after_every_episode() {
        let mut generator = EpisodeGenerator::new(config(), EchoIk).unwrap();
        let mut scene = FakeScene::new(3);
        let mut seen = Vec::new();
        let dataset = generate_sequential(&mut generator, &mut scene, 3, |ds| {
            seen.push(ds.len());
            Ok(())
        })
        .unwrap();
        assert_eq!(dataset.len(), 3);
        assert_eq!(seen, vec![1, 2, 3]);
    }

    #[test]
    fn failing_checkpoint_stops_the_run() {
        let mut generator = EpisodeGenerator::new(config(), EchoIk).unwrap();
        let mut scene = FakeScene::new(3);
        let mut calls = 0;
        let result = generate_sequential(&mut generator, &mut scene, 5, |_| {
            calls += 1;
            Err(DatagenError::InvalidConfig("disk full".into()))
        });
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }

    #[test]
    fn parallel_splits_and_consolidates() {
        let summary = generate_parallel(&config(), 4, 2, |_| Ok((FakeScene::new(3), EchoIk))).unwrap();
        assert_eq!(summary.dataset.len(), 4);
        assert!(summary.is_complete());
        assert_eq!(summary.reports.len(), 2);
        for report in &summary.reports {
            assert_eq!(report.requested, 2);
            assert_eq!(report.written, 2);
        }
    }

    #[test]
    fn parallel_matches_per_worker_sequential_runs() {
        let summary = generate_parallel(&config(), 5, 2, |_| Ok((FakeScene::new(3), EchoIk))).unwrap();
        let mut expected = Vec::new();
        for (worker, share) in partition(5, 2).into_iter().enumerate() {
            let mut generator = EpisodeGenerator::new(config().for_worker(worker), EchoIk).unwrap();
            let mut scene = FakeScene::new(3);
            for _ in 0..share {
                expected.push(generator.generate(&mut scene).unwrap());
            }
        }
        assert_eq!(summary.dataset.episodes(), expected.as_slice());
    }

    #[test]
    fn failed_worker_is_reported_not_dropped_silently() {
        let summary = generate_parallel(&config(), 6, 3, |worker| {
            if worker == 1 {
                Err(DatagenError::InvalidConfig("no simulator".into()))
            } else {
                Ok((FakeScene::new(3), EchoIk))
            }
        })
        .unwrap();
        assert_eq!(summary.dataset.len(), 4);
        assert!(!summary.is_complete());
        assert_eq!(summary.lost_episodes(), 2);
        let failed: Vec<_> = summary.failures().map(|r| r.worker).collect();
        assert_eq!(failed, vec![1]);
    }

    #[test]
    fn truncated_episode_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut generator = EpisodeGenerator::new(config(), EchoIk).unwrap();
        let mut scene = FakeScene::new(3);
        let first = generator.generate(&mut scene).unwrap();
        let second = generator.generate(&mut scene).unwrap();
        write_episode(dir.path(), 0, 0, &first).unwrap();

        let bytes = bincode::serialize(&second).unwrap();
        fs::write(dir.path().join(episode_file_name(1, 0)), &bytes[..bytes.len() / 2]).unwrap();
        fs::write(dir.path().join("w0002-e000000-x.partial"), &bytes).unwrap();

        let (dataset, unreadable) = consolidate(dir.path()).unwrap();
        assert_eq!(dataset.episodes(), std::slice::from_ref(&first));
        assert_eq!(unreadable, 1);
    }

    #[test]
    fn write_leaves_no_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut generator = EpisodeGenerator::new(config(), EchoIk).unwrap();
        let episode = generator.generate(&mut FakeScene::new(3)).unwrap();
        write_episode(dir.path(), 3, 7, &episode).unwrap();
        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(names[0].starts_with("w0003-e000007") && names[0].ends_with(".episode"));
    }

    #[test]
    fn unreadable_files_make_the_summary_incomplete() {
        let summary = GenerationSummary { dataset: Dataset::new(), reports: Vec::new(), unreadable: 2 };
        assert!(!summary.is_complete());
        assert_eq!(summary.lost_episodes(), 2);
    }

    #[test]
    fn panicking_worker_is_reported() {
        let summary = generate_parallel(&config(), 2, 2, |worker| {
            assert!(worker != 0, "simulated crash");
            Ok((FakeScene::new(3), EchoIk))
        })
        .unwrap();
        assert_eq!(summary.dataset.len(), 1);
        let report = summary.failures().next().unwrap();
        assert_eq!(report.worker, 0);
        assert!(matches!(&report.outcome, WorkerOutcome::Failed(r) if r.contains("simulated crash")));
    }
}
