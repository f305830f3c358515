//! Subcommand implementations.

use crate::cli::{Cli, Command, FeedbackArgs, GenerateArgs, InspectArgs, SceneArgs};
use anyhow::{bail, Context, Result};
use datagen::{
    generate_parallel, generate_sequential, sample_reachable, ArmIk, Dataset, DatagenError, Episode,
    EpisodeGenerator, FeedbackDriver, GenerationConfig, JointConfiguration, NearestNeighborPropagator, PoseSampler,
    ProjectStore, SceneController, SimScene, TrajectoryConfig,
};
use physics::{ArmDescription, ArmModel};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;
use std::thread;
use tracing::{info, warn};

const SAMPLE_GIF: &str = "sample.gif";
const FEEDBACK_GIF: &str = "feedback.gif";
const GIF_FPS: u32 = 50;
const HOME_ANGLE: f32 = 0.2;

pub fn run(cli: Cli) -> Result<()> {
    let store = cli.data_root.map_or_else(ProjectStore::from_env, ProjectStore::new);
    match cli.command {
        Command::Generate(args) => generate(&store, &args),
        Command::Feedback(args) => feedback(&store, &args),
        Command::Inspect(args) => inspect(&store, &args),
    }
}

/// The arm to simulate and the name of its end-effector link.
fn load_arm(robot: Option<&Path>) -> Result<(ArmModel, String)> {
    let description = match robot {
        Some(path) => ArmDescription::from_path(path)
            .with_context(|| format!("loading robot description {}", path.display()))?,
        None => ArmDescription::kuka_iiwa(),
    };
    let effector = description.end_effector.clone();
    let model = ArmModel::from_description(description).context("invalid robot description")?;
    info!(arm = model.name(), joints = model.joint_count(), effector = %effector, "robot loaded");
    Ok((model, effector))
}

fn generation_config(scene: &SceneArgs, model: &ArmModel, steps: usize) -> GenerationConfig {
    GenerationConfig {
        resolution: scene.pixels,
        with_depth: scene.depth,
        home: vec![HOME_ANGLE; model.joint_count()],
        max_ik_attempts: scene.max_ik_attempts,
        seed: scene.seed,
        trajectory: TrajectoryConfig { base_steps: steps, ..TrajectoryConfig::default() },
        ..GenerationConfig::default()
    }
}

fn generate(store: &ProjectStore, args: &GenerateArgs) -> Result<()> {
    let (model, effector) = load_arm(args.scene.robot.as_deref())?;
    let config = generation_config(&args.scene, &model, args.steps);
    info!(
        project = %args.project,
        episodes = args.episodes,
        resolution = config.resolution,
        depth = config.with_depth,
        seed = config.seed,
        "generating dataset"
    );

    let (dataset, lost) = match args.workers {
        None => {
            let mut scene = SimScene::new(model.clone());
            let ik = ArmIk::new(model, &effector)?;
            let mut generator = EpisodeGenerator::new(config, ik)?;
            let dataset = generate_sequential(&mut generator, &mut scene, args.episodes, |ds| {
                store.save(ds, &args.project).map(|_| ())
            })?;
            if dataset.is_empty() {
                // No checkpoint ran; still leave a project behind as the parallel path does.
                store.save(&dataset, &args.project)?;
            }
            (dataset, 0)
        }
        Some(requested) => {
            let workers = if requested == 0 { available_workers() } else { requested };
            let summary = generate_parallel(&config, args.episodes, workers, |_| {
                Ok::<_, DatagenError>((SimScene::new(model.clone()), ArmIk::new(model.clone(), &effector)?))
            })?;
            for report in summary.failures() {
                warn!(worker = report.worker, lost = report.lost(), "worker failed: {:?}", report.outcome);
            }
            let lost = summary.lost_episodes();
            store.save(&summary.dataset, &args.project)?;
            (summary.dataset, lost)
        }
    };

    let dir = store.project_dir(&args.project);
    info!(episodes = dataset.len(), frames = dataset.total_frames(), dir = %dir.display(), "dataset saved");
    if let Some(last) = dataset.episodes().last() {
        export_gif(last, &dir.join(SAMPLE_GIF))?;
    }
    if lost > 0 {
        bail!("{lost} of {} episodes were lost to failed workers or unreadable scratch files", args.episodes);
    }
    Ok(())
}

fn available_workers() -> usize {
    thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}

fn export_gif(episode: &Episode, path: &Path) -> Result<()> {
    render::write_gif(episode.frames().iter().map(|f| &f.rgb), path, GIF_FPS)
        .with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), frames = episode.len(), "gif written");
    Ok(())
}

fn feedback(store: &ProjectStore, args: &FeedbackArgs) -> Result<()> {
    let dataset: Dataset =
        store.load(&args.project).with_context(|| format!("loading project `{}`", args.project))?;
    let (model, effector) = load_arm(args.scene.robot.as_deref())?;
    let config = generation_config(&args.scene, &model, TrajectoryConfig::default().base_steps);

    let mut scene = SimScene::new(model.clone());
    let home = JointConfiguration::new(config.home.clone());
    scene.set_joint_configuration(&home)?;

    let mut ik = ArmIk::new(model, &effector)?;
    let mut rng = StdRng::seed_from_u64(config.seed);
    let sampler = PoseSampler::new(&config.sampler)?;
    let reach = sample_reachable(&sampler, &mut rng, &mut ik, &home, config.max_ik_attempts)?;
    scene.place_marker(reach.target.position)?;

    let mut predictor = NearestNeighborPropagator::new(dataset, args.context)?;
    let driver = FeedbackDriver { steps: args.steps, recorder: config.recorder() };
    let rollout = driver.run(&mut scene, &mut predictor, reach.target)?;

    let miss = scene.end_effector()?.distance(reach.target.position);
    info!(steps = rollout.len(), target = ?reach.target.position, miss, "feedback rollout complete");
    export_gif(&rollout, &store.project_dir(&args.project).join(FEEDBACK_GIF))
}

fn inspect(store: &ProjectStore, args: &InspectArgs) -> Result<()> {
    let manifest = store.load_manifest(&args.project)?;
    info!(
        project = %manifest.project,
        episodes = manifest.episodes,
        frames = manifest.total_frames,
        resolution = ?manifest.resolution,
        depth = ?manifest.with_depth,
        joints = ?manifest.joint_count,
        saved_at = %manifest.saved_at,
        "manifest"
    );
    let dataset = store.load(&args.project)?;
    for (i, episode) in dataset.episodes().iter().enumerate() {
        info!(
            episode = i,
            frames = episode.len(),
            approach = episode.approach_len(),
            settle = episode.settle_frames(),
            target = ?episode.target().position,
            "episode"
        );
    }
    Ok(())
}
