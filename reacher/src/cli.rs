use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "reacher", version, about = "Generate simulated robot-arm reaching datasets")]
pub struct Cli {
    /// Directory holding one folder per project. Defaults to
    /// `$REACHER_DATA_ROOT`, then `$HOME/.reacher`.
    #[arg(long, global = true)]
    pub data_root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Record reaching episodes and save them as a project dataset.
    Generate(GenerateArgs),
    /// Drive the arm from a predictor built on a saved dataset.
    Feedback(FeedbackArgs),
    /// Summarize a saved project.
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
pub struct SceneArgs {
    /// Side length of the captured images.
    #[arg(short = 'm', long = "pixels", default_value_t = 224)]
    pub pixels: u32,

    /// Record a metric depth image alongside every RGB frame.
    #[arg(long)]
    pub depth: bool,

    #[arg(long, default_value_t = 1)]
    pub seed: u64,

    /// Target draws allowed per episode before giving up.
    #[arg(long, default_value_t = 1000)]
    pub max_ik_attempts: usize,

    /// Robot description JSON. Defaults to the built-in 7-joint iiwa arm.
    #[arg(long)]
    pub robot: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    #[arg(short, long, default_value = "kuka_reaching")]
    pub project: String,

    #[arg(short = 'n', long, default_value_t = 300)]
    pub episodes: usize,

    /// Run on worker threads: `0` for one per logical core (hyperthreads
    /// included, as reported by the OS), otherwise the count.
    /// Without this flag episodes are generated sequentially and
    /// checkpointed after each one.
    #[arg(short = 'j', long)]
    pub workers: Option<usize>,

    /// Fewest interpolation steps per episode.
    #[arg(long, default_value_t = 100)]
    pub steps: usize,

    #[command(flatten)]
    pub scene: SceneArgs,
}

#[derive(Args, Debug)]
pub struct FeedbackArgs {
    #[arg(short, long, default_value = "kuka_reaching")]
    pub project: String,

    /// Rollout length.
    #[arg(long, default_value_t = 100)]
    pub steps: usize,

    /// Observations the predictor matches against.
    #[arg(long, default_value_t = 8)]
    pub context: usize,

    #[command(flatten)]
    pub scene: SceneArgs,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    #[arg(short, long, default_value = "kuka_reaching")]
    pub project: String,
}
