use clap::Parser;
use std::path::PathBuf;

use crate::types::Stage;

/// Filter a ROS distribution down to the packages an Alpine repository provides
#[derive(Parser, Debug)]
#[command(name = "rosdistro-filter")]
#[command(
    about = "Filter a ROS distribution and its rosdep mappings against the apk package index"
)]
#[command(version)]
pub struct Cli {
    /// ROS distribution name (e.g. kinetic)
    pub distro: String,

    /// Directory receiving `<distro>/distribution.yaml` and `rosdep/*.yaml`
    #[arg(default_value = "/rosdistro")]
    pub output_dir: PathBuf,

    /// JSON configuration file overriding the defaults
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Read the package listing from a saved `apk search -q` output
    /// instead of querying apk
    #[arg(long, conflicts_with = "refresh_index")]
    pub index_file: Option<PathBuf>,

    /// Run `apk update` before querying the index
    #[arg(long)]
    pub refresh_index: bool,

    /// Which outputs to produce
    #[arg(long, value_enum, default_value_t = Stage::All)]
    pub stage: Stage,

    /// Dry-run mode: fetch and filter everything but write no files.
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }
}
