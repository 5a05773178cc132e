//! Type-safe selection types for the filter pipeline

use strum::{Display, EnumIter, EnumString};

/// Which outputs a run produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[derive(Display, EnumString, EnumIter, clap::ValueEnum)]
#[strum(serialize_all = "lowercase")]
pub enum Stage {
    /// Filtered distribution manifest and rosdep mappings
    #[default]
    All,
    /// Only `<distro>/distribution.yaml`
    Distribution,
    /// Only `rosdep/base.yaml` and `rosdep/python.yaml`
    Rosdep,
}

impl Stage {
    pub fn includes_distribution(&self) -> bool {
        matches!(self, Self::All | Self::Distribution)
    }

    pub fn includes_rosdep(&self) -> bool {
        matches!(self, Self::All | Self::Rosdep)
    }
}
