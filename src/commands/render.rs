use std::path::Path;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;

use crate::config::Config;
use crate::error::StatsError;
use crate::normalize::DuplicateLabels;
use crate::refresh::{Dashboard, RefreshTicket};
use crate::source::DirectorySource;

/// Command-line settings that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub percentage_labels: bool,
    pub codec_top_n: Option<usize>,
    pub keep_duplicates: bool,
}

impl Overrides {
    pub fn apply(&self, config: &mut Config) {
        if self.percentage_labels {
            config.percentage_labels = true;
        }
        if let Some(n) = self.codec_top_n {
            config.codec_top_n = n;
        }
        if self.keep_duplicates {
            config.duplicate_labels = DuplicateLabels::Keep;
        }
    }
}

/// Seeded generator when `seed` is given, OS entropy otherwise.
pub fn color_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Refresh `dashboard` from the summaries saved in `directory`.
pub fn run_render(
    dashboard: &mut Dashboard,
    directory: &str,
    config: &Config,
    seed: Option<u64>,
) -> Result<RefreshTicket, StatsError> {
    let root = Path::new(directory);
    if !root.is_dir() {
        return Err(StatsError::NotADirectory(directory.to_string()));
    }

    let source = DirectorySource::new(root);
    let ticket = dashboard.refresh(&source, config, color_rng(seed))?;
    info!(
        generation = ticket.generation,
        directory, "dashboard refreshed"
    );
    Ok(ticket)
}
