//! Refresh cycles and the dashboard state they update.
//!
//! Each refresh gets a new generation number. Results are only written back
//! if they belong to the newest generation issued for their endpoint, so a
//! slow response from an older refresh can never overwrite a newer one.

use std::collections::HashMap;

use chrono::{DateTime, Local};
use rand::Rng;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::assembler::{
    Chart, Fetched, HdrCharts, Panel, PanelUpdate, Share, StatsAssembler, StorageChart,
    StorageSummary, TopEntry, Totals,
};
use crate::config::Config;
use crate::error::StatsError;
use crate::palette::ColorResolver;
use crate::source::{Endpoint, PayloadSource, SortKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RefreshTicket {
    pub generation: u64,
}

/// Latest applied panel for every slot on the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Panels {
    pub totals: Option<Panel<Totals>>,
    pub storage_summary: Option<Panel<StorageSummary>>,
    pub hdr_share: Option<Panel<Share>>,
    pub uhd_share: Option<Panel<Share>>,
    pub resolution: Option<Panel<Chart>>,
    pub codec: Option<Panel<Chart>>,
    pub hdr: Option<Panel<HdrCharts>>,
    pub container: Option<Panel<Chart>>,
    pub storage: Option<Panel<StorageChart>>,
    pub top_by_episodes: Option<Panel<Vec<TopEntry>>>,
    pub top_by_size: Option<Panel<Vec<TopEntry>>>,
}

impl Panels {
    fn store(&mut self, update: PanelUpdate) {
        match update {
            PanelUpdate::Totals(p) => self.totals = Some(p),
            PanelUpdate::StorageSummary(p) => self.storage_summary = Some(p),
            PanelUpdate::HdrShare(p) => self.hdr_share = Some(p),
            PanelUpdate::UhdShare(p) => self.uhd_share = Some(p),
            PanelUpdate::Resolution(p) => self.resolution = Some(p),
            PanelUpdate::Codec(p) => self.codec = Some(p),
            PanelUpdate::Hdr(p) => self.hdr = Some(p),
            PanelUpdate::Container(p) => self.container = Some(p),
            PanelUpdate::Storage(p) => self.storage = Some(p),
            PanelUpdate::TopAnimes(SortKey::Episodes, p) => self.top_by_episodes = Some(p),
            PanelUpdate::TopAnimes(SortKey::Size, p) => self.top_by_size = Some(p),
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct Dashboard {
    generation: u64,
    #[serde(skip)]
    issued: HashMap<Endpoint, u64>,
    refreshed_at: Option<DateTime<Local>>,
    panels: Panels,
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn panels(&self) -> &Panels {
        &self.panels
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Local>> {
        self.refreshed_at
    }

    /// Start a refresh of `endpoints`. Older tickets for them go stale.
    pub fn begin(&mut self, endpoints: &[Endpoint]) -> RefreshTicket {
        self.generation += 1;
        for endpoint in endpoints {
            self.issued.insert(*endpoint, self.generation);
        }
        debug!(generation = self.generation, ?endpoints, "refresh issued");
        RefreshTicket {
            generation: self.generation,
        }
    }

    pub fn is_current(&self, ticket: RefreshTicket, endpoint: Endpoint) -> bool {
        self.issued.get(&endpoint) == Some(&ticket.generation)
    }

    /// Store `update` if `ticket` is still the newest for its endpoint.
    /// Returns whether it was applied.
    pub fn apply(&mut self, ticket: RefreshTicket, update: PanelUpdate) -> bool {
        let endpoint = update.endpoint();
        if !self.is_current(ticket, endpoint) {
            info!(
                ?endpoint,
                stale = ticket.generation,
                current = ?self.issued.get(&endpoint),
                "dropping stale refresh result"
            );
            return false;
        }
        self.panels.store(update);
        self.refreshed_at = Some(Local::now());
        true
    }

    /// Fetch every endpoint in parallel, then build and apply all panels.
    ///
    /// Each call uses a fresh colour memo seeded from `rng`.
    pub fn refresh<S, R>(
        &mut self,
        source: &S,
        config: &Config,
        rng: R,
    ) -> Result<RefreshTicket, StatsError>
    where
        S: PayloadSource + Sync,
        R: Rng,
    {
        let ticket = self.begin(&Endpoint::ALL);

        let fetched: Vec<(Endpoint, Fetched)> = Endpoint::ALL
            .par_iter()
            .map(|&endpoint| (endpoint, source.fetch(endpoint)))
            .collect();

        let mut assembler = StatsAssembler::new(config, ColorResolver::new(rng));
        for (endpoint, payload) in &fetched {
            for update in assembler.assemble(*endpoint, payload)? {
                self.apply(ticket, update);
            }
        }
        debug!(
            generation = ticket.generation,
            generated_colors = assembler.generated_colors(),
            "refresh assembled"
        );
        Ok(ticket)
    }
}
