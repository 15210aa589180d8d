//! Per-category queries turning backend payloads into renderable panels.
//!
//! Every query answers with a [`Panel`]: either the prepared data or an
//! empty state saying why there is nothing to show. Missing fields,
//! unrecognised shapes and failed fetches all end up as `Panel::Empty`;
//! only formatter misuse comes back as `Err`.

use rand::Rng;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::chart::{ChartId, ChartStyle};
use crate::config::Config;
use crate::error::{EmptyReason, StatsError};
use crate::format::FormattedMetric;
use crate::normalize::{DistributionEntry, UNKNOWN_LABEL, normalize};
use crate::palette::{CONTAINER_PALETTE, Category, ColorResolver, FALLBACK_PALETTE, palette_color};
use crate::series::{ColorSource, Series, SeriesOptions, ValueScale, build_series, codec_rules};
use crate::source::{Endpoint, SortKey};

/// Label of the HDR bucket in the two-bucket view.
pub const HDR_LABEL: &str = "HDR";
/// Label of the non-HDR bucket, shared with the HDR palette.
pub const NO_HDR_LABEL: &str = "Kein HDR";

/// Outcome of a fetch, as handed over by the fetch collaborator.
pub type Fetched = Result<Value, StatsError>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum Panel<T> {
    Ready(T),
    Empty(EmptyReason),
}

impl<T> Panel<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Panel::Ready(data) => Some(data),
            Panel::Empty(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub id: ChartId,
    pub style: ChartStyle,
    pub series: Series,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub animes: u64,
    pub seasons: u64,
    pub episodes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorageSummary {
    pub total_size: String,
    pub total_duration: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_size_bytes: Option<FormattedMetric>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_duration_ms: Option<FormattedMetric>,
}

/// Whole-percent share of a subset, e.g. HDR episodes among all episodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Share {
    pub percent: u64,
    pub part: u64,
    pub total: u64,
    pub caption: String,
}

impl Share {
    pub fn new(part: u64, total: u64) -> Self {
        let percent = if total == 0 {
            0
        } else {
            (part as f64 / total as f64 * 100.0).round() as u64
        };
        Self {
            percent,
            part,
            total,
            caption: format!("{part} von {total} Episoden"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HdrCharts {
    pub formats: Chart,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub types: Option<Chart>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorageChart {
    pub chart: Chart,
    pub total_size: FormattedMetric,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopEntry {
    pub rank: usize,
    pub display_name: String,
    pub display_metric: String,
    pub link_target: Option<String>,
    pub badge_color: String,
}

/// A prepared panel tagged with where it belongs on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "panel", content = "result", rename_all = "snake_case")]
pub enum PanelUpdate {
    Totals(Panel<Totals>),
    StorageSummary(Panel<StorageSummary>),
    HdrShare(Panel<Share>),
    UhdShare(Panel<Share>),
    Resolution(Panel<Chart>),
    Codec(Panel<Chart>),
    Hdr(Panel<HdrCharts>),
    Container(Panel<Chart>),
    Storage(Panel<StorageChart>),
    TopAnimes(SortKey, Panel<Vec<TopEntry>>),
}

impl PanelUpdate {
    /// The summary this panel is computed from.
    pub fn endpoint(&self) -> Endpoint {
        match self {
            PanelUpdate::Totals(_)
            | PanelUpdate::StorageSummary(_)
            | PanelUpdate::HdrShare(_)
            | PanelUpdate::UhdShare(_) => Endpoint::Overview,
            PanelUpdate::Resolution(_) | PanelUpdate::Storage(_) => Endpoint::Resolution,
            PanelUpdate::Codec(_) => Endpoint::Codec,
            PanelUpdate::Hdr(_) => Endpoint::Hdr,
            PanelUpdate::Container(_) => Endpoint::Container,
            PanelUpdate::TopAnimes(sort_by, _) => Endpoint::TopAnimes(*sort_by),
        }
    }
}

/// Builds every dashboard panel for one refresh cycle.
///
/// Owns the colour memo, so one assembler should live exactly as long as
/// one refresh.
#[derive(Debug)]
pub struct StatsAssembler<'a, R> {
    config: &'a Config,
    colors: ColorResolver<R>,
}

impl<'a, R: Rng> StatsAssembler<'a, R> {
    pub fn new(config: &'a Config, colors: ColorResolver<R>) -> Self {
        Self { config, colors }
    }

    /// All panels fed by `endpoint`.
    pub fn assemble(
        &mut self,
        endpoint: Endpoint,
        fetched: &Fetched,
    ) -> Result<Vec<PanelUpdate>, StatsError> {
        let updates = match endpoint {
            Endpoint::Overview => vec![
                PanelUpdate::Totals(self.totals(fetched)?),
                PanelUpdate::StorageSummary(self.storage_summary(fetched)?),
                PanelUpdate::HdrShare(self.hdr_share(fetched)?),
                PanelUpdate::UhdShare(self.uhd_share(fetched)?),
            ],
            Endpoint::Resolution => vec![
                PanelUpdate::Resolution(self.resolution(fetched)?),
                PanelUpdate::Storage(self.storage(fetched)?),
            ],
            Endpoint::Codec => vec![PanelUpdate::Codec(self.codec(fetched)?)],
            Endpoint::Hdr => vec![PanelUpdate::Hdr(self.hdr(fetched)?)],
            Endpoint::Container => vec![PanelUpdate::Container(self.container(fetched)?)],
            Endpoint::TopAnimes(sort_by) => {
                vec![PanelUpdate::TopAnimes(sort_by, self.top_animes(fetched, sort_by)?)]
            }
        };
        Ok(updates)
    }

    pub fn totals(&self, fetched: &Fetched) -> Result<Panel<Totals>, StatsError> {
        settle("totals", payload(fetched).and_then(|overview| {
            let totals = Totals {
                animes: count_field(overview, "animes_count"),
                seasons: count_field(overview, "seasons_count"),
                episodes: count_field(overview, "episodes_count"),
            };
            if totals.animes == 0 && totals.seasons == 0 && totals.episodes == 0 {
                return Err(StatsError::MissingField("animes_count"));
            }
            Ok(totals)
        }))
    }

    pub fn storage_summary(&self, fetched: &Fetched) -> Result<Panel<StorageSummary>, StatsError> {
        let overview = match payload(fetched) {
            Ok(overview) => overview,
            Err(err) => return settle("storage summary", Err(err)),
        };

        let size = text_field(overview, "total_size_formatted");
        let duration = text_field(overview, "total_duration_formatted");
        if size.is_none() && duration.is_none() {
            return settle(
                "storage summary",
                Err(StatsError::MissingField("total_size_formatted")),
            );
        }

        let total_size_bytes = overview
            .get("total_size_bytes")
            .and_then(Value::as_u64)
            .map(FormattedMetric::bytes)
            .transpose()?;
        let total_duration_ms = overview
            .get("total_duration_ms")
            .and_then(Value::as_u64)
            .map(FormattedMetric::duration);

        Ok(Panel::Ready(StorageSummary {
            total_size: size.unwrap_or(UNKNOWN_LABEL).to_string(),
            total_duration: duration.unwrap_or(UNKNOWN_LABEL).to_string(),
            total_size_bytes,
            total_duration_ms,
        }))
    }

    /// HDR share from the overview's `{hdr, non_hdr}` pair.
    pub fn hdr_share(&self, fetched: &Fetched) -> Result<Panel<Share>, StatsError> {
        settle("hdr share", payload(fetched).and_then(|overview| {
            let pair = field(overview, "hdr_distribution")?;
            let hdr = count_field(pair, "hdr");
            let non_hdr = count_field(pair, "non_hdr");
            let total = hdr.checked_add(non_hdr).ok_or_else(|| {
                StatsError::InvalidShape("hdr and non_hdr counts overflow".to_string())
            })?;
            Ok(Share::new(hdr, total))
        }))
    }

    /// 4K share from the overview's resolution distribution.
    pub fn uhd_share(&self, fetched: &Fetched) -> Result<Panel<Share>, StatsError> {
        settle("4k share", payload(fetched).and_then(|overview| {
            let raw = field(overview, "resolution_distribution")?;
            if is_empty_collection(raw) {
                return Ok(Share::new(0, 0));
            }
            let dist = normalize(raw, "resolution", self.config.duplicate_labels)?;
            Ok(Share::new(dist.count_of("4K").unwrap_or(0), dist.total()))
        }))
    }

    pub fn resolution(&mut self, fetched: &Fetched) -> Result<Panel<Chart>, StatsError> {
        let result = payload(fetched).and_then(|body| {
            let dist = normalize(
                field(body, "distribution")?,
                "resolution",
                self.config.duplicate_labels,
            )?;
            let opts = SeriesOptions::new(ColorSource::Category(Category::Resolution))
                .percentage_labels(self.config.percentage_labels);
            Ok(self.chart(ChartId::Resolution, dist.entries(), &opts))
        });
        settle("resolution", result)
    }

    pub fn codec(&mut self, fetched: &Fetched) -> Result<Panel<Chart>, StatsError> {
        let result = payload(fetched).and_then(|body| {
            let dist = normalize(
                field(body, "distribution")?,
                "codec",
                self.config.duplicate_labels,
            )?;
            let opts = SeriesOptions::new(ColorSource::Category(Category::Codec))
                .top_n(self.config.codec_top_n)
                .collapse(codec_rules(self.config.codec_label_max))
                .percentage_labels(self.config.percentage_labels);
            Ok(self.chart(ChartId::Codec, dist.entries(), &opts))
        });
        settle("codec", result)
    }

    /// HDR formats, either as a format distribution or as the two-bucket
    /// HDR / non-HDR view when the backend only sends the count pair.
    pub fn hdr(&mut self, fetched: &Fetched) -> Result<Panel<HdrCharts>, StatsError> {
        let result = payload(fetched).and_then(|body| {
            let opts = SeriesOptions::new(ColorSource::Category(Category::Hdr))
                .percentage_labels(self.config.percentage_labels);

            let formats = match hdr_pair(body) {
                Some((hdr, non_hdr)) => {
                    let buckets = [
                        DistributionEntry::new(HDR_LABEL, hdr),
                        DistributionEntry::new(NO_HDR_LABEL, non_hdr),
                    ];
                    self.chart(ChartId::Hdr, &buckets, &opts)
                }
                None => {
                    let dist = normalize(
                        field(body, "distribution")?,
                        "format",
                        self.config.duplicate_labels,
                    )?;
                    self.chart(ChartId::Hdr, dist.entries(), &opts)
                }
            };

            let types = match body.get("hdr_types") {
                Some(raw) => match normalize(raw, "format", self.config.duplicate_labels) {
                    Ok(dist) => Some(self.chart(ChartId::HdrTypes, dist.entries(), &opts)),
                    Err(err) => {
                        debug!(%err, "ignoring unusable hdr_types");
                        None
                    }
                },
                None => None,
            };

            Ok(HdrCharts { formats, types })
        });
        settle("hdr", result)
    }

    pub fn container(&mut self, fetched: &Fetched) -> Result<Panel<Chart>, StatsError> {
        let result = payload(fetched).and_then(|body| {
            let dist = normalize(
                field(body, "container_distribution")?,
                "container",
                self.config.duplicate_labels,
            )?;
            let opts = SeriesOptions::new(ColorSource::Sequence(CONTAINER_PALETTE))
                .percentage_labels(self.config.percentage_labels);
            Ok(self.chart(ChartId::Container, dist.entries(), &opts))
        });
        settle("container", result)
    }

    /// Storage per resolution, plotted in GiB, plus the unit-selected total.
    pub fn storage(&mut self, fetched: &Fetched) -> Result<Panel<StorageChart>, StatsError> {
        let dist = match payload(fetched).and_then(|body| {
            normalize(
                field(body, "storage")?,
                "resolution",
                self.config.duplicate_labels,
            )
        }) {
            Ok(dist) => dist,
            Err(err) => return settle("storage", Err(err)),
        };

        let total_size = FormattedMetric::bytes(dist.total())?;
        let opts = SeriesOptions::new(ColorSource::Category(Category::Resolution))
            .top_n(self.config.storage_top_n)
            .scale(ValueScale::Gibibytes);
        let chart = self.chart(ChartId::Storage, dist.entries(), &opts);

        Ok(Panel::Ready(StorageChart { chart, total_size }))
    }

    /// Ranking lines in backend order; the backend already sorted by `sort_by`.
    pub fn top_animes(
        &self,
        fetched: &Fetched,
        sort_by: SortKey,
    ) -> Result<Panel<Vec<TopEntry>>, StatsError> {
        let result = payload(fetched).and_then(|body| {
            let items = match body {
                Value::Array(items) if !items.is_empty() => items,
                Value::Array(_) => {
                    return Err(StatsError::InvalidShape("empty collection".to_string()));
                }
                _ => return Err(StatsError::InvalidShape("expected a list".to_string())),
            };

            items
                .iter()
                .take(self.config.top_entities_limit)
                .enumerate()
                .map(|(idx, item)| {
                    let record = item.as_object().ok_or_else(|| {
                        StatsError::InvalidShape("ranking entry is not an object".to_string())
                    })?;
                    Ok(top_entry(idx, record, sort_by))
                })
                .collect::<Result<Vec<_>, StatsError>>()
        });
        settle("top animes", result)
    }

    /// Colours generated so far for labels outside the fixed palettes.
    pub fn generated_colors(&self) -> usize {
        self.colors.generated_count()
    }

    fn chart(&mut self, id: ChartId, entries: &[DistributionEntry], opts: &SeriesOptions) -> Chart {
        let series = build_series(entries, opts, &mut self.colors);
        debug!(chart = ?id, entries = series.len(), "series built");
        Chart {
            id,
            style: self.config.chart_style(id),
            series,
        }
    }
}

fn top_entry(idx: usize, record: &Map<String, Value>, sort_by: SortKey) -> TopEntry {
    let display_name = record
        .get("name")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .unwrap_or(UNKNOWN_LABEL)
        .to_string();

    let display_metric = match sort_by {
        SortKey::Episodes => format!(
            "{} Episoden",
            record.get("episode_count").and_then(Value::as_u64).unwrap_or(0)
        ),
        SortKey::Size => record
            .get("size_formatted")
            .and_then(Value::as_str)
            .unwrap_or(UNKNOWN_LABEL)
            .to_string(),
    };

    let link_target = match record.get("id") {
        Some(Value::Number(id)) => Some(format!("/anime/{id}")),
        Some(Value::String(id)) if !id.is_empty() => Some(format!("/anime/{id}")),
        _ => None,
    };

    TopEntry {
        rank: idx + 1,
        display_name,
        display_metric,
        link_target,
        badge_color: palette_color(FALLBACK_PALETTE, idx).to_string(),
    }
}

fn is_empty_collection(value: &Value) -> bool {
    match value {
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Recover soft failures into an empty panel; pass hard ones through.
fn settle<T>(panel: &'static str, result: Result<T, StatsError>) -> Result<Panel<T>, StatsError> {
    match result {
        Ok(data) => Ok(Panel::Ready(data)),
        Err(err) => match EmptyReason::from_error(&err) {
            Some(reason) => {
                warn!(panel, %err, "no data for panel");
                Ok(Panel::Empty(reason))
            }
            None => Err(err),
        },
    }
}

fn payload(fetched: &Fetched) -> Result<&Value, StatsError> {
    match fetched {
        Ok(value) => Ok(value),
        Err(StatsError::TransportFailure(msg)) => Err(StatsError::TransportFailure(msg.clone())),
        Err(other) => Err(StatsError::TransportFailure(other.to_string())),
    }
}

fn field<'v>(value: &'v Value, name: &'static str) -> Result<&'v Value, StatsError> {
    value
        .get(name)
        .filter(|v| !v.is_null())
        .ok_or(StatsError::MissingField(name))
}

fn count_field(value: &Value, name: &str) -> u64 {
    value.get(name).and_then(Value::as_u64).unwrap_or(0)
}

fn text_field<'v>(value: &'v Value, name: &str) -> Option<&'v str> {
    value
        .get(name)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// `{hdr, non_hdr}` either under `distribution` or at the top level.
fn hdr_pair(body: &Value) -> Option<(u64, u64)> {
    let is_pair = |v: &Value| {
        v.as_object().is_some_and(|map| {
            !map.is_empty() && map.keys().all(|k| k == "hdr" || k == "non_hdr")
        })
    };

    let pair = match body.get("distribution") {
        Some(dist) if is_pair(dist) => dist,
        Some(_) => return None,
        None if body.get("hdr").is_some() || body.get("non_hdr").is_some() => body,
        None => return None,
    };
    Some((count_field(pair, "hdr"), count_field(pair, "non_hdr")))
}
