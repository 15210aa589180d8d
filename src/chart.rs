//! Presentation settings handed to the renderer alongside each series.
//!
//! A chart's style is built in three layers, later layers winning field by field:
//!
//! 1. [`ChartStyle::base`]: shared defaults for every chart.
//! 2. [`ChartId::defaults`]: what each chart needs (kind, title, axis).
//! 3. A user [`StyleOverride`] from the config file.
//!
//! A `None` field in an override inherits from the layer below.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Pie,
    Doughnut,
    Bar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegendPosition {
    Top,
    Right,
    Bottom,
    Left,
    Hidden,
}

/// Every chart the assembler produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartId {
    Resolution,
    Codec,
    Hdr,
    HdrTypes,
    Storage,
    Container,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartStyle {
    pub kind: ChartKind,
    pub title: Option<String>,
    pub legend: LegendPosition,
    pub legend_padding: u32,
    pub legend_box_width: u32,
    pub legend_font_size: u32,
    pub tooltip_padding: u32,
    pub begin_at_zero: bool,
    pub axis_label: Option<String>,
    pub dataset_label: Option<String>,
}

impl ChartStyle {
    pub fn base() -> Self {
        Self {
            kind: ChartKind::Pie,
            title: None,
            legend: LegendPosition::Right,
            legend_padding: 20,
            legend_box_width: 15,
            legend_font_size: 12,
            tooltip_padding: 12,
            begin_at_zero: false,
            axis_label: None,
            dataset_label: None,
        }
    }

    /// Fully layered style for `id`.
    pub fn resolve(id: ChartId, user: Option<&StyleOverride>) -> Self {
        let style = id.defaults().apply(Self::base());
        match user {
            Some(user) => user.apply(style),
            None => style,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StyleOverride {
    pub kind: Option<ChartKind>,
    pub title: Option<String>,
    pub legend: Option<LegendPosition>,
    pub legend_padding: Option<u32>,
    pub legend_box_width: Option<u32>,
    pub legend_font_size: Option<u32>,
    pub tooltip_padding: Option<u32>,
    pub begin_at_zero: Option<bool>,
    pub axis_label: Option<String>,
    pub dataset_label: Option<String>,
}

impl StyleOverride {
    pub fn apply(&self, mut style: ChartStyle) -> ChartStyle {
        if let Some(kind) = self.kind {
            style.kind = kind;
        }
        if let Some(title) = &self.title {
            style.title = Some(title.clone());
        }
        if let Some(legend) = self.legend {
            style.legend = legend;
        }
        if let Some(padding) = self.legend_padding {
            style.legend_padding = padding;
        }
        if let Some(width) = self.legend_box_width {
            style.legend_box_width = width;
        }
        if let Some(size) = self.legend_font_size {
            style.legend_font_size = size;
        }
        if let Some(padding) = self.tooltip_padding {
            style.tooltip_padding = padding;
        }
        if let Some(begin_at_zero) = self.begin_at_zero {
            style.begin_at_zero = begin_at_zero;
        }
        if let Some(label) = &self.axis_label {
            style.axis_label = Some(label.clone());
        }
        if let Some(label) = &self.dataset_label {
            style.dataset_label = Some(label.clone());
        }
        style
    }
}

impl ChartId {
    pub fn defaults(self) -> StyleOverride {
        match self {
            ChartId::Resolution => StyleOverride {
                kind: Some(ChartKind::Pie),
                title: Some("Auflösungsverteilung".to_string()),
                ..Default::default()
            },
            ChartId::Codec => StyleOverride {
                kind: Some(ChartKind::Doughnut),
                title: Some("Codec-Verteilung".to_string()),
                ..Default::default()
            },
            ChartId::Hdr => StyleOverride {
                kind: Some(ChartKind::Pie),
                title: Some("HDR-Formate".to_string()),
                ..Default::default()
            },
            ChartId::HdrTypes => StyleOverride {
                kind: Some(ChartKind::Pie),
                title: Some("HDR-Typen".to_string()),
                ..Default::default()
            },
            ChartId::Storage => StyleOverride {
                kind: Some(ChartKind::Bar),
                title: Some("Speicherverbrauch nach Auflösung".to_string()),
                begin_at_zero: Some(true),
                axis_label: Some("Speichergröße (GB)".to_string()),
                dataset_label: Some("Speichergröße (GB)".to_string()),
                ..Default::default()
            },
            ChartId::Container => StyleOverride {
                kind: Some(ChartKind::Bar),
                legend: Some(LegendPosition::Hidden),
                begin_at_zero: Some(true),
                dataset_label: Some("Anzahl".to_string()),
                ..Default::default()
            },
        }
    }
}
