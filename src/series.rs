use rand::Rng;
use serde::Serialize;

use crate::format::to_gibibytes;
use crate::normalize::DistributionEntry;
use crate::palette::{Category, ColorResolver, palette_color};

/// Marker appended to truncated labels.
pub const ELLIPSIS: &str = "...";

/// Index-aligned labels, values and colours, ready for a chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Series {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub colors: Vec<String>,
}

impl Series {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Folds label variants into one display label. First matching rule wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum CollapseRule {
    /// Any label containing one of `needles` becomes `canonical`.
    Contains {
        needles: Vec<String>,
        canonical: String,
    },
    /// Labels longer than `max_chars` are cut and suffixed with [`ELLIPSIS`].
    Truncate { max_chars: usize },
}

impl CollapseRule {
    pub fn contains(needles: &[&str], canonical: &str) -> Self {
        Self::Contains {
            needles: needles.iter().map(|n| n.to_string()).collect(),
            canonical: canonical.to_string(),
        }
    }

    pub fn apply(&self, label: &str) -> Option<String> {
        match self {
            Self::Contains { needles, canonical } => needles
                .iter()
                .any(|needle| label.contains(needle.as_str()))
                .then(|| canonical.clone()),
            Self::Truncate { max_chars } => (label.chars().count() > *max_chars).then(|| {
                let mut cut: String = label.chars().take(*max_chars).collect();
                cut.push_str(ELLIPSIS);
                cut
            }),
        }
    }
}

/// Apply `rules` in order; an unmatched label passes through unchanged.
pub fn collapse_label(rules: &[CollapseRule], label: &str) -> String {
    rules
        .iter()
        .find_map(|rule| rule.apply(label))
        .unwrap_or_else(|| label.to_string())
}

/// HEVC/x265 and AVC/x264 variants fold together, long names get cut.
pub fn codec_rules(max_chars: usize) -> Vec<CollapseRule> {
    vec![
        CollapseRule::contains(&["HEVC", "x265"], "HEVC"),
        CollapseRule::contains(&["AVC", "x264"], "AVC"),
        CollapseRule::Truncate { max_chars },
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSource {
    /// Fixed taxonomy palette, falling back to memoised random colours.
    Category(Category),
    /// Colours assigned by position.
    Sequence(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValueScale {
    #[default]
    Raw,
    /// Values are bytes and get plotted in GiB.
    Gibibytes,
}

#[derive(Debug, Clone)]
pub struct SeriesOptions {
    pub top_n: Option<usize>,
    pub collapse: Vec<CollapseRule>,
    pub percentage_labels: bool,
    pub scale: ValueScale,
    pub colors: ColorSource,
}

impl SeriesOptions {
    pub fn new(colors: ColorSource) -> Self {
        Self {
            top_n: None,
            collapse: Vec::new(),
            percentage_labels: false,
            scale: ValueScale::Raw,
            colors,
        }
    }

    pub fn top_n(mut self, n: usize) -> Self {
        self.top_n = Some(n);
        self
    }

    pub fn collapse(mut self, rules: Vec<CollapseRule>) -> Self {
        self.collapse = rules;
        self
    }

    pub fn percentage_labels(mut self, enabled: bool) -> Self {
        self.percentage_labels = enabled;
        self
    }

    pub fn scale(mut self, scale: ValueScale) -> Self {
        self.scale = scale;
        self
    }
}

/// Share of `count` in `total` as a percentage. A zero total gives `0.0`.
pub fn percentage(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

/// Build a chart series from entries that are already in display order.
///
/// Entries past `top_n` are dropped, not bucketed. Collapsing runs before
/// colour lookup; percentages are relative to the entries kept.
pub fn build_series<R: Rng>(
    entries: &[DistributionEntry],
    opts: &SeriesOptions,
    resolver: &mut ColorResolver<R>,
) -> Series {
    let kept = match opts.top_n {
        Some(n) => &entries[..n.min(entries.len())],
        None => entries,
    };
    let total = kept.iter().fold(0u64, |acc, e| acc.saturating_add(e.count));

    let mut series = Series {
        labels: Vec::with_capacity(kept.len()),
        values: Vec::with_capacity(kept.len()),
        colors: Vec::with_capacity(kept.len()),
    };

    for (idx, entry) in kept.iter().enumerate() {
        let label = collapse_label(&opts.collapse, &entry.label);

        let color = match opts.colors {
            ColorSource::Category(category) => resolver.resolve(category, &label),
            ColorSource::Sequence(palette) => palette_color(palette, idx).to_string(),
        };

        let value = match opts.scale {
            ValueScale::Raw => entry.count as f64,
            ValueScale::Gibibytes => to_gibibytes(entry.count),
        };

        let label = if opts.percentage_labels {
            format!("{label} ({:.1}%)", percentage(entry.count, total))
        } else {
            label
        };

        series.labels.push(label);
        series.values.push(value);
        series.colors.push(color);
    }

    series
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::CONTAINER_PALETTE;
    use proptest::prelude::*;

    fn entries(pairs: &[(&str, u64)]) -> Vec<DistributionEntry> {
        pairs
            .iter()
            .map(|(label, count)| DistributionEntry::new(*label, *count))
            .collect()
    }

    #[test]
    fn test_codec_collapsing() {
        let rules = codec_rules(15);
        assert_eq!(collapse_label(&rules, "HEVC (x265 Main10)"), "HEVC");
        assert_eq!(collapse_label(&rules, "x265"), "HEVC");
        assert_eq!(collapse_label(&rules, "AVC High@L4.1"), "AVC");
        assert_eq!(collapse_label(&rules, "libx264"), "AVC");
        assert_eq!(collapse_label(&rules, "AV1"), "AV1");
    }

    #[test]
    fn test_long_label_truncates() {
        let rules = codec_rules(15);
        let label = "abcdefghijklmnopqrst";
        assert_eq!(collapse_label(&rules, label), "abcdefghijklmno...");
        // exactly at the limit stays intact
        assert_eq!(collapse_label(&rules, "abcdefghijklmno"), "abcdefghijklmno");
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let rules = codec_rules(3);
        assert_eq!(collapse_label(&rules, "Some HEVC encode"), "HEVC");
    }

    #[test]
    fn test_percentage_labels() {
        let mut resolver = ColorResolver::seeded(0);
        let opts = SeriesOptions::new(ColorSource::Category(Category::Resolution))
            .percentage_labels(true);
        let series = build_series(&entries(&[("X", 3), ("Y", 1)]), &opts, &mut resolver);
        assert_eq!(series.labels, vec!["X (75.0%)", "Y (25.0%)"]);
        assert_eq!(series.values, vec![3.0, 1.0]);
    }

    #[test]
    fn test_percentage_of_zero_total() {
        let mut resolver = ColorResolver::seeded(0);
        let opts = SeriesOptions::new(ColorSource::Category(Category::Resolution))
            .percentage_labels(true);
        let series = build_series(&entries(&[("4K", 0), ("HD", 0)]), &opts, &mut resolver);
        assert_eq!(series.labels, vec!["4K (0.0%)", "HD (0.0%)"]);
    }

    #[test]
    fn test_top_n_keeps_highest() {
        let mut resolver = ColorResolver::seeded(0);
        let sorted = entries(&[
            ("a", 80),
            ("b", 70),
            ("c", 60),
            ("d", 50),
            ("e", 40),
            ("f", 30),
            ("g", 20),
            ("h", 10),
        ]);
        let opts = SeriesOptions::new(ColorSource::Category(Category::Codec)).top_n(5);
        let series = build_series(&sorted, &opts, &mut resolver);
        assert_eq!(series.len(), 5);
        assert_eq!(series.values, vec![80.0, 70.0, 60.0, 50.0, 40.0]);
    }

    #[test]
    fn test_colors_follow_collapsed_label() {
        let mut resolver = ColorResolver::seeded(0);
        let opts =
            SeriesOptions::new(ColorSource::Category(Category::Codec)).collapse(codec_rules(15));
        let series = build_series(
            &entries(&[("HEVC Main 10", 4), ("x264", 2)]),
            &opts,
            &mut resolver,
        );
        assert_eq!(series.labels, vec!["HEVC", "AVC"]);
        assert_eq!(series.colors, vec!["#5cb85c", "#5bc0de"]);
    }

    #[test]
    fn test_sequence_colors_by_position() {
        let mut resolver = ColorResolver::seeded(0);
        let opts = SeriesOptions::new(ColorSource::Sequence(CONTAINER_PALETTE));
        let series = build_series(&entries(&[("mkv", 9), ("mp4", 3)]), &opts, &mut resolver);
        assert_eq!(series.colors, vec!["#607D8B", "#795548"]);
        assert_eq!(resolver.generated_count(), 0);
    }

    #[test]
    fn test_gibibyte_scale() {
        let mut resolver = ColorResolver::seeded(0);
        let opts = SeriesOptions::new(ColorSource::Category(Category::Resolution))
            .scale(ValueScale::Gibibytes);
        let series = build_series(
            &entries(&[("4K", 2 * 1024 * 1024 * 1024)]),
            &opts,
            &mut resolver,
        );
        assert_eq!(series.values, vec![2.0]);
    }

    #[test]
    fn test_huge_counts_saturate_total() {
        let mut resolver = ColorResolver::seeded(0);
        let opts = SeriesOptions::new(ColorSource::Category(Category::Hdr)).percentage_labels(true);
        let series = build_series(
            &entries(&[("HDR", u64::MAX), ("Kein HDR", u64::MAX)]),
            &opts,
            &mut resolver,
        );
        assert_eq!(series.len(), 2);
        assert!(series.labels[0].starts_with("HDR ("));
    }

    proptest! {
        #[test]
        fn prop_series_arrays_aligned(
            counts in prop::collection::vec(0u64..1000, 0..30),
            top_n in prop::option::of(0usize..40),
            with_pct in any::<bool>(),
        ) {
            let sorted: Vec<DistributionEntry> = counts
                .iter()
                .enumerate()
                .map(|(i, c)| DistributionEntry::new(format!("label number {i}"), *c))
                .collect();
            let mut opts = SeriesOptions::new(ColorSource::Category(Category::Codec))
                .collapse(codec_rules(15))
                .percentage_labels(with_pct);
            opts.top_n = top_n;

            let mut resolver = ColorResolver::seeded(9);
            let series = build_series(&sorted, &opts, &mut resolver);
            prop_assert_eq!(series.labels.len(), series.values.len());
            prop_assert_eq!(series.values.len(), series.colors.len());
            prop_assert_eq!(series.len(), top_n.map_or(counts.len(), |n| n.min(counts.len())));
        }
    }
}
