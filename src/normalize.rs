use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StatsError;

/// Label used when a record carries no usable key.
pub const UNKNOWN_LABEL: &str = "Unbekannt";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistributionEntry {
    pub label: String,
    pub count: u64,
}

impl DistributionEntry {
    pub fn new(label: impl Into<String>, count: u64) -> Self {
        Self {
            label: label.into(),
            count,
        }
    }
}

/// What to do when the same label shows up more than once in a payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateLabels {
    /// Sum the counts into the first occurrence.
    #[default]
    Merge,
    /// Keep every occurrence as its own entry.
    Keep,
}

/// Entries sorted by count, highest first. Ties keep their input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CanonicalDistribution {
    entries: Vec<DistributionEntry>,
}

impl CanonicalDistribution {
    pub fn entries(&self) -> &[DistributionEntry] {
        &self.entries
    }

    pub fn total(&self) -> u64 {
        self.entries.iter().map(|e| e.count).sum()
    }

    pub fn count_of(&self, label: &str) -> Option<u64> {
        self.entries
            .iter()
            .filter(|e| e.label == label)
            .map(|e| e.count)
            .reduce(|a, b| a + b)
    }
}

/// Turn a record list or a key -> count mapping into a canonical distribution.
///
/// Records are objects holding `key_field` and `count`; a missing, null or
/// empty key becomes [`UNKNOWN_LABEL`]. Anything else, including an empty
/// collection, is `InvalidShape`.
pub fn normalize(
    payload: &Value,
    key_field: &str,
    duplicates: DuplicateLabels,
) -> Result<CanonicalDistribution, StatsError> {
    let raw = match payload {
        Value::Array(items) if !items.is_empty() => items
            .iter()
            .map(|item| parse_record(item, key_field))
            .collect::<Result<Vec<_>, _>>()?,
        Value::Object(map) if !map.is_empty() => map
            .iter()
            .map(|(key, count)| {
                let label = if key.is_empty() { UNKNOWN_LABEL } else { key };
                Ok(DistributionEntry::new(label, parse_count(Some(count))?))
            })
            .collect::<Result<Vec<_>, StatsError>>()?,
        Value::Array(_) | Value::Object(_) => {
            return Err(StatsError::InvalidShape("empty collection".to_string()));
        }
        other => {
            return Err(StatsError::InvalidShape(format!(
                "expected a list or mapping, got {}",
                kind(other)
            )));
        }
    };

    let mut entries = match duplicates {
        DuplicateLabels::Merge => merge_duplicates(raw)?,
        DuplicateLabels::Keep => raw,
    };
    // total() and count_of() rely on the sum fitting in a u64
    if entries
        .iter()
        .try_fold(0u64, |acc, e| acc.checked_add(e.count))
        .is_none()
    {
        return Err(StatsError::InvalidShape(
            "counts add up past the largest representable total".to_string(),
        ));
    }
    // Vec::sort_by is stable, which gives ties their first-seen order.
    entries.sort_by(|a, b| b.count.cmp(&a.count));

    Ok(CanonicalDistribution { entries })
}

fn parse_record(item: &Value, key_field: &str) -> Result<DistributionEntry, StatsError> {
    let record = item.as_object().ok_or_else(|| {
        StatsError::InvalidShape(format!("record is {}, not an object", kind(item)))
    })?;

    let label = match record.get(key_field) {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) if n.as_f64() != Some(0.0) => n.to_string(),
        _ => UNKNOWN_LABEL.to_string(),
    };

    Ok(DistributionEntry::new(label, parse_count(record.get("count"))?))
}

fn parse_count(value: Option<&Value>) -> Result<u64, StatsError> {
    let Some(Value::Number(number)) = value else {
        return Err(StatsError::InvalidShape(
            "count is missing or not a number".to_string(),
        ));
    };

    if let Some(n) = number.as_u64() {
        return Ok(n);
    }
    match number.as_f64() {
        Some(f) if f.is_finite() && f >= 0.0 => Ok(f.round() as u64),
        _ => Err(StatsError::InvalidShape(format!(
            "count must be non-negative, got {number}"
        ))),
    }
}

fn merge_duplicates(raw: Vec<DistributionEntry>) -> Result<Vec<DistributionEntry>, StatsError> {
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(raw.len());
    let mut merged: Vec<DistributionEntry> = Vec::with_capacity(raw.len());

    for entry in raw {
        match positions.get(&entry.label) {
            Some(&idx) => {
                let slot = &mut merged[idx];
                slot.count = slot.count.checked_add(entry.count).ok_or_else(|| {
                    StatsError::InvalidShape(format!("count for `{}` overflows", entry.label))
                })?;
            }
            None => {
                positions.insert(entry.label.clone(), merged.len());
                merged.push(entry);
            }
        }
    }
    Ok(merged)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn labels(dist: &CanonicalDistribution) -> Vec<&str> {
        dist.entries().iter().map(|e| e.label.as_str()).collect()
    }

    #[test]
    fn test_record_list() {
        let payload = json!([
            {"resolution": "HD", "count": 3},
            {"resolution": "4K", "count": 10},
            {"resolution": "SD", "count": 1},
        ]);
        let dist = normalize(&payload, "resolution", DuplicateLabels::Merge).unwrap();
        assert_eq!(labels(&dist), vec!["4K", "HD", "SD"]);
        assert_eq!(dist.total(), 14);
    }

    #[test]
    fn test_overflowing_counts_are_invalid() {
        let merged = json!([
            {"codec": "AV1", "count": u64::MAX},
            {"codec": "AV1", "count": 1},
        ]);
        assert!(matches!(
            normalize(&merged, "codec", DuplicateLabels::Merge),
            Err(StatsError::InvalidShape(_))
        ));

        let kept = json!({"4K": u64::MAX, "HD": 1});
        assert!(matches!(
            normalize(&kept, "resolution", DuplicateLabels::Keep),
            Err(StatsError::InvalidShape(_))
        ));

        let at_limit = json!({"4K": u64::MAX - 1, "HD": 1});
        let dist = normalize(&at_limit, "resolution", DuplicateLabels::Merge).unwrap();
        assert_eq!(dist.total(), u64::MAX);
    }

    #[test]
    fn test_mapping_keeps_insertion_order_on_ties() {
        let payload = json!({"Full HD": 5, "4K": 5, "SD": 9});
        let dist = normalize(&payload, "resolution", DuplicateLabels::Merge).unwrap();
        assert_eq!(labels(&dist), vec!["SD", "Full HD", "4K"]);
    }

    #[test]
    fn test_missing_key_becomes_unknown() {
        let payload = json!([
            {"codec": null, "count": 2},
            {"count": 1},
            {"codec": "", "count": 4},
        ]);
        let dist = normalize(&payload, "codec", DuplicateLabels::Keep).unwrap();
        assert_eq!(dist.entries().len(), 3);
        assert!(dist.entries().iter().all(|e| e.label == UNKNOWN_LABEL));
    }

    #[test]
    fn test_merge_duplicates_sums_counts() {
        let payload = json!([
            {"codec": "AV1", "count": 2},
            {"codec": "HEVC", "count": 3},
            {"codec": "AV1", "count": 4},
        ]);
        let dist = normalize(&payload, "codec", DuplicateLabels::Merge).unwrap();
        assert_eq!(labels(&dist), vec!["AV1", "HEVC"]);
        assert_eq!(dist.count_of("AV1"), Some(6));
    }

    #[test]
    fn test_keep_duplicates() {
        let payload = json!([
            {"codec": "AV1", "count": 2},
            {"codec": "AV1", "count": 4},
        ]);
        let dist = normalize(&payload, "codec", DuplicateLabels::Keep).unwrap();
        assert_eq!(dist.entries().len(), 2);
        assert_eq!(dist.count_of("AV1"), Some(6));
    }

    #[test]
    fn test_float_counts_are_accepted() {
        let payload = json!({"4K": 2.0});
        let dist = normalize(&payload, "resolution", DuplicateLabels::Merge).unwrap();
        assert_eq!(dist.count_of("4K"), Some(2));
    }

    #[test]
    fn test_invalid_shapes() {
        for payload in [
            json!([]),
            json!({}),
            json!(null),
            json!(12),
            json!("4K"),
            json!([1, 2]),
            json!([{"codec": "AV1"}]),
            json!([{"codec": "AV1", "count": -1}]),
            json!({"4K": "many"}),
        ] {
            assert!(
                matches!(
                    normalize(&payload, "codec", DuplicateLabels::Merge),
                    Err(StatsError::InvalidShape(_))
                ),
                "{payload} should be rejected"
            );
        }
    }

    proptest! {
        #[test]
        fn prop_sorted_and_stable(counts in prop::collection::vec(0u64..20, 1..60)) {
            let payload: Value = counts
                .iter()
                .enumerate()
                .map(|(i, c)| json!({"codec": format!("c{i}"), "count": c}))
                .collect();
            let dist = normalize(&payload, "codec", DuplicateLabels::Keep).unwrap();
            prop_assert_eq!(dist.entries().len(), counts.len());

            for pair in dist.entries().windows(2) {
                prop_assert!(pair[0].count >= pair[1].count);
                if pair[0].count == pair[1].count {
                    let a: usize = pair[0].label[1..].parse().unwrap();
                    let b: usize = pair[1].label[1..].parse().unwrap();
                    prop_assert!(a < b);
                }
            }
        }

        #[test]
        fn prop_merge_preserves_total(labels in prop::collection::vec(0u8..5, 1..40)) {
            let payload: Value = labels
                .iter()
                .map(|l| json!({"format": format!("f{l}"), "count": 1}))
                .collect();
            let dist = normalize(&payload, "format", DuplicateLabels::Merge).unwrap();
            prop_assert_eq!(dist.total(), labels.len() as u64);

            let mut seen = std::collections::HashSet::new();
            for entry in dist.entries() {
                prop_assert!(seen.insert(entry.label.clone()));
            }
        }
    }
}
