use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::models::{Label, LabelType, RawLabel};

/// Longitudes beyond this magnitude are corrupt feed rows
pub const MAX_ABS_LONGITUDE: f64 = 360.0;

/// Result of Stage 0 cleaning
#[derive(Debug, Clone, Default)]
pub struct CleanResult {
    /// Labels that survived cleaning, in feed order
    pub labels: Vec<Label>,
    /// Rows dropped because their type is not being clustered
    pub dropped_unrecognized: usize,
    /// Rows dropped because a coordinate or the annotator is missing
    pub dropped_incomplete: usize,
    /// Rows dropped because of an out-of-range longitude
    pub dropped_invalid_lng: usize,
}

/// Whether a label's coordinates can be clustered
pub fn has_valid_longitude(lng: f64) -> bool {
    lng.is_finite() && lng.abs() <= MAX_ABS_LONGITUDE
}

/// Perform Stage 0: clean the raw feed before clustering
///
/// This stage:
/// 1. Drops rows whose type is unknown or not in `recognized_types`
/// 2. Drops rows with a null coordinate or annotator
/// 3. Drops rows with corrupt longitudes
pub fn clean_labels(raw: &[RawLabel], recognized_types: &[LabelType]) -> CleanResult {
    let mut result = CleanResult::default();

    for row in raw {
        let recognized = row
            .label_type
            .parse::<LabelType>()
            .is_ok_and(|t| recognized_types.contains(&t));
        if !recognized {
            result.dropped_unrecognized += 1;
            continue;
        }

        let Some(label) = Label::from_raw(row) else {
            result.dropped_incomplete += 1;
            continue;
        };

        if !has_valid_longitude(label.lng) {
            result.dropped_invalid_lng += 1;
            continue;
        }

        result.labels.push(label);
    }

    if result.dropped_incomplete > 0 {
        warn!(
            "There are {} labels missing coordinates or annotator, removing those entries",
            result.dropped_incomplete
        );
    }
    if result.dropped_invalid_lng > 0 {
        warn!(
            "There are {} invalid longitude values, removing those entries",
            result.dropped_invalid_lng
        );
    }
    debug!(
        "Labels in dataset: {} ({} unrecognized dropped)",
        result.labels.len(),
        result.dropped_unrecognized
    );

    result
}

/// Split labels into per-type groups, keeping feed order inside each group.
///
/// Types outside `recognized_types` are dropped.
pub fn partition_by_type(
    labels: &[Label],
    recognized_types: &[LabelType],
) -> BTreeMap<LabelType, Vec<Label>> {
    let mut groups: BTreeMap<LabelType, Vec<Label>> = BTreeMap::new();

    for label in labels {
        if recognized_types.contains(&label.label_type) {
            groups
                .entry(label.label_type)
                .or_default()
                .push(label.clone());
        }
    }

    for label_type in recognized_types {
        debug!(
            "Number of {} labels: {}",
            label_type,
            groups.get(label_type).map_or(0, Vec::len)
        );
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: i64, label_type: &str, lng: f64) -> RawLabel {
        RawLabel {
            label_id: id,
            label_type: label_type.to_string(),
            lat: Some(38.9),
            lng: Some(lng),
            turker_id: Some(format!("t{}", id)),
        }
    }

    #[test]
    fn test_clean_drops_corrupt_longitudes() {
        let rows = vec![
            raw(1, "CurbRamp", -77.0),
            raw(2, "CurbRamp", 1.5e14),
            raw(3, "Obstacle", -361.0),
            raw(4, "Obstacle", 360.0),
        ];
        let result = clean_labels(&rows, &LabelType::ALL);

        assert_eq!(result.dropped_invalid_lng, 2);
        let ids: Vec<i64> = result.labels.iter().map(|l| l.label_id).collect();
        assert_eq!(ids, vec![1, 4]);
    }

    #[test]
    fn test_clean_drops_unrecognized_types() {
        let rows = vec![
            raw(1, "CurbRamp", -77.0),
            raw(2, "Crosswalk", -77.0),
            raw(3, "Occlusion", -77.0),
        ];
        let result = clean_labels(&rows, &[LabelType::CurbRamp, LabelType::Obstacle]);

        assert_eq!(result.dropped_unrecognized, 2);
        assert_eq!(result.labels.len(), 1);
        assert_eq!(result.labels[0].label_type, LabelType::CurbRamp);
    }

    #[test]
    fn test_clean_drops_rows_with_null_fields() {
        let rows = vec![
            raw(1, "CurbRamp", -77.0),
            RawLabel {
                lng: None,
                ..raw(2, "CurbRamp", 0.0)
            },
            RawLabel {
                lat: None,
                ..raw(3, "Obstacle", -77.0)
            },
            RawLabel {
                turker_id: None,
                ..raw(4, "Obstacle", -77.0)
            },
            RawLabel {
                lng: None,
                ..raw(5, "Crosswalk", 0.0)
            },
        ];
        let result = clean_labels(&rows, &LabelType::ALL);

        assert_eq!(result.dropped_incomplete, 3);
        assert_eq!(result.dropped_unrecognized, 1);
        assert_eq!(result.dropped_invalid_lng, 0);
        let ids: Vec<i64> = result.labels.iter().map(|l| l.label_id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn test_partition_by_type() {
        let labels = vec![
            Label::new(1, LabelType::Obstacle, 0.0, 0.0, "a"),
            Label::new(2, LabelType::CurbRamp, 0.0, 0.0, "a"),
            Label::new(3, LabelType::Obstacle, 0.0, 0.0, "b"),
            Label::new(4, LabelType::Other, 0.0, 0.0, "b"),
        ];
        let groups = partition_by_type(&labels, &[LabelType::CurbRamp, LabelType::Obstacle]);

        assert_eq!(groups.len(), 2);
        let obstacle_ids: Vec<i64> = groups[&LabelType::Obstacle]
            .iter()
            .map(|l| l.label_id)
            .collect();
        assert_eq!(obstacle_ids, vec![1, 3]);
        assert!(!groups.contains_key(&LabelType::Other));
    }
}
