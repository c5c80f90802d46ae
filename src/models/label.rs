use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Accessibility feature categories recognized by the clustering pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LabelType {
    CurbRamp,
    SurfaceProblem,
    Obstacle,
    NoCurbRamp,
    NoSidewalk,
    Occlusion,
    Other,
}

impl LabelType {
    /// All recognized types, in the order the pipeline processes them
    pub const ALL: [LabelType; 7] = [
        LabelType::CurbRamp,
        LabelType::SurfaceProblem,
        LabelType::Obstacle,
        LabelType::NoCurbRamp,
        LabelType::NoSidewalk,
        LabelType::Occlusion,
        LabelType::Other,
    ];

    /// Name used on the wire by the sidewalk service
    pub fn as_str(&self) -> &'static str {
        match self {
            LabelType::CurbRamp => "CurbRamp",
            LabelType::SurfaceProblem => "SurfaceProblem",
            LabelType::Obstacle => "Obstacle",
            LabelType::NoCurbRamp => "NoCurbRamp",
            LabelType::NoSidewalk => "NoSidewalk",
            LabelType::Occlusion => "Occlusion",
            LabelType::Other => "Other",
        }
    }
}

impl fmt::Display for LabelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LabelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LabelType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unrecognized label type: {}", s))
    }
}

/// A label record as delivered by the label feed, before type recognition.
///
/// The feed may carry nulls; incomplete rows are dropped during cleaning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawLabel {
    pub label_id: i64,
    pub label_type: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    /// Identity of the annotator who placed the label
    #[serde(default)]
    pub turker_id: Option<String>,
}

impl RawLabel {
    /// Whether coordinates and annotator are all present
    pub fn is_complete(&self) -> bool {
        self.lat.is_some() && self.lng.is_some() && self.turker_id.is_some()
    }
}

/// One annotator's point observation of an accessibility feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    /// Stable identifier supplied upstream
    pub label_id: i64,
    pub label_type: LabelType,
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lng: f64,
    /// Labels sharing an annotator are never clustered together
    pub annotator_id: String,
}

impl Label {
    pub fn new(
        label_id: i64,
        label_type: LabelType,
        lat: f64,
        lng: f64,
        annotator_id: impl Into<String>,
    ) -> Self {
        Self {
            label_id,
            label_type,
            lat,
            lng,
            annotator_id: annotator_id.into(),
        }
    }

    /// Recognize a raw feed record; `None` for unknown types or missing fields
    pub fn from_raw(raw: &RawLabel) -> Option<Self> {
        let label_type = raw.label_type.parse().ok()?;
        Some(Self {
            label_id: raw.label_id,
            label_type,
            lat: raw.lat?,
            lng: raw.lng?,
            annotator_id: raw.turker_id.clone()?,
        })
    }

    /// `(lat, lng)` pair in degrees
    pub fn coords(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_type_round_trips_wire_name() {
        for t in LabelType::ALL {
            assert_eq!(t.as_str().parse::<LabelType>().unwrap(), t);
        }
        assert!("Crosswalk".parse::<LabelType>().is_err());
    }

    #[test]
    fn test_label_type_serializes_as_wire_name() {
        let json = serde_json::to_string(&LabelType::NoCurbRamp).unwrap();
        assert_eq!(json, "\"NoCurbRamp\"");
    }

    #[test]
    fn test_from_raw_drops_unknown_type() {
        let raw = RawLabel {
            label_id: 7,
            label_type: "Crosswalk".to_string(),
            lat: Some(38.9),
            lng: Some(-77.0),
            turker_id: Some("A1".to_string()),
        };
        assert!(Label::from_raw(&raw).is_none());

        let raw = RawLabel {
            label_type: "Obstacle".to_string(),
            ..raw
        };
        let label = Label::from_raw(&raw).unwrap();
        assert_eq!(label.label_type, LabelType::Obstacle);
        assert_eq!(label.annotator_id, "A1");
        assert_eq!(label.coords(), (38.9, -77.0));
    }

    #[test]
    fn test_from_raw_drops_incomplete_rows() {
        let raw = RawLabel {
            label_id: 8,
            label_type: "CurbRamp".to_string(),
            lat: Some(38.9),
            lng: None,
            turker_id: Some("A1".to_string()),
        };
        assert!(!raw.is_complete());
        assert!(Label::from_raw(&raw).is_none());

        let raw = RawLabel {
            lng: Some(-77.0),
            turker_id: None,
            ..raw
        };
        assert!(Label::from_raw(&raw).is_none());
    }
}
