use crate::models::Label;

/// Mean earth radius in kilometers
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Distance assigned to two labels from the same annotator.
///
/// No finite cutoff admits it, so such labels are never merged.
pub const SAME_ANNOTATOR_DISTANCE: f64 = f64::MAX;

/// Great-circle distance in kilometers between two `(lat, lng)` points in degrees
pub fn haversine_km(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (lat1, lng1) = (a.0.to_radians(), a.1.to_radians());
    let (lat2, lng2) = (b.0.to_radians(), b.1.to_radians());

    let d_lat = lat2 - lat1;
    let d_lng = lng2 - lng1;

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// Clustering distance between two labels
pub fn label_distance(u: &Label, v: &Label) -> f64 {
    if u.annotator_id == v.annotator_id {
        SAME_ANNOTATOR_DISTANCE
    } else {
        haversine_km(u.coords(), v.coords())
    }
}

/// Full symmetric distance matrix with a zero diagonal
pub fn distance_matrix(labels: &[Label]) -> Vec<Vec<f64>> {
    let n = labels.len();
    let mut matrix = vec![vec![0.0; n]; n];

    for i in 0..n {
        for j in (i + 1)..n {
            let d = label_distance(&labels[i], &labels[j]);
            matrix[i][j] = d;
            matrix[j][i] = d;
        }
    }

    matrix
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LabelType;

    fn label(id: i64, lat: f64, lng: f64, annotator: &str) -> Label {
        Label::new(id, LabelType::CurbRamp, lat, lng, annotator)
    }

    #[test]
    fn test_haversine_known_distances() {
        assert_eq!(haversine_km((10.0, 20.0), (10.0, 20.0)), 0.0);

        // One degree of latitude is ~111.2 km
        let d = haversine_km((0.0, 0.0), (1.0, 0.0));
        assert!((d - 111.195).abs() < 0.01, "got {}", d);

        // Lyon to Paris
        let d = haversine_km((45.7597, 4.8422), (48.8567, 2.3508));
        assert!((d - 392.2).abs() < 0.5, "got {}", d);
    }

    #[test]
    fn test_same_annotator_is_infinitely_far() {
        let a = label(1, 38.9, -77.0, "turker_a");
        let b = label(2, 38.9, -77.0, "turker_a");
        assert_eq!(label_distance(&a, &b), SAME_ANNOTATOR_DISTANCE);
    }

    #[test]
    fn test_different_annotators_use_haversine() {
        let a = label(1, 0.0, 0.0, "turker_a");
        let b = label(2, 0.0, 0.0001, "turker_b");
        let d = label_distance(&a, &b);
        assert!((d - haversine_km((0.0, 0.0), (0.0, 0.0001))).abs() < 1e-12);
        assert!(d > 0.011 && d < 0.0112, "got {}", d);
    }

    #[test]
    fn test_distance_matrix_is_symmetric() {
        let labels = vec![
            label(1, 0.0, 0.0, "a"),
            label(2, 0.0, 0.001, "b"),
            label(3, 0.0, 0.002, "a"),
        ];
        let m = distance_matrix(&labels);

        for i in 0..3 {
            assert_eq!(m[i][i], 0.0);
            for j in 0..3 {
                assert_eq!(m[i][j], m[j][i]);
            }
        }
        assert_eq!(m[0][2], SAME_ANNOTATOR_DISTANCE);
    }
}
