//! Scan quality scoring

use crate::config::QualitySection;
use crate::result::QualityMetrics;
use roomscan_algorithms::{Junction, JunctionType};

/// Corners of a rectangular room
const ROOM_CORNERS: usize = 4;

/// Inputs of the quality score for one processed batch
#[derive(Debug, Clone, Copy)]
pub struct QualityInputs<'a> {
    /// Blended coverage in [0, 100]
    pub coverage_percent: f32,
    pub junctions: &'a [Junction],
    pub points_count: usize,
    pub planes_count: usize,
    pub processing_time_ms: u64,
}

/// Mean junction confidence, 0 with no junctions
pub fn mean_junction_confidence(junctions: &[Junction]) -> f32 {
    if junctions.is_empty() {
        return 0.0;
    }
    junctions.iter().map(|j| j.confidence).sum::<f32>() / junctions.len() as f32
}

/// Room corners not accounted for by a wall-wall junction
pub fn missing_corners(junctions: &[Junction]) -> usize {
    let wall_wall = junctions
        .iter()
        .filter(|j| j.junction_type == JunctionType::WallWallInternal)
        .count();
    ROOM_CORNERS - wall_wall.min(ROOM_CORNERS)
}

/// Weighted blend of coverage, junction confidence and point density,
/// clamped to [0, 1]
pub fn scan_quality(inputs: &QualityInputs<'_>, weights: &QualitySection) -> f32 {
    let density = (inputs.points_count as f32 / weights.density_points_norm.max(1) as f32).min(1.0);
    let score = weights.weight_coverage * (inputs.coverage_percent / 100.0)
        + weights.weight_junction_confidence * mean_junction_confidence(inputs.junctions)
        + weights.weight_density * density;
    score.clamp(0.0, 1.0)
}

pub fn quality_metrics(inputs: &QualityInputs<'_>, weights: &QualitySection) -> QualityMetrics {
    QualityMetrics {
        scan_quality: scan_quality(inputs, weights),
        junction_count: inputs.junctions.len(),
        missing_corners: missing_corners(inputs.junctions),
        processing_time_ms: Some(inputs.processing_time_ms),
        points_count: Some(inputs.points_count),
        planes_count: Some(inputs.planes_count),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn junction(junction_type: JunctionType, confidence: f32) -> Junction {
        Junction {
            junction_type,
            position_3d: [0.0; 3],
            direction: None,
            vertical_line: None,
            confidence,
            icon: None,
        }
    }

    fn inputs(coverage_percent: f32, junctions: &[Junction], points_count: usize) -> QualityInputs<'_> {
        QualityInputs {
            coverage_percent,
            junctions,
            points_count,
            planes_count: 0,
            processing_time_ms: 0,
        }
    }

    #[test]
    fn test_empty_scan_scores_zero() {
        let metrics = quality_metrics(&inputs(0.0, &[], 0), &QualitySection::default());
        assert_eq!(metrics.scan_quality, 0.0);
        assert_eq!(metrics.junction_count, 0);
        assert_eq!(metrics.missing_corners, 4);
    }

    #[test]
    fn test_weighted_blend() {
        let junctions = [
            junction(JunctionType::WallWallInternal, 1.0),
            junction(JunctionType::FloorWallInternal, 0.5),
        ];
        let score = scan_quality(&inputs(50.0, &junctions, 40_000), &QualitySection::default());
        // 0.45 * 0.5 + 0.35 * 0.75 + 0.20 * 0.5
        assert_relative_eq!(score, 0.5875, epsilon = 1e-6);
    }

    #[test]
    fn test_score_saturates() {
        let junctions = [junction(JunctionType::WallWallInternal, 1.0)];
        let score = scan_quality(&inputs(100.0, &junctions, 10_000_000), &QualitySection::default());
        assert_relative_eq!(score, 1.0, epsilon = 1e-6);

        let heavy = QualitySection {
            weight_coverage: 2.0,
            ..QualitySection::default()
        };
        assert_eq!(scan_quality(&inputs(100.0, &[], 0), &heavy), 1.0);
    }

    #[test]
    fn test_missing_corners_counts_wall_wall_only() {
        let mut junctions = vec![junction(JunctionType::FloorWallInternal, 1.0); 6];
        assert_eq!(missing_corners(&junctions), 4);
        junctions.extend(vec![junction(JunctionType::WallWallInternal, 1.0); 3]);
        assert_eq!(missing_corners(&junctions), 1);
        junctions.extend(vec![junction(JunctionType::WallWallInternal, 1.0); 3]);
        assert_eq!(missing_corners(&junctions), 0);
    }
}
