//! Trajectory parsing and validation
//!
//! A trajectory is JSON: either a bare array of points or an object with a
//! `"trajectory"` array. Each point is `{"t": .., "position": [x, y, z],
//! "rotation": [x, y, z, w]}` with an optional rotation.

use crate::error::{IoError, IoResult};
use roomscan_core::TrajectoryPoint;
use serde_json::Value;
use std::path::Path;

/// Parse a trajectory document.
///
/// Blank input is an empty trajectory. Shape errors (wrong array lengths,
/// missing fields) and non-finite values are rejected.
pub fn parse_trajectory_json(text: &str) -> IoResult<Vec<TrajectoryPoint>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let points = match serde_json::from_str::<Value>(text)? {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("trajectory") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(IoError::TrajectoryStructure {
                    message: "object payload needs a \"trajectory\" array".to_string(),
                })
            }
        },
        _ => {
            return Err(IoError::TrajectoryStructure {
                message: "trajectory must be a JSON array".to_string(),
            })
        }
    };

    let trajectory = points
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value::<TrajectoryPoint>(item).map_err(|e| IoError::TrajectoryStructure {
                message: format!("point {index}: {e}"),
            })
        })
        .collect::<IoResult<Vec<_>>>()?;

    validate_trajectory(&trajectory)?;
    Ok(trajectory)
}

/// Read and parse a trajectory file
pub fn read_trajectory<P: AsRef<Path>>(path: P) -> IoResult<Vec<TrajectoryPoint>> {
    parse_trajectory_json(&std::fs::read_to_string(path)?)
}

/// Reject points with non-finite time, position or rotation components
pub fn validate_trajectory(trajectory: &[TrajectoryPoint]) -> IoResult<()> {
    for (index, point) in trajectory.iter().enumerate() {
        let rotation = point.rotation.unwrap_or([0.0, 0.0, 0.0, 1.0]);
        let finite = point.t.is_finite()
            && point.position.iter().all(|v| v.is_finite())
            && rotation.iter().all(|v| v.is_finite());
        if !finite {
            return Err(IoError::TrajectoryStructure {
                message: format!("point {index}: values must be finite"),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_array() {
        let json = r#"[
            {"t": 0.0, "position": [0.0, 1.5, 0.0], "rotation": [0.0, 0.0, 0.0, 1.0]},
            {"t": 1.0, "position": [0.2, 1.5, 0.1]}
        ]"#;
        let trajectory = parse_trajectory_json(json).unwrap();
        assert_eq!(trajectory.len(), 2);
        assert_eq!(trajectory[0].rotation, Some([0.0, 0.0, 0.0, 1.0]));
        assert_eq!(trajectory[1].rotation, None);
        assert_eq!(trajectory[1].position, [0.2, 1.5, 0.1]);
    }

    #[test]
    fn test_parse_wrapped_object() {
        let json = r#"{"trajectory": [{"t": 3, "position": [1, 2, 3]}]}"#;
        let trajectory = parse_trajectory_json(json).unwrap();
        assert_eq!(trajectory.len(), 1);
        assert_eq!(trajectory[0].t, 3.0);
    }

    #[test]
    fn test_blank_input_is_empty() {
        assert!(parse_trajectory_json("  \n").unwrap().is_empty());
    }

    #[test]
    fn test_rejects_bad_structure() {
        assert!(matches!(
            parse_trajectory_json("{not json"),
            Err(IoError::TrajectoryJson(_))
        ));
        assert!(matches!(
            parse_trajectory_json(r#"{"points": []}"#),
            Err(IoError::TrajectoryStructure { .. })
        ));
        assert!(matches!(
            parse_trajectory_json(r#"[{"t": 0, "position": [1, 2]}]"#),
            Err(IoError::TrajectoryStructure { .. })
        ));
        assert!(matches!(
            parse_trajectory_json(r#"[{"t": 0, "position": [1, 2, 3], "rotation": [0, 0, 1]}]"#),
            Err(IoError::TrajectoryStructure { .. })
        ));
        assert!(parse_trajectory_json("42").is_err());
    }

    #[test]
    fn test_rejects_non_finite_values() {
        let trajectory = vec![TrajectoryPoint::new(0.0, [f32::NAN, 0.0, 0.0], None)];
        assert!(validate_trajectory(&trajectory).is_err());
    }
}
