use cgmath::Vector3;

use crate::error::{Result, TargetingError};

/// The four control points of a beam curve: origin, raised joint, and the
/// floor contact twice.
pub type CurveControlPoints = [Vector3<f32>; 4];

/// Samples points along the cubic Bezier defined by four control points.
pub struct CurveSampler;

impl CurveSampler {
    /// `count` points evenly spaced in curve parameter, endpoints included.
    ///
    /// The first sample is exactly `points[0]` and the last exactly `points[3]`.
    pub fn sample(points: &CurveControlPoints, count: usize) -> Result<Vec<Vector3<f32>>> {
        if count < 2 {
            return Err(TargetingError::InvalidArgument(format!(
                "curve sample count must be at least 2, got {}",
                count
            )));
        }

        let last = count - 1;
        let samples = (0..count)
            .map(|i| match i {
                0 => points[0],
                i if i == last => points[3],
                i => Self::point_at(points, i as f32 / last as f32),
            })
            .collect();

        Ok(samples)
    }

    /// Bernstein form of the cubic Bezier at parameter `t` in [0, 1].
    pub fn point_at(points: &CurveControlPoints, t: f32) -> Vector3<f32> {
        let t = t.clamp(0.0, 1.0);
        let u = 1.0 - t;

        points[0] * (u * u * u)
            + points[1] * (3.0 * u * u * t)
            + points[2] * (3.0 * u * t * t)
            + points[3] * (t * t * t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cgmath::vec3;

    fn beam_points() -> CurveControlPoints {
        [
            vec3(0.0, 1.2, 0.0),
            vec3(0.0, 2.5, -3.0),
            vec3(0.3, 0.0, -4.0),
            vec3(0.3, 0.0, -4.0),
        ]
    }

    #[test]
    fn test_sample_endpoints_match_control_points() {
        let points = beam_points();
        for count in [2, 3, 10, 57] {
            let samples = CurveSampler::sample(&points, count).unwrap();
            assert_eq!(samples.len(), count);
            assert_eq!(samples[0], points[0]);
            assert_eq!(samples[count - 1], points[3]);
        }
    }

    #[test]
    fn test_sample_rejects_fewer_than_two_points() {
        let points = beam_points();
        assert!(matches!(
            CurveSampler::sample(&points, 1),
            Err(TargetingError::InvalidArgument(_))
        ));
        assert!(CurveSampler::sample(&points, 0).is_err());
    }

    #[test]
    fn test_straight_control_points_sample_evenly() {
        let points = [
            vec3(0.0, 0.0, 0.0),
            vec3(1.0, 0.0, 0.0),
            vec3(2.0, 0.0, 0.0),
            vec3(3.0, 0.0, 0.0),
        ];
        let samples = CurveSampler::sample(&points, 4).unwrap();

        assert_relative_eq!(samples[1], vec3(1.0, 0.0, 0.0), epsilon = 1e-5);
        assert_relative_eq!(samples[2], vec3(2.0, 0.0, 0.0), epsilon = 1e-5);
        assert_relative_eq!(samples[3], vec3(3.0, 0.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_beam_curve_moves_monotonically_towards_floor_point() {
        let points = beam_points();
        let samples = CurveSampler::sample(&points, 20).unwrap();

        for pair in samples.windows(2) {
            assert!(pair[1].z <= pair[0].z);
        }
    }

    #[test]
    fn test_sampling_is_deterministic() {
        let points = beam_points();
        assert_eq!(
            CurveSampler::sample(&points, 12).unwrap(),
            CurveSampler::sample(&points, 12).unwrap()
        );
    }
}
