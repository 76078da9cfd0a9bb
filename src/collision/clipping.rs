use glam::Vec2;

const EPSILON: f32 = 1e-6;

/// Half-plane `normal · p <= offset`.
#[derive(Debug, Clone, Copy)]
pub struct ClipLine {
    normal: Vec2,
    offset: f32,
}

impl ClipLine {
    pub fn from_point_normal(point: Vec2, normal: Vec2) -> Self {
        Self {
            normal,
            offset: normal.dot(point),
        }
    }

    fn signed_distance(&self, point: Vec2) -> f32 {
        self.normal.dot(point) - self.offset
    }
}

/// Clips a segment against a half-plane (Sutherland-Hodgman on two points).
///
/// Returns the surviving part of the segment: zero, one or two points.
pub fn clip_segment(points: &[Vec2], line: ClipLine) -> Vec<Vec2> {
    let mut clipped = Vec::with_capacity(2);
    let [start, end] = match points {
        [start, end] => [*start, *end],
        _ => {
            clipped.extend(
                points
                    .iter()
                    .copied()
                    .filter(|p| line.signed_distance(*p) <= EPSILON),
            );
            return clipped;
        }
    };

    let start_dist = line.signed_distance(start);
    let end_dist = line.signed_distance(end);

    if start_dist <= EPSILON {
        clipped.push(start);
    }
    if end_dist <= EPSILON {
        clipped.push(end);
    }

    if start_dist * end_dist < 0.0 {
        let t = start_dist / (start_dist - end_dist);
        clipped.push(start + (end - start) * t);
    }

    clipped
}

/// Clips a segment to the slab spanned by the reference edge `v1 → v2`.
pub fn clip_to_edge_slab(segment: [Vec2; 2], v1: Vec2, v2: Vec2) -> Vec<Vec2> {
    let tangent = (v2 - v1).normalize_or_zero();
    let first = clip_segment(&segment, ClipLine::from_point_normal(v1, -tangent));
    clip_segment(&first, ClipLine::from_point_normal(v2, tangent))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_crossing_line_is_cut() {
        let line = ClipLine::from_point_normal(Vec2::new(1.0, 0.0), Vec2::X);
        let clipped = clip_segment(&[Vec2::new(0.0, 0.0), Vec2::new(2.0, 0.0)], line);
        assert_eq!(clipped.len(), 2);
        assert!((clipped[1] - Vec2::new(1.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn segment_outside_is_dropped() {
        let line = ClipLine::from_point_normal(Vec2::ZERO, Vec2::X);
        let clipped = clip_segment(&[Vec2::new(1.0, 0.0), Vec2::new(2.0, 3.0)], line);
        assert!(clipped.is_empty());
    }

    #[test]
    fn slab_clipping_keeps_overlap() {
        let clipped = clip_to_edge_slab(
            [Vec2::new(-5.0, 1.0), Vec2::new(5.0, 1.0)],
            Vec2::new(-1.0, 0.0),
            Vec2::new(1.0, 0.0),
        );
        assert_eq!(clipped.len(), 2);
        let xs: Vec<f32> = clipped.iter().map(|p| p.x).collect();
        assert!(xs.iter().any(|x| (x + 1.0).abs() < 1e-5));
        assert!(xs.iter().any(|x| (x - 1.0).abs() < 1e-5));
    }
}
