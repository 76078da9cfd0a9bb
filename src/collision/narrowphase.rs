//! Exact contact tests between pairs of shapes.
//!
//! Detectors are registered for canonically ordered [`ShapeKind`] pairs;
//! [`detect`] swaps its arguments into canonical order and flips the
//! resulting normal back, so `detect(a, b)` always mirrors `detect(b, a)`.

use std::cmp::Ordering;

use glam::Vec2;

use super::{clipping::clip_to_edge_slab, contact::Contact};
use crate::{
    core::{body::Body, shape::ShapeKind},
    error::ConfigError,
    utils::math::{normalize_or, FALLBACK_NORMAL},
};

/// Slack used when choosing between two nearly equal separating axes.
const AXIS_TOLERANCE: f32 = 1e-4;

/// Contact points farther than this outside the reference face are dropped.
const LINEAR_SLOP: f32 = 1e-3;

type Detector = fn(&Body, &Body) -> Option<Contact>;

fn detector_for(a: ShapeKind, b: ShapeKind) -> Option<Detector> {
    use ShapeKind::*;
    match (a, b) {
        (Point, Point) => None,
        (Point | Circle, Point | Circle) => Some(round_round),
        (Point | Circle, Rectangle | ConvexPolygon) => Some(round_polygon),
        (Rectangle | ConvexPolygon, Rectangle | ConvexPolygon) => Some(polygon_polygon),
        _ => None,
    }
}

fn canonical(a: ShapeKind, b: ShapeKind) -> (ShapeKind, ShapeKind) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Whether the narrow phase has a contact test for this shape pair.
pub fn supports(a: ShapeKind, b: ShapeKind) -> bool {
    let (lo, hi) = canonical(a, b);
    detector_for(lo, hi).is_some()
}

/// Tests two bodies for contact. Touching shapes report a zero-depth contact.
pub fn detect(a: &Body, b: &Body) -> Result<Option<Contact>, ConfigError> {
    let kind_a = a.shape().kind();
    let kind_b = b.shape().kind();

    let swap = canonical_order(a, b).is_gt();
    let (first, second) = if swap { (b, a) } else { (a, b) };
    let detector = detector_for(first.shape().kind(), second.shape().kind())
        .ok_or(ConfigError::UnsupportedShapePair(kind_a, kind_b))?;

    let contact = detector(first, second);
    Ok(if swap {
        contact.map(Contact::flipped)
    } else {
        contact
    })
}

/// Order in which two bodies are handed to a detector: shape kind, then
/// handle, then pose and size for unregistered bodies sharing the
/// placeholder handle. Bodies equal on every key are indistinguishable.
fn canonical_order(a: &Body, b: &Body) -> Ordering {
    a.shape()
        .kind()
        .cmp(&b.shape().kind())
        .then_with(|| a.handle().cmp(&b.handle()))
        .then_with(|| a.position().x.total_cmp(&b.position().x))
        .then_with(|| a.position().y.total_cmp(&b.position().y))
        .then_with(|| a.angle().total_cmp(&b.angle()))
        .then_with(|| {
            a.shape()
                .bounding_radius()
                .total_cmp(&b.shape().bounding_radius())
        })
}

fn round_round(a: &Body, b: &Body) -> Option<Contact> {
    circle_circle(a.position(), a.shape().radius(), b.position(), b.shape().radius())
}

fn circle_circle(center_a: Vec2, radius_a: f32, center_b: Vec2, radius_b: f32) -> Option<Contact> {
    let delta = center_b - center_a;
    let reach = radius_a + radius_b;
    let distance_sq = delta.length_squared();
    if distance_sq > reach * reach {
        return None;
    }

    let distance = distance_sq.sqrt();
    let normal = normalize_or(delta, FALLBACK_NORMAL);
    let depth = reach - distance;
    Some(Contact {
        normal,
        depth,
        point: center_a + normal * (radius_a - 0.5 * depth),
    })
}

fn round_polygon(round: &Body, polygon: &Body) -> Option<Contact> {
    let polygon = WorldPolygon::of(polygon)?;
    // Normal comes back polygon → circle; the pair is (circle, polygon).
    polygon_circle(&polygon, round.position(), round.shape().radius()).map(Contact::flipped)
}

fn polygon_polygon(a: &Body, b: &Body) -> Option<Contact> {
    let poly_a = WorldPolygon::of(a)?;
    let poly_b = WorldPolygon::of(b)?;

    let (face_a, separation_a) = max_separation(&poly_a, &poly_b);
    if separation_a > 0.0 {
        return None;
    }
    let (face_b, separation_b) = max_separation(&poly_b, &poly_a);
    if separation_b > 0.0 {
        return None;
    }

    let (reference, incident, face, separation, flip) =
        if separation_b > separation_a + AXIS_TOLERANCE {
            (&poly_b, &poly_a, face_b, separation_b, true)
        } else {
            (&poly_a, &poly_b, face_a, separation_a, false)
        };

    let normal = reference.normals[face];
    let (v1, v2) = reference.edge(face);

    let incident_face = (0..incident.normals.len())
        .min_by(|&i, &j| {
            normal
                .dot(incident.normals[i])
                .total_cmp(&normal.dot(incident.normals[j]))
        })
        .unwrap_or(0);
    let (i1, i2) = incident.edge(incident_face);

    let clipped = clip_to_edge_slab([i1, i2], v1, v2);
    let touching: Vec<Vec2> = clipped
        .iter()
        .copied()
        .filter(|p| normal.dot(*p - v1) <= LINEAR_SLOP)
        .collect();

    let point = if touching.is_empty() {
        if clipped.is_empty() {
            0.5 * (i1 + i2)
        } else {
            average(&clipped)
        }
    } else {
        average(&touching)
    };

    Some(Contact {
        normal: if flip { -normal } else { normal },
        depth: -separation,
        point,
    })
}

fn polygon_circle(polygon: &WorldPolygon, center: Vec2, radius: f32) -> Option<Contact> {
    let mut best_face = 0;
    let mut best_separation = f32::NEG_INFINITY;
    for (i, (vertex, normal)) in polygon.vertices.iter().zip(&polygon.normals).enumerate() {
        let separation = normal.dot(center - *vertex);
        if separation > radius {
            return None;
        }
        if separation > best_separation {
            best_separation = separation;
            best_face = i;
        }
    }

    let face_normal = polygon.normals[best_face];

    if best_separation <= 0.0 {
        // Centre inside the polygon.
        return Some(Contact {
            normal: face_normal,
            depth: radius - best_separation,
            point: center - face_normal * best_separation,
        });
    }

    let (v1, v2) = polygon.edge(best_face);
    let closest = closest_point_on_segment(center, v1, v2);
    let delta = center - closest;
    let distance_sq = delta.length_squared();
    if distance_sq > radius * radius {
        return None;
    }

    Some(Contact {
        normal: normalize_or(delta, face_normal),
        depth: radius - distance_sq.sqrt(),
        point: closest,
    })
}

/// Polygon vertices and outward edge normals in world space.
struct WorldPolygon {
    vertices: Vec<Vec2>,
    normals: Vec<Vec2>,
}

impl WorldPolygon {
    fn of(body: &Body) -> Option<Self> {
        let vertices = body.shape().world_vertices(body.position(), body.angle())?;
        let normals = (0..vertices.len())
            .map(|i| {
                let edge = vertices[(i + 1) % vertices.len()] - vertices[i];
                // Counter-clockwise winding: outward normal is the right-hand perpendicular.
                normalize_or(Vec2::new(edge.y, -edge.x), FALLBACK_NORMAL)
            })
            .collect();
        Some(Self { vertices, normals })
    }

    fn edge(&self, face: usize) -> (Vec2, Vec2) {
        (
            self.vertices[face],
            self.vertices[(face + 1) % self.vertices.len()],
        )
    }
}

/// Largest signed distance of `other` from any face of `reference`.
fn max_separation(reference: &WorldPolygon, other: &WorldPolygon) -> (usize, f32) {
    let mut best = (0, f32::NEG_INFINITY);
    for (i, (vertex, normal)) in reference
        .vertices
        .iter()
        .zip(&reference.normals)
        .enumerate()
    {
        let separation = other
            .vertices
            .iter()
            .map(|v| normal.dot(*v - *vertex))
            .fold(f32::INFINITY, f32::min);
        if separation > best.1 {
            best = (i, separation);
        }
    }
    best
}

fn closest_point_on_segment(point: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let ab = b - a;
    let length_sq = ab.length_squared();
    if length_sq <= f32::EPSILON {
        return a;
    }
    let t = ((point - a).dot(ab) / length_sq).clamp(0.0, 1.0);
    a + ab * t
}

fn average(points: &[Vec2]) -> Vec2 {
    points.iter().copied().sum::<Vec2>() / points.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{core::body::BodyDesc, utils::allocator::BodyHandle};
    use approx::assert_relative_eq;

    fn body(desc: BodyDesc, handle: u32) -> Body {
        let mut body = desc.build().unwrap();
        body.set_handle(BodyHandle(handle));
        body
    }

    #[test]
    fn overlapping_circles_report_depth_and_normal() {
        let a = body(BodyDesc::circle(1.0), 0);
        let b = body(BodyDesc::circle(1.0).position(1.5, 0.0), 1);
        let contact = detect(&a, &b).unwrap().unwrap();
        assert_relative_eq!(contact.normal.x, 1.0);
        assert_relative_eq!(contact.depth, 0.5);
        assert_relative_eq!(contact.point.x, 0.75, epsilon = 1e-6);
    }

    #[test]
    fn touching_circles_count_as_contact() {
        let a = body(BodyDesc::circle(1.0), 0);
        let b = body(BodyDesc::circle(1.0).position(2.0, 0.0), 1);
        let contact = detect(&a, &b).unwrap().unwrap();
        assert_relative_eq!(contact.depth, 0.0);
    }

    #[test]
    fn coincident_centres_use_fallback_normal() {
        let a = body(BodyDesc::circle(1.0), 0);
        let b = body(BodyDesc::circle(2.0), 1);
        let contact = detect(&a, &b).unwrap().unwrap();
        assert_eq!(contact.normal, FALLBACK_NORMAL);
        assert_relative_eq!(contact.depth, 3.0);
    }

    #[test]
    fn swapped_arguments_mirror_the_normal() {
        let circle = body(BodyDesc::circle(1.0).position(0.0, 1.5), 0);
        let floor = body(BodyDesc::rectangle(10.0, 2.0).immovable(), 1);

        let forward = detect(&circle, &floor).unwrap().unwrap();
        let backward = detect(&floor, &circle).unwrap().unwrap();
        assert_eq!(forward, backward.flipped());
        // Circle sits on top of the floor: A → B points down.
        assert_relative_eq!(forward.normal.y, -1.0, epsilon = 1e-6);
        assert_relative_eq!(forward.depth, 0.5, epsilon = 1e-6);
    }

    #[test]
    fn unregistered_coincident_circles_mirror_each_other() {
        let small = BodyDesc::circle(1.0).build().unwrap();
        let large = BodyDesc::circle(2.0).build().unwrap();
        assert_eq!(small.handle(), large.handle());

        let forward = detect(&small, &large).unwrap().unwrap();
        let backward = detect(&large, &small).unwrap().unwrap();
        assert_eq!(forward, backward.flipped());
        assert_eq!(forward.normal, FALLBACK_NORMAL);
        assert_relative_eq!(forward.point.y, -0.5, epsilon = 1e-6);
    }

    #[test]
    fn unregistered_boxes_are_ordered_by_position() {
        let left = BodyDesc::rectangle(2.0, 2.0).angle(0.1).build().unwrap();
        let right = BodyDesc::rectangle(2.0, 2.0).position(1.5, 0.3).build().unwrap();

        let forward = detect(&left, &right).unwrap().unwrap();
        let backward = detect(&right, &left).unwrap().unwrap();
        assert_eq!(forward, backward.flipped());
        assert!(forward.normal.x > 0.0);
    }

    #[test]
    fn point_inside_circle_is_detected() {
        let point = body(BodyDesc::point().position(0.5, 0.0), 0);
        let circle = body(BodyDesc::circle(1.0), 1);
        let contact = detect(&point, &circle).unwrap().unwrap();
        assert_relative_eq!(contact.normal.x, -1.0, epsilon = 1e-6);
        assert_relative_eq!(contact.depth, 0.5, epsilon = 1e-6);
    }

    #[test]
    fn circle_near_rectangle_corner() {
        let rect = body(BodyDesc::rectangle(2.0, 2.0), 0);
        let near = body(BodyDesc::circle(0.5).position(1.3, 1.3), 1);
        let far = body(BodyDesc::circle(0.5).position(1.4, 1.4), 2);

        let contact = detect(&rect, &near).unwrap().unwrap();
        assert!((contact.point - Vec2::new(1.0, 1.0)).length() < 1e-6);
        assert_relative_eq!(contact.normal.x, contact.normal.y, epsilon = 1e-6);
        assert!(detect(&rect, &far).unwrap().is_none());
    }

    #[test]
    fn stacked_boxes_share_a_face() {
        let bottom = body(BodyDesc::rectangle(4.0, 2.0), 0);
        let top = body(BodyDesc::rectangle(2.0, 2.0).position(0.5, 1.9), 1);
        let contact = detect(&bottom, &top).unwrap().unwrap();
        assert_relative_eq!(contact.normal.y, 1.0, epsilon = 1e-6);
        assert_relative_eq!(contact.depth, 0.1, epsilon = 1e-5);
        assert_relative_eq!(contact.point.x, 0.5, epsilon = 1e-5);
    }

    #[test]
    fn rotated_box_is_separated_on_its_own_axis() {
        let a = body(BodyDesc::rectangle(2.0, 2.0), 0);
        // Diamond whose corner reaches x = 3 - sqrt(2) ≈ 1.586.
        let b = body(
            BodyDesc::rectangle(2.0, 2.0)
                .position(3.0, 0.0)
                .angle(std::f32::consts::FRAC_PI_4),
            1,
        );
        assert!(detect(&a, &b).unwrap().is_none());
    }

    #[test]
    fn triangle_overlapping_box() {
        let triangle = body(
            BodyDesc::polygon(vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(2.0, 0.0),
                Vec2::new(1.0, 2.0),
            ])
            .position(0.0, 1.5),
            0,
        );
        let floor = body(BodyDesc::rectangle(10.0, 2.0).immovable(), 1);
        let contact = detect(&floor, &triangle).unwrap().unwrap();
        assert!(contact.normal.y > 0.99);
        assert!(contact.depth > 0.0);
    }

    #[test]
    fn point_pair_is_unsupported() {
        let a = body(BodyDesc::point(), 0);
        let b = body(BodyDesc::point(), 1);
        assert_eq!(
            detect(&a, &b),
            Err(ConfigError::UnsupportedShapePair(
                ShapeKind::Point,
                ShapeKind::Point
            ))
        );
        assert!(!supports(ShapeKind::Point, ShapeKind::Point));
        assert!(supports(ShapeKind::ConvexPolygon, ShapeKind::Point));
    }
}
