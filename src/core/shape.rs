use std::borrow::Cow;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{
    error::ConfigError,
    utils::math::{cross, to_local, to_world},
};

/// Tag of a [`Shape`] variant, used to key the narrow-phase dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ShapeKind {
    Point,
    Circle,
    Rectangle,
    ConvexPolygon,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 4] = [
        ShapeKind::Point,
        ShapeKind::Circle,
        ShapeKind::Rectangle,
        ShapeKind::ConvexPolygon,
    ];
}

/// Axis-aligned bounding box with inclusive bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Builds a box from its corner coordinates.
    pub fn from_min_max(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self::new(Vec2::new(min_x, min_y), Vec2::new(max_x, max_y))
    }

    pub fn from_center(center: Vec2, half_extents: Vec2) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    /// Smallest box containing every point; `None` for an empty slice.
    pub fn from_points(points: &[Vec2]) -> Option<Self> {
        let first = *points.first()?;
        Some(points.iter().fold(Self::new(first, first), |aabb, p| {
            Self::new(aabb.min.min(*p), aabb.max.max(*p))
        }))
    }

    /// Touching boxes overlap.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    pub fn contains_point(&self, point: Vec2) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    pub fn contains(&self, other: &Aabb) -> bool {
        other.min.cmpge(self.min).all() && other.max.cmple(self.max).all()
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }
}

/// Collision geometry of a body, in the body's local frame.
///
/// Rectangles and polygons are centred on the body position and rotate with
/// its angular position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Point,
    Circle { radius: f32 },
    Rectangle { width: f32, height: f32 },
    ConvexPolygon { vertices: Vec<Vec2> },
}

impl Shape {
    pub fn circle(radius: f32) -> Self {
        Shape::Circle { radius }
    }

    pub fn rectangle(width: f32, height: f32) -> Self {
        Shape::Rectangle { width, height }
    }

    /// Polygon from vertices in any winding; normalized when the body is built.
    pub fn convex_polygon(vertices: Vec<Vec2>) -> Self {
        Shape::ConvexPolygon { vertices }
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Point => ShapeKind::Point,
            Shape::Circle { .. } => ShapeKind::Circle,
            Shape::Rectangle { .. } => ShapeKind::Rectangle,
            Shape::ConvexPolygon { .. } => ShapeKind::ConvexPolygon,
        }
    }

    /// Radius of a circle, zero for every other shape.
    pub fn radius(&self) -> f32 {
        match self {
            Shape::Circle { radius } => *radius,
            _ => 0.0,
        }
    }

    /// Unrotated extent along x.
    pub fn width(&self) -> f32 {
        match self {
            Shape::Point => 0.0,
            Shape::Circle { radius } => 2.0 * radius,
            Shape::Rectangle { width, .. } => *width,
            Shape::ConvexPolygon { vertices } => {
                Aabb::from_points(vertices).map_or(0.0, |aabb| aabb.size().x)
            }
        }
    }

    /// Unrotated extent along y.
    pub fn height(&self) -> f32 {
        match self {
            Shape::Point => 0.0,
            Shape::Circle { radius } => 2.0 * radius,
            Shape::Rectangle { height, .. } => *height,
            Shape::ConvexPolygon { vertices } => {
                Aabb::from_points(vertices).map_or(0.0, |aabb| aabb.size().y)
            }
        }
    }

    /// Distance from the body origin to the farthest point of the shape.
    pub fn bounding_radius(&self) -> f32 {
        match self {
            Shape::Point => 0.0,
            Shape::Circle { radius } => *radius,
            Shape::Rectangle { width, height } => 0.5 * Vec2::new(*width, *height).length(),
            Shape::ConvexPolygon { vertices } => {
                vertices.iter().map(|v| v.length()).fold(0.0, f32::max)
            }
        }
    }

    /// Counter-clockwise local vertices for polygonal shapes.
    pub fn local_vertices(&self) -> Option<Cow<'_, [Vec2]>> {
        match self {
            Shape::Rectangle { width, height } => {
                let hx = 0.5 * width;
                let hy = 0.5 * height;
                Some(Cow::Owned(vec![
                    Vec2::new(-hx, -hy),
                    Vec2::new(hx, -hy),
                    Vec2::new(hx, hy),
                    Vec2::new(-hx, hy),
                ]))
            }
            Shape::ConvexPolygon { vertices } => Some(Cow::Borrowed(vertices.as_slice())),
            Shape::Point | Shape::Circle { .. } => None,
        }
    }

    /// World-space vertices of a polygonal shape at the given pose.
    pub fn world_vertices(&self, position: Vec2, angle: f32) -> Option<Vec<Vec2>> {
        let local = self.local_vertices()?;
        Some(local.iter().map(|v| to_world(*v, position, angle)).collect())
    }

    pub fn aabb(&self, position: Vec2, angle: f32) -> Aabb {
        match self {
            Shape::Point => Aabb::new(position, position),
            Shape::Circle { radius } => Aabb::from_center(position, Vec2::splat(*radius)),
            Shape::Rectangle { .. } | Shape::ConvexPolygon { .. } => self
                .world_vertices(position, angle)
                .and_then(|vertices| Aabb::from_points(&vertices))
                .unwrap_or(Aabb::new(position, position)),
        }
    }

    pub fn area(&self) -> f32 {
        match self {
            Shape::Point => 0.0,
            Shape::Circle { radius } => std::f32::consts::PI * radius * radius,
            Shape::Rectangle { width, height } => width * height,
            Shape::ConvexPolygon { vertices } => 0.5 * signed_area_x2(vertices).abs(),
        }
    }

    /// Moment of inertia about the body origin for a uniform body of `mass`.
    pub fn moment_of_inertia(&self, mass: f32) -> f32 {
        match self {
            Shape::Point => 0.0,
            Shape::Circle { radius } => 0.5 * mass * radius * radius,
            Shape::Rectangle { width, height } => mass * (width * width + height * height) / 12.0,
            Shape::ConvexPolygon { vertices } => {
                let mut numerator = 0.0;
                let mut denominator = 0.0;
                for (a, b) in edges(vertices) {
                    let c = cross(a, b).abs();
                    numerator += c * (a.dot(a) + a.dot(b) + b.dot(b));
                    denominator += c;
                }
                if denominator <= f32::EPSILON {
                    0.0
                } else {
                    mass * numerator / (6.0 * denominator)
                }
            }
        }
    }

    /// Whether a world-space point lies inside (or on) the shape at the given pose.
    pub fn contains_point(&self, position: Vec2, angle: f32, point: Vec2) -> bool {
        match self {
            Shape::Point => position.distance_squared(point) <= POINT_TOLERANCE * POINT_TOLERANCE,
            Shape::Circle { radius } => position.distance_squared(point) <= radius * radius,
            Shape::Rectangle { .. } | Shape::ConvexPolygon { .. } => {
                let local = to_local(point, position, angle);
                self.local_vertices().is_some_and(|vertices| {
                    edges(&vertices).all(|(a, b)| cross(b - a, local - a) >= 0.0)
                })
            }
        }
    }

    /// Validates dimensions and brings polygons into canonical form
    /// (counter-clockwise, centred on the centroid).
    pub fn normalized(self) -> Result<Shape, ConfigError> {
        match self {
            Shape::Point => Ok(Shape::Point),
            Shape::Circle { radius } => {
                if !(radius.is_finite() && radius > 0.0) {
                    return Err(ConfigError::InvalidShape(format!(
                        "circle radius must be positive, got {radius}"
                    )));
                }
                Ok(Shape::Circle { radius })
            }
            Shape::Rectangle { width, height } => {
                if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
                    return Err(ConfigError::InvalidShape(format!(
                        "rectangle dimensions must be positive, got {width} x {height}"
                    )));
                }
                Ok(Shape::Rectangle { width, height })
            }
            Shape::ConvexPolygon { vertices } => normalize_polygon(vertices),
        }
    }
}

const POINT_TOLERANCE: f32 = 1e-4;

fn edges(vertices: &[Vec2]) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
    let n = vertices.len();
    (0..n).map(move |i| (vertices[i], vertices[(i + 1) % n]))
}

fn signed_area_x2(vertices: &[Vec2]) -> f32 {
    edges(vertices).map(|(a, b)| cross(a, b)).sum()
}

fn normalize_polygon(mut vertices: Vec<Vec2>) -> Result<Shape, ConfigError> {
    if vertices.len() < 3 {
        return Err(ConfigError::InvalidShape(format!(
            "polygon needs at least 3 vertices, got {}",
            vertices.len()
        )));
    }
    if vertices.iter().any(|v| !v.is_finite()) {
        return Err(ConfigError::NonFinite("polygon vertex"));
    }

    let mut area_x2 = signed_area_x2(&vertices);
    if area_x2.abs() <= 1e-6 {
        return Err(ConfigError::InvalidShape("polygon has zero area".into()));
    }
    if area_x2 < 0.0 {
        vertices.reverse();
        area_x2 = -area_x2;
    }

    let centroid = edges(&vertices)
        .map(|(a, b)| (a + b) * cross(a, b))
        .fold(Vec2::ZERO, |acc, v| acc + v)
        / (3.0 * area_x2);
    for v in vertices.iter_mut() {
        *v -= centroid;
    }

    let n = vertices.len();
    for i in 0..n {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];
        let c = vertices[(i + 2) % n];
        if (b - a).length_squared() <= 1e-12 {
            return Err(ConfigError::InvalidShape(format!(
                "polygon has a zero-length edge at vertex {i}"
            )));
        }
        if cross(b - a, c - b) < -1e-6 {
            return Err(ConfigError::InvalidShape("polygon is not convex".into()));
        }
    }

    Ok(Shape::ConvexPolygon { vertices })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clockwise_polygon_is_reoriented_and_recentred() {
        let shape = Shape::convex_polygon(vec![
            Vec2::new(10.0, 10.0),
            Vec2::new(10.0, 12.0),
            Vec2::new(12.0, 12.0),
            Vec2::new(12.0, 10.0),
        ])
        .normalized()
        .unwrap();

        let Shape::ConvexPolygon { vertices } = &shape else {
            panic!("expected polygon");
        };
        assert!(signed_area_x2(vertices) > 0.0);
        let centroid = vertices.iter().copied().sum::<Vec2>() / vertices.len() as f32;
        assert!(centroid.length() < 1e-5);
        assert!((shape.area() - 4.0).abs() < 1e-4);
    }

    #[test]
    fn concave_polygon_is_rejected() {
        let result = Shape::convex_polygon(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(4.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 4.0),
        ])
        .normalized();
        assert!(matches!(result, Err(ConfigError::InvalidShape(_))));
    }

    #[test]
    fn rotated_rectangle_aabb_grows() {
        let shape = Shape::rectangle(2.0, 2.0);
        let aabb = shape.aabb(Vec2::ZERO, std::f32::consts::FRAC_PI_4);
        let half = 2.0_f32.sqrt();
        assert!((aabb.max.x - half).abs() < 1e-5);
        assert!((aabb.min.y + half).abs() < 1e-5);
    }

    #[test]
    fn square_polygon_inertia_matches_rectangle() {
        let polygon = Shape::convex_polygon(vec![
            Vec2::new(-1.0, -1.0),
            Vec2::new(1.0, -1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(-1.0, 1.0),
        ]);
        let rectangle = Shape::rectangle(2.0, 2.0);
        assert!((polygon.moment_of_inertia(3.0) - rectangle.moment_of_inertia(3.0)).abs() < 1e-4);
    }

    #[test]
    fn point_containment_respects_rotation() {
        let shape = Shape::rectangle(4.0, 1.0);
        let position = Vec2::new(10.0, 10.0);
        assert!(shape.contains_point(position, 0.0, Vec2::new(11.5, 10.0)));
        assert!(!shape.contains_point(position, std::f32::consts::FRAC_PI_2, Vec2::new(11.5, 10.0)));
        assert!(shape.contains_point(position, std::f32::consts::FRAC_PI_2, Vec2::new(10.0, 11.5)));
    }

    #[test]
    fn touching_boxes_overlap() {
        let a = Aabb::from_min_max(0.0, 0.0, 1.0, 1.0);
        let b = Aabb::from_min_max(1.0, 0.0, 2.0, 1.0);
        let c = Aabb::from_min_max(1.01, 0.0, 2.0, 1.0);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }
}
