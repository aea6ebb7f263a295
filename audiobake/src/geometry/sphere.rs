use super::Point;

/// A sphere.
/// Spheres are used to define a region of influence around a point.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Sphere {
    /// The center.
    pub center: Point,

    /// The radius.
    pub radius: f32,
}

impl Sphere {
    pub const fn new(center: Point, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Returns `true` if `point` lies inside the sphere or on its surface.
    pub fn contains(&self, point: Point) -> bool {
        let offset = point - self.center;
        offset.dot(&offset) <= self.radius * self.radius
    }
}
