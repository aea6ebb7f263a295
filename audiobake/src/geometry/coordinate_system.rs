use super::{Point, Vector3};

/// A 3D coordinate system, expressed relative to a canonical coordinate system.
///
/// Sources and listeners are handed to the simulator as coordinate systems so that directivity can be evaluated against their orientation.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CoordinateSystem {
    /// Unit vector pointing to the right (local +x axis).
    pub right: Vector3,

    /// Unit vector pointing upwards (local +y axis).
    pub up: Vector3,

    /// Unit vector pointing forwards (local -z axis).
    pub ahead: Vector3,

    /// The origin, relative to the canonical coordinate system.
    pub origin: Point,
}

impl CoordinateSystem {
    /// Axis-aligned coordinate system centered on `origin`.
    pub fn at(origin: Point) -> Self {
        Self {
            origin,
            ..Self::default()
        }
    }
}

impl Default for CoordinateSystem {
    fn default() -> Self {
        Self {
            right: Vector3::new(1.0, 0.0, 0.0),
            up: Vector3::new(0.0, 1.0, 0.0),
            ahead: Vector3::new(0.0, 0.0, -1.0),
            origin: Vector3::new(0.0, 0.0, 0.0),
        }
    }
}

impl From<Point> for CoordinateSystem {
    fn from(origin: Point) -> Self {
        Self::at(origin)
    }
}
