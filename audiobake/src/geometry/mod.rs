//! Geometric primitives used to place probes and endpoints.

mod vector3;
pub use vector3::Vector3;

/// A point in 3D space.
pub type Point = Vector3;

mod coordinate_system;
pub use coordinate_system::CoordinateSystem;

mod sphere;
pub use sphere::Sphere;
