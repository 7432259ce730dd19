//! Link descriptions and inertial/spatial primitives.
//!
//! A link is one rigid body of a model. Its description carries everything
//! the graph builder and assembler need: mass properties, the initial world
//! pose, base-placement flags, and the collision shapes attached to it.

use nalgebra::{Isometry3, Matrix3, Point3, UnitQuaternion, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::shape::CollisionDef;

/// Unique identifier for a link within a simulation.
///
/// Assigned at model load, stable for the lifetime of the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LinkId(pub u64);

impl LinkId {
    /// Create a new link ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl From<u64> for LinkId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for LinkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Link({})", self.0)
    }
}

/// Position and orientation of a frame relative to another frame.
///
/// Used both for world poses of links and for local attachment frames of
/// joints and collision shapes. Composition follows the usual convention:
/// `a.compose(&b)` maps b-frame coordinates through a.
///
/// # Example
///
/// ```
/// use rig_types::Pose;
/// use nalgebra::Point3;
///
/// let pose = Pose::from_position(Point3::new(1.0, 0.0, 0.0));
/// let p = pose.transform_point(&Point3::new(0.0, 2.0, 0.0));
/// assert_eq!(p, Point3::new(1.0, 2.0, 0.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pose {
    /// Translation of the frame origin.
    pub position: Point3<f64>,
    /// Orientation as a unit quaternion.
    pub rotation: UnitQuaternion<f64>,
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

impl Pose {
    /// The identity pose (coincident frames).
    #[must_use]
    pub fn identity() -> Self {
        Self {
            position: Point3::origin(),
            rotation: UnitQuaternion::identity(),
        }
    }

    /// Create a pose from a translation with no rotation.
    #[must_use]
    pub fn from_position(position: Point3<f64>) -> Self {
        Self {
            position,
            rotation: UnitQuaternion::identity(),
        }
    }

    /// Create a pose from translation and rotation.
    #[must_use]
    pub const fn new(position: Point3<f64>, rotation: UnitQuaternion<f64>) -> Self {
        Self { position, rotation }
    }

    /// Create a pose from an isometry.
    #[must_use]
    pub fn from_isometry(iso: Isometry3<f64>) -> Self {
        Self {
            position: Point3::from(iso.translation.vector),
            rotation: iso.rotation,
        }
    }

    /// Convert to an isometry.
    #[must_use]
    pub fn to_isometry(&self) -> Isometry3<f64> {
        Isometry3::from_parts(self.position.coords.into(), self.rotation)
    }

    /// Map a point expressed in this frame into the parent frame.
    #[must_use]
    pub fn transform_point(&self, local: &Point3<f64>) -> Point3<f64> {
        self.position + self.rotation * local.coords
    }

    /// Map a vector expressed in this frame into the parent frame.
    #[must_use]
    pub fn transform_vector(&self, local: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * local
    }

    /// The inverse pose.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let inv_rotation = self.rotation.inverse();
        Self {
            position: Point3::from(-(inv_rotation * self.position.coords)),
            rotation: inv_rotation,
        }
    }

    /// Compose two poses: `self * other`.
    #[must_use]
    pub fn compose(&self, other: &Self) -> Self {
        Self {
            position: self.transform_point(&other.position),
            rotation: self.rotation * other.rotation,
        }
    }

    /// The pose of `to` expressed in the `from` frame, both given in a
    /// common parent frame: `from⁻¹ * to`.
    #[must_use]
    pub fn between(from: &Self, to: &Self) -> Self {
        from.inverse().compose(to)
    }

    /// Check for `NaN` or `Inf` components.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.coords.iter().all(|x| x.is_finite())
            && self.rotation.coords.iter().all(|x| x.is_finite())
    }
}

/// Mass, center of mass, and inertia of one rigid link.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MassProperties {
    /// Total mass in kg.
    pub mass: f64,
    /// Center of mass offset from the link origin, in link coordinates.
    pub center_of_mass: Vector3<f64>,
    /// Inertia tensor about the center of mass, in link coordinates (kg·m²).
    pub inertia: Matrix3<f64>,
}

impl MassProperties {
    /// Create mass properties with the given values.
    #[must_use]
    pub const fn new(mass: f64, center_of_mass: Vector3<f64>, inertia: Matrix3<f64>) -> Self {
        Self {
            mass,
            center_of_mass,
            inertia,
        }
    }

    /// A point mass at the link origin.
    #[must_use]
    pub fn point_mass(mass: f64) -> Self {
        Self {
            mass,
            center_of_mass: Vector3::zeros(),
            inertia: Matrix3::zeros(),
        }
    }

    /// A uniform solid sphere: I = (2/5)·m·r².
    #[must_use]
    pub fn sphere(mass: f64, radius: f64) -> Self {
        let i = 0.4 * mass * radius * radius;
        Self {
            mass,
            center_of_mass: Vector3::zeros(),
            inertia: Matrix3::from_diagonal(&Vector3::new(i, i, i)),
        }
    }

    /// A uniform solid box with the given half extents.
    #[must_use]
    pub fn box_shape(mass: f64, half_extents: Vector3<f64>) -> Self {
        let x2 = 4.0 * half_extents.x * half_extents.x;
        let y2 = 4.0 * half_extents.y * half_extents.y;
        let z2 = 4.0 * half_extents.z * half_extents.z;
        Self {
            mass,
            center_of_mass: Vector3::zeros(),
            inertia: Matrix3::from_diagonal(&Vector3::new(
                mass * (y2 + z2) / 12.0,
                mass * (x2 + z2) / 12.0,
                mass * (x2 + y2) / 12.0,
            )),
        }
    }

    /// A uniform solid cylinder aligned with the local Z axis.
    #[must_use]
    pub fn cylinder(mass: f64, radius: f64, half_height: f64) -> Self {
        let r2 = radius * radius;
        let h2 = 4.0 * half_height * half_height;
        let ixx = mass * (3.0 * r2 + h2) / 12.0;
        Self {
            mass,
            center_of_mass: Vector3::zeros(),
            inertia: Matrix3::from_diagonal(&Vector3::new(ixx, ixx, 0.5 * mass * r2)),
        }
    }

    /// The per-fragment share when one physical link is split into
    /// `fragments` mobilized bodies during loop breaking.
    ///
    /// Each fragment receives an equal share of mass and inertia about an
    /// unchanged center of mass, so the sum over all fragments reconstructs
    /// the original link exactly.
    #[must_use]
    pub fn split(&self, fragments: usize) -> Self {
        let share = 1.0 / fragments.max(1) as f64;
        Self {
            mass: self.mass * share,
            center_of_mass: self.center_of_mass,
            inertia: self.inertia * share,
        }
    }

    /// Validate that these properties describe a physical body.
    pub fn validate(&self, link: &str) -> crate::Result<()> {
        if self.mass < 0.0 || !self.mass.is_finite() {
            return Err(crate::BuildError::invalid_mass(
                link,
                format!("mass {} must be finite and non-negative", self.mass),
            ));
        }
        if !self.center_of_mass.iter().all(|x| x.is_finite()) {
            return Err(crate::BuildError::invalid_mass(
                link,
                "center of mass must be finite",
            ));
        }
        let eigenvalues = self.inertia.symmetric_eigenvalues();
        if eigenvalues.iter().any(|&e| e < -1e-10) {
            return Err(crate::BuildError::invalid_mass(
                link,
                "inertia tensor must be positive semi-definite",
            ));
        }
        Ok(())
    }
}

/// Description of one rigid link of a model.
///
/// The `must_be_base` flag forces the graph builder to make this link the
/// root of its spanning-tree component; links that end up as a component
/// root without a world attachment receive an implicit 6-DOF base mobilizer.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LinkDef {
    /// Unique link name within the model.
    pub name: String,
    /// Mass, center of mass, inertia.
    pub mass_props: MassProperties,
    /// Initial pose of the link frame in world coordinates.
    pub initial_pose: Pose,
    /// Force this link to be a spanning-tree base.
    pub must_be_base: bool,
    /// Allow this link's shapes to collide with the rest of its own model.
    pub self_collide: bool,
    /// Collision shapes attached to this link.
    pub collisions: Vec<CollisionDef>,
}

impl LinkDef {
    /// Create a link with the given name and mass properties.
    #[must_use]
    pub fn new(name: impl Into<String>, mass_props: MassProperties) -> Self {
        Self {
            name: name.into(),
            mass_props,
            initial_pose: Pose::identity(),
            must_be_base: false,
            self_collide: false,
            collisions: Vec::new(),
        }
    }

    /// Set the initial world pose.
    #[must_use]
    pub fn at(mut self, pose: Pose) -> Self {
        self.initial_pose = pose;
        self
    }

    /// Force this link to be a spanning-tree base.
    #[must_use]
    pub fn as_base(mut self) -> Self {
        self.must_be_base = true;
        self
    }

    /// Opt this link out of its model's no-self-collision clique.
    #[must_use]
    pub fn with_self_collide(mut self) -> Self {
        self.self_collide = true;
        self
    }

    /// Attach a collision shape.
    #[must_use]
    pub fn with_collision(mut self, collision: CollisionDef) -> Self {
        self.collisions.push(collision);
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn link_id_display() {
        assert_eq!(LinkId::new(7).to_string(), "Link(7)");
        assert_eq!(LinkId::from(7u64).raw(), 7);
    }

    #[test]
    fn pose_round_trip_through_isometry() {
        let pose = Pose::new(
            Point3::new(1.0, -2.0, 0.5),
            UnitQuaternion::from_euler_angles(0.3, -0.1, 1.2),
        );
        let back = Pose::from_isometry(pose.to_isometry());
        assert_relative_eq!(back.position.coords, pose.position.coords, epsilon = 1e-12);
    }

    #[test]
    fn pose_inverse_cancels() {
        let pose = Pose::new(
            Point3::new(3.0, 1.0, -4.0),
            UnitQuaternion::from_euler_angles(0.2, 0.4, 0.6),
        );
        let ident = pose.compose(&pose.inverse());
        assert_relative_eq!(ident.position.coords, Vector3::zeros(), epsilon = 1e-12);
    }

    #[test]
    fn pose_between_recovers_offset() {
        let parent = Pose::from_position(Point3::new(1.0, 0.0, 0.0));
        let child = Pose::from_position(Point3::new(1.0, 2.0, 0.0));
        let rel = Pose::between(&parent, &child);
        assert_relative_eq!(rel.position.y, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn mass_split_reconstructs_total() {
        let props = MassProperties::box_shape(9.0, Vector3::new(0.1, 0.2, 0.3));
        let fragment = props.split(3);

        assert_relative_eq!(fragment.mass * 3.0, props.mass, max_relative = 1e-9);
        for i in 0..3 {
            assert_relative_eq!(
                fragment.inertia[(i, i)] * 3.0,
                props.inertia[(i, i)],
                max_relative = 1e-9
            );
        }
        assert_eq!(fragment.center_of_mass, props.center_of_mass);
    }

    #[test]
    fn mass_split_of_one_is_identity() {
        let props = MassProperties::sphere(2.0, 0.1);
        assert_eq!(props.split(1), props);
        // A zero fragment count never divides by zero.
        assert_eq!(props.split(0), props);
    }

    #[test]
    fn mass_validation_rejects_negative() {
        let bad = MassProperties::point_mass(-1.0);
        assert!(bad.validate("bad_link").is_err());
        assert!(MassProperties::sphere(1.0, 0.2).validate("ok").is_ok());
    }

    #[test]
    fn link_builder_flags() {
        let link = LinkDef::new("chassis", MassProperties::point_mass(1.0))
            .as_base()
            .with_self_collide();
        assert!(link.must_be_base);
        assert!(link.self_collide);
        assert!(link.collisions.is_empty());
    }
}
