//! Collision shape descriptions and contact material parameters.
//!
//! Shapes are attached to links as contact surfaces during assembly. Shape
//! geometry beyond the attachment protocol (pose, material, clique) is the
//! collision engine's concern, not this crate's.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::body::Pose;

/// Geometry of one collision shape.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ShapeKind {
    /// Infinite half-space boundary.
    Plane {
        /// Outward unit normal of the surface.
        normal: Vector3<f64>,
    },
    /// Sphere.
    Sphere {
        /// Radius in meters.
        radius: f64,
    },
    /// Box with half-extents per axis.
    Box {
        /// Half-extents in each local axis.
        half_extents: Vector3<f64>,
    },
    /// Cylinder aligned with the local Z axis.
    Cylinder {
        /// Radius in meters.
        radius: f64,
        /// Half-length along Z in meters.
        half_length: f64,
    },
    /// Triangle mesh. Not supported as a contact surface; skipped with a
    /// warning at assembly.
    Mesh {
        /// Mesh vertices in local coordinates.
        vertices: Vec<Point3<f64>>,
    },
}

impl ShapeKind {
    /// Short lowercase name, used in diagnostics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Plane { .. } => "plane",
            Self::Sphere { .. } => "sphere",
            Self::Box { .. } => "box",
            Self::Cylinder { .. } => "cylinder",
            Self::Mesh { .. } => "mesh",
        }
    }
}

/// Compliant contact material parameters for one surface.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ContactMaterial {
    /// Contact stiffness (Pa).
    pub stiffness: f64,
    /// Dissipation coefficient (s/m).
    pub dissipation: f64,
    /// Static friction coefficient.
    pub static_friction: f64,
    /// Dynamic friction coefficient.
    pub dynamic_friction: f64,
    /// Viscous friction coefficient.
    pub viscous_friction: f64,
}

impl Default for ContactMaterial {
    fn default() -> Self {
        // Moderately soft surface; stiff enough for robot links without
        // forcing tiny integrator steps.
        Self {
            stiffness: 1e6,
            dissipation: 0.1,
            static_friction: 0.7,
            dynamic_friction: 0.5,
            viscous_friction: 0.5,
        }
    }
}

impl ContactMaterial {
    /// A frictionless material with the default compliance.
    #[must_use]
    pub fn frictionless() -> Self {
        Self {
            static_friction: 0.0,
            dynamic_friction: 0.0,
            viscous_friction: 0.0,
            ..Self::default()
        }
    }
}

/// One collision shape attached to a link.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CollisionDef {
    /// Shape name, used in diagnostics.
    pub name: String,
    /// Shape pose in link coordinates.
    pub local_pose: Pose,
    /// Geometry.
    pub shape: ShapeKind,
    /// Contact material of the surface.
    pub material: ContactMaterial,
}

impl CollisionDef {
    /// Create a collision shape at the link origin with default material.
    #[must_use]
    pub fn new(name: impl Into<String>, shape: ShapeKind) -> Self {
        Self {
            name: name.into(),
            local_pose: Pose::identity(),
            shape,
            material: ContactMaterial::default(),
        }
    }

    /// Set the shape pose in link coordinates.
    #[must_use]
    pub fn at(mut self, local_pose: Pose) -> Self {
        self.local_pose = local_pose;
        self
    }

    /// Set the contact material.
    #[must_use]
    pub fn with_material(mut self, material: ContactMaterial) -> Self {
        self.material = material;
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn shape_names() {
        assert_eq!(ShapeKind::Sphere { radius: 0.1 }.name(), "sphere");
        assert_eq!(
            ShapeKind::Plane {
                normal: Vector3::z()
            }
            .name(),
            "plane"
        );
        assert_eq!(ShapeKind::Mesh { vertices: vec![] }.name(), "mesh");
    }

    #[test]
    fn default_material_is_frictional() {
        let mat = ContactMaterial::default();
        assert!(mat.static_friction > mat.dynamic_friction * 0.9);
        assert_eq!(ContactMaterial::frictionless().static_friction, 0.0);
    }

    #[test]
    fn collision_builder() {
        let shape = CollisionDef::new("wheel", ShapeKind::Cylinder {
            radius: 0.3,
            half_length: 0.05,
        })
        .with_material(ContactMaterial::frictionless());
        assert_eq!(shape.material.dynamic_friction, 0.0);
        assert_eq!(shape.local_pose, Pose::identity());
    }
}
