//! Joint descriptions.
//!
//! A joint connects a parent and a child link (or a child link and the
//! world) and constrains their relative motion. The supported kinematic
//! types form a closed enum; assembly dispatches over it exhaustively.

use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::body::Pose;

/// Unique identifier for a joint within a simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JointId(pub u64);

impl JointId {
    /// Create a new joint ID.
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

impl From<u64> for JointId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for JointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Joint({})", self.0)
    }
}

/// Kinematic joint type, with per-type frame data.
///
/// Axes are expressed in the joint frame shared by the two attachment
/// frames of the [`JointDef`]. `Fixed` (0 DOF) and `Free` (6 DOF) double as
/// the built-in "weld" and "free" types of the graph builder.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum JointKind {
    /// No relative motion.
    Fixed,
    /// Unconstrained 6-DOF motion (floating base).
    Free,
    /// Rotation about a single axis.
    Revolute {
        /// Rotation axis in the joint frame.
        axis: Vector3<f64>,
    },
    /// Translation along a single axis.
    Prismatic {
        /// Translation axis in the joint frame.
        axis: Vector3<f64>,
    },
    /// Coupled rotation and translation about a single axis.
    Screw {
        /// Screw axis in the joint frame.
        axis: Vector3<f64>,
        /// Advance per revolution (m/rad).
        pitch: f64,
    },
    /// Rotation about two perpendicular axes.
    Universal {
        /// First rotation axis.
        axis1: Vector3<f64>,
        /// Second rotation axis.
        axis2: Vector3<f64>,
    },
    /// Two-axis suspension joint (steer + spin).
    Hinge2 {
        /// First rotation axis.
        axis1: Vector3<f64>,
        /// Second rotation axis.
        axis2: Vector3<f64>,
    },
    /// Rotation about all three axes.
    Ball,
}

impl JointKind {
    /// Degrees of freedom contributed by this joint type.
    #[must_use]
    pub const fn dof(self) -> usize {
        match self {
            Self::Fixed => 0,
            Self::Revolute { .. } | Self::Prismatic { .. } | Self::Screw { .. } => 1,
            Self::Universal { .. } | Self::Hinge2 { .. } => 2,
            Self::Ball => 3,
            Self::Free => 6,
        }
    }

    /// Short lowercase name, used in diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Free => "free",
            Self::Revolute { .. } => "revolute",
            Self::Prismatic { .. } => "prismatic",
            Self::Screw { .. } => "screw",
            Self::Universal { .. } => "universal",
            Self::Hinge2 { .. } => "hinge2",
            Self::Ball => "ball",
        }
    }
}

impl std::fmt::Display for JointKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Description of one joint of a model.
///
/// The attachment frames locate the shared joint frame on each body:
/// `parent_frame` in parent-link coordinates and `child_frame` in
/// child-link coordinates. `default_transform` is the initial pose of the
/// child attachment frame in the parent attachment frame.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JointDef {
    /// Unique joint name within the model.
    pub name: String,
    /// Kinematic type and axes.
    pub kind: JointKind,
    /// Parent link name; `None` attaches the child to the world.
    pub parent: Option<String>,
    /// Child link name.
    pub child: String,
    /// Joint frame in parent-link coordinates.
    pub parent_frame: Pose,
    /// Joint frame in child-link coordinates.
    pub child_frame: Pose,
    /// Initial child-frame pose relative to the parent frame.
    pub default_transform: Pose,
    /// Force the graph builder to break any cycle at this joint.
    pub must_break_loop: bool,
}

impl JointDef {
    /// Create a joint with identity frames.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        kind: JointKind,
        parent: Option<&str>,
        child: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            parent: parent.map(str::to_owned),
            child: child.into(),
            parent_frame: Pose::identity(),
            child_frame: Pose::identity(),
            default_transform: Pose::identity(),
            must_break_loop: false,
        }
    }

    /// Set the attachment frames on both bodies.
    #[must_use]
    pub fn with_frames(mut self, parent_frame: Pose, child_frame: Pose) -> Self {
        self.parent_frame = parent_frame;
        self.child_frame = child_frame;
        self
    }

    /// Set the initial relative transform.
    #[must_use]
    pub fn with_default_transform(mut self, transform: Pose) -> Self {
        self.default_transform = transform;
        self
    }

    /// Mark this joint as a deliberate loop-break point.
    #[must_use]
    pub fn breaking_loop(mut self) -> Self {
        self.must_break_loop = true;
        self
    }
}

/// Position and velocity of a 1-DOF joint.
///
/// Angle/angular rate for revolute and screw joints, distance/speed for
/// prismatic joints. Values reported for a joint assembled in reversed
/// direction are already sign-corrected.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JointState {
    /// Joint coordinate.
    pub position: f64,
    /// Joint rate.
    pub velocity: f64,
}

impl JointState {
    /// Create a joint state.
    #[must_use]
    pub const fn new(position: f64, velocity: f64) -> Self {
        Self { position, velocity }
    }

    /// Negate both coordinate and rate (reversed-mobilizer correction).
    #[must_use]
    pub const fn negated(self) -> Self {
        Self {
            position: -self.position,
            velocity: -self.velocity,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn dof_counts() {
        assert_eq!(JointKind::Fixed.dof(), 0);
        assert_eq!(JointKind::Revolute { axis: Vector3::z() }.dof(), 1);
        assert_eq!(
            JointKind::Screw {
                axis: Vector3::z(),
                pitch: 0.01
            }
            .dof(),
            1
        );
        assert_eq!(
            JointKind::Universal {
                axis1: Vector3::x(),
                axis2: Vector3::y()
            }
            .dof(),
            2
        );
        assert_eq!(JointKind::Ball.dof(), 3);
        assert_eq!(JointKind::Free.dof(), 6);
    }

    #[test]
    fn kind_names() {
        assert_eq!(JointKind::Ball.to_string(), "ball");
        assert_eq!(
            JointKind::Prismatic { axis: Vector3::x() }.to_string(),
            "prismatic"
        );
    }

    #[test]
    fn joint_without_parent_attaches_to_world() {
        let joint = JointDef::new("anchor", JointKind::Fixed, None, "pedestal");
        assert!(joint.parent.is_none());
        assert_eq!(joint.child, "pedestal");
    }

    #[test]
    fn negated_state_flips_both_fields() {
        let state = JointState::new(0.5, -2.0);
        let flipped = state.negated();
        assert_eq!(flipped.position, -0.5);
        assert_eq!(flipped.velocity, 2.0);
    }
}
