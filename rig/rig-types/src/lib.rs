//! Core types for multibody model construction.
//!
//! This crate provides the passive data model shared by the graph builder and
//! the system assembler:
//!
//! - [`LinkDef`] - One rigid link: mass properties, initial pose, collisions
//! - [`JointDef`] - A kinematic connector between two links
//! - [`JointKind`] - The closed set of supported joint types
//! - [`Pose`] / [`MassProperties`] - Spatial and inertial primitives
//! - [`StepConfig`] - Timestep, accuracy, gravity
//!
//! # Design Philosophy
//!
//! These types are **pure data**. They carry no topology analysis and no
//! dynamics; they are the common language between:
//!
//! - The multibody graph builder (`rig-graph`)
//! - The system assembler and stepper (`rig-core`)
//! - Configuration front-ends that produce model descriptions
//!
//! Joint types are a closed tagged variant rather than strings: every switch
//! over [`JointKind`] is exhaustive and checked by the compiler, so an
//! unhandled type is a compile error instead of a silent fallthrough.
//!
//! # Example
//!
//! ```
//! use rig_types::{JointDef, JointKind, LinkDef, MassProperties};
//! use nalgebra::Vector3;
//!
//! let arm = LinkDef::new("arm", MassProperties::cylinder(2.0, 0.05, 0.4));
//! let elbow = JointDef::new(
//!     "elbow",
//!     JointKind::Revolute { axis: Vector3::y() },
//!     Some("upper_arm"),
//!     "arm",
//! );
//!
//! assert_eq!(elbow.kind.dof(), 1);
//! assert_eq!(arm.mass_props.mass, 2.0);
//! ```

#![doc(html_root_url = "https://docs.rs/rig-types/0.3.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,     // Many methods can't be const due to nalgebra
    clippy::missing_errors_doc,       // Error docs added where non-obvious
)]

mod body;
mod config;
mod error;
mod joint;
mod model;
mod shape;

pub use body::{LinkDef, LinkId, MassProperties, Pose};
pub use config::{Gravity, StepConfig};
pub use error::{BuildError, StepError};
pub use joint::{JointDef, JointId, JointKind, JointState};
pub use model::ModelDef;
pub use shape::{CollisionDef, ContactMaterial, ShapeKind};

// Re-export the math types that appear in public signatures.
pub use nalgebra::{Isometry3, Matrix3, Point3, UnitQuaternion, Vector3};

/// Result type for model-construction operations.
pub type Result<T> = std::result::Result<T, BuildError>;
