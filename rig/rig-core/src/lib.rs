//! Multibody system assembly and stepping.
//!
//! This crate is the integration layer between a model description and a
//! dynamics backend:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Simulation                             │
//! │  Owns: backend, handle tables, dirty-pose queue, the lock   │
//! │  Exposes: load / step_to / joint_state / apply_force        │
//! └───────────────┬─────────────────────────┬───────────────────┘
//!                 │ load                    │ step_to
//!                 ▼                         ▼
//! ┌───────────────────────────┐ ┌───────────────────────────────┐
//! │         Assembler          │ │    Stepper / Synchronizer     │
//! │  Graph walk → mobilizers,  │ │  Advance integrator to t,     │
//! │  slave welds, contact      │ │  publish poses, clear forces  │
//! │  surfaces + cliques        │ │                               │
//! └───────────────┬───────────┘ └───────────────┬───────────────┘
//!                 ▼                             ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │              DynamicsBackend (black box)                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The backend is consumed through the narrow [`DynamicsBackend`] trait;
//! its integrator and constraint numerics are opaque here. A first-party
//! [`KinematicBackend`] implements the trait with tree forward kinematics
//! for tests and headless pose propagation.
//!
//! # Quick Start
//!
//! ```
//! use rig_core::{KinematicBackend, Simulation};
//! use rig_types::{JointDef, JointKind, LinkDef, MassProperties, ModelDef, StepConfig};
//! use nalgebra::Vector3;
//!
//! let model = ModelDef::new("pendulum")
//!     .with_link(LinkDef::new("bob", MassProperties::sphere(1.0, 0.1)))
//!     .with_joint(JointDef::new(
//!         "pivot",
//!         JointKind::Revolute { axis: Vector3::y() },
//!         None,
//!         "bob",
//!     ));
//!
//! let sim = Simulation::new(KinematicBackend::new(1e-3), StepConfig::default());
//! sim.load(model).unwrap();
//!
//! let summary = sim.step_to(0.01).unwrap();
//! assert!(summary.sub_steps > 0);
//! assert_eq!(sim.take_dirty_poses().len(), 1);
//! ```

#![doc(html_root_url = "https://docs.rs/rig-core/0.3.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,     // Many methods can't be const due to nalgebra
    clippy::missing_errors_doc,       // Error docs added where non-obvious
)]

mod assembler;
mod engine;
mod kinematic;
mod scene;
mod sim;

pub use assembler::{assemble, assemble_static, AssembledModel, JointRuntime, LinkRuntime};
pub use engine::{
    CliqueId, ConstraintId, ContactSurfaceSpec, DynamicsBackend, MobilizerKind, MobilizerSpec,
    MobodId, SurfaceGeometry,
};
pub use kinematic::KinematicBackend;
pub use scene::{DirtyPoseQueue, PoseSink, PoseUpdate};
pub use sim::{Simulation, StepSummary};

// Re-export the data model for convenience.
pub use rig_graph::{GraphBuilder, MultibodyGraph};
pub use rig_types::{
    BuildError, JointDef, JointId, JointKind, JointState, LinkDef, LinkId, MassProperties,
    ModelDef, Pose, StepConfig, StepError,
};
