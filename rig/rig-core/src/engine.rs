//! The dynamics-backend boundary.
//!
//! Everything the core needs from a physics engine fits in the
//! [`DynamicsBackend`] trait: instantiate mobilizers and constraints,
//! attach contact surfaces, realize the topology once, then step and query
//! state. Integrator and solver internals stay behind this seam.

use nalgebra::Vector3;
use rig_types::{BuildError, ContactMaterial, MassProperties, Pose, StepConfig, StepError};

/// Handle to a mobilized body in the backend's tree.
///
/// Handles are stable integer references into the backend's arena; the
/// master/slave tables in [`crate::AssembledModel`] store these, never
/// owned body objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MobodId(pub u32);

impl std::fmt::Display for MobodId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Mobod({})", self.0)
    }
}

/// Handle to a constraint in the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConstraintId(pub u32);

/// Handle to a contact clique.
///
/// Surfaces sharing a clique never generate contact against each other;
/// one clique per model implements default no-self-collision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CliqueId(pub u32);

/// Dynamical primitive realizing one mobilizer.
///
/// The canonical axis conventions follow the usual multibody engine
/// layout: a pin rotates about the joint frame's Z axis, a slider
/// translates along its X axis. The assembler rotates user axes into
/// these conventions before frames reach the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MobilizerKind {
    /// 0 DOF: rigid attachment.
    Weld,
    /// 1 DOF: rotation about the joint frame Z axis.
    Pin,
    /// 1 DOF: translation along the joint frame X axis.
    Slider,
    /// 3 DOF: orientation.
    Ball,
    /// 6 DOF: full pose.
    Free,
}

/// Everything the backend needs to instantiate one mobilized body.
#[derive(Debug, Clone)]
pub struct MobilizerSpec {
    /// Name of the mobilized body, used in diagnostics.
    pub name: String,
    /// The already-instantiated inboard body.
    pub inboard: MobodId,
    /// Dynamical primitive.
    pub kind: MobilizerKind,
    /// Joint frame in inboard-body coordinates.
    pub inboard_frame: Pose,
    /// Joint frame in outboard-body coordinates.
    pub outboard_frame: Pose,
    /// Initial pose of the outboard joint frame in the inboard joint
    /// frame. Consumed by `Free` (full pose) and `Ball` (rotation part).
    pub default_transform: Pose,
    /// Instantiated opposite to the tree direction; coordinate queries on
    /// the source joint must negate.
    pub reversed: bool,
    /// Effective mass properties of the outboard body (already split
    /// across fragments where loop breaking duplicated the link).
    pub mass_props: MassProperties,
}

/// Contact geometry accepted by the attachment protocol.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceGeometry {
    /// Half-space boundary; surface normal is the frame's -X axis.
    HalfSpace,
    /// Sphere.
    Sphere {
        /// Radius in meters.
        radius: f64,
    },
    /// Ellipsoid with per-axis radii (also the stand-in for boxes and
    /// cylinders).
    Ellipsoid {
        /// Radii along the local axes.
        radii: Vector3<f64>,
    },
}

/// One contact surface to attach to a mobilized body.
#[derive(Debug, Clone)]
pub struct ContactSurfaceSpec {
    /// Geometry of the surface.
    pub geometry: SurfaceGeometry,
    /// Surface pose in body coordinates.
    pub local_pose: Pose,
    /// Compliant contact parameters.
    pub material: ContactMaterial,
    /// Clique membership, if contact within a group is suppressed.
    pub clique: Option<CliqueId>,
}

/// The narrow interface the core needs from a physics engine.
///
/// Construction methods (`add_*`, `realize_topology`) are called exactly
/// once per model load, in mobilizer order; `step_to` and the state
/// queries run repeatedly afterwards. Implementations may subdivide
/// `step_to` internally however they like.
pub trait DynamicsBackend {
    /// The immobile ground body.
    fn ground(&self) -> MobodId;

    /// Apply the integrator knobs (accuracy target, maximum internal
    /// step). Called once at context creation, before any model loads.
    fn configure(&mut self, config: &StepConfig);

    /// Set the gravity vector applied to the system.
    fn set_gravity(&mut self, gravity: Vector3<f64>);

    /// Instantiate one mobilized body. The spec's inboard handle must
    /// already exist.
    fn add_mobilized_body(&mut self, spec: MobilizerSpec) -> Result<MobodId, BuildError>;

    /// Rigidly couple two mobilized bodies (slave-to-master weld).
    fn add_weld_constraint(&mut self, master: MobodId, slave: MobodId) -> ConstraintId;

    /// Create a fresh contact clique.
    fn new_contact_clique(&mut self) -> CliqueId;

    /// Attach a contact surface to a mobilized body.
    fn add_contact_surface(&mut self, body: MobodId, surface: ContactSurfaceSpec);

    /// Validate and allocate the dynamical state. Called once after all
    /// construction; stepping before this fails.
    fn realize_topology(&mut self) -> Result<(), BuildError>;

    /// Current integrator time.
    fn time(&self) -> f64;

    /// Advance the integrator toward `target`, returning the new time.
    /// A target at or before the current time is a no-op.
    fn step_to(&mut self, target: f64) -> Result<f64, StepError>;

    /// World pose of a mobilized body.
    fn body_pose(&self, body: MobodId) -> Pose;

    /// One generalized coordinate of the body's mobilizer.
    fn mobilizer_coord(&self, body: MobodId, dof: usize) -> f64;

    /// One generalized rate of the body's mobilizer.
    fn mobilizer_rate(&self, body: MobodId, dof: usize) -> f64;

    /// Accumulate a discrete force and torque on a body, held until
    /// [`Self::clear_discrete_forces`].
    fn apply_discrete_force(&mut self, body: MobodId, force: Vector3<f64>, torque: Vector3<f64>);

    /// Drop all accumulated discrete forces (one-shot per tick semantics).
    fn clear_discrete_forces(&mut self);
}
