//! A kinematic reference backend.
//!
//! Implements [`DynamicsBackend`] with tree forward kinematics and
//! first-order coordinate integration at a fixed sub-step: enough to
//! exercise assembly, stepping, pose synchronization, and the one-shot
//! force protocol without a constraint solver. Weld constraints and
//! contact surfaces are recorded but exert no forces; a production
//! backend supplies the real dynamics behind the same trait.

use nalgebra::{Point3, UnitQuaternion, Vector3};
use rig_types::{BuildError, Pose, StepConfig, StepError};

use crate::engine::{
    CliqueId, ConstraintId, ContactSurfaceSpec, DynamicsBackend, MobilizerKind, MobilizerSpec,
    MobodId,
};

const GROUND: MobodId = MobodId(0);

/// Generalized coordinates of one mobilizer.
#[derive(Debug, Clone)]
enum Coords {
    /// Weld: no coordinates.
    None,
    /// Pin or slider: one coordinate and rate.
    Scalar { q: f64, u: f64 },
    /// Ball: orientation and angular rate.
    Ball {
        q: UnitQuaternion<f64>,
        u: Vector3<f64>,
    },
    /// Free: full pose, linear and angular rate.
    Free {
        q: Pose,
        u_lin: Vector3<f64>,
        u_ang: Vector3<f64>,
    },
}

#[derive(Debug, Clone)]
struct Mob {
    spec: MobilizerSpec,
    coords: Coords,
    force: Vector3<f64>,
    torque: Vector3<f64>,
}

impl Mob {
    fn new(spec: MobilizerSpec) -> Self {
        let coords = match spec.kind {
            MobilizerKind::Weld => Coords::None,
            MobilizerKind::Pin | MobilizerKind::Slider => Coords::Scalar { q: 0.0, u: 0.0 },
            MobilizerKind::Ball => Coords::Ball {
                q: spec.default_transform.rotation,
                u: Vector3::zeros(),
            },
            MobilizerKind::Free => Coords::Free {
                q: spec.default_transform,
                u_lin: Vector3::zeros(),
                u_ang: Vector3::zeros(),
            },
        };
        Self {
            spec,
            coords,
            force: Vector3::zeros(),
            torque: Vector3::zeros(),
        }
    }

    /// The joint transform X_FM for the current coordinates.
    fn joint_transform(&self) -> Pose {
        let x_fm = match (&self.coords, self.spec.kind) {
            (Coords::Scalar { q, .. }, MobilizerKind::Pin) => Pose::new(
                Point3::origin(),
                UnitQuaternion::from_axis_angle(&Vector3::z_axis(), *q),
            ),
            (Coords::Scalar { q, .. }, MobilizerKind::Slider) => {
                Pose::from_position(Point3::new(*q, 0.0, 0.0))
            }
            (Coords::Ball { q, .. }, _) => Pose::new(Point3::origin(), *q),
            (Coords::Free { q, .. }, _) => *q,
            _ => Pose::identity(),
        };
        if self.spec.reversed {
            x_fm.inverse()
        } else {
            x_fm
        }
    }

    fn is_finite(&self) -> bool {
        match &self.coords {
            Coords::None => true,
            Coords::Scalar { q, u } => q.is_finite() && u.is_finite(),
            Coords::Ball { q, u } => {
                q.coords.iter().all(|x| x.is_finite()) && u.iter().all(|x| x.is_finite())
            }
            Coords::Free { q, u_lin, u_ang } => {
                q.is_finite()
                    && u_lin.iter().all(|x| x.is_finite())
                    && u_ang.iter().all(|x| x.is_finite())
            }
        }
    }
}

/// Tree-forward-kinematics backend with fixed-sub-step integration.
#[derive(Debug)]
pub struct KinematicBackend {
    mobods: Vec<Mob>,
    /// Contact surfaces per mobilized body, ground included at index 0.
    surfaces: Vec<Vec<ContactSurfaceSpec>>,
    welds: Vec<(MobodId, MobodId)>,
    next_clique: u32,
    gravity: Vector3<f64>,
    max_step: f64,
    time: f64,
    realized: bool,
    /// World pose cache, index = raw mobod id.
    world_poses: Vec<Pose>,
}

impl KinematicBackend {
    /// Create a backend with the given internal sub-step (seconds).
    #[must_use]
    pub fn new(max_step: f64) -> Self {
        Self {
            mobods: Vec::new(),
            surfaces: vec![Vec::new()],
            welds: Vec::new(),
            next_clique: 0,
            gravity: Vector3::zeros(),
            max_step,
            time: 0.0,
            realized: false,
            world_poses: vec![Pose::identity()],
        }
    }

    /// Number of mobilized bodies (ground excluded).
    #[must_use]
    pub fn mobilized_body_count(&self) -> usize {
        self.mobods.len()
    }

    /// Number of weld constraints.
    #[must_use]
    pub fn weld_count(&self) -> usize {
        self.welds.len()
    }

    /// Contact surfaces attached to a body.
    #[must_use]
    pub fn surfaces_on(&self, body: MobodId) -> &[ContactSurfaceSpec] {
        &self.surfaces[body.0 as usize]
    }

    /// Find a mobilized body by the name given at instantiation.
    #[must_use]
    pub fn mobod_named(&self, name: &str) -> Option<MobodId> {
        self.mobods
            .iter()
            .position(|m| m.spec.name == name)
            .map(|k| MobodId(k as u32 + 1))
    }

    /// Whether any discrete forces are pending.
    #[must_use]
    pub fn has_pending_forces(&self) -> bool {
        self.mobods
            .iter()
            .any(|m| m.force.norm() > 0.0 || m.torque.norm() > 0.0)
    }

    /// Whether the topology has been realized.
    #[must_use]
    pub fn is_realized(&self) -> bool {
        self.realized
    }

    fn integrate(&mut self, h: f64) {
        let gravity = self.gravity;
        for mob in &mut self.mobods {
            let mass = mob.spec.mass_props.mass;
            let inv_inertia = mob.spec.mass_props.inertia.try_inverse();
            match &mut mob.coords {
                Coords::None => {}
                Coords::Scalar { q, u } => {
                    // Generalized force along the canonical joint axis:
                    // Z torque for a pin, X force for a slider.
                    match mob.spec.kind {
                        MobilizerKind::Pin => {
                            let inertia = mob.spec.mass_props.inertia[(2, 2)];
                            if inertia > 0.0 {
                                *u += mob.torque.z / inertia * h;
                            }
                        }
                        _ => {
                            if mass > 0.0 {
                                *u += mob.force.x / mass * h;
                            }
                        }
                    }
                    *q += *u * h;
                }
                Coords::Ball { q, u } => {
                    if let Some(inv) = inv_inertia {
                        *u += inv * mob.torque * h;
                    }
                    *q = UnitQuaternion::from_scaled_axis(*u * h) * *q;
                }
                Coords::Free { q, u_lin, u_ang } => {
                    *u_lin += gravity * h;
                    if mass > 0.0 {
                        *u_lin += mob.force / mass * h;
                    }
                    if let Some(inv) = inv_inertia {
                        *u_ang += inv * mob.torque * h;
                    }
                    q.position += *u_lin * h;
                    q.rotation = UnitQuaternion::from_scaled_axis(*u_ang * h) * q.rotation;
                }
            }
        }
    }

    fn update_poses(&mut self) {
        for k in 0..self.mobods.len() {
            let mob = &self.mobods[k];
            let parent = self.world_poses[mob.spec.inboard.0 as usize];
            let pose = parent
                .compose(&mob.spec.inboard_frame)
                .compose(&mob.joint_transform())
                .compose(&mob.spec.outboard_frame.inverse());
            self.world_poses[k + 1] = pose;
        }
    }
}

impl DynamicsBackend for KinematicBackend {
    fn ground(&self) -> MobodId {
        GROUND
    }

    fn configure(&mut self, config: &StepConfig) {
        // Fixed-step integration: the accuracy target has no adaptive
        // step control to act on here, only the step ceiling applies.
        self.max_step = config.max_step;
    }

    fn set_gravity(&mut self, gravity: Vector3<f64>) {
        self.gravity = gravity;
    }

    fn add_mobilized_body(&mut self, spec: MobilizerSpec) -> Result<MobodId, BuildError> {
        if spec.inboard.0 as usize > self.mobods.len() {
            return Err(BuildError::realize_failed(format!(
                "mobilizer '{}' references inboard body {} before it exists",
                spec.name, spec.inboard
            )));
        }
        self.mobods.push(Mob::new(spec));
        self.surfaces.push(Vec::new());
        self.world_poses.push(Pose::identity());
        Ok(MobodId(self.mobods.len() as u32))
    }

    fn add_weld_constraint(&mut self, master: MobodId, slave: MobodId) -> ConstraintId {
        self.welds.push((master, slave));
        ConstraintId(self.welds.len() as u32 - 1)
    }

    fn new_contact_clique(&mut self) -> CliqueId {
        let id = CliqueId(self.next_clique);
        self.next_clique += 1;
        id
    }

    fn add_contact_surface(&mut self, body: MobodId, surface: ContactSurfaceSpec) {
        self.surfaces[body.0 as usize].push(surface);
    }

    fn realize_topology(&mut self) -> Result<(), BuildError> {
        self.realized = true;
        self.update_poses();
        Ok(())
    }

    fn time(&self) -> f64 {
        self.time
    }

    fn step_to(&mut self, target: f64) -> Result<f64, StepError> {
        if !self.realized {
            return Err(StepError::NotRealized);
        }
        while self.time < target {
            let h = (target - self.time).min(self.max_step);
            self.integrate(h);
            self.time += h;
            if target - self.time < 1e-12 {
                self.time = target;
            }
            if let Some(bad) = self.mobods.iter().find(|m| !m.is_finite()) {
                return Err(StepError::diverged(format!(
                    "non-finite coordinates on '{}'",
                    bad.spec.name
                )));
            }
        }
        self.update_poses();
        Ok(self.time)
    }

    fn body_pose(&self, body: MobodId) -> Pose {
        self.world_poses[body.0 as usize]
    }

    fn mobilizer_coord(&self, body: MobodId, dof: usize) -> f64 {
        if body == GROUND {
            return 0.0;
        }
        match &self.mobods[body.0 as usize - 1].coords {
            Coords::Scalar { q, .. } if dof == 0 => *q,
            Coords::Ball { q, .. } if dof < 3 => q.scaled_axis()[dof],
            Coords::Free { q, .. } if dof < 3 => q.rotation.scaled_axis()[dof],
            Coords::Free { q, .. } if dof < 6 => q.position[dof - 3],
            _ => 0.0,
        }
    }

    fn mobilizer_rate(&self, body: MobodId, dof: usize) -> f64 {
        if body == GROUND {
            return 0.0;
        }
        match &self.mobods[body.0 as usize - 1].coords {
            Coords::Scalar { u, .. } if dof == 0 => *u,
            Coords::Ball { u, .. } if dof < 3 => u[dof],
            Coords::Free { u_ang, .. } if dof < 3 => u_ang[dof],
            Coords::Free { u_lin, .. } if dof < 6 => u_lin[dof - 3],
            _ => 0.0,
        }
    }

    fn apply_discrete_force(&mut self, body: MobodId, force: Vector3<f64>, torque: Vector3<f64>) {
        if body == GROUND {
            return;
        }
        let mob = &mut self.mobods[body.0 as usize - 1];
        mob.force += force;
        mob.torque += torque;
    }

    fn clear_discrete_forces(&mut self) {
        for mob in &mut self.mobods {
            mob.force = Vector3::zeros();
            mob.torque = Vector3::zeros();
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rig_types::MassProperties;

    fn pin_spec(name: &str, inboard: MobodId) -> MobilizerSpec {
        MobilizerSpec {
            name: name.to_owned(),
            inboard,
            kind: MobilizerKind::Pin,
            inboard_frame: Pose::identity(),
            outboard_frame: Pose::identity(),
            default_transform: Pose::identity(),
            reversed: false,
            mass_props: MassProperties::sphere(1.0, 0.5),
        }
    }

    #[test]
    fn stepping_before_realize_fails() {
        let mut backend = KinematicBackend::new(0.01);
        assert_eq!(backend.step_to(0.1), Err(StepError::NotRealized));
    }

    #[test]
    fn step_to_past_target_is_a_no_op() {
        let mut backend = KinematicBackend::new(0.01);
        backend.realize_topology().unwrap();
        backend.step_to(0.05).unwrap();
        assert_relative_eq!(backend.time(), 0.05, epsilon = 1e-12);

        let t = backend.step_to(0.01).unwrap();
        assert_relative_eq!(t, 0.05, epsilon = 1e-12);
    }

    #[test]
    fn pin_torque_rotates_the_body() {
        let mut backend = KinematicBackend::new(0.001);
        let bob = backend
            .add_mobilized_body(pin_spec("bob", GROUND))
            .unwrap();
        backend.realize_topology().unwrap();

        backend.apply_discrete_force(bob, Vector3::zeros(), Vector3::new(0.0, 0.0, 1.0));
        backend.step_to(0.1).unwrap();

        let angle = backend.mobilizer_coord(bob, 0);
        assert!(angle > 0.0);
        assert!(backend.mobilizer_rate(bob, 0) > 0.0);
        // World pose reflects the joint coordinate.
        let pose = backend.body_pose(bob);
        assert_relative_eq!(pose.rotation.angle(), angle, epsilon = 1e-9);
    }

    #[test]
    fn free_body_falls_under_gravity() {
        let mut backend = KinematicBackend::new(0.001);
        backend.set_gravity(Vector3::new(0.0, 0.0, -9.81));
        let spec = MobilizerSpec {
            kind: MobilizerKind::Free,
            ..pin_spec("crate", GROUND)
        };
        let body = backend.add_mobilized_body(spec).unwrap();
        backend.realize_topology().unwrap();

        backend.step_to(1.0).unwrap();
        let pose = backend.body_pose(body);
        assert!(pose.position.z < -4.0, "z = {}", pose.position.z);
        assert!(backend.mobilizer_rate(body, 5) < -9.0);
    }

    #[test]
    fn forces_persist_until_cleared() {
        let mut backend = KinematicBackend::new(0.01);
        let spec = MobilizerSpec {
            kind: MobilizerKind::Free,
            ..pin_spec("probe", GROUND)
        };
        let body = backend.add_mobilized_body(spec).unwrap();
        backend.realize_topology().unwrap();

        backend.apply_discrete_force(body, Vector3::new(2.0, 0.0, 0.0), Vector3::zeros());
        assert!(backend.has_pending_forces());
        backend.step_to(0.5).unwrap();
        let v_pushed = backend.mobilizer_rate(body, 3);
        assert!(v_pushed > 0.0);

        backend.clear_discrete_forces();
        assert!(!backend.has_pending_forces());
        backend.step_to(1.0).unwrap();
        assert_relative_eq!(backend.mobilizer_rate(body, 3), v_pushed, epsilon = 1e-12);
    }

    #[test]
    fn out_of_order_inboard_is_rejected() {
        let mut backend = KinematicBackend::new(0.01);
        let err = backend
            .add_mobilized_body(pin_spec("orphan", MobodId(3)))
            .unwrap_err();
        assert!(err.to_string().contains("orphan"));
    }

    #[test]
    fn divergence_is_reported() {
        let mut backend = KinematicBackend::new(0.01);
        let spec = MobilizerSpec {
            kind: MobilizerKind::Free,
            ..pin_spec("doomed", GROUND)
        };
        let body = backend.add_mobilized_body(spec).unwrap();
        backend.realize_topology().unwrap();

        backend.apply_discrete_force(body, Vector3::new(f64::INFINITY, 0.0, 0.0), Vector3::zeros());
        let err = backend.step_to(0.1).unwrap_err();
        assert!(matches!(err, StepError::Diverged { .. }));
    }
}
