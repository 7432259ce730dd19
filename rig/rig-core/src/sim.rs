//! The simulation context: load, step, synchronize, query.
//!
//! One [`Simulation`] owns one dynamics backend, the handle tables of
//! every loaded model, and the dirty-pose queue. A single mutex scopes
//! every mutation: the whole step-and-synchronize operation holds it for
//! its duration, so a concurrent load or reset can never observe the
//! backend mid-step. The guard releases on every exit path, errors
//! included.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use nalgebra::Vector3;
use rig_graph::{GraphBuilder, MultibodyGraph};
use rig_types::{
    BuildError, JointId, JointState, LinkId, ModelDef, StepConfig, StepError,
};

use crate::assembler::{assemble, assemble_static, AssembledModel};
use crate::engine::DynamicsBackend;
use crate::scene::{DirtyPoseQueue, PoseSink, PoseUpdate};

/// Outcome of one step-and-synchronize call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepSummary {
    /// Integrator time after the call.
    pub time: f64,
    /// Outer sub-steps issued to the backend; zero when the integrator
    /// was already at or past the target.
    pub sub_steps: u32,
    /// Pose updates published to the dirty queue.
    pub poses_published: usize,
}

struct SimState<B> {
    backend: B,
    models: HashMap<String, AssembledModel>,
    queue: DirtyPoseQueue,
    next_link_id: u64,
    next_joint_id: u64,
}

/// The simulation context.
///
/// Created at world setup with a backend and a step configuration,
/// destroyed when the world goes away; there is no global engine state.
pub struct Simulation<B: DynamicsBackend> {
    state: Mutex<SimState<B>>,
}

impl<B: DynamicsBackend> Simulation<B> {
    /// Create a context around a backend, applying the configured
    /// integrator knobs and gravity.
    #[must_use]
    pub fn new(mut backend: B, config: StepConfig) -> Self {
        backend.configure(&config);
        let gravity = if config.gravity.is_zero() {
            Vector3::zeros()
        } else {
            config.gravity.vector
        };
        backend.set_gravity(gravity);
        Self {
            state: Mutex::new(SimState {
                backend,
                models: HashMap::new(),
                queue: DirtyPoseQueue::new(),
                next_link_id: 0,
                next_joint_id: 0,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SimState<B>> {
        // A panicked holder cannot leave the tables half-written: every
        // mutation path writes them only after the fallible calls.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Load one model: generate its multibody graph, assemble it into the
    /// backend, and realize the topology.
    ///
    /// Load is atomic: on any error the model is not registered and the
    /// stepper never sees it.
    pub fn load(&self, model: ModelDef) -> Result<(), BuildError> {
        let mut guard = self.lock();
        let state = &mut *guard;
        if state.models.contains_key(&model.name) {
            return Err(BuildError::DuplicateModel(model.name));
        }

        let link_ids: Vec<LinkId> = (0..model.links.len() as u64)
            .map(|i| LinkId::new(state.next_link_id + i))
            .collect();
        let joint_ids: Vec<JointId> = (0..model.joints.len() as u64)
            .map(|i| JointId::new(state.next_joint_id + i))
            .collect();

        let assembled = if model.is_static {
            assemble_static(&model, &link_ids, &joint_ids, &mut state.backend)?
        } else {
            let graph = build_graph(&model, &link_ids, &joint_ids)?;
            assemble(&model, &graph, &link_ids, &joint_ids, &mut state.backend)?
        };
        state.backend.realize_topology()?;

        state.next_link_id += model.links.len() as u64;
        state.next_joint_id += model.joints.len() as u64;
        state.models.insert(assembled.name.clone(), assembled);
        Ok(())
    }

    /// Remove a model's records. Its links stop being published and its
    /// joints stop answering queries.
    pub fn unload(&self, model: &str) -> Result<(), StepError> {
        let mut state = self.lock();
        state
            .models
            .remove(model)
            .map(|_| ())
            .ok_or_else(|| StepError::UnknownModel(model.to_owned()))
    }

    /// Advance the integrator to `target` and synchronize poses.
    ///
    /// Sub-steps the backend until its time reaches the target (zero
    /// sub-steps when already there), publishes every dynamic link's
    /// world pose through its master handle, then clears all discrete
    /// forces so they act for exactly one tick.
    pub fn step_to(&self, target: f64) -> Result<StepSummary, StepError> {
        let mut guard = self.lock();
        let state = &mut *guard;

        let mut sub_steps = 0u32;
        while state.backend.time() < target {
            state.backend.step_to(target)?;
            sub_steps += 1;
        }

        let mut poses_published = 0;
        for model in state.models.values() {
            if model.is_static {
                continue;
            }
            for link in model.links() {
                let pose = state.backend.body_pose(link.master);
                state.queue.mark_dirty(link.id, pose);
                poses_published += 1;
            }
        }

        state.backend.clear_discrete_forces();

        Ok(StepSummary {
            time: state.backend.time(),
            sub_steps,
            poses_published,
        })
    }

    /// Current integrator time.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.lock().backend.time()
    }

    /// Take the pending pose updates collected by [`Self::step_to`].
    #[must_use]
    pub fn take_dirty_poses(&self) -> Vec<PoseUpdate> {
        self.lock().queue.drain()
    }

    /// Position and rate of a 1-DOF joint, sign-corrected when the
    /// mobilizer was assembled in reversed direction.
    pub fn joint_state(&self, model: &str, joint: &str) -> Result<JointState, StepError> {
        let state = self.lock();
        let runtime = state
            .models
            .get(model)
            .ok_or_else(|| StepError::UnknownModel(model.to_owned()))?
            .joint(joint)
            .ok_or_else(|| StepError::UnknownJoint(joint.to_owned()))?;
        let mobod = runtime
            .mobod
            .ok_or_else(|| StepError::JointNotMobilized(joint.to_owned()))?;

        let raw = JointState::new(
            state.backend.mobilizer_coord(mobod, 0),
            state.backend.mobilizer_rate(mobod, 0),
        );
        Ok(if runtime.reversed { raw.negated() } else { raw })
    }

    /// Apply a discrete force and torque to a link's master body for the
    /// next tick only.
    pub fn apply_force(
        &self,
        model: &str,
        link: &str,
        force: Vector3<f64>,
        torque: Vector3<f64>,
    ) -> Result<(), StepError> {
        let mut guard = self.lock();
        let state = &mut *guard;
        let master = state
            .models
            .get(model)
            .ok_or_else(|| StepError::UnknownModel(model.to_owned()))?
            .link(link)
            .ok_or_else(|| StepError::UnknownLink(link.to_owned()))?
            .master;
        state.backend.apply_discrete_force(master, force, torque);
        Ok(())
    }

    /// Run a closure against a loaded model's handle tables.
    pub fn with_model<R>(
        &self,
        model: &str,
        f: impl FnOnce(&AssembledModel) -> R,
    ) -> Result<R, StepError> {
        let state = self.lock();
        state
            .models
            .get(model)
            .map(f)
            .ok_or_else(|| StepError::UnknownModel(model.to_owned()))
    }
}

/// Register a model's links and joints with the graph builder and
/// generate its topology.
fn build_graph(
    model: &ModelDef,
    link_ids: &[LinkId],
    joint_ids: &[JointId],
) -> Result<MultibodyGraph, BuildError> {
    let mut builder = GraphBuilder::new();
    for (link, id) in model.links.iter().zip(link_ids) {
        builder.add_link(&link.name, link.mass_props.mass, link.must_be_base, *id)?;
    }
    for (joint, id) in model.joints.iter().zip(joint_ids) {
        builder.add_joint(
            &joint.name,
            joint.kind,
            joint.parent.as_deref(),
            &joint.child,
            joint.must_break_loop,
            *id,
        )?;
    }
    builder.generate()
}
