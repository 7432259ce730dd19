//! System assembly: multibody graph to dynamics backend.
//!
//! Walks the generated mobilizer list in emitted order (which guarantees
//! every inboard frame is already realized), instantiating the matching
//! dynamical primitive for each mobilizer, welding slave duplicates back
//! to their masters, and attaching collision shapes as contact surfaces.

use std::collections::HashMap;

use nalgebra::{Unit, UnitQuaternion, Vector3};
use rig_graph::{MultibodyGraph, WORLD};
use rig_types::{
    BuildError, JointId, JointKind, LinkDef, LinkId, ModelDef, Pose, Result, ShapeKind,
};

use crate::engine::{
    CliqueId, ConstraintId, ContactSurfaceSpec, DynamicsBackend, MobilizerKind, MobilizerSpec,
    MobodId, SurfaceGeometry,
};

/// Runtime record of one link: the handles its fragments received.
///
/// A link split by loop breaking has exactly one master handle and one
/// slave handle per duplicate, each slave tied to the master by one weld
/// created here and never removed while the model lives.
#[derive(Debug, Clone)]
pub struct LinkRuntime {
    /// Simulation-wide link ID.
    pub id: LinkId,
    /// Link name within the model.
    pub name: String,
    /// The ordinary tree fragment.
    pub master: MobodId,
    /// Loop-breaking duplicates, if any.
    pub slaves: Vec<MobodId>,
    /// Slave-to-master weld constraints, parallel to `slaves`.
    pub welds: Vec<ConstraintId>,
}

/// Runtime record of one joint: which mobilizer realized it and in which
/// direction.
#[derive(Debug, Clone)]
pub struct JointRuntime {
    /// Simulation-wide joint ID.
    pub id: JointId,
    /// Joint name within the model.
    pub name: String,
    /// Kinematic type from the description.
    pub kind: JointKind,
    /// The mobilizer realizing this joint; `None` for joints of static
    /// models, which are never mobilized.
    pub mobod: Option<MobodId>,
    /// Instantiated opposite to declaration; state queries negate.
    pub reversed: bool,
}

/// One fully assembled model: handle tables for its links and joints.
#[derive(Debug, Clone)]
pub struct AssembledModel {
    /// Model name.
    pub name: String,
    /// Fixed to the world: links carry the ground handle, shapes sit on
    /// the ground frame, and poses are never republished.
    pub is_static: bool,
    links: Vec<LinkRuntime>,
    joints: Vec<JointRuntime>,
    link_names: HashMap<String, usize>,
    joint_names: HashMap<String, usize>,
}

impl AssembledModel {
    /// All link records.
    #[must_use]
    pub fn links(&self) -> &[LinkRuntime] {
        &self.links
    }

    /// All joint records.
    #[must_use]
    pub fn joints(&self) -> &[JointRuntime] {
        &self.joints
    }

    /// Look up a link by name.
    #[must_use]
    pub fn link(&self, name: &str) -> Option<&LinkRuntime> {
        self.link_names.get(name).map(|&i| &self.links[i])
    }

    /// Look up a joint by name.
    #[must_use]
    pub fn joint(&self, name: &str) -> Option<&JointRuntime> {
        self.joint_names.get(name).map(|&i| &self.joints[i])
    }
}

/// Assemble a dynamic model into the backend.
///
/// `link_ids` and `joint_ids` are the simulation-wide IDs assigned to the
/// model's links and joints, parallel to `model.links` / `model.joints`
/// and matching the IDs registered in the graph.
///
/// Everything that can fail is checked before the first backend call, so
/// a failed assembly leaves no partial registration behind.
pub fn assemble<B: DynamicsBackend>(
    model: &ModelDef,
    graph: &MultibodyGraph,
    link_ids: &[LinkId],
    joint_ids: &[JointId],
    backend: &mut B,
) -> Result<AssembledModel> {
    preflight(model, graph)?;

    let link_index: HashMap<LinkId, usize> =
        link_ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
    let joint_index: HashMap<JointId, usize> =
        joint_ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();

    let clique = if model.self_collide {
        None
    } else {
        Some(backend.new_contact_clique())
    };

    let mut masters: Vec<Option<MobodId>> = vec![None; model.links.len()];
    let mut slaves: Vec<Vec<MobodId>> = vec![Vec::new(); model.links.len()];
    let mut joints: Vec<JointRuntime> = model
        .joints
        .iter()
        .zip(joint_ids)
        .map(|(j, id)| JointRuntime {
            id: *id,
            name: j.name.clone(),
            kind: j.kind,
            mobod: None,
            reversed: false,
        })
        .collect();

    for mob in graph.mobilizers() {
        // The inboard body is the world or an input link already mobilized
        // by an earlier entry; a slave is only ever an outboard body.
        let inboard = if mob.inboard == WORLD {
            backend.ground()
        } else {
            let li = model_link(graph, &link_index, mob.inboard)?;
            masters[li].ok_or_else(|| {
                BuildError::realize_failed(format!(
                    "mobilizer order violation: inboard '{}' not yet mobilized",
                    graph.body(mob.inboard).name
                ))
            })?
        };

        let li = model_link(graph, &link_index, mob.outboard)?;
        let link = &model.links[li];
        let mass_props = link.mass_props.split(graph.fragments(mob.outboard));

        let spec = if mob.added_base {
            // No corresponding input joint: a free joint whose default
            // transform is the initial relative pose of the two bodies.
            let default_transform = if mob.inboard == WORLD {
                link.initial_pose
            } else {
                let pi = model_link(graph, &link_index, mob.inboard)?;
                Pose::between(&model.links[pi].initial_pose, &link.initial_pose)
            };
            MobilizerSpec {
                name: graph.body(mob.outboard).name.clone(),
                inboard,
                kind: MobilizerKind::Free,
                inboard_frame: Pose::identity(),
                outboard_frame: Pose::identity(),
                default_transform,
                reversed: false,
                mass_props,
            }
        } else {
            let ji = mob
                .joint
                .and_then(|id| joint_index.get(&id).copied())
                .ok_or_else(|| {
                    BuildError::realize_failed("mobilizer references a joint outside the model")
                })?;
            let joint = &model.joints[ji];
            let spec = joint_mobilizer(
                joint.kind,
                &joint.name,
                graph.body(mob.outboard).name.clone(),
                inboard,
                if mob.reversed {
                    (joint.child_frame, joint.parent_frame)
                } else {
                    (joint.parent_frame, joint.child_frame)
                },
                if mob.reversed {
                    joint.default_transform.inverse()
                } else {
                    joint.default_transform
                },
                mob.reversed,
                mass_props,
            )?;
            let mobod_slot = &mut joints[ji];
            mobod_slot.reversed = mob.reversed;
            spec
        };

        let mobod = backend.add_mobilized_body(spec)?;
        if let Some(id) = mob.joint {
            if let Some(&ji) = joint_index.get(&id) {
                joints[ji].mobod = Some(mobod);
            }
        }

        if graph.body(mob.outboard).is_slave() {
            slaves[li].push(mobod);
        } else {
            masters[li] = Some(mobod);
        }

        // Every fragment of the link carries the link's contact geometry.
        attach_collisions(backend, mobod, link, clique);
    }

    // Weld the slaves to their masters.
    let mut links = Vec::with_capacity(model.links.len());
    for (li, link) in model.links.iter().enumerate() {
        let master = masters[li].ok_or_else(|| {
            BuildError::realize_failed(format!("link '{}' was never mobilized", link.name))
        })?;
        let link_slaves = std::mem::take(&mut slaves[li]);
        let welds = link_slaves
            .iter()
            .map(|&slave| backend.add_weld_constraint(master, slave))
            .collect();
        links.push(LinkRuntime {
            id: link_ids[li],
            name: link.name.clone(),
            master,
            slaves: link_slaves,
            welds,
        });
    }

    Ok(finish(model, links, joints))
}

/// Assemble a static model: no graph, no mobilizers. Every collision
/// shape attaches to the ground frame at the link's world pose and each
/// link's master handle is the ground itself.
pub fn assemble_static<B: DynamicsBackend>(
    model: &ModelDef,
    link_ids: &[LinkId],
    joint_ids: &[JointId],
    backend: &mut B,
) -> Result<AssembledModel> {
    let ground = backend.ground();
    let mut links = Vec::with_capacity(model.links.len());
    for (li, link) in model.links.iter().enumerate() {
        let placed = LinkDef {
            collisions: link
                .collisions
                .iter()
                .cloned()
                .map(|mut c| {
                    c.local_pose = link.initial_pose.compose(&c.local_pose);
                    c
                })
                .collect(),
            ..link.clone()
        };
        attach_collisions(backend, ground, &placed, None);
        links.push(LinkRuntime {
            id: link_ids[li],
            name: link.name.clone(),
            master: ground,
            slaves: Vec::new(),
            welds: Vec::new(),
        });
    }
    let joints = model
        .joints
        .iter()
        .zip(joint_ids)
        .map(|(j, id)| JointRuntime {
            id: *id,
            name: j.name.clone(),
            kind: j.kind,
            mobod: None,
            reversed: false,
        })
        .collect();
    Ok(finish(model, links, joints))
}

fn finish(model: &ModelDef, links: Vec<LinkRuntime>, joints: Vec<JointRuntime>) -> AssembledModel {
    let link_names = links
        .iter()
        .enumerate()
        .map(|(i, l)| (l.name.clone(), i))
        .collect();
    let joint_names = joints
        .iter()
        .enumerate()
        .map(|(i, j)| (j.name.clone(), i))
        .collect();
    AssembledModel {
        name: model.name.clone(),
        is_static: model.is_static,
        links,
        joints,
        link_names,
        joint_names,
    }
}

/// Everything that can fail, checked before the backend is touched:
/// assembly is atomic per model.
fn preflight(model: &ModelDef, graph: &MultibodyGraph) -> Result<()> {
    for link in &model.links {
        link.mass_props.validate(&link.name)?;
    }
    for mob in graph.mobilizers() {
        if mob.added_base {
            continue;
        }
        match mob.kind {
            JointKind::Universal { .. } | JointKind::Hinge2 { .. } | JointKind::Screw { .. } => {
                return Err(BuildError::unimplemented_joint(
                    mob.joint_name.clone().unwrap_or_default(),
                    mob.kind.name(),
                ));
            }
            JointKind::Fixed
            | JointKind::Free
            | JointKind::Revolute { .. }
            | JointKind::Prismatic { .. }
            | JointKind::Ball => {}
        }
    }
    Ok(())
}

fn model_link(
    graph: &MultibodyGraph,
    link_index: &HashMap<LinkId, usize>,
    body: rig_graph::BodyIndex,
) -> Result<usize> {
    graph
        .body(graph.master_of(body))
        .link
        .and_then(|id| link_index.get(&id).copied())
        .ok_or_else(|| {
            BuildError::realize_failed(format!(
                "graph body '{}' has no model link",
                graph.body(body).name
            ))
        })
}

/// Build the mobilizer spec for an input joint, rotating single-axis
/// joints into the backend's canonical axis conventions.
#[allow(clippy::too_many_arguments)]
fn joint_mobilizer(
    kind: JointKind,
    joint_name: &str,
    body_name: String,
    inboard: MobodId,
    (x_if, x_om): (Pose, Pose),
    default_transform: Pose,
    reversed: bool,
    mass_props: rig_types::MassProperties,
) -> Result<MobilizerSpec> {
    let (kind, x_if, x_om, default_transform) = match kind {
        JointKind::Fixed => (MobilizerKind::Weld, x_if, x_om, Pose::identity()),
        JointKind::Free => (MobilizerKind::Free, x_if, x_om, default_transform),
        JointKind::Ball => (
            MobilizerKind::Ball,
            x_if,
            x_om,
            Pose::new(nalgebra::Point3::origin(), default_transform.rotation),
        ),
        JointKind::Revolute { axis } => {
            // The pin's hinge is the joint frame's Z axis; rotate both
            // frames so the user axis lands on it.
            let align = rotation_aligning(&Vector3::z(), &unit_axis(axis, Vector3::z()));
            (
                MobilizerKind::Pin,
                rotate_frame(&x_if, &align),
                rotate_frame(&x_om, &align),
                Pose::identity(),
            )
        }
        JointKind::Prismatic { axis } => {
            // The slider translates along the joint frame's X axis.
            let align = rotation_aligning(&Vector3::x(), &unit_axis(axis, Vector3::x()));
            (
                MobilizerKind::Slider,
                rotate_frame(&x_if, &align),
                rotate_frame(&x_om, &align),
                Pose::identity(),
            )
        }
        JointKind::Universal { .. } | JointKind::Hinge2 { .. } | JointKind::Screw { .. } => {
            return Err(BuildError::unimplemented_joint(joint_name, kind.name()));
        }
    };
    Ok(MobilizerSpec {
        name: body_name,
        inboard,
        kind,
        inboard_frame: x_if,
        outboard_frame: x_om,
        default_transform,
        reversed,
        mass_props,
    })
}

fn rotate_frame(frame: &Pose, align: &UnitQuaternion<f64>) -> Pose {
    Pose::new(frame.position, frame.rotation * *align)
}

fn unit_axis(axis: Vector3<f64>, fallback: Vector3<f64>) -> Vector3<f64> {
    axis.try_normalize(1e-12).unwrap_or(fallback)
}

/// Rotation taking `from` onto `to`, defined for the antiparallel case.
fn rotation_aligning(from: &Vector3<f64>, to: &Vector3<f64>) -> UnitQuaternion<f64> {
    UnitQuaternion::rotation_between(from, to).unwrap_or_else(|| {
        let ortho = if from.x.abs() < 0.9 {
            Vector3::x()
        } else {
            Vector3::y()
        };
        let axis = Unit::new_normalize(from.cross(&ortho));
        UnitQuaternion::from_axis_angle(&axis, std::f64::consts::PI)
    })
}

/// Attach every collision shape of a link to one of its mobilized
/// fragments. Shapes the contact protocol cannot express are skipped
/// with a warning; the fragment still simulates without them.
fn attach_collisions<B: DynamicsBackend>(
    backend: &mut B,
    mobod: MobodId,
    link: &LinkDef,
    clique: Option<CliqueId>,
) {
    let clique = clique.filter(|_| !link.self_collide);
    for collision in &link.collisions {
        let (geometry, local_pose) = match &collision.shape {
            ShapeKind::Plane { normal } => {
                // The half-space's surface normal defaults to -X; turn the
                // frame so it matches the requested normal.
                let rotation = rotation_aligning(
                    &Vector3::x(),
                    &-unit_axis(*normal, Vector3::z()),
                );
                (
                    SurfaceGeometry::HalfSpace,
                    Pose::new(collision.local_pose.position, rotation),
                )
            }
            ShapeKind::Sphere { radius } => (
                SurfaceGeometry::Sphere { radius: *radius },
                collision.local_pose,
            ),
            ShapeKind::Box { half_extents } => (
                SurfaceGeometry::Ellipsoid {
                    radii: *half_extents,
                },
                collision.local_pose,
            ),
            ShapeKind::Cylinder {
                radius,
                half_length,
            } => (
                SurfaceGeometry::Ellipsoid {
                    radii: Vector3::new(*radius, *radius, *half_length),
                },
                collision.local_pose,
            ),
            ShapeKind::Mesh { .. } => {
                tracing::warn!(
                    link = %link.name,
                    shape = %collision.name,
                    "unsupported collision shape '{}', skipping contact surface",
                    collision.shape.name()
                );
                continue;
            }
        };
        backend.add_contact_surface(
            mobod,
            ContactSurfaceSpec {
                geometry,
                local_pose,
                material: collision.material,
                clique,
            },
        );
    }
}
