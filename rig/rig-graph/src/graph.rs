//! The generated spanning-tree-plus-constraints topology.

use rig_types::{JointId, JointKind, LinkId};

/// Index of a body in the graph's arena.
///
/// Master/slave relationships are plain index references into the arena;
/// the arena owns every body record.
pub type BodyIndex = usize;

/// Arena index of the world body.
pub const WORLD: BodyIndex = 0;

/// One body record of the generated graph.
///
/// The arena holds the world at index [`WORLD`], then every input link in
/// registration order, then any slave duplicates created by loop breaking.
#[derive(Debug, Clone)]
pub struct GraphBody {
    /// Body name; slaves get a `#slaveN` suffix on the master's name.
    pub name: String,
    /// The input link this body stands for. `None` only for the world.
    pub link: Option<LinkId>,
    /// Mass used for diagnostics and base selection; infinite for the world.
    pub mass: f64,
    /// Whether the input forced this body to be a spanning-tree base.
    pub must_be_base: bool,
    /// For a slave duplicate, the master it was split from.
    pub master: Option<BodyIndex>,
    /// Slave duplicates split from this body.
    pub slaves: Vec<BodyIndex>,
}

impl GraphBody {
    /// Whether this record is the world body.
    #[must_use]
    pub fn is_world(&self) -> bool {
        self.link.is_none() && self.master.is_none()
    }

    /// Whether this record is a slave duplicate.
    #[must_use]
    pub fn is_slave(&self) -> bool {
        self.master.is_some()
    }
}

/// One mobilizer of the generated graph: a tree edge that gives its
/// outboard body its degrees of freedom relative to the inboard body.
#[derive(Debug, Clone)]
pub struct Mobilizer {
    /// The input joint realized by this mobilizer; `None` for an
    /// artificially added base mobilizer.
    pub joint: Option<JointId>,
    /// Name of the input joint, if any.
    pub joint_name: Option<String>,
    /// Kinematic type.
    pub kind: JointKind,
    /// Already-mobilized side (or the world).
    pub inboard: BodyIndex,
    /// Body mobilized by this edge.
    pub outboard: BodyIndex,
    /// True for an implicit 6-DOF base added for a floating component.
    pub added_base: bool,
    /// True when the tree reached the joint's child first, so the mobilizer
    /// runs child-to-parent. State queries must negate coordinates.
    pub reversed: bool,
}

/// A rigid coupling substituting for a joint that would close a cycle:
/// ties a slave duplicate back to its master body.
#[derive(Debug, Clone)]
pub struct LoopConstraint {
    /// The input joint whose cycle this constraint closes.
    pub joint: Option<JointId>,
    /// Name of that joint.
    pub joint_name: String,
    /// The original body kept in the tree.
    pub master: BodyIndex,
    /// The duplicate mobilized by the cycle-closing joint.
    pub slave: BodyIndex,
}

/// The spanning-tree-plus-constraints topology for one model.
///
/// The mobilizer list is totally ordered: a mobilizer's inboard body is
/// always the world or the outboard body of an earlier mobilizer. Assembly
/// relies on this to resolve inboard frames in a single pass.
#[derive(Debug, Clone)]
pub struct MultibodyGraph {
    pub(crate) bodies: Vec<GraphBody>,
    pub(crate) mobilizers: Vec<Mobilizer>,
    pub(crate) loop_constraints: Vec<LoopConstraint>,
}

impl MultibodyGraph {
    /// All body records: world, input links, then slaves.
    #[must_use]
    pub fn bodies(&self) -> &[GraphBody] {
        &self.bodies
    }

    /// One body record.
    #[must_use]
    pub fn body(&self, index: BodyIndex) -> &GraphBody {
        &self.bodies[index]
    }

    /// The ordered mobilizer list.
    #[must_use]
    pub fn mobilizers(&self) -> &[Mobilizer] {
        &self.mobilizers
    }

    /// The rigid couplings created by loop breaking.
    #[must_use]
    pub fn loop_constraints(&self) -> &[LoopConstraint] {
        &self.loop_constraints
    }

    /// Resolve a body to its master: slaves map to the body they were
    /// split from, everything else to itself.
    #[must_use]
    pub fn master_of(&self, index: BodyIndex) -> BodyIndex {
        self.bodies[index].master.unwrap_or(index)
    }

    /// Number of mobilized fragments the given body's link was split into
    /// (1 when no loop passes through it).
    #[must_use]
    pub fn fragments(&self, index: BodyIndex) -> usize {
        1 + self.bodies[self.master_of(index)].slaves.len()
    }

    /// Whether the given mobilizer mobilizes a slave duplicate.
    #[must_use]
    pub fn is_slave_mobilizer(&self, mobilizer: usize) -> bool {
        self.bodies[self.mobilizers[mobilizer].outboard].is_slave()
    }

    /// Number of artificially added base mobilizers.
    #[must_use]
    pub fn added_base_count(&self) -> usize {
        self.mobilizers.iter().filter(|m| m.added_base).count()
    }

    /// Check the ordering invariant: every mobilizer's inboard body is the
    /// world or already mobilized by an earlier entry.
    #[must_use]
    pub fn is_topologically_ordered(&self) -> bool {
        let mut mobilized = vec![false; self.bodies.len()];
        mobilized[WORLD] = true;
        for mob in &self.mobilizers {
            if !mobilized[mob.inboard] {
                return false;
            }
            mobilized[mob.outboard] = true;
        }
        true
    }

    /// Log the generated topology at debug level.
    pub fn dump(&self) {
        tracing::debug!(
            bodies = self.bodies.len(),
            mobilizers = self.mobilizers.len(),
            loop_constraints = self.loop_constraints.len(),
            "multibody graph"
        );
        for (i, mob) in self.mobilizers.iter().enumerate() {
            tracing::debug!(
                "  mobilizer {i}: {} -> {} ({}{}{}{})",
                self.bodies[mob.inboard].name,
                self.bodies[mob.outboard].name,
                mob.kind,
                if mob.added_base { ", added base" } else { "" },
                if mob.reversed { ", reversed" } else { "" },
                if self.bodies[mob.outboard].is_slave() {
                    ", slave"
                } else {
                    ""
                },
            );
        }
        for lc in &self.loop_constraints {
            tracing::debug!(
                "  loop: {} welds {} to {}",
                lc.joint_name,
                self.bodies[lc.slave].name,
                self.bodies[lc.master].name,
            );
        }
    }
}
