//! Graph builder: registration interface and spanning-tree generation.

use std::collections::HashMap;

use rig_types::{BuildError, JointId, JointKind, LinkId, Result};

use crate::graph::{BodyIndex, GraphBody, LoopConstraint, Mobilizer, MultibodyGraph, WORLD};

struct JointRec {
    name: String,
    id: JointId,
    kind: JointKind,
    parent: BodyIndex,
    child: BodyIndex,
    must_break: bool,
}

/// Incrementally registers the bodies and joints of one model, then
/// generates the spanning-tree-plus-constraints topology.
///
/// The world body is pre-registered as an immovable node; joints whose
/// parent is `None` attach their child to it. Registration order is
/// preserved where the tree allows, but the emitted mobilizer order is a
/// topological order, not input order: cycle breaking can demote a joint
/// from tree mobilizer to loop constraint.
pub struct GraphBuilder {
    bodies: Vec<GraphBody>,
    joints: Vec<JointRec>,
    body_names: HashMap<String, BodyIndex>,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBuilder {
    /// Create a builder with the world pre-registered.
    #[must_use]
    pub fn new() -> Self {
        let world = GraphBody {
            name: "world".to_owned(),
            link: None,
            mass: f64::INFINITY,
            must_be_base: false,
            master: None,
            slaves: Vec::new(),
        };
        let mut body_names = HashMap::new();
        body_names.insert(world.name.clone(), WORLD);
        Self {
            bodies: vec![world],
            joints: Vec::new(),
            body_names,
        }
    }

    /// Register one link as a graph node.
    pub fn add_link(
        &mut self,
        name: impl Into<String>,
        mass: f64,
        must_be_base: bool,
        link: LinkId,
    ) -> Result<BodyIndex> {
        let name = name.into();
        if self.body_names.contains_key(&name) {
            return Err(BuildError::DuplicateLink(name));
        }
        let index = self.bodies.len();
        self.body_names.insert(name.clone(), index);
        self.bodies.push(GraphBody {
            name,
            link: Some(link),
            mass,
            must_be_base,
            master: None,
            slaves: Vec::new(),
        });
        Ok(index)
    }

    /// Register one joint as a graph edge.
    ///
    /// A `None` parent attaches the child to the world. Both endpoints must
    /// already be registered.
    pub fn add_joint(
        &mut self,
        name: impl Into<String>,
        kind: JointKind,
        parent: Option<&str>,
        child: &str,
        must_break_loop: bool,
        id: JointId,
    ) -> Result<()> {
        let name = name.into();
        if self.joints.iter().any(|j| j.name == name) {
            return Err(BuildError::DuplicateJoint(name));
        }
        let parent_index = match parent {
            None => WORLD,
            Some(p) => self.resolve(&name, p)?,
        };
        let child_index = self.resolve(&name, child)?;
        self.joints.push(JointRec {
            name,
            id,
            kind,
            parent: parent_index,
            child: child_index,
            must_break: must_break_loop,
        });
        Ok(())
    }

    fn resolve(&self, joint: &str, body: &str) -> Result<BodyIndex> {
        self.body_names
            .get(body)
            .copied()
            .ok_or_else(|| BuildError::unknown_body(joint, body))
    }

    /// Generate the multibody graph.
    ///
    /// Grows a spanning tree outward from the world (and from any forced
    /// base), emitting mobilizers parents-first. Edges left over once every
    /// body is in the tree close cycles; each one splits its child into a
    /// slave duplicate, mobilizes the slave, and records a rigid loop
    /// constraint back to the master.
    pub fn generate(mut self) -> Result<MultibodyGraph> {
        let mut mobilizers: Vec<Mobilizer> = Vec::with_capacity(self.bodies.len());
        let mut in_tree = vec![false; self.bodies.len()];
        in_tree[WORLD] = true;
        let mut joint_used = vec![false; self.joints.len()];

        // Forced bases come first so the rest of the tree grows from them.
        for index in 1..self.bodies.len() {
            if self.bodies[index].must_be_base {
                mobilizers.push(Self::base_mobilizer(index));
                in_tree[index] = true;
            }
        }

        loop {
            let mut progressed = false;
            for (ji, joint) in self.joints.iter().enumerate() {
                if joint_used[ji] || joint.must_break {
                    continue;
                }
                match (in_tree[joint.parent], in_tree[joint.child]) {
                    (true, false) => {
                        mobilizers.push(Mobilizer {
                            joint: Some(joint.id),
                            joint_name: Some(joint.name.clone()),
                            kind: joint.kind,
                            inboard: joint.parent,
                            outboard: joint.child,
                            added_base: false,
                            reversed: false,
                        });
                        in_tree[joint.child] = true;
                        joint_used[ji] = true;
                        progressed = true;
                    }
                    (false, true) => {
                        mobilizers.push(Mobilizer {
                            joint: Some(joint.id),
                            joint_name: Some(joint.name.clone()),
                            kind: joint.kind,
                            inboard: joint.child,
                            outboard: joint.parent,
                            added_base: false,
                            reversed: true,
                        });
                        in_tree[joint.parent] = true;
                        joint_used[ji] = true;
                        progressed = true;
                    }
                    // Both endpoints already mobilized: this edge closes a
                    // cycle. Leave it for the loop-breaking pass.
                    (true, true) | (false, false) => {}
                }
            }

            if progressed {
                continue;
            }
            // Stalled: every remaining joint is a loop closer or belongs to
            // a component with no path to the tree. Float the first
            // unattached body on an added 6-DOF base and try again.
            match in_tree.iter().position(|t| !t) {
                Some(index) => {
                    mobilizers.push(Self::base_mobilizer(index));
                    in_tree[index] = true;
                }
                None => break,
            }
        }

        // Loop-breaking pass: every unused edge now connects two mobilized
        // bodies. Split the child into a slave, mobilize the slave with the
        // joint's own type, and weld it back to the master. A ball loop
        // joint could in principle become a 3-DOF coupling with no slave,
        // but no such constraint is wired up; every break takes the rigid
        // fallback.
        let mut loop_constraints = Vec::new();
        for (ji, joint) in self.joints.iter().enumerate() {
            if joint_used[ji] {
                continue;
            }
            let master = joint.child;
            let slave = self.bodies.len();
            let slave_body = GraphBody {
                name: format!(
                    "{}#slave{}",
                    self.bodies[master].name,
                    self.bodies[master].slaves.len() + 1
                ),
                link: self.bodies[master].link,
                mass: self.bodies[master].mass,
                must_be_base: false,
                master: Some(master),
                slaves: Vec::new(),
            };
            self.bodies.push(slave_body);
            self.bodies[master].slaves.push(slave);

            mobilizers.push(Mobilizer {
                joint: Some(joint.id),
                joint_name: Some(joint.name.clone()),
                kind: joint.kind,
                inboard: joint.parent,
                outboard: slave,
                added_base: false,
                reversed: false,
            });
            loop_constraints.push(LoopConstraint {
                joint: Some(joint.id),
                joint_name: joint.name.clone(),
                master,
                slave,
            });
        }

        let graph = MultibodyGraph {
            bodies: self.bodies,
            mobilizers,
            loop_constraints,
        };
        debug_assert!(graph.is_topologically_ordered());
        graph.dump();
        Ok(graph)
    }

    fn base_mobilizer(outboard: BodyIndex) -> Mobilizer {
        Mobilizer {
            joint: None,
            joint_name: None,
            kind: JointKind::Free,
            inboard: WORLD,
            outboard,
            added_base: true,
            reversed: false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    fn revolute() -> JointKind {
        JointKind::Revolute { axis: Vector3::z() }
    }

    fn builder_with_links(names: &[&str]) -> GraphBuilder {
        let mut builder = GraphBuilder::new();
        for (i, name) in names.iter().enumerate() {
            builder
                .add_link(*name, 1.0, false, LinkId::new(i as u64))
                .unwrap();
        }
        builder
    }

    #[test]
    fn serial_pair_gets_base_plus_revolute() {
        // Scenario A: two bodies, one revolute joint, no loops.
        let mut builder = builder_with_links(&["torso", "arm"]);
        builder
            .add_joint("shoulder", revolute(), Some("torso"), "arm", false, JointId::new(0))
            .unwrap();
        let graph = builder.generate().unwrap();

        assert_eq!(graph.mobilizers().len(), 2);
        assert_eq!(graph.added_base_count(), 1);
        assert!(graph.loop_constraints().is_empty());

        let base = &graph.mobilizers()[0];
        assert!(base.added_base);
        assert_eq!(base.kind, JointKind::Free);
        assert_eq!(base.inboard, WORLD);

        let shoulder = &graph.mobilizers()[1];
        assert_eq!(shoulder.joint_name.as_deref(), Some("shoulder"));
        assert!(!shoulder.reversed);
    }

    #[test]
    fn three_body_ring_breaks_one_loop() {
        // Scenario B: a closed ring of three revolute joints. One joint
        // closes the cycle: its child is duplicated into a slave mobilized
        // by that joint, rigidly coupled back to the master.
        let mut builder = builder_with_links(&["a", "b", "c"]);
        builder
            .add_joint("ab", revolute(), Some("a"), "b", false, JointId::new(0))
            .unwrap();
        builder
            .add_joint("bc", revolute(), Some("b"), "c", false, JointId::new(1))
            .unwrap();
        builder
            .add_joint("ca", revolute(), Some("c"), "a", false, JointId::new(2))
            .unwrap();
        let graph = builder.generate().unwrap();

        // 1 added base + 3 mobilizers derived from the input joints.
        assert_eq!(graph.mobilizers().len(), 4);
        assert_eq!(graph.added_base_count(), 1);
        assert_eq!(
            graph
                .mobilizers()
                .iter()
                .filter(|m| m.joint.is_some())
                .count(),
            3
        );
        assert_eq!(graph.loop_constraints().len(), 1);

        let lc = &graph.loop_constraints()[0];
        assert_eq!(lc.joint_name, "ca");
        assert_eq!(graph.body(lc.master).name, "a");
        assert!(graph.body(lc.slave).is_slave());
        assert_eq!(graph.master_of(lc.slave), lc.master);
        assert_eq!(graph.fragments(lc.master), 2);
        assert_eq!(graph.fragments(lc.slave), 2);
    }

    #[test]
    fn world_attached_chain_needs_no_base() {
        let mut builder = builder_with_links(&["cart", "pole"]);
        builder
            .add_joint(
                "rail",
                JointKind::Prismatic { axis: Vector3::x() },
                None,
                "cart",
                false,
                JointId::new(0),
            )
            .unwrap();
        builder
            .add_joint("pivot", revolute(), Some("cart"), "pole", false, JointId::new(1))
            .unwrap();
        let graph = builder.generate().unwrap();

        assert_eq!(graph.mobilizers().len(), 2);
        assert_eq!(graph.added_base_count(), 0);
        assert_eq!(graph.mobilizers()[0].inboard, WORLD);
    }

    #[test]
    fn reversed_joint_detected() {
        // The joint is declared leaf -> root, but the tree reaches "hand"
        // (the declared child) first via the world attachment.
        let mut builder = builder_with_links(&["hand", "finger"]);
        builder
            .add_joint("mount", JointKind::Fixed, None, "hand", false, JointId::new(0))
            .unwrap();
        builder
            .add_joint(
                "knuckle",
                revolute(),
                Some("finger"),
                "hand",
                false,
                JointId::new(1),
            )
            .unwrap();
        let graph = builder.generate().unwrap();

        let knuckle = graph
            .mobilizers()
            .iter()
            .find(|m| m.joint_name.as_deref() == Some("knuckle"))
            .unwrap();
        assert!(knuckle.reversed);
        assert_eq!(graph.body(knuckle.outboard).name, "finger");
    }

    #[test]
    fn disconnected_components_each_get_a_base() {
        let mut builder = builder_with_links(&["rover", "rock_a", "rock_b"]);
        builder
            .add_joint("hitch", JointKind::Fixed, Some("rock_a"), "rock_b", false, JointId::new(0))
            .unwrap();
        let graph = builder.generate().unwrap();

        // rover floats alone; rock_a/rock_b form a second floating component.
        assert_eq!(graph.added_base_count(), 2);
        assert_eq!(graph.mobilizers().len(), 3);
        assert!(graph.loop_constraints().is_empty());
    }

    #[test]
    fn must_break_joint_becomes_loop_constraint() {
        let mut builder = builder_with_links(&["hull", "hatch"]);
        builder
            .add_joint("hinge", revolute(), Some("hull"), "hatch", false, JointId::new(0))
            .unwrap();
        builder
            .add_joint("latch", JointKind::Fixed, Some("hull"), "hatch", true, JointId::new(1))
            .unwrap();
        let graph = builder.generate().unwrap();

        assert_eq!(graph.loop_constraints().len(), 1);
        assert_eq!(graph.loop_constraints()[0].joint_name, "latch");
        // hatch is split: master mobilized by the hinge, slave by the latch.
        let hatch = graph
            .bodies()
            .iter()
            .position(|b| b.name == "hatch")
            .unwrap();
        assert_eq!(graph.fragments(hatch), 2);
    }

    #[test]
    fn forced_base_is_mobilized_first() {
        let mut builder = GraphBuilder::new();
        builder.add_link("tip", 0.5, false, LinkId::new(0)).unwrap();
        builder.add_link("root", 5.0, true, LinkId::new(1)).unwrap();
        builder
            .add_joint("stem", revolute(), Some("root"), "tip", false, JointId::new(0))
            .unwrap();
        let graph = builder.generate().unwrap();

        let first = &graph.mobilizers()[0];
        assert!(first.added_base);
        assert_eq!(graph.body(first.outboard).name, "root");
    }

    #[test]
    fn dangling_body_reference_fails() {
        let mut builder = builder_with_links(&["body"]);
        let err = builder
            .add_joint("bad", revolute(), Some("ghost"), "body", false, JointId::new(0))
            .unwrap_err();
        assert_eq!(err, BuildError::unknown_body("bad", "ghost"));
    }

    #[test]
    fn duplicate_names_fail() {
        let mut builder = builder_with_links(&["body"]);
        assert_eq!(
            builder.add_link("body", 1.0, false, LinkId::new(9)),
            Err(BuildError::DuplicateLink("body".to_owned()))
        );

        builder
            .add_joint("j", JointKind::Fixed, None, "body", false, JointId::new(0))
            .unwrap();
        let err = builder
            .add_joint("j", JointKind::Fixed, None, "body", false, JointId::new(1))
            .unwrap_err();
        assert_eq!(err, BuildError::DuplicateJoint("j".to_owned()));
    }

    #[test]
    fn emitted_order_is_topological() {
        // A branched mechanism with a cross-link loop; declared in an order
        // chosen to stress the growth loop.
        let mut builder = builder_with_links(&["p", "q", "r", "s"]);
        builder
            .add_joint("rs", revolute(), Some("r"), "s", false, JointId::new(0))
            .unwrap();
        builder
            .add_joint("pq", revolute(), Some("p"), "q", false, JointId::new(1))
            .unwrap();
        builder
            .add_joint("qr", revolute(), Some("q"), "r", false, JointId::new(2))
            .unwrap();
        builder
            .add_joint("sp", revolute(), Some("s"), "p", false, JointId::new(3))
            .unwrap();
        builder
            .add_joint("anchor", JointKind::Fixed, None, "p", false, JointId::new(4))
            .unwrap();
        let graph = builder.generate().unwrap();

        assert!(graph.is_topologically_ordered());
        // Four-bar ring plus world anchor: exactly one loop.
        assert_eq!(graph.loop_constraints().len(), 1);
        assert_eq!(graph.added_base_count(), 0);
        assert_eq!(graph.mobilizers().len(), 5);
    }

    #[test]
    fn mobilizer_count_matches_bodies_plus_slaves() {
        // P1 accounting: every non-world body (links + slaves) is mobilized
        // exactly once; loop constraints equal independent cycles.
        let mut builder = builder_with_links(&["a", "b", "c", "d"]);
        let joints = [
            ("ab", "a", "b"),
            ("bc", "b", "c"),
            ("ca", "c", "a"),
            ("bd", "b", "d"),
            ("dc", "d", "c"),
        ];
        for (i, (name, p, c)) in joints.iter().enumerate() {
            builder
                .add_joint(*name, revolute(), Some(p), c, false, JointId::new(i as u64))
                .unwrap();
        }
        let graph = builder.generate().unwrap();

        // 5 edges over 4 bodies in one component: c = 2 cycles.
        let cycles = 2;
        let links = 4;
        assert_eq!(graph.loop_constraints().len(), cycles);
        assert_eq!(graph.bodies().len(), 1 + links + cycles);
        assert_eq!(graph.mobilizers().len(), links + cycles);
        assert_eq!(graph.added_base_count(), 1);
        assert!(graph.is_topologically_ordered());
    }
}
