//! Multibody graph construction.
//!
//! This crate turns a flat list of links and joints, possibly containing
//! kinematic loops, into a spanning-tree-plus-constraints topology that a
//! dynamics backend can instantiate in one ordered pass:
//!
//! - Ordinary joints become **tree mobilizers** (parents always emitted
//!   before children).
//! - Links that root a floating component receive an implicit 6-DOF **base
//!   mobilizer** to the world.
//! - Every cycle is broken by duplicating one endpoint into a **slave**
//!   body: the cycle-closing joint mobilizes the slave, and a rigid **loop
//!   constraint** ties the slave back to its master.
//!
//! The graph is built once per model load, consumed by assembly, and then
//! discarded; nothing here is touched at simulation time.
//!
//! # Example
//!
//! ```
//! use rig_graph::GraphBuilder;
//! use rig_types::{JointId, JointKind, LinkId};
//! use nalgebra::Vector3;
//!
//! let mut builder = GraphBuilder::new();
//! builder.add_link("base", 10.0, false, LinkId::new(0)).unwrap();
//! builder.add_link("arm", 2.0, false, LinkId::new(1)).unwrap();
//! builder
//!     .add_joint(
//!         "shoulder",
//!         JointKind::Revolute { axis: Vector3::z() },
//!         Some("base"),
//!         "arm",
//!         false,
//!         JointId::new(0),
//!     )
//!     .unwrap();
//!
//! let graph = builder.generate().unwrap();
//! // One implicit free base for "base", one revolute mobilizer for "arm".
//! assert_eq!(graph.mobilizers().len(), 2);
//! assert!(graph.loop_constraints().is_empty());
//! ```

#![doc(html_root_url = "https://docs.rs/rig-graph/0.3.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(clippy::missing_errors_doc)]

mod builder;
mod graph;

pub use builder::GraphBuilder;
pub use graph::{BodyIndex, GraphBody, LoopConstraint, Mobilizer, MultibodyGraph, WORLD};
