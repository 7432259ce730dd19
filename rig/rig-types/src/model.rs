//! Model descriptions.
//!
//! A model is one loadable robot or world fixture: a set of links plus the
//! joints that connect them. Configuration front-ends produce a fully
//! resolved [`ModelDef`]; nothing here parses files.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::body::LinkDef;
use crate::joint::JointDef;

/// Description of one loadable model.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ModelDef {
    /// Unique model name within the world.
    pub name: String,
    /// Static models are fixed to the world; no mobilizers are created and
    /// their collision shapes attach directly to the ground frame.
    pub is_static: bool,
    /// Whether links of this model may collide with each other.
    pub self_collide: bool,
    /// Links of the model.
    pub links: Vec<LinkDef>,
    /// Joints of the model.
    pub joints: Vec<JointDef>,
}

impl ModelDef {
    /// Create an empty dynamic model.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_static: false,
            self_collide: false,
            links: Vec::new(),
            joints: Vec::new(),
        }
    }

    /// Create an empty static model.
    #[must_use]
    pub fn new_static(name: impl Into<String>) -> Self {
        Self {
            is_static: true,
            ..Self::new(name)
        }
    }

    /// Allow links of this model to collide with each other.
    #[must_use]
    pub fn with_self_collide(mut self) -> Self {
        self.self_collide = true;
        self
    }

    /// Add a link.
    #[must_use]
    pub fn with_link(mut self, link: LinkDef) -> Self {
        self.links.push(link);
        self
    }

    /// Add a joint.
    #[must_use]
    pub fn with_joint(mut self, joint: JointDef) -> Self {
        self.joints.push(joint);
        self
    }

    /// Look up a link by name.
    #[must_use]
    pub fn link(&self, name: &str) -> Option<&LinkDef> {
        self.links.iter().find(|l| l.name == name)
    }

    /// Look up a joint by name.
    #[must_use]
    pub fn joint(&self, name: &str) -> Option<&JointDef> {
        self.joints.iter().find(|j| j.name == name)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::body::MassProperties;
    use crate::joint::JointKind;
    use nalgebra::Vector3;

    #[test]
    fn model_lookup() {
        let model = ModelDef::new("cart")
            .with_link(LinkDef::new("base", MassProperties::point_mass(10.0)))
            .with_link(LinkDef::new("wheel", MassProperties::sphere(1.0, 0.2)))
            .with_joint(JointDef::new(
                "axle",
                JointKind::Revolute { axis: Vector3::y() },
                Some("base"),
                "wheel",
            ));

        assert!(model.link("wheel").is_some());
        assert!(model.link("missing").is_none());
        assert_eq!(model.joint("axle").map(|j| j.child.as_str()), Some("wheel"));
        assert!(!model.is_static);
    }

    #[test]
    fn static_model_flag() {
        let model = ModelDef::new_static("ground_plane");
        assert!(model.is_static);
        assert!(!model.self_collide);
    }
}
