use glam::Mat4;

use crate::errors::{Result, SkelError};

/// One node of the rest-pose hierarchy.
///
/// Nodes are stored flat; `parent` indexes into the owning node list and is
/// always smaller than the node's own index, so a single ascending pass over
/// the list visits every parent before its children.
#[derive(Debug, Clone, PartialEq)]
pub struct SkeletonNode {
    /// Unique within the skeleton.
    pub name: String,
    pub parent: Option<usize>,
    /// Rest-pose local transform, used whenever no animation track targets
    /// this node.
    pub local_transform: Mat4,
    /// Joints influence skin deformation and carry an inverse bind pose.
    pub is_joint: bool,
    /// Maps world-space bind geometry into this joint's space.
    /// Identity for non-joints.
    pub inverse_bind_pose: Mat4,
}

impl SkeletonNode {
    #[must_use]
    pub fn new(name: impl Into<String>, parent: Option<usize>, local_transform: Mat4) -> Self {
        Self {
            name: name.into(),
            parent,
            local_transform,
            is_joint: false,
            inverse_bind_pose: Mat4::IDENTITY,
        }
    }
}

/// An ordered node list. Ordering is the sole source of hierarchy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Skeleton {
    pub nodes: Vec<SkeletonNode>,
}

impl Skeleton {
    #[must_use]
    pub fn find_node(&self, name: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.name == name)
    }

    /// Checks the parent-precedes-child invariant.
    pub fn validate(&self) -> Result<()> {
        for (idx, node) in self.nodes.iter().enumerate() {
            if let Some(parent) = node.parent {
                if parent >= idx {
                    return Err(SkelError::InvalidResource(format!(
                        "skeleton node '{}' (index {idx}) has parent index {parent}; \
                         parents must precede children",
                        node.name
                    )));
                }
            }
        }
        Ok(())
    }
}
