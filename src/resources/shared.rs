use glam::Vec3;

use crate::errors::{Result, SkelError};
use crate::resources::clip::AnimClip;
use crate::resources::mesh::Mesh;
use crate::resources::skeleton::Skeleton;

/// Conservative bounds of the bind-pose geometry, used for culling and
/// camera framing by the surrounding engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

/// The top-level immutable resource: one skeleton, the skinned meshes built
/// from each imported skin, and the animation clips.
///
/// Built once by the importer or the binary codec, then shared by reference
/// (`Arc`) across any number of animation instances. Instances never mutate
/// it; all per-actor state lives in
/// [`SkeletonInstance`](crate::animation::SkeletonInstance).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SharedSkeleton {
    pub skeleton: Option<Skeleton>,
    pub meshes: Vec<Mesh>,
    pub clips: Vec<AnimClip>,
    pub bounding: Option<BoundingSphere>,
}

impl SharedSkeleton {
    /// Byte size of the host-side buffer one skinning pass produces.
    #[must_use]
    pub fn total_vertex_bytes(&self) -> usize {
        self.meshes.iter().map(Mesh::vertex_bytes).sum()
    }

    #[must_use]
    pub fn total_vertex_count(&self) -> usize {
        self.meshes.iter().map(|m| m.vertices.len()).sum()
    }

    /// Computes the bind-pose bounding sphere from all mesh vertex
    /// positions: axis-aligned min/max, center at the midpoint, radius half
    /// the largest extent. No-op when already computed or when there is no
    /// geometry.
    pub fn compute_bounding(&mut self) {
        if self.bounding.is_some() || self.total_vertex_count() == 0 {
            return;
        }

        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);

        for mesh in &self.meshes {
            for vertex in &mesh.vertices {
                let pos = vertex.position();
                min = min.min(pos);
                max = max.max(pos);
            }
        }

        let extent = max - min;
        self.bounding = Some(BoundingSphere {
            center: (min + max) * 0.5,
            radius: extent.x.max(extent.y).max(extent.z) * 0.5,
        });
    }

    /// Validates the structural invariants of the whole resource: node
    /// ordering, influence target bounds, per-sample time/transform parity
    /// and sample target bounds.
    pub fn validate(&self) -> Result<()> {
        if let Some(skeleton) = &self.skeleton {
            skeleton.validate()?;
        }

        let node_count = self.skeleton.as_ref().map_or(0, |s| s.nodes.len());
        for mesh in &self.meshes {
            for vertex in &mesh.vertices {
                for influence in &vertex.influences {
                    // With no skeleton every influence is out of range.
                    if influence.node as usize >= node_count {
                        return Err(SkelError::InvalidResource(format!(
                            "vertex influence targets node {} but the skeleton has \
                             {node_count} nodes",
                            influence.node
                        )));
                    }
                }
            }
        }

        for clip in &self.clips {
            for sample in &clip.pose_samples {
                sample.validate()?;
                if sample.node >= node_count {
                    return Err(SkelError::InvalidResource(format!(
                        "pose sample targets node {} but the skeleton has {node_count} nodes",
                        sample.node
                    )));
                }
            }
        }
        Ok(())
    }
}
