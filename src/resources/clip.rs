use crate::errors::{Result, SkelError};
use crate::resources::transform::Transform;

/// One animated joint's keyframe track: a strictly ascending time sequence
/// and one decomposed transform per time sample.
#[derive(Debug, Clone, PartialEq)]
pub struct PoseSample {
    /// Target node index in the owning skeleton.
    pub node: usize,
    pub times: Vec<f32>,
    pub transforms: Vec<Transform>,
}

impl PoseSample {
    pub fn validate(&self) -> Result<()> {
        if self.times.is_empty() {
            return Err(SkelError::EmptyPoseSample { node: self.node });
        }
        if self.times.len() != self.transforms.len() {
            return Err(SkelError::InvalidResource(format!(
                "pose sample for node {}: {} times vs {} transforms",
                self.node,
                self.times.len(),
                self.transforms.len()
            )));
        }
        Ok(())
    }
}

/// One animation clip: a pose sample per animated joint. Joints without a
/// sample hold their rest pose for the duration of the clip.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimClip {
    pub pose_samples: Vec<PoseSample>,
}
