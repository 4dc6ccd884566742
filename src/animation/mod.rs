//! Per-actor animation state: clip selection, time advance, keyframe
//! blending and the joint matrix palette.

pub mod instance;

pub use instance::{NodeInstance, SkeletonInstance};

/// Selects which clip to play and how.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimSetting {
    /// Clip index into [`SharedSkeleton::clips`](crate::resources::SharedSkeleton).
    pub idx: usize,
    /// Playback speed multiplier.
    pub speed_rate: f32,
    pub is_loop: bool,
    /// Play the clip backwards.
    pub is_inverse: bool,
    /// When set, the last keyframe blends back toward the first one, closing
    /// the loop for clips authored without a duplicated first/last frame.
    /// Clips that do duplicate it clear this and end on the second-to-last
    /// sample time instead.
    pub is_blend_begin: bool,
}

impl Default for AnimSetting {
    fn default() -> Self {
        Self {
            idx: 0,
            speed_rate: 1.0,
            is_loop: true,
            is_inverse: false,
            is_blend_begin: true,
        }
    }
}

impl AnimSetting {
    #[must_use]
    pub fn looped(idx: usize) -> Self {
        Self {
            idx,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn once(idx: usize) -> Self {
        Self {
            idx,
            is_loop: false,
            ..Self::default()
        }
    }
}
