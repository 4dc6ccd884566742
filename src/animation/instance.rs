use std::sync::Arc;

use glam::{Mat4, Vec3};

use crate::animation::AnimSetting;
use crate::errors::{Result, SkelError};
use crate::resources::clip::PoseSample;
use crate::resources::mesh::VertexFormat;
use crate::resources::shared::SharedSkeleton;
use crate::resources::transform::Transform;

/// Mutable per-node state: the keyframe bracket, the blended local pose and
/// the matrices recomputed every pose update.
#[derive(Debug, Clone)]
pub struct NodeInstance {
    /// Index of this node's pose sample within the active clip, or `None`
    /// when the clip does not animate this node (rest pose applies).
    pub(crate) attached_sample: Option<usize>,
    current_key: usize,
    next_key: usize,
    pub(crate) local_pose: Transform,
    pub(crate) global_matrix: Mat4,
    pub(crate) matrix_palette: Mat4,
}

impl Default for NodeInstance {
    fn default() -> Self {
        Self {
            attached_sample: None,
            current_key: 0,
            next_key: 0,
            local_pose: Transform::IDENTITY,
            global_matrix: Mat4::IDENTITY,
            matrix_palette: Mat4::IDENTITY,
        }
    }
}

impl NodeInstance {
    fn set_time(&mut self, sample: &PoseSample, time: f32, setting: &AnimSetting) {
        self.update_key(sample, time, setting);
        self.update_local_pose(sample, time);
    }

    /// Re-brackets the active keyframe pair: a linear scan for the first
    /// sample time exceeding `time`. O(n) in the clip length, which is fine
    /// for typical clips; the scan must pick the same bracket a sorted
    /// search would.
    fn update_key(&mut self, sample: &PoseSample, time: f32, setting: &AnimSetting) {
        let key_num = sample.times.len();

        let mut i = 0;
        while i < key_num && time >= sample.times[i] {
            i += 1;
        }

        self.current_key = i;
        self.next_key = i + 1;

        if self.current_key >= key_num {
            // Past the last sample time; only reachable when not looping
            // (or when pinned exactly at the end of the timeline).
            self.current_key = key_num - 1;
            self.next_key = key_num - 1;
        } else if self.next_key >= key_num {
            self.next_key = if setting.is_blend_begin {
                0
            } else {
                self.current_key
            };
        }
    }

    fn update_local_pose(&mut self, sample: &PoseSample, time: f32) {
        if self.current_key == self.next_key {
            self.local_pose = sample.transforms[self.current_key];
            return;
        }

        let start = &sample.transforms[self.current_key];
        let end = &sample.transforms[self.next_key];

        let start_time = if self.current_key > 0 {
            sample.times[self.current_key - 1]
        } else {
            0.0
        };
        let end_time = sample.times[self.current_key];

        let span = end_time - start_time;
        if span <= 1e-6 {
            self.local_pose = *start;
            return;
        }

        let blend_factor = (time - start_time) / span;
        self.local_pose = start.blend(end, blend_factor);
    }
}

/// Per-actor animation state over a shared resource.
///
/// Owns one [`NodeInstance`] per skeleton node. `set_anim` binds a clip,
/// `add_time` advances and blends, `update_pose` resolves the hierarchy into
/// world matrices and the skinning palette, and `fill_vertex_buffer` runs
/// the CPU skinning pass. The resource itself is never mutated.
#[derive(Debug, Clone)]
pub struct SkeletonInstance {
    resource: Arc<SharedSkeleton>,
    nodes: Vec<NodeInstance>,

    setting: Option<AnimSetting>,
    anim_current_time: f32,
    anim_duration: f32,
    pose_updated_time: f32,
}

impl SkeletonInstance {
    #[must_use]
    pub fn new(resource: Arc<SharedSkeleton>) -> Self {
        let node_count = resource.skeleton.as_ref().map_or(0, |s| s.nodes.len());
        Self {
            resource,
            nodes: vec![NodeInstance::default(); node_count],
            setting: None,
            anim_current_time: 0.0,
            anim_duration: 0.0,
            pose_updated_time: 0.0,
        }
    }

    #[must_use]
    pub fn resource(&self) -> &Arc<SharedSkeleton> {
        &self.resource
    }

    #[must_use]
    pub fn clip_count(&self) -> usize {
        self.resource.clips.len()
    }

    #[must_use]
    pub fn time(&self) -> f32 {
        self.anim_current_time
    }

    #[must_use]
    pub fn duration(&self) -> f32 {
        self.anim_duration
    }

    #[must_use]
    pub fn time_percent(&self) -> f32 {
        if self.anim_duration > 0.0 {
            self.anim_current_time / self.anim_duration
        } else {
            0.0
        }
    }

    /// True once playback has run past the end of a non-looping clip.
    #[must_use]
    pub fn is_anim_end(&self) -> bool {
        self.anim_current_time > self.anim_duration
    }

    /// Lets the active clip run to its natural end instead of wrapping.
    pub fn cancel_loop(&mut self) {
        if let Some(setting) = &mut self.setting {
            setting.is_loop = false;
        }
    }

    #[must_use]
    pub fn setting(&self) -> Option<&AnimSetting> {
        self.setting.as_ref()
    }

    #[must_use]
    pub fn find_node_index(&self, name: &str) -> Option<usize> {
        self.resource.skeleton.as_ref()?.find_node(name)
    }

    /// The node's world matrix as of the last pose update.
    #[must_use]
    pub fn node_global_matrix(&self, idx: usize) -> &Mat4 {
        &self.nodes[idx].global_matrix
    }

    /// The node's skinning matrix (`global · inverse_bind_pose` for joints)
    /// as of the last pose update.
    #[must_use]
    pub fn node_matrix_palette(&self, idx: usize) -> &Mat4 {
        &self.nodes[idx].matrix_palette
    }

    #[must_use]
    pub fn node_local_pose(&self, idx: usize) -> &Transform {
        &self.nodes[idx].local_pose
    }

    /// Binds a clip: every node's sample attachment is rebuilt, key brackets
    /// reset at time zero, and the clip duration recomputed as the maximum
    /// last sample time over all tracks (second-to-last when
    /// `is_blend_begin` is cleared, for clips that duplicate their first
    /// frame at the end).
    pub fn set_anim(&mut self, setting: AnimSetting) -> Result<()> {
        let clip_count = self.resource.clips.len();
        if setting.idx >= clip_count {
            return Err(SkelError::ClipIndexOutOfBounds {
                index: setting.idx,
                count: clip_count,
            });
        }

        for node in &mut self.nodes {
            node.attached_sample = None;
        }

        self.anim_duration = 0.0;
        self.anim_current_time = 0.0;
        self.pose_updated_time = 0.0;
        self.setting = Some(setting);

        // Split borrows: the clip lives in the shared resource while we
        // mutate per-node state.
        let resource = Arc::clone(&self.resource);
        let clip = &resource.clips[setting.idx];

        for (sample_idx, sample) in clip.pose_samples.iter().enumerate() {
            sample.validate()?;
            if sample.node >= self.nodes.len() {
                return Err(SkelError::InvalidResource(format!(
                    "pose sample targets node {} but the skeleton has {} nodes",
                    sample.node,
                    self.nodes.len()
                )));
            }

            let node = &mut self.nodes[sample.node];
            node.attached_sample = Some(sample_idx);
            node.set_time(sample, 0.0, &setting);

            let mut time_end_idx = sample.times.len() - 1;
            if !setting.is_blend_begin {
                time_end_idx = time_end_idx.saturating_sub(1);
            }

            let sample_duration = sample.times[time_end_idx];
            if self.anim_duration < sample_duration {
                self.anim_duration = sample_duration;
            }
        }

        Ok(())
    }

    /// Advances playback by `dt` seconds (scaled and possibly negated by the
    /// active setting), re-brackets and blends every attached node, and
    /// recomputes the pose unless it is already pinned past the end of a
    /// finished clip. Returns whether the pose changed.
    pub fn add_time(&mut self, dt: f32) -> bool {
        let Some(setting) = self.setting else {
            return false;
        };

        let delta = dt * setting.speed_rate;
        if setting.is_inverse {
            self.anim_current_time -= delta;
        } else {
            self.anim_current_time += delta;
        }

        if setting.is_loop && self.anim_duration > 0.0 {
            while self.anim_current_time >= self.anim_duration {
                self.anim_current_time -= self.anim_duration;
            }
            while self.anim_current_time < 0.0 {
                self.anim_current_time += self.anim_duration;
            }
        }

        self.apply_time(self.anim_current_time, &setting);

        if self.anim_current_time <= self.anim_duration
            || self.pose_updated_time < self.anim_duration
        {
            self.update_pose();
            return true;
        }

        false
    }

    /// Jumps to a fraction of the clip duration and recomputes the pose.
    pub fn set_time_percent(&mut self, time_percent: f32) {
        let Some(setting) = self.setting else {
            return;
        };

        self.anim_current_time = self.anim_duration * time_percent;
        self.apply_time(self.anim_current_time, &setting);
        self.update_pose();
    }

    fn apply_time(&mut self, time: f32, setting: &AnimSetting) {
        let resource = Arc::clone(&self.resource);
        let clip = &resource.clips[setting.idx];

        for sample in &clip.pose_samples {
            self.nodes[sample.node].set_time(sample, time, setting);
        }
    }

    /// Resolves local poses into world matrices and the skinning palette in
    /// one ascending pass. Valid because parents precede children: a node's
    /// parent matrix is always finished before the node itself is visited.
    pub fn update_pose(&mut self) {
        let Some(skeleton) = self.resource.skeleton.as_ref() else {
            return;
        };

        for (idx, node) in skeleton.nodes.iter().enumerate() {
            let mut global = if self.nodes[idx].attached_sample.is_some() {
                self.nodes[idx].local_pose.to_mat4()
            } else {
                node.local_transform
            };

            if let Some(parent) = node.parent {
                global = self.nodes[parent].global_matrix * global;
            }

            self.nodes[idx].global_matrix = global;
            self.nodes[idx].matrix_palette = if node.is_joint {
                global * node.inverse_bind_pose
            } else {
                global
            };
        }

        self.pose_updated_time = self.anim_current_time;
    }

    // ========================================================================
    // Skinning
    // ========================================================================

    /// Byte size the skinning output buffer must have.
    #[must_use]
    pub fn vertex_buffer_len(&self) -> usize {
        self.resource.total_vertex_bytes()
    }

    /// The layout tag of the skinned output (all meshes of one resource
    /// share a layout; the first mesh is authoritative).
    #[must_use]
    pub fn vertex_format(&self) -> Option<VertexFormat> {
        self.resource.meshes.first().map(|m| m.format)
    }

    /// Skins every mesh vertex against the current matrix palette.
    ///
    /// Each vertex blob is copied verbatim (normals, texcoords and colors
    /// pass through untouched), then the position is replaced by
    /// `Σ wᵢ · (paletteᵢ · position)` over its influences. Vertices with no
    /// influences keep their rest position. Returns the number of vertices
    /// written.
    pub fn fill_vertex_buffer(&self, buffer: &mut [u8]) -> usize {
        debug_assert!(buffer.len() >= self.vertex_buffer_len());

        let mut offset = 0;
        let mut total_vertex_num = 0;

        for mesh in &self.resource.meshes {
            for vertex in &mesh.vertices {
                let out = &mut buffer[offset..offset + mesh.vertex_size];
                out.copy_from_slice(&vertex.data);

                if !vertex.influences.is_empty() {
                    let pos = vertex.position();
                    let mut final_pos = Vec3::ZERO;
                    for influence in &vertex.influences {
                        let palette = &self.nodes[influence.node as usize].matrix_palette;
                        final_pos += palette.transform_point3(pos) * influence.weight;
                    }
                    out[..12].copy_from_slice(bytemuck::bytes_of(&final_pos.to_array()));
                }

                offset += mesh.vertex_size;
                total_vertex_num += 1;
            }
        }

        total_vertex_num
    }
}
