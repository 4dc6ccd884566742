use std::sync::Arc;

use crate::animation::{AnimSetting, SkeletonInstance};
use crate::errors::Result;
use crate::render::{GpuDevice, VertexBufferId};
use crate::resources::mesh::VertexFormat;
use crate::resources::shared::{BoundingSphere, SharedSkeleton};

/// A scene actor driven by a [`SkeletonInstance`].
///
/// Owns the host-side skinning buffer and orchestrates clip transitions:
/// switch immediately, or queue a setting to apply once the current clip
/// finishes, with loop recovery for one-shot interruptions of idle loops.
/// Per frame, `update` advances the instance and regenerates the device
/// vertex buffer whenever the pose changed.
pub struct SkinnedActor {
    instance: SkeletonInstance,

    vertex_buffer: Vec<u8>,
    buffer_id: Option<VertexBufferId>,
    vertex_count: usize,

    curr_anim: Option<AnimSetting>,
    next_anim: Option<AnimSetting>,
    recover_loop: bool,

    bounding_sphere: Option<BoundingSphere>,
}

impl SkinnedActor {
    #[must_use]
    pub fn new(resource: Arc<SharedSkeleton>) -> Self {
        let bounding_sphere = resource.bounding;
        let instance = SkeletonInstance::new(resource);
        let buffer_len = instance.vertex_buffer_len();

        Self {
            instance,
            vertex_buffer: vec![0; buffer_len],
            buffer_id: None,
            vertex_count: 0,
            curr_anim: None,
            next_anim: None,
            recover_loop: false,
            bounding_sphere,
        }
    }

    #[must_use]
    pub fn instance(&self) -> &SkeletonInstance {
        &self.instance
    }

    /// Bind-pose bounds copied from the resource, for culling by the scene.
    #[must_use]
    pub fn bounding_sphere(&self) -> Option<&BoundingSphere> {
        self.bounding_sphere.as_ref()
    }

    #[must_use]
    pub fn anim_idx(&self) -> Option<usize> {
        self.curr_anim.map(|s| s.idx)
    }

    #[must_use]
    pub fn current_anim(&self) -> Option<&AnimSetting> {
        self.curr_anim.as_ref()
    }

    #[must_use]
    pub fn queued_anim(&self) -> Option<&AnimSetting> {
        self.next_anim.as_ref()
    }

    /// The device buffer handle, once the first upload happened.
    #[must_use]
    pub fn buffer_id(&self) -> Option<VertexBufferId> {
        self.buffer_id
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    #[must_use]
    pub fn vertex_format(&self) -> Option<VertexFormat> {
        self.instance.vertex_format()
    }

    /// Switches to `setting` right away, dropping any queued transition.
    pub fn set_anim(&mut self, setting: AnimSetting) -> Result<()> {
        self.instance.set_anim(setting)?;
        self.curr_anim = Some(setting);
        Ok(())
    }

    /// Requests a clip change.
    ///
    /// A no-op when `setting` is already active. With `wait_current_finish`
    /// the setting is queued and the current clip's loop cancelled so it
    /// runs to its natural end; otherwise the switch is immediate. In both
    /// modes `recover_current_loop` arms loop recovery: when a non-looping
    /// clip replaces a looping one, the interrupted looping setting is
    /// queued to resume once the one-shot finishes.
    pub fn play_anim(
        &mut self,
        setting: AnimSetting,
        wait_current_finish: bool,
        recover_current_loop: bool,
    ) -> Result<()> {
        if self.curr_anim == Some(setting) {
            return Ok(());
        }

        if wait_current_finish {
            self.next_anim = Some(setting);
            self.recover_loop = recover_current_loop;
            self.instance.cancel_loop();
            return Ok(());
        }

        let interrupted_loop = self
            .curr_anim
            .is_some_and(|curr| recover_current_loop && !setting.is_loop && curr.is_loop);

        self.next_anim = if interrupted_loop { self.curr_anim } else { None };

        self.set_anim(setting)
    }

    /// Per-frame step: advance time, apply a queued transition once the
    /// active clip has ended, and refresh the device buffer when the pose
    /// changed.
    pub fn update(&mut self, delta_time: f32, device: &mut dyn GpuDevice) -> Result<()> {
        let need_update = self.instance.add_time(delta_time);

        if let Some(next) = self.next_anim {
            if self.instance.is_anim_end() {
                let interrupted = self.curr_anim;

                self.instance.set_anim(next)?;
                self.curr_anim = Some(next);

                if self.recover_loop
                    && !next.is_loop
                    && interrupted.is_some_and(|c| c.is_loop)
                {
                    // Resume the interrupted idle loop after the one-shot.
                    self.next_anim = interrupted;
                    self.recover_loop = false;
                } else {
                    self.next_anim = None;
                }
            }
        }

        if need_update {
            self.update_vertex_buffer(device);
        }

        Ok(())
    }

    /// Jumps playback and forces a buffer refresh.
    pub fn set_time_percent(&mut self, time_percent: f32, device: &mut dyn GpuDevice) {
        self.instance.set_time_percent(time_percent);
        self.update_vertex_buffer(device);
    }

    /// Swaps the shared resource, preserving the active setting and the
    /// normalized playback position.
    pub fn change_resource(
        &mut self,
        resource: Arc<SharedSkeleton>,
        device: &mut dyn GpuDevice,
    ) -> Result<()> {
        let time_percent = self.instance.time_percent();

        self.bounding_sphere = resource.bounding;
        self.instance = SkeletonInstance::new(resource);
        self.vertex_buffer = vec![0; self.instance.vertex_buffer_len()];

        if let Some(setting) = self.curr_anim {
            self.instance.set_anim(setting)?;
            self.instance.set_time_percent(time_percent);
        }

        self.update_vertex_buffer(device);
        Ok(())
    }

    fn update_vertex_buffer(&mut self, device: &mut dyn GpuDevice) {
        if self.vertex_buffer.is_empty() {
            return;
        }

        let id = match self.buffer_id {
            Some(id) => id,
            None => {
                let id = device.create_vertex_buffer();
                self.buffer_id = Some(id);
                id
            }
        };

        self.vertex_count = self.instance.fill_vertex_buffer(&mut self.vertex_buffer);

        let Some(format) = self.instance.vertex_format() else {
            return;
        };
        device.upload_vertices(id, &self.vertex_buffer, self.vertex_count, format);
    }
}
