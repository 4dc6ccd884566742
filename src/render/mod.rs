//! The graphics-device boundary.
//!
//! Skinning produces a host-side byte buffer; uploading it is the renderer's
//! job. The device is injected wherever it is needed instead of being
//! reached through process-wide globals, so the animation and skinning logic
//! stays free of engine state.

use crate::resources::mesh::VertexFormat;

/// Opaque handle to a device-owned vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexBufferId(pub u32);

/// The slice of the graphics device this crate consumes: dynamic vertex
/// buffer creation and per-frame upload. Implemented by the engine's
/// renderer; tests use a recording stub.
pub trait GpuDevice {
    fn create_vertex_buffer(&mut self) -> VertexBufferId;

    /// Uploads `data` as dynamically-updated geometry. `vertex_count` and
    /// `format` describe the interleaved layout of the bytes.
    fn upload_vertices(
        &mut self,
        id: VertexBufferId,
        data: &[u8],
        vertex_count: usize,
        format: VertexFormat,
    );
}
