use glam::Vec3;
use smallvec::SmallVec;

/// Interleaved per-vertex field layout. Position always comes first, so the
/// skinning step can patch the first three floats of any format in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexFormat {
    /// position(3) + texcoord(2)
    PosTex,
    /// position(3) + normal(3)
    PosNormal,
    /// position(3) + normal(3) + texcoord(2)
    PosNormalTex,
    /// position(3) + normal(3) + texcoord(2) + color(4)
    PosNormalTexColor,
}

impl VertexFormat {
    /// Number of f32 fields per vertex.
    #[must_use]
    pub fn float_count(self) -> usize {
        match self {
            Self::PosTex => 5,
            Self::PosNormal => 6,
            Self::PosNormalTex => 8,
            Self::PosNormalTexColor => 12,
        }
    }

    /// Byte size of one interleaved vertex.
    #[must_use]
    pub fn vertex_size(self) -> usize {
        self.float_count() * 4
    }
}

/// One joint influence on a vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexInfluence {
    /// Index of the influencing node in the owning skeleton.
    pub node: u32,
    pub weight: f32,
}

/// A single vertex: an opaque interleaved blob of `vertex_size` bytes plus
/// its joint influences. Weights are non-negative and sum to 1.0, or the
/// influence list is empty and the vertex is rigidly bound to its rest pose.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vertex {
    pub data: Vec<u8>,
    pub influences: SmallVec<[VertexInfluence; 4]>,
}

impl Vertex {
    /// Reads the position from the first 12 bytes of the blob.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        let p: [f32; 3] = bytemuck::pod_read_unaligned(&self.data[..12]);
        Vec3::from_array(p)
    }
}

/// A skinned mesh: vertices in triangle-list order, an optional index list,
/// and the fixed layout shared by all its vertices.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub format: VertexFormat,
    pub vertex_size: usize,
}

impl Mesh {
    #[must_use]
    pub fn new(format: VertexFormat) -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            format,
            vertex_size: format.vertex_size(),
        }
    }

    /// Total byte size of the interleaved vertex data.
    #[must_use]
    pub fn vertex_bytes(&self) -> usize {
        self.vertices.len() * self.vertex_size
    }
}
