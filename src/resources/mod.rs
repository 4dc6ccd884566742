//! The immutable skeleton / mesh / animation resource model.
//!
//! Everything here is plain data: built once by the COLLADA importer or the
//! binary codec, wrapped in an `Arc`, and read concurrently by any number of
//! animation instances.

pub mod clip;
pub mod mesh;
pub mod shared;
pub mod skeleton;
pub mod transform;

pub use clip::{AnimClip, PoseSample};
pub use mesh::{Mesh, Vertex, VertexFormat, VertexInfluence};
pub use shared::{BoundingSphere, SharedSkeleton};
pub use skeleton::{Skeleton, SkeletonNode};
pub use transform::Transform;
