#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod animation;
pub mod assets;
pub mod errors;
pub mod render;
pub mod resources;
pub mod scene;

pub use animation::{AnimSetting, NodeInstance, SkeletonInstance};
pub use assets::{ColladaDocument, ImportOptions, SkeletonPick};
pub use errors::{Result, SkelError};
pub use render::{GpuDevice, VertexBufferId};
pub use resources::{
    AnimClip, BoundingSphere, Mesh, PoseSample, SharedSkeleton, Skeleton, SkeletonNode,
    Transform, Vertex, VertexFormat, VertexInfluence,
};
pub use scene::SkinnedActor;
