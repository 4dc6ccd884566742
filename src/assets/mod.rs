//! Asset pipeline: the COLLADA importer and the flat binary codec.

pub mod binary;
pub mod collada;

pub use binary::{
    load_shared_skeleton, load_shared_skeleton_file, save_shared_skeleton,
    save_shared_skeleton_file,
};
pub use collada::{ColladaDocument, ImportOptions, SkeletonPick};
