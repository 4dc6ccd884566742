//! COLLADA (`.dae`) importer.
//!
//! Two stages: [`ColladaDocument`] parses the XML into intermediate element
//! records, then [`ColladaDocument::create_shared_skeleton`] assembles them
//! into the runtime [`SharedSkeleton`](crate::resources::SharedSkeleton).
//! Typical pipelines run the importer offline and ship the result through
//! the [`binary`](crate::assets::binary) codec.

mod build;
mod document;

pub use build::{ImportOptions, SkeletonPick};
pub use document::ColladaDocument;
