//! Scene-side integration: the skinned actor.

pub mod actor;

pub use actor::SkinnedActor;
