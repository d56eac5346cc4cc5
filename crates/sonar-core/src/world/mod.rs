//! Per-poll view of the target's world: the local camera and the set of
//! live actor addresses.

pub mod snapshot;
pub mod viewpoint;

pub use snapshot::{ActorSnapshot, NewActor};
pub use viewpoint::{Rotation, Viewpoint};
