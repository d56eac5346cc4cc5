//! Tracked actor variants and the rules that create them.

mod classifier;
mod kind;
mod tracked;

pub use classifier::ClassifierRules;
pub(crate) use classifier::contains_any;
pub use kind::ActorKind;
pub use tracked::{ActorDetail, Health, TrackedActor};
